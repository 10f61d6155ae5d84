//! Typed error details.
//!
//! A detail is a structured payload attached to an [`AnnotatedError`],
//! identified on the wire by its type-url (the `@type` field).
//! The nine standard payloads of the canonical RPC error model are provided
//! in this module; anything else decodes into an [`AnyDetail`].
//!
//! [`AnnotatedError`]: crate::AnnotatedError

use std::{any::Any, fmt, sync::Arc};

use serde::Serialize;
use serde_json::{Map, Value};

mod std_messages;
#[doc(inline)]
pub use std_messages::{
    BadRequest, DebugInfo, ErrorInfo, FieldViolation, Help, HelpLink, LocalizedMessage,
    PreconditionFailure, PreconditionViolation, QuotaFailure, QuotaViolation, RequestInfo,
    ResourceInfo,
};

pub mod registry;

/// Common prefix of the type-urls of all standard details.
pub const TYPE_URL_PREFIX: &str = "type.googleapis.com/google.rpc.";

/// Type-url of [`DebugInfo`].
pub const TYPE_URL_DEBUG_INFO: &str = "type.googleapis.com/google.rpc.DebugInfo";
/// Type-url of [`ResourceInfo`].
pub const TYPE_URL_RESOURCE_INFO: &str = "type.googleapis.com/google.rpc.ResourceInfo";
/// Type-url of [`BadRequest`].
pub const TYPE_URL_BAD_REQUEST: &str = "type.googleapis.com/google.rpc.BadRequest";
/// Type-url of [`PreconditionFailure`].
pub const TYPE_URL_PRECONDITION_FAILURE: &str =
    "type.googleapis.com/google.rpc.PreconditionFailure";
/// Type-url of [`ErrorInfo`].
pub const TYPE_URL_ERROR_INFO: &str = "type.googleapis.com/google.rpc.ErrorInfo";
/// Type-url of [`QuotaFailure`].
pub const TYPE_URL_QUOTA_FAILURE: &str = "type.googleapis.com/google.rpc.QuotaFailure";
/// Type-url of [`RequestInfo`].
pub const TYPE_URL_REQUEST_INFO: &str = "type.googleapis.com/google.rpc.RequestInfo";
/// Type-url of [`Help`].
pub const TYPE_URL_HELP: &str = "type.googleapis.com/google.rpc.Help";
/// Type-url of [`LocalizedMessage`].
pub const TYPE_URL_LOCALIZED_MESSAGE: &str = "type.googleapis.com/google.rpc.LocalizedMessage";

/// Name of the JSON field carrying the type-url of a detail.
pub const TYPE_FIELD: &str = "@type";

/// A structured payload attached to an error.
///
/// Implementors render a one-line summary with `{}`
/// and a multi-line dump of all their fields with `{:#}`.
pub trait Detail: fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// The type-url identifying this detail on the wire.
    fn type_url(&self) -> &str;

    /// Serialize this detail into its JSON object form,
    /// with the [`TYPE_FIELD`] as first member.
    fn to_json(&self) -> serde_json::Result<Value>;

    /// Access this detail as [`Any`], used for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// A shared, type-erased [`Detail`].
pub type SharedDetail = Arc<dyn Detail>;

impl dyn Detail {
    /// Returns `true` if the inner type is the same as `T`.
    pub fn is<T: Detail>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Returns a reference to the inner value if it is of type `T`.
    pub fn downcast_ref<T: Detail>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}

/// Serialize `payload` into a JSON object prefixed with its type-url.
pub(crate) fn tagged_json<T: Serialize>(type_url: &str, payload: &T) -> serde_json::Result<Value> {
    let mut object = Map::new();
    object.insert(TYPE_FIELD.to_owned(), Value::String(type_url.to_owned()));
    match serde_json::to_value(payload)? {
        Value::Object(fields) => object.extend(fields),
        Value::Null => (),
        other => {
            return Err(serde::ser::Error::custom(format!(
                "detail {type_url} does not serialize into an object: {other}"
            )));
        }
    }
    Ok(Value::Object(object))
}

macro_rules! impl_detail {
    ($($ty:ident => $type_url:ident),+ $(,)?) => {
        $(
            impl $crate::detail::Detail for $ty {
                fn type_url(&self) -> &str {
                    $crate::detail::$type_url
                }

                fn to_json(&self) -> ::serde_json::Result<::serde_json::Value> {
                    $crate::detail::tagged_json($crate::detail::$type_url, self)
                }

                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }
            }

            impl $crate::annotate::Annotation for $ty {
                fn annotate(self, target: &mut dyn $crate::annotate::Modifier) {
                    target.append_details(vec![::std::sync::Arc::new(self)]);
                }
            }
        )+
    };
}

pub(crate) use impl_detail;

/// A free-form detail, used for payloads of which the type-url
/// is not registered, and for caller-defined payloads.
///
/// The `@type` member of the object is its type-url.
///
/// ```
/// use annotated_error::detail::{AnyDetail, Detail};
///
/// let detail = AnyDetail::new("custom/type").with_field("1", "2");
/// assert_eq!(detail.type_url(), "custom/type");
/// assert_eq!(detail.to_json().unwrap().to_string(), r#"{"@type":"custom/type","1":"2"}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AnyDetail(Map<String, Value>);

impl AnyDetail {
    /// Create a new [`AnyDetail`] for the given type-url.
    #[must_use]
    pub fn new(type_url: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(TYPE_FIELD.to_owned(), Value::String(type_url.into()));
        Self(fields)
    }

    /// Create an [`AnyDetail`] from a raw JSON object.
    #[must_use]
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Add a field to this [`AnyDetail`].
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(key, value);
        self
    }

    /// Add a field to this [`AnyDetail`].
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Get a field of this [`AnyDetail`].
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// All fields of this detail, `@type` included.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume this detail into its raw JSON object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl Detail for AnyDetail {
    fn type_url(&self) -> &str {
        self.0
            .get(TYPE_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    fn to_json(&self) -> serde_json::Result<Value> {
        Ok(Value::Object(self.0.clone()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for AnyDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            for (key, value) in &self.0 {
                writeln!(f, "{key}: {value}")?;
            }
            Ok(())
        } else {
            write!(f, "{}", Value::Object(self.0.clone()))
        }
    }
}

impl crate::annotate::Annotation for AnyDetail {
    fn annotate(self, target: &mut dyn crate::annotate::Modifier) {
        target.append_details(vec![Arc::new(self)]);
    }
}

impl crate::annotate::Annotation for SharedDetail {
    fn annotate(self, target: &mut dyn crate::annotate::Modifier) {
        target.append_details(vec![self]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_urls_share_prefix() {
        for type_url in [
            TYPE_URL_DEBUG_INFO,
            TYPE_URL_RESOURCE_INFO,
            TYPE_URL_BAD_REQUEST,
            TYPE_URL_PRECONDITION_FAILURE,
            TYPE_URL_ERROR_INFO,
            TYPE_URL_QUOTA_FAILURE,
            TYPE_URL_REQUEST_INFO,
            TYPE_URL_HELP,
            TYPE_URL_LOCALIZED_MESSAGE,
        ] {
            assert!(type_url.starts_with(TYPE_URL_PREFIX), "{type_url}");
        }
    }

    #[test]
    fn any_detail_type_url() {
        assert_eq!(AnyDetail::new("custom/type").type_url(), "custom/type");
        assert_eq!(AnyDetail::default().type_url(), "");

        let mut fields = Map::new();
        fields.insert(TYPE_FIELD.to_owned(), Value::from(42));
        assert_eq!(AnyDetail::from_map(fields).type_url(), "");
    }

    #[test]
    fn any_detail_json_is_verbatim() {
        let raw = r#"{"1":"2","@type":"custom/type","nested":{"a":[1,2]}}"#;
        let detail: AnyDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(detail.to_json().unwrap().to_string(), raw);
        assert_eq!(detail.get("1"), Some(&Value::from("2")));
    }

    #[test]
    fn tagged_json_puts_type_first() {
        let value = tagged_json(
            TYPE_URL_RESOURCE_INFO,
            &ResourceInfo::new("1", "2", "3", "4"),
        )
        .unwrap();
        assert_eq!(
            value.to_string(),
            r#"{"@type":"type.googleapis.com/google.rpc.ResourceInfo","resourceType":"1","resourceName":"2","owner":"3","description":"4"}"#
        );
    }

    #[test]
    fn downcast_shared_detail() {
        let detail: SharedDetail = Arc::new(RequestInfo::new("id", "data"));
        assert!(detail.is::<RequestInfo>());
        assert!(!detail.is::<AnyDetail>());
        assert_eq!(detail.downcast_ref::<RequestInfo>().unwrap().request_id, "id");
    }
}
