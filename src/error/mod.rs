//! The annotated error type.
//!
//! An [`AnnotatedError`] wraps a cause together with a status [`Code`],
//! a message and an ordered list of typed details. It is built with
//! [`annotate`], which takes any error as cause and applies
//! [`Annotation`]s to it.
//!
//! The [`BoxError`] type is the type-erased error type accepted as cause,
//! so any type implementing `std::error::Error` (as well as plain strings)
//! can be annotated.

use std::{error::Error as StdError, fmt, sync::Arc};

use crate::{
    Code,
    annotate::{self, Annotation, Modifier},
    detail::SharedDetail,
};

/// Alias for a type-erased error type.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Alias for a shared type-erased error type, as used for causes.
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

mod chain;
pub use chain::Chain;

mod ext;
pub use ext::{AnnotateExt, ContextError, ErrorExt};

mod sentinel;
pub use sentinel::{Canceled, TimeoutExpired, Transient};

/// An error with a status code, a message and typed details.
///
/// The [`Display`] implementation prints the message only.
/// The alternate form (`{:#}`) prints the status, the message and all details
/// including their type-url, one field per line.
///
/// ```
/// use annotated_error::{Code, Message, annotate, detail::RequestInfo};
///
/// let err = annotate("connection reset", (Code::UNAVAILABLE, Message::new("fetch user")));
/// assert_eq!(err.to_string(), "fetch user: connection reset");
/// assert_eq!(err.code(), Code::UNAVAILABLE);
///
/// let err = err.annotate(RequestInfo::new("req-1", ""));
/// assert_eq!(
///     format!("{err:#}"),
///     "status: \"503 UNAVAILABLE\"\nmessage: \"fetch user: connection reset\"\ndetail[0]:\n\ttype: \"type.googleapis.com/google.rpc.RequestInfo\"\n\trequest_id: \"req-1\"\n\tserving_data: \"\"\n",
/// );
/// ```
///
/// [`Display`]: std::fmt::Display
#[derive(Clone, Default)]
pub struct AnnotatedError {
    pub(crate) cause: Option<SharedError>,
    pub(crate) code: Code,
    pub(crate) message: String,
    pub(crate) details: Vec<SharedDetail>,
}

impl AnnotatedError {
    /// Create a new [`AnnotatedError`] without cause.
    #[must_use]
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            cause: None,
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Wrap a foreign error, taking over its text as message.
    ///
    /// If the cause is a [`Code`], the wrapper starts with that code.
    fn wrap(cause: BoxError) -> Self {
        let code = cause.downcast_ref::<Code>().copied().unwrap_or_default();
        Self {
            message: cause.to_string(),
            code,
            cause: Some(Arc::from(cause)),
            details: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        cause: Option<SharedError>,
        code: Code,
        message: String,
        details: Vec<SharedDetail>,
    ) -> Self {
        Self {
            cause,
            code,
            message,
            details,
        }
    }

    /// Apply more annotations to this error.
    ///
    /// The existing message is left as is, unless an annotation wraps it.
    #[must_use]
    pub fn annotate(mut self, annotations: impl Annotation) -> Self {
        annotations.annotate(&mut self);
        self
    }

    /// The status code of this error.
    #[must_use]
    pub fn code(&self) -> Code {
        self.code
    }

    /// The message of this error.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The details of this error, in insertion order.
    ///
    /// Use [`details_of`] to collect the details of the entire cause chain.
    ///
    /// [`details_of`]: crate::details_of
    #[must_use]
    pub fn details(&self) -> &[SharedDetail] {
        &self.details
    }

    /// The wrapped cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&SharedError> {
        self.cause.as_ref()
    }

    /// Consume this error, returning its wrapped cause.
    #[must_use]
    pub fn into_cause(self) -> Option<SharedError> {
        self.cause
    }
}

impl Modifier for AnnotatedError {
    fn set_code(&mut self, code: Code) {
        self.code = code;
    }

    fn wrap_message(&mut self, message: &str) {
        annotate::wrap_message(&mut self.message, message);
    }

    fn append_details(&mut self, details: Vec<SharedDetail>) {
        self.details.extend(details);
    }
}

impl fmt::Debug for AnnotatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("AnnotatedError");

        builder.field("code", &self.code);

        if !self.message.is_empty() {
            builder.field("message", &self.message);
        }

        if !self.details.is_empty() {
            builder.field("details", &self.details);
        }

        if let Some(cause) = &self.cause {
            builder.field("cause", cause);
        }

        builder.finish()
    }
}

impl fmt::Display for AnnotatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !f.alternate() {
            return f.write_str(&self.message);
        }

        writeln!(f, "status: {:?}", self.code.to_string())?;
        writeln!(f, "message: {:?}", self.message)?;
        for (i, detail) in self.details.iter().enumerate() {
            writeln!(f, "detail[{i}]:")?;
            let verbose = format!("{detail:#}");
            for line in verbose.lines() {
                writeln!(f, "\t{line}")?;
            }
        }
        Ok(())
    }
}

impl StdError for AnnotatedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Annotate `cause`, applying the given annotations in order.
///
/// If the cause is an [`AnnotatedError`] already, the annotations are
/// applied to it directly. Any other cause is wrapped first: the wrapper
/// takes over the text of the cause as message, and its code if the cause
/// is a [`Code`].
///
/// ```
/// use annotated_error::{Code, annotate, status_of};
///
/// let err = annotate(std::fmt::Error, ());
/// assert_eq!(err.message(), "an error occurred when formatting an argument");
/// assert_eq!(status_of(&err), Code::UNKNOWN);
///
/// let err = annotate(Code::NOT_FOUND, "user 42");
/// assert_eq!(err.code(), Code::NOT_FOUND);
/// assert_eq!(err.message(), "user 42: 404 NOT_FOUND");
/// ```
pub fn annotate(cause: impl Into<BoxError>, annotations: impl Annotation) -> AnnotatedError {
    let cause: BoxError = cause.into();
    let target = match cause.downcast::<AnnotatedError>() {
        Ok(annotated) => *annotated,
        Err(cause) => AnnotatedError::wrap(cause),
    };
    target.annotate(annotations)
}

/// Annotate an optional cause, see [`annotate`].
///
/// Returns `None` if there is no cause to annotate.
pub fn annotate_opt<E>(cause: Option<E>, annotations: impl Annotation) -> Option<AnnotatedError>
where
    E: Into<BoxError>,
{
    cause.map(|cause| annotate(cause, annotations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Message,
        detail::{ResourceInfo, TYPE_URL_RESOURCE_INFO},
    };

    #[derive(Debug)]
    struct NoRows;

    impl fmt::Display for NoRows {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("sql: no rows in result set")
        }
    }

    impl StdError for NoRows {}

    #[test]
    fn wraps_foreign_cause() {
        let err = annotate(NoRows, ());
        assert_eq!(err.code(), Code::OK);
        assert_eq!(err.message(), "sql: no rows in result set");
        assert!(err.details().is_empty());
        assert!(err.source().unwrap().is::<NoRows>());
    }

    #[test]
    fn wraps_code_cause() {
        let err = annotate(Code::DATA_LOSS, ());
        assert_eq!(err.code(), Code::DATA_LOSS);
        assert_eq!(err.message(), "500 DATA_LOSS");
        assert_eq!(
            err.source().unwrap().downcast_ref::<Code>(),
            Some(&Code::DATA_LOSS)
        );
    }

    #[test]
    fn reuses_annotated_cause() {
        let inner = annotate(NoRows, (Code::NOT_FOUND, ResourceInfo::default()));
        let outer = annotate(inner, (Message::new("lookup"), Code::INTERNAL));
        assert_eq!(outer.code(), Code::INTERNAL);
        assert_eq!(outer.message(), "lookup: sql: no rows in result set");
        assert_eq!(outer.details().len(), 1);
        assert!(outer.source().unwrap().is::<NoRows>());
    }

    #[test]
    fn annotate_none() {
        assert!(annotate_opt(None::<NoRows>, Code::INTERNAL).is_none());
        let err = annotate_opt(Some(NoRows), Code::INTERNAL).unwrap();
        assert_eq!(err.code(), Code::INTERNAL);
    }

    #[test]
    fn annotate_string_cause() {
        let err = annotate("plain text", Code::ABORTED);
        assert_eq!(err.message(), "plain text");
        assert_eq!(err.source().unwrap().to_string(), "plain text");
    }

    #[test]
    fn new_has_no_cause() {
        let err = AnnotatedError::new(Code::UNIMPLEMENTED, "nope");
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn verbose_display() {
        let err = annotate(
            NoRows,
            (Code::NOT_FOUND, ResourceInfo::new("user", "42", "", "")),
        );
        let verbose = format!("{err:#}");
        assert!(verbose.starts_with("status: \"404 NOT_FOUND\"\n"));
        assert!(verbose.contains("message: \"sql: no rows in result set\"\n"));
        assert!(verbose.contains("detail[0]:\n"));
        assert!(verbose.contains(&format!("\ttype: {TYPE_URL_RESOURCE_INFO:?}\n")));
        assert!(verbose.contains("\tresource_name: \"42\"\n"));
    }

    #[test]
    fn debug_skips_empty_fields() {
        let err = AnnotatedError::new(Code::ABORTED, "");
        assert_eq!(format!("{err:?}"), "AnnotatedError { code: ABORTED }");
    }

    #[test]
    fn details_keep_insertion_order() {
        let err = annotate(
            NoRows,
            (
                ResourceInfo::new("a", "", "", ""),
                ResourceInfo::new("b", "", "", ""),
            ),
        )
        .annotate(ResourceInfo::new("c", "", "", ""));
        let kinds: Vec<_> = err
            .details()
            .iter()
            .map(|d| {
                d.downcast_ref::<ResourceInfo>()
                    .unwrap()
                    .resource_type
                    .clone()
            })
            .collect();
        assert_eq!(kinds, ["a", "b", "c"]);
        assert!(err.details().iter().all(|d| d.type_url() == TYPE_URL_RESOURCE_INFO));
    }
}
