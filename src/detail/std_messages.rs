use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use super::{
    TYPE_URL_BAD_REQUEST, TYPE_URL_DEBUG_INFO, TYPE_URL_ERROR_INFO, TYPE_URL_HELP,
    TYPE_URL_LOCALIZED_MESSAGE, TYPE_URL_PRECONDITION_FAILURE, TYPE_URL_QUOTA_FAILURE,
    TYPE_URL_REQUEST_INFO, TYPE_URL_RESOURCE_INFO, impl_detail,
};

/// Used to encode debug information.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebugInfo {
    /// Stack trace entries indicating where the error occurred.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stack_entries: Vec<String>,

    /// Additional debugging information provided by the server.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl DebugInfo {
    /// Creates a new [`DebugInfo`] struct.
    #[must_use]
    pub fn new(stack_entries: impl Into<Vec<String>>, detail: impl Into<String>) -> Self {
        Self {
            stack_entries: stack_entries.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for DebugInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "type: {TYPE_URL_DEBUG_INFO:?}")?;
            writeln!(f, "detail: {:?}", self.detail)?;
            writeln!(f, "stack:")?;
            for entry in &self.stack_entries {
                writeln!(f, "\t{entry}")?;
            }
            Ok(())
        } else {
            f.write_str(&self.detail)
        }
    }
}

/// Used to provide resource information.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceInfo {
    /// Type of resource being accessed.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_type: String,

    /// Name of the resource being accessed.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_name: String,

    /// The owner of the resource being accessed.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub owner: String,

    /// Describes the error encountered when accessing the resource.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl ResourceInfo {
    /// Creates a new [`ResourceInfo`] struct.
    #[must_use]
    pub fn new(
        resource_type: impl Into<String>,
        resource_name: impl Into<String>,
        owner: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_name: resource_name.into(),
            owner: owner.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for ResourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "type: {TYPE_URL_RESOURCE_INFO:?}")?;
            writeln!(f, "resource_type: {:?}", self.resource_type)?;
            writeln!(f, "resource_name: {:?}", self.resource_name)?;
            writeln!(f, "owner: {:?}", self.owner)?;
            writeln!(f, "description: {:?}", self.description)
        } else {
            write!(
                f,
                "resource type: {}, name: {}, owner: {}, description: {}",
                self.resource_type, self.resource_name, self.owner, self.description
            )
        }
    }
}

/// Used at the `field_violations` field of the [`BadRequest`] struct.
/// Describes a single bad request field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldViolation {
    /// Path leading to a field in the request body.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub field: String,

    /// Description of why the field is bad.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl FieldViolation {
    /// Creates a new [`FieldViolation`] struct.
    #[must_use]
    pub fn new(field: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            description: description.into(),
        }
    }
}

/// Used to encode details about violations of the client's request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BadRequest {
    /// Describes all field violations of the request.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_violations: Vec<FieldViolation>,
}

impl BadRequest {
    /// Creates a new [`BadRequest`] struct.
    #[must_use]
    pub fn new(field_violations: impl Into<Vec<FieldViolation>>) -> Self {
        Self {
            field_violations: field_violations.into(),
        }
    }

    /// Creates a new [`BadRequest`] struct with a single [`FieldViolation`].
    #[must_use]
    pub fn with_violation(field: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(vec![FieldViolation::new(field, description)])
    }

    /// Adds a [`FieldViolation`] to [`BadRequest`]'s `field_violations`.
    pub fn add_violation(
        &mut self,
        field: impl Into<String>,
        description: impl Into<String>,
    ) -> &mut Self {
        self.field_violations
            .push(FieldViolation::new(field, description));
        self
    }

    /// Returns `true` if [`BadRequest`]'s `field_violations` vector is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_violations.is_empty()
    }
}

impl fmt::Display for BadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "type: {TYPE_URL_BAD_REQUEST:?}")?;
            writeln!(f, "field_violations:")?;
            for violation in &self.field_violations {
                writeln!(f, "\t{}: {:?}", violation.field, violation.description)?;
            }
            Ok(())
        } else {
            write!(f, "field violations: {}", self.field_violations.len())
        }
    }
}

/// Used at the `violations` field of the [`PreconditionFailure`] struct.
/// Describes a single precondition failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreconditionViolation {
    /// Type of the precondition failure, e.g. `TOS` for a terms of service violation.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub r#type: String,

    /// Subject, relative to the type, that failed.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subject: String,

    /// A description of how the precondition failed.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl PreconditionViolation {
    /// Creates a new [`PreconditionViolation`] struct.
    #[must_use]
    pub fn new(
        r#type: impl Into<String>,
        subject: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            r#type: r#type.into(),
            subject: subject.into(),
            description: description.into(),
        }
    }
}

/// Used to encode details about precondition failures.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreconditionFailure {
    /// Describes all precondition violations of the request.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<PreconditionViolation>,
}

impl PreconditionFailure {
    /// Creates a new [`PreconditionFailure`] struct.
    #[must_use]
    pub fn new(violations: impl Into<Vec<PreconditionViolation>>) -> Self {
        Self {
            violations: violations.into(),
        }
    }

    /// Creates a new [`PreconditionFailure`] struct with a single
    /// [`PreconditionViolation`].
    #[must_use]
    pub fn with_violation(
        violation_type: impl Into<String>,
        subject: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(vec![PreconditionViolation::new(
            violation_type,
            subject,
            description,
        )])
    }

    /// Adds a [`PreconditionViolation`] to [`PreconditionFailure`]'s
    /// `violations` vector.
    pub fn add_violation(
        &mut self,
        violation_type: impl Into<String>,
        subject: impl Into<String>,
        description: impl Into<String>,
    ) -> &mut Self {
        self.violations.push(PreconditionViolation::new(
            violation_type,
            subject,
            description,
        ));
        self
    }
}

impl fmt::Display for PreconditionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "type: {TYPE_URL_PRECONDITION_FAILURE:?}")?;
            writeln!(f, "violations:")?;
            for v in &self.violations {
                writeln!(f, "\t[{}] {}: {:?}", v.r#type, v.subject, v.description)?;
            }
            Ok(())
        } else {
            write!(f, "violations: {}", self.violations.len())
        }
    }
}

/// Used to encode the cause of an error with structured details.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorInfo {
    /// Reason of the error. Should be a constant value that identifies the
    /// proximate cause of the error. e.g. `API_DISABLED`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,

    /// Logical grouping to which the "reason" belongs, e.g. `example.com`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub domain: String,

    /// Additional structured details about this error.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ErrorInfo {
    /// Creates a new [`ErrorInfo`] struct.
    #[must_use]
    pub fn new(
        reason: impl Into<String>,
        domain: impl Into<String>,
        metadata: impl Into<BTreeMap<String, String>>,
    ) -> Self {
        Self {
            reason: reason.into(),
            domain: domain.into(),
            metadata: metadata.into(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "type: {TYPE_URL_ERROR_INFO:?}")?;
            writeln!(f, "reason: {:?}", self.reason)?;
            writeln!(f, "domain: {:?}", self.domain)?;
            writeln!(f, "metadata:")?;
            for (key, value) in &self.metadata {
                writeln!(f, "\t{key}: {value:?}")?;
            }
            Ok(())
        } else {
            write!(f, "[{}] {}", self.domain, self.reason)
        }
    }
}

/// Used at the `violations` field of the [`QuotaFailure`] struct.
/// Describes a single quota violation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaViolation {
    /// Subject on which the quota check failed.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subject: String,

    /// Description of why the quota check failed.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl QuotaViolation {
    /// Creates a new [`QuotaViolation`] struct.
    #[must_use]
    pub fn new(subject: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            description: description.into(),
        }
    }
}

/// Used to encode details about quota failures.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaFailure {
    /// Describes all quota violations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<QuotaViolation>,
}

impl QuotaFailure {
    /// Creates a new [`QuotaFailure`] struct.
    #[must_use]
    pub fn new(violations: impl Into<Vec<QuotaViolation>>) -> Self {
        Self {
            violations: violations.into(),
        }
    }

    /// Creates a new [`QuotaFailure`] struct with a single [`QuotaViolation`].
    #[must_use]
    pub fn with_violation(subject: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(vec![QuotaViolation::new(subject, description)])
    }
}

impl fmt::Display for QuotaFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "type: {TYPE_URL_QUOTA_FAILURE:?}")?;
            writeln!(f, "violations:")?;
            for v in &self.violations {
                writeln!(f, "\t{}: {:?}", v.subject, v.description)?;
            }
            Ok(())
        } else {
            write!(f, "violations: {}", self.violations.len())
        }
    }
}

/// Used to encode information about the request that failed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestInfo {
    /// An opaque string that should only be interpreted by the service that
    /// generated it. For example, an id used to identify requests in the logs.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub request_id: String,

    /// Any data used to serve this request.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub serving_data: String,
}

impl RequestInfo {
    /// Creates a new [`RequestInfo`] struct.
    #[must_use]
    pub fn new(request_id: impl Into<String>, serving_data: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            serving_data: serving_data.into(),
        }
    }
}

impl fmt::Display for RequestInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "type: {TYPE_URL_REQUEST_INFO:?}")?;
            writeln!(f, "request_id: {:?}", self.request_id)?;
            writeln!(f, "serving_data: {:?}", self.serving_data)
        } else {
            f.write_str(&self.request_id)
        }
    }
}

/// Used at the `links` field of the [`Help`] struct. Describes a URL link.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpLink {
    /// Description of what the link offers.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// URL of the link.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

impl HelpLink {
    /// Creates a new [`HelpLink`] struct.
    #[must_use]
    pub fn new(description: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            url: url.into(),
        }
    }
}

/// Used to encode help links for the client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Help {
    /// Links pointing to additional information on how to handle the error.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<HelpLink>,
}

impl Help {
    /// Creates a new [`Help`] struct.
    #[must_use]
    pub fn new(links: impl Into<Vec<HelpLink>>) -> Self {
        Self {
            links: links.into(),
        }
    }

    /// Creates a new [`Help`] struct with a single [`HelpLink`].
    #[must_use]
    pub fn with_link(description: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(vec![HelpLink::new(description, url)])
    }
}

impl fmt::Display for Help {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "type: {TYPE_URL_HELP:?}")?;
            writeln!(f, "links:")?;
            for link in &self.links {
                writeln!(f, "\t{}: {:?}", link.description, link.url)?;
            }
            Ok(())
        } else {
            write!(f, "help({})", self.links.len())
        }
    }
}

/// Used to provide an error message localized to the client's locale.
///
/// The locale travels in the `local` JSON field;
/// `locale` is accepted as well when decoding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizedMessage {
    /// Locale used, following the specification defined in [BCP 47].
    /// For example: `en-US`, `fr-CH` or `es-MX`.
    ///
    /// [BCP 47]: http://www.rfc-editor.org/rfc/bcp/bcp47.txt
    #[serde(
        rename = "local",
        alias = "locale",
        skip_serializing_if = "String::is_empty"
    )]
    pub locale: String,

    /// Message corresponding to the locale.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl LocalizedMessage {
    /// Creates a new [`LocalizedMessage`] struct.
    #[must_use]
    pub fn new(locale: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LocalizedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "type: {TYPE_URL_LOCALIZED_MESSAGE:?}")?;
            writeln!(f, "local: {:?}", self.locale)?;
            writeln!(f, "message: {:?}", self.message)
        } else {
            f.write_str(&self.message)
        }
    }
}

impl_detail! {
    DebugInfo => TYPE_URL_DEBUG_INFO,
    ResourceInfo => TYPE_URL_RESOURCE_INFO,
    BadRequest => TYPE_URL_BAD_REQUEST,
    PreconditionFailure => TYPE_URL_PRECONDITION_FAILURE,
    ErrorInfo => TYPE_URL_ERROR_INFO,
    QuotaFailure => TYPE_URL_QUOTA_FAILURE,
    RequestInfo => TYPE_URL_REQUEST_INFO,
    Help => TYPE_URL_HELP,
    LocalizedMessage => TYPE_URL_LOCALIZED_MESSAGE,
}
