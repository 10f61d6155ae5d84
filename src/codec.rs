//! JSON encoding and decoding of errors.
//!
//! Errors travel in a canonical envelope:
//!
//! ```json
//! { "error": {
//!     "code":    404,
//!     "message": "user 42: sql: no rows in result set",
//!     "status":  "NOT_FOUND",
//!     "details": [ { "@type": "type.googleapis.com/google.rpc.ResourceInfo", "resourceName": "42" } ] } }
//! ```
//!
//! All members of the `error` body are optional, empty ones are omitted.
//! The [`Encoder`] flattens the error chain before writing the envelope.
//! The [`Decoder`] rebuilds an [`AnnotatedError`] of which the cause is the
//! decoded status [`Code`], decoding details through the type-url
//! [`registry`](crate::detail::registry).

use std::{borrow::Cow, error::Error, fmt, io, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Value, value::RawValue};

use crate::{
    AnnotatedError, Code,
    detail::{SharedDetail, registry},
    project::{DetailMapper, DetailMappers, hide_debug_info, summarize},
};

/// Error returned by the [`Encoder`] and [`Decoder`].
#[derive(Debug)]
pub enum CodecError {
    /// The envelope is not valid JSON, does not have the expected shape,
    /// or could not be read or written.
    Json(serde_json::Error),
    /// A single detail could not be encoded or decoded.
    Detail {
        /// Position of the detail in the `details` array.
        index: usize,
        /// The underlying error.
        source: serde_json::Error,
    },
}

impl CodecError {
    /// Returns `true` if the error was caused by the underlying reader or writer.
    #[must_use]
    pub fn is_io(&self) -> bool {
        match self {
            Self::Json(err) | Self::Detail { source: err, .. } => err.is_io(),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "error envelope: {err}"),
            Self::Detail { index, source } => write!(f, "error detail {index}: {source}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) | Self::Detail { source: err, .. } => Some(err),
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

#[derive(Debug, Serialize)]
struct EnvelopeRef<'a> {
    error: BodyRef<'a>,
}

#[derive(Debug, Default, Serialize)]
struct BodyRef<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<u16>,
    #[serde(skip_serializing_if = "str::is_empty")]
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<Cow<'static, str>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Envelope {
    error: Option<Body>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Body {
    message: Option<String>,
    status: Option<String>,
    details: Option<Vec<Box<RawValue>>>,
}

/// Encodes errors into their JSON envelope.
///
/// ```
/// use annotated_error::{Code, codec::Encoder, annotate, detail::DebugInfo};
///
/// let err = annotate("connection refused", (Code::UNAVAILABLE, DebugInfo::new(vec![], "dial")));
/// let json = Encoder::new().with_hide_debug_info().encode_to_vec(&err).unwrap();
/// assert_eq!(
///     String::from_utf8(json).unwrap(),
///     r#"{"error":{"code":503,"message":"connection refused","status":"UNAVAILABLE"}}"#,
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    mappers: DetailMappers,
    pretty: bool,
}

impl Encoder {
    /// Create a new [`Encoder`], which keeps all details as is.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a [`DetailMapper`] to the detail pipeline of this encoder.
    #[must_use]
    pub fn with_mapper(mut self, mapper: impl DetailMapper) -> Self {
        self.mappers.push(mapper);
        self
    }

    /// Append a [`DetailMapper`] to the detail pipeline of this encoder.
    pub fn set_mapper(&mut self, mapper: impl DetailMapper) -> &mut Self {
        self.mappers.push(mapper);
        self
    }

    /// Replace the detail pipeline of this encoder.
    #[must_use]
    pub fn with_mappers(mut self, mappers: DetailMappers) -> Self {
        self.mappers = mappers;
        self
    }

    /// Replace the detail pipeline of this encoder.
    pub fn set_mappers(&mut self, mappers: DetailMappers) -> &mut Self {
        self.mappers = mappers;
        self
    }

    /// Drop all [`DebugInfo`] details, see [`hide_debug_info`].
    ///
    /// [`DebugInfo`]: crate::detail::DebugInfo
    #[must_use]
    pub fn with_hide_debug_info(self) -> Self {
        self.with_mapper(hide_debug_info)
    }

    /// Drop all [`DebugInfo`] details, see [`hide_debug_info`].
    ///
    /// [`DebugInfo`]: crate::detail::DebugInfo
    pub fn set_hide_debug_info(&mut self) -> &mut Self {
        self.set_mapper(hide_debug_info)
    }

    /// Write indented JSON instead of compact JSON.
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Write indented JSON instead of compact JSON.
    pub fn set_pretty(&mut self, pretty: bool) -> &mut Self {
        self.pretty = pretty;
        self
    }

    /// Encode `err` as JSON envelope into `writer`.
    pub fn encode<W: io::Write>(
        &self,
        err: &(dyn Error + 'static),
        writer: W,
    ) -> Result<(), CodecError> {
        self.encode_opt(Some(err), writer)
    }

    /// Encode an optional error as JSON envelope into `writer`.
    ///
    /// The absence of an error is encoded with an empty body: `{"error":{}}`.
    pub fn encode_opt<W: io::Write>(
        &self,
        err: Option<&(dyn Error + 'static)>,
        writer: W,
    ) -> Result<(), CodecError> {
        let summary = err.map(|err| summarize(err, &self.mappers));
        let body = match &summary {
            Some((code, message, details)) => body_ref(*code, message, details)?,
            None => BodyRef::default(),
        };
        let envelope = EnvelopeRef { error: body };

        if self.pretty {
            serde_json::to_writer_pretty(writer, &envelope)?;
        } else {
            serde_json::to_writer(writer, &envelope)?;
        }
        Ok(())
    }

    /// Encode `err` as JSON envelope into a byte vector.
    pub fn encode_to_vec(&self, err: &(dyn Error + 'static)) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::with_capacity(128);
        self.encode(err, &mut buf)?;
        Ok(buf)
    }

    /// Encode `err` as JSON envelope value.
    pub fn to_value(&self, err: &(dyn Error + 'static)) -> Result<Value, CodecError> {
        let (code, message, details) = summarize(err, &self.mappers);
        let envelope = EnvelopeRef {
            error: body_ref(code, &message, &details)?,
        };
        Ok(serde_json::to_value(envelope)?)
    }
}

fn body_ref<'a>(
    code: Code,
    message: &'a str,
    details: &[SharedDetail],
) -> Result<BodyRef<'a>, CodecError> {
    let details = details
        .iter()
        .enumerate()
        .map(|(index, detail)| {
            detail
                .to_json()
                .map_err(|source| CodecError::Detail { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if code.is_ok() && message.is_empty() && details.is_empty() {
        return Ok(BodyRef::default());
    }

    Ok(BodyRef {
        code: Some(code.http()),
        message,
        status: Some(code.name()),
        details,
    })
}

/// Decodes errors from their JSON envelope.
///
/// ```
/// use annotated_error::{Code, codec::Decoder, status_of};
///
/// let err = Decoder::new()
///     .decode_slice(br#"{"error":{"code":404,"message":"no such user","status":"NOT_FOUND"}}"#)
///     .unwrap();
/// assert_eq!(status_of(&err), Code::NOT_FOUND);
/// assert_eq!(err.to_string(), "no such user");
/// ```
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct Decoder;

impl Decoder {
    /// Create a new [`Decoder`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decode an error from the JSON envelope read from `reader`.
    pub fn decode<R: io::Read>(&self, reader: R) -> Result<AnnotatedError, CodecError> {
        let envelope: Envelope = serde_json::from_reader(reader)?;
        into_error(envelope)
    }

    /// Decode an error from a JSON envelope.
    pub fn decode_slice(&self, bytes: &[u8]) -> Result<AnnotatedError, CodecError> {
        let envelope: Envelope = serde_json::from_slice(bytes)?;
        into_error(envelope)
    }
}

fn into_error(envelope: Envelope) -> Result<AnnotatedError, CodecError> {
    let body = envelope.error.unwrap_or_default();
    let code = Code::from_name(body.status.as_deref().unwrap_or_default());

    let details = body
        .details
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            registry::decode_detail(raw).map_err(|source| CodecError::Detail { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AnnotatedError::from_parts(
        Some(Arc::new(code)),
        code,
        body.message.unwrap_or_default(),
        details,
    ))
}

/// Encode `err` with a default [`Encoder`].
pub fn encode_to_vec(err: &(dyn Error + 'static)) -> Result<Vec<u8>, CodecError> {
    Encoder::new().encode_to_vec(err)
}

/// Decode an error with a default [`Decoder`].
pub fn decode_slice(bytes: &[u8]) -> Result<AnnotatedError, CodecError> {
    Decoder::new().decode_slice(bytes)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        Message, annotate,
        detail::{
            AnyDetail, BadRequest, DebugInfo, Detail, FieldViolation, RequestInfo, ResourceInfo,
            TYPE_URL_BAD_REQUEST, TYPE_URL_RESOURCE_INFO,
        },
        details_of, status_of,
    };

    const RAW_FULL: &str = r#"{"error":{"code":500,"message":"msg: sql: connection is already closed","status":"INTERNAL","details":[{"@type":"type.googleapis.com/google.rpc.ResourceInfo","resourceType":"1","resourceName":"2","owner":"3","description":"4"},{"@type":"type.googleapis.com/google.rpc.BadRequest","fieldViolations":[{"field":"1","description":"2"},{"field":"3","description":"4"}]}]}}"#;

    fn full_error() -> AnnotatedError {
        annotate(
            "sql: connection is already closed",
            (
                Code::INTERNAL,
                Message::new("msg"),
                ResourceInfo::new("1", "2", "3", "4"),
                BadRequest::new(vec![
                    FieldViolation::new("1", "2"),
                    FieldViolation::new("3", "4"),
                ]),
            ),
        )
    }

    #[test]
    fn encode_full() {
        let json = Encoder::new().encode_to_vec(&full_error()).unwrap();
        assert_eq!(String::from_utf8(json).unwrap(), RAW_FULL);
    }

    #[test]
    fn encode_hides_debug_info() {
        let err = full_error().annotate(DebugInfo::new(vec!["frame".to_owned()], "debug"));
        let err = annotate(err, DebugInfo::default());

        let json = Encoder::new()
            .with_hide_debug_info()
            .encode_to_vec(&err)
            .unwrap();
        assert_eq!(String::from_utf8(json).unwrap(), RAW_FULL);

        let json = Encoder::new().to_value(&err).unwrap();
        assert_eq!(json["error"]["details"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn encode_foreign_error() {
        let json = Encoder::new().to_value(&std::fmt::Error).unwrap();
        assert_eq!(
            json,
            json!({"error": {
                "code": 500,
                "message": "an error occurred when formatting an argument",
                "status": "UNKNOWN",
            }})
        );
    }

    #[test]
    fn encode_no_error() {
        let mut buf = Vec::new();
        Encoder::new().encode_opt(None, &mut buf).unwrap();
        assert_eq!(buf, br#"{"error":{}}"#);
    }

    #[test]
    fn encode_pretty() {
        let json = Encoder::new()
            .with_pretty(true)
            .encode_to_vec(&full_error())
            .unwrap();
        let json = String::from_utf8(json).unwrap();
        assert!(json.contains("\n  \"error\": {\n"));
        let compact: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(compact, serde_json::from_str::<Value>(RAW_FULL).unwrap());
    }

    #[test]
    fn decode_full() {
        let err = Decoder::new().decode(RAW_FULL.as_bytes()).unwrap();
        assert_eq!(status_of(&err), Code::INTERNAL);
        assert_eq!(err.code(), Code::INTERNAL);
        assert_eq!(err.to_string(), "msg: sql: connection is already closed");
        assert_eq!(
            err.source().unwrap().downcast_ref::<Code>(),
            Some(&Code::INTERNAL)
        );

        let details = details_of(&err);
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].type_url(), TYPE_URL_RESOURCE_INFO);
        assert_eq!(details[1].type_url(), TYPE_URL_BAD_REQUEST);
        assert_eq!(
            details[0].downcast_ref::<ResourceInfo>(),
            Some(&ResourceInfo::new("1", "2", "3", "4"))
        );
    }

    #[test]
    fn decode_unknown_type() {
        let err = decode_slice(
            br#"{"error":{"status":"aborted","details":[{"1":"2","@type":"codec/unknown"}]}}"#,
        )
        .unwrap();
        assert_eq!(err.code(), Code::ABORTED);
        let detail = err.details()[0].downcast_ref::<AnyDetail>().unwrap();
        assert_eq!(detail.type_url(), "codec/unknown");
        assert_eq!(detail.get("1"), Some(&Value::from("2")));
    }

    #[test]
    fn decode_lenient_body() {
        let err = decode_slice(br#"{"error":{"status":"NOPE","code":"x"}}"#).unwrap();
        assert_eq!(err.code(), Code::UNKNOWN);
        assert!(err.message().is_empty());

        let err = decode_slice(br#"{"other":1}"#).unwrap();
        assert_eq!(err.code(), Code::UNKNOWN);
        assert!(err.details().is_empty());

        let err = decode_slice(br#"{"error":null}"#).unwrap();
        assert_eq!(err.code(), Code::UNKNOWN);
    }

    #[test]
    fn decode_malformed() {
        assert!(matches!(
            decode_slice(b"{not json").unwrap_err(),
            CodecError::Json(_)
        ));
        assert!(matches!(
            decode_slice(br#"{"error":{"details":{}}}"#).unwrap_err(),
            CodecError::Json(_)
        ));
        assert!(matches!(
            decode_slice(br#"{"error":{"details":[{},"x"]}}"#).unwrap_err(),
            CodecError::Detail { index: 1, .. }
        ));
    }

    #[test]
    fn round_trip_keeps_order_and_fields() {
        let original = full_error().annotate(RequestInfo::new("req", "serving"));
        let json = encode_to_vec(&original).unwrap();
        let decoded = decode_slice(&json).unwrap();

        assert_eq!(decoded.code(), status_of(&original));
        assert_eq!(decoded.message(), original.message());
        assert_eq!(decoded.details().len(), original.details().len());
        for (a, b) in original.details().iter().zip(decoded.details()) {
            assert_eq!(a.type_url(), b.type_url());
            assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
        }
    }
}
