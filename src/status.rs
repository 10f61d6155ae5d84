use std::{borrow::Cow, convert::Infallible, error::Error, fmt, str::FromStr};

/// Canonical status codes carried by an [`AnnotatedError`].
///
/// The codes match the [gRPC status codes], each one mapped onto the
/// HTTP status code an API gateway would answer with.
///
/// A `Code` is a thin wrapper around its integer value, so codes received
/// from peers that are out of the canonical range stay representable.
/// Such codes render as `500 Code(<n>)` and are treated as [`Code::UNKNOWN`]
/// whenever they get re-decoded.
///
/// ```
/// use annotated_error::Code;
///
/// assert_eq!(Code::NOT_FOUND.http(), 404);
/// assert_eq!(Code::NOT_FOUND.to_string(), "404 NOT_FOUND");
/// assert_eq!(Code::from_name("not_found"), Code::NOT_FOUND);
/// ```
///
/// [gRPC status codes]: https://github.com/grpc/grpc/blob/master/doc/statuscodes.md#status-codes-and-their-use-in-grpc
/// [`AnnotatedError`]: crate::AnnotatedError
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Code(i32);

impl Code {
    /// The operation completed successfully.
    pub const OK: Self = Self(0);

    /// The operation was cancelled.
    pub const CANCELLED: Self = Self(1);

    /// Unknown error.
    pub const UNKNOWN: Self = Self(2);

    /// Client specified an invalid argument.
    pub const INVALID_ARGUMENT: Self = Self(3);

    /// Deadline expired before operation could complete.
    pub const DEADLINE_EXCEEDED: Self = Self(4);

    /// Some requested entity was not found.
    pub const NOT_FOUND: Self = Self(5);

    /// Some entity that we attempted to create already exists.
    pub const ALREADY_EXISTS: Self = Self(6);

    /// The caller does not have permission to execute the specified operation.
    pub const PERMISSION_DENIED: Self = Self(7);

    /// Some resource has been exhausted.
    pub const RESOURCE_EXHAUSTED: Self = Self(8);

    /// The system is not in a state required for the operation's execution.
    pub const FAILED_PRECONDITION: Self = Self(9);

    /// The operation was aborted.
    pub const ABORTED: Self = Self(10);

    /// Operation was attempted past the valid range.
    pub const OUT_OF_RANGE: Self = Self(11);

    /// Operation is not implemented or not supported.
    pub const UNIMPLEMENTED: Self = Self(12);

    /// Internal error.
    pub const INTERNAL: Self = Self(13);

    /// The service is currently unavailable.
    pub const UNAVAILABLE: Self = Self(14);

    /// Unrecoverable data loss or corruption.
    pub const DATA_LOSS: Self = Self(15);

    /// The request does not have valid authentication credentials
    pub const UNAUTHENTICATED: Self = Self(16);

    /// All canonical codes, in integer order.
    pub const ALL: [Self; 17] = [
        Self::OK,
        Self::CANCELLED,
        Self::UNKNOWN,
        Self::INVALID_ARGUMENT,
        Self::DEADLINE_EXCEEDED,
        Self::NOT_FOUND,
        Self::ALREADY_EXISTS,
        Self::PERMISSION_DENIED,
        Self::RESOURCE_EXHAUSTED,
        Self::FAILED_PRECONDITION,
        Self::ABORTED,
        Self::OUT_OF_RANGE,
        Self::UNIMPLEMENTED,
        Self::INTERNAL,
        Self::UNAVAILABLE,
        Self::DATA_LOSS,
        Self::UNAUTHENTICATED,
    ];

    /// Create a `Code` from its raw integer value, without any validation.
    ///
    /// Use [`Code::from_i32`] when out-of-range values
    /// should collapse into [`Code::UNKNOWN`].
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Get the raw integer value of this `Code`.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Create a `Code` from an integer, mapping out-of-range values
    /// to [`Code::UNKNOWN`].
    #[must_use]
    pub const fn from_i32(i: i32) -> Self {
        if Self(i).is_valid() {
            Self(i)
        } else {
            Self::UNKNOWN
        }
    }

    /// Returns `true` if this is one of the 17 canonical codes.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        0 <= self.0 && self.0 < 17
    }

    /// Returns `true` for [`Code::OK`].
    #[must_use]
    pub const fn is_ok(self) -> bool {
        self.0 == Self::OK.0
    }

    /// Returns `true` if the failure is transient and the call can be retried,
    /// which is only the case for [`Code::UNAVAILABLE`].
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        self.0 == Self::UNAVAILABLE.0
    }

    /// The HTTP status code mapped to this `Code`.
    ///
    /// Codes outside of the canonical range map to `500`.
    #[must_use]
    pub const fn http(self) -> u16 {
        match self.0 {
            0 => 200,
            1 => 499,
            2 => 500,
            3 => 400,
            4 => 504,
            5 => 404,
            6 => 409,
            7 => 403,
            8 => 429,
            9 => 400,
            10 => 409,
            11 => 400,
            12 => 501,
            13 => 500,
            14 => 503,
            15 => 500,
            16 => 401,
            _ => 500,
        }
    }

    /// The canonical uppercase name of a valid `Code`, `None` otherwise.
    #[must_use]
    pub const fn as_str(self) -> Option<&'static str> {
        Some(match self.0 {
            0 => "OK",
            1 => "CANCELLED",
            2 => "UNKNOWN",
            3 => "INVALID_ARGUMENT",
            4 => "DEADLINE_EXCEEDED",
            5 => "NOT_FOUND",
            6 => "ALREADY_EXISTS",
            7 => "PERMISSION_DENIED",
            8 => "RESOURCE_EXHAUSTED",
            9 => "FAILED_PRECONDITION",
            10 => "ABORTED",
            11 => "OUT_OF_RANGE",
            12 => "UNIMPLEMENTED",
            13 => "INTERNAL",
            14 => "UNAVAILABLE",
            15 => "DATA_LOSS",
            16 => "UNAUTHENTICATED",
            _ => return None,
        })
    }

    /// The canonical uppercase name of this `Code`.
    ///
    /// Out-of-range codes are named `Code(<n>)`.
    #[must_use]
    pub fn name(self) -> Cow<'static, str> {
        match self.as_str() {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("Code({})", self.0)),
        }
    }

    /// Resolve a `Code` by its canonical name, ignoring ASCII case.
    ///
    /// Returns [`Code::UNKNOWN`] if the name matches no canonical code.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|code| {
                code.as_str()
                    .is_some_and(|canonical| canonical.eq_ignore_ascii_case(name))
            })
            .unwrap_or(Self::UNKNOWN)
    }

    /// Derive a `Code` from an HTTP status code.
    ///
    /// This is the reverse of [`Code::http`] where that mapping is ambiguous
    /// (e.g. `400`), falling back to the most generic code for the status class.
    #[must_use]
    pub const fn from_http(status: u16) -> Self {
        match status {
            200..=299 => Self::OK,
            400 => Self::INVALID_ARGUMENT,
            401 => Self::UNAUTHENTICATED,
            403 => Self::PERMISSION_DENIED,
            404 => Self::NOT_FOUND,
            409 => Self::ABORTED,
            429 => Self::RESOURCE_EXHAUSTED,
            499 => Self::CANCELLED,
            501 => Self::UNIMPLEMENTED,
            503 => Self::UNAVAILABLE,
            504 => Self::DEADLINE_EXCEEDED,
            402..=498 => Self::FAILED_PRECONDITION,
            500..=599 => Self::INTERNAL,
            _ => Self::UNKNOWN,
        }
    }

    /// Get a human readable description of this `Code`.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self.0 {
            0 => "The operation completed successfully",
            1 => "The operation was cancelled",
            2 => "Unknown error",
            3 => "Client specified an invalid argument",
            4 => "Deadline expired before operation could complete",
            5 => "Some requested entity was not found",
            6 => "Some entity that we attempted to create already exists",
            7 => "The caller does not have permission to execute the specified operation",
            8 => "Some resource has been exhausted",
            9 => "The system is not in a state required for the operation's execution",
            10 => "The operation was aborted",
            11 => "Operation was attempted past the valid range",
            12 => "Operation is not implemented or not supported",
            13 => "Internal error",
            14 => "The service is currently unavailable",
            15 => "Unrecoverable data loss or corruption",
            16 => "The request does not have valid authentication credentials",
            _ => "Unrecognized status code",
        }
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(name) => f.write_str(name),
            None => write!(f, "Code({})", self.0),
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.http(), self.name())
    }
}

impl Error for Code {}

impl FromStr for Code {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl From<i32> for Code {
    fn from(i: i32) -> Self {
        Self::from_i32(i)
    }
}

impl From<Code> for i32 {
    fn from(code: Code) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_mapping() {
        let expected = [
            200, 499, 500, 400, 504, 404, 409, 403, 429, 400, 409, 400, 501, 500, 503, 500, 401,
        ];
        for (code, http) in Code::ALL.into_iter().zip(expected) {
            assert_eq!(code.http(), http, "{code:?}");
        }
    }

    #[test]
    fn display() {
        assert_eq!(Code::OK.to_string(), "200 OK");
        assert_eq!(Code::INTERNAL.to_string(), "500 INTERNAL");
        assert_eq!(Code::UNAUTHENTICATED.to_string(), "401 UNAUTHENTICATED");
        assert_eq!(Code::new(17).to_string(), "500 Code(17)");
        assert_eq!(Code::new(-1).to_string(), "500 Code(-1)");
    }

    #[test]
    fn from_name() {
        for code in Code::ALL {
            assert_eq!(Code::from_name(&code.name()), code);
            assert_eq!(Code::from_name(&code.name().to_lowercase()), code);
        }
        assert_eq!(Code::from_name("Not_Found"), Code::NOT_FOUND);
        assert_eq!(Code::from_name(""), Code::UNKNOWN);
        assert_eq!(Code::from_name("NOPE"), Code::UNKNOWN);
        assert_eq!(Code::from_name("Code(17)"), Code::UNKNOWN);
        assert_eq!("aborted".parse::<Code>(), Ok(Code::ABORTED));
    }

    #[test]
    fn validity() {
        assert!(Code::ALL.iter().all(|code| code.is_valid()));
        assert!(!Code::new(17).is_valid());
        assert!(!Code::new(-1).is_valid());
        assert_eq!(Code::from_i32(17), Code::UNKNOWN);
        assert_eq!(Code::from_i32(14), Code::UNAVAILABLE);
    }

    #[test]
    fn retryable() {
        for code in Code::ALL {
            assert_eq!(code.is_retryable(), code == Code::UNAVAILABLE);
        }
    }

    #[test]
    fn from_http() {
        assert_eq!(Code::from_http(204), Code::OK);
        assert_eq!(Code::from_http(404), Code::NOT_FOUND);
        assert_eq!(Code::from_http(418), Code::FAILED_PRECONDITION);
        assert_eq!(Code::from_http(502), Code::INTERNAL);
        assert_eq!(Code::from_http(503), Code::UNAVAILABLE);
        assert_eq!(Code::from_http(302), Code::UNKNOWN);
    }

    #[test]
    fn debug_name() {
        assert_eq!(format!("{:?}", Code::DATA_LOSS), "DATA_LOSS");
        assert_eq!(format!("{:?}", Code::new(42)), "Code(42)");
    }

    #[quickcheck_macros::quickcheck]
    fn name_roundtrip(i: i32) -> bool {
        let code = Code::new(i);
        if code.is_valid() {
            Code::from_name(&code.name()) == code
        } else {
            Code::from_name(&code.name()) == Code::UNKNOWN
        }
    }
}
