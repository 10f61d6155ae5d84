//! Constructors for the common combinations of status code and detail.

use crate::{
    AnnotatedError, BoxError, Code, annotate,
    detail::{BadRequest, DebugInfo, ErrorInfo, PreconditionFailure, QuotaFailure, ResourceInfo},
};

macro_rules! predefined {
    ($(
        $(#[$meta:meta])*
        $name:ident($($arg:ident: $detail:ty)?) => $code:ident;
    )+) => {
        impl AnnotatedError {
            $(
                $(#[$meta])*
                #[doc = ""]
                #[doc = concat!("The message is the text of `cause`, the code [`Code::", stringify!($code), "`].")]
                pub fn $name(cause: impl Into<BoxError> $(, $arg: $detail)?) -> Self {
                    annotate(cause, (Code::$code, $($arg,)?))
                }
            )+
        }
    };
}

predefined! {
    /// A requested resource could not be found.
    not_found(detail: ResourceInfo) => NOT_FOUND;

    /// The client sent an invalid request.
    bad_request(detail: BadRequest) => INVALID_ARGUMENT;

    /// The system is not in the state required for the operation.
    failed_precondition(detail: PreconditionFailure) => FAILED_PRECONDITION;

    /// A request argument was outside of its valid range.
    out_of_range(detail: BadRequest) => OUT_OF_RANGE;

    /// The request lacks valid authentication credentials.
    unauthenticated(detail: ErrorInfo) => UNAUTHENTICATED;

    /// The caller is not permitted to perform the operation.
    permission_denied(detail: ErrorInfo) => PERMISSION_DENIED;

    /// The operation was aborted, typically due to a concurrency conflict.
    aborted(detail: ErrorInfo) => ABORTED;

    /// The resource the client tried to create already exists.
    already_exists(detail: ResourceInfo) => ALREADY_EXISTS;

    /// A quota or rate limit was exhausted.
    resource_exhausted(detail: QuotaFailure) => RESOURCE_EXHAUSTED;

    /// The operation was cancelled by the caller.
    cancelled() => CANCELLED;

    /// Unrecoverable data loss or corruption.
    data_loss(detail: DebugInfo) => DATA_LOSS;

    /// An error of unknown nature.
    unknown(detail: DebugInfo) => UNKNOWN;

    /// An internal invariant was broken.
    internal(detail: DebugInfo) => INTERNAL;

    /// The operation is not implemented.
    unimplemented() => UNIMPLEMENTED;

    /// The service is temporarily unavailable.
    unavailable(detail: DebugInfo) => UNAVAILABLE;

    /// The deadline expired before the operation completed.
    deadline_exceeded(detail: DebugInfo) => DEADLINE_EXCEEDED;
}
