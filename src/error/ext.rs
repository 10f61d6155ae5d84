use std::{
    error::Error,
    fmt::{self, Debug, Display},
};

use super::{AnnotatedError, BoxError, Chain, annotate};
use crate::annotate::Annotation;

/// Extends `Result` with methods to annotate the contained error.
///
/// # Examples
///
/// ```
/// use annotated_error::{AnnotateExt, Code, Message};
///
/// let result = "hello"
///     .parse::<i32>()
///     .annotate((Code::INVALID_ARGUMENT, Message::new("parse age")));
/// let err = result.unwrap_err();
/// assert_eq!(err.code(), Code::INVALID_ARGUMENT);
/// assert_eq!(err.to_string(), "parse age: invalid digit found in string");
/// ```
pub trait AnnotateExt: private::SealedAnnotateExt {
    /// The result type after annotating the contained error.
    type Annotated;

    /// Annotate the contained error, see [`annotate`].
    fn annotate<A>(self, annotations: A) -> Self::Annotated
    where
        A: Annotation;

    /// Lazily annotate the contained error, if any.
    fn with_annotation<A, F>(self, annotations: F) -> Self::Annotated
    where
        A: Annotation,
        F: FnOnce() -> A;
}

impl<T, E> AnnotateExt for Result<T, E>
where
    E: Into<BoxError>,
{
    type Annotated = Result<T, AnnotatedError>;

    fn annotate<A>(self, annotations: A) -> Self::Annotated
    where
        A: Annotation,
    {
        self.map_err(|error| annotate(error, annotations))
    }

    fn with_annotation<A, F>(self, annotations: F) -> Self::Annotated
    where
        A: Annotation,
        F: FnOnce() -> A,
    {
        self.map_err(|error| annotate(error, annotations()))
    }
}

/// Extends the `Error` type with methods for working with error chains.
///
/// # Examples
///
/// ```
/// use annotated_error::ErrorExt;
///
/// let error = std::fmt::Error.context("render template");
/// assert_eq!(error.to_string(), "render template: an error occurred when formatting an argument");
/// assert_eq!(error.chain().len(), 2);
/// assert!(error.root_cause().is::<std::fmt::Error>());
/// ```
pub trait ErrorExt: private::SealedErrorExt {
    /// Wrap the error in a context, printed as `context: error`.
    fn context<M>(self, context: M) -> ContextError<M>
    where
        M: Display + Debug + Send + Sync + 'static;

    /// Iterate over the chain of errors, starting with this error.
    fn chain(&self) -> Chain<'_>;

    /// Get the root cause of the error.
    fn root_cause(&self) -> &(dyn Error + 'static);
}

impl<E: Error + Send + Sync + 'static> ErrorExt for E {
    fn context<M>(self, context: M) -> ContextError<M>
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        ContextError {
            context,
            error: Box::new(self),
        }
    }

    fn chain(&self) -> Chain<'_> {
        Chain::new(self)
    }

    fn root_cause(&self) -> &(dyn Error + 'static) {
        self.chain()
            .last()
            .unwrap_or(self as &(dyn Error + 'static))
    }
}

/// An error wrapped with a context message, created by [`ErrorExt::context`].
///
/// The wrapped error is exposed as its [`source`](Error::source).
pub struct ContextError<M> {
    context: M,
    error: BoxError,
}

impl<M> ContextError<M> {
    /// Wrap any error with a context message.
    pub fn new(context: M, error: impl Into<BoxError>) -> Self {
        Self {
            context,
            error: error.into(),
        }
    }
}

impl<M: Debug> Debug for ContextError<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextError")
            .field("context", &self.context)
            .field("error", &self.error)
            .finish()
    }
}

impl<M: Display> Display for ContextError<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.error)
    }
}

impl<M: Display + Debug> Error for ContextError<M> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.error.as_ref())
    }
}

mod private {
    pub trait SealedAnnotateExt {}

    impl<T, E> SealedAnnotateExt for Result<T, E> where E: Into<super::BoxError> {}

    pub trait SealedErrorExt {}

    impl<E: std::error::Error + Send + Sync + 'static> SealedErrorExt for E {}
}
