//! Projections of an error chain.
//!
//! All functions in this module walk the chain of an error through
//! [`Error::source`], outermost link first, and summarize what they find:
//! codes and details of [`AnnotatedError`] links, bare [`Code`] links
//! and well-known cancellation and deadline errors.

use std::{error::Error, fmt, io, sync::Arc};

use crate::{
    AnnotatedError, BoxError, Code,
    detail::{SharedDetail, TYPE_URL_DEBUG_INFO},
    error::{Canceled, Chain, SharedError, TimeoutExpired, Transient},
};

/// The code carried by a single link of a chain, if any.
fn link_code(link: &(dyn Error + 'static)) -> Option<Code> {
    if let Some(annotated) = link.downcast_ref::<AnnotatedError>() {
        return Some(annotated.code);
    }
    link.downcast_ref::<Code>().copied()
}

/// Map well-known cancellation and deadline errors to their code.
fn sentinel_code(link: &(dyn Error + 'static)) -> Option<Code> {
    if link.is::<Canceled>() {
        return Some(Code::CANCELLED);
    }
    if link.is::<TimeoutExpired>() || link.is::<tokio::time::error::Elapsed>() {
        return Some(Code::DEADLINE_EXCEEDED);
    }
    if let Some(err) = link.downcast_ref::<tokio::task::JoinError>() {
        return err.is_cancelled().then_some(Code::CANCELLED);
    }
    if let Some(err) = link.downcast_ref::<io::Error>() {
        return (err.kind() == io::ErrorKind::TimedOut).then_some(Code::DEADLINE_EXCEEDED);
    }
    None
}

/// Resolve the status code of an error.
///
/// This is the first non-[`Code::OK`] code found in the chain, looking at
/// both [`AnnotatedError`] links and bare [`Code`] links. Chains without
/// such a code resolve to [`Code::CANCELLED`] or [`Code::DEADLINE_EXCEEDED`]
/// if they contain a well-known cancellation or deadline error
/// ([`Canceled`], [`TimeoutExpired`], tokio's `Elapsed`, a cancelled
/// tokio `JoinError` or an I/O error of kind `TimedOut`),
/// and to [`Code::UNKNOWN`] otherwise.
///
/// ```
/// use annotated_error::{Code, ErrorExt, TimeoutExpired, annotate, status_of};
///
/// let err = annotate(std::fmt::Error, Code::NOT_FOUND).context("load profile");
/// assert_eq!(status_of(&err), Code::NOT_FOUND);
///
/// let err = TimeoutExpired.context("load profile");
/// assert_eq!(status_of(&err), Code::DEADLINE_EXCEEDED);
///
/// assert_eq!(status_of(&std::fmt::Error), Code::UNKNOWN);
/// ```
#[must_use]
pub fn status_of(err: &(dyn Error + 'static)) -> Code {
    Chain::new(err)
        .filter_map(link_code)
        .find(|code| !code.is_ok())
        .or_else(|| Chain::new(err).find_map(sentinel_code))
        .unwrap_or(Code::UNKNOWN)
}

/// Resolve the status code of an optional error, see [`status_of`].
///
/// Returns [`Code::OK`] if and only if there is no error.
#[must_use]
pub fn status_of_opt(err: Option<&(dyn Error + 'static)>) -> Code {
    err.map_or(Code::OK, status_of)
}

/// Collect the details of all [`AnnotatedError`] links in the chain,
/// in chain order.
#[must_use]
pub fn details_of(err: &(dyn Error + 'static)) -> Vec<SharedDetail> {
    Chain::new(err)
        .filter_map(|link| link.downcast_ref::<AnnotatedError>())
        .flat_map(|annotated| annotated.details.iter().cloned())
        .collect()
}

/// Returns `true` if the error is temporary, and the operation
/// that failed with it can be retried.
///
/// An error is temporary if any link of its chain has [`Code::UNAVAILABLE`]
/// as code, is marked as [`Transient`], or is an I/O error of kind
/// `WouldBlock`, `Interrupted` or `TimedOut`.
#[must_use]
pub fn temporary(err: &(dyn Error + 'static)) -> bool {
    Chain::new(err).any(|link| {
        if link_code(link).is_some_and(Code::is_retryable) || link.is::<Transient>() {
            return true;
        }
        link.downcast_ref::<io::Error>().is_some_and(|err| {
            matches!(
                err.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
            )
        })
    })
}

/// Maps a detail to another detail, or drops it by returning `None`.
///
/// Mappers are applied when flattening and encoding errors,
/// and must be free of side effects.
/// Any `Fn(SharedDetail) -> Option<SharedDetail>` is a [`DetailMapper`].
pub trait DetailMapper: Send + Sync + 'static {
    /// Map a single detail.
    fn map_detail(&self, detail: SharedDetail) -> Option<SharedDetail>;
}

impl<F> DetailMapper for F
where
    F: Fn(SharedDetail) -> Option<SharedDetail> + Send + Sync + 'static,
{
    fn map_detail(&self, detail: SharedDetail) -> Option<SharedDetail> {
        self(detail)
    }
}

/// A [`DetailMapper`] dropping all [`DebugInfo`] details.
///
/// [`DebugInfo`]: crate::detail::DebugInfo
#[must_use]
pub fn hide_debug_info(detail: SharedDetail) -> Option<SharedDetail> {
    (detail.type_url() != TYPE_URL_DEBUG_INFO).then_some(detail)
}

/// An ordered pipeline of [`DetailMapper`]s.
///
/// Each detail is passed through all mappers in order. A mapper
/// returning `None` drops the detail, skipping all remaining mappers.
#[derive(Clone, Default)]
pub struct DetailMappers(Vec<Arc<dyn DetailMapper>>);

impl DetailMappers {
    /// Create an empty pipeline, which keeps all details as is.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mapper to the pipeline.
    #[must_use]
    pub fn with_mapper(mut self, mapper: impl DetailMapper) -> Self {
        self.push(mapper);
        self
    }

    /// Append a mapper to the pipeline.
    pub fn push(&mut self, mapper: impl DetailMapper) -> &mut Self {
        self.0.push(Arc::new(mapper));
        self
    }

    /// Returns `true` if the pipeline has no mappers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pass a single detail through the pipeline.
    #[must_use]
    pub fn map(&self, detail: SharedDetail) -> Option<SharedDetail> {
        self.0
            .iter()
            .try_fold(detail, |detail, mapper| mapper.map_detail(detail))
    }

    /// Pass all details through the pipeline, preserving their order.
    #[must_use]
    pub fn apply(&self, details: impl IntoIterator<Item = SharedDetail>) -> Vec<SharedDetail> {
        details
            .into_iter()
            .filter_map(|detail| self.map(detail))
            .collect()
    }
}

impl fmt::Debug for DetailMappers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailMappers")
            .field("len", &self.0.len())
            .finish()
    }
}

impl<M: DetailMapper> FromIterator<M> for DetailMappers {
    fn from_iter<T: IntoIterator<Item = M>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|mapper| Arc::new(mapper) as Arc<dyn DetailMapper>)
                .collect(),
        )
    }
}

/// Summarize a chain without taking ownership of it.
pub(crate) fn summarize(
    err: &(dyn Error + 'static),
    mappers: &DetailMappers,
) -> (Code, String, Vec<SharedDetail>) {
    let code = status_of(err);
    let message = Chain::new(err)
        .map(ToString::to_string)
        .find(|message| !message.is_empty())
        .unwrap_or_default();
    let details = mappers.apply(details_of(err));
    (code, message, details)
}

/// The innermost link of a chain that can be shared.
///
/// Causes are followed through [`AnnotatedError`] links, which hold them
/// shared, up to the first foreign link.
fn innermost_cause(root: BoxError) -> Option<SharedError> {
    let annotated = match root.downcast::<AnnotatedError>() {
        Ok(annotated) => annotated,
        Err(foreign) => return Some(Arc::from(foreign)),
    };

    let mut cause = annotated.cause?;
    loop {
        let next = cause
            .downcast_ref::<AnnotatedError>()
            .and_then(|inner| inner.cause.clone());
        match next {
            Some(next) => cause = next,
            None => return Some(cause),
        }
    }
}

/// Flatten the chain of an error into a single [`AnnotatedError`].
///
/// - the code is resolved as by [`status_of`];
/// - the message is the text of the outermost link with a non-empty text;
/// - the details are those of all annotated links, in chain order,
///   passed through the `mappers`;
/// - the cause is the innermost link reachable through the causes of the
///   annotated links, the outermost link itself if it is a foreign error.
///   A foreign wrapper ends the walk, as only annotated links hold their
///   cause as a shareable [`SharedError`](crate::SharedError).
///
/// Flattening is idempotent for idempotent mappers.
///
/// ```
/// use annotated_error::{Code, DetailMappers, Message, annotate, flatten};
/// use annotated_error::detail::{DebugInfo, RequestInfo};
///
/// let inner = annotate(std::fmt::Error, (Code::DATA_LOSS, DebugInfo::new(vec![], "x")));
/// let outer = annotate(annotated_error::ErrorExt::context(inner, "write"), RequestInfo::new("r", ""));
///
/// let flat = flatten(outer, &DetailMappers::new().with_mapper(annotated_error::hide_debug_info));
/// assert_eq!(flat.code(), Code::DATA_LOSS);
/// assert_eq!(flat.message(), "write: an error occurred when formatting an argument");
/// assert_eq!(flat.details().len(), 1);
/// ```
pub fn flatten(err: impl Into<BoxError>, mappers: &DetailMappers) -> AnnotatedError {
    let root: BoxError = err.into();
    let (code, message, details) = summarize(&*root, mappers);
    AnnotatedError::from_parts(innermost_cause(root), code, message, details)
}
