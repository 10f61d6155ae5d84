//! The annotation protocol.
//!
//! An [`AnnotatedError`] is built by applying [`Annotation`]s to it,
//! in order. Each annotation mutates the error under construction through
//! the [`Modifier`] capability: it can set the status code, wrap the message
//! with extra context, or append details.
//!
//! Status codes, strings, detail values and [`StackTrace`] tokens are all
//! annotations, as are `()`, `Option`s, `Vec`s and tuples of annotations.
//!
//! ```
//! use annotated_error::{Code, Message, annotate, detail::ResourceInfo};
//!
//! let err = annotate(
//!     std::io::Error::other("disk on fire"),
//!     (
//!         Code::UNAVAILABLE,
//!         Message::new("store blob"),
//!         ResourceInfo::new("blob", "b1", "", ""),
//!     ),
//! );
//! assert_eq!(err.code(), Code::UNAVAILABLE);
//! assert_eq!(err.message(), "store blob: disk on fire");
//! assert_eq!(err.details().len(), 1);
//! ```
//!
//! [`AnnotatedError`]: crate::AnnotatedError

use std::{backtrace::Backtrace, fmt};

use crate::{
    Code,
    detail::{DebugInfo, SharedDetail},
    macros::all_the_tuples,
};

/// Capability offered to [`Annotation`]s to mutate an error under construction.
pub trait Modifier {
    /// Replace the status code.
    fn set_code(&mut self, code: Code);

    /// Prepend context to the message.
    ///
    /// An empty message becomes `message`, otherwise the
    /// result is `message + ": " + current`.
    fn wrap_message(&mut self, message: &str);

    /// Append details, preserving their order.
    fn append_details(&mut self, details: Vec<SharedDetail>);
}

/// A value that knows how to annotate an error under construction.
pub trait Annotation {
    /// Apply this annotation to `target`.
    fn annotate(self, target: &mut dyn Modifier);
}

/// Prepend `message + ": "` to the message of an error
/// in [`Modifier::wrap_message`] fashion.
pub(crate) fn wrap_message(current: &mut String, message: &str) {
    if current.is_empty() {
        message.clone_into(current);
    } else {
        current.insert_str(0, ": ");
        current.insert_str(0, message);
    }
}

/// A message [`Annotation`], wrapping the message of the annotated error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Message(String);

impl Message {
    /// Create a new [`Message`].
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// View the message as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Message {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for Message {
    fn from(message: &str) -> Self {
        Self(message.to_owned())
    }
}

impl Annotation for Message {
    fn annotate(self, target: &mut dyn Modifier) {
        target.wrap_message(&self.0);
    }
}

impl Annotation for &str {
    fn annotate(self, target: &mut dyn Modifier) {
        target.wrap_message(self);
    }
}

impl Annotation for String {
    fn annotate(self, target: &mut dyn Modifier) {
        target.wrap_message(&self);
    }
}

impl Annotation for Code {
    fn annotate(self, target: &mut dyn Modifier) {
        target.set_code(self);
    }
}

/// Captures the call stack at the point where it is applied,
/// appending it as a [`DebugInfo`] detail with the token as `detail`.
///
/// ```
/// use annotated_error::{StackTrace, annotate, detail::DebugInfo};
///
/// let err = annotate(std::fmt::Error, StackTrace::new("checkout"));
/// let info = err.details()[0].downcast_ref::<DebugInfo>().unwrap();
/// assert_eq!(info.detail, "checkout");
/// assert!(!info.stack_entries.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackTrace(String);

impl StackTrace {
    /// Create a new [`StackTrace`] token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl Annotation for StackTrace {
    fn annotate(self, target: &mut dyn Modifier) {
        let stack_entries = Backtrace::force_capture()
            .to_string()
            .lines()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        DebugInfo::new(stack_entries, self.0).annotate(target);
    }
}

/// An [`Annotation`] created from a closure, see [`annotation_fn`].
#[derive(Clone)]
pub struct AnnotationFn<F>(F);

impl<F> fmt::Debug for AnnotationFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnnotationFn")
            .field(&std::any::type_name::<F>())
            .finish()
    }
}

/// Create an [`Annotation`] from a closure operating on the [`Modifier`].
///
/// ```
/// use annotated_error::{Code, annotate, annotation_fn};
///
/// let retry = true;
/// let err = annotate(
///     std::fmt::Error,
///     annotation_fn(|m| if retry { m.set_code(Code::UNAVAILABLE) }),
/// );
/// assert!(err.code().is_retryable());
/// ```
pub fn annotation_fn<F>(f: F) -> AnnotationFn<F>
where
    F: FnOnce(&mut dyn Modifier),
{
    AnnotationFn(f)
}

impl<F> Annotation for AnnotationFn<F>
where
    F: FnOnce(&mut dyn Modifier),
{
    fn annotate(self, target: &mut dyn Modifier) {
        (self.0)(target);
    }
}

impl Annotation for () {
    fn annotate(self, _target: &mut dyn Modifier) {}
}

impl<A: Annotation> Annotation for Option<A> {
    fn annotate(self, target: &mut dyn Modifier) {
        if let Some(annotation) = self {
            annotation.annotate(target);
        }
    }
}

impl<A: Annotation> Annotation for Vec<A> {
    fn annotate(self, target: &mut dyn Modifier) {
        for annotation in self {
            annotation.annotate(target);
        }
    }
}

macro_rules! impl_annotation_for_tuple {
    ($($ty:ident),+ $(,)?) => {
        #[expect(non_snake_case)]
        impl<$($ty),+> Annotation for ($($ty,)+)
        where
            $($ty: Annotation,)+
        {
            fn annotate(self, target: &mut dyn Modifier) {
                let ($($ty,)+) = self;
                $(
                    $ty.annotate(target);
                )+
            }
        }
    };
}

all_the_tuples!(impl_annotation_for_tuple);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::{BadRequest, ResourceInfo};

    #[derive(Default)]
    struct Recorder {
        code: Code,
        message: String,
        details: Vec<SharedDetail>,
    }

    impl Modifier for Recorder {
        fn set_code(&mut self, code: Code) {
            self.code = code;
        }

        fn wrap_message(&mut self, message: &str) {
            wrap_message(&mut self.message, message);
        }

        fn append_details(&mut self, details: Vec<SharedDetail>) {
            self.details.extend(details);
        }
    }

    #[test]
    fn wrap_message_prepends() {
        let mut recorder = Recorder::default();
        ("a", String::from("b"), Message::new("c")).annotate(&mut recorder);
        assert_eq!(recorder.message, "c: b: a");
    }

    #[test]
    fn code_is_replaced() {
        let mut recorder = Recorder::default();
        (Code::NOT_FOUND, Code::INTERNAL).annotate(&mut recorder);
        assert_eq!(recorder.code, Code::INTERNAL);
    }

    #[test]
    fn optional_and_empty_annotations() {
        let mut recorder = Recorder::default();
        ((), None::<Code>, Some("x"), Vec::<Message>::new()).annotate(&mut recorder);
        assert_eq!(recorder.code, Code::OK);
        assert_eq!(recorder.message, "x");
        assert!(recorder.details.is_empty());
    }

    #[test]
    fn details_keep_order() {
        let mut recorder = Recorder::default();
        (
            ResourceInfo::new("1", "2", "3", "4"),
            BadRequest::with_violation("1", "2"),
            vec![DebugInfo::new(vec![], "a"), DebugInfo::new(vec![], "b")],
        )
            .annotate(&mut recorder);
        let type_urls: Vec<_> = recorder.details.iter().map(|d| d.type_url()).collect();
        assert_eq!(
            type_urls,
            [
                crate::detail::TYPE_URL_RESOURCE_INFO,
                crate::detail::TYPE_URL_BAD_REQUEST,
                crate::detail::TYPE_URL_DEBUG_INFO,
                crate::detail::TYPE_URL_DEBUG_INFO,
            ]
        );
    }

    #[test]
    fn stack_trace_captures_entries() {
        let mut recorder = Recorder::default();
        StackTrace::new("token").annotate(&mut recorder);
        let info = recorder.details[0].downcast_ref::<DebugInfo>().unwrap();
        assert_eq!(info.detail, "token");
        assert!(!info.stack_entries.is_empty());
    }

    #[test]
    fn annotation_fn_gets_modifier() {
        let mut recorder = Recorder::default();
        annotation_fn(|m: &mut dyn Modifier| {
            m.set_code(Code::ABORTED);
            m.wrap_message("closure");
        })
        .annotate(&mut recorder);
        assert_eq!(recorder.code, Code::ABORTED);
        assert_eq!(recorder.message, "closure");
    }

    #[quickcheck_macros::quickcheck]
    fn wrap_message_accumulates(messages: Vec<String>) -> bool {
        let messages: Vec<_> = messages.into_iter().filter(|m| !m.is_empty()).collect();

        let mut recorder = Recorder::default();
        for message in &messages {
            Message::new(message.clone()).annotate(&mut recorder);
        }

        let expected: Vec<_> = messages.iter().rev().map(String::as_str).collect();
        recorder.message == expected.join(": ")
    }
}
