//! Structured, status-coded errors with typed details.
//!
//! Any error can be annotated with a status [`Code`], a [`Message`] and
//! typed [details](detail), without losing the original cause:
//!
//! ```
//! use annotated_error::{AnnotateExt, Code, Message, detail::ResourceInfo, status_of};
//!
//! fn find_user(id: &str) -> Result<(), annotated_error::AnnotatedError> {
//!     Err::<(), _>("sql: no rows in result set").annotate((
//!         Code::NOT_FOUND,
//!         Message::new(format!("user {id}")),
//!         ResourceInfo::new("user", id, "", ""),
//!     ))
//! }
//!
//! let err = find_user("42").unwrap_err();
//! assert_eq!(err.to_string(), "user 42: sql: no rows in result set");
//! assert_eq!(status_of(&err), Code::NOT_FOUND);
//! ```
//!
//! Projections such as [`status_of`], [`details_of`] and [`temporary`]
//! walk the entire cause chain, so annotated errors can be wrapped by
//! foreign errors (and the other way around).
//!
//! The [`codec`] module encodes errors into a canonical JSON envelope and
//! decodes them back, while the `http` module (feature `http`) provides a
//! [tower](https://docs.rs/tower) middleware turning error responses
//! into annotated errors.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(not(test), warn(clippy::print_stdout, clippy::dbg_macro))]

mod macros;

mod status;
#[doc(inline)]
pub use status::Code;

pub mod detail;

mod annotate;
#[doc(inline)]
pub use annotate::{Annotation, AnnotationFn, Message, Modifier, StackTrace, annotation_fn};

mod error;
#[doc(inline)]
pub use error::{
    AnnotateExt, AnnotatedError, BoxError, Canceled, Chain, ContextError, ErrorExt, SharedError,
    TimeoutExpired, Transient, annotate, annotate_opt,
};

mod project;
#[doc(inline)]
pub use project::{
    DetailMapper, DetailMappers, details_of, flatten, hide_debug_info, status_of, status_of_opt,
    temporary,
};

mod predefined;

pub mod codec;

#[cfg(feature = "http")]
#[cfg_attr(docsrs, doc(cfg(feature = "http")))]
pub mod http;
