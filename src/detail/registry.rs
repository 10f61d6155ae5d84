//! Process-wide registry mapping type-urls to detail constructors.
//!
//! The registry is used by the [`Decoder`] to turn the JSON objects found
//! in the `details` array of an error envelope into concrete [`Detail`] values.
//! It comes seeded with all standard details of this crate.
//!
//! Registration is meant to happen once, during process start.
//! The registry is guarded by a lock, so registering while other threads
//! encode or decode errors is safe, but those threads may or may not
//! observe the new entry.
//!
//! ```
//! use annotated_error::detail::{AnyDetail, registry::{self, DetailFactory}};
//!
//! registry::register("example/doc", Some(DetailFactory::of::<AnyDetail>()));
//! assert!(registry::lookup("example/doc").is_some());
//!
//! registry::unregister("example/doc");
//! assert!(registry::lookup("example/doc").is_none());
//! ```
//!
//! [`Decoder`]: crate::codec::Decoder

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, LazyLock},
};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use tracing::{debug, trace};

use super::{
    AnyDetail, BadRequest, DebugInfo, Detail, ErrorInfo, Help, LocalizedMessage,
    PreconditionFailure, QuotaFailure, RequestInfo, ResourceInfo, SharedDetail,
    TYPE_URL_BAD_REQUEST, TYPE_URL_DEBUG_INFO, TYPE_URL_ERROR_INFO, TYPE_URL_HELP,
    TYPE_URL_LOCALIZED_MESSAGE, TYPE_URL_PRECONDITION_FAILURE, TYPE_URL_QUOTA_FAILURE,
    TYPE_URL_REQUEST_INFO, TYPE_URL_RESOURCE_INFO,
};

type FactoryFn = dyn Fn(&str) -> serde_json::Result<SharedDetail> + Send + Sync;

/// Constructs a concrete [`Detail`] from its raw JSON object.
#[derive(Clone)]
pub struct DetailFactory(Arc<FactoryFn>);

impl DetailFactory {
    /// Create a factory that deserializes the JSON object into `T`.
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: Detail + DeserializeOwned,
    {
        Self::from_fn(|raw| {
            let detail: T = serde_json::from_str(raw)?;
            Ok(Arc::new(detail))
        })
    }

    /// Create a factory from a function decoding the raw JSON object.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str) -> serde_json::Result<SharedDetail> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Decode the raw JSON object of a detail.
    pub fn decode(&self, raw: &str) -> serde_json::Result<SharedDetail> {
        (self.0)(raw)
    }
}

impl fmt::Debug for DetailFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailFactory").finish_non_exhaustive()
    }
}

static REGISTRY: LazyLock<RwLock<HashMap<String, DetailFactory>>> = LazyLock::new(|| {
    let entries = [
        (TYPE_URL_DEBUG_INFO, DetailFactory::of::<DebugInfo>()),
        (TYPE_URL_RESOURCE_INFO, DetailFactory::of::<ResourceInfo>()),
        (TYPE_URL_BAD_REQUEST, DetailFactory::of::<BadRequest>()),
        (
            TYPE_URL_PRECONDITION_FAILURE,
            DetailFactory::of::<PreconditionFailure>(),
        ),
        (TYPE_URL_ERROR_INFO, DetailFactory::of::<ErrorInfo>()),
        (TYPE_URL_QUOTA_FAILURE, DetailFactory::of::<QuotaFailure>()),
        (TYPE_URL_REQUEST_INFO, DetailFactory::of::<RequestInfo>()),
        (TYPE_URL_HELP, DetailFactory::of::<Help>()),
        (
            TYPE_URL_LOCALIZED_MESSAGE,
            DetailFactory::of::<LocalizedMessage>(),
        ),
    ];
    RwLock::new(
        entries
            .into_iter()
            .map(|(type_url, factory)| (type_url.to_owned(), factory))
            .collect(),
    )
});

/// Install the factory for `type_url`, replacing any previous one.
///
/// Passing `None` removes the entry, after which that type-url
/// decodes as an [`AnyDetail`] again.
pub fn register(type_url: impl Into<String>, factory: Option<DetailFactory>) {
    let type_url = type_url.into();
    let mut registry = REGISTRY.write();
    match factory {
        Some(factory) => {
            debug!(%type_url, "register detail factory");
            registry.insert(type_url, factory);
        }
        None => {
            debug!(%type_url, "unregister detail factory");
            registry.remove(&type_url);
        }
    }
}

/// Remove the factory for `type_url`, if any.
pub fn unregister(type_url: &str) {
    debug!(%type_url, "unregister detail factory");
    REGISTRY.write().remove(type_url);
}

/// Get the factory registered for `type_url`.
#[must_use]
pub fn lookup(type_url: &str) -> Option<DetailFactory> {
    REGISTRY.read().get(type_url).cloned()
}

/// Decode a single detail object.
///
/// The `@type` member selects the registered factory. Objects of which the
/// type is missing or unregistered decode into an [`AnyDetail`].
pub fn decode_detail(raw: &RawValue) -> serde_json::Result<SharedDetail> {
    #[derive(serde::Deserialize)]
    struct Probe {
        #[serde(rename = "@type", default)]
        type_url: Option<String>,
    }

    let probe: Probe = serde_json::from_str(raw.get())?;
    let type_url = probe.type_url.unwrap_or_default();

    match lookup(&type_url) {
        Some(factory) => factory.decode(raw.get()),
        None => {
            trace!(%type_url, "unregistered detail type: decode as AnyDetail");
            let detail: AnyDetail = serde_json::from_str(raw.get())?;
            Ok(Arc::new(detail))
        }
    }
}
