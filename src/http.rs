//! HTTP client middleware turning error responses into [`AnnotatedError`]s.
//!
//! [`DecodeErrorResponse`] wraps any [`tower_service::Service`] that sends
//! [`http::Request`]s and returns [`http::Response`]s. Successful responses
//! (`2xx`) pass through unchanged, all others are consumed and returned as
//! error instead:
//!
//! - a body of type `application/json` is decoded as error envelope,
//!   see [`codec`](crate::codec);
//! - any other body is used as opaque message, wrapping
//!   [`Code::UNKNOWN`] (or the code derived from the HTTP status,
//!   see [`DecodeErrorResponseLayer::with_status_from_http`]).
//!
//! Transport failures are annotated with [`Code::INTERNAL`].

use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use http::{Method, Request, Response, Uri, header::CONTENT_TYPE};
use http_body::Body;
use http_body_util::BodyExt;
use tower_layer::Layer;
use tower_service::Service;
use tracing::debug;

use crate::{AnnotatedError, BoxError, Code, Message, annotate, codec::Decoder};

const JSON_CONTENT_TYPE: &[u8] = b"application/json";

/// Layer that applies the [`DecodeErrorResponse`] middleware.
#[derive(Debug, Clone, Default)]
pub struct DecodeErrorResponseLayer {
    status_from_http: bool,
}

impl DecodeErrorResponseLayer {
    /// Create a new [`DecodeErrorResponseLayer`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status_from_http: false,
        }
    }

    /// Derive the status code of non-JSON error responses from their
    /// HTTP status (see [`Code::from_http`]), instead of using [`Code::UNKNOWN`].
    #[must_use]
    pub const fn with_status_from_http(mut self, enabled: bool) -> Self {
        self.status_from_http = enabled;
        self
    }

    /// Derive the status code of non-JSON error responses from their
    /// HTTP status (see [`Code::from_http`]), instead of using [`Code::UNKNOWN`].
    pub fn set_status_from_http(&mut self, enabled: bool) -> &mut Self {
        self.status_from_http = enabled;
        self
    }
}

impl<S> Layer<S> for DecodeErrorResponseLayer {
    type Service = DecodeErrorResponse<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DecodeErrorResponse {
            inner,
            decoder: Decoder::new(),
            status_from_http: self.status_from_http,
        }
    }
}

/// Middleware that turns non-`2xx` responses into [`AnnotatedError`]s.
///
/// See the [module docs](self) for more information.
#[derive(Clone)]
pub struct DecodeErrorResponse<S> {
    inner: S,
    decoder: Decoder,
    status_from_http: bool,
}

impl<S> DecodeErrorResponse<S> {
    /// Create a new [`DecodeErrorResponse`] wrapping the `inner` transport.
    pub fn new(inner: S) -> Self {
        DecodeErrorResponseLayer::new().layer(inner)
    }

    /// Get a reference to the inner service.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Consume `self`, returning the inner service.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: fmt::Debug> fmt::Debug for DecodeErrorResponse<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeErrorResponse")
            .field("inner", &self.inner)
            .field("status_from_http", &self.status_from_http)
            .finish()
    }
}

type ResponseFuture<T> = Pin<Box<dyn Future<Output = Result<T, AnnotatedError>> + Send>>;

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for DecodeErrorResponse<S>
where
    S: Service<
            Request<ReqBody>,
            Response = Response<ResBody>,
            Error: Into<BoxError>,
            Future: Send + 'static,
        > + Clone
        + Send
        + 'static,
    ReqBody: Send + 'static,
    ResBody: Body<Data: Send, Error: Into<BoxError>> + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = AnnotatedError;
    type Future = ResponseFuture<Self::Response>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner
            .poll_ready(cx)
            .map_err(|err| annotate(err, Code::INTERNAL))
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // the ready service is the one to call, leave a fresh clone in its place
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let decoder = self.decoder.clone();
        let status_from_http = self.status_from_http;

        let method = req.method().clone();
        let uri = req.uri().clone();

        Box::pin(async move {
            let res = inner
                .call(req)
                .await
                .map_err(|err| transport_error(&method, &uri, err))?;

            let status = res.status();
            if status.is_success() {
                return Ok(res);
            }

            let is_json = res
                .headers()
                .get(CONTENT_TYPE)
                .is_some_and(|value| value.as_bytes().starts_with(JSON_CONTENT_TYPE));

            let body: Bytes = res
                .into_body()
                .collect()
                .await
                .map_err(|err| transport_error(&method, &uri, err))?
                .to_bytes();

            if is_json {
                let err = decoder
                    .decode_slice(&body)
                    .map_err(|err| transport_error(&method, &uri, err))?;
                debug!(
                    %method,
                    %uri,
                    http.status = status.as_u16(),
                    code = %err.code().name(),
                    "decoded json error response",
                );
                return Err(err);
            }

            let code = if status_from_http {
                Code::from_http(status.as_u16())
            } else {
                Code::UNKNOWN
            };
            let text = String::from_utf8_lossy(&body);
            debug!(
                %method,
                %uri,
                http.status = status.as_u16(),
                code = %code.name(),
                "opaque error response",
            );
            let text = text.trim();
            if text.is_empty() {
                Err(annotate(code, ()))
            } else {
                Err(annotate(code, Message::new(text)))
            }
        })
    }
}

fn transport_error(method: &Method, uri: &Uri, err: impl Into<BoxError>) -> AnnotatedError {
    let err = err.into();
    let text = err.to_string();
    // `Uri` display adds the root path, so an authority match counts as well
    let has_context = text.contains(&uri.to_string())
        || uri
            .authority()
            .is_some_and(|authority| text.contains(authority.as_str()));
    if has_context {
        annotate(err, Code::INTERNAL)
    } else {
        annotate(err, (Code::INTERNAL, Message::new(format!("{method} {uri}"))))
    }
}

#[cfg(test)]
mod tests {
    use std::{error::Error, future::poll_fn};

    use http_body_util::Full;
    use tracing_test::traced_test;

    use super::*;
    use crate::{codec::CodecError, details_of, status_of};

    const RAW_FULL: &str = r#"{"error":{"code":500,"message":"msg: sql: connection is already closed","status":"INTERNAL","details":[{"@type":"type.googleapis.com/google.rpc.ResourceInfo","resourceType":"1","resourceName":"2","owner":"3","description":"4"},{"@type":"type.googleapis.com/google.rpc.BadRequest","fieldViolations":[{"field":"1","description":"2"},{"field":"3","description":"4"}]}]}}"#;

    #[derive(Debug, Clone)]
    struct MockTransport;

    fn response(
        status: u16,
        content_type: &str,
        body: &'static str,
    ) -> Result<Response<Full<Bytes>>, BoxError> {
        Ok(Response::builder()
            .status(status)
            .header(CONTENT_TYPE, content_type)
            .body(Full::new(Bytes::from_static(body.as_bytes())))?)
    }

    impl Service<Request<()>> for MockTransport {
        type Response = Response<Full<Bytes>>;
        type Error = BoxError;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<()>) -> Self::Future {
            std::future::ready(match req.uri().path() {
                "/happy" => response(200, "application/json", r#"{"data":"response data"}"#),
                "/sad" => response(500, "application/json; charset=utf-8", RAW_FULL),
                "/internal" => response(500, "application/json", "123"),
                "/plaintext" => response(404, "text/plain", "sql: no rows in result set\n"),
                "/shouting" => response(503, "Application/JSON", "{}"),
                "/blank" => response(502, "text/plain", "  "),
                "/not-ok" => response(
                    500,
                    "application/json",
                    r#"{"error":{"status":"OK","message":"x"}}"#,
                ),
                "/refused" => Err("connection refused".into()),
                "/" => Err("dial http://test: refused".into()),
                _ => Err(format!("dial {}: no route to host", req.uri()).into()),
            })
        }
    }

    async fn get(
        svc: &mut DecodeErrorResponse<MockTransport>,
        path: &str,
    ) -> Result<Response<Full<Bytes>>, AnnotatedError> {
        poll_fn(|cx| svc.poll_ready(cx)).await?;
        let req = Request::get(format!("http://test{path}")).body(()).unwrap();
        svc.call(req).await
    }

    #[tokio::test]
    async fn success_passes_through() {
        let mut svc = DecodeErrorResponse::new(MockTransport);
        let res = get(&mut svc, "/happy").await.unwrap();
        assert_eq!(res.status(), 200);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, r#"{"data":"response data"}"#);
    }

    #[tokio::test]
    #[traced_test]
    async fn json_error_is_decoded() {
        let mut svc = DecodeErrorResponse::new(MockTransport);
        let err = get(&mut svc, "/sad").await.unwrap_err();
        assert_eq!(status_of(&err), Code::INTERNAL);
        assert_eq!(err.to_string(), "msg: sql: connection is already closed");
        assert_eq!(
            err.source().unwrap().downcast_ref::<Code>(),
            Some(&Code::INTERNAL)
        );
        assert_eq!(details_of(&err).len(), 2);
        assert!(logs_contain("decoded json error response"));
    }

    #[tokio::test]
    async fn malformed_json_is_internal() {
        let mut svc = DecodeErrorResponse::new(MockTransport);
        let err = get(&mut svc, "/internal").await.unwrap_err();
        assert_eq!(status_of(&err), Code::INTERNAL);
        assert!(err.message().starts_with("GET http://test/internal: "));
        assert!(err.source().unwrap().is::<CodecError>());
    }

    #[tokio::test]
    async fn plain_text_is_opaque_message() {
        let mut svc = DecodeErrorResponse::new(MockTransport);
        let err = get(&mut svc, "/plaintext").await.unwrap_err();
        assert_eq!(status_of(&err), Code::UNKNOWN);
        assert_eq!(err.to_string(), "sql: no rows in result set: 500 UNKNOWN");

        let mut svc = DecodeErrorResponseLayer::new()
            .with_status_from_http(true)
            .layer(MockTransport);
        let err = get(&mut svc, "/plaintext").await.unwrap_err();
        assert_eq!(status_of(&err), Code::NOT_FOUND);
        assert!(err.to_string().contains("sql: no rows in result set"));
    }

    #[tokio::test]
    async fn content_type_match_is_case_sensitive() {
        let mut svc = DecodeErrorResponse::new(MockTransport);
        let err = get(&mut svc, "/shouting").await.unwrap_err();
        assert_eq!(status_of(&err), Code::UNKNOWN);
        assert_eq!(err.to_string(), "{}: 500 UNKNOWN");
    }

    #[tokio::test]
    async fn blank_plain_text_has_no_message_prefix() {
        let mut svc = DecodeErrorResponse::new(MockTransport);
        let err = get(&mut svc, "/blank").await.unwrap_err();
        assert_eq!(status_of(&err), Code::UNKNOWN);
        assert_eq!(err.to_string(), "500 UNKNOWN");
    }

    #[tokio::test]
    async fn ok_envelope_is_still_an_error() {
        let mut svc = DecodeErrorResponse::new(MockTransport);
        let err = get(&mut svc, "/not-ok").await.unwrap_err();
        assert_eq!(err.code(), Code::OK);
        assert_eq!(err.message(), "x");
        assert_eq!(status_of(&err), Code::UNKNOWN);
    }

    #[tokio::test]
    async fn transport_error_gets_request_context() {
        let mut svc = DecodeErrorResponse::new(MockTransport);
        let err = get(&mut svc, "/refused").await.unwrap_err();
        assert_eq!(err.code(), Code::INTERNAL);
        assert_eq!(err.to_string(), "GET http://test/refused: connection refused");

        let err = get(&mut svc, "/unroutable").await.unwrap_err();
        assert_eq!(err.code(), Code::INTERNAL);
        assert_eq!(
            err.to_string(),
            "dial http://test/unroutable: no route to host"
        );

        // no path: the uri displays as `http://test/`
        let err = get(&mut svc, "").await.unwrap_err();
        assert_eq!(err.code(), Code::INTERNAL);
        assert_eq!(err.to_string(), "dial http://test: refused");
    }
}
