//! HTTP adapter - default handlers that turn an outcome into a JSON response.
//!
//! # Default mapping
//! | outcome        | status | body                                              |
//! |----------------|--------|---------------------------------------------------|
//! | success `a`    | 200    | `a` serialised                                    |
//! | domain error   | 500    | `{"errorMessage": "<ERROR_MESSAGE_PREFIX> <e>"}`  |
//! | system failure | 500    | `{"errorMessage": "<THROWABLE_MESSAGE_PREFIX> <f>"}` (logged first) |
//!
//! The domain-error status is configurable through
//! [`HttpHandlers::domain_error_status`].

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::{Handlers, handle, handle_blocking};
use crate::domain::{DomainResult, Failure, HandlerResult};
use crate::ports::{ExecutionContext, LogSink, log_failure};

pub use crate::ports::THROWABLE_MESSAGE_PREFIX;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_TYPE_APPLICATION_JSON: &str = "application/json";
pub const ERROR_MESSAGE_PREFIX: &str = "An error has occurred. The error is:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        };
        f.write_str(name)
    }
}

/// An incoming request as the host hands it over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub uri: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported status code {0}")]
pub struct UnsupportedStatus(pub u16);

/// Response statuses the adapter produces. Serialised as the numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum HttpStatus {
    Ok,
    Created,
    NoContent,
    BadRequest,
    NotFound,
    InternalServerError,
}

impl HttpStatus {
    pub fn code(&self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Created => 201,
            Self::NoContent => 204,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::InternalServerError => 500,
        }
    }
}

impl From<HttpStatus> for u16 {
    fn from(status: HttpStatus) -> Self {
        status.code()
    }
}

impl TryFrom<u16> for HttpStatus {
    type Error = UnsupportedStatus;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            200 => Ok(Self::Ok),
            201 => Ok(Self::Created),
            204 => Ok(Self::NoContent),
            400 => Ok(Self::BadRequest),
            404 => Ok(Self::NotFound),
            500 => Ok(Self::InternalServerError),
            other => Err(UnsupportedStatus(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: HttpStatus,
    pub headers: BTreeMap<String, String>,
    pub body: serde_json::Value,
}

impl HttpResponse {
    pub fn builder(status: HttpStatus) -> HttpResponseBuilder {
        HttpResponseBuilder {
            status,
            headers: BTreeMap::new(),
            body: serde_json::Value::Null,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Builds an [`HttpResponse`]. Serialising the body is the only fallible step.
#[derive(Debug)]
pub struct HttpResponseBuilder {
    status: HttpStatus,
    headers: BTreeMap<String, String>,
    body: serde_json::Value,
}

impl HttpResponseBuilder {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn json_content(self) -> Self {
        self.header(CONTENT_TYPE, CONTENT_TYPE_APPLICATION_JSON)
    }

    pub fn body<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, Failure> {
        self.body = serde_json::to_value(body).map_err(Failure::from_error)?;
        Ok(self)
    }

    pub fn build(self) -> HttpResponse {
        HttpResponse {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_message: String,
}

impl ErrorResponse {
    pub fn new(error_message: impl Into<String>) -> Self {
        Self {
            error_message: error_message.into(),
        }
    }
}

/// 200 with `a` as the JSON body.
pub fn success_response<A: Serialize + ?Sized>(a: &A) -> HandlerResult<HttpResponse> {
    Ok(HttpResponse::builder(HttpStatus::Ok)
        .body(a)?
        .json_content()
        .build())
}

/// 500 with the domain error in an [`ErrorResponse`].
pub fn domain_error_response<E: fmt::Display + ?Sized>(e: &E) -> HandlerResult<HttpResponse> {
    domain_error_response_with_status(HttpStatus::InternalServerError, e)
}

pub fn domain_error_response_with_status<E: fmt::Display + ?Sized>(
    status: HttpStatus,
    e: &E,
) -> HandlerResult<HttpResponse> {
    let body = ErrorResponse::new(format!("{ERROR_MESSAGE_PREFIX} {e}"));
    Ok(HttpResponse::builder(status)
        .body(&body)?
        .json_content()
        .build())
}

/// Log `failure` at error level, then answer 500.
///
/// A sink that cannot write fails the handler.
pub async fn system_failure_response(sink: &dyn LogSink, failure: &Failure) -> HandlerResult<HttpResponse> {
    log_failure(sink, failure).await?;
    let body = ErrorResponse::new(format!("{THROWABLE_MESSAGE_PREFIX} {failure}"));
    Ok(HttpResponse::builder(HttpStatus::InternalServerError)
        .body(&body)?
        .json_content()
        .build())
}

/// Builds the default [`Handlers`] for an HTTP endpoint.
///
/// # Example
/// ```ignore
/// let handlers = HttpHandlers::new(sink)
///     .domain_error_status(HttpStatus::NotFound)
///     .build::<Greeting, GreetingError>();
/// let response = handle_http(&request, || greet(body), handlers).await?;
/// ```
#[derive(Clone)]
pub struct HttpHandlers {
    sink: Arc<dyn LogSink>,
    domain_error_status: HttpStatus,
}

impl HttpHandlers {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            domain_error_status: HttpStatus::InternalServerError,
        }
    }

    pub fn domain_error_status(mut self, status: HttpStatus) -> Self {
        self.domain_error_status = status;
        self
    }

    /// The system-failure handler doubles as the handler-failure handler; the
    /// unrecoverable failure is logged to the same sink.
    pub fn build<A, E>(self) -> Handlers<A, E, HttpResponse>
    where
        A: Serialize + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let status = self.domain_error_status;
        let sink = Arc::clone(&self.sink);
        Handlers::new(
            |a: A| {
                let response = success_response(&a);
                async move { response }
            },
            move |e: E| {
                let response = domain_error_response_with_status(status, &e);
                async move { response }
            },
            move |failure: Failure| {
                let sink = Arc::clone(&sink);
                async move { system_failure_response(sink.as_ref(), &failure).await }
            },
        )
        .log_unrecoverable_to(self.sink)
    }
}

impl fmt::Debug for HttpHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpHandlers")
            .field("domain_error_status", &self.domain_error_status)
            .finish_non_exhaustive()
    }
}

/// Run `domain_logic` for `request` and produce the response.
pub async fn handle_http<A, E, F, Fut>(
    request: &HttpRequest,
    domain_logic: F,
    handlers: Handlers<A, E, HttpResponse>,
) -> Result<HttpResponse, Failure>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<A, E>>,
{
    let response = handle(domain_logic, handlers).await;
    trace_response(request, &response);
    response
}

/// Blocking form of [`handle_http`] for hosts that call in synchronously.
pub fn handle_http_blocking<C, A, E, F, Fut>(
    ctx: &C,
    request: &HttpRequest,
    domain_logic: F,
    handlers: Handlers<A, E, HttpResponse>,
) -> Result<HttpResponse, Failure>
where
    C: ExecutionContext + ?Sized,
    A: Send + 'static,
    E: Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = DomainResult<A, E>> + Send + 'static,
{
    let response = handle_blocking(ctx, domain_logic, handlers);
    trace_response(request, &response);
    response
}

fn trace_response(request: &HttpRequest, response: &Result<HttpResponse, Failure>) {
    match response {
        Ok(response) => debug!(
            method = %request.method,
            uri = %request.uri,
            status = response.status.code(),
            "request handled"
        ),
        Err(failure) => debug!(
            method = %request.method,
            uri = %request.uri,
            error = %failure,
            "request left unhandled"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Level;
    use crate::impls::{InlineContext, MemorySink};
    use rstest::rstest;
    use serde_json::json;

    fn request() -> HttpRequest {
        HttpRequest::new(HttpMethod::Post, "/api/hello").with_body("Hello?")
    }

    async fn greet() -> DomainResult<String, String> {
        Ok(Ok("HELLO WORLD!".to_string()))
    }

    async fn refuse() -> DomainResult<String, String> {
        Ok(Err("No \"Hello?\"".to_string()))
    }

    async fn crash() -> DomainResult<String, String> {
        Err(Failure::msg("x"))
    }

    /// Serialising a map with non-string keys fails, so the success handler fails.
    async fn unserialisable() -> DomainResult<BTreeMap<(u8, u8), u8>, String> {
        Ok(Ok(BTreeMap::from([((1, 2), 3)])))
    }

    #[tokio::test]
    async fn success_becomes_200_with_the_value() {
        let sink = Arc::new(MemorySink::new());
        let handlers = HttpHandlers::new(sink.clone()).build();

        let response = handle_http(&request(), greet, handlers).await.unwrap();

        assert_eq!(response.status, HttpStatus::Ok);
        assert_eq!(response.body, json!("HELLO WORLD!"));
        assert_eq!(response.header(CONTENT_TYPE), Some(CONTENT_TYPE_APPLICATION_JSON));
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn domain_error_uses_the_configured_status() {
        let sink = Arc::new(MemorySink::new());
        let handlers = HttpHandlers::new(sink.clone())
            .domain_error_status(HttpStatus::NotFound)
            .build();

        let response = handle_http(&request(), refuse, handlers).await.unwrap();

        assert_eq!(response.status.code(), 404);
        assert_eq!(
            serde_json::to_string(&response.body).unwrap(),
            r#"{"errorMessage":"An error has occurred. The error is: No \"Hello?\""}"#
        );
    }

    #[tokio::test]
    async fn domain_error_defaults_to_500() {
        let handlers = HttpHandlers::new(Arc::new(MemorySink::new())).build();
        let response = handle_http(&request(), refuse, handlers).await.unwrap();
        assert_eq!(response.status, HttpStatus::InternalServerError);
    }

    #[tokio::test]
    async fn system_failure_is_logged_then_becomes_500() {
        let sink = Arc::new(MemorySink::new());
        let handlers = HttpHandlers::new(sink.clone()).build();

        let response = handle_http(&request(), crash, handlers).await.unwrap();

        assert_eq!(response.status, HttpStatus::InternalServerError);
        assert_eq!(
            response.body,
            json!({"errorMessage": "An exception was thrown. The exception is: x"})
        );
        assert_eq!(
            sink.messages_at(Level::Error),
            vec!["An exception was thrown. The exception is: x".to_string()]
        );
    }

    #[tokio::test]
    async fn failing_success_handler_falls_back_to_system_failure_response() {
        let sink = Arc::new(MemorySink::new());
        let handlers = HttpHandlers::new(sink.clone()).build();

        let response = handle_http(&request(), unserialisable, handlers).await.unwrap();

        assert_eq!(response.status, HttpStatus::InternalServerError);
        let message = response.body["errorMessage"].as_str().unwrap();
        assert!(message.starts_with(THROWABLE_MESSAGE_PREFIX));
        assert!(message.contains("key must be a string"));
        assert_eq!(sink.messages_at(Level::Error).len(), 1);
    }

    #[tokio::test]
    async fn unavailable_sink_leaves_the_request_unhandled() {
        let handlers = HttpHandlers::new(Arc::new(MemorySink::failing())).build();

        let failure = handle_http(&request(), crash, handlers).await.unwrap_err();

        assert_eq!(failure.to_string(), "log sink is unavailable");
    }

    #[test]
    fn blocking_entry_point_gives_the_same_response() {
        let sink = Arc::new(MemorySink::new());
        let handlers = HttpHandlers::new(sink.clone())
            .domain_error_status(HttpStatus::NotFound)
            .build();

        let blocking = handle_http_blocking(&InlineContext, &request(), refuse, handlers.clone()).unwrap();
        let direct = futures::executor::block_on(handle_http(&request(), refuse, handlers)).unwrap();

        assert_eq!(blocking, direct);
    }

    #[rstest]
    #[case(HttpStatus::Ok, 200)]
    #[case(HttpStatus::Created, 201)]
    #[case(HttpStatus::NoContent, 204)]
    #[case(HttpStatus::BadRequest, 400)]
    #[case(HttpStatus::NotFound, 404)]
    #[case(HttpStatus::InternalServerError, 500)]
    fn status_serialises_as_its_code(#[case] status: HttpStatus, #[case] code: u16) {
        assert_eq!(serde_json::to_string(&status).unwrap(), code.to_string());
        assert_eq!(HttpStatus::try_from(code).unwrap(), status);
    }

    #[test]
    fn unknown_status_code_is_rejected() {
        assert!(serde_json::from_str::<HttpStatus>("418").is_err());
    }

    #[test]
    fn request_deserialises_with_optional_parts_missing() {
        let request: HttpRequest =
            serde_json::from_str(r#"{"method":"GET","uri":"/api/hello"}"#).unwrap();
        assert_eq!(request, HttpRequest::new(HttpMethod::Get, "/api/hello"));
    }
}
