//! The hello endpoint: answers "Hello?" and nothing else.

use std::fmt;
use std::sync::Arc;

use deflect_core::adapters::http::{
    HttpHandlers, HttpMethod, HttpRequest, HttpResponse, HttpStatus, handle_http_blocking,
};
use deflect_core::ports::{ExecutionContext, LogSink};
use deflect_core::{DomainResult, Failure, Handlers};

pub const GREETING: &str = "Hello?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GreetingError {
    NoHello,
}

impl fmt::Display for GreetingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHello => write!(f, "No \"{GREETING}\""),
        }
    }
}

pub async fn greet(body: Option<String>) -> DomainResult<String, GreetingError> {
    match body.as_deref() {
        Some(GREETING) => Ok(Ok("HELLO WORLD!".to_string())),
        _ => Ok(Err(GreetingError::NoHello)),
    }
}

pub fn request(body: Option<String>) -> HttpRequest {
    let request = HttpRequest::new(HttpMethod::Post, "/api/hello");
    match body {
        Some(body) => request.with_body(body),
        None => request,
    }
}

pub fn handlers(sink: Arc<dyn LogSink>) -> Handlers<String, GreetingError, HttpResponse> {
    HttpHandlers::new(sink)
        .domain_error_status(HttpStatus::NotFound)
        .build()
}

pub fn respond<C>(ctx: &C, request: &HttpRequest, sink: Arc<dyn LogSink>) -> Result<HttpResponse, Failure>
where
    C: ExecutionContext + ?Sized,
{
    let body = request.body.clone();
    handle_http_blocking(ctx, request, move || greet(body), handlers(sink))
}
