//! Adapters - ready-made handler sets for common hosts.
//!
//! - **http**: request in, JSON response out
//! - **timer**: scheduled trigger, nothing out

pub mod http;
pub mod timer;

pub use self::http::{HttpHandlers, HttpRequest, HttpResponse, HttpStatus, handle_http, handle_http_blocking};
pub use self::timer::{TimerHandlers, TimerInfo, handle_timer, handle_timer_blocking};
