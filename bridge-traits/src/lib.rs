//! # Bridge Traits
//!
//! Platform abstraction seams shared across the workspace:
//! - `HttpClient` — async HTTP transport used by API connectors
//! - `Clock` — injectable time source for gate and cursor logic
//!
//! Concrete native implementations live in `bridge-desktop`.

pub mod error;
pub mod http;
pub mod time;

pub use error::{BridgeError, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use time::{Clock, FixedClock, SystemClock};
