//! # Desktop Bridge
//!
//! Native implementations of the `bridge-traits` seams for the exporter CLI.

pub mod http;

pub use http::ReqwestHttpClient;
