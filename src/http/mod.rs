//! HTTP server module.
//!
//! Plain HTTP only; TLS is expected to be terminated in front of the service
//! (load balancer or ingress).

mod server;

pub use server::{start_server, ServerError};
