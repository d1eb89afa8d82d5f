//! The HoopiPi control façade: a request-response JSON protocol over a
//! local Unix domain socket, translating each decoded message into at most
//! one call into the engine, always on a non-RT thread (§4.8).
//!
//! [`dispatch::handle`] is the transport-agnostic core — useful directly in
//! tests or an alternative transport — while [`server::ControlServer`] wires
//! it to a Unix-domain-socket transport.

pub mod dispatch;
pub mod error;
pub mod request;
pub mod server;
pub mod status;

pub use error::ControlError;
pub use server::ControlServer;
