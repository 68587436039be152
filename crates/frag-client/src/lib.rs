//! Client-side orchestration for remotely rendered UI fragments.
//!
//! A mounted fragment asks a rendering endpoint for a serialized payload,
//! streams it simultaneously into the host runtime's renderer and an
//! in-memory cache buffer, and suspends consumers until content is ready.
//! Payloads already embedded in the host document or fetched earlier in the
//! session are replayed without touching the network.
//!
//! This crate provides:
//! - `FragmentRequest` - request identity encoding
//! - `PayloadResolver` - cache, document, network source ladder
//! - `RuntimeAdapter` trait - environment-specific render seam
//! - `PayloadTransport` trait / `HttpTransport` - outbound POST transport
//! - `FragmentOrchestrator` - mount/update/suspend lifecycle

mod orchestrator;
mod request;
mod resolver;
mod runtime;
mod transport;

pub use orchestrator::*;
pub use request::*;
pub use resolver::*;
pub use runtime::*;
pub use transport::*;
