//! Core abstractions for remote fragment rendering.
//!
//! This crate provides the types shared by the client stack:
//! - `RenderContext` / `ContextOverride` - hierarchical configuration
//! - `PayloadCache` - shared in-memory payload cache
//! - `RenderOptions` / `ServerCallback` trait - opaque render collaborators
//! - `RenderError` - error taxonomy

mod cache;
mod callback;
mod context;
mod error;

pub use cache::*;
pub use callback::*;
pub use context::*;
pub use error::*;
