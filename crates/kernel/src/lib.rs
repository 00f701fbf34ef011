//! Core building blocks shared by every SHELF crate: layered settings, the
//! module lifecycle, and the transport-agnostic types use-cases speak.

pub mod context;
pub mod error;
pub mod module;
pub mod registry;
pub mod settings;

pub use context::RequestCtx;
pub use error::{ErrorKind, UseCaseError, UseCaseResult};
pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
