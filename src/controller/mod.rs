//! Worker lifecycle control.
//!
//! - [`Controller`] spawns and supervises workers of one cancellation family;
//! - [`Scope`] is the cancellation/deadline/value context a worker receives.

mod handle;
mod scope;

pub use handle::Controller;
pub use scope::Scope;
