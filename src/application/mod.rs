//! Application layer: binding, dispatch and rendering
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod binder;
pub mod dispatcher;
pub mod error;
pub mod renderer;

pub use binder::{
    toggle_pair, toggle_state, BoundCommand, CommandBuilder, ExtraFlags, FlagBinding, Invocation,
    RequestFactory,
};
pub use dispatcher::dispatch;
pub use error::{ApplicationError, ApplicationResult};
pub use renderer::{Outcome, Renderer, Table};
