//! The table engine: controller, state machine, fetch and prefetch flows.

mod actions;
mod controller;
mod fetch;
mod prefetch;
mod row;
mod state;

pub use actions::*;
pub use controller::*;
pub use row::*;
pub use state::*;
