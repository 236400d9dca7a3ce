//! Bounded window caching
//!
//! Rows fetched in window-sized blocks are kept in a [`WindowCache`] capped
//! at a maximum resident window count. Eviction is delegated to an
//! [`EvictionPolicy`]; the shipped policy is [`LeastRecentlyUsed`].

mod policy;
mod window;

pub use policy::*;
pub use window::*;
