//! Filter and sort translation into backend query parameters.
//!
//! UI-level filter and sort descriptions are translated into the
//! bracket-encoded query parameters the remote endpoint understands
//! (`filters[field][$op]=value`, `sort[]=field:direction`, `search=`).

mod filter;
mod params;
mod sort;

pub use filter::*;
pub use params::*;
pub use sort::*;
