//! Player Registry - Maps pick names to provider player IDs
//!
//! Picks reference players by display name. This crate turns the Players
//! reference table into a lookup from name to provider ID and team code.

pub mod registry;
pub mod types;

pub use registry::PlayerRegistry;
pub use types::{Player, PlayerLookupError, ResolvedPlayer};
