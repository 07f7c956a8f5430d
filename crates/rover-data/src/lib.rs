//! rover-data: static schema tables for the rover field bot.
//!
//! Pure data, no dependencies: species display names and the default
//! evolution rules. Numeric identifiers mirror the remote service's schema;
//! the core consumes these tables through its own lookup types.

pub mod evolution;
pub mod species;

pub use evolution::DEFAULT_EVOLUTIONS;
pub use species::{species_name, SPECIES_NAMES};
