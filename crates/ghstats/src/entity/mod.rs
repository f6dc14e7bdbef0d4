//! SeaORM entity definitions for the ghstats database schema.

pub mod interaction;
pub mod interaction_type;
pub mod organization;
pub mod prelude;
pub mod repository;
