//! Safe SQL building from table definitions; identifiers come from `schema`, values are parameters.

mod builder;
mod params;

pub use builder::*;
pub use params::PgBindValue;
