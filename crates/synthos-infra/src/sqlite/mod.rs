//! SQLite storage using sqlx with split reader/writer pools.

pub mod pool;
pub mod tenant;
