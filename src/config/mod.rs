/// Database connection and schema creation
pub mod database;

/// Catalog and administrator seed loading from catalog.toml
pub mod seed;

/// Server settings from environment variables
pub mod server;
