pub mod db;
pub mod migrations;
pub mod seed;

pub use db::{CatalogStats, CategoryStats, Database, RepopulateReport};
pub use migrations::SCHEMA_VERSION;
