//! # pg-slice
//!
//! Extract a referentially consistent slice of a PostgreSQL database
//! starting from a single root row.
//!
//! The engine follows foreign-key edges transitively from the root table,
//! classifies every reached table as a direct descendant of the root or an
//! upstream/side-branch outsider, orders the tables topologically, and
//! extracts each one with a filtered `SELECT *` seeded from the rows
//! already extracted. Per-table CSV files (0x1D-delimited) and the
//! `\copy` commands to bulk-load them into a destination database are the
//! run's output.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pg_slice::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), pg_slice::SliceError> {
//!     let config = Config::load("dataSource.json")?;
//!     let result = Orchestrator::new(config).run("users", "42").await?;
//!     println!("extracted {} rows", result.rows_extracted);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod loader;
pub mod orchestrator;
pub mod search;
pub mod source;

// Re-exports for convenient access
pub use catalog::{Catalog, ColumnMeta, FkEdge, PgCatalog, PgDataType};
pub use config::{Config, DestinationConfig, SourceConfig};
pub use error::{Result, SliceError};
pub use graph::GraphState;
pub use layout::OutputLayout;
pub use loader::{BulkLoadEmitter, LoadReport};
pub use orchestrator::{Orchestrator, SliceResult};
pub use search::{DataSearchEngine, Pass, DELIMITER};
pub use source::SourcePool;
