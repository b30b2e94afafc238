//! Slice-extraction orchestrator - main workflow coordinator.
//!
//! Wires the pipeline end to end, strictly sequentially: connect →
//! introspect and build the graph → partition → sort → extract direct
//! descendants → extract outsiders → emit loader commands → report.

use crate::config::Config;
use crate::error::Result;
use crate::graph::{self, topo};
use crate::layout::OutputLayout;
use crate::loader::{self, BulkLoadEmitter};
use crate::search::{DataSearchEngine, Pass};
use crate::source::SourcePool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Base output directory, created under the working directory.
const OUTPUT_DIR: &str = "data";

/// Slice-extraction orchestrator.
pub struct Orchestrator {
    config: Config,
}

/// Result of a slice-extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceResult {
    /// Root table the slice was taken from.
    pub root_table: String,

    /// Root row id, as supplied.
    pub root_id: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Tables reached by graph discovery.
    pub tables_reached: usize,

    /// Direct descendants of the root.
    pub direct_descendants: usize,

    /// Reached tables outside the descendant set.
    pub outsiders: usize,

    /// Total rows written to raw CSVs.
    pub rows_extracted: u64,

    /// Tables successfully bulk-loaded into the destination.
    pub tables_loaded: usize,

    /// Tables whose bulk-copy command failed.
    pub failed_tables: Vec<String>,
}

impl Orchestrator {
    /// Create a new orchestrator.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the slice extraction for one root row.
    pub async fn run(&self, root_table: &str, root_id: &str) -> Result<SliceResult> {
        let started_at = Utc::now();

        let pool = SourcePool::connect(&self.config.source).await?;
        let catalog = crate::catalog::PgCatalog::new(&pool);
        let graph = graph::build(&catalog, root_table).await?;

        let order = topo::sort_reached(&graph)?;
        let outsider_order = topo::sort_outsiders(&graph)?;
        let descendant_order: Vec<String> = order
            .iter()
            .filter(|t| graph.direct_descendants.contains(*t))
            .cloned()
            .collect();

        let layout = OutputLayout::create(OUTPUT_DIR)?;

        let mut engine = DataSearchEngine::new(&pool, &graph, &layout, root_id);
        engine.extract_tables(&descendant_order, Pass::Descendant).await?;
        engine.extract_tables(&outsider_order, Pass::Outsider).await?;
        let rows_extracted = engine.rows_written();

        let emitter = BulkLoadEmitter::new(self.config.destination.as_ref(), &layout);
        let report = emitter.run(&order).await?;
        loader::write_graph_info(&layout, &graph, &order, &report.commands)?;

        let completed_at = Utc::now();
        let duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        info!(
            "slice complete: {} tables, {} rows in {:.2}s",
            graph.reached.len(),
            rows_extracted,
            duration_seconds
        );

        Ok(SliceResult {
            root_table: root_table.to_string(),
            root_id: root_id.to_string(),
            started_at,
            completed_at,
            duration_seconds,
            tables_reached: graph.reached.len(),
            direct_descendants: graph.direct_descendants.len(),
            outsiders: graph.outsiders.len(),
            rows_extracted,
            tables_loaded: report.tables_loaded,
            failed_tables: report.failed_tables,
        })
    }
}

impl SliceResult {
    /// Convert to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
