//! `information_schema`-backed catalog implementation.

use super::{Catalog, ColumnMeta, FkEdge, PgDataType};
use crate::error::Result;
use crate::source::SourcePool;
use async_trait::async_trait;
use tracing::debug;

/// Foreign-key edges where the referenced (parent) table is `$1`.
const CHILDREN_QUERY: &str = r#"
    SELECT
        tc.table_name AS child_table,
        kcu.column_name AS child_column,
        ccu.table_name AS parent_table,
        ccu.column_name AS parent_column
    FROM information_schema.table_constraints AS tc
    JOIN information_schema.key_column_usage AS kcu
      ON tc.constraint_name = kcu.constraint_name
     AND tc.table_schema = kcu.table_schema
    JOIN information_schema.constraint_column_usage AS ccu
      ON ccu.constraint_name = tc.constraint_name
    WHERE tc.constraint_type = 'FOREIGN KEY'
      AND tc.table_schema = 'public'
      AND ccu.table_name = $1
"#;

/// Foreign-key edges where the referencing (child) table is `$1`.
const PARENTS_QUERY: &str = r#"
    SELECT
        tc.table_name AS child_table,
        kcu.column_name AS child_column,
        ccu.table_name AS parent_table,
        ccu.column_name AS parent_column
    FROM information_schema.table_constraints AS tc
    JOIN information_schema.key_column_usage AS kcu
      ON tc.constraint_name = kcu.constraint_name
     AND tc.table_schema = kcu.table_schema
    JOIN information_schema.constraint_column_usage AS ccu
      ON ccu.constraint_name = tc.constraint_name
    WHERE tc.constraint_type = 'FOREIGN KEY'
      AND tc.table_schema = 'public'
      AND tc.table_name = $1
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT column_name, is_nullable, data_type
    FROM information_schema.columns
    WHERE table_schema = 'public'
      AND table_name = $1
    ORDER BY ordinal_position
"#;

/// Catalog lookups against the source database.
pub struct PgCatalog<'a> {
    pool: &'a SourcePool,
}

impl<'a> PgCatalog<'a> {
    pub fn new(pool: &'a SourcePool) -> Self {
        Self { pool }
    }

    async fn fk_edges(&self, query: &str, table: &str, context: &str) -> Result<Vec<FkEdge>> {
        let client = self.pool.client(context).await?;
        let rows = client.query(query, &[&table]).await?;

        let edges = rows
            .iter()
            .map(|row| FkEdge {
                child_table: row.get(0),
                child_column: row.get(1),
                parent_table: row.get(2),
                parent_column: row.get(3),
            })
            .collect::<Vec<_>>();

        debug!("{} of {}: {} edges", context, table, edges.len());
        Ok(edges)
    }
}

#[async_trait]
impl Catalog for PgCatalog<'_> {
    async fn children_of(&self, table: &str) -> Result<Vec<FkEdge>> {
        self.fk_edges(CHILDREN_QUERY, table, "children_of").await
    }

    async fn parents_of(&self, table: &str) -> Result<Vec<FkEdge>> {
        self.fk_edges(PARENTS_QUERY, table, "parents_of").await
    }

    async fn columns_of(&self, table: &str) -> Result<Vec<ColumnMeta>> {
        let client = self.pool.client("columns_of").await?;
        let rows = client.query(COLUMNS_QUERY, &[&table]).await?;

        let cols = rows
            .iter()
            .map(|row| {
                let is_nullable: String = row.get(1);
                let data_type: String = row.get(2);
                ColumnMeta {
                    name: row.get(0),
                    nullable: is_nullable == "YES",
                    data_type: PgDataType::from_catalog(&data_type),
                }
            })
            .collect::<Vec<_>>();

        debug!("columns_of {}: {} columns", table, cols.len());
        Ok(cols)
    }
}
