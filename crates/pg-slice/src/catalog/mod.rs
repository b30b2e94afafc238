//! Schema introspection.
//!
//! The [`Catalog`] trait is the seam between graph discovery and the source
//! database: three read-only lookups over the catalog, one per question the
//! graph builder asks. The production implementation queries
//! `information_schema` ([`PgCatalog`]); tests substitute an in-memory
//! edge list.

mod postgres;

pub use postgres::PgCatalog;

use crate::error::Result;
use async_trait::async_trait;

/// A foreign-key constraint viewed as a directed edge from the referencing
/// (child) table to the referenced (parent) table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FkEdge {
    /// Table holding the foreign-key column.
    pub child_table: String,
    /// Column in the child table.
    pub child_column: String,
    /// Table the constraint points at.
    pub parent_table: String,
    /// Referenced column in the parent table.
    pub parent_column: String,
}

/// Column metadata from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub nullable: bool,
    pub data_type: PgDataType,
}

/// PostgreSQL data types the engine distinguishes.
///
/// Only the distinction that matters here is modeled: whether a value of
/// the type is embedded in composed SQL bare or single-quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgDataType {
    Integer,
    BigInt,
    Numeric,
    Boolean,
    CharacterVarying,
    Text,
    Jsonb,
    TimestampNoTz,
    Date,
    Other,
}

impl PgDataType {
    /// Map an `information_schema.columns.data_type` string.
    pub fn from_catalog(data_type: &str) -> Self {
        match data_type {
            "integer" => PgDataType::Integer,
            "bigint" => PgDataType::BigInt,
            "numeric" => PgDataType::Numeric,
            "boolean" => PgDataType::Boolean,
            "character varying" => PgDataType::CharacterVarying,
            "text" => PgDataType::Text,
            "jsonb" => PgDataType::Jsonb,
            "timestamp without time zone" => PgDataType::TimestampNoTz,
            "date" => PgDataType::Date,
            _ => PgDataType::Other,
        }
    }

    /// Whether SQL literals of this type must be single-quoted.
    pub fn needs_quotes(self) -> bool {
        !matches!(
            self,
            PgDataType::Integer | PgDataType::BigInt | PgDataType::Numeric | PgDataType::Boolean
        )
    }
}

/// Read-only lookups against the source catalog.
///
/// Errors from the underlying driver (connectivity, permission, syntax)
/// propagate unchanged.
#[async_trait]
pub trait Catalog {
    /// Every foreign-key edge whose parent table is `table`: the tables
    /// that depend on `table`.
    async fn children_of(&self, table: &str) -> Result<Vec<FkEdge>>;

    /// Every foreign-key edge whose child table is `table`: the tables
    /// that `table` depends on.
    async fn parents_of(&self, table: &str) -> Result<Vec<FkEdge>>;

    /// Columns of `table` in ordinal order.
    async fn columns_of(&self, table: &str) -> Result<Vec<ColumnMeta>>;
}
