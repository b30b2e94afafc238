//! The data-search engine.
//!
//! Tables are extracted one at a time in two ordered passes, direct
//! descendants (root first) and then outsiders, so that every parsed
//! projection a table's filter reads is already on disk when the table is
//! processed. Rows stream from the driver straight to the raw CSV; nothing
//! accumulates in memory.

mod filter;
mod projection;

pub use projection::RawColumn;

use crate::error::{Result, SliceError};
use crate::graph::GraphState;
use crate::layout::OutputLayout;
use crate::source::SourcePool;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures::StreamExt;
use std::fs::File;
use std::io::{BufWriter, Write};
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::Row;
use tracing::{debug, info};

/// Field delimiter for every CSV this engine reads or writes: ASCII group
/// separator, chosen to sidestep embedded commas.
pub const DELIMITER: u8 = 0x1d;
pub const DELIMITER_CHAR: char = '\u{1d}';

/// Which pass a table is extracted in; selects the filter construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Descendant,
    Outsider,
}

/// Streams filtered `SELECT *` results to per-table CSVs.
pub struct DataSearchEngine<'a> {
    pool: &'a SourcePool,
    graph: &'a GraphState,
    layout: &'a OutputLayout,
    root_id: &'a str,
    rows_written: u64,
}

impl<'a> DataSearchEngine<'a> {
    pub fn new(
        pool: &'a SourcePool,
        graph: &'a GraphState,
        layout: &'a OutputLayout,
        root_id: &'a str,
    ) -> Self {
        Self {
            pool,
            graph,
            layout,
            root_id,
            rows_written: 0,
        }
    }

    /// Total rows written to raw CSVs so far.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Extract every table in `order`, building each filter per `pass`.
    pub async fn extract_tables(&mut self, order: &[String], pass: Pass) -> Result<()> {
        for table in order {
            let where_clause = match pass {
                Pass::Descendant => {
                    filter::descendant_where(self.graph, self.layout, table, self.root_id)?
                }
                Pass::Outsider => filter::outsider_where(self.graph, self.layout, table)?,
            };
            self.extract_table(table, &where_clause).await?;
        }
        Ok(())
    }

    /// Run one table's filtered `SELECT *`, stream rows to the raw CSV,
    /// then write the parsed projection if anything came back.
    async fn extract_table(&mut self, table: &str, where_clause: &str) -> Result<()> {
        self.layout.ensure_table_dir(table)?;

        let sql = format!("SELECT * FROM {} {}", quote_ident(table), where_clause);
        debug!("data search: {}", sql);

        let client = self.pool.client("extract_table").await?;
        let params: Vec<&(dyn ToSql + Sync)> = Vec::new();
        let stream = client.query_raw(sql.as_str(), params).await?;
        tokio::pin!(stream);

        let mut writer = BufWriter::new(File::create(self.layout.raw_csv(table))?);
        let needed = self.graph.needed_columns(table);
        let mut projected: Option<Vec<RawColumn>> = None;
        let mut rows = 0u64;

        while let Some(row) = stream.next().await {
            let row = row?;
            if rows == 0 {
                projected = Some(column_indexes(&row, &needed)?);
            }

            let mut line = String::new();
            for idx in 0..row.len() {
                if idx > 0 {
                    line.push(DELIMITER_CHAR);
                }
                if let Some(value) = text_value(&row, idx) {
                    // Embedded line breaks would split a CSV record.
                    line.push_str(&value.replace(['\n', '\r'], ""));
                }
            }
            writeln!(writer, "{}", line)?;
            rows += 1;
        }
        writer.flush()?;

        if rows > 0 && !needed.is_empty() {
            if let Some(cols) = projected {
                projection::write_projection(
                    &self.layout.raw_csv(table),
                    &self.layout.parsed_csv(table),
                    &cols,
                )?;
            }
        } else {
            // A projection left over from an earlier run must not seed
            // later tables in this one.
            let parsed = self.layout.parsed_csv(table);
            if parsed.exists() {
                std::fs::remove_file(parsed)?;
            }
        }

        self.rows_written += rows;
        info!("extracted {}: {} rows", table, rows);
        Ok(())
    }
}

/// Locate each needed column within the result row.
fn column_indexes(row: &Row, needed: &[String]) -> Result<Vec<RawColumn>> {
    needed
        .iter()
        .map(|name| {
            row.columns()
                .iter()
                .position(|col| col.name() == name.as_str())
                .map(|index| RawColumn {
                    name: name.clone(),
                    index,
                })
                .ok_or_else(|| {
                    SliceError::invariant(format!("needed FK column {} not present in row", name))
                })
        })
        .collect()
}

/// Quote a PostgreSQL identifier.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render one row value as CSV text, dispatching on the wire type.
///
/// `None` is SQL NULL and serializes as an empty field, which is also what
/// `COPY … CSV` reads back as NULL. Values the driver cannot decode under
/// the expected type degrade to NULL the same way.
fn text_value(row: &Row, idx: usize) -> Option<String> {
    let ty = row.columns()[idx].type_();

    if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)
            .ok()
            .flatten()
            .map(|v| if v { "t" } else { "f" }.to_string())
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)
            .ok()
            .flatten()
            .map(|v| v.to_string())
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)
            .ok()
            .flatten()
            .map(|v| v.to_string())
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)
            .ok()
            .flatten()
            .map(|v| v.to_string())
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)
            .ok()
            .flatten()
            .map(|v| v.to_string())
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx)
            .ok()
            .flatten()
            .map(|v| v.to_string())
    } else if *ty == Type::NUMERIC {
        row.try_get::<_, Option<rust_decimal::Decimal>>(idx)
            .ok()
            .flatten()
            .map(|v| v.to_string())
    } else if *ty == Type::UUID {
        row.try_get::<_, Option<uuid::Uuid>>(idx)
            .ok()
            .flatten()
            .map(|v| v.to_string())
    } else if *ty == Type::TIMESTAMP {
        row.try_get::<_, Option<NaiveDateTime>>(idx)
            .ok()
            .flatten()
            .map(|v| v.format("%Y-%m-%d %H:%M:%S%.f").to_string())
    } else if *ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<DateTime<FixedOffset>>>(idx)
            .ok()
            .flatten()
            .map(|v| v.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string())
    } else if *ty == Type::DATE {
        row.try_get::<_, Option<NaiveDate>>(idx)
            .ok()
            .flatten()
            .map(|v| v.format("%Y-%m-%d").to_string())
    } else if *ty == Type::TIME {
        row.try_get::<_, Option<NaiveTime>>(idx)
            .ok()
            .flatten()
            .map(|v| v.format("%H:%M:%S%.f").to_string())
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        row.try_get::<_, Option<serde_json::Value>>(idx)
            .ok()
            .flatten()
            .map(|v| v.to_string())
    } else {
        row.try_get::<_, Option<String>>(idx).ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_is_group_separator() {
        assert_eq!(DELIMITER, 29);
        assert_eq!(DELIMITER_CHAR as u32, 0x1d);
    }

    #[test]
    fn quote_ident_escapes_embedded_quotes() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }
}
