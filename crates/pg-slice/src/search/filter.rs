//! WHERE-clause construction for the per-table data search.
//!
//! Every non-root table is filtered by a disjunction seeded from the parsed
//! projection CSVs written earlier in the run: a descendant filters its own
//! foreign-key columns by the values its (descendant) parents exported; an
//! outsider filters its referenced columns by the foreign-key values its
//! referrers exported. The `1 = 2` seed clause makes the query return the
//! empty set when no disjunct contributes, which is how a nonexistent root
//! id drains the whole run to empty CSVs.

use super::DELIMITER_CHAR;
use crate::catalog::PgDataType;
use crate::error::{Result, SliceError};
use crate::graph::GraphState;
use crate::layout::OutputLayout;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::debug;

/// Build the filter for a direct descendant.
///
/// The root row is selected by its primary key; every other descendant is
/// seeded from each parent that is itself a direct descendant. Parents that
/// exported no rows contribute no disjunct.
pub fn descendant_where(
    graph: &GraphState,
    layout: &OutputLayout,
    table: &str,
    root_id: &str,
) -> Result<String> {
    if table == graph.root {
        return Ok(format!("WHERE id = {}", root_id_literal(root_id)));
    }

    let mut clause = String::from("WHERE 1 = 2");
    for parent in graph.parents_of(table) {
        if parent.as_str() == table || !graph.direct_descendants.contains(parent) {
            continue;
        }
        let child_col = graph
            .fkeys
            .get(table)
            .and_then(|m| m.get(parent))
            .ok_or_else(|| {
                SliceError::invariant(format!("no foreign key recorded from {} to {}", table, parent))
            })?;
        let parent_col = graph
            .fkey_cols
            .get(parent)
            .and_then(|m| m.get(child_col))
            .ok_or_else(|| {
                SliceError::invariant(format!(
                    "no referenced column recorded on {} for {}.{}",
                    parent, table, child_col
                ))
            })?;

        let values = seed_values(layout, parent, parent_col)?;
        if values.is_empty() {
            continue;
        }
        clause.push_str(&format!(
            " OR \"{}\" IN ({})",
            child_col,
            in_list(&values, graph.column_type(table, child_col))
        ));
    }
    Ok(clause)
}

/// Build the filter for an outsider.
///
/// Seeded from every table that references the outsider, reading each
/// referrer's own foreign-key column out of its parsed projection. NULLs
/// (empty cells) never reach the `IN` list.
pub fn outsider_where(graph: &GraphState, layout: &OutputLayout, table: &str) -> Result<String> {
    let mut clause = String::from("WHERE 1 = 2");
    for dependant in graph.referrers_of(table) {
        if dependant.as_str() == table {
            continue;
        }
        let child_col = graph
            .inv_fkeys
            .get(table)
            .and_then(|m| m.get(dependant))
            .ok_or_else(|| {
                SliceError::invariant(format!(
                    "no foreign key recorded from {} to {}",
                    dependant, table
                ))
            })?;
        let target_col = graph
            .fkey_cols
            .get(table)
            .and_then(|m| m.get(child_col))
            .ok_or_else(|| {
                SliceError::invariant(format!(
                    "no referenced column recorded on {} for {}.{}",
                    table, dependant, child_col
                ))
            })?;

        let values = seed_values(layout, dependant, child_col)?;
        if values.is_empty() {
            debug!("no associative values for {} from {}", table, dependant);
            continue;
        }
        clause.push_str(&format!(
            " OR \"{}\" IN ({})",
            target_col,
            in_list(&values, graph.column_type(table, target_col))
        ));
    }
    Ok(clause)
}

/// Read one column of a table's parsed projection CSV.
///
/// A missing file means the table exported no rows (or had nothing to
/// export) and yields an empty seed set. Empty cells are NULLs and are
/// dropped here.
fn seed_values(layout: &OutputLayout, table: &str, column: &str) -> Result<Vec<String>> {
    let path = layout.parsed_csv(table);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(&path)?);
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => return Ok(Vec::new()),
    };
    let index = header
        .split(DELIMITER_CHAR)
        .position(|name| name == column)
        .ok_or_else(|| {
            SliceError::invariant(format!(
                "column {} missing from parsed CSV header of {}",
                column, table
            ))
        })?;

    let mut values = Vec::new();
    for line in lines {
        let line = line?;
        let cell = line.split(DELIMITER_CHAR).nth(index).ok_or_else(|| {
            SliceError::invariant(format!(
                "row in parsed CSV of {} has fewer cells than its header",
                table
            ))
        })?;
        if !cell.is_empty() {
            values.push(cell.to_string());
        }
    }
    Ok(values)
}

/// Render an `IN (…)` value list, quoting according to the filtered
/// column's type.
fn in_list(values: &[String], data_type: PgDataType) -> String {
    if data_type.needs_quotes() {
        values
            .iter()
            .map(|v| quote(v))
            .collect::<Vec<_>>()
            .join(",")
    } else {
        values.join(",")
    }
}

/// Render the root id. Purely numeric values pass through bare; anything
/// else is escaped into a quoted literal rather than interpolated raw.
fn root_id_literal(root_id: &str) -> String {
    let mut chars = root_id.chars();
    let numeric = match chars.next() {
        Some(c) if c.is_ascii_digit() || c == '-' => chars.all(|c| c.is_ascii_digit()),
        _ => false,
    };
    if numeric {
        root_id.to_string()
    } else {
        quote(root_id)
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
