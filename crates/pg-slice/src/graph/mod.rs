//! Foreign-key graph discovery and partitioning.
//!
//! Breadth-first discovery from the root table accumulates every edge map
//! the later phases need, bundled in one owned [`GraphState`]. Tables are
//! classified during discovery into *direct descendants* (root plus the
//! closure of root under reverse-reference edges) and *outsiders*
//! (everything else reached: upstream lookup and side-branch tables).
//!
//! Ordered containers are used throughout so that every later phase
//! iterates tables and columns deterministically: the same database and
//! root produce the same traversal, the same composed SQL, and the same
//! files.

pub mod topo;

use crate::catalog::{Catalog, ColumnMeta, PgDataType};
use crate::error::{Result, SliceError};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, info};

/// Everything discovery learns about the reached portion of the schema.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    /// The root table name.
    pub root: String,

    /// Every table discovery visited.
    pub reached: BTreeSet<String>,

    /// `deps[t]` = tables `t` references (its parents).
    pub deps: BTreeMap<String, BTreeSet<String>>,

    /// `inv[t]` = tables that reference `t` (its children).
    pub inv: BTreeMap<String, BTreeSet<String>>,

    /// `fkeys[child][parent]` = column in the child holding the reference.
    pub fkeys: BTreeMap<String, BTreeMap<String, String>>,

    /// `inv_fkeys[parent][child]` = column in the child holding the reference.
    pub inv_fkeys: BTreeMap<String, BTreeMap<String, String>>,

    /// `fkey_cols[parent][child_column]` = referenced column in the parent.
    pub fkey_cols: BTreeMap<String, BTreeMap<String, String>>,

    /// Columns of each table that some other table's filter will read from
    /// its parsed projection: referenced columns plus the table's own
    /// foreign-key columns.
    pub table_fkey_needs: BTreeMap<String, BTreeSet<String>>,

    /// Column metadata per table, keyed by column name.
    pub table_cols: BTreeMap<String, BTreeMap<String, ColumnMeta>>,

    /// Root plus every table reachable from root along reverse-reference
    /// edges.
    pub direct_descendants: BTreeSet<String>,

    /// Reached tables that are not direct descendants.
    pub outsiders: BTreeSet<String>,
}

impl GraphState {
    /// Parents of `table` in dependency order.
    pub fn parents_of(&self, table: &str) -> impl Iterator<Item = &String> {
        self.deps.get(table).into_iter().flatten()
    }

    /// Tables referencing `table` in dependency order.
    pub fn referrers_of(&self, table: &str) -> impl Iterator<Item = &String> {
        self.inv.get(table).into_iter().flatten()
    }

    /// Data type of a column, `Other` when the catalog did not report it.
    pub fn column_type(&self, table: &str, column: &str) -> PgDataType {
        self.table_cols
            .get(table)
            .and_then(|cols| cols.get(column))
            .map(|meta| meta.data_type)
            .unwrap_or(PgDataType::Other)
    }

    /// Needed-FK columns of `table` in stable (sorted) order.
    pub fn needed_columns(&self, table: &str) -> Vec<String> {
        self.table_fkey_needs
            .get(table)
            .map(|cols| cols.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn mark_descendant(&mut self, table: &str) {
        if self.outsiders.remove(table) {
            debug!("promoting {} from outsider to direct descendant", table);
        }
        self.direct_descendants.insert(table.to_string());
    }

    /// The disjoint-union partition invariant, checked once discovery ends.
    fn check_partition(&self) -> Result<()> {
        let overlap: Vec<_> = self
            .direct_descendants
            .intersection(&self.outsiders)
            .cloned()
            .collect();
        if !overlap.is_empty() {
            return Err(SliceError::invariant(format!(
                "tables classified as both descendant and outsider: {:?}",
                overlap
            )));
        }
        if self.direct_descendants.len() + self.outsiders.len() != self.reached.len() {
            return Err(SliceError::invariant(format!(
                "partition does not cover reached set: {} descendants + {} outsiders != {} reached",
                self.direct_descendants.len(),
                self.outsiders.len(),
                self.reached.len()
            )));
        }
        Ok(())
    }
}

/// Discover the foreign-key graph reachable from `root`.
///
/// Each reached table is dequeued exactly once; for it the catalog is asked
/// for its children (tables referencing it), its parents (tables it
/// references), and its columns. Newly seen tables on either side are
/// enqueued, so traversal terminates once the transitive closure is built.
pub async fn build<C: Catalog + Sync>(catalog: &C, root: &str) -> Result<GraphState> {
    let mut state = GraphState {
        root: root.to_string(),
        ..GraphState::default()
    };

    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(root.to_string());
    state.reached.insert(root.to_string());
    state.direct_descendants.insert(root.to_string());

    while let Some(table) = queue.pop_front() {
        for edge in catalog.children_of(&table).await? {
            let child = edge.child_table.clone();

            state
                .deps
                .entry(child.clone())
                .or_default()
                .insert(table.clone());
            state
                .inv
                .entry(table.clone())
                .or_default()
                .insert(child.clone());
            state
                .fkey_cols
                .entry(table.clone())
                .or_default()
                .insert(edge.child_column.clone(), edge.parent_column.clone());
            state
                .table_fkey_needs
                .entry(table.clone())
                .or_default()
                .insert(edge.parent_column.clone());
            state
                .fkeys
                .entry(child.clone())
                .or_default()
                .insert(table.clone(), edge.child_column.clone());
            state
                .inv_fkeys
                .entry(table.clone())
                .or_default()
                .insert(child.clone(), edge.child_column);

            // A table referencing a direct descendant is itself one.
            if state.direct_descendants.contains(&table) {
                state.mark_descendant(&child);
            } else if !state.direct_descendants.contains(&child) {
                state.outsiders.insert(child.clone());
            }

            if state.reached.insert(child.clone()) {
                queue.push_back(child);
            }
        }

        for edge in catalog.parents_of(&table).await? {
            let parent = edge.parent_table.clone();

            state
                .deps
                .entry(table.clone())
                .or_default()
                .insert(parent.clone());
            state
                .inv
                .entry(parent.clone())
                .or_default()
                .insert(table.clone());
            state
                .table_fkey_needs
                .entry(table.clone())
                .or_default()
                .insert(edge.child_column.clone());
            state
                .fkey_cols
                .entry(table.clone())
                .or_default()
                .insert(edge.child_column.clone(), edge.parent_column.clone());
            state
                .fkeys
                .entry(table.clone())
                .or_default()
                .insert(parent.clone(), edge.child_column.clone());
            state
                .inv_fkeys
                .entry(parent.clone())
                .or_default()
                .insert(table.clone(), edge.child_column);

            if !state.direct_descendants.contains(&parent) {
                state.outsiders.insert(parent.clone());
            }

            if state.reached.insert(parent.clone()) {
                queue.push_back(parent);
            }
        }

        let columns = catalog.columns_of(&table).await?;
        state.table_cols.insert(
            table.clone(),
            columns
                .into_iter()
                .map(|meta| (meta.name.clone(), meta))
                .collect(),
        );
    }

    state.check_partition()?;

    info!(
        "discovered {} tables from {}: {} direct descendants, {} outsiders",
        state.reached.len(),
        root,
        state.direct_descendants.len(),
        state.outsiders.len()
    );

    Ok(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::catalog::{Catalog, ColumnMeta, FkEdge, PgDataType};
    use crate::error::Result;
    use async_trait::async_trait;

    /// In-memory catalog over a fixed edge list.
    pub struct MemCatalog {
        pub edges: Vec<FkEdge>,
        pub columns: Vec<(String, Vec<ColumnMeta>)>,
    }

    impl MemCatalog {
        pub fn new(edges: &[(&str, &str, &str, &str)]) -> Self {
            Self {
                edges: edges
                    .iter()
                    .map(|(child, child_col, parent, parent_col)| FkEdge {
                        child_table: child.to_string(),
                        child_column: child_col.to_string(),
                        parent_table: parent.to_string(),
                        parent_column: parent_col.to_string(),
                    })
                    .collect(),
                columns: Vec::new(),
            }
        }

        pub fn with_columns(mut self, table: &str, cols: &[(&str, PgDataType)]) -> Self {
            self.columns.push((
                table.to_string(),
                cols.iter()
                    .map(|(name, data_type)| ColumnMeta {
                        name: name.to_string(),
                        nullable: false,
                        data_type: *data_type,
                    })
                    .collect(),
            ));
            self
        }
    }

    #[async_trait]
    impl Catalog for MemCatalog {
        async fn children_of(&self, table: &str) -> Result<Vec<FkEdge>> {
            Ok(self
                .edges
                .iter()
                .filter(|e| e.parent_table == table)
                .cloned()
                .collect())
        }

        async fn parents_of(&self, table: &str) -> Result<Vec<FkEdge>> {
            Ok(self
                .edges
                .iter()
                .filter(|e| e.child_table == table)
                .cloned()
                .collect())
        }

        async fn columns_of(&self, table: &str) -> Result<Vec<ColumnMeta>> {
            Ok(self
                .columns
                .iter()
                .find(|(name, _)| name == table)
                .map(|(_, cols)| cols.clone())
                .unwrap_or_default())
        }
    }
}
