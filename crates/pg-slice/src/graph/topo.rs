//! Topological ordering of the reached tables.
//!
//! Two Kahn's-algorithm runs: one over the full reached set producing the
//! global order `L` (parents before children), and one restricted to the
//! outsider subgraph producing the outsider extraction order (referrers
//! before the tables they reference). Both runs work on fresh copies of
//! the edge maps. Self-referential edges are skipped when computing
//! in-degrees so a self-FK does not read as a cycle.

use super::GraphState;
use crate::error::{Result, SliceError};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

/// Order the full reached set, parents first.
///
/// A table enters the order once every table it references has; a run that
/// cannot place every table means the foreign-key graph is cyclic, which is
/// fatal.
pub fn sort_reached(graph: &GraphState) -> Result<Vec<String>> {
    // Working copies with self-edges dropped.
    let mut deps: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut inv: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for table in &graph.reached {
        deps.insert(
            table,
            graph
                .parents_of(table)
                .filter(|p| *p != table)
                .map(String::as_str)
                .collect(),
        );
        inv.insert(
            table,
            graph
                .referrers_of(table)
                .filter(|r| *r != table)
                .map(String::as_str)
                .collect(),
        );
    }

    let mut queue: VecDeque<&str> = graph
        .reached
        .iter()
        .map(String::as_str)
        .filter(|t| deps[t].is_empty())
        .collect();

    let mut order = Vec::with_capacity(graph.reached.len());
    while let Some(table) = queue.pop_front() {
        order.push(table.to_string());
        let referrers = inv.remove(table).unwrap_or_default();
        for child in referrers {
            let remaining = deps.get_mut(child).map(|set| {
                set.remove(table);
                set.len()
            });
            if remaining == Some(0) {
                queue.push_back(child);
            }
        }
    }

    if order.len() < graph.reached.len() {
        return Err(SliceError::Cycle {
            sorted: order.len(),
            reached: graph.reached.len(),
        });
    }

    debug!("global order: {:?}", order);
    Ok(order)
}

/// Order the outsider subgraph, referrers first.
///
/// An outsider is extracted by seeding from the parsed CSVs of every table
/// that references it, so each outsider must come after its outsider
/// referrers. Seeds are outsiders with no inbound edge from another
/// outsider (their referrers are all descendants, already extracted).
pub fn sort_outsiders(graph: &GraphState) -> Result<Vec<String>> {
    let mut indegree: BTreeMap<&str, usize> = BTreeMap::new();
    for table in &graph.outsiders {
        let inbound = graph
            .referrers_of(table)
            .filter(|r| *r != table && graph.outsiders.contains(r.as_str()))
            .count();
        indegree.insert(table, inbound);
    }

    let mut queue: VecDeque<&str> = indegree
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(t, _)| *t)
        .collect();

    let mut order = Vec::with_capacity(graph.outsiders.len());
    while let Some(table) = queue.pop_front() {
        order.push(table.to_string());
        for referenced in graph.parents_of(table) {
            if referenced.as_str() == table || !graph.outsiders.contains(referenced) {
                continue;
            }
            if let Some(n) = indegree.get_mut(referenced.as_str()) {
                *n -= 1;
                if *n == 0 {
                    queue.push_back(referenced);
                }
            }
        }
    }

    if order.len() < graph.outsiders.len() {
        return Err(SliceError::Cycle {
            sorted: order.len(),
            reached: graph.outsiders.len(),
        });
    }

    debug!("outsider order: {:?}", order);
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::MemCatalog;
    use super::*;

    async fn graph_for(edges: &[(&str, &str, &str, &str)], root: &str) -> GraphState {
        super::super::build(&MemCatalog::new(edges), root)
            .await
            .unwrap()
    }

    fn index_of(order: &[String], table: &str) -> usize {
        order.iter().position(|t| t == table).unwrap()
    }

    #[tokio::test]
    async fn chain_orders_parents_first() {
        let graph = graph_for(&[("a", "b_id", "b", "id"), ("b", "c_id", "c", "id")], "a").await;
        let order = sort_reached(&graph).unwrap();
        assert_eq!(order, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn diamond_orders_shared_parent_first() {
        let graph = graph_for(
            &[
                ("a", "b_id", "b", "id"),
                ("a", "c_id", "c", "id"),
                ("b", "d_id", "d", "id"),
                ("c", "d_id", "d", "id"),
            ],
            "a",
        )
        .await;
        let order = sort_reached(&graph).unwrap();

        assert_eq!(order.len(), 4);
        assert!(index_of(&order, "d") < index_of(&order, "b"));
        assert!(index_of(&order, "d") < index_of(&order, "c"));
        assert!(index_of(&order, "b") < index_of(&order, "a"));
        assert!(index_of(&order, "c") < index_of(&order, "a"));
    }

    #[tokio::test]
    async fn every_edge_is_order_sound() {
        let graph = graph_for(
            &[
                ("x", "r_id", "r", "id"),
                ("x", "y_id", "y", "id"),
                ("y", "z_id", "z", "id"),
                ("w", "x_id", "x", "id"),
            ],
            "r",
        )
        .await;
        let order = sort_reached(&graph).unwrap();

        for (child, parents) in &graph.deps {
            for parent in parents {
                assert!(
                    index_of(&order, parent) < index_of(&order, child),
                    "{} must precede {}",
                    parent,
                    child
                );
            }
        }
    }

    #[tokio::test]
    async fn cycle_is_fatal() {
        let graph = graph_for(&[("a", "b_id", "b", "id"), ("b", "a_id", "a", "id")], "a").await;
        let err = sort_reached(&graph).unwrap_err();
        assert!(matches!(err, SliceError::Cycle { .. }));
        assert!(err.to_string().contains("cycle in foreign-key graph"));
    }

    #[tokio::test]
    async fn self_edge_is_tolerated() {
        let graph = graph_for(&[("t", "parent_id", "t", "id"), ("t", "r_id", "r", "id")], "r").await;
        let order = sort_reached(&graph).unwrap();
        assert_eq!(order, vec!["r", "t"]);
    }

    #[tokio::test]
    async fn outsiders_ordered_referrers_first() {
        // x (descendant) references y, y references z: both y and z are
        // outsiders and y must be extracted before z.
        let graph = graph_for(
            &[
                ("x", "r_id", "r", "id"),
                ("x", "y_id", "y", "id"),
                ("y", "z_id", "z", "id"),
            ],
            "r",
        )
        .await;
        let order = sort_outsiders(&graph).unwrap();
        assert_eq!(order, vec!["y", "z"]);
    }

    #[tokio::test]
    async fn no_outsiders_yields_empty_order() {
        let graph = graph_for(&[("x", "r_id", "r", "id")], "r").await;
        assert!(sort_outsiders(&graph).unwrap().is_empty());
    }

    #[tokio::test]
    async fn root_restricted_to_descendants_comes_first() {
        let graph = graph_for(
            &[("x", "r_id", "r", "id"), ("y", "x_id", "x", "id")],
            "r",
        )
        .await;
        let order = sort_reached(&graph).unwrap();
        let descendants: Vec<&String> = order
            .iter()
            .filter(|t| graph.direct_descendants.contains(*t))
            .collect();
        assert_eq!(descendants, vec!["r", "x", "y"]);
    }
}
