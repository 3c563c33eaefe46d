//! Component dependency graph.
//!
//! Edges point from a prerequisite to the component that needs it.

use super::components::{registry, Component};
use anyhow::{bail, Result};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet};

pub fn dependency_graph() -> DiGraphMap<Component, ()> {
    let mut graph = DiGraphMap::new();
    for buildable in registry::COMPONENTS {
        let component = buildable.component();
        graph.add_node(component);
        for &prerequisite in buildable.prerequisites() {
            graph.add_edge(prerequisite, component, ());
        }
    }
    graph
}

/// `requested` plus every transitive prerequisite.
pub fn with_prerequisites(requested: &BTreeSet<Component>) -> BTreeSet<Component> {
    let graph = dependency_graph();
    let mut enabled = BTreeSet::new();
    let mut stack: Vec<Component> = requested.iter().copied().collect();

    while let Some(component) = stack.pop() {
        if enabled.insert(component) {
            stack.extend(graph.neighbors_directed(component, Direction::Incoming));
        }
    }
    enabled
}

/// All components in dependency order, ties broken by canonical order.
pub fn build_order() -> Result<Vec<Component>> {
    let graph = dependency_graph();

    if let Err(cycle) = toposort(&graph, None) {
        bail!("Dependency cycle involving {}", cycle.node_id());
    }

    let mut pending: BTreeMap<Component, usize> = graph
        .nodes()
        .map(|n| (n, graph.neighbors_directed(n, Direction::Incoming).count()))
        .collect();
    let mut ready: BTreeSet<Component> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(&n, _)| n)
        .collect();
    let mut order = Vec::with_capacity(pending.len());

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for dependent in graph.neighbors_directed(next, Direction::Outgoing) {
            if let Some(count) = pending.get_mut(&dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(dependent);
                }
            }
        }
    }

    Ok(order)
}
