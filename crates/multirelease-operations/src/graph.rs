use indexmap::{IndexMap, IndexSet};

use crate::arena::{PackageArena, PackageId};
use crate::error::OperationError;
use crate::Result;

/// Edges from a dependency to the packages depending on it. Every package of
/// the run is a key, in arena order.
pub type DependencyGraph = IndexMap<String, IndexSet<String>>;

#[must_use]
pub fn build_graph(arena: &PackageArena) -> DependencyGraph {
    let mut graph: DependencyGraph = arena
        .packages()
        .iter()
        .map(|package| (package.name.clone(), IndexSet::new()))
        .collect();

    for package in arena.packages() {
        for &dep in &package.local_deps {
            let dependency = &arena.package(dep).name;
            if let Some(dependents) = graph.get_mut(dependency) {
                dependents.insert(package.name.clone());
            }
        }
    }

    graph
}

/// Labels every package with the lowest id of the packages it forms a cycle
/// with, itself included.
#[must_use]
pub(crate) fn cycle_groups(local_deps: &[Vec<PackageId>]) -> Vec<usize> {
    let reach: Vec<Vec<bool>> = (0..local_deps.len())
        .map(|start| {
            let mut seen = vec![false; local_deps.len()];
            let mut stack = vec![start];
            while let Some(id) = stack.pop() {
                if seen[id] {
                    continue;
                }
                seen[id] = true;
                stack.extend(local_deps[id].iter().copied().filter(|dep| !seen[*dep]));
            }
            seen
        })
        .collect();

    (0..local_deps.len())
        .map(|id| {
            (0..=id)
                .find(|other| reach[id][*other] && reach[*other][id])
                .unwrap_or(id)
        })
        .collect()
}

/// Layers the graph so that each batch only depends on earlier batches.
///
/// A package depending on itself does not count as a cycle.
///
/// # Errors
///
/// Returns `OperationError::DependencyCycle` naming the packages left over once
/// no package without pending dependencies remains.
pub fn batched_topological_order(graph: &DependencyGraph) -> Result<Vec<Vec<String>>> {
    let mut in_degree: IndexMap<&str, usize> =
        graph.keys().map(|name| (name.as_str(), 0)).collect();
    for (dependency, dependents) in graph {
        for dependent in dependents.iter().filter(|dependent| *dependent != dependency) {
            *in_degree.entry(dependent.as_str()).or_default() += 1;
        }
    }

    let mut batches = Vec::new();
    loop {
        let batch: Vec<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| *name)
            .collect();
        if batch.is_empty() {
            break;
        }

        for name in &batch {
            in_degree.shift_remove(name);
            let dependents = graph.get(*name).into_iter().flatten();
            for dependent in dependents.filter(|dependent| dependent.as_str() != *name) {
                if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                    *degree -= 1;
                }
            }
        }
        batches.push(batch.into_iter().map(str::to_string).collect());
    }

    if !in_degree.is_empty() {
        return Err(OperationError::DependencyCycle {
            packages: in_degree.keys().map(|name| (*name).to_string()).collect(),
        });
    }

    Ok(batches)
}
