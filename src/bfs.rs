//! Breadth-first shortest paths on the grid graph.
//!
//! Every move costs one, so level-order traversal yields exact move counts.
//! The queue is a flat `Vec` with a read head, the same layout the Go
//! engine used for its common-fate-graph distances.

use crate::board::Cell;
use crate::constants::UNREACHABLE;
use crate::error::{Error, Result};
use crate::grid::GridGraph;

/// Move counts from one source to every cell, flat row-major.
#[derive(Clone, Debug)]
pub struct DistanceMap {
    dist: Vec<u32>,
}

impl DistanceMap {
    /// Distance to a cell index, `None` if unreachable.
    #[inline]
    pub fn get(&self, index: usize) -> Option<u32> {
        match self.dist[index] {
            UNREACHABLE => None,
            d => Some(d),
        }
    }
}

/// Level-order search from `source` over the whole graph.
///
/// `settled` sees each cell index as it leaves the queue; returning `true`
/// ends the search there. Cells never labelled keep [`UNREACHABLE`].
fn search(graph: &GridGraph, source: Cell, mut settled: impl FnMut(usize) -> bool) -> Vec<u32> {
    let mut dist = vec![UNREACHABLE; graph.len()];
    if !graph.is_open(source) {
        return dist;
    }
    let mut queue = Vec::with_capacity(graph.len());
    let start = graph.index(source);
    dist[start] = 0;
    queue.push(start);
    let mut head = 0;

    while head < queue.len() {
        let pt = queue[head];
        head += 1;
        if settled(pt) {
            break;
        }
        let next = dist[pt] + 1;
        for n in graph.neighbors(pt) {
            if dist[n] == UNREACHABLE {
                dist[n] = next;
                queue.push(n);
            }
        }
    }

    dist
}

/// Full BFS from `source`. Walls and cut-off regions stay unreachable.
pub fn shortest_paths(graph: &GridGraph, source: Cell) -> DistanceMap {
    DistanceMap {
        dist: search(graph, source, |_| false),
    }
}

/// Move counts from `source` to each of `targets`, written to `out` in order.
///
/// The search stops as soon as every target has been settled. Fails with
/// [`Error::UnreachableCoin`] naming the first target that cannot be reached.
///
/// # Panics
///
/// Panics if `out` and `targets` differ in length.
pub fn distances_to(
    graph: &GridGraph,
    source: Cell,
    targets: &[Cell],
    out: &mut [u32],
) -> Result<()> {
    assert_eq!(out.len(), targets.len(), "one output slot per target");
    let mut pending = vec![false; graph.len()];
    let mut remaining = 0usize;
    for &t in targets {
        if !graph.is_open(t) {
            return Err(Error::UnreachableCoin { from: source, to: t });
        }
        let i = graph.index(t);
        if !pending[i] {
            pending[i] = true;
            remaining += 1;
        }
    }

    let dist = search(graph, source, |pt| {
        if pending[pt] {
            pending[pt] = false;
            remaining -= 1;
        }
        remaining == 0
    });

    for (slot, &t) in out.iter_mut().zip(targets) {
        *slot = match dist[graph.index(t)] {
            UNREACHABLE => return Err(Error::UnreachableCoin { from: source, to: t }),
            d => d,
        };
    }
    Ok(())
}
