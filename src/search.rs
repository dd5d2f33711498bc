//! Dijkstra over dense integer node ids.
//!
//! The scratch buffers are owned by the caller and reused between searches.
//! A generation counter marks which slots belong to the current search, so
//! nothing has to be cleared between runs.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Distances, predecessors and visit marks shared by successive searches.
#[derive(Clone, Debug, Default)]
pub struct SearchScratch {
    generation: u32,
    queued: Vec<u32>,
    settled: Vec<u32>,
    distances: Vec<i32>,
    predecessors: Vec<usize>,
}

impl SearchScratch {
    pub fn new() -> SearchScratch {
        SearchScratch::default()
    }

    fn begin(&mut self, node_count: usize) {
        if self.queued.len() < node_count {
            self.queued.resize(node_count, 0);
            self.settled.resize(node_count, 0);
            self.distances.resize(node_count, 0);
            self.predecessors.resize(node_count, 0);
        }

        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.queued.iter_mut().for_each(|g| *g = 0);
            self.settled.iter_mut().for_each(|g| *g = 0);
            self.generation = 1;
        }
    }

    #[inline]
    fn is_queued(&self, node: usize) -> bool {
        self.queued[node] == self.generation
    }

    #[inline]
    fn is_settled(&self, node: usize) -> bool {
        self.settled[node] == self.generation
    }

    /// Distance found for `node` by the last search, if it was reached.
    pub fn distance(&self, node: usize) -> Option<i32> {
        if node < self.queued.len() && self.is_queued(node) {
            Some(self.distances[node])
        } else {
            None
        }
    }

    /// Node the last search came from when it reached `node`. None for the start.
    pub fn predecessor(&self, node: usize) -> Option<usize> {
        match self.distance(node) {
            Some(_) if self.predecessors[node] != node => Some(self.predecessors[node]),
            _ => None,
        }
    }

    /// Nodes from `start` to `target` of the last search, both included.
    pub fn path_to(&self, target: usize) -> Vec<usize> {
        let mut path: Vec<usize> = std::iter::successors(Some(target), |&node| self.predecessor(node)).collect();
        path.reverse();
        path
    }
}

/// A weighted graph over nodes `0..node_count()`.
pub trait SearchGraph {
    fn node_count(&self) -> usize;

    /// Calls `edge` with each neighbour of `node` and the cost of moving there.
    fn for_each_edge<F: FnMut(usize, i32)>(&self, node: usize, edge: F);

    /// Whether the search may continue through `node` once it is reached.
    /// The start node is always expanded.
    fn expandable(&self, _node: usize) -> bool {
        true
    }
}

/// Shortest distances from `start` to every target, None for unreachable ones.
///
/// The search stops as soon as every target is settled. Equal distances are
/// settled in insertion order, so results are deterministic.
pub fn dijkstra<G: SearchGraph>(
    graph: &G,
    scratch: &mut SearchScratch,
    start: usize,
    targets: &[usize],
) -> Vec<Option<i32>> {
    scratch.begin(graph.node_count());

    let mut results = vec![None; targets.len()];
    let mut remaining = targets.len();
    if remaining == 0 {
        return results;
    }

    let mut sequence: u64 = 0;
    let mut to_visit = BinaryHeap::new();

    scratch.queued[start] = scratch.generation;
    scratch.distances[start] = 0;
    scratch.predecessors[start] = start;
    to_visit.push(Reverse((0, sequence, start)));

    while let Some(Reverse((current_distance, _, current))) = to_visit.pop() {
        if scratch.is_settled(current) || current_distance > scratch.distances[current] {
            continue;
        }
        scratch.settled[current] = scratch.generation;

        for (result, &target) in results.iter_mut().zip(targets.iter()) {
            if target == current {
                *result = Some(current_distance);
                remaining -= 1;
            }
        }
        if remaining == 0 {
            break;
        }

        if current != start && !graph.expandable(current) {
            continue;
        }

        graph.for_each_edge(current, |next, cost| {
            if scratch.is_settled(next) {
                return;
            }

            let next_distance = current_distance + cost;
            if !scratch.is_queued(next) || next_distance < scratch.distances[next] {
                scratch.queued[next] = scratch.generation;
                scratch.distances[next] = next_distance;
                scratch.predecessors[next] = current;
                sequence += 1;
                to_visit.push(Reverse((next_distance, sequence, next)));
            }
        });
    }

    results
}
