//! Depth-first topological sort that rejects cycles.
//!
//! Nodes are emitted in post-order, so every node appears after all of the
//! nodes it reaches. Each node is visited once no matter how many paths lead
//! to it. Meeting a node that is still on the stack aborts the sort with the
//! offending [`Cycle`].
//!
//! ```
//! use graphmill::toposort::topological_sort;
//!
//! let order = topological_sort(["app"], |node: &&str| match *node {
//!     "app" => vec!["core", "net"],
//!     "net" => vec!["core"],
//!     _ => vec![],
//! })
//! .expect("acyclic");
//! assert_eq!(order, vec!["core", "net", "app"]);
//! ```

use std::collections::BTreeMap;

use itertools::Itertools;

/// Tracks the visitation state of a node during the sort.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

/// A dependency cycle. The first node is repeated at the end and is the
/// smallest node of the loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cycle<N>(Vec<N>);

impl<N> Cycle<N> {
    /// Nodes along the cycle.
    #[must_use]
    pub fn nodes(&self) -> &[N] {
        &self.0
    }

    /// Consume the cycle, returning its nodes.
    #[must_use]
    pub fn into_nodes(self) -> Vec<N> {
        self.0
    }
}

/// Sort every node reachable from `roots`, dependencies first.
///
/// # Errors
///
/// Returns the first [`Cycle`] met during the traversal.
pub fn topological_sort<N, R, F, I>(roots: R, successors: F) -> Result<Vec<N>, Cycle<N>>
where
    N: Clone + Ord,
    R: IntoIterator<Item = N>,
    F: FnMut(&N) -> I,
    I: IntoIterator<Item = N>,
{
    let mut sorter = TopologicalSorter::new(successors);
    for root in roots {
        sorter.visit(root)?;
    }
    Ok(sorter.order)
}

/// A node on the traversal stack with the successors still to visit.
struct Frame<N> {
    node: N,
    pending: std::vec::IntoIter<N>,
}

/// Iterative depth-first traversal. The explicit frame stack keeps long
/// dependency chains off the call stack.
struct TopologicalSorter<N, F> {
    successors: F,
    frames: Vec<Frame<N>>,
    states: BTreeMap<N, VisitState>,
    order: Vec<N>,
}

impl<N, F, I> TopologicalSorter<N, F>
where
    N: Clone + Ord,
    F: FnMut(&N) -> I,
    I: IntoIterator<Item = N>,
{
    const fn new(successors: F) -> Self {
        Self {
            successors,
            frames: Vec::new(),
            states: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    fn visit(&mut self, root: N) -> Result<(), Cycle<N>> {
        if self.states.contains_key(&root) {
            return Ok(());
        }
        self.enter(root);
        loop {
            let next = match self.frames.last_mut() {
                Some(frame) => frame.pending.next(),
                None => return Ok(()),
            };
            match next {
                Some(node) => match self.states.get(&node) {
                    Some(VisitState::Visited) => {}
                    Some(VisitState::Visiting) => return Err(self.cycle_closing_at(node)),
                    None => self.enter(node),
                },
                None => self.leave(),
            }
        }
    }

    fn enter(&mut self, node: N) {
        let pending: Vec<N> = (self.successors)(&node).into_iter().collect();
        self.states.insert(node.clone(), VisitState::Visiting);
        self.frames.push(Frame {
            node,
            pending: pending.into_iter(),
        });
    }

    fn leave(&mut self) {
        if let Some(Frame { node, .. }) = self.frames.pop() {
            self.states.insert(node.clone(), VisitState::Visited);
            self.order.push(node);
        }
    }

    /// The loop from the stacked occurrence of `node` back to `node`.
    fn cycle_closing_at(&self, node: N) -> Cycle<N> {
        let loop_nodes: Vec<N> = self
            .frames
            .iter()
            .map(|frame| &frame.node)
            .skip_while(|stacked| **stacked != node)
            .cloned()
            .collect();
        Cycle(close_from_smallest(loop_nodes))
    }
}

/// Rotate an open loop so its smallest node comes first, then repeat that
/// node at the end.
fn close_from_smallest<N: Clone + Ord>(mut loop_nodes: Vec<N>) -> Vec<N> {
    if let Some(start) = loop_nodes.iter().position_min() {
        loop_nodes.rotate_left(start);
    }
    if let Some(first) = loop_nodes.first().cloned() {
        loop_nodes.push(first);
    }
    loop_nodes
}
