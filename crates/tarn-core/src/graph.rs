//! Cycle detection and topological ordering over arbitrary dependency graphs
//!
//! The analyzer knows nothing about source files. A graph is anything that
//! can list its vertices and the out-edges of a vertex, where an edge
//! `u -> v` reads "u depends on v". The produced order places every vertex
//! after all of its dependencies.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use tracing::{debug, trace};

/// Read-only adjacency view consumed by [`GraphAnalyzer`]
pub trait Adjacency<V> {
    /// Every vertex of the graph, each exactly once
    fn vertices<'a>(&'a self) -> impl Iterator<Item = &'a V>
    where
        V: 'a;

    /// Out-edges of `vertex`, or `None` when it is not a vertex of the graph
    fn successors<'a>(&'a self, vertex: &V) -> Option<impl Iterator<Item = &'a V>>
    where
        V: 'a;

    fn contains_vertex(&self, vertex: &V) -> bool;
}

impl<V: Eq + Hash> Adjacency<V> for HashMap<V, HashSet<V>> {
    fn vertices<'a>(&'a self) -> impl Iterator<Item = &'a V>
    where
        V: 'a,
    {
        self.keys()
    }

    fn successors<'a>(&'a self, vertex: &V) -> Option<impl Iterator<Item = &'a V>>
    where
        V: 'a,
    {
        self.get(vertex).map(|deps| deps.iter())
    }

    fn contains_vertex(&self, vertex: &V) -> bool {
        self.contains_key(vertex)
    }
}

impl<V: Ord> Adjacency<V> for BTreeMap<V, BTreeSet<V>> {
    fn vertices<'a>(&'a self) -> impl Iterator<Item = &'a V>
    where
        V: 'a,
    {
        self.keys()
    }

    fn successors<'a>(&'a self, vertex: &V) -> Option<impl Iterator<Item = &'a V>>
    where
        V: 'a,
    {
        self.get(vertex).map(|deps| deps.iter())
    }

    fn contains_vertex(&self, vertex: &V) -> bool {
        self.contains_key(vertex)
    }
}

/// An out-edge points at a vertex that is not part of the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedGraph<V> {
    /// The vertex owning the dangling edge
    pub vertex: V,
    /// The edge target that has no entry in the graph
    pub missing: V,
}

impl<V: fmt::Debug> fmt::Display for MalformedGraph<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid graph: {:?} depends on {:?}, which is not a vertex",
            self.vertex, self.missing
        )
    }
}

impl<V: fmt::Debug> std::error::Error for MalformedGraph<V> {}

/// A dependency cycle, returned by [`Analysis::into_result`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclicGraph<V> {
    /// The cycle path, starting and ending at the same vertex
    pub cycle: Vec<V>,
}

impl<V: fmt::Debug> fmt::Display for CyclicGraph<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency cycle detected: ")?;
        for (i, vertex) in self.cycle.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{:?}", vertex)?;
        }
        Ok(())
    }
}

impl<V: fmt::Debug> std::error::Error for CyclicGraph<V> {}

/// Outcome of analyzing a well-formed graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Analysis<V> {
    /// Every vertex exactly once, dependencies before dependents
    Acyclic(Vec<V>),
    /// The first cycle found, as a closed path
    Cyclic(Vec<V>),
}

impl<V> Analysis<V> {
    pub fn is_acyclic(&self) -> bool {
        matches!(self, Analysis::Acyclic(_))
    }

    /// The ordering, present only when the graph was proven acyclic
    pub fn topological_order(&self) -> Option<&[V]> {
        match self {
            Analysis::Acyclic(order) => Some(order),
            Analysis::Cyclic(_) => None,
        }
    }

    pub fn into_order(self) -> Option<Vec<V>> {
        match self {
            Analysis::Acyclic(order) => Some(order),
            Analysis::Cyclic(_) => None,
        }
    }

    pub fn cycle(&self) -> Option<&[V]> {
        match self {
            Analysis::Acyclic(_) => None,
            Analysis::Cyclic(cycle) => Some(cycle),
        }
    }

    pub fn into_result(self) -> Result<Vec<V>, CyclicGraph<V>> {
        match self {
            Analysis::Acyclic(order) => Ok(order),
            Analysis::Cyclic(cycle) => Err(CyclicGraph { cycle }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Traversal state for a single analysis
struct Walk<V> {
    marks: HashMap<V, Mark>,
    path: Vec<V>,
    order: Vec<V>,
}

impl<V: Eq + Hash + Clone> Walk<V> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            marks: HashMap::with_capacity(capacity),
            path: Vec::new(),
            order: Vec::with_capacity(capacity),
        }
    }

    /// Depth-first visit from `root`, driven by an explicit stack so the
    /// depth of the graph is bounded by memory rather than the call stack.
    /// Returns the cycle path when an edge leads back onto the current path.
    fn visit<'g, G: Adjacency<V>>(&mut self, graph: &'g G, root: &'g V) -> Option<Vec<V>>
    where
        V: 'g,
    {
        if self.marks.contains_key(root) {
            return None;
        }

        self.enter(root);
        let mut stack = vec![(root, graph.successors(root))];

        while let Some((vertex, successors)) = stack.last_mut() {
            let next = successors.as_mut().and_then(|s| s.next());
            match next {
                Some(next) => match self.marks.get(next) {
                    Some(Mark::Done) => {}
                    Some(Mark::InProgress) => return Some(self.cycle_through(next)),
                    None => {
                        self.enter(next);
                        stack.push((next, graph.successors(next)));
                    }
                },
                None => {
                    let vertex: &'g V = *vertex;
                    self.leave(vertex);
                    stack.pop();
                }
            }
        }
        None
    }

    fn enter(&mut self, vertex: &V) {
        self.marks.insert(vertex.clone(), Mark::InProgress);
        self.path.push(vertex.clone());
    }

    fn leave(&mut self, vertex: &V) {
        self.path.pop();
        self.marks.insert(vertex.clone(), Mark::Done);
        self.order.push(vertex.clone());
    }

    /// The closed path from the first occurrence of `vertex` on the current
    /// path back to `vertex`
    fn cycle_through(&self, vertex: &V) -> Vec<V> {
        let start = self.path.iter().position(|v| v == vertex).unwrap_or(0);
        let mut cycle = self.path[start..].to_vec();
        cycle.push(vertex.clone());
        cycle
    }

    fn is_discovered(&self, vertex: &V) -> bool {
        self.marks.contains_key(vertex)
    }
}

/// Stateless cycle detector and topological sorter.
///
/// All traversal state lives inside a single [`GraphAnalyzer::analyze`] call,
/// so one analyzer can be shared freely, including across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphAnalyzer;

impl GraphAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze `graph`.
    ///
    /// Dangling edges are reported before any traversal, so a graph that is
    /// both malformed and cyclic is always reported as malformed.
    pub fn analyze<V, G>(&self, graph: &G) -> Result<Analysis<V>, MalformedGraph<V>>
    where
        V: Eq + Hash + Clone + fmt::Debug,
        G: Adjacency<V>,
    {
        self.check_references(graph)?;

        let vertex_count = graph.vertices().count();
        let mut walk = Walk::with_capacity(vertex_count);

        // Only vertices with out-edges can close a cycle, so they are the roots.
        for vertex in graph.vertices() {
            if !has_successors(graph, vertex) {
                continue;
            }
            if let Some(cycle) = walk.visit(graph, vertex) {
                debug!("Cycle found: {:?}", cycle);
                return Ok(Analysis::Cyclic(cycle));
            }
        }

        // Vertices nobody depends on and that depend on nothing
        for vertex in graph.vertices() {
            if !walk.is_discovered(vertex) {
                trace!("Isolated vertex {:?}", vertex);
                walk.marks.insert(vertex.clone(), Mark::Done);
                walk.order.push(vertex.clone());
            }
        }

        debug!("Graph of {} vertices is acyclic", vertex_count);
        Ok(Analysis::Acyclic(walk.order))
    }

    /// Check that every edge target is a vertex
    pub fn check_references<V, G>(&self, graph: &G) -> Result<(), MalformedGraph<V>>
    where
        V: Clone,
        G: Adjacency<V>,
    {
        for vertex in graph.vertices() {
            if let Some(successors) = graph.successors(vertex) {
                for target in successors {
                    if !graph.contains_vertex(target) {
                        return Err(MalformedGraph {
                            vertex: vertex.clone(),
                            missing: target.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

fn has_successors<V, G: Adjacency<V>>(graph: &G, vertex: &V) -> bool {
    graph
        .successors(vertex)
        .map(|mut successors| successors.next().is_some())
        .unwrap_or(false)
}
