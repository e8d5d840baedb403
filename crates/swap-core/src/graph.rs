//! Weighted directed graph with a multiplicative shortest-path search.
//!
//! Edge weights are positive fractions that compound by multiplication
//! along a path. The "shortest" path between two nodes is the one whose
//! weight product is smallest. Routing uses this with input-per-output
//! exchange rates as weights, so the minimal product is the cheapest route.

use crate::fraction::Fraction;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// A directed, weighted edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<T> {
    pub source: T,
    pub destination: T,
    pub weight: Fraction,
}

impl<T> Edge<T> {
    /// An edge with the neutral weight `1`.
    pub fn new(source: T, destination: T) -> Self {
        Self::weighted(source, destination, Fraction::one())
    }

    pub fn weighted(source: T, destination: T, weight: Fraction) -> Self {
        Self {
            source,
            destination,
            weight,
        }
    }
}

/// The result of a successful search.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPath<T> {
    /// Nodes from source to destination, inclusive.
    pub path: Vec<T>,
    /// Product of the edge weights along `path`.
    pub weight: Fraction,
}

/// A mutable edge list. Nodes exist only as edge endpoints.
#[derive(Debug, Clone)]
pub struct Graph<T> {
    edges: Vec<Edge<T>>,
}

impl<T> Default for Graph<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

impl<T> Graph<T>
where
    T: Clone + Eq + Hash + fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edges(&self) -> &[Edge<T>] {
        &self.edges
    }

    /// Distinct endpoints in the order they first appear in the edge list.
    pub fn nodes(&self) -> Vec<T> {
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for edge in &self.edges {
            for node in [&edge.source, &edge.destination] {
                if seen.insert(node) {
                    nodes.push(node.clone());
                }
            }
        }
        nodes
    }

    pub fn contains_node(&self, node: &T) -> bool {
        self.edges
            .iter()
            .any(|e| &e.source == node || &e.destination == node)
    }

    /// Add an edge. Weights must be strictly positive.
    pub fn add_edge(&mut self, edge: Edge<T>) -> Result<(), GraphError> {
        if !edge.weight.is_positive() {
            return Err(GraphError::NonPositiveWeight(edge.weight.to_string()));
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Remove every edge from `source` to `destination`, restricted to
    /// `weight` when given. Returns how many edges were removed.
    pub fn remove_edge(&mut self, source: &T, destination: &T, weight: Option<&Fraction>) -> usize {
        let before = self.edges.len();
        self.edges.retain(|e| {
            let matches = &e.source == source
                && &e.destination == destination
                && weight.map_or(true, |w| &e.weight == w);
            !matches
        });
        before - self.edges.len()
    }

    /// Find the path from `source` to `destination` with the smallest product
    /// of edge weights.
    ///
    /// Runs Bellman-Ford style relaxation where a path's length is the
    /// product of its weights, starting from `1` at the source. Returns
    /// `Ok(None)` when the destination cannot be reached. Among paths with
    /// equal products the one relaxed first (edge insertion order) wins.
    pub fn shortest_path(
        &self,
        source: &T,
        destination: &T,
    ) -> Result<Option<GraphPath<T>>, GraphError> {
        let relaxation = self.relax(source, destination)?;
        let (src, dst) = (relaxation.source, relaxation.destination);
        if relaxation.distance[dst].is_none() {
            return Ok(None);
        }

        let mut path = vec![dst];
        let mut weight = Fraction::one();
        let mut visited = HashSet::from([dst]);
        let mut current = dst;
        while current != src {
            let Some((previous, edge)) = relaxation.predecessor[current] else {
                return Ok(None);
            };
            if !visited.insert(previous) {
                return Err(GraphError::Cycle(format!(
                    "{:?}",
                    relaxation.nodes[previous]
                )));
            }
            weight = weight.multiplied_by(&self.edges[edge].weight);
            path.push(previous);
            current = previous;
        }
        path.reverse();

        Ok(Some(GraphPath {
            path: path.into_iter().map(|i| relaxation.nodes[i].clone()).collect(),
            weight,
        }))
    }

    /// The loop that makes `shortest_path` report [`GraphError::Cycle`] for
    /// this pair of nodes, as edges in traversal order.
    ///
    /// A loop whose weight product is below `1` keeps improving during
    /// relaxation, so the predecessor walk back from `destination` never
    /// reaches `source`. Returns `Ok(None)` when the walk is acyclic.
    pub fn improving_cycle(
        &self,
        source: &T,
        destination: &T,
    ) -> Result<Option<Vec<Edge<T>>>, GraphError> {
        let relaxation = self.relax(source, destination)?;
        let (src, dst) = (relaxation.source, relaxation.destination);
        if relaxation.distance[dst].is_none() {
            return Ok(None);
        }

        // taken[i] is the edge entering walked[i]
        let mut walked = vec![dst];
        let mut taken = Vec::new();
        let mut current = dst;
        while current != src {
            let Some((previous, edge)) = relaxation.predecessor[current] else {
                return Ok(None);
            };
            taken.push(edge);
            if let Some(start) = walked.iter().position(|&node| node == previous) {
                let cycle = taken[start..]
                    .iter()
                    .rev()
                    .map(|&i| self.edges[i].clone())
                    .collect();
                return Ok(Some(cycle));
            }
            walked.push(previous);
            current = previous;
        }
        Ok(None)
    }

    fn relax(&self, source: &T, destination: &T) -> Result<Relaxation<T>, GraphError> {
        if source == destination {
            return Err(GraphError::SourceIsDestination);
        }

        let nodes = self.nodes();
        let index: HashMap<&T, usize> = nodes.iter().enumerate().map(|(i, n)| (n, i)).collect();
        let src = *index
            .get(source)
            .ok_or_else(|| GraphError::MissingSource(format!("{:?}", source)))?;
        let dst = *index
            .get(destination)
            .ok_or_else(|| GraphError::MissingDestination(format!("{:?}", destination)))?;

        // (from, to, edge index) resolved once
        let resolved: Vec<(usize, usize, usize)> = self
            .edges
            .iter()
            .enumerate()
            .map(|(i, e)| (index[&e.source], index[&e.destination], i))
            .collect();

        // None stands for an infinite distance
        let mut distance: Vec<Option<Fraction>> = vec![None; nodes.len()];
        let mut predecessor: Vec<Option<(usize, usize)>> = vec![None; nodes.len()];
        distance[src] = Some(Fraction::one());

        for _ in 1..nodes.len() {
            let mut relaxed = false;
            for &(from, to, edge) in &resolved {
                let Some(reached) = &distance[from] else {
                    continue;
                };
                let candidate = reached.multiplied_by(&self.edges[edge].weight);
                let improves = match &distance[to] {
                    None => true,
                    Some(current) => candidate < *current,
                };
                if improves {
                    distance[to] = Some(candidate);
                    predecessor[to] = Some((from, edge));
                    relaxed = true;
                }
            }
            if !relaxed {
                break;
            }
        }

        Ok(Relaxation {
            nodes,
            source: src,
            destination: dst,
            distance,
            predecessor,
        })
    }
}

/// Distances and predecessors after relaxation, indexed by node position.
struct Relaxation<T> {
    nodes: Vec<T>,
    source: usize,
    destination: usize,
    distance: Vec<Option<Fraction>>,
    /// (previous node, edge index) that last improved each node
    predecessor: Vec<Option<(usize, usize)>>,
}

/// Errors from graph mutation and search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("source node is equal to the destination node")]
    SourceIsDestination,

    #[error("missing source node {0}")]
    MissingSource(String),

    #[error("missing destination node {0}")]
    MissingDestination(String),

    #[error("edge weight must be positive, got {0}")]
    NonPositiveWeight(String),

    #[error("cycle detected at node {0} while reconstructing the path")]
    Cycle(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frac(n: i64, d: i64) -> Fraction {
        Fraction::new(n, d).unwrap()
    }

    fn triangle() -> Graph<&'static str> {
        let mut graph = Graph::new();
        for (s, d) in [("A", "B"), ("B", "A"), ("A", "C"), ("C", "A"), ("B", "C"), ("C", "B")] {
            graph.add_edge(Edge::new(s, d)).unwrap();
        }
        graph
    }

    #[test]
    fn test_basic_shortest_path() {
        let graph = triangle();
        let result = graph.shortest_path(&"A", &"B").unwrap().unwrap();
        assert_eq!(result.path, vec!["A", "B"]);
        assert_eq!(result.weight, Fraction::one());
    }

    #[test]
    fn test_nodes_in_first_seen_order() {
        assert_eq!(triangle().nodes(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_source_equals_destination() {
        let err = triangle().shortest_path(&"A", &"A").unwrap_err();
        assert!(err
            .to_string()
            .contains("source node is equal to the destination node"));
    }

    #[test]
    fn test_unknown_nodes_are_named() {
        let graph = triangle();
        let err = graph.shortest_path(&"X", &"A").unwrap_err();
        assert_eq!(err, GraphError::MissingSource("\"X\"".to_string()));
        assert!(err.to_string().contains("X"));

        let err = graph.shortest_path(&"A", &"Y").unwrap_err();
        assert!(matches!(err, GraphError::MissingDestination(_)));
        assert!(err.to_string().contains("Y"));
    }

    #[test]
    fn test_weights_compound_multiplicatively() {
        let mut graph = Graph::new();
        // direct A->C costs 3, A->B->C costs 2 * 1 = 2 even though it has more hops
        graph.add_edge(Edge::weighted("A", "C", frac(3, 1))).unwrap();
        graph.add_edge(Edge::weighted("A", "B", frac(2, 1))).unwrap();
        graph.add_edge(Edge::weighted("B", "C", frac(1, 1))).unwrap();

        let result = graph.shortest_path(&"A", &"C").unwrap().unwrap();
        assert_eq!(result.path, vec!["A", "B", "C"]);
        assert_eq!(result.weight, frac(2, 1));
    }

    #[test]
    fn test_product_not_sum() {
        let mut graph = Graph::new();
        // summed, 1/2 + 1/2 loses to the direct 1/3; multiplied, 1/4 wins
        graph.add_edge(Edge::weighted("A", "C", frac(1, 3))).unwrap();
        graph.add_edge(Edge::weighted("A", "B", frac(1, 2))).unwrap();
        graph.add_edge(Edge::weighted("B", "C", frac(1, 2))).unwrap();

        let result = graph.shortest_path(&"A", &"C").unwrap().unwrap();
        assert_eq!(result.path, vec!["A", "B", "C"]);
        assert_eq!(result.weight, frac(1, 4));
    }

    #[test]
    fn test_unreachable_destination() {
        let mut graph = Graph::new();
        graph.add_edge(Edge::new("A", "B")).unwrap();
        graph.add_edge(Edge::new("C", "D")).unwrap();
        assert_eq!(graph.shortest_path(&"A", &"D").unwrap(), None);
        // edges are directed
        assert_eq!(graph.shortest_path(&"B", &"A").unwrap(), None);
    }

    #[test]
    fn test_rejects_non_positive_weight() {
        let mut graph = Graph::new();
        assert!(matches!(
            graph.add_edge(Edge::weighted("A", "B", Fraction::zero())),
            Err(GraphError::NonPositiveWeight(_))
        ));
        assert!(graph
            .add_edge(Edge::weighted("A", "B", frac(-1, 2)))
            .is_err());
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_remove_edge() {
        let mut graph = triangle();
        assert_eq!(graph.remove_edge(&"A", &"B", Some(&frac(2, 1))), 0);
        assert_eq!(graph.remove_edge(&"A", &"B", Some(&Fraction::one())), 1);
        assert_eq!(graph.edges().len(), 5);

        let result = graph.shortest_path(&"A", &"B").unwrap().unwrap();
        assert_eq!(result.path, vec!["A", "C", "B"]);

        graph.remove_edge(&"A", &"C", None);
        assert_eq!(graph.shortest_path(&"A", &"B").unwrap(), None);
    }

    #[test]
    fn test_equal_weight_tie_is_deterministic() {
        let mut graph = Graph::new();
        graph.add_edge(Edge::weighted("A", "B", frac(1, 2))).unwrap();
        graph.add_edge(Edge::weighted("B", "D", frac(2, 1))).unwrap();
        graph.add_edge(Edge::weighted("A", "C", frac(2, 1))).unwrap();
        graph.add_edge(Edge::weighted("C", "D", frac(1, 2))).unwrap();

        let first = graph.shortest_path(&"A", &"D").unwrap().unwrap();
        let second = graph.shortest_path(&"A", &"D").unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.path, vec!["A", "B", "D"]);
    }

    #[test]
    fn test_cycle_in_predecessors_is_reported() {
        let mut graph = Graph::new();
        // B <-> C loop multiplies to 1/4, so relaxation keeps improving it
        graph.add_edge(Edge::new("A", "B")).unwrap();
        graph.add_edge(Edge::weighted("B", "C", frac(1, 2))).unwrap();
        graph.add_edge(Edge::weighted("C", "B", frac(1, 2))).unwrap();
        graph.add_edge(Edge::new("C", "D")).unwrap();

        assert!(matches!(
            graph.shortest_path(&"A", &"D"),
            Err(GraphError::Cycle(_))
        ));
    }

    #[test]
    fn test_improving_cycle_lists_loop_edges() {
        let mut graph = Graph::new();
        graph.add_edge(Edge::new("A", "B")).unwrap();
        graph.add_edge(Edge::weighted("B", "C", frac(1, 2))).unwrap();
        graph.add_edge(Edge::weighted("C", "B", frac(1, 2))).unwrap();
        graph.add_edge(Edge::new("C", "D")).unwrap();

        let cycle = graph.improving_cycle(&"A", &"D").unwrap().unwrap();
        let hops: Vec<_> = cycle.iter().map(|e| (e.source, e.destination)).collect();
        assert_eq!(hops, vec![("C", "B"), ("B", "C")]);

        // once the loop is broken the search succeeds again
        graph.remove_edge(&"C", &"B", None);
        assert_eq!(graph.improving_cycle(&"A", &"D").unwrap(), None);
        let result = graph.shortest_path(&"A", &"D").unwrap().unwrap();
        assert_eq!(result.path, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_no_improving_cycle_on_plain_graph() {
        assert_eq!(triangle().improving_cycle(&"A", &"C").unwrap(), None);
    }
}
