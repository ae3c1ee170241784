//! In-memory neighbourhood of the entity relation graph.
//!
//! Relation edges are directed in storage but traversed in either direction
//! here. The graph only holds the edges loaded around a set of seed entities.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{NodeIndex, UnGraph};

use sift_core::errors::SiftResult;
use sift_core::models::Relation;
use sift_core::traits::IGraphStore;

pub struct RelationGraph {
    graph: UnGraph<String, String>,
    index: HashMap<String, NodeIndex>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            index: HashMap::new(),
        }
    }

    /// Load every edge within `hops` of the seeds, one store round trip per hop.
    pub fn load(store: &dyn IGraphStore, seeds: &[String], hops: usize) -> SiftResult<Self> {
        let mut graph = Self::new();
        let mut frontier: Vec<String> = seeds.to_vec();
        let mut expanded: HashSet<String> = HashSet::new();

        for _ in 0..hops {
            frontier.retain(|id| !expanded.contains(id));
            if frontier.is_empty() {
                break;
            }
            expanded.extend(frontier.iter().cloned());
            let edges = store.relations_touching(&frontier)?;
            let mut next = Vec::new();
            for edge in &edges {
                graph.add_relation(edge);
                for end in [&edge.from_entity, &edge.to_entity] {
                    if !expanded.contains(end) {
                        next.push(end.clone());
                    }
                }
            }
            next.sort();
            next.dedup();
            frontier = next;
        }
        Ok(graph)
    }

    fn node(&mut self, id: &str) -> NodeIndex {
        if let Some(idx) = self.index.get(id) {
            return *idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.index.insert(id.to_string(), idx);
        idx
    }

    pub fn add_relation(&mut self, relation: &Relation) {
        let from = self.node(&relation.from_entity);
        let to = self.node(&relation.to_entity);
        self.graph.add_edge(from, to, relation.relation_type.clone());
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Breadth-first hop distance from the seed set, for every entity reachable
    /// in `1..=max_hops` hops. Seeds themselves are excluded.
    pub fn hop_distances(&self, seeds: &[String], max_hops: usize) -> HashMap<String, usize> {
        let mut distances: HashMap<NodeIndex, usize> = HashMap::new();
        let mut queue = VecDeque::new();
        for seed in seeds {
            if let Some(idx) = self.index.get(seed) {
                if distances.insert(*idx, 0).is_none() {
                    queue.push_back(*idx);
                }
            }
        }

        while let Some(current) = queue.pop_front() {
            let depth = distances[&current];
            if depth >= max_hops {
                continue;
            }
            for neighbor in self.graph.neighbors(current) {
                if distances.contains_key(&neighbor) {
                    continue;
                }
                distances.insert(neighbor, depth + 1);
                queue.push_back(neighbor);
            }
        }

        distances
            .into_iter()
            .filter(|(_, hop)| *hop > 0)
            .filter_map(|(idx, hop)| self.graph.node_weight(idx).map(|id| (id.clone(), hop)))
            .collect()
    }
}

impl Default for RelationGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: &str, to: &str) -> Relation {
        Relation {
            from_entity: from.into(),
            to_entity: to.into(),
            relation_type: "rel".into(),
        }
    }

    #[test]
    fn hops_ignore_edge_direction() {
        let mut g = RelationGraph::new();
        g.add_relation(&edge("s", "a"));
        g.add_relation(&edge("b", "a"));
        g.add_relation(&edge("c", "b"));
        let d = g.hop_distances(&["s".to_string()], 2);
        assert_eq!(d.get("a"), Some(&1));
        assert_eq!(d.get("b"), Some(&2));
        assert_eq!(d.get("c"), None);
        assert!(!d.contains_key("s"));
    }

    #[test]
    fn shortest_hop_wins_and_seeds_excluded() {
        let mut g = RelationGraph::new();
        g.add_relation(&edge("s1", "x"));
        g.add_relation(&edge("s2", "y"));
        g.add_relation(&edge("y", "x"));
        g.add_relation(&edge("s1", "s2"));
        let d = g.hop_distances(&["s1".to_string(), "s2".to_string()], 2);
        assert_eq!(d.get("x"), Some(&1));
        assert_eq!(d.get("y"), Some(&1));
        assert_eq!(d.len(), 2);
    }
}
