//! # Type Containment Closure
//!
//! Precomputes every (descendant, ancestor) pair of the type containment
//! hierarchy (`City ⊂ County ⊂ State`) together with the chain of types
//! strictly between them, so a containment query at any depth is a single
//! lookup.
//!
//! Built once when the store is constructed and never mutated afterwards;
//! share it behind an `Arc` across query handlers.
//!
//! ## Path policy
//!
//! Each descendant is expanded breadth-first, visiting parents in the order
//! their facts were first seen (duplicates dropped). The first path that
//! reaches an ancestor is kept and never extended or replaced, so every
//! chain is a fewest-hops chain and the result is deterministic for a
//! given input order.
//!
//! ## Cycles
//!
//! The input need not be a DAG. A per-descendant visited set stops the
//! expansion. A type that reaches itself gets a `(T, T)` entry holding the
//! chain of its first-discovered cycle, and is listed by
//! [`ContainmentClosure::cyclic_types`].

pub mod facts;

use std::collections::{BTreeSet, VecDeque};

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{info, warn};

use crate::model::{ContainmentEdge, TypeName, TypePair};

pub use facts::{ContainmentFact, load_facts, parse_facts};

/// Predicate naming a containment fact in the type-relation source.
pub const CONTAINED_IN_PLACE: &str = "containedInPlace";

/// Which facts count as containment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainmentConfig {
    pub predicate: String,
}

impl Default for ContainmentConfig {
    fn default() -> Self {
        Self { predicate: CONTAINED_IN_PLACE.to_string() }
    }
}

type Parents = SmallVec<[TypeName; 4]>;

/// Immutable closure table of the containment hierarchy.
#[derive(Debug, Clone, Default)]
pub struct ContainmentClosure {
    /// descendant → ancestor → intermediate chain
    entries: HashMap<TypeName, HashMap<TypeName, Vec<TypeName>>>,
    end_nodes: BTreeSet<TypeName>,
    cyclic: BTreeSet<TypeName>,
}

impl ContainmentClosure {
    /// Build the closure from direct edges.
    pub fn build<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = ContainmentEdge>,
    {
        // Direct adjacency, children in first-seen order for stable iteration.
        let mut parents: HashMap<TypeName, Parents> = HashMap::new();
        let mut children: Vec<TypeName> = Vec::new();
        let mut all_types: BTreeSet<TypeName> = BTreeSet::new();

        for ContainmentEdge { child, parent } in edges {
            all_types.insert(child.clone());
            all_types.insert(parent.clone());
            let direct = parents.entry(child.clone()).or_insert_with(|| {
                children.push(child);
                Parents::new()
            });
            if !direct.contains(&parent) {
                direct.push(parent);
            }
        }

        let end_nodes: BTreeSet<TypeName> =
            all_types.into_iter().filter(|t| !parents.contains_key(t)).collect();

        let mut entries = HashMap::with_capacity(children.len());
        let mut cyclic = BTreeSet::new();
        for child in &children {
            let reached = expand(child, &parents);
            if reached.contains_key(child.as_str()) {
                cyclic.insert(child.clone());
            }
            entries.insert(child.clone(), reached);
        }

        let closure = Self { entries, end_nodes, cyclic };
        info!(
            entries = closure.len(),
            end_nodes = closure.end_nodes.len(),
            "containment closure built"
        );
        if !closure.cyclic.is_empty() {
            warn!(types = ?closure.cyclic, "containment hierarchy has cycles");
        }
        closure
    }

    /// Build from raw facts, keeping only those whose predicate matches.
    pub fn from_facts(facts: &[ContainmentFact], predicate: &str) -> Self {
        Self::build(
            facts
                .iter()
                .filter(|f| f.predicate == predicate)
                .map(|f| ContainmentEdge::new(f.sub_type.clone(), f.obj_type.clone())),
        )
    }

    /// Intermediate types strictly between `child` and `ancestor`.
    ///
    /// `Some(&[])` for a direct edge, `None` when no containment is known.
    pub fn path(&self, child: &str, ancestor: &str) -> Option<&[TypeName]> {
        self.entries.get(child)?.get(ancestor).map(Vec::as_slice)
    }

    pub fn is_contained_in(&self, child: &str, ancestor: &str) -> bool {
        self.path(child, ancestor).is_some()
    }

    /// Every ancestor of `child`, sorted.
    pub fn ancestors_of(&self, child: &str) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .entries
            .get(child)
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default();
        out.sort_unstable();
        out
    }

    /// All entries as `(pair, chain)`, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (TypePair, &[TypeName])> + '_ {
        self.entries.iter().flat_map(|(child, ancestors)| {
            ancestors
                .iter()
                .map(move |(parent, chain)| (TypePair::new(child.as_str(), parent.as_str()), chain.as_slice()))
        })
    }

    /// Types that never appear as a child: the tops of their chains.
    pub fn end_nodes(&self) -> &BTreeSet<TypeName> {
        &self.end_nodes
    }

    /// Types that contain themselves through one or more edges.
    pub fn cyclic_types(&self) -> &BTreeSet<TypeName> {
        &self.cyclic
    }

    /// Number of (descendant, ancestor) pairs.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Breadth-first expansion of one descendant. First discovery wins.
fn expand(child: &str, parents: &HashMap<TypeName, Parents>) -> HashMap<TypeName, Vec<TypeName>> {
    let mut reached: HashMap<TypeName, Vec<TypeName>> = HashMap::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut frontier: VecDeque<&str> = VecDeque::new();

    for p in parents.get(child).into_iter().flatten() {
        if visited.insert(p.as_str()) {
            reached.insert(p.clone(), Vec::new());
            frontier.push_back(p.as_str());
        }
    }

    while let Some(curr) = frontier.pop_front() {
        let Some(next) = parents.get(curr) else { continue };
        let mut via = reached.get(curr).cloned().unwrap_or_default();
        via.push(curr.to_string());
        for p in next {
            if visited.insert(p.as_str()) {
                reached.insert(p.clone(), via.clone());
                frontier.push_back(p.as_str());
            }
        }
    }
    reached
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn closure(edges: &[(&str, &str)]) -> ContainmentClosure {
        ContainmentClosure::build(edges.iter().map(|&e| ContainmentEdge::from(e)))
    }

    #[test]
    fn test_chain() {
        let c = closure(&[("City", "County"), ("County", "State")]);
        assert_eq!(c.path("City", "County"), Some(&[][..]));
        assert_eq!(c.path("County", "State"), Some(&[][..]));
        assert_eq!(c.path("City", "State"), Some(&["County".to_string()][..]));
        assert_eq!(c.path("State", "City"), None);
        assert_eq!(c.len(), 3);
        assert_eq!(c.end_nodes().iter().collect::<Vec<_>>(), vec!["State"]);
        assert!(c.cyclic_types().is_empty());
    }

    #[test]
    fn test_duplicate_facts_deduped() {
        let c = closure(&[("City", "State"), ("City", "State")]);
        assert_eq!(c.len(), 1);
        assert_eq!(c.path("City", "State"), Some(&[][..]));
    }

    #[test]
    fn test_empty_input() {
        let c = ContainmentClosure::build(Vec::<ContainmentEdge>::new());
        assert!(c.is_empty());
        assert_eq!(c.len(), 0);
        assert!(c.end_nodes().is_empty());
    }

    #[test]
    fn test_two_cycle_terminates() {
        let c = closure(&[("A", "B"), ("B", "A")]);
        assert_eq!(c.path("A", "B"), Some(&[][..]));
        assert_eq!(c.path("B", "A"), Some(&[][..]));
        assert_eq!(c.path("A", "A"), Some(&["B".to_string()][..]));
        assert_eq!(c.path("B", "B"), Some(&["A".to_string()][..]));
        assert!(c.end_nodes().is_empty());
        assert_eq!(c.cyclic_types().len(), 2);
    }

    #[test]
    fn test_self_loop() {
        let c = closure(&[("A", "A")]);
        assert_eq!(c.path("A", "A"), Some(&[][..]));
        assert!(c.cyclic_types().contains("A"));
    }

    #[test]
    fn test_diamond_first_parent_wins() {
        let c = closure(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")]);
        assert_eq!(c.path("A", "D"), Some(&["B".to_string()][..]));
    }

    #[test]
    fn test_shortcut_beats_longer_chain() {
        // The direct edge is found before the two-hop route.
        let c = closure(&[("City", "County"), ("County", "State"), ("City", "State")]);
        assert_eq!(c.path("City", "State"), Some(&[][..]));
    }

    #[test]
    fn test_ancestors_sorted() {
        let c = closure(&[("City", "County"), ("County", "State"), ("State", "Country")]);
        assert_eq!(c.ancestors_of("City"), vec!["Country", "County", "State"]);
        assert!(c.ancestors_of("Country").is_empty());
        assert_eq!(
            c.path("City", "Country"),
            Some(&["County".to_string(), "State".to_string()][..])
        );
    }

    #[test]
    fn test_from_facts_filters_predicate() {
        let facts = vec![
            ContainmentFact::new(CONTAINED_IN_PLACE, "City", "County"),
            ContainmentFact::new("typeOf", "City", "Place"),
        ];
        let c = ContainmentClosure::from_facts(&facts, CONTAINED_IN_PLACE);
        assert!(c.is_contained_in("City", "County"));
        assert!(!c.is_contained_in("City", "Place"));
        assert_eq!(c.end_nodes().iter().collect::<Vec<_>>(), vec!["County"]);
    }
}
