//! Type names and the pairs the containment hierarchy is built from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A semantic type in the domain hierarchy (e.g. `"City"`).
pub type TypeName = String;

/// Two related types: `child` sits somewhere below `parent`.
///
/// Used as the key of the containment closure table, where `child` is the
/// descendant and `parent` any ancestor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypePair {
    pub child: TypeName,
    pub parent: TypeName,
}

impl TypePair {
    pub fn new(child: impl Into<TypeName>, parent: impl Into<TypeName>) -> Self {
        Self { child: child.into(), parent: parent.into() }
    }
}

impl fmt::Display for TypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.child, self.parent)
    }
}

/// A direct containment fact: instances of `child` lie inside instances of
/// `parent`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainmentEdge {
    pub child: TypeName,
    pub parent: TypeName,
}

impl ContainmentEdge {
    pub fn new(child: impl Into<TypeName>, parent: impl Into<TypeName>) -> Self {
        Self { child: child.into(), parent: parent.into() }
    }
}

impl From<(&str, &str)> for ContainmentEdge {
    fn from((child, parent): (&str, &str)) -> Self {
        Self::new(child, parent)
    }
}

impl From<ContainmentEdge> for TypePair {
    fn from(edge: ContainmentEdge) -> Self {
        TypePair { child: edge.child, parent: edge.parent }
    }
}
