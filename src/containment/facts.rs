//! Type-relation facts: the JSON source the closure is built from.
//!
//! The source is an array of records:
//!
//! ```json
//! [
//!   {"predicate": "containedInPlace", "subType": "City", "objType": "County"},
//!   {"predicate": "containedInPlace", "subType": "County", "objType": "State"}
//! ]
//! ```
//!
//! Records with other predicates are carried through untouched; the closure
//! builder filters them. Anything that does not parse, or a record with an
//! empty field, fails the whole load.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One typed relation between two schema types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainmentFact {
    pub predicate: String,
    pub sub_type: String,
    pub obj_type: String,
}

impl ContainmentFact {
    pub fn new(
        predicate: impl Into<String>,
        sub_type: impl Into<String>,
        obj_type: impl Into<String>,
    ) -> Self {
        Self {
            predicate: predicate.into(),
            sub_type: sub_type.into(),
            obj_type: obj_type.into(),
        }
    }
}

/// Parse a JSON array of facts.
pub fn parse_facts(json: &str) -> Result<Vec<ContainmentFact>> {
    let facts: Vec<ContainmentFact> =
        serde_json::from_str(json).map_err(|e| Error::MalformedFacts(e.to_string()))?;

    for (i, fact) in facts.iter().enumerate() {
        let empty = [
            ("predicate", &fact.predicate),
            ("subType", &fact.sub_type),
            ("objType", &fact.obj_type),
        ]
        .into_iter()
        .find(|(_, v)| v.trim().is_empty());
        if let Some((field, _)) = empty {
            return Err(Error::MalformedFacts(format!("record {i}: empty {field}")));
        }
    }
    Ok(facts)
}

/// Read and parse a facts file.
pub fn load_facts(path: impl AsRef<Path>) -> Result<Vec<ContainmentFact>> {
    let json = std::fs::read_to_string(path)?;
    parse_facts(&json)
}
