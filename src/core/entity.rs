//! Canonical in-memory shape of OSM entities
//!
//! Entities are immutable once normalized. Materialization wraps them in
//! `ResolvedWay` and `Stop` instead of mutating them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Free-form key/value tags of an entity
pub type Tags = BTreeMap<String, String>;

/// The three OSM entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Node,
    Way,
    Relation,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Node => "node",
            EntityKind::Way => "way",
            EntityKind::Relation => "relation",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(EntityKind::Node),
            "way" => Ok(EntityKind::Way),
            "relation" => Ok(EntityKind::Relation),
            other => Err(format!("unknown entity kind '{other}'")),
        }
    }
}

/// A (longitude, latitude) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

impl Coord {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: u64,
    pub tags: Tags,
    pub coords: Coord,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: u64,
    pub tags: Tags,
    /// Node references in path order
    pub node_ids: Vec<u64>,
}

/// A typed, roled reference from a relation to another entity
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub kind: EntityKind,
    pub id: u64,
    /// Empty when the upstream data gives no role
    pub role: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: u64,
    pub tags: Tags,
    pub members: Vec<Member>,
}

impl Relation {
    /// Members of one kind, in member order
    pub fn members_of(&self, kind: EntityKind) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(move |m| m.kind == kind)
    }

    pub fn has_members_of(&self, kind: EntityKind) -> bool {
        self.members_of(kind).next().is_some()
    }
}

/// A normalized node, way or relation
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Node(Node),
    Way(Way),
    Relation(Relation),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Node(_) => EntityKind::Node,
            Entity::Way(_) => EntityKind::Way,
            Entity::Relation(_) => EntityKind::Relation,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Entity::Node(node) => node.id,
            Entity::Way(way) => way.id,
            Entity::Relation(relation) => relation.id,
        }
    }
}
