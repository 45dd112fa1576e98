//! Domain records for the hero schema.
//!
//! # Design
//! These types mirror the test server's schema but are defined independently.
//! Integration tests catch any schema drift between the two crates. Every
//! field of `Hero` is required, so a partial record from the wire fails to
//! deserialize instead of reaching a caller half-filled.

use serde::{Deserialize, Serialize};

/// A hero record as returned by the schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Hero {
    pub id: i64,
    pub name: String,
}

impl Hero {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A hero that has not been stored yet; the server assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewHero {
    pub name: String,
}

impl NewHero {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The `HeroInput` input object carried by the add and update mutations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeroInput {
    pub name: String,
}

impl From<&NewHero> for HeroInput {
    fn from(hero: &NewHero) -> Self {
        Self {
            name: hero.name.clone(),
        }
    }
}

impl From<&Hero> for HeroInput {
    fn from(hero: &Hero) -> Self {
        Self {
            name: hero.name.clone(),
        }
    }
}

/// Identifies the hero a delete targets. Built from a raw id or a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeroId(pub i64);

impl From<i64> for HeroId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<&Hero> for HeroId {
    fn from(hero: &Hero) -> Self {
        Self(hero.id)
    }
}

impl From<Hero> for HeroId {
    fn from(hero: Hero) -> Self {
        Self(hero.id)
    }
}

/// Server acknowledgement of `deleteHero`: either the echoed id or a flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DeleteAck {
    Id(i64),
    Flag(bool),
}

impl DeleteAck {
    /// `false` means the server deleted nothing.
    pub fn is_acknowledged(&self) -> bool {
        match self {
            DeleteAck::Id(_) => true,
            DeleteAck::Flag(flag) => *flag,
        }
    }
}
