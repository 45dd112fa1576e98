//! Operation descriptors and result envelopes for the hero schema.
//!
//! # Design
//! Each schema operation is built by a free function returning an
//! `OperationDescriptor`: the document text, its operation name and the
//! variables for this call. Descriptors are plain data and carry no I/O;
//! the gateway decides how they reach the endpoint. The `ResultEnvelope`
//! is the decoded `{data, errors}` body and knows how to unwrap one field
//! into a domain type.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::HeroError;
use crate::types::{Hero, HeroId, HeroInput, NewHero};

pub const HEROES_QUERY: &str = "query Heroes { heroes { id name } }";
pub const HERO_QUERY: &str = "query Hero($id: Int!) { hero(id: $id) { id name } }";
pub const SEARCH_QUERY: &str =
    "query Search($term: String!) { search(term: $term) { id name } }";
pub const ADD_HERO_MUTATION: &str =
    "mutation AddHero($input: HeroInput!) { addHero(input: $input) { id name } }";
pub const DELETE_HERO_MUTATION: &str = "mutation DeleteHero($id: Int!) { deleteHero(id: $id) }";
pub const UPDATE_HERO_MUTATION: &str = "mutation UpdateHero($id: Int!, $input: HeroInput!) \
     { updateHero(id: $id, input: $input) { id name } }";

/// Whether an operation reads (and may be cached) or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
}

/// A single operation invocation: document, name and variables.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    pub kind: OperationKind,
    pub name: &'static str,
    pub document: &'static str,
    pub variables: Map<String, Value>,
}

impl OperationDescriptor {
    pub fn query(name: &'static str, document: &'static str, variables: Map<String, Value>) -> Self {
        Self {
            kind: OperationKind::Query,
            name,
            document,
            variables,
        }
    }

    pub fn mutation(
        name: &'static str,
        document: &'static str,
        variables: Map<String, Value>,
    ) -> Self {
        Self {
            kind: OperationKind::Mutation,
            name,
            document,
            variables,
        }
    }

    pub fn is_query(&self) -> bool {
        self.kind == OperationKind::Query
    }

    /// Cache key: operation name plus the canonical JSON of the variables.
    ///
    /// `serde_json::Map` keeps keys sorted, so equal variables always render
    /// identically.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.name, Value::Object(self.variables.clone()))
    }
}

pub fn heroes() -> OperationDescriptor {
    OperationDescriptor::query("Heroes", HEROES_QUERY, Map::new())
}

pub fn hero(id: i64) -> OperationDescriptor {
    OperationDescriptor::query("Hero", HERO_QUERY, variables(json!({ "id": id })))
}

pub fn search(term: &str) -> OperationDescriptor {
    OperationDescriptor::query("Search", SEARCH_QUERY, variables(json!({ "term": term })))
}

pub fn add_hero(hero: &NewHero) -> OperationDescriptor {
    let input = HeroInput::from(hero);
    OperationDescriptor::mutation(
        "AddHero",
        ADD_HERO_MUTATION,
        variables(json!({ "input": { "name": input.name } })),
    )
}

pub fn delete_hero(id: HeroId) -> OperationDescriptor {
    OperationDescriptor::mutation(
        "DeleteHero",
        DELETE_HERO_MUTATION,
        variables(json!({ "id": id.0 })),
    )
}

pub fn update_hero(hero: &Hero) -> OperationDescriptor {
    let input = HeroInput::from(hero);
    OperationDescriptor::mutation(
        "UpdateHero",
        UPDATE_HERO_MUTATION,
        variables(json!({ "id": hero.id, "input": { "name": input.name } })),
    )
}

fn variables(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Position of an error within the document (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub line: u32,
    pub column: u32,
}

/// One segment of the response path an error refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(i64),
}

/// A schema-reported error from the envelope's `errors` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<ErrorLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: None,
        }
    }
}

/// The decoded `{data, errors}` body of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorDetail>,
}

impl ResultEnvelope {
    pub fn with_data(data: Map<String, Value>) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Unwrap `data.<field>` into `T`.
    ///
    /// Schema errors win over data. A missing field is an error; an explicit
    /// `null` is `Ok(None)`, which callers map to their own absence value.
    pub fn into_field<T: DeserializeOwned>(self, field: &'static str) -> Result<Option<T>, HeroError> {
        if !self.errors.is_empty() {
            return Err(HeroError::Graphql(self.errors));
        }
        let mut data = self.data.ok_or(HeroError::MissingData(field))?;
        match data.remove(field) {
            None => Err(HeroError::MissingData(field)),
            Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| HeroError::Malformed {
                    field,
                    message: e.to_string(),
                }),
        }
    }

    /// Like `into_field`, but `null` is also treated as missing.
    pub fn require_field<T: DeserializeOwned>(self, field: &'static str) -> Result<T, HeroError> {
        self.into_field(field)?.ok_or(HeroError::MissingData(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeleteAck;

    fn envelope(body: &str) -> ResultEnvelope {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn descriptors_carry_kind_and_name() {
        assert!(heroes().is_query());
        assert_eq!(hero(11).name, "Hero");
        assert_eq!(hero(11).variables["id"], 11);
        assert_eq!(search("ma").variables["term"], "ma");
        assert_eq!(add_hero(&NewHero::new("Tornado")).kind, OperationKind::Mutation);
        assert_eq!(delete_hero(HeroId(13)).variables["id"], 13);

        let update = update_hero(&Hero::new(12, "Narco"));
        assert_eq!(update.variables["id"], 12);
        assert_eq!(update.variables["input"]["name"], "Narco");
    }

    #[test]
    fn cache_key_distinguishes_variables() {
        assert_eq!(hero(11).cache_key(), hero(11).cache_key());
        assert_ne!(hero(11).cache_key(), hero(12).cache_key());
        assert_eq!(heroes().cache_key(), "Heroes:{}");
    }

    #[test]
    fn into_field_unwraps_records() {
        let env = envelope(r#"{"data":{"heroes":[{"id":11,"name":"Dr Nice"}]}}"#);
        let heroes: Vec<Hero> = env.require_field("heroes").unwrap();
        assert_eq!(heroes, vec![Hero::new(11, "Dr Nice")]);
    }

    #[test]
    fn into_field_null_is_absent() {
        let env = envelope(r#"{"data":{"hero":null}}"#);
        let hero: Option<Hero> = env.into_field("hero").unwrap();
        assert!(hero.is_none());
    }

    #[test]
    fn into_field_missing_is_error() {
        let env = envelope(r#"{"data":{}}"#);
        let err = env.into_field::<Hero>("hero").unwrap_err();
        assert!(matches!(err, HeroError::MissingData("hero")));

        let env = envelope(r#"{"data":null}"#);
        let err = env.into_field::<Hero>("hero").unwrap_err();
        assert!(matches!(err, HeroError::MissingData("hero")));
    }

    #[test]
    fn into_field_errors_win_over_data() {
        let env = envelope(
            r#"{"data":{"deleteHero":null},"errors":[{"message":"hero 99 not found","path":["deleteHero"]}]}"#,
        );
        let err = env.into_field::<DeleteAck>("deleteHero").unwrap_err();
        match err {
            HeroError::Graphql(errors) => {
                assert_eq!(errors[0].message, "hero 99 not found");
                assert_eq!(errors[0].path, vec![PathSegment::Key("deleteHero".to_string())]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn into_field_rejects_partial_record() {
        let env = envelope(r#"{"data":{"hero":{"id":11}}}"#);
        let err = env.into_field::<Hero>("hero").unwrap_err();
        assert!(matches!(err, HeroError::Malformed { field: "hero", .. }));
    }
}
