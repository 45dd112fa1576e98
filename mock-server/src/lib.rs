use std::{collections::BTreeMap, sync::Arc};

use async_graphql::{
    Context, EmptySubscription, Error, InputObject, Object, Result, Schema, SimpleObject, Variables,
};
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct Hero {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, InputObject)]
pub struct HeroInput {
    pub name: String,
}

impl HeroInput {
    /// The trimmed name; blank names are rejected.
    fn into_name(self) -> Result<String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::new("hero name must not be blank"));
        }
        Ok(name.to_string())
    }
}

/// Request body of `POST /graphql`. `query` is required.
#[derive(Debug, Deserialize)]
pub struct GraphqlRequest {
    pub query: String,
    #[serde(default)]
    pub variables: Option<Map<String, Value>>,
    #[serde(default, rename = "operationName")]
    pub operation_name: Option<String>,
}

impl From<GraphqlRequest> for async_graphql::Request {
    fn from(request: GraphqlRequest) -> Self {
        let variables = Variables::from_json(Value::Object(request.variables.unwrap_or_default()));
        let graphql = async_graphql::Request::new(request.query).variables(variables);
        match request.operation_name {
            Some(name) => graphql.operation_name(name),
            None => graphql,
        }
    }
}

#[derive(Debug, Default)]
pub struct HeroStore {
    heroes: BTreeMap<i64, Hero>,
}

impl HeroStore {
    pub fn new(heroes: Vec<Hero>) -> Self {
        Self {
            heroes: heroes.into_iter().map(|h| (h.id, h)).collect(),
        }
    }

    /// Next id: one past the highest stored, 11 for an empty store.
    fn next_id(&self) -> i64 {
        self.heroes.keys().next_back().map_or(11, |id| id + 1)
    }

    fn list(&self) -> Vec<Hero> {
        self.heroes.values().cloned().collect()
    }

    fn search(&self, term: &str) -> Vec<Hero> {
        let term = term.to_lowercase();
        self.heroes
            .values()
            .filter(|h| h.name.to_lowercase().contains(&term))
            .cloned()
            .collect()
    }

    fn insert(&mut self, name: String) -> Hero {
        let hero = Hero {
            id: self.next_id(),
            name,
        };
        self.heroes.insert(hero.id, hero.clone());
        hero
    }
}

pub type Db = Arc<RwLock<HeroStore>>;

fn not_found(id: i64) -> Error {
    Error::new(format!("hero {id} not found"))
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// All heroes ordered by id.
    async fn heroes(&self, ctx: &Context<'_>) -> Result<Vec<Hero>> {
        Ok(ctx.data::<Db>()?.read().await.list())
    }

    async fn hero(&self, ctx: &Context<'_>, id: i64) -> Result<Option<Hero>> {
        Ok(ctx.data::<Db>()?.read().await.heroes.get(&id).cloned())
    }

    /// Case-insensitive substring match on the name.
    async fn search(&self, ctx: &Context<'_>, term: String) -> Result<Vec<Hero>> {
        Ok(ctx.data::<Db>()?.read().await.search(&term))
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn add_hero(&self, ctx: &Context<'_>, input: HeroInput) -> Result<Hero> {
        let name = input.into_name()?;
        Ok(ctx.data::<Db>()?.write().await.insert(name))
    }

    /// Echoes the deleted id.
    async fn delete_hero(&self, ctx: &Context<'_>, id: i64) -> Result<i64> {
        let mut store = ctx.data::<Db>()?.write().await;
        store.heroes.remove(&id).map(|_| id).ok_or_else(|| not_found(id))
    }

    async fn update_hero(&self, ctx: &Context<'_>, id: i64, input: HeroInput) -> Result<Hero> {
        let name = input.into_name()?;
        let mut store = ctx.data::<Db>()?.write().await;
        let hero = store.heroes.get_mut(&id).ok_or_else(|| not_found(id))?;
        hero.name = name;
        Ok(hero.clone())
    }
}

pub type HeroSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(db: Db) -> HeroSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(db)
        .finish()
}

/// The ten heroes every fresh server starts with.
pub fn seed_heroes() -> Vec<Hero> {
    [
        (11, "Dr Nice"),
        (12, "Narco"),
        (13, "Bombasto"),
        (14, "Celeritas"),
        (15, "Magneta"),
        (16, "RubberMan"),
        (17, "Dynama"),
        (18, "Dr IQ"),
        (19, "Magma"),
        (20, "Tornado"),
    ]
    .into_iter()
    .map(|(id, name)| Hero {
        id,
        name: name.to_string(),
    })
    .collect()
}

pub fn app() -> Router {
    app_with(seed_heroes())
}

pub fn app_with(heroes: Vec<Hero>) -> Router {
    let db: Db = Arc::new(RwLock::new(HeroStore::new(heroes)));
    Router::new()
        .route("/graphql", post(graphql))
        .with_state(build_schema(db))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn graphql(
    State(schema): State<HeroSchema>,
    Json(request): Json<GraphqlRequest>,
) -> Json<async_graphql::Response> {
    debug!(operation = ?request.operation_name, "graphql request");
    Json(schema.execute(request).await)
}
