//! Hero data-access service.
//!
//! # Design
//! Each operation comes in two flavours. `try_*` methods return the typed
//! `Result<_, HeroError>` channel. The plain methods are built on them and
//! never fail: they route every error through the shared `Recovery` policy,
//! which records `<operation> failed: <detail>` and yields the operation's
//! default (an empty `Vec` or `None`).
//!
//! Every pipeline unwraps `data.<field>` first, then records the outcome
//! message, then (for the plain methods) recovers. One-shot calls and
//! watches share the same shaping functions, so both report identically.

use std::sync::Arc;

use crate::error::{GatewayError, HeroError};
use crate::gateway::{GatewayCell, SchemaGateway};
use crate::operation::{self, ResultEnvelope};
use crate::recovery::Recovery;
use crate::sink::MessageSink;
use crate::types::{DeleteAck, Hero, HeroId, NewHero};
use crate::watch::QueryWatch;

type Fetched = Result<ResultEnvelope, GatewayError>;

#[derive(Clone)]
pub struct HeroService {
    gateway: Arc<SchemaGateway>,
    sink: Arc<dyn MessageSink>,
    recovery: Recovery,
}

impl std::fmt::Debug for HeroService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeroService")
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

impl HeroService {
    pub fn new(gateway: Arc<SchemaGateway>, sink: Arc<dyn MessageSink>) -> Self {
        let recovery = Recovery::new(Arc::clone(&sink));
        Self {
            gateway,
            sink,
            recovery,
        }
    }

    /// Build a service on the gateway installed in `cell`.
    pub fn from_cell(cell: &GatewayCell, sink: Arc<dyn MessageSink>) -> Result<Self, GatewayError> {
        Ok(Self::new(cell.get()?, sink))
    }

    pub fn gateway(&self) -> &Arc<SchemaGateway> {
        &self.gateway
    }

    // --- list ---

    pub async fn heroes(&self) -> Vec<Hero> {
        self.recovery
            .resolve("getHeroes", self.try_heroes().await, Vec::new())
    }

    pub async fn try_heroes(&self) -> Result<Vec<Hero>, HeroError> {
        let fetched = self.gateway.execute(&operation::heroes()).await;
        self.shape_heroes(fetched)
    }

    /// Live list of heroes, re-emitted whenever the cache is invalidated.
    pub fn watch_heroes(&self) -> QueryWatch<Vec<Hero>> {
        let service = self.clone();
        self.gateway.watch_with(operation::heroes(), move |fetched| {
            service
                .recovery
                .resolve("getHeroes", service.shape_heroes(fetched), Vec::new())
        })
    }

    fn shape_heroes(&self, fetched: Fetched) -> Result<Vec<Hero>, HeroError> {
        let heroes = fetched?.require_field("heroes")?;
        self.log("fetched heroes");
        Ok(heroes)
    }

    // --- get by id, lenient: not-found is an ordinary outcome ---

    pub async fn hero_no_404(&self, id: i64) -> Option<Hero> {
        let result = self.try_hero_no_404(id).await;
        self.recovery
            .resolve(&format!("getHeroNo404 id={id}"), result, None)
    }

    pub async fn try_hero_no_404(&self, id: i64) -> Result<Option<Hero>, HeroError> {
        let fetched = self.gateway.execute(&operation::hero(id)).await;
        self.shape_hero_no_404(id, fetched)
    }

    pub fn watch_hero_no_404(&self, id: i64) -> QueryWatch<Option<Hero>> {
        let service = self.clone();
        let name = format!("getHeroNo404 id={id}");
        self.gateway.watch_with(operation::hero(id), move |fetched| {
            service
                .recovery
                .resolve(&name, service.shape_hero_no_404(id, fetched), None)
        })
    }

    fn shape_hero_no_404(&self, id: i64, fetched: Fetched) -> Result<Option<Hero>, HeroError> {
        let hero = fetched?.into_field::<Hero>("hero")?;
        match hero {
            Some(hero) => {
                check_id("hero", id, &hero)?;
                self.log(&format!("fetched hero id={id}"));
                Ok(Some(hero))
            }
            None => {
                self.log(&format!("did not find hero id={id}"));
                Ok(None)
            }
        }
    }

    // --- get by id, strict: not-found is a failure ---

    pub async fn hero(&self, id: i64) -> Option<Hero> {
        let result = self.try_hero(id).await.map(Some);
        self.recovery.resolve(&format!("getHero id={id}"), result, None)
    }

    pub async fn try_hero(&self, id: i64) -> Result<Hero, HeroError> {
        let fetched = self.gateway.execute(&operation::hero(id)).await;
        self.shape_hero(id, fetched)
    }

    pub fn watch_hero(&self, id: i64) -> QueryWatch<Option<Hero>> {
        let service = self.clone();
        let name = format!("getHero id={id}");
        self.gateway.watch_with(operation::hero(id), move |fetched| {
            let result = service.shape_hero(id, fetched).map(Some);
            service.recovery.resolve(&name, result, None)
        })
    }

    fn shape_hero(&self, id: i64, fetched: Fetched) -> Result<Hero, HeroError> {
        let hero = fetched?
            .into_field::<Hero>("hero")?
            .ok_or(HeroError::NotFound(id))?;
        check_id("hero", id, &hero)?;
        self.log(&format!("fetched hero id={id}"));
        Ok(hero)
    }

    // --- search ---

    /// Heroes whose name matches `term`. A blank term never reaches the
    /// network and yields no heroes.
    pub async fn search_heroes(&self, term: &str) -> Vec<Hero> {
        let result = self.try_search_heroes(term).await;
        self.recovery.resolve("searchHeroes", result, Vec::new())
    }

    pub async fn try_search_heroes(&self, term: &str) -> Result<Vec<Hero>, HeroError> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        let heroes: Vec<Hero> = self
            .gateway
            .execute(&operation::search(term))
            .await?
            .require_field("search")?;
        if heroes.is_empty() {
            self.log(&format!("no heroes matching \"{term}\""));
        } else {
            self.log(&format!("found heroes matching \"{term}\""));
        }
        Ok(heroes)
    }

    // --- mutations ---

    pub async fn add_hero(&self, hero: &NewHero) -> Option<Hero> {
        let result = self.try_add_hero(hero).await.map(Some);
        self.recovery.resolve("addHero", result, None)
    }

    pub async fn try_add_hero(&self, hero: &NewHero) -> Result<Hero, HeroError> {
        let added: Hero = self
            .gateway
            .execute(&operation::add_hero(hero))
            .await?
            .require_field("addHero")?;
        self.log(&format!("added hero w/ id={}", added.id));
        Ok(added)
    }

    pub async fn delete_hero(&self, hero: impl Into<HeroId>) -> Option<DeleteAck> {
        let result = self.try_delete_hero(hero).await.map(Some);
        self.recovery.resolve("deleteHero", result, None)
    }

    /// A `false` acknowledgement is reported as `NotFound`.
    pub async fn try_delete_hero(&self, hero: impl Into<HeroId>) -> Result<DeleteAck, HeroError> {
        let id = hero.into();
        let ack: DeleteAck = self
            .gateway
            .execute(&operation::delete_hero(id))
            .await?
            .require_field("deleteHero")?;
        if !ack.is_acknowledged() {
            return Err(HeroError::NotFound(id.0));
        }
        self.log(&format!("deleted hero id={}", id.0));
        Ok(ack)
    }

    pub async fn update_hero(&self, hero: &Hero) -> Option<Hero> {
        let result = self.try_update_hero(hero).await.map(Some);
        self.recovery.resolve("updateHero", result, None)
    }

    pub async fn try_update_hero(&self, hero: &Hero) -> Result<Hero, HeroError> {
        let updated: Hero = self
            .gateway
            .execute(&operation::update_hero(hero))
            .await?
            .require_field("updateHero")?;
        check_id("updateHero", hero.id, &updated)?;
        self.log(&format!("updated hero id={}", hero.id));
        Ok(updated)
    }

    fn log(&self, message: &str) {
        self.sink.record(message);
    }
}

fn check_id(field: &'static str, expected: i64, hero: &Hero) -> Result<(), HeroError> {
    if hero.id == expected {
        return Ok(());
    }
    Err(HeroError::Malformed {
        field,
        message: format!("expected id={expected}, got id={}", hero.id),
    })
}
