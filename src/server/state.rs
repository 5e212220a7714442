use axum::extract::FromRef;

use crate::apply::ApplyService;
use crate::artist_store::ArtistStore;
use crate::resolver::ArtistResolver;
use crate::statement::StatementConfig;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedArtistStore = Arc<dyn ArtistStore>;
pub type GuardedResolver = Arc<ArtistResolver>;
pub type GuardedApplyService = Arc<ApplyService>;
pub type SharedStatementConfig = Arc<StatementConfig>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub artist_store: GuardedArtistStore,
    pub resolver: GuardedResolver,
    pub apply_service: GuardedApplyService,
    pub statement_config: SharedStatementConfig,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        artist_store: GuardedArtistStore,
        resolver: GuardedResolver,
        statement_config: StatementConfig,
    ) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            apply_service: Arc::new(ApplyService::new(artist_store.clone())),
            artist_store,
            resolver,
            statement_config: Arc::new(statement_config),
        }
    }
}

impl FromRef<ServerState> for GuardedArtistStore {
    fn from_ref(input: &ServerState) -> Self {
        input.artist_store.clone()
    }
}

impl FromRef<ServerState> for GuardedResolver {
    fn from_ref(input: &ServerState) -> Self {
        input.resolver.clone()
    }
}

impl FromRef<ServerState> for GuardedApplyService {
    fn from_ref(input: &ServerState) -> Self {
        input.apply_service.clone()
    }
}

impl FromRef<ServerState> for SharedStatementConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.statement_config.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
