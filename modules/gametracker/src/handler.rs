//! Start / update / finish handling for a single game envelope.
//!
//! Every handler validates the envelope's identifiers before touching the
//! repository, so a malformed event never causes a store call.

use chrono::Utc;
use gametracker_common::{BasicPlayer, GameId, GameProjection, GameTrackerError, HistoricGame};
use gametracker_engine::{
    historic_registry, live_registry, CodecError, Coverage, DispatchError, Dispatcher,
    GameRepository, RepositoryError, TypeRegistry,
};
use gametracker_events::{
    CommonGameData, GameEvent, GameFinishMessage, GameStartMessage, GameUpdateMessage, TypedPayload,
};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum HandleError {
    /// Game or player id failed validation.
    #[error(transparent)]
    Invalid(GameTrackerError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Game {0} is not live")]
    NotLive(GameId),

    /// The stored document could not be decoded.
    #[error("Failed to load game: {0}")]
    Load(#[source] CodecError),

    #[error("Persistence failure: {0:#}")]
    Persistence(#[source] anyhow::Error),
}

impl HandleError {
    /// Only store outages are worth redelivering. Everything else fails the
    /// same way on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HandleError::Persistence(_))
    }
}

impl From<RepositoryError> for HandleError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Codec(e) => HandleError::Load(e),
            RepositoryError::Backend(e) => HandleError::Persistence(e),
        }
    }
}

impl From<GameTrackerError> for HandleError {
    fn from(e: GameTrackerError) -> Self {
        HandleError::Invalid(e)
    }
}

/// Applies game envelopes to the repository.
pub struct GameTracker<R> {
    repo: R,
    live: TypeRegistry<GameProjection>,
    historic: TypeRegistry<HistoricGame>,
}

impl<R: GameRepository> GameTracker<R> {
    pub fn new(
        repo: R,
        live: TypeRegistry<GameProjection>,
        historic: TypeRegistry<HistoricGame>,
    ) -> Self {
        Self { repo, live, historic }
    }

    /// Tracker with the built-in payload catalogue.
    pub fn with_default_registries(repo: R) -> Self {
        Self::new(repo, live_registry(), historic_registry())
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub async fn handle(&self, event: &GameEvent) -> Result<(), HandleError> {
        match event {
            GameEvent::GameStart(msg) => self.handle_start(msg).await,
            GameEvent::GameUpdate(msg) => self.handle_update(msg).await,
            GameEvent::GameFinish(msg) => self.handle_finish(msg).await,
        }
    }

    async fn handle_start(&self, msg: &GameStartMessage) -> Result<(), HandleError> {
        let (id, players) = validate(&msg.common_data)?;
        let common = &msg.common_data;

        let mut game = GameProjection::started(
            id,
            common.game_mode_id.as_str(),
            common.server_id.as_str(),
            msg.start_time,
            players,
            Utc::now(),
        );

        let coverage = Dispatcher::new(&self.live).dispatch(&msg.content, &mut game)?;
        warn_uncovered(id, common, &msg.content, &coverage);

        self.repo.save_live_game(&game).await?;

        info!(
            game_id = %id,
            game_mode_id = common.game_mode_id.as_str(),
            server_id = common.server_id.as_str(),
            map_id = msg.map_id.as_str(),
            "Game started"
        );
        Ok(())
    }

    async fn handle_update(&self, msg: &GameUpdateMessage) -> Result<(), HandleError> {
        let (id, players) = validate(&msg.common_data)?;

        let mut game = self
            .repo
            .get_live_game(id)
            .await?
            .ok_or(HandleError::NotLive(id))?;

        game.refresh_common(players, Utc::now());

        let coverage = Dispatcher::new(&self.live).dispatch(&msg.content, &mut game)?;
        warn_uncovered(id, &msg.common_data, &msg.content, &coverage);

        self.repo.save_live_game(&game).await?;

        debug!(game_id = %id, applied = coverage.applied_count(), "Game updated");
        Ok(())
    }

    async fn handle_finish(&self, msg: &GameFinishMessage) -> Result<(), HandleError> {
        let (id, _players) = validate(&msg.common_data)?;

        let live = self
            .repo
            .get_live_game(id)
            .await?
            .ok_or(HandleError::NotLive(id))?;

        let mut historic = HistoricGame::from_live(&live, msg.end_time);

        let coverage = Dispatcher::new(&self.historic).dispatch(&msg.content, &mut historic)?;
        warn_uncovered(id, &msg.common_data, &msg.content, &coverage);

        // Historic first: a crash between the two writes leaves the live game
        // behind, and the redelivered finish rebuilds the same record.
        self.repo.save_historic_game(&historic).await?;
        self.repo.delete_live_game(id).await?;

        info!(
            game_id = %id,
            game_mode_id = historic.game_mode_id.as_str(),
            duration_secs = (historic.end_time - historic.start_time).num_seconds(),
            "Game finished"
        );
        Ok(())
    }
}

fn validate(common: &CommonGameData) -> Result<(GameId, Vec<BasicPlayer>), GameTrackerError> {
    let id: GameId = common.game_id.parse()?;
    let players = common
        .players
        .iter()
        .map(|p| BasicPlayer::parse(&p.id, p.username.as_str()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((id, players))
}

fn warn_uncovered(id: GameId, common: &CommonGameData, content: &[TypedPayload], coverage: &Coverage) {
    if coverage.is_complete() {
        return;
    }
    warn!(
        game_id = %id,
        game_mode_id = common.game_mode_id.as_str(),
        uncovered = ?coverage.uncovered(),
        content = ?content,
        "Unrecognized payloads in game envelope"
    );
}
