//! Game lifecycle: creation with a unique code, lookup, ending, summary.

use std::collections::BTreeMap;
use std::sync::Arc;

use joker_protocol::{GameCode, GameId, PlayerId};
use rand::Rng;

use crate::model::{Game, GameStatus, GameSummary, PlayerSummary};
use crate::store::{RoundUpdate, Store, StoreError};
use crate::{GameError, GameRules};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draws a random candidate game code from `A-Z0-9`.
pub fn random_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..GameCode::LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            char::from(CODE_ALPHABET[idx])
        })
        .collect()
}

pub struct GameService<S: Store> {
    store: Arc<S>,
    rules: GameRules,
}

impl<S: Store> GameService<S> {
    pub fn new(store: Arc<S>, rules: GameRules) -> Self {
        Self { store, rules }
    }

    /// Creates a waiting game under a fresh random code.
    ///
    /// # Errors
    /// [`GameError::CodeGenerationExhausted`] if every attempt collided.
    pub fn create_game(&self) -> Result<Game, GameError> {
        self.create_game_with(&mut rand::rng())
    }

    /// Like [`create_game`](Self::create_game), drawing codes from `rng`.
    pub fn create_game_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Game, GameError> {
        for attempt in 1..=self.rules.code_attempts {
            let Ok(code) = GameCode::parse(&random_code(rng)) else {
                continue;
            };
            if self.store.code_exists(&code)? {
                tracing::debug!(%code, attempt, "game code collision");
                continue;
            }
            match self.store.create_game(&code) {
                Ok(game) => {
                    tracing::info!(%code, game_id = %game.id, "game created");
                    return Ok(game);
                }
                // Lost a race for the code; try another one.
                Err(StoreError::DuplicateCode) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        tracing::warn!(
            attempts = self.rules.code_attempts,
            "gave up generating a game code"
        );
        Err(GameError::CodeGenerationExhausted)
    }

    pub fn game(&self, id: GameId) -> Result<Game, GameError> {
        Ok(self.store.game(id)?)
    }

    pub fn game_by_code(&self, code: &GameCode) -> Result<Game, GameError> {
        Ok(self.store.game_by_code(code)?)
    }

    /// Ends the game with `code`. A round still in progress is closed as
    /// skipped.
    ///
    /// # Errors
    /// [`GameError::InvalidGameStatus`] if it has already ended.
    pub fn end_game(&self, code: &GameCode) -> Result<Game, GameError> {
        let game = self.store.game_by_code(code)?;
        if game.status == GameStatus::Ended {
            return Err(GameError::InvalidGameStatus);
        }
        let ended =
            self.store
                .transition_game(game.id, game.status, GameStatus::Ended)?;
        self.close_open_round(game.id)?;
        tracing::info!(%code, "game ended");
        Ok(ended)
    }

    /// Skips the game's last round unless it already finished. Round
    /// statuses only move forward, so the retry loop ends.
    fn close_open_round(&self, game_id: GameId) -> Result<(), GameError> {
        loop {
            let Some(round) = self.store.last_round(game_id)? else {
                return Ok(());
            };
            if round.status.is_terminal() {
                return Ok(());
            }
            match self.store.update_round(round.id, round.status, RoundUpdate::Skip) {
                Ok(_) => {
                    tracing::debug!(round_id = %round.id, "open round closed with the game");
                    return Ok(());
                }
                Err(StoreError::StaleRound { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Round count, joker count, and jokers drawn per player.
    pub fn summary(&self, game_id: GameId) -> Result<GameSummary, GameError> {
        let rounds = self.store.rounds_in_game(game_id)?;
        let players = self.store.players_in_game(game_id)?;

        let mut jokers_by_answerer: BTreeMap<PlayerId, u32> = BTreeMap::new();
        for round in rounds.iter().filter(|r| r.is_joker) {
            *jokers_by_answerer.entry(round.answerer_id).or_default() += 1;
        }

        let joker_cards = jokers_by_answerer.values().sum();
        Ok(GameSummary {
            total_rounds: u32::try_from(rounds.len()).unwrap_or(u32::MAX),
            joker_cards,
            players: players
                .into_iter()
                .map(|p| PlayerSummary {
                    joker_cards_drawn: jokers_by_answerer
                        .get(&p.id)
                        .copied()
                        .unwrap_or(0),
                    id: p.id,
                    nickname: p.nickname,
                })
                .collect(),
        })
    }
}
