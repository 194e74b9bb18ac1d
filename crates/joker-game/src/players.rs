//! Player membership: joining, leaving, presence, and host handover.

use std::sync::Arc;

use joker_protocol::{GameId, PlayerId};

use crate::GameError;
use crate::model::{GameStatus, Player, PlayerStatus};
use crate::store::{Store, StoreError};

/// Result of a player leaving a waiting game.
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    /// The removed player as it was before removal.
    pub left: Player,
    /// Who became host, if the leaver was host and someone was promoted.
    pub new_host: Option<Player>,
}

pub struct PlayerService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> PlayerService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Adds `nickname` to a waiting game. The first player becomes host.
    ///
    /// # Errors
    /// [`GameError::InvalidGameStatus`] once the game has started;
    /// [`GameError::DuplicateNickname`] if the nickname is taken.
    pub fn join_game(
        &self,
        game_id: GameId,
        nickname: &str,
    ) -> Result<Player, GameError> {
        let game = self.store.game(game_id)?;
        if game.status != GameStatus::Waiting {
            return Err(GameError::InvalidGameStatus);
        }
        let is_host = self.store.players_in_game(game_id)?.is_empty();
        let player = self.store.create_player(game_id, nickname, is_host)?;
        tracing::info!(
            code = %game.code,
            player_id = %player.id,
            nickname = %player.nickname,
            is_host,
            "player joined"
        );
        Ok(player)
    }

    /// Removes a player from a waiting game, handing host over if needed.
    ///
    /// # Errors
    /// [`GameError::InvalidGameStatus`] once the game has started.
    pub fn leave_game(&self, player_id: PlayerId) -> Result<LeaveOutcome, GameError> {
        let player = self.store.player(player_id)?;
        let game = self.store.game(player.game_id)?;
        if game.status != GameStatus::Waiting {
            return Err(GameError::InvalidGameStatus);
        }
        self.store.delete_player(player_id)?;
        tracing::info!(code = %game.code, %player_id, "player left");

        let new_host = if player.is_host {
            self.promote_if_possible(&player)?
        } else {
            None
        };
        Ok(LeaveOutcome {
            left: player,
            new_host,
        })
    }

    pub fn mark_offline(&self, player_id: PlayerId) -> Result<Player, GameError> {
        let player = self
            .store
            .set_player_status(player_id, PlayerStatus::Offline)?;
        tracing::info!(%player_id, "player marked offline");
        Ok(player)
    }

    pub fn mark_online(&self, player_id: PlayerId) -> Result<Player, GameError> {
        let player = self
            .store
            .set_player_status(player_id, PlayerStatus::Online)?;
        tracing::info!(%player_id, "player back online");
        Ok(player)
    }

    /// Makes `player` host if nobody in its game holds the flag, which
    /// happens once every player of a running game went offline.
    pub fn claim_vacant_host(&self, player: &Player) -> Result<Option<Player>, GameError> {
        let players = self.store.players_in_game(player.game_id)?;
        if players.iter().any(|p| p.is_host) {
            return Ok(None);
        }
        let host = self.store.set_host(player.id, true)?;
        tracing::info!(
            game_id = %player.game_id,
            player_id = %player.id,
            "vacant host claimed"
        );
        Ok(Some(host))
    }

    /// Clears `departing`'s host flag and promotes the first other online
    /// player in join order.
    ///
    /// # Errors
    /// [`GameError::NotEnoughPlayers`] if nobody else is online.
    pub fn transfer_host(&self, departing: &Player) -> Result<Player, GameError> {
        match self.store.set_host(departing.id, false) {
            // A player who left the lobby is already gone.
            Ok(_) | Err(StoreError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }

        let candidate = self
            .store
            .players_in_game(departing.game_id)?
            .into_iter()
            .find(|p| p.is_online() && p.id != departing.id)
            .ok_or(GameError::NotEnoughPlayers)?;

        let promoted = self.store.set_host(candidate.id, true)?;
        tracing::info!(
            from = %departing.id,
            to = %promoted.id,
            "host transferred"
        );
        Ok(promoted)
    }

    /// [`transfer_host`](Self::transfer_host), treating "nobody left to
    /// promote" as no promotion.
    pub fn promote_if_possible(
        &self,
        departing: &Player,
    ) -> Result<Option<Player>, GameError> {
        match self.transfer_host(departing) {
            Ok(host) => Ok(Some(host)),
            Err(GameError::NotEnoughPlayers) => {
                tracing::info!(
                    game_id = %departing.game_id,
                    "no online player left to promote"
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub fn player(&self, player_id: PlayerId) -> Result<Player, GameError> {
        Ok(self.store.player(player_id)?)
    }

    /// All players of a game in join order, online or not.
    pub fn players(&self, game_id: GameId) -> Result<Vec<Player>, GameError> {
        Ok(self.store.players_in_game(game_id)?)
    }

    pub fn online_players(&self, game_id: GameId) -> Result<Vec<Player>, GameError> {
        let mut players = self.store.players_in_game(game_id)?;
        players.retain(Player::is_online);
        Ok(players)
    }
}
