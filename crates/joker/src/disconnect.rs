//! What happens to the game when a player's socket goes away.
//!
//! Socket teardown posts a [`DisconnectEvent`]; one worker task feeds the
//! events to [`GameController::handle_disconnect`] in arrival order. The
//! policy is "remove while waiting, mark offline while playing".

use std::sync::Arc;

use joker_game::{GameError, GameStatus, LeaveOutcome, Player, Round, Store};
use joker_protocol::{GameCode, GameEnded, PlayerId, RoundId, RoundSkipped, ServerEvent};
use tokio::sync::mpsc;

use crate::controller::{GameController, player_ref, round_started};

/// A socket of `player_id` in game `game_code` failed or closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectEvent {
    pub game_code: GameCode,
    pub player_id: PlayerId,
}

/// What the disconnect changed.
#[derive(Debug, Clone)]
pub enum DisconnectOutcome {
    /// Nothing to do: the game is over, the player is unknown, or the
    /// player already has a newer connection.
    Ignored,
    /// Waiting game: the player was removed from the lobby.
    Removed(LeaveOutcome),
    /// Running game: the player was marked offline.
    Offline {
        player: Player,
        new_host: Option<Player>,
        round: RoundEffect,
    },
}

/// Effect of an offline player on the running round.
#[derive(Debug, Clone)]
pub enum RoundEffect {
    /// The round was not waiting on this player.
    Unaffected,
    /// The round was abandoned and `next` started.
    Skipped { skipped: RoundId, next: Round },
    /// Too few players remained, so the game ended.
    GameEnded,
}

impl<S: Store> GameController<S> {
    /// Applies the disconnect policy and broadcasts each step.
    ///
    /// # Errors
    /// The first failing step's error. Steps after it, including their
    /// broadcasts, do not run.
    pub async fn handle_disconnect(
        &self,
        event: DisconnectEvent,
    ) -> Result<DisconnectOutcome, GameError> {
        let DisconnectEvent {
            game_code: code,
            player_id,
        } = event;

        let game = self.games.game_by_code(&code)?;
        if game.status == GameStatus::Ended {
            tracing::debug!(%code, %player_id, "disconnect after game ended");
            return Ok(DisconnectOutcome::Ignored);
        }
        let player = match self.member(&game, player_id) {
            Ok(player) => player,
            Err(GameError::NotFound(_)) => {
                tracing::debug!(%code, %player_id, "disconnect for unknown player");
                return Ok(DisconnectOutcome::Ignored);
            }
            Err(e) => return Err(e),
        };
        if self.reconnected(&code, player_id).await {
            tracing::debug!(%code, %player_id, "player already reconnected");
            return Ok(DisconnectOutcome::Ignored);
        }

        match game.status {
            GameStatus::Waiting => {
                let outcome = self.players.leave_game(player_id)?;
                self.announce_departure(&code, &outcome).await;
                Ok(DisconnectOutcome::Removed(outcome))
            }
            GameStatus::Playing => {
                let player = self.players.mark_offline(player.id)?;
                self.broadcast(&code, ServerEvent::PlayerOffline(player_ref(&player)))
                    .await;

                let new_host = if player.is_host {
                    let promoted = self.players.promote_if_possible(&player)?;
                    if let Some(host) = &promoted {
                        self.broadcast(
                            &code,
                            ServerEvent::HostTransferred(player_ref(host)),
                        )
                        .await;
                    }
                    promoted
                } else {
                    None
                };

                let round = self.settle_round(&code, &player).await?;
                Ok(DisconnectOutcome::Offline {
                    player,
                    new_host,
                    round,
                })
            }
            GameStatus::Ended => Ok(DisconnectOutcome::Ignored),
        }
    }

    /// Skips the current round if it was waiting on `player`, ending the
    /// game when too few players remain.
    async fn settle_round(
        &self,
        code: &GameCode,
        player: &Player,
    ) -> Result<RoundEffect, GameError> {
        let Some(round) = self.coordinator.current_round(player.game_id)? else {
            return Ok(RoundEffect::Unaffected);
        };
        if !round.is_waiting_on(player.id) {
            return Ok(RoundEffect::Unaffected);
        }

        let game = self.games.game(player.game_id)?;
        match self.coordinator.skip_round(&game, round.id) {
            Ok(next) => {
                self.broadcast(
                    code,
                    ServerEvent::RoundSkipped(RoundSkipped {
                        reason: format!("{} disconnected", player.nickname),
                        round: round_started(&next),
                    }),
                )
                .await;
                Ok(RoundEffect::Skipped {
                    skipped: round.id,
                    next,
                })
            }
            Err(GameError::NotEnoughPlayers) => {
                tracing::info!(%code, "too few players left, ending game");
                self.games.end_game(code)?;
                self.broadcast(
                    code,
                    ServerEvent::GameEnded(GameEnded {
                        game_code: code.clone(),
                    }),
                )
                .await;
                Ok(RoundEffect::GameEnded)
            }
            Err(e) => Err(e),
        }
    }

    /// Returns `true` if the room still lists `player_id`: the socket that
    /// closed had already been replaced by a newer one.
    async fn reconnected(&self, code: &GameCode, player_id: PlayerId) -> bool {
        let Some(room) = self.registry.get_room(code).await else {
            return false;
        };
        room.info()
            .await
            .map(|info| info.is_connected(player_id))
            .unwrap_or(false)
    }

    /// Deletes the room of an ended game once nobody is connected to it.
    pub(crate) async fn prune_room(&self, code: &GameCode) -> Result<bool, GameError> {
        let game = self.games.game_by_code(code)?;
        if game.status != GameStatus::Ended {
            return Ok(false);
        }
        let Some(room) = self.registry.get_room(code).await else {
            return Ok(false);
        };
        let empty = room
            .info()
            .await
            .map(|info| info.client_count() == 0)
            .unwrap_or(true);
        if empty {
            self.registry.delete_room(code).await;
        }
        Ok(empty)
    }
}

/// Consumes disconnect events until every sender is gone.
pub async fn run_disconnect_worker<S: Store>(
    controller: Arc<GameController<S>>,
    mut events: mpsc::UnboundedReceiver<DisconnectEvent>,
) {
    tracing::info!("disconnect worker started");

    while let Some(event) = events.recv().await {
        let code = event.game_code.clone();
        let player_id = event.player_id;
        match controller.handle_disconnect(event).await {
            Ok(outcome) => {
                tracing::info!(%code, %player_id, ?outcome, "disconnect handled");
            }
            Err(e) => {
                tracing::error!(
                    %code,
                    %player_id,
                    error = %e,
                    "disconnect handling stopped"
                );
            }
        }
        match controller.prune_room(&code).await {
            Ok(true) => tracing::info!(%code, "pruned room of ended game"),
            Ok(false) => {}
            Err(e) => tracing::debug!(%code, error = %e, "room prune skipped"),
        }
    }

    tracing::info!("disconnect worker stopped");
}
