//! The request-layer interface: persist first, then tell the room.
//!
//! Every action runs the synchronous game logic and, once the new state is
//! stored, pushes the matching event through the game's room. A failed
//! broadcast is logged and never undoes or fails the action.

use std::sync::Arc;

use joker_game::{
    DrawOutcome, Entity, Game, GameError, GameRules, GameService, GameStatus,
    GameSummary, LeaveOutcome, Player, PlayerService, Question,
    QuestionService, Round, RoundCoordinator, Store,
};
use joker_protocol::{
    AnswerSubmitted, GameCode, GameEnded, NoPayload, PlayerId, PlayerJoined,
    PlayerRef, QuestionCard, QuestionId, RoundId, RoundSkipped, RoundStarted,
    ServerEvent,
};
use joker_room::RoomRegistry;

use crate::route::ConnectTarget;

/// Coordinates game services with live rooms.
pub struct GameController<S: Store> {
    pub(crate) games: GameService<S>,
    pub(crate) players: PlayerService<S>,
    pub(crate) questions: QuestionService<S>,
    pub(crate) coordinator: RoundCoordinator<S>,
    pub(crate) registry: Arc<RoomRegistry>,
}

impl<S: Store> GameController<S> {
    pub fn new(store: Arc<S>, registry: Arc<RoomRegistry>, rules: GameRules) -> Self {
        Self {
            games: GameService::new(store.clone(), rules.clone()),
            players: PlayerService::new(store.clone()),
            questions: QuestionService::new(store.clone()),
            coordinator: RoundCoordinator::new(store, rules),
            registry,
        }
    }

    /// The room registry shared with the accept loop.
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    // -- lobby ----------------------------------------------------------

    /// Creates a waiting game and its room.
    pub async fn create_game(&self) -> Result<Game, GameError> {
        let game = self.games.create_game()?;
        self.registry.create_room(game.code.clone()).await;
        Ok(game)
    }

    pub async fn join_game(
        &self,
        code: &GameCode,
        nickname: &str,
    ) -> Result<Player, GameError> {
        let game = self.games.game_by_code(code)?;
        let player = self.players.join_game(game.id, nickname)?;
        self.broadcast(
            code,
            ServerEvent::PlayerJoined(PlayerJoined {
                id: player.id,
                nickname: player.nickname.clone(),
                is_host: player.is_host,
            }),
        )
        .await;
        Ok(player)
    }

    /// Removes a player from a waiting game.
    pub async fn leave_game(
        &self,
        code: &GameCode,
        player_id: PlayerId,
    ) -> Result<LeaveOutcome, GameError> {
        let game = self.games.game_by_code(code)?;
        self.member(&game, player_id)?;
        let outcome = self.players.leave_game(player_id)?;
        self.announce_departure(code, &outcome).await;
        Ok(outcome)
    }

    /// Starts the game. Only the host may do this.
    pub async fn start_game(
        &self,
        code: &GameCode,
        player_id: PlayerId,
    ) -> Result<Round, GameError> {
        let game = self.games.game_by_code(code)?;
        if !self.member(&game, player_id)?.is_host {
            return Err(GameError::Forbidden);
        }
        let round = self.coordinator.start_game(&game)?;
        self.broadcast(code, ServerEvent::GameStarted(round_started(&round)))
            .await;
        Ok(round)
    }

    pub async fn end_game(&self, code: &GameCode) -> Result<Game, GameError> {
        let game = self.games.end_game(code)?;
        self.broadcast(
            code,
            ServerEvent::GameEnded(GameEnded {
                game_code: code.clone(),
            }),
        )
        .await;
        Ok(game)
    }

    // -- rounds ---------------------------------------------------------

    /// The questioner picks a question. Everyone learns it is answer time;
    /// only the answerer sees the question itself.
    pub async fn submit_question(
        &self,
        code: &GameCode,
        round_id: RoundId,
        question_id: QuestionId,
        player_id: PlayerId,
    ) -> Result<Round, GameError> {
        self.round_in_game(code, round_id)?;
        let round =
            self.coordinator
                .submit_question(round_id, question_id, player_id)?;
        let question = self.questions.question(question_id)?;

        self.broadcast(code, ServerEvent::AnswerTime(NoPayload {})).await;
        self.send_to(
            code,
            round.answerer_id,
            ServerEvent::RoundQuestion(question_card(&question)),
        )
        .await;
        Ok(round)
    }

    pub async fn submit_answer(
        &self,
        code: &GameCode,
        round_id: RoundId,
        answer: &str,
        player_id: PlayerId,
    ) -> Result<Round, GameError> {
        self.round_in_game(code, round_id)?;
        let round = self.coordinator.submit_answer(round_id, answer, player_id)?;
        self.broadcast(
            code,
            ServerEvent::AnswerSubmitted(AnswerSubmitted {
                answer: answer.to_owned(),
            }),
        )
        .await;
        Ok(round)
    }

    /// The answerer draws. A joker reveals the question to everyone.
    pub async fn draw_card(
        &self,
        code: &GameCode,
        round_id: RoundId,
        player_id: PlayerId,
        index: usize,
    ) -> Result<DrawOutcome, GameError> {
        self.round_in_game(code, round_id)?;
        let outcome = self.coordinator.draw_card(round_id, player_id, index)?;

        let event = match (&outcome.question, outcome.is_joker()) {
            (Some(question), true) => {
                ServerEvent::JokerRevealed(question_card(question))
            }
            (None, true) => {
                tracing::warn!(%round_id, "joker drawn without a question");
                ServerEvent::JokerRevealed(QuestionCard {
                    level: String::new(),
                    content: String::new(),
                })
            }
            (_, false) => ServerEvent::PlayerSafe(NoPayload {}),
        };
        self.broadcast(code, event).await;
        Ok(outcome)
    }

    pub async fn next_round(&self, code: &GameCode) -> Result<Round, GameError> {
        let game = self.games.game_by_code(code)?;
        let round = self.coordinator.create_next_round(&game)?;
        self.broadcast(code, ServerEvent::NextRoundStarted(round_started(&round)))
            .await;
        Ok(round)
    }

    /// Abandons a round on request and starts the next one.
    pub async fn skip_round(
        &self,
        code: &GameCode,
        round_id: RoundId,
    ) -> Result<Round, GameError> {
        let game = self.games.game_by_code(code)?;
        self.round_in_game(code, round_id)?;
        let next = self.coordinator.skip_round(&game, round_id)?;
        self.broadcast(
            code,
            ServerEvent::RoundSkipped(RoundSkipped {
                reason: "skipped".to_owned(),
                round: round_started(&next),
            }),
        )
        .await;
        Ok(next)
    }

    // -- queries --------------------------------------------------------

    pub fn game(&self, code: &GameCode) -> Result<Game, GameError> {
        self.games.game_by_code(code)
    }

    pub fn players(&self, code: &GameCode) -> Result<Vec<Player>, GameError> {
        let game = self.games.game_by_code(code)?;
        self.players.players(game.id)
    }

    pub fn random_questions(&self, limit: usize) -> Result<Vec<Question>, GameError> {
        self.questions.random_questions(limit)
    }

    pub fn summary(&self, code: &GameCode) -> Result<GameSummary, GameError> {
        let game = self.games.game_by_code(code)?;
        self.games.summary(game.id)
    }

    pub fn current_round(&self, code: &GameCode) -> Result<Option<Round>, GameError> {
        let game = self.games.game_by_code(code)?;
        self.coordinator.current_round(game.id)
    }

    // -- connections ----------------------------------------------------

    /// Checks that a socket's target names an existing game and one of its
    /// players. A returning offline player of a running game is marked
    /// online again, and takes the host flag if nobody holds it.
    pub async fn admit(&self, target: &ConnectTarget) -> Result<Player, GameError> {
        let game = self.games.game_by_code(&target.code)?;
        let player = self.member(&game, target.player_id)?;
        if player.is_online() || game.status == GameStatus::Ended {
            return Ok(player);
        }
        let player = self.players.mark_online(player.id)?;
        match self.players.claim_vacant_host(&player)? {
            Some(host) => {
                self.broadcast(
                    &target.code,
                    ServerEvent::HostTransferred(player_ref(&host)),
                )
                .await;
                Ok(host)
            }
            None => Ok(player),
        }
    }

    // -- helpers --------------------------------------------------------

    /// Loads `player_id`, requiring it to belong to `game`.
    pub(crate) fn member(
        &self,
        game: &Game,
        player_id: PlayerId,
    ) -> Result<Player, GameError> {
        let player = self.players.player(player_id)?;
        if player.game_id != game.id {
            return Err(GameError::NotFound(Entity::Player));
        }
        Ok(player)
    }

    fn round_in_game(
        &self,
        code: &GameCode,
        round_id: RoundId,
    ) -> Result<Round, GameError> {
        let game = self.games.game_by_code(code)?;
        let round = self.coordinator.round(round_id)?;
        if round.game_id != game.id {
            return Err(GameError::NotFound(Entity::Round));
        }
        Ok(round)
    }

    pub(crate) async fn announce_departure(
        &self,
        code: &GameCode,
        outcome: &LeaveOutcome,
    ) {
        self.broadcast(code, ServerEvent::PlayerLeft(player_ref(&outcome.left)))
            .await;
        if let Some(host) = &outcome.new_host {
            self.broadcast(code, ServerEvent::HostTransferred(player_ref(host)))
                .await;
        }
    }

    /// Sends `event` to everyone in the game's room. A missing room or a
    /// closed one is logged and otherwise ignored.
    pub(crate) async fn broadcast(&self, code: &GameCode, event: ServerEvent) {
        let Some(room) = self.registry.get_room(code).await else {
            tracing::debug!(
                room = %code,
                event = event.kind(),
                "no live room, broadcast skipped"
            );
            return;
        };
        if let Err(e) = room.broadcast(&event).await {
            tracing::warn!(
                room = %code,
                event = event.kind(),
                error = %e,
                "broadcast failed"
            );
        }
    }

    pub(crate) async fn send_to(
        &self,
        code: &GameCode,
        player_id: PlayerId,
        event: ServerEvent,
    ) {
        let Some(room) = self.registry.get_room(code).await else {
            tracing::debug!(
                room = %code,
                %player_id,
                event = event.kind(),
                "no live room, unicast skipped"
            );
            return;
        };
        if let Err(e) = room.send_to(player_id, &event).await {
            tracing::warn!(
                room = %code,
                %player_id,
                event = event.kind(),
                error = %e,
                "unicast failed"
            );
        }
    }
}

pub(crate) fn round_started(round: &Round) -> RoundStarted {
    RoundStarted {
        round_id: round.id,
        question_player_id: round.questioner_id,
        answerer_id: round.answerer_id,
    }
}

pub(crate) fn player_ref(player: &Player) -> PlayerRef {
    PlayerRef {
        id: player.id,
        nickname: player.nickname.clone(),
    }
}

fn question_card(question: &Question) -> QuestionCard {
    QuestionCard {
        level: question.level.as_str().to_owned(),
        content: question.content.clone(),
    }
}
