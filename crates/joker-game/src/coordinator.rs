//! The round state machine.
//!
//! Every step validates who is acting and what status the round is in,
//! then writes through a compare-and-set on the store. The coordinator
//! never retries: a lost race surfaces as `InvalidStatus` or
//! `InvalidGameStatus` to the caller.

use std::sync::Arc;

use joker_protocol::{GameId, PlayerId, QuestionId, RoundId};

use crate::deck::generate_deck;
use crate::model::{Card, Game, GameStatus, Player, Question, Round, RoundStatus};
use crate::rotation::{self, Pair};
use crate::store::{NewRound, RoundUpdate, Store};
use crate::{GameError, GameRules};

/// Result of drawing a card.
#[derive(Debug, Clone)]
pub struct DrawOutcome {
    /// The round after the draw (`Revealed` or `Done`).
    pub round: Round,
    /// The card that was drawn.
    pub card: Card,
    /// The question asked this round, for the joker reveal.
    pub question: Option<Question>,
}

impl DrawOutcome {
    pub fn is_joker(&self) -> bool {
        self.card == Card::Joker
    }
}

pub struct RoundCoordinator<S: Store> {
    store: Arc<S>,
    rules: GameRules,
}

impl<S: Store> RoundCoordinator<S> {
    pub fn new(store: Arc<S>, rules: GameRules) -> Self {
        Self { store, rules }
    }

    /// Moves a waiting game to playing and creates its first round.
    ///
    /// # Errors
    /// - [`GameError::InvalidGameStatus`] unless the game is waiting
    /// - [`GameError::NotEnoughPlayers`] below the minimum seat count, or
    ///   with fewer than two players online to pair
    pub fn start_game(&self, game: &Game) -> Result<Round, GameError> {
        if game.status != GameStatus::Waiting {
            return Err(GameError::InvalidGameStatus);
        }
        let seats = self.seats_with_quorum(game.id)?;
        let pair = rotation::first_pair(&seats).ok_or(GameError::NotEnoughPlayers)?;

        self.store
            .transition_game(game.id, GameStatus::Waiting, GameStatus::Playing)?;
        let round = self.create_round(game.id, pair)?;
        tracing::info!(
            code = %game.code,
            round_id = %round.id,
            questioner = %round.questioner_id,
            answerer = %round.answerer_id,
            "game started"
        );
        Ok(round)
    }

    /// The questioner picks the round's question.
    ///
    /// # Errors
    /// - [`GameError::Forbidden`] if `player_id` is not the questioner
    /// - [`GameError::InvalidStatus`] unless waiting for a question
    /// - [`GameError::NotFound`] if the question does not exist
    pub fn submit_question(
        &self,
        round_id: RoundId,
        question_id: QuestionId,
        player_id: PlayerId,
    ) -> Result<Round, GameError> {
        let round = self.store.round(round_id)?;
        if round.questioner_id != player_id {
            return Err(GameError::Forbidden);
        }
        if round.status != RoundStatus::WaitingForQuestion {
            return Err(GameError::InvalidStatus);
        }
        self.store.question(question_id)?;

        let round = self.store.update_round(
            round_id,
            RoundStatus::WaitingForQuestion,
            RoundUpdate::Question(question_id),
        )?;
        tracing::debug!(%round_id, %question_id, "question submitted");
        Ok(round)
    }

    /// The answerer replies.
    ///
    /// # Errors
    /// - [`GameError::Forbidden`] if `player_id` is not the answerer
    /// - [`GameError::InvalidStatus`] unless waiting for an answer
    pub fn submit_answer(
        &self,
        round_id: RoundId,
        answer: &str,
        player_id: PlayerId,
    ) -> Result<Round, GameError> {
        let round = self.store.round(round_id)?;
        if round.answerer_id != player_id {
            return Err(GameError::Forbidden);
        }
        if round.status != RoundStatus::WaitingForAnswer {
            return Err(GameError::InvalidStatus);
        }

        let round = self.store.update_round(
            round_id,
            RoundStatus::WaitingForAnswer,
            RoundUpdate::Answer(answer.to_owned()),
        )?;
        tracing::debug!(%round_id, "answer submitted");
        Ok(round)
    }

    /// The answerer draws card `index`. The joker reveals the round.
    ///
    /// # Errors
    /// - [`GameError::InvalidStatus`] unless waiting for a draw
    /// - [`GameError::Forbidden`] if `player_id` is not the answerer
    /// - [`GameError::InvalidCardIndex`] if `index` is past the deck
    pub fn draw_card(
        &self,
        round_id: RoundId,
        player_id: PlayerId,
        index: usize,
    ) -> Result<DrawOutcome, GameError> {
        let round = self.store.round(round_id)?;
        if round.status != RoundStatus::WaitingForDraw {
            return Err(GameError::InvalidStatus);
        }
        if round.answerer_id != player_id {
            return Err(GameError::Forbidden);
        }
        let card = *round.deck.get(index).ok_or(GameError::InvalidCardIndex {
            index,
            len: round.deck.len(),
        })?;

        let round = self.store.update_round(
            round_id,
            RoundStatus::WaitingForDraw,
            RoundUpdate::Draw {
                is_joker: card == Card::Joker,
            },
        )?;
        let question = round
            .question_id
            .map(|id| self.store.question(id))
            .transpose()?;
        tracing::debug!(%round_id, index, ?card, "card drawn");
        Ok(DrawOutcome {
            round,
            card,
            question,
        })
    }

    /// Starts the round after the current one, rotating the pair.
    ///
    /// # Errors
    /// - [`GameError::InvalidGameStatus`] unless the game is playing
    /// - [`GameError::NotEnoughPlayers`] below the minimum seat count, or
    ///   with fewer than two players online to pair
    /// - [`GameError::InvalidStatus`] if the last round is still running
    pub fn create_next_round(&self, game: &Game) -> Result<Round, GameError> {
        if game.status != GameStatus::Playing {
            return Err(GameError::InvalidGameStatus);
        }
        let seats = self.seats_with_quorum(game.id)?;

        let pair = match self.store.last_round(game.id)? {
            Some(last) if !last.status.is_terminal() => {
                return Err(GameError::InvalidStatus);
            }
            Some(last) => rotation::next_pair(&seats, last.questioner_id),
            None => rotation::first_pair(&seats),
        }
        .ok_or(GameError::NotEnoughPlayers)?;

        let round = self.create_round(game.id, pair)?;
        tracing::info!(
            code = %game.code,
            round_id = %round.id,
            questioner = %round.questioner_id,
            answerer = %round.answerer_id,
            "next round"
        );
        Ok(round)
    }

    /// Abandons `round_id` (if still running) and starts the next round.
    ///
    /// # Errors
    /// Whatever [`create_next_round`](Self::create_next_round) reports,
    /// notably [`GameError::NotEnoughPlayers`].
    pub fn skip_round(&self, game: &Game, round_id: RoundId) -> Result<Round, GameError> {
        let round = self.store.round(round_id)?;
        if !round.status.is_terminal() {
            self.store
                .update_round(round_id, round.status, RoundUpdate::Skip)?;
            tracing::info!(code = %game.code, %round_id, "round skipped");
        }
        self.create_next_round(game)
    }

    pub fn round(&self, round_id: RoundId) -> Result<Round, GameError> {
        Ok(self.store.round(round_id)?)
    }

    /// The latest round of a game, finished or not.
    pub fn current_round(&self, game_id: GameId) -> Result<Option<Round>, GameError> {
        Ok(self.store.last_round(game_id)?)
    }

    /// All seats of a game, provided there are enough of them. Offline
    /// players keep their seat and count toward the minimum.
    fn seats_with_quorum(&self, game_id: GameId) -> Result<Vec<Player>, GameError> {
        let seats = self.store.players_in_game(game_id)?;
        if seats.len() < self.rules.min_players {
            return Err(GameError::NotEnoughPlayers);
        }
        Ok(seats)
    }

    fn create_round(&self, game_id: GameId, pair: Pair) -> Result<Round, GameError> {
        Ok(self.store.create_round(NewRound {
            game_id,
            questioner_id: pair.questioner,
            answerer_id: pair.answerer,
            deck: generate_deck(self.rules.deck_len),
        })?)
    }
}
