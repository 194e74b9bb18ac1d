//! In-memory [`Store`] used by tests and the demo server.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use joker_protocol::{GameCode, GameId, PlayerId, QuestionId, RoundId};

use crate::model::{
    Entity, Game, GameStatus, Player, PlayerStatus, Question, QuestionLevel,
    Round, RoundStatus,
};
use crate::store::{NewRound, RoundUpdate, Store, StoreError};

#[derive(Default)]
struct Tables {
    next_id: u64,
    games: BTreeMap<GameId, Game>,
    players: BTreeMap<PlayerId, Player>,
    rounds: BTreeMap<RoundId, Round>,
    questions: BTreeMap<QuestionId, Question>,
}

impl Tables {
    /// Ids come from one counter so every id is fresh and ascending.
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn game_mut(&mut self, id: GameId) -> Result<&mut Game, StoreError> {
        self.games.get_mut(&id).ok_or(StoreError::NotFound(Entity::Game))
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, StoreError> {
        self.players
            .get_mut(&id)
            .ok_or(StoreError::NotFound(Entity::Player))
    }
}

/// A [`Store`] backed by ordered maps behind one `RwLock`.
///
/// Every trait call takes the lock once, so each compare-and-set is
/// atomic with respect to every other call.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

impl Store for MemoryStore {
    fn create_game(&self, code: &GameCode) -> Result<Game, StoreError> {
        let mut t = self.write()?;
        if t.games.values().any(|g| &g.code == code) {
            return Err(StoreError::DuplicateCode);
        }
        let game = Game {
            id: GameId(t.next_id()),
            code: code.clone(),
            status: GameStatus::Waiting,
        };
        t.games.insert(game.id, game.clone());
        Ok(game)
    }

    fn game(&self, id: GameId) -> Result<Game, StoreError> {
        self.read()?
            .games
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(Entity::Game))
    }

    fn game_by_code(&self, code: &GameCode) -> Result<Game, StoreError> {
        self.read()?
            .games
            .values()
            .find(|g| &g.code == code)
            .cloned()
            .ok_or(StoreError::NotFound(Entity::Game))
    }

    fn code_exists(&self, code: &GameCode) -> Result<bool, StoreError> {
        Ok(self.read()?.games.values().any(|g| &g.code == code))
    }

    fn transition_game(
        &self,
        id: GameId,
        from: GameStatus,
        to: GameStatus,
    ) -> Result<Game, StoreError> {
        let mut t = self.write()?;
        let game = t.game_mut(id)?;
        if game.status != from {
            return Err(StoreError::StaleGame {
                expected: from,
                actual: game.status,
            });
        }
        game.status = to;
        Ok(game.clone())
    }

    fn create_player(
        &self,
        game_id: GameId,
        nickname: &str,
        is_host: bool,
    ) -> Result<Player, StoreError> {
        let mut t = self.write()?;
        if !t.games.contains_key(&game_id) {
            return Err(StoreError::NotFound(Entity::Game));
        }
        if t
            .players
            .values()
            .any(|p| p.game_id == game_id && p.nickname == nickname)
        {
            return Err(StoreError::DuplicateNickname);
        }
        let player = Player {
            id: PlayerId(t.next_id()),
            game_id,
            nickname: nickname.to_owned(),
            is_host,
            status: PlayerStatus::Online,
        };
        t.players.insert(player.id, player.clone());
        Ok(player)
    }

    fn player(&self, id: PlayerId) -> Result<Player, StoreError> {
        self.read()?
            .players
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(Entity::Player))
    }

    fn players_in_game(&self, game_id: GameId) -> Result<Vec<Player>, StoreError> {
        Ok(self
            .read()?
            .players
            .values()
            .filter(|p| p.game_id == game_id)
            .cloned()
            .collect())
    }

    fn delete_player(&self, id: PlayerId) -> Result<(), StoreError> {
        self.write()?
            .players
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(Entity::Player))
    }

    fn set_player_status(
        &self,
        id: PlayerId,
        status: PlayerStatus,
    ) -> Result<Player, StoreError> {
        let mut t = self.write()?;
        let player = t.player_mut(id)?;
        player.status = status;
        Ok(player.clone())
    }

    fn set_host(&self, id: PlayerId, is_host: bool) -> Result<Player, StoreError> {
        let mut t = self.write()?;
        let player = t.player_mut(id)?;
        player.is_host = is_host;
        Ok(player.clone())
    }

    fn create_round(&self, new: NewRound) -> Result<Round, StoreError> {
        let mut t = self.write()?;
        if !t.games.contains_key(&new.game_id) {
            return Err(StoreError::NotFound(Entity::Game));
        }
        if t
            .rounds
            .values()
            .any(|r| r.game_id == new.game_id && !r.status.is_terminal())
        {
            return Err(StoreError::ActiveRound(new.game_id));
        }
        let round = Round {
            id: RoundId(t.next_id()),
            game_id: new.game_id,
            questioner_id: new.questioner_id,
            answerer_id: new.answerer_id,
            deck: new.deck,
            question_id: None,
            answer: None,
            is_joker: false,
            status: RoundStatus::WaitingForQuestion,
        };
        t.rounds.insert(round.id, round.clone());
        Ok(round)
    }

    fn round(&self, id: RoundId) -> Result<Round, StoreError> {
        self.read()?
            .rounds
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(Entity::Round))
    }

    fn last_round(&self, game_id: GameId) -> Result<Option<Round>, StoreError> {
        Ok(self
            .read()?
            .rounds
            .values()
            .rev()
            .find(|r| r.game_id == game_id)
            .cloned())
    }

    fn rounds_in_game(&self, game_id: GameId) -> Result<Vec<Round>, StoreError> {
        Ok(self
            .read()?
            .rounds
            .values()
            .filter(|r| r.game_id == game_id)
            .cloned()
            .collect())
    }

    fn update_round(
        &self,
        id: RoundId,
        expected: RoundStatus,
        update: RoundUpdate,
    ) -> Result<Round, StoreError> {
        let mut t = self.write()?;
        let round = t
            .rounds
            .get_mut(&id)
            .ok_or(StoreError::NotFound(Entity::Round))?;
        if round.status != expected {
            return Err(StoreError::StaleRound {
                expected,
                actual: round.status,
            });
        }
        update.apply(round);
        Ok(round.clone())
    }

    fn create_question(
        &self,
        level: QuestionLevel,
        content: &str,
    ) -> Result<Question, StoreError> {
        let mut t = self.write()?;
        let question = Question {
            id: QuestionId(t.next_id()),
            level,
            content: content.to_owned(),
        };
        t.questions.insert(question.id, question.clone());
        Ok(question)
    }

    fn question(&self, id: QuestionId) -> Result<Question, StoreError> {
        self.read()?
            .questions
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(Entity::Question))
    }

    fn questions(&self) -> Result<Vec<Question>, StoreError> {
        Ok(self.read()?.questions.values().cloned().collect())
    }
}
