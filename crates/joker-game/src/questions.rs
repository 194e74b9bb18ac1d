//! The question pool.

use std::sync::Arc;

use joker_protocol::QuestionId;
use rand::seq::IndexedRandom;

use crate::GameError;
use crate::model::{Question, QuestionLevel};
use crate::store::Store;

pub struct QuestionService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> QuestionService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn add_question(
        &self,
        level: QuestionLevel,
        content: &str,
    ) -> Result<Question, GameError> {
        Ok(self.store.create_question(level, content)?)
    }

    pub fn question(&self, id: QuestionId) -> Result<Question, GameError> {
        Ok(self.store.question(id)?)
    }

    /// Up to `limit` distinct questions in random order, offered to the
    /// questioner to pick from.
    pub fn random_questions(&self, limit: usize) -> Result<Vec<Question>, GameError> {
        let pool = self.store.questions()?;
        Ok(pool
            .choose_multiple(&mut rand::rng(), limit)
            .cloned()
            .collect())
    }
}
