//! Game records and turn logic for Joker.
//!
//! # Key types
//!
//! - [`Store`]: the persistence seam, with [`MemoryStore`] in-process
//! - [`RoundCoordinator`]: the question → answer → draw state machine
//! - [`GameService`] / [`PlayerService`] / [`QuestionService`]: lobby,
//!   membership and question-pool operations
//! - [`GameRules`]: player minimum, deck size, code attempts
//!
//! Everything here is synchronous; the async server layer calls into it
//! and then broadcasts what changed.

mod config;
mod coordinator;
mod deck;
mod error;
mod games;
mod memory;
mod model;
mod players;
mod questions;
mod rotation;
mod store;

pub use config::GameRules;
pub use coordinator::{DrawOutcome, RoundCoordinator};
pub use deck::{generate_deck, generate_deck_with};
pub use error::GameError;
pub use games::{GameService, random_code};
pub use memory::MemoryStore;
pub use model::{
    Card, Entity, Game, GameStatus, GameSummary, Player, PlayerStatus,
    PlayerSummary, Question, QuestionLevel, Round, RoundStatus,
};
pub use players::{LeaveOutcome, PlayerService};
pub use questions::QuestionService;
pub use rotation::{Pair, first_pair, next_pair};
pub use store::{NewRound, RoundUpdate, Store, StoreError};
