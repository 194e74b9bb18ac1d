//! Tunable game rules.

/// Rules shared by the game services and the round coordinator.
#[derive(Debug, Clone)]
pub struct GameRules {
    /// Online players needed to start a game or begin another round.
    pub min_players: usize,

    /// Cards per round deck (one of them is the joker).
    pub deck_len: usize,

    /// How many random codes to try before giving up on `create_game`.
    pub code_attempts: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            min_players: 3,
            deck_len: 3,
            code_attempts: 10,
        }
    }
}
