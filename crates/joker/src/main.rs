use std::sync::Arc;

use joker::{JokerError, JokerServerBuilder, ServerConfig};
use joker_game::{MemoryStore, QuestionLevel, Store};
use tracing_subscriber::EnvFilter;

const STARTER_QUESTIONS: &[(QuestionLevel, &str)] = &[
    (QuestionLevel::Normal, "What was your most embarrassing moment at school?"),
    (QuestionLevel::Normal, "Which song do you secretly know every word of?"),
    (QuestionLevel::Normal, "What is the worst gift you ever received?"),
    (QuestionLevel::Normal, "Who in this room would survive longest on a desert island?"),
    (QuestionLevel::Spicy, "What is the biggest lie you have told a friend?"),
    (QuestionLevel::Spicy, "Who was your first crush?"),
    (QuestionLevel::Spicy, "What would you never want your parents to find out?"),
];

#[tokio::main]
async fn main() -> Result<(), JokerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let store = Arc::new(MemoryStore::new());
    for (level, content) in STARTER_QUESTIONS {
        store
            .create_question(*level, content)
            .map_err(joker_game::GameError::from)?;
    }

    let server = JokerServerBuilder::new().config(config).build(store).await?;
    if let Ok(addr) = server.local_addr() {
        tracing::info!(%addr, questions = STARTER_QUESTIONS.len(), "listening");
    }
    server.run().await
}
