//! Round decks: one joker hidden among safe cards.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::Card;

/// Builds a shuffled deck of `len` cards containing exactly one joker.
/// An empty deck is returned for `len == 0`.
pub fn generate_deck(len: usize) -> Vec<Card> {
    generate_deck_with(len, &mut rand::rng())
}

/// Like [`generate_deck`], drawing randomness from `rng`.
pub fn generate_deck_with<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<Card> {
    let mut deck = vec![Card::Safe; len];
    if let Some(first) = deck.first_mut() {
        *first = Card::Joker;
    }
    // Fisher-Yates: every position is equally likely to hold the joker.
    deck.shuffle(rng);
    deck
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn jokers(deck: &[Card]) -> usize {
        deck.iter().filter(|c| **c == Card::Joker).count()
    }

    #[test]
    fn test_generate_deck_has_exactly_one_joker() {
        for len in 1..=8 {
            let deck = generate_deck(len);
            assert_eq!(deck.len(), len);
            assert_eq!(jokers(&deck), 1, "deck of {len}: {deck:?}");
        }
    }

    #[test]
    fn test_generate_deck_zero_is_empty() {
        assert!(generate_deck(0).is_empty());
    }

    #[test]
    fn test_generate_deck_with_seed_is_deterministic() {
        let a = generate_deck_with(5, &mut StdRng::seed_from_u64(42));
        let b = generate_deck_with(5, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_joker_position_is_uniform() {
        const TRIALS: usize = 30_000;
        const LEN: usize = 3;
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0usize; LEN];
        for _ in 0..TRIALS {
            let deck = generate_deck_with(LEN, &mut rng);
            let pos = deck.iter().position(|c| *c == Card::Joker).unwrap();
            counts[pos] += 1;
        }
        // Expected 10_000 per slot; 5% tolerance is many standard
        // deviations wide.
        let expected = TRIALS / LEN;
        for (pos, count) in counts.iter().enumerate() {
            let diff = count.abs_diff(expected);
            assert!(
                diff < expected / 20,
                "slot {pos} got {count}, expected about {expected}"
            );
        }
    }
}
