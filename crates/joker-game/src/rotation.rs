//! Turn rotation over the seat order.
//!
//! Seats are players in join order (ascending id). Offline players keep
//! their seat but are skipped when choosing who asks and who answers.

use joker_protocol::PlayerId;

use crate::model::Player;

/// Questioner and answerer of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair {
    pub questioner: PlayerId,
    pub answerer: PlayerId,
}

/// The first round's pair: the first two online seats.
///
/// Returns `None` if fewer than two players are online.
pub fn first_pair(seats: &[Player]) -> Option<Pair> {
    let mut online = seats.iter().filter(|p| p.is_online());
    let questioner = online.next()?.id;
    let answerer = online.next()?.id;
    Some(Pair {
        questioner,
        answerer,
    })
}

/// The pair following a round asked by `previous_questioner`.
///
/// Walking forward from the previous questioner's seat, the next online
/// seat asks and the one after it answers. With everyone online this is
/// seats `(i+1) % n` and `(i+2) % n`. Falls back to [`first_pair`] if the
/// previous questioner no longer has a seat.
pub fn next_pair(seats: &[Player], previous_questioner: PlayerId) -> Option<Pair> {
    let Some(start) = seats.iter().position(|p| p.id == previous_questioner)
    else {
        return first_pair(seats);
    };
    let n = seats.len();
    let mut order = (1..=n)
        .map(|step| &seats[(start + step) % n])
        .filter(|p| p.is_online());
    let questioner = order.next()?.id;
    let answerer = order.next()?.id;
    Some(Pair {
        questioner,
        answerer,
    })
}
