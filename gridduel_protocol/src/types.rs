// Core marker and ID types for the duel protocol.
//
// These are lightweight types used by both `message.rs` (protocol messages)
// and the relay's session management (`gridduel_relay::session`). The relay
// assigns compact integer IDs to connections for efficient wire
// representation — clients treat them as opaque.

use serde::{Deserialize, Serialize};

/// Relay-assigned connection ID (compact u32). Opaque to clients; the relay
/// uses it to tag chat relays and departure notices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelayClientId(pub u32);

/// One of the two mutually exclusive cell markers. `X` always moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The other marker.
    #[must_use]
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// Terminal classification of a finished game. An ongoing game has no
/// outcome — the relay's board evaluation returns `Option<Outcome>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won { winner: Mark },
    Draw,
}
