// Protocol messages for client-relay communication.
//
// Two enums define the full protocol vocabulary:
// - `ClientMessage`: sent by clients to the relay.
// - `ServerMessage`: sent by the relay to clients.
//
// All types derive `Serialize`/`Deserialize` for JSON framing (see
// `framing.rs`). The relay is game-authoritative: clients send bare move
// indices and the relay replies with full board snapshots, so a client
// needs no game logic beyond rendering the snapshot.

use serde::{Deserialize, Serialize};

use crate::types::{Mark, Outcome, RelayClientId};

/// Protocol version advertised in `Hello`. The relay rejects handshakes
/// that advertise a different version.
pub const PROTOCOL_VERSION: u32 = 1;

/// Number of cells on the board; the fixed length of every `GameState`
/// board snapshot.
pub const BOARD_CELLS: usize = 9;

/// Messages sent by a client to the relay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Handshake. Must be the first frame on a new connection.
    Hello { protocol_version: u32 },
    /// Claim a cell (row-major index 0..8).
    Move { cell: u8 },
    /// Chat line, relayed verbatim to every open connection.
    Chat { text: String },
    /// Client is leaving gracefully.
    Goodbye,
}

/// Messages sent by the relay to a client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Sent to a newly seated connection: this is your marker.
    SeatAssigned { mark: Mark },
    /// Sent to a lone seated connection until an opponent arrives.
    WaitingForOpponent,
    /// Both seats are taken. The connection stays open as an observer
    /// (chat relay only, no game events).
    RoomFull,
    /// Handshake failed; the relay closes the connection after this.
    Rejected { reason: String },
    /// Full board snapshot, broadcast to seated participants after every
    /// accepted move and after every reset.
    GameState {
        board: [Option<Mark>; BOARD_CELLS],
        active_mark: Mark,
    },
    /// The game just ended; a fresh `GameState` follows after the relay's
    /// reset delay.
    GameConcluded { outcome: Outcome },
    /// A connection dropped. The game has been reset.
    ParticipantLeft { client_id: RelayClientId },
    /// Chat from another connection.
    ChatBroadcast { from: RelayClientId, text: String },
}
