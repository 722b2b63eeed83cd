// gridduel_protocol — wire protocol for the tic-tac-toe relay.
//
// This crate defines the message types, framing, and serialization used by
// the relay server (`gridduel_relay`) and its clients to communicate over
// TCP. It is shared between both sides and carries no game logic — the
// relay is the game authority, clients render the snapshots it broadcasts.
//
// Module overview:
// - `types.rs`:    Core types — `RelayClientId`, `Mark`, `Outcome`.
// - `message.rs`:  Client-to-relay and relay-to-client message enums.
// - `framing.rs`:  Length-delimited framing over any `Read`/`Write` stream:
//                  4-byte big-endian length prefix, then JSON payload.
//
// Design decisions:
// - **JSON serialization.** Messages are tiny and infrequent; readability on
//   the wire beats compactness here. Binary framing can be swapped in later.
// - **No async runtime.** Uses `std::io::Read`/`Write` for framing,
//   compatible with both blocking TCP streams and buffered wrappers.

pub mod framing;
pub mod message;
pub mod types;

pub use framing::{MAX_FRAME_SIZE, read_frame, write_frame};
pub use message::{BOARD_CELLS, ClientMessage, PROTOCOL_VERSION, ServerMessage};
pub use types::{Mark, Outcome, RelayClientId};

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// Serialize a ClientMessage to JSON, frame it, read it back, deserialize.
    fn client_roundtrip(msg: &ClientMessage) {
        let json = serde_json::to_vec(msg).unwrap();
        let mut wire = Vec::new();
        write_frame(&mut wire, &json).unwrap();

        let mut cursor = Cursor::new(&wire);
        let recovered_json = read_frame(&mut cursor).unwrap();
        let recovered: ClientMessage = serde_json::from_slice(&recovered_json).unwrap();
        assert_eq!(&recovered, msg);
    }

    /// Serialize a ServerMessage to JSON, frame it, read it back, deserialize.
    fn server_roundtrip(msg: &ServerMessage) {
        let json = serde_json::to_vec(msg).unwrap();
        let mut wire = Vec::new();
        write_frame(&mut wire, &json).unwrap();

        let mut cursor = Cursor::new(&wire);
        let recovered_json = read_frame(&mut cursor).unwrap();
        let recovered: ServerMessage = serde_json::from_slice(&recovered_json).unwrap();
        assert_eq!(&recovered, msg);
    }

    #[test]
    fn roundtrip_hello() {
        client_roundtrip(&ClientMessage::Hello {
            protocol_version: PROTOCOL_VERSION,
        });
    }

    #[test]
    fn roundtrip_move() {
        client_roundtrip(&ClientMessage::Move { cell: 4 });
    }

    #[test]
    fn roundtrip_chat() {
        client_roundtrip(&ClientMessage::Chat {
            text: "good luck!".into(),
        });
    }

    #[test]
    fn roundtrip_goodbye() {
        client_roundtrip(&ClientMessage::Goodbye);
    }

    #[test]
    fn roundtrip_seat_assigned() {
        server_roundtrip(&ServerMessage::SeatAssigned { mark: Mark::X });
        server_roundtrip(&ServerMessage::SeatAssigned { mark: Mark::O });
    }

    #[test]
    fn roundtrip_waiting_for_opponent() {
        server_roundtrip(&ServerMessage::WaitingForOpponent);
    }

    #[test]
    fn roundtrip_room_full() {
        server_roundtrip(&ServerMessage::RoomFull);
    }

    #[test]
    fn roundtrip_rejected() {
        server_roundtrip(&ServerMessage::Rejected {
            reason: "unsupported protocol version".into(),
        });
    }

    #[test]
    fn roundtrip_game_state_empty_board() {
        server_roundtrip(&ServerMessage::GameState {
            board: [None; BOARD_CELLS],
            active_mark: Mark::X,
        });
    }

    #[test]
    fn roundtrip_game_state_mid_game() {
        let mut board = [None; BOARD_CELLS];
        board[0] = Some(Mark::X);
        board[4] = Some(Mark::O);
        board[8] = Some(Mark::X);
        server_roundtrip(&ServerMessage::GameState {
            board,
            active_mark: Mark::O,
        });
    }

    #[test]
    fn roundtrip_game_concluded_won() {
        server_roundtrip(&ServerMessage::GameConcluded {
            outcome: Outcome::Won { winner: Mark::O },
        });
    }

    #[test]
    fn roundtrip_game_concluded_draw() {
        server_roundtrip(&ServerMessage::GameConcluded {
            outcome: Outcome::Draw,
        });
    }

    #[test]
    fn roundtrip_participant_left() {
        server_roundtrip(&ServerMessage::ParticipantLeft {
            client_id: RelayClientId(2),
        });
    }

    #[test]
    fn roundtrip_chat_broadcast() {
        server_roundtrip(&ServerMessage::ChatBroadcast {
            from: RelayClientId(0),
            text: "rematch?".into(),
        });
    }
}
