// Session state for the duel relay.
//
// `Session` is the central data structure that `server.rs` drives. It tracks
// every open connection, which of them hold the two game seats, the board,
// and the delayed-reset schedule. All mutation happens through methods called
// from the server's single-threaded main loop — no internal locking.
//
// Key responsibilities:
// - Seat registry: the first two connections get seats (`X` first, then the
//   opponent of whichever mark is occupied), later arrivals become observers.
// - Turn coordination: a move is applied only if the sender holds the seat
//   whose mark is active and the target cell is free. Illegal attempts are
//   dropped without a reply — the board is never left half-mutated.
// - Lifecycle: any disconnect releases the seat (if held), resets the game,
//   and notifies the remaining participants.
// - Delayed reset: a concluded game schedules a reset tagged with the
//   session epoch. A disconnect bumps the epoch instead of cancelling the
//   schedule; a stale deadline is discarded when it comes due.
//
// Writing to client streams: `Session` holds cloned `TcpStream` write halves
// wrapped in `BufWriter`. The `send_to` / broadcast helpers serialize a
// `ServerMessage` to JSON, frame it, and write it out. Write errors on a
// single client do not crash the relay — the reader thread for that client
// will detect the broken pipe and send a `Disconnected` event.

use std::collections::BTreeMap;
use std::io::BufWriter;
use std::net::TcpStream;
use std::time::{Duration, Instant};

use gridduel_protocol::framing::write_frame;
use gridduel_protocol::message::{BOARD_CELLS, ServerMessage};
use gridduel_protocol::types::{Mark, RelayClientId};

use crate::board::Board;

/// Relay session managing a single duel room.
pub struct Session {
    clients: BTreeMap<RelayClientId, ClientState>,
    next_client_id: u32,
    board: Board,

    // Game epoch, bumped on every reset. A scheduled reset only fires if the
    // epoch it captured still matches.
    epoch: u64,
    pending_reset: Option<PendingReset>,
    reset_delay: Duration,
}

struct ClientState {
    seat: Option<Mark>,
    writer: BufWriter<TcpStream>,
}

#[derive(Clone, Copy)]
struct PendingReset {
    due: Instant,
    epoch: u64,
}

impl Session {
    pub fn new(reset_delay: Duration) -> Self {
        Self {
            clients: BTreeMap::new(),
            next_client_id: 0,
            board: Board::new(),
            epoch: 0,
            pending_reset: None,
            reset_delay,
        }
    }

    /// Register a new connection and assign a seat if one is vacant.
    ///
    /// The first occupant gets `X`; with one seat occupied the newcomer gets
    /// the opponent mark (keeping the markers mutually exclusive even after
    /// a mid-sequence departure); with both occupied the connection stays
    /// open as an observer and is told `RoomFull`.
    ///
    /// The returned `RelayClientId` tags the reader thread for this
    /// connection so subsequent events carry the correct ID.
    pub fn add_client(&mut self, stream: TcpStream) -> RelayClientId {
        let id = RelayClientId(self.next_client_id);
        self.next_client_id += 1;

        let seat = self.vacant_seat();
        self.clients.insert(
            id,
            ClientState {
                seat,
                writer: BufWriter::new(stream),
            },
        );

        match seat {
            Some(mark) => {
                self.send_to(id, &ServerMessage::SeatAssigned { mark });
                if self.seated_count() == 2 {
                    self.broadcast_state();
                } else {
                    self.send_to(id, &ServerMessage::WaitingForOpponent);
                }
            }
            None => {
                self.send_to(id, &ServerMessage::RoomFull);
            }
        }

        id
    }

    /// Remove a connection. With only two seats and no reconnection support,
    /// any departure invalidates the current game — the board is reset even
    /// if the leaver was an observer. Idempotent: removing an unknown ID is
    /// a no-op.
    pub fn remove_client(&mut self, client_id: RelayClientId) {
        if self.clients.remove(&client_id).is_none() {
            return;
        }
        self.reset_game();
        self.broadcast_seated(&ServerMessage::ParticipantLeft { client_id });
        self.broadcast_state();
    }

    /// Handle a move attempt. Illegal attempts — unseated sender, wrong
    /// turn, occupied or out-of-range cell, game already concluded — are
    /// dropped silently: no mutation, no broadcast, no reply.
    pub fn handle_move(&mut self, client_id: RelayClientId, cell: u8) {
        let Some(mark) = self.seat_of(client_id) else {
            return;
        };
        if self.reset_pending() {
            return;
        }
        let index = usize::from(cell);
        if index >= BOARD_CELLS {
            return;
        }
        if mark != self.board.active_mark() || self.board.cell(index).is_some() {
            return;
        }

        self.board.apply_move(index, mark);
        match self.board.evaluate() {
            None => {
                self.board.flip_turn();
                self.broadcast_state();
            }
            Some(outcome) => {
                self.broadcast_state();
                self.broadcast_seated(&ServerMessage::GameConcluded { outcome });
                self.pending_reset = Some(PendingReset {
                    due: Instant::now() + self.reset_delay,
                    epoch: self.epoch,
                });
            }
        }
    }

    /// Relay a chat line to every open connection, observers included.
    /// Chat has no effect on game state.
    pub fn chat(&mut self, from: RelayClientId, text: String) {
        let msg = ServerMessage::ChatBroadcast { from, text };
        self.broadcast_all(&msg);
    }

    /// Fire the scheduled reset if its deadline has passed. A schedule whose
    /// epoch no longer matches (a disconnect already reset that game) is
    /// discarded without effect.
    pub fn fire_due_reset(&mut self, now: Instant) {
        let Some(pending) = self.pending_reset else {
            return;
        };
        if now < pending.due {
            return;
        }
        self.pending_reset = None;
        if pending.epoch != self.epoch {
            return;
        }
        self.reset_game();
        self.broadcast_state();
    }

    /// Deadline of the scheduled reset, if any. Stale schedules are included
    /// so the server loop wakes up once to discard them.
    pub fn next_reset_deadline(&self) -> Option<Instant> {
        self.pending_reset.map(|p| p.due)
    }

    /// The seat held by `client_id`, if any.
    pub fn seat_of(&self, client_id: RelayClientId) -> Option<Mark> {
        self.clients.get(&client_id).and_then(|c| c.seat)
    }

    /// Number of open connections, observers included.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Number of occupied seats (0, 1, or 2).
    pub fn seated_count(&self) -> usize {
        self.clients.values().filter(|c| c.seat.is_some()).count()
    }

    /// Current game epoch. Bumped on every reset.
    pub fn current_epoch(&self) -> u64 {
        self.epoch
    }

    /// True while a concluded game is waiting out its reset delay.
    fn reset_pending(&self) -> bool {
        self.pending_reset
            .is_some_and(|p| p.epoch == self.epoch)
    }

    /// Reset the board and invalidate any scheduled reset for the old game.
    fn reset_game(&mut self) {
        self.epoch += 1;
        self.board.reset();
    }

    /// Pick the seat for a new arrival: `X` on an empty room, otherwise the
    /// opponent of the occupied mark, otherwise none.
    fn vacant_seat(&self) -> Option<Mark> {
        let mut taken = self.clients.values().filter_map(|c| c.seat);
        match (taken.next(), taken.next()) {
            (None, _) => Some(Mark::X),
            (Some(occupied), None) => Some(occupied.opponent()),
            (Some(_), Some(_)) => None,
        }
    }

    /// Broadcast the current board snapshot to the seated participants.
    fn broadcast_state(&mut self) {
        let msg = ServerMessage::GameState {
            board: self.board.cells(),
            active_mark: self.board.active_mark(),
        };
        self.broadcast_seated(&msg);
    }

    /// Broadcast a game event to the seated participants only.
    fn broadcast_seated(&mut self, msg: &ServerMessage) {
        let ids: Vec<RelayClientId> = self
            .clients
            .iter()
            .filter(|(_, c)| c.seat.is_some())
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            self.send_to(id, msg);
        }
    }

    /// Broadcast to every open connection, observers included.
    fn broadcast_all(&mut self, msg: &ServerMessage) {
        let ids: Vec<RelayClientId> = self.clients.keys().copied().collect();
        for id in ids {
            self.send_to(id, msg);
        }
    }

    /// Send a message to a specific connection. Silently ignores write
    /// errors (the reader thread will detect the broken pipe).
    fn send_to(&mut self, client_id: RelayClientId, msg: &ServerMessage) {
        if let Some(client) = self.clients.get_mut(&client_id) {
            let _ = send_message(&mut client.writer, msg);
        }
    }
}

/// Serialize a `ServerMessage` to JSON and write it with length-delimited
/// framing. Returns any I/O error (caller decides whether to log or ignore).
fn send_message(
    writer: &mut BufWriter<TcpStream>,
    msg: &ServerMessage,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_vec(msg)?;
    write_frame(writer, &json)?;
    Ok(())
}
