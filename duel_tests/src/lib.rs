// Test-only client for duel integration tests.
//
// Wraps the real `NetClient` (from `gridduel_relay::client`) to provide a
// synchronous, test-friendly API for exercising the full pipeline:
// connect → seat → move → broadcast → conclusion → reset.
//
// The only test-specific code here is the blocking polling wrappers
// (loops around `NetClient::poll()` plus a pending queue, so messages that
// arrive in the same batch as a match are not lost). All networking uses
// the same code paths as a real front-end.
//
// See also: `tests/full_pipeline.rs` for the integration test scenarios.

use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

use gridduel_protocol::message::{BOARD_CELLS, ServerMessage};
use gridduel_protocol::types::{Mark, Outcome, RelayClientId};
use gridduel_relay::client::NetClient;

/// Default timeout for blocking poll operations.
const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Sleep duration between poll attempts.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A test client wrapping a real NetClient.
pub struct TestClient {
    client: NetClient,
    pending: VecDeque<ServerMessage>,
    pub seat: Option<Mark>,
}

impl TestClient {
    /// Connect to a relay and perform the Hello handshake.
    pub fn connect(addr: std::net::SocketAddr) -> Self {
        let addr_str = addr.to_string();
        let client = NetClient::connect(&addr_str).expect("TestClient::connect failed");
        let seat = client.seat();
        Self {
            client,
            pending: VecDeque::new(),
            seat,
        }
    }

    /// Attempt to claim a cell.
    pub fn send_move(&mut self, cell: u8) {
        self.client.send_move(cell).expect("send_move failed");
    }

    /// Send a chat line.
    pub fn send_chat(&mut self, text: &str) {
        self.client.send_chat(text).expect("send_chat failed");
    }

    /// Send Goodbye and close the connection.
    pub fn disconnect(&mut self) {
        self.client.disconnect();
    }

    /// Return all received-but-unprocessed server messages.
    pub fn poll_raw(&mut self) -> Vec<ServerMessage> {
        let mut messages: Vec<ServerMessage> = self.pending.drain(..).collect();
        messages.extend(self.client.poll());
        messages
    }

    /// Blocking poll until a `GameState` arrives. Earlier non-matching
    /// messages are discarded. Returns (board, active mark).
    pub fn wait_for_state(&mut self) -> ([Option<Mark>; BOARD_CELLS], Mark) {
        match self.wait_for(|msg| matches!(msg, ServerMessage::GameState { .. })) {
            ServerMessage::GameState { board, active_mark } => (board, active_mark),
            _ => unreachable!(),
        }
    }

    /// Blocking poll until a `GameConcluded` arrives.
    pub fn wait_for_conclusion(&mut self) -> Outcome {
        match self.wait_for(|msg| matches!(msg, ServerMessage::GameConcluded { .. })) {
            ServerMessage::GameConcluded { outcome } => outcome,
            _ => unreachable!(),
        }
    }

    /// Blocking poll until a `ChatBroadcast` arrives. Returns (sender, text).
    pub fn wait_for_chat(&mut self) -> (RelayClientId, String) {
        match self.wait_for(|msg| matches!(msg, ServerMessage::ChatBroadcast { .. })) {
            ServerMessage::ChatBroadcast { from, text } => (from, text),
            _ => unreachable!(),
        }
    }

    /// Blocking poll until a `ParticipantLeft` arrives.
    pub fn wait_for_participant_left(&mut self) -> RelayClientId {
        match self.wait_for(|msg| matches!(msg, ServerMessage::ParticipantLeft { .. })) {
            ServerMessage::ParticipantLeft { client_id } => client_id,
            _ => unreachable!(),
        }
    }

    /// Collect everything that arrives within `window` and assert it is
    /// nothing at all. Used to verify silent-drop behavior.
    pub fn assert_quiet(&mut self, window: Duration) {
        thread::sleep(window);
        let messages = self.poll_raw();
        assert!(messages.is_empty(), "expected silence, got {messages:?}");
    }

    /// Blocking poll until a message matches `pred`. Non-matching messages
    /// ahead of the match are discarded; anything behind it stays queued
    /// for the next wait.
    fn wait_for<F>(&mut self, pred: F) -> ServerMessage
    where
        F: Fn(&ServerMessage) -> bool,
    {
        let start = Instant::now();
        loop {
            assert!(
                start.elapsed() < POLL_TIMEOUT,
                "timed out waiting for a matching message"
            );
            self.pending.extend(self.client.poll());
            while let Some(msg) = self.pending.pop_front() {
                if pred(&msg) {
                    return msg;
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}
