// TCP client for connecting to the duel relay.
//
// Provides a non-blocking interface for a front-end's main thread to
// communicate with the relay. Architecture:
// - `connect()` performs TCP connect + Hello handshake on the calling
//   thread, then spawns a background reader thread.
// - The reader thread calls `read_frame()` in a loop, deserializes
//   `ServerMessage`, and pushes into an `mpsc` channel.
// - The main thread holds a `BufWriter<TcpStream>` for sending.
// - `poll()` drains the inbox non-blocking, returning all queued messages.
//
// This separation ensures the caller never blocks on network I/O. The
// reader thread handles the blocking reads, and the writer flushes
// synchronously (acceptable for the small messages we send).
//
// This module lives in the relay crate because it is purely std TCP +
// protocol framing + mpsc — any front-end (and the integration tests) can
// use it without extra dependencies.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gridduel_protocol::framing::{read_frame, write_frame};
use gridduel_protocol::message::{ClientMessage, PROTOCOL_VERSION, ServerMessage};
use gridduel_protocol::types::Mark;

/// TCP client for relay communication.
pub struct NetClient {
    writer: BufWriter<TcpStream>,
    inbox: Receiver<ServerMessage>,
    _reader_thread: Option<JoinHandle<()>>,
    seat: Option<Mark>,
}

impl NetClient {
    /// Connect to a relay, perform the Hello handshake, and spawn a reader
    /// thread. Returns the client on success; its `seat()` is the assigned
    /// mark, or `None` when the room was full and this connection is an
    /// observer.
    pub fn connect(addr: &str) -> Result<Self, String> {
        // TCP connect.
        let stream = TcpStream::connect(addr).map_err(|e| format!("connect failed: {e}"))?;

        // Set a read timeout for the handshake.
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .ok();

        let reader_stream = stream
            .try_clone()
            .map_err(|e| format!("clone failed: {e}"))?;
        let mut writer = BufWriter::new(stream);

        // Send Hello.
        let hello = ClientMessage::Hello {
            protocol_version: PROTOCOL_VERSION,
        };
        send_msg(&mut writer, &hello).map_err(|e| format!("send Hello failed: {e}"))?;

        // The first frame back settles our role: seated, observer, or out.
        let mut reader = BufReader::new(reader_stream);
        let response_bytes =
            read_frame(&mut reader).map_err(|e| format!("read handshake reply failed: {e}"))?;
        let response: ServerMessage = serde_json::from_slice(&response_bytes)
            .map_err(|e| format!("parse handshake reply failed: {e}"))?;

        let seat = match response {
            ServerMessage::SeatAssigned { mark } => Some(mark),
            ServerMessage::RoomFull => None,
            ServerMessage::Rejected { reason } => {
                return Err(format!("rejected: {reason}"));
            }
            other => {
                return Err(format!("unexpected response: {other:?}"));
            }
        };

        // Clear read timeout for the long-lived reader loop.
        if let Ok(inner) = reader.get_ref().try_clone() {
            inner.set_read_timeout(None).ok();
        }

        // Spawn reader thread.
        let (tx, rx) = mpsc::channel();
        let reader_thread = thread::spawn(move || {
            reader_loop(reader, tx);
        });

        Ok(Self {
            writer,
            inbox: rx,
            _reader_thread: Some(reader_thread),
            seat,
        })
    }

    /// The mark this connection plays, or `None` for an observer.
    pub fn seat(&self) -> Option<Mark> {
        self.seat
    }

    /// Attempt to claim a cell (row-major index 0..8).
    pub fn send_move(&mut self, cell: u8) -> Result<(), String> {
        let msg = ClientMessage::Move { cell };
        send_msg(&mut self.writer, &msg).map_err(|e| format!("send Move failed: {e}"))
    }

    /// Send a chat line.
    pub fn send_chat(&mut self, text: &str) -> Result<(), String> {
        let msg = ClientMessage::Chat { text: text.into() };
        send_msg(&mut self.writer, &msg).map_err(|e| format!("send Chat failed: {e}"))
    }

    /// Send Goodbye and let the relay drop this connection.
    pub fn disconnect(&mut self) {
        let _ = send_msg(&mut self.writer, &ClientMessage::Goodbye);
    }

    /// Drain all queued server messages (non-blocking).
    pub fn poll(&self) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.inbox.try_recv() {
            messages.push(msg);
        }
        messages
    }
}

/// Serialize a `ClientMessage` to JSON and write with length-delimited
/// framing.
fn send_msg(writer: &mut BufWriter<TcpStream>, msg: &ClientMessage) -> Result<(), String> {
    let json = serde_json::to_vec(msg).map_err(|e| e.to_string())?;
    write_frame(writer, &json).map_err(|e| e.to_string())
}

/// Reader thread: read framed messages in a loop, push to channel.
fn reader_loop(mut reader: BufReader<TcpStream>, tx: mpsc::Sender<ServerMessage>) {
    while let Ok(bytes) = read_frame(&mut reader) {
        match serde_json::from_slice::<ServerMessage>(&bytes) {
            Ok(msg) => {
                if tx.send(msg).is_err() {
                    break; // Main thread dropped the receiver
                }
            }
            Err(_) => break, // Malformed message
        }
    }
}
