// TCP server and main event loop for the duel relay.
//
// Architecture: thread-per-reader with a central `mpsc` channel.
//
// - **Listener thread** (`TcpListener::accept()` loop): accepts new TCP
//   connections and sends `InternalEvent::NewConnection` to the main thread.
// - **Reader threads** (one per client): call `framing::read_frame()` in a
//   loop, deserialize `ClientMessage`, and send `InternalEvent::MessageFrom`
//   to the main thread. On error/EOF, send `InternalEvent::Disconnected`.
// - **Main thread**: owns the `Session`, receives events from the channel,
//   and dispatches them. Each event runs to completion before the next is
//   handled, so the session needs no locking. Uses `recv_timeout` against
//   the session's next reset deadline — when the timeout fires, the pending
//   delayed reset is due. This gives us the post-game reset timer without a
//   separate timer thread.
//
// The main thread is the only writer to client TCP streams (via the
// session's send/broadcast helpers). Reader threads only read from streams.
// This avoids concurrent read/write on the same `TcpStream`, which is safe
// on most platforms but fragile.
//
// Shutdown: the main thread checks a `keep_running` flag (set to false by
// `RelayHandle::stop`) and breaks out of the event loop.

use std::io::BufReader;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use gridduel_protocol::framing::{read_frame, write_frame};
use gridduel_protocol::message::{ClientMessage, PROTOCOL_VERSION, ServerMessage};
use gridduel_protocol::types::RelayClientId;

use crate::session::Session;

/// Events sent from listener/reader threads to the main thread.
enum InternalEvent {
    NewConnection {
        stream: TcpStream,
    },
    MessageFrom {
        client_id: RelayClientId,
        message: ClientMessage,
    },
    Disconnected {
        client_id: RelayClientId,
    },
}

/// How long a new connection gets to send its `Hello` frame.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Wakeup cadence for the main loop while no reset is scheduled, so it can
/// notice the `keep_running` flag going false.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Handle returned by `start_relay` to control the running server.
pub struct RelayHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RelayHandle {
    /// Signal the relay to stop and wait for it to shut down.
    pub fn stop(self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread {
            let _ = handle.join();
        }
    }
}

/// Configuration for starting a relay server.
pub struct RelayConfig {
    pub port: u16,
    /// Pause between a game concluding and the board resetting for the next
    /// round.
    pub reset_delay: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            reset_delay: Duration::from_secs(3),
        }
    }
}

/// Start the relay server on a background thread. Returns a handle for
/// stopping it and the actual bound address (useful when port 0 is used
/// to let the OS pick a free port).
pub fn start_relay(config: RelayConfig) -> std::io::Result<(RelayHandle, std::net::SocketAddr)> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", config.port))?;
    let addr = listener.local_addr()?;
    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();

    let thread = thread::spawn(move || {
        run_relay(listener, config, keep_running_clone);
    });

    Ok((
        RelayHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Main relay loop. Runs until `keep_running` is set to false.
fn run_relay(listener: TcpListener, config: RelayConfig, keep_running: Arc<AtomicBool>) {
    let mut session = Session::new(config.reset_delay);

    let (tx, rx): (Sender<InternalEvent>, Receiver<InternalEvent>) = mpsc::channel();

    // Set the listener to non-blocking so the accept thread can check
    // keep_running periodically.
    listener.set_nonblocking(true).ok();

    // Listener thread: accepts new connections.
    let keep_running_listener = keep_running.clone();
    let tx_listener = tx.clone();
    thread::spawn(move || {
        while keep_running_listener.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, _addr)) => {
                    stream.set_nonblocking(false).ok();
                    let _ = tx_listener.send(InternalEvent::NewConnection { stream });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(50));
                }
                Err(_) => break,
            }
        }
    });

    // Main event loop. The receive timeout tracks the scheduled reset
    // deadline so the reset fires on time even with no traffic.
    while keep_running.load(Ordering::SeqCst) {
        let timeout = session
            .next_reset_deadline()
            .map_or(IDLE_POLL, |due| due.saturating_duration_since(Instant::now()));

        match rx.recv_timeout(timeout) {
            Ok(event) => {
                handle_event(&mut session, event, &tx, &keep_running);
                // Drain any additional events that arrived during handling.
                while let Ok(event) = rx.try_recv() {
                    handle_event(&mut session, event, &tx, &keep_running);
                }
                session.fire_due_reset(Instant::now());
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                session.fire_due_reset(Instant::now());
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Dispatch a single event to the session.
fn handle_event(
    session: &mut Session,
    event: InternalEvent,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    match event {
        InternalEvent::NewConnection { stream } => {
            handle_new_connection(session, stream, tx, keep_running);
        }
        InternalEvent::MessageFrom { client_id, message } => {
            handle_message(session, client_id, message);
        }
        InternalEvent::Disconnected { client_id } => {
            session.remove_client(client_id);
        }
    }
}

/// Handle a new TCP connection: read the Hello handshake, register the
/// client with the session (which seats it or marks it an observer), and
/// spawn a reader thread.
fn handle_new_connection(
    session: &mut Session,
    stream: TcpStream,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    // Set a read timeout so the handshake doesn't block forever.
    stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT)).ok();

    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    });

    let hello_bytes = match read_frame(&mut reader) {
        Ok(bytes) => bytes,
        Err(_) => return,
    };

    let hello: ClientMessage = match serde_json::from_slice(&hello_bytes) {
        Ok(msg) => msg,
        Err(_) => return,
    };

    match hello {
        ClientMessage::Hello { protocol_version } => {
            if protocol_version != PROTOCOL_VERSION {
                // Send Rejected and close the connection.
                let rejected = ServerMessage::Rejected {
                    reason: format!(
                        "unsupported protocol version {protocol_version} (expected {PROTOCOL_VERSION})"
                    ),
                };
                if let Ok(json) = serde_json::to_vec(&rejected) {
                    let mut writer = std::io::BufWriter::new(stream);
                    let _ = write_frame(&mut writer, &json);
                }
                return;
            }

            // Try to clone the stream for the session's write half.
            let write_stream = match stream.try_clone() {
                Ok(s) => s,
                Err(_) => return,
            };

            let client_id = session.add_client(write_stream);

            // Clear read timeout for the long-lived reader loop.
            stream.set_read_timeout(None).ok();

            // Spawn a reader thread for this client.
            let tx_reader = tx.clone();
            let keep_running_reader = keep_running.clone();
            thread::spawn(move || {
                reader_loop(reader, client_id, tx_reader, keep_running_reader);
            });
        }
        _ => {
            // Expected Hello as first frame — drop the connection.
        }
    }
}

/// Reader loop for a single client. Runs in its own thread.
fn reader_loop(
    mut reader: BufReader<TcpStream>,
    client_id: RelayClientId,
    tx: Sender<InternalEvent>,
    keep_running: Arc<AtomicBool>,
) {
    while keep_running.load(Ordering::SeqCst) {
        match read_frame(&mut reader) {
            Ok(bytes) => match serde_json::from_slice::<ClientMessage>(&bytes) {
                Ok(ClientMessage::Goodbye) => {
                    let _ = tx.send(InternalEvent::Disconnected { client_id });
                    break;
                }
                Ok(message) => {
                    let _ = tx.send(InternalEvent::MessageFrom { client_id, message });
                }
                Err(_) => {
                    // Malformed frame — disconnect.
                    let _ = tx.send(InternalEvent::Disconnected { client_id });
                    break;
                }
            },
            Err(_) => {
                // Read error or EOF — disconnect.
                let _ = tx.send(InternalEvent::Disconnected { client_id });
                break;
            }
        }
    }
}

/// Handle a client message that isn't Hello or Goodbye (those are handled
/// during connection setup and in the reader loop respectively).
fn handle_message(session: &mut Session, client_id: RelayClientId, message: ClientMessage) {
    match message {
        ClientMessage::Move { cell } => {
            session.handle_move(client_id, cell);
        }
        ClientMessage::Chat { text } => {
            session.chat(client_id, text);
        }
        ClientMessage::Hello { .. } | ClientMessage::Goodbye => {
            // Hello is handled during connection setup, Goodbye in the
            // reader loop.
        }
    }
}
