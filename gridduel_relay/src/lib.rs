// gridduel_relay — relay server for two-player tic-tac-toe duels.
//
// The relay is game-authoritative: it seats the first two connections,
// validates every move against seat identity, turn ownership, and cell
// vacancy, detects wins and draws, and broadcasts full board snapshots.
// Later arrivals stay connected as observers with access to the chat
// channel multiplexed over the same connection. When any connection drops,
// the game in progress is discarded and the remaining participants are
// notified.
//
// Module overview:
// - `board.rs`:    The 3x3 grid, active mark, and win/draw evaluation.
// - `session.rs`:  Seat registry, turn coordination, disconnect lifecycle,
//                  and the epoch-guarded delayed reset. The core data
//                  structure that `server.rs` drives.
// - `server.rs`:   TCP listener, reader threads (one per client), and the
//                  main event loop. Uses `std::net` with a thread-per-reader
//                  architecture and an `mpsc` channel to funnel events into
//                  the single-threaded `Session`.
// - `client.rs`:   Blocking TCP client (`NetClient`) for front-ends and
//                  integration tests.
//
// Dependencies: `gridduel_protocol` (shared message types and framing).
//
// The relay can run as a standalone binary (`main.rs`) or be embedded in a
// host process via the library API (`start_relay`).

pub mod board;
pub mod client;
pub mod server;
pub mod session;

pub use server::start_relay;
