// End-to-end integration tests for the duel pipeline.
//
// Each test starts a real relay server and connects real NetClient
// instances (via TestClient), verifying the full path:
// connect → seat → move → validation → broadcast → conclusion → reset.
//
// These tests exercise the same code paths as a live front-end (NetClient
// from the relay crate) — the only test-specific code is the synchronous
// polling wrappers in TestClient.

use std::thread;
use std::time::Duration;

use duel_tests::TestClient;
use gridduel_protocol::message::BOARD_CELLS;
use gridduel_protocol::types::{Mark, Outcome};
use gridduel_relay::server::{RelayConfig, RelayHandle, start_relay};

/// Reset delay for tests. Short enough for fast tests, long enough that a
/// conclusion is observable before the reset broadcast.
const TEST_RESET_DELAY: Duration = Duration::from_millis(150);

/// Start a relay on a random port, connect two participants.
/// Returns the relay handle, the bound address, and both clients with
/// their seating drained.
fn start_test_session() -> (RelayHandle, std::net::SocketAddr, TestClient, TestClient) {
    let config = RelayConfig {
        port: 0,
        reset_delay: TEST_RESET_DELAY,
    };
    let (handle, addr) = start_relay(config).unwrap();
    thread::sleep(Duration::from_millis(50));

    let mut host = TestClient::connect(addr);
    let mut joiner = TestClient::connect(addr);

    // Both sides see the initial empty snapshot once seated.
    let _ = host.wait_for_state();
    let _ = joiner.wait_for_state();

    (handle, addr, host, joiner)
}

/// Play a move and wait for the resulting snapshot on both sides, keeping
/// the relay's event order deterministic. Returns the host-side snapshot.
fn play_and_sync(
    mover: &mut TestClient,
    other: &mut TestClient,
    cell: u8,
) -> ([Option<Mark>; BOARD_CELLS], Mark) {
    mover.send_move(cell);
    let state = mover.wait_for_state();
    let state_other = other.wait_for_state();
    assert_eq!(state, state_other, "participants diverged");
    state
}

#[test]
fn two_player_lifecycle() {
    let (handle, _addr, mut host, mut joiner) = start_test_session();

    assert_eq!(host.seat, Some(Mark::X));
    assert_eq!(joiner.seat, Some(Mark::O));

    // Opening move shows up identically on both sides.
    let (board, active) = play_and_sync(&mut host, &mut joiner, 4);
    assert_eq!(board[4], Some(Mark::X));
    assert_eq!(active, Mark::O);

    host.disconnect();
    joiner.disconnect();
    handle.stop();
}

#[test]
fn top_row_win_and_delayed_reset() {
    let (handle, _addr, mut host, mut joiner) = start_test_session();

    // X: 0, 1, 2 (top row); O: 3, 4 (middle row).
    let _ = play_and_sync(&mut host, &mut joiner, 0);
    let _ = play_and_sync(&mut joiner, &mut host, 3);
    let _ = play_and_sync(&mut host, &mut joiner, 1);
    let _ = play_and_sync(&mut joiner, &mut host, 4);
    let (board, _) = play_and_sync(&mut host, &mut joiner, 2);
    assert_eq!(board[0], Some(Mark::X));
    assert_eq!(board[1], Some(Mark::X));
    assert_eq!(board[2], Some(Mark::X));

    // Both are told X won.
    assert_eq!(
        host.wait_for_conclusion(),
        Outcome::Won { winner: Mark::X }
    );
    assert_eq!(
        joiner.wait_for_conclusion(),
        Outcome::Won { winner: Mark::X }
    );

    // The delayed reset hands both a fresh board with X to move.
    let (board, active) = host.wait_for_state();
    assert_eq!(board, [None; BOARD_CELLS]);
    assert_eq!(active, Mark::X);
    let (board, active) = joiner.wait_for_state();
    assert_eq!(board, [None; BOARD_CELLS]);
    assert_eq!(active, Mark::X);

    host.disconnect();
    joiner.disconnect();
    handle.stop();
}

#[test]
fn filled_board_is_a_draw() {
    let (handle, _addr, mut host, mut joiner) = start_test_session();

    // Alternating sequence with no three-in-a-row.
    let _ = play_and_sync(&mut host, &mut joiner, 0);
    let _ = play_and_sync(&mut joiner, &mut host, 4);
    let _ = play_and_sync(&mut host, &mut joiner, 8);
    let _ = play_and_sync(&mut joiner, &mut host, 1);
    let _ = play_and_sync(&mut host, &mut joiner, 7);
    let _ = play_and_sync(&mut joiner, &mut host, 6);
    let _ = play_and_sync(&mut host, &mut joiner, 2);
    let _ = play_and_sync(&mut joiner, &mut host, 5);
    let (board, _) = play_and_sync(&mut host, &mut joiner, 3);
    assert!(board.iter().all(Option::is_some));

    assert_eq!(host.wait_for_conclusion(), Outcome::Draw);
    assert_eq!(joiner.wait_for_conclusion(), Outcome::Draw);

    host.disconnect();
    joiner.disconnect();
    handle.stop();
}

#[test]
fn out_of_turn_move_is_silently_dropped() {
    let (handle, _addr, mut host, mut joiner) = start_test_session();

    // O tries to open — X is active. Nothing is broadcast.
    joiner.send_move(0);
    host.assert_quiet(Duration::from_millis(150));
    joiner.assert_quiet(Duration::ZERO);

    // X's opening still lands on an empty board.
    let (board, active) = play_and_sync(&mut host, &mut joiner, 0);
    assert_eq!(board[0], Some(Mark::X));
    assert_eq!(board.iter().filter(|c| c.is_some()).count(), 1);
    assert_eq!(active, Mark::O);

    host.disconnect();
    joiner.disconnect();
    handle.stop();
}

#[test]
fn disconnect_mid_game_resets_for_the_remaining_player() {
    let (handle, _addr, mut host, mut joiner) = start_test_session();

    let _ = play_and_sync(&mut host, &mut joiner, 4);

    joiner.disconnect();

    // Host learns of the departure, then receives the reset snapshot.
    let _ = host.wait_for_participant_left();
    let (board, active) = host.wait_for_state();
    assert_eq!(board, [None; BOARD_CELLS]);
    assert_eq!(active, Mark::X);

    host.disconnect();
    handle.stop();
}

#[test]
fn observer_chats_but_cannot_play() {
    let (handle, addr, mut host, mut joiner) = start_test_session();

    let mut observer = TestClient::connect(addr);
    assert_eq!(observer.seat, None);

    // The game carries on without reaching the observer.
    let _ = play_and_sync(&mut host, &mut joiner, 4);
    observer.assert_quiet(Duration::from_millis(150));

    // The observer's move attempt changes nothing.
    observer.send_move(0);
    host.assert_quiet(Duration::from_millis(150));

    // Chat fans out to every connection, the sender included.
    host.send_chat("anyone watching?");
    for client in [&mut host, &mut joiner, &mut observer] {
        let (_, text) = client.wait_for_chat();
        assert_eq!(text, "anyone watching?");
    }

    observer.send_chat("me");
    for client in [&mut host, &mut joiner, &mut observer] {
        let (_, text) = client.wait_for_chat();
        assert_eq!(text, "me");
    }

    observer.disconnect();
    host.disconnect();
    joiner.disconnect();
    handle.stop();
}
