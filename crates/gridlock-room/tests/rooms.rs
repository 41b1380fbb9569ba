//! Integration tests for the registry and room actors, observed through
//! broadcast receivers.

use std::time::Duration;

use gridlock_board::{Board, Mark};
use gridlock_protocol::{Occupant, RoomCode, ServerEvent};
use gridlock_room::{EventSender, GamePhase, RoomError, RoomRegistry};
use gridlock_transport::ConnectionId;
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn conn(id: u64) -> ConnectionId {
    ConnectionId::new(id)
}

fn observer() -> (EventSender, mpsc::UnboundedReceiver<ServerEvent>) {
    mpsc::unbounded_channel()
}

async fn recv(
    rx: &mut mpsc::UnboundedReceiver<ServerEvent>,
) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Asserts the alternation invariant: never more X cells than O+1,
/// never fewer.
fn assert_alternation(board: &Board) {
    let x = board.count(Mark::X);
    let o = board.count(Mark::O);
    assert!(
        x == o || x == o + 1,
        "alternation violated: {x} X vs {o} O"
    );
}

/// Creates a two-player room (conns 1 and 2 seated X and O) and drains
/// the setup broadcasts.
async fn setup_pvp(
    reg: &mut RoomRegistry,
) -> (
    RoomCode,
    mpsc::UnboundedReceiver<ServerEvent>,
    mpsc::UnboundedReceiver<ServerEvent>,
) {
    let (tx1, mut rx1) = observer();
    let (code, mark) = reg.create(conn(1), tx1, false).expect("create");
    assert_eq!(mark, Mark::X);

    let (tx2, mut rx2) = observer();
    let (joined_code, mark2) = reg
        .join(code.as_str(), conn(2), tx2)
        .await
        .expect("join");
    assert_eq!(joined_code, code);
    assert_eq!(mark2, Mark::O);

    // Creator saw the create status and the join status; joiner saw the
    // join status.
    let _ = recv(&mut rx1).await;
    let _ = recv(&mut rx1).await;
    let _ = recv(&mut rx2).await;

    (code, rx1, rx2)
}

/// Plays X: 0, O: 3, X: 1, O: 4, leaving X one move short of the top row.
async fn play_to_brink(
    reg: &RoomRegistry,
    rx1: &mut mpsc::UnboundedReceiver<ServerEvent>,
    rx2: &mut mpsc::UnboundedReceiver<ServerEvent>,
) {
    for (who, cell) in [(1, 0), (2, 3), (1, 1), (2, 4)] {
        reg.apply_move(conn(who), cell).await.expect("move");
        let _ = recv(rx1).await;
        let _ = recv(rx2).await;
    }
}

// =========================================================================
// Create / join
// =========================================================================

#[tokio::test]
async fn test_create_seats_creator_at_x() {
    let mut reg = RoomRegistry::new();
    let (tx, mut rx) = observer();
    let (code, mark) = reg.create(conn(1), tx, false).expect("create");

    assert_eq!(mark, Mark::X);
    assert_eq!(reg.room_count(), 1);

    match recv(&mut rx).await {
        ServerEvent::RoomStatus {
            seats,
            turn,
            board,
            started,
        } => {
            assert_eq!(seats.x, Some(Occupant::Player { id: conn(1) }));
            assert_eq!(seats.o, None);
            assert_eq!(turn, Mark::X);
            assert_eq!(board, Board::EMPTY);
            assert!(!started);
        }
        other => panic!("expected RoomStatus, got {other:?}"),
    }

    let snap = reg.snapshot(&code).await.expect("snapshot");
    assert_eq!(snap.phase, GamePhase::WaitingForPlayers);
    assert!(!snap.started);
}

#[tokio::test]
async fn test_join_fills_o_and_starts_the_room() {
    let mut reg = RoomRegistry::new();
    let (code, _rx1, _rx2) = setup_pvp(&mut reg).await;

    let snap = reg.snapshot(&code).await.expect("snapshot");
    assert!(snap.started);
    assert_eq!(snap.phase, GamePhase::InProgress);
    assert!(snap.seats.both_occupied());
}

#[tokio::test]
async fn test_join_broadcast_reaches_both_participants() {
    let mut reg = RoomRegistry::new();
    let (tx1, mut rx1) = observer();
    let (code, _) = reg.create(conn(1), tx1, false).expect("create");
    let _ = recv(&mut rx1).await; // create status

    let (tx2, mut rx2) = observer();
    reg.join(code.as_str(), conn(2), tx2).await.expect("join");

    for rx in [&mut rx1, &mut rx2] {
        match recv(rx).await {
            ServerEvent::RoomStatus { seats, started, .. } => {
                assert!(started);
                assert_eq!(
                    seats.o,
                    Some(Occupant::Player { id: conn(2) })
                );
            }
            other => panic!("expected RoomStatus, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_join_is_case_insensitive_and_trimmed() {
    let mut reg = RoomRegistry::new();
    let (tx1, _rx1) = observer();
    let (code, _) = reg.create(conn(1), tx1, false).expect("create");

    let sloppy = format!("  {}  \n", code.as_str().to_lowercase());
    let (tx2, _rx2) = observer();
    let (joined, mark) = reg
        .join(&sloppy, conn(2), tx2)
        .await
        .expect("sloppy code should still match");
    assert_eq!(joined, code);
    assert_eq!(mark, Mark::O);
}

#[tokio::test]
async fn test_join_unknown_code_fails_not_found() {
    let mut reg = RoomRegistry::new();
    let (tx, _rx) = observer();
    let err = reg.join("ZZZZ22", conn(1), tx).await.unwrap_err();
    assert!(matches!(err, RoomError::NotFound(_)));
}

#[tokio::test]
async fn test_join_full_room_fails() {
    let mut reg = RoomRegistry::new();
    let (code, _rx1, _rx2) = setup_pvp(&mut reg).await;

    let (tx3, _rx3) = observer();
    let err = reg
        .join(code.as_str(), conn(3), tx3)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::RoomFull(_)));
}

#[tokio::test]
async fn test_connection_cannot_be_in_two_rooms() {
    let mut reg = RoomRegistry::new();
    let (tx1, _rx1) = observer();
    let (code, _) = reg.create(conn(1), tx1, false).expect("create");

    let (tx, _rx) = observer();
    assert!(matches!(
        reg.create(conn(1), tx, false),
        Err(RoomError::AlreadyInRoom(..))
    ));

    let (tx, _rx) = observer();
    let err = reg.join(code.as_str(), conn(1), tx).await.unwrap_err();
    assert!(matches!(err, RoomError::AlreadyInRoom(..)));
}

// =========================================================================
// Moves
// =========================================================================

#[tokio::test]
async fn test_move_out_of_turn_rejected_without_mutation() {
    let mut reg = RoomRegistry::new();
    let (code, _rx1, _rx2) = setup_pvp(&mut reg).await;

    let err = reg.apply_move(conn(2), 0).await.unwrap_err();
    assert!(matches!(err, RoomError::NotYourTurn));

    let snap = reg.snapshot(&code).await.expect("snapshot");
    assert_eq!(snap.board, Board::EMPTY);
    assert_eq!(snap.turn, Mark::X);
}

#[tokio::test]
async fn test_move_to_occupied_cell_rejected() {
    let mut reg = RoomRegistry::new();
    let (_code, mut rx1, mut rx2) = setup_pvp(&mut reg).await;

    reg.apply_move(conn(1), 4).await.expect("X takes center");
    let _ = recv(&mut rx1).await;
    let _ = recv(&mut rx2).await;

    let err = reg.apply_move(conn(2), 4).await.unwrap_err();
    assert!(matches!(err, RoomError::CellOccupied(4)));
}

#[tokio::test]
async fn test_move_out_of_range_rejected() {
    let mut reg = RoomRegistry::new();
    let (_code, _rx1, _rx2) = setup_pvp(&mut reg).await;

    let err = reg.apply_move(conn(1), 9).await.unwrap_err();
    assert!(matches!(err, RoomError::InvalidCell(9)));
}

#[tokio::test]
async fn test_move_from_roomless_connection_is_unknown_room() {
    let reg = RoomRegistry::new();
    let err = reg.apply_move(conn(99), 0).await.unwrap_err();
    assert!(matches!(err, RoomError::UnknownRoom(_)));
    assert!(err.kind().is_none(), "must stay off the wire");
}

#[tokio::test]
async fn test_valid_moves_broadcast_state_and_keep_alternation() {
    let mut reg = RoomRegistry::new();
    let (_code, mut rx1, mut rx2) = setup_pvp(&mut reg).await;

    reg.apply_move(conn(1), 4).await.expect("move");
    for rx in [&mut rx1, &mut rx2] {
        match recv(rx).await {
            ServerEvent::State {
                board,
                turn,
                winner,
                full,
                reset,
            } => {
                assert_eq!(board.cell(4), Some(Mark::X));
                assert_eq!(turn, Mark::O);
                assert_eq!(winner, None);
                assert!(!full);
                assert!(!reset);
                assert_alternation(&board);
            }
            other => panic!("expected State, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_full_game_x_wins_on_the_top_row() {
    let mut reg = RoomRegistry::new();
    let (code, mut rx1, mut rx2) = setup_pvp(&mut reg).await;
    play_to_brink(&reg, &mut rx1, &mut rx2).await;

    reg.apply_move(conn(1), 2).await.expect("winning move");
    match recv(&mut rx2).await {
        ServerEvent::State {
            board,
            winner,
            full,
            ..
        } => {
            assert_eq!(winner, Some(Mark::X));
            assert!(!full);
            assert_eq!(board.winning_line(), Some([0, 1, 2]));
            assert_alternation(&board);
        }
        other => panic!("expected State, got {other:?}"),
    }

    let snap = reg.snapshot(&code).await.expect("snapshot");
    assert_eq!(snap.phase, GamePhase::Finished);
}

#[tokio::test]
async fn test_move_after_game_over_rejected_without_mutation() {
    let mut reg = RoomRegistry::new();
    let (code, mut rx1, mut rx2) = setup_pvp(&mut reg).await;
    play_to_brink(&reg, &mut rx1, &mut rx2).await;
    reg.apply_move(conn(1), 2).await.expect("winning move");

    let before = reg.snapshot(&code).await.expect("snapshot");

    // Both the seat whose turn it nominally is and the winner get the
    // same rejection on a finished board.
    for who in [2, 1] {
        let err = reg.apply_move(conn(who), 8).await.unwrap_err();
        assert!(matches!(err, RoomError::GameAlreadyOver));
    }

    let after = reg.snapshot(&code).await.expect("snapshot");
    assert_eq!(after.board, before.board);
    assert_eq!(after.turn, before.turn);
}

// =========================================================================
// Reset
// =========================================================================

#[tokio::test]
async fn test_reset_clears_board_and_returns_first_move_to_x() {
    let mut reg = RoomRegistry::new();
    let (_code, mut rx1, mut rx2) = setup_pvp(&mut reg).await;
    play_to_brink(&reg, &mut rx1, &mut rx2).await;
    reg.apply_move(conn(1), 2).await.expect("winning move");
    let _ = recv(&mut rx1).await;
    let _ = recv(&mut rx2).await;

    reg.reset(conn(2)).await.expect("reset");
    for rx in [&mut rx1, &mut rx2] {
        match recv(rx).await {
            ServerEvent::State {
                board,
                turn,
                winner,
                full,
                reset,
            } => {
                assert!(reset);
                assert_eq!(board, Board::EMPTY);
                assert_eq!(turn, Mark::X);
                assert_eq!(winner, None);
                assert!(!full);
            }
            other => panic!("expected State, got {other:?}"),
        }
    }

    // O no longer holds the first move after a reset.
    let err = reg.apply_move(conn(2), 0).await.unwrap_err();
    assert!(matches!(err, RoomError::NotYourTurn));
    reg.apply_move(conn(1), 0).await.expect("X moves first");
}

#[tokio::test]
async fn test_reset_from_roomless_connection_is_ignored() {
    let reg = RoomRegistry::new();
    let err = reg.reset(conn(42)).await.unwrap_err();
    assert!(matches!(err, RoomError::UnknownRoom(_)));
    assert!(err.kind().is_none());
}

// =========================================================================
// Disconnects
// =========================================================================

#[tokio::test]
async fn test_disconnect_notifies_the_remaining_participant() {
    let mut reg = RoomRegistry::new();
    let (_code, _rx1, mut rx2) = setup_pvp(&mut reg).await;

    reg.release(conn(1)).await;
    match recv(&mut rx2).await {
        ServerEvent::RoomStatus { seats, started, .. } => {
            assert_eq!(seats.x, None);
            assert_eq!(seats.o, Some(Occupant::Player { id: conn(2) }));
            assert!(!started);
        }
        other => panic!("expected RoomStatus, got {other:?}"),
    }
    assert_eq!(reg.room_count(), 1, "occupied room must survive");
}

#[tokio::test]
async fn test_room_destroyed_when_both_seats_empty() {
    let mut reg = RoomRegistry::new();
    let (code, _rx1, _rx2) = setup_pvp(&mut reg).await;

    reg.release(conn(1)).await;
    reg.release(conn(2)).await;

    assert_eq!(reg.room_count(), 0);
    assert!(!reg.contains(&code));

    let (tx, _rx) = observer();
    let err = reg.join(code.as_str(), conn(3), tx).await.unwrap_err();
    assert!(matches!(err, RoomError::NotFound(_)));
}

#[tokio::test]
async fn test_release_is_idempotent() {
    let mut reg = RoomRegistry::new();
    let (_code, _rx1, _rx2) = setup_pvp(&mut reg).await;

    reg.release(conn(1)).await;
    reg.release(conn(1)).await;
    reg.release(conn(77)).await;
    assert_eq!(reg.room_count(), 1);
}

#[tokio::test]
async fn test_vacated_seat_can_be_refilled_and_play_resumes() {
    let mut reg = RoomRegistry::new();
    let (code, mut rx1, mut rx2) = setup_pvp(&mut reg).await;

    reg.apply_move(conn(1), 4).await.expect("move");
    let _ = recv(&mut rx1).await;
    let _ = recv(&mut rx2).await;

    reg.release(conn(1)).await;
    let _ = recv(&mut rx2).await; // vacancy status

    // O is occupied, so the newcomer inherits the X seat and the board.
    let (tx3, _rx3) = observer();
    let (_, mark) = reg
        .join(code.as_str(), conn(3), tx3)
        .await
        .expect("rejoin");
    assert_eq!(mark, Mark::X);

    let snap = reg.snapshot(&code).await.expect("snapshot");
    assert!(snap.started);
    assert_eq!(snap.board.cell(4), Some(Mark::X));
    assert_eq!(snap.turn, Mark::O);
}

// =========================================================================
// Solo rooms
// =========================================================================

#[tokio::test]
async fn test_solo_room_seats_the_engine_at_o() {
    let mut reg = RoomRegistry::new();
    let (tx, mut rx) = observer();
    let (code, mark) = reg.create(conn(1), tx, true).expect("create");
    assert_eq!(mark, Mark::X);

    match recv(&mut rx).await {
        ServerEvent::RoomStatus { seats, started, .. } => {
            assert_eq!(seats.o, Some(Occupant::Engine));
            assert!(started);
        }
        other => panic!("expected RoomStatus, got {other:?}"),
    }

    let snap = reg.snapshot(&code).await.expect("snapshot");
    assert_eq!(snap.phase, GamePhase::InProgress);
}

#[tokio::test]
async fn test_solo_room_engine_replies_within_the_same_move() {
    let mut reg = RoomRegistry::new();
    let (tx, mut rx) = observer();
    let (_code, _) = reg.create(conn(1), tx, true).expect("create");
    let _ = recv(&mut rx).await; // create status

    reg.apply_move(conn(1), 4).await.expect("move");

    // First state: the player's move, engine to reply.
    match recv(&mut rx).await {
        ServerEvent::State { board, turn, .. } => {
            assert_eq!(board.cell(4), Some(Mark::X));
            assert_eq!(board.count(Mark::O), 0);
            assert_eq!(turn, Mark::O);
        }
        other => panic!("expected State, got {other:?}"),
    }

    // Second state: the engine has answered and it is X's turn again.
    match recv(&mut rx).await {
        ServerEvent::State { board, turn, .. } => {
            assert_eq!(board.count(Mark::X), 1);
            assert_eq!(board.count(Mark::O), 1);
            assert_eq!(turn, Mark::X);
            assert_alternation(&board);
        }
        other => panic!("expected State, got {other:?}"),
    }
}

#[tokio::test]
async fn test_solo_room_is_full_for_joiners() {
    let mut reg = RoomRegistry::new();
    let (tx, _rx) = observer();
    let (code, _) = reg.create(conn(1), tx, true).expect("create");

    let (tx2, _rx2) = observer();
    let err = reg
        .join(code.as_str(), conn(2), tx2)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::RoomFull(_)));
}

#[tokio::test]
async fn test_solo_room_dies_with_its_only_player() {
    let mut reg = RoomRegistry::new();
    let (tx, _rx) = observer();
    let (code, _) = reg.create(conn(1), tx, true).expect("create");

    reg.release(conn(1)).await;
    assert_eq!(reg.room_count(), 0);
    assert!(!reg.contains(&code));
}
