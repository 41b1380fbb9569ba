//! Room actor: an isolated Tokio task that owns one game session.
//!
//! Each room runs in its own task and is only reachable through its
//! command channel, so its board, turn, and seats are mutated by exactly
//! one action at a time, in arrival order. Broadcasts fan out through
//! per-connection event senders; delivery is fire-and-forget.

use std::collections::HashMap;

use gridlock_board::{best_move, Board, Mark};
use gridlock_protocol::{Occupant, RoomCode, Seats, ServerEvent};
use gridlock_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::{GamePhase, RoomError};

/// Channel sender for delivering server events to one connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
///
/// Variants carrying a `oneshot::Sender` are request/reply: the caller
/// awaits the result on that channel. The rest are fire-and-forget.
pub(crate) enum RoomCommand {
    /// Seat a connection in the room.
    Join {
        conn: ConnectionId,
        sender: EventSender,
        reply: oneshot::Sender<Result<Mark, RoomError>>,
    },

    /// Place a mark for a seated connection.
    Move {
        conn: ConnectionId,
        cell: u8,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Clear the board for a new round.
    Reset { conn: ConnectionId },

    /// Vacate any seat held by the connection.
    Leave {
        conn: ConnectionId,
        reply: oneshot::Sender<LeaveOutcome>,
    },

    /// Request a copy of the current room state.
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
}

/// What a leave did to the room.
#[derive(Debug, Clone, Copy)]
pub struct LeaveOutcome {
    /// The mark whose seat was vacated, if the connection held one.
    pub vacated: Option<Mark>,
    /// `true` when no connection-held seat remains; the registry
    /// destroys the room.
    pub now_empty: bool,
}

/// A copy of a room's state at one instant.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub seats: Seats,
    pub board: Board,
    pub turn: Mark,
    pub started: bool,
    pub phase: GamePhase,
}

/// Handle to a running room actor.
///
/// Cheap to clone — it wraps an `mpsc::Sender`. The registry holds one
/// per room.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Seats a connection; replies with the assigned mark.
    pub async fn join(
        &self,
        conn: ConnectionId,
        sender: EventSender,
    ) -> Result<Mark, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                conn,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    /// Validates and applies a move for the given connection.
    pub async fn apply_move(
        &self,
        conn: ConnectionId,
        cell: u8,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Move {
                conn,
                cell,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    /// Requests a board reset (fire-and-forget).
    pub async fn reset(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Reset { conn })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Vacates any seat held by the connection.
    pub async fn leave(
        &self,
        conn: ConnectionId,
    ) -> Result<LeaveOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                conn,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Requests the current room state.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    code: RoomCode,
    board: Board,
    turn: Mark,
    seats: Seats,
    /// Both seats have been occupied since the last vacancy.
    started: bool,
    phase: GamePhase,
    /// Per-connection outbound channels for everyone seated here.
    senders: HashMap<ConnectionId, EventSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until the room empties.
    async fn run(mut self) {
        tracing::debug!(code = %self.code, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    conn,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(conn, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Move { conn, cell, reply } => {
                    let result = self.handle_move(conn, cell);
                    let _ = reply.send(result);
                }
                RoomCommand::Reset { conn } => {
                    self.handle_reset(conn);
                }
                RoomCommand::Leave { conn, reply } => {
                    let outcome = self.handle_leave(conn);
                    let _ = reply.send(outcome);
                    if outcome.now_empty {
                        break;
                    }
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
            }
        }

        tracing::debug!(code = %self.code, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        conn: ConnectionId,
        sender: EventSender,
    ) -> Result<Mark, RoomError> {
        if self.seats.mark_of(conn).is_some() {
            return Err(RoomError::AlreadyInRoom(conn, self.code.clone()));
        }

        // Seat preference O then X: a third party never displaces the
        // creator, and a returning participant takes whichever seat the
        // vacancy left open.
        let mark = if self.seats.o.is_none() {
            Mark::O
        } else if self.seats.x.is_none() {
            Mark::X
        } else {
            return Err(RoomError::RoomFull(self.code.clone()));
        };

        *self.seats.seat_mut(mark) = Some(Occupant::Player { id: conn });
        self.senders.insert(conn, sender);

        if self.seats.both_occupied() {
            self.started = true;
            self.phase = if self.board.is_terminal() {
                GamePhase::Finished
            } else {
                GamePhase::InProgress
            };
        }

        tracing::info!(
            code = %self.code,
            %conn,
            %mark,
            started = self.started,
            "seat filled"
        );

        self.broadcast_status();
        Ok(mark)
    }

    fn handle_move(
        &mut self,
        conn: ConnectionId,
        cell: u8,
    ) -> Result<(), RoomError> {
        let mark = self
            .seats
            .mark_of(conn)
            .ok_or_else(|| RoomError::NotSeated(conn, self.code.clone()))?;

        let idx = usize::from(cell);
        if idx >= 9 {
            return Err(RoomError::InvalidCell(idx));
        }
        // Terminal first: a finished game rejects every move the same
        // way, regardless of whose turn the last rotation landed on.
        if self.board.is_terminal() {
            return Err(RoomError::GameAlreadyOver);
        }
        if mark != self.turn {
            return Err(RoomError::NotYourTurn);
        }
        if self.board.cell(idx).is_some() {
            return Err(RoomError::CellOccupied(idx));
        }

        self.apply(idx, mark);

        // In a solo room the engine answers within the same command, on
        // the requester's own turn-taking path. `best_move` simulates on
        // a copy of the board (it is taken by value).
        if let Some(engine) = self.seats.engine_mark() {
            if !self.board.is_terminal() && self.turn == engine {
                if let Some(reply) = best_move(self.board, engine) {
                    tracing::debug!(
                        code = %self.code,
                        cell = reply,
                        "engine reply"
                    );
                    self.apply(reply, engine);
                }
            }
        }

        Ok(())
    }

    /// Mutates the board, rotates the turn, re-evaluates terminal state,
    /// and broadcasts the resulting position.
    fn apply(&mut self, idx: usize, mark: Mark) {
        self.board.place(idx, mark);
        self.turn = mark.other();

        let winner = self.board.winner();
        let full = self.board.is_full();
        if winner.is_some() || full {
            self.phase = GamePhase::Finished;
            tracing::info!(
                code = %self.code,
                winner = ?winner,
                board = %self.board,
                "game finished"
            );
        }

        self.broadcast(ServerEvent::State {
            board: self.board,
            turn: self.turn,
            winner,
            full,
            reset: false,
        });
    }

    fn handle_reset(&mut self, conn: ConnectionId) {
        if !self.senders.contains_key(&conn) {
            return;
        }

        self.board.clear();
        self.turn = Mark::X;
        self.phase = if self.seats.both_occupied() {
            GamePhase::InProgress
        } else {
            GamePhase::WaitingForPlayers
        };

        tracing::info!(code = %self.code, %conn, "board reset");

        self.broadcast(ServerEvent::State {
            board: self.board,
            turn: self.turn,
            winner: None,
            full: false,
            reset: true,
        });
    }

    fn handle_leave(&mut self, conn: ConnectionId) -> LeaveOutcome {
        self.senders.remove(&conn);

        let vacated = self.seats.mark_of(conn);
        if let Some(mark) = vacated {
            *self.seats.seat_mut(mark) = None;
            self.started = false;
            if self.phase == GamePhase::InProgress {
                self.phase = GamePhase::WaitingForPlayers;
            }
            tracing::info!(code = %self.code, %conn, %mark, "seat vacated");
        }

        let now_empty = self.seats.player_count() == 0;
        if vacated.is_some() && !now_empty {
            // The remaining participant learns their opponent left.
            self.broadcast_status();
        }

        LeaveOutcome { vacated, now_empty }
    }

    /// Broadcasts current seat occupancy to everyone in the room.
    fn broadcast_status(&self) {
        self.broadcast(ServerEvent::RoomStatus {
            seats: self.seats,
            turn: self.turn,
            board: self.board,
            started: self.started,
        });
    }

    /// Sends an event to every connection in the room. Silently drops
    /// receivers that are gone (connection mid-close).
    fn broadcast(&self, event: ServerEvent) {
        for sender in self.senders.values() {
            let _ = sender.send(event.clone());
        }
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            seats: self.seats,
            board: self.board,
            turn: self.turn,
            started: self.started,
            phase: self.phase,
        }
    }
}

/// Spawns a room actor with the creator seated at `X` and returns its
/// handle.
///
/// In solo mode the engine occupies `O` from the start, so the room is
/// `started` immediately. The initial `RoomStatus` is queued for the
/// creator before the actor task is spawned, making the create reply and
/// the first broadcast deterministically ordered.
pub(crate) fn spawn_room(
    code: RoomCode,
    creator: ConnectionId,
    sender: EventSender,
    solo: bool,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let seats = Seats {
        x: Some(Occupant::Player { id: creator }),
        o: solo.then_some(Occupant::Engine),
    };
    let mut senders = HashMap::new();
    senders.insert(creator, sender);

    let actor = RoomActor {
        code: code.clone(),
        board: Board::EMPTY,
        turn: Mark::X,
        started: solo,
        phase: if solo {
            GamePhase::InProgress
        } else {
            GamePhase::WaitingForPlayers
        },
        seats,
        senders,
        receiver: rx,
    };

    actor.broadcast_status();
    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
