//! Per-connection handler: the session transport adapter.
//!
//! Each accepted connection gets its own task running this handler. It is
//! a pure translation layer; no game rules live here. Inbound frames are
//! decoded to [`ClientAction`]s and dispatched to the registry; direct
//! acknowledgments go back on the originating connection, while room
//! broadcasts arrive over a per-connection event channel and are pumped
//! onto the socket by the same loop.

use std::sync::Arc;

use gridlock_protocol::{ClientAction, Codec, ServerEvent};
use gridlock_room::{EventSender, RoomError};
use gridlock_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::GridlockError;

/// Drop guard that releases the connection's seat when the handler exits.
///
/// Cleanup must happen even if the handler task fails, and `Drop` is
/// synchronous, so the release runs in a fire-and-forget task. Release is
/// idempotent, so a racing second drop is harmless.
struct DisconnectGuard {
    conn: ConnectionId,
    state: Arc<ServerState>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let conn = self.conn;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.registry.lock().await.release(conn).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), GridlockError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // Room broadcasts for this connection arrive here; the select loop
    // below forwards them onto the socket.
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    let _guard = DisconnectGuard {
        conn: conn_id,
        state: Arc::clone(&state),
    };

    loop {
        tokio::select! {
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::debug!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                };

                let action: ClientAction = match state.codec.decode(&data) {
                    Ok(action) => action,
                    Err(e) => {
                        tracing::debug!(
                            %conn_id,
                            error = %e,
                            "undecodable action, ignoring"
                        );
                        continue;
                    }
                };

                if let Some(reply) =
                    dispatch(&state, conn_id, &events_tx, action).await
                {
                    send_event(&conn, &state, &reply).await?;
                }
            }

            Some(event) = events_rx.recv() => {
                send_event(&conn, &state, &event).await?;
            }
        }
    }

    // _guard drops here → the seat is released and the room notified.
    Ok(())
}

/// Maps one inbound action to a registry call.
///
/// Returns the direct reply for the originating connection, if the action
/// warrants one. Broadcast effects travel through the event channel.
async fn dispatch(
    state: &Arc<ServerState>,
    conn: ConnectionId,
    events: &EventSender,
    action: ClientAction,
) -> Option<ServerEvent> {
    match action {
        ClientAction::Create { solo } => {
            let result = state
                .registry
                .lock()
                .await
                .create(conn, events.clone(), solo);
            match result {
                Ok((code, mark)) => {
                    Some(ServerEvent::Created { code, mark })
                }
                Err(e) => reject(conn, "create", e),
            }
        }

        ClientAction::Join { code } => {
            let result = state
                .registry
                .lock()
                .await
                .join(&code, conn, events.clone())
                .await;
            match result {
                Ok((code, mark)) => {
                    Some(ServerEvent::Joined { code, mark })
                }
                Err(e) => reject(conn, "join", e),
            }
        }

        ClientAction::Move { cell } => {
            let result =
                state.registry.lock().await.apply_move(conn, cell).await;
            match result {
                Ok(()) => Some(ServerEvent::MoveAccepted),
                Err(e) => reject(conn, "move", e),
            }
        }

        ClientAction::Reset => {
            match state.registry.lock().await.reset(conn).await {
                Ok(()) => None,
                Err(e) => reject(conn, "reset", e),
            }
        }
    }
}

/// Turns a room error into a direct `Error` reply, or swallows it when
/// the protocol says the action is silently ignored.
fn reject(
    conn: ConnectionId,
    action: &str,
    err: RoomError,
) -> Option<ServerEvent> {
    match err.kind() {
        Some(kind) => Some(ServerEvent::Error {
            kind,
            message: err.to_string(),
        }),
        None => {
            tracing::debug!(%conn, action, error = %err, "action ignored");
            None
        }
    }
}

async fn send_event(
    conn: &WebSocketConnection,
    state: &ServerState,
    event: &ServerEvent,
) -> Result<(), GridlockError> {
    let bytes = state.codec.encode(event)?;
    conn.send(&bytes).await.map_err(GridlockError::Transport)?;
    Ok(())
}
