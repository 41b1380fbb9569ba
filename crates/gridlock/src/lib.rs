//! # Gridlock
//!
//! A real-time room server for two-player tic-tac-toe.
//!
//! Participants create a room, share its six-character code, and play over
//! a websocket; the server owns the authoritative board per room, enforces
//! move legality, and broadcasts every state change to both seats. A solo
//! mode seats a perfect-play search opponent instead of a second player.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridlock::prelude::*;
//!
//! # async fn run() -> Result<(), GridlockError> {
//! let server = ServerBuilder::new().bind("0.0.0.0:3000").build().await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::GridlockError;
pub use server::{Server, ServerBuilder};

/// The common imports for running or talking to a Gridlock server.
pub mod prelude {
    pub use crate::{GridlockError, Server, ServerBuilder};
    pub use gridlock_board::{best_move, Board, Mark};
    pub use gridlock_protocol::{
        ClientAction, Codec, ErrorKind, JsonCodec, Occupant, RoomCode,
        Seats, ServerEvent,
    };
    pub use gridlock_room::{GamePhase, RoomError, RoomRegistry};
    pub use gridlock_transport::ConnectionId;
}
