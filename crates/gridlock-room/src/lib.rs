//! Room lifecycle and game authority for Gridlock.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns the
//! authoritative board, the turn, and the seat assignment. Commands arrive
//! over a channel and are handled serially to completion, so a room never
//! sees two actions interleaved; different rooms share nothing and run
//! concurrently.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — owns every room handle, generates codes, routes
//!   actions, destroys empty rooms
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`GamePhase`] — per-room lifecycle state
//! - [`RoomError`] — everything a room can refuse

mod error;
mod phase;
mod registry;
mod room;

pub use error::RoomError;
pub use phase::GamePhase;
pub use registry::RoomRegistry;
pub use room::{EventSender, LeaveOutcome, RoomHandle, RoomSnapshot};
