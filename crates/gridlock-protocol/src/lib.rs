//! Wire protocol for Gridlock.
//!
//! This crate defines the language that clients and the server speak:
//!
//! - **Types** ([`ClientAction`], [`ServerEvent`], [`RoomCode`],
//!   [`Seats`]) — the messages that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding or
//!   decoding.
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! layer (game authority). It knows nothing about sockets or rooms, only
//! about message shapes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientAction, ErrorKind, Occupant, RoomCode, Seats, ServerEvent,
};
