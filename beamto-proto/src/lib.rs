//! Wire protocol shared between the beamto service and its clients.
//!
//! The service listens on a local socket and speaks a small private
//! protocol built from two primitives (little-endian u32, length-prefixed
//! UTF-8 string) with no outer framing; [`read_string`]/[`write_string`]
//! and friends define the encoding, [`Command`] the two exchanges built
//! on top of it.
//!
//! Everything here is transport-agnostic and works over any
//! [`std::io::Read`] / [`std::io::Write`] pair, which keeps the codec
//! usable from tests and alternative transports alike.

mod codec;
mod message;

pub use codec::{MAX_STRING_LEN, WireError, read_string, read_u32, write_string, write_u32};
pub use message::{Command, Device};
