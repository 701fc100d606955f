//! Primitive value codec for the beamto wire protocol.
//!
//! Every message on the channel is a flat sequence of two primitives:
//!
//! - **u32**: four bytes, little-endian.
//! - **string**: a u32 byte count followed by exactly that many bytes of
//!   UTF-8. No terminator; a zero count is a legal empty string.
//!
//! There is no framing beyond the values themselves, so both peers must
//! agree on the field sequence of each exchange (see [`crate::Command`]).
//! All functions block until the value is fully transferred or the channel
//! fails; a channel that closes mid-value is reported as
//! [`WireError::ShortRead`], never as a truncated success.

use std::io::{self, Read, Write};

/// Upper bound on the declared byte length of a single incoming string.
///
/// Checked before allocating, so a corrupt or hostile length prefix cannot
/// turn into an arbitrarily large buffer. 16 MiB is far beyond any device
/// id, display name, or file path the service actually sends.
pub const MAX_STRING_LEN: u32 = 16 * 1024 * 1024;

/// Errors raised while encoding or decoding wire primitives.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WireError {
    /// The channel closed before a complete value was delivered.
    #[error("channel closed inside a {expected}-byte value")]
    ShortRead {
        /// Size of the value that was being read when the channel closed.
        expected: usize,
    },

    /// Incoming string bytes were not valid UTF-8.
    ///
    /// Decoding is strict: malformed bytes fail the value rather than
    /// being replaced with U+FFFD, so an id read off the wire is always
    /// byte-identical to the one the peer sent.
    #[error("wire string is not valid UTF-8")]
    InvalidEncoding(#[source] std::string::FromUtf8Error),

    /// A string length prefix exceeds [`MAX_STRING_LEN`].
    #[error("declared string length {len} exceeds the {MAX_STRING_LEN}-byte cap")]
    OversizedString {
        /// Length claimed by the prefix.
        len: u32,
    },

    /// An outgoing length or count does not fit the four-byte wire prefix.
    #[error("length {len} exceeds the u32 wire range")]
    LengthOverflow {
        /// The out-of-range value.
        len: usize,
    },

    /// Any other channel I/O failure.
    #[error(transparent)]
    Io(io::Error),
}

impl WireError {
    /// Returns `true` if this error came from a channel read or write
    /// deadline expiring rather than from malformed data.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Io(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
        )
    }
}

/// Writes a u32 as four little-endian bytes.
pub fn write_u32<W: Write>(w: &mut W, value: u32) -> Result<(), WireError> {
    w.write_all(&value.to_le_bytes()).map_err(WireError::Io)
}

/// Reads a u32 from four little-endian bytes.
pub fn read_u32<R: Read>(r: &mut R) -> Result<u32, WireError> {
    let mut buf = [0u8; 4];
    read_exact(r, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Writes `text` as a length-prefixed UTF-8 string.
///
/// Layout is the byte count as a wire u32 followed by the bytes
/// themselves. The empty string is a lone zero count.
pub fn write_string<W: Write>(w: &mut W, text: &str) -> Result<(), WireError> {
    let bytes = text.as_bytes();
    let len = u32::try_from(bytes.len())
        .map_err(|_| WireError::LengthOverflow { len: bytes.len() })?;
    write_u32(w, len)?;
    w.write_all(bytes).map_err(WireError::Io)
}

/// Reads a length-prefixed UTF-8 string.
///
/// Fails with [`WireError::OversizedString`] before allocating if the
/// prefix exceeds [`MAX_STRING_LEN`], with [`WireError::ShortRead`] if the
/// channel closes before the declared count arrives, and with
/// [`WireError::InvalidEncoding`] if the bytes are not UTF-8.
pub fn read_string<R: Read>(r: &mut R) -> Result<String, WireError> {
    let len = read_u32(r)?;
    if len > MAX_STRING_LEN {
        return Err(WireError::OversizedString { len });
    }
    let mut buf = vec![0u8; len as usize];
    read_exact(r, &mut buf)?;
    String::from_utf8(buf).map_err(WireError::InvalidEncoding)
}

/// `read_exact` with end-of-stream mapped to [`WireError::ShortRead`].
fn read_exact<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<(), WireError> {
    r.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            WireError::ShortRead { expected: buf.len() }
        } else {
            WireError::Io(e)
        }
    })
}
