//! Message vocabulary for the beamto service channel.

use serde::{Deserialize, Serialize};

/// The request exchanges the service understands.
///
/// Every request opens with the command's tag written as a wire string;
/// the tag alone dictates the field sequence that follows, so an unknown
/// tag leaves the rest of the stream unparseable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Command {
    /// Enumerate the currently paired, reachable devices.
    ///
    /// Response: a u32 device count, then `id` and `display_name` strings
    /// for each device, in the service's order.
    DeviceList,

    /// Submit a file-transfer job for one device.
    ///
    /// Request continues with the target device id, a u32 path count, and
    /// that many path strings. The service sends no response.
    SendFiles,
}

impl Command {
    /// The tag written on the wire for this command.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::DeviceList => "device-list",
            Self::SendFiles => "send-files",
        }
    }

    /// Parses a wire tag back into a command.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "device-list" => Some(Self::DeviceList),
            "send-files" => Some(Self::SendFiles),
            _ => None,
        }
    }
}

/// One paired device as reported by a [`Command::DeviceList`] exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Opaque, service-assigned identifier. Stable across enumerations
    /// and the only field a later submission needs.
    pub id: String,

    /// Human-readable name for menus and logs. May change between calls
    /// (devices can be renamed), so never use it as a key.
    pub display_name: String,
}
