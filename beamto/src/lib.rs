//! Client library for the beamto file-drop service.
//!
//! The beamto background service owns device pairing and file transfer;
//! this crate speaks its private wire protocol over the service's local
//! socket so host integrations (file-manager context menus, launchers,
//! scripts) can discover paired devices and submit transfer jobs.
//!
//! ```no_run
//! use beamto::Client;
//!
//! let client = Client::new();
//! let devices = client.list_devices().expect("service misbehaved");
//! for device in &devices {
//!     println!("{}  {}", device.id, device.display_name);
//! }
//! ```
//!
//! Discovery and submission are independent connections; the only state a
//! caller threads between them is the chosen [`Device::id`]. A missing
//! service is reported as [`Error::ServiceUnavailable`], a routine
//! condition rather than a fault, while `Ok(vec![])` from
//! [`Client::list_devices`] means the service answered and nothing is
//! paired.

#[cfg(unix)]
mod client;
#[cfg(unix)]
mod endpoint;
mod error;

pub use beamto_proto::{Command, Device, WireError};
#[cfg(unix)]
pub use client::{Client, DEFAULT_TIMEOUT};
#[cfg(unix)]
pub use endpoint::{ENV_SOCKET, default_socket_path};
pub use error::{Error, Result};
