//! Well-known endpoint resolution for the beamto service socket.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable that overrides the default socket path.
pub const ENV_SOCKET: &str = "BEAMTO_SOCKET";

/// File name the service binds inside the runtime directory.
const SOCKET_FILE: &str = "beamto.sock";

/// Returns the socket path the service is expected to listen on.
///
/// Resolution order: [`ENV_SOCKET`] if set, else the user runtime
/// directory (`$XDG_RUNTIME_DIR` on Linux), else the system temporary
/// directory. Both service and clients resolve the same way, so they meet
/// at the same path without any configuration.
#[must_use]
pub fn default_socket_path() -> PathBuf {
    resolve(env::var_os(ENV_SOCKET), dirs::runtime_dir())
}

/// Pure resolution step: override beats runtime dir beats temp dir.
fn resolve(override_path: Option<OsString>, runtime_dir: Option<PathBuf>) -> PathBuf {
    if let Some(path) = override_path {
        return PathBuf::from(path);
    }
    runtime_dir.unwrap_or_else(env::temp_dir).join(SOCKET_FILE)
}
