//! Blocking client for the beamto service's local channel.

use std::io::{self, BufReader, BufWriter, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use beamto_proto::{Command, Device, WireError, read_string, read_u32, write_string, write_u32};
use tracing::debug;

use crate::endpoint;
use crate::error::{Error, Result};

/// Default per-call deadline.
///
/// Typical callers sit inside a UI interaction (a context menu waiting to
/// render), so an unresponsive service may stall them for a bounded time
/// only. Pass `None` to [`Client::timeout`] to wait forever instead.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A client for the beamto service endpoint.
///
/// Holds configuration only. Every operation opens its own connection,
/// runs exactly one exchange, and closes the channel on every exit path,
/// so no state is carried between calls and concurrent calls never
/// interfere. The only thing worth keeping across calls is a
/// [`Device::id`] from an earlier enumeration.
#[derive(Debug, Clone)]
pub struct Client {
    /// Socket path of the service endpoint.
    endpoint: PathBuf,
    /// Per-call deadline; `None` blocks indefinitely.
    timeout: Option<Duration>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a client for the well-known service endpoint
    /// (see [`default_socket_path`](crate::default_socket_path)).
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoint(endpoint::default_socket_path())
    }

    /// Creates a client for an explicit endpoint path.
    pub fn with_endpoint(path: impl Into<PathBuf>) -> Self {
        Self { endpoint: path.into(), timeout: Some(DEFAULT_TIMEOUT) }
    }

    /// Sets the per-call deadline (default [`DEFAULT_TIMEOUT`]).
    ///
    /// The deadline spans a whole operation: connect, request, and every
    /// response read share one budget. `None` waits forever, as does a
    /// timeout too large for the clock to represent.
    #[must_use]
    pub const fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The endpoint path this client connects to.
    #[must_use]
    pub fn endpoint(&self) -> &Path {
        &self.endpoint
    }

    /// Enumerates the devices currently paired with the service.
    ///
    /// Devices are returned in the service's response order; callers that
    /// build menus from the list rely on positions matching it. An empty
    /// vec is a successful "nothing paired right now" answer, which is a
    /// different situation from [`Error::ServiceUnavailable`] (no service
    /// to ask at all).
    ///
    /// Any failure after the connection opens, including a channel that
    /// dies halfway through the list, discards the partial list and
    /// reports the whole call as failed.
    pub fn list_devices(&self) -> Result<Vec<Device>> {
        let deadline = Deadline::start(self.timeout);
        let stream = self.connect(deadline)?;

        let mut w = BufWriter::new(DeadlineStream { stream: &stream, deadline });
        write_string(&mut w, Command::DeviceList.tag())?;
        w.flush().map_err(WireError::Io)?;

        let mut r = BufReader::new(DeadlineStream { stream: &stream, deadline });
        let count = read_u32(&mut r)?;
        debug!(count, "device list announced");

        // The count is service-supplied; grow as entries actually arrive
        // instead of trusting it for a preallocation.
        let mut devices = Vec::new();
        for _ in 0..count {
            let id = read_string(&mut r)?;
            let display_name = read_string(&mut r)?;
            devices.push(Device { id, display_name });
        }
        Ok(devices)
    }

    /// Submits a file-transfer job for the device with `device_id`.
    ///
    /// `device_id` must come from a previous [`Client::list_devices`]
    /// call; the service is the sole authority on whether it is still
    /// valid. `files` are the absolute paths to hand over, written
    /// verbatim.
    ///
    /// The exchange is one-way. `Ok(())` means the complete request
    /// reached the channel (the job was *submitted*) and says nothing
    /// about whether the transfer later succeeds. Fails with
    /// [`Error::NoFiles`] before touching the channel if `files` is
    /// empty.
    pub fn send_files<S: AsRef<str>>(&self, device_id: &str, files: &[S]) -> Result<()> {
        if files.is_empty() {
            return Err(Error::NoFiles);
        }
        let count = u32::try_from(files.len())
            .map_err(|_| WireError::LengthOverflow { len: files.len() })?;

        let deadline = Deadline::start(self.timeout);
        let stream = self.connect(deadline)?;
        debug!(device_id, files = files.len(), "submitting transfer job");

        let mut w = BufWriter::new(DeadlineStream { stream: &stream, deadline });
        write_string(&mut w, Command::SendFiles.tag())?;
        write_string(&mut w, device_id)?;
        write_u32(&mut w, count)?;
        for file in files {
            write_string(&mut w, file.as_ref())?;
        }
        w.flush().map_err(WireError::Io)?;
        Ok(())
    }

    /// Opens the channel, failing fast if the budget is already spent.
    ///
    /// A connect failure here is the expected service-not-running
    /// condition, reported as [`Error::ServiceUnavailable`] so callers
    /// can tell it apart from a service that answered badly.
    fn connect(&self, deadline: Deadline) -> Result<UnixStream> {
        let stream = UnixStream::connect(&self.endpoint).map_err(|e| {
            debug!(endpoint = %self.endpoint.display(), error = %e, "service unavailable");
            Error::ServiceUnavailable { endpoint: self.endpoint.clone(), source: e }
        })?;
        deadline.check()?;
        Ok(stream)
    }
}

/// Absolute deadline for one client operation.
///
/// The configured timeout is converted to an instant once per call; every
/// socket read and write then works against the remaining budget rather
/// than getting a fresh allowance.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    /// Instant after which the call has timed out; `None` waits forever.
    at: Option<Instant>,
}

impl Deadline {
    /// Starts the clock for one operation. A timeout too large for the
    /// clock to represent counts as no deadline at all.
    fn start(timeout: Option<Duration>) -> Self {
        Self { at: timeout.and_then(|t| Instant::now().checked_add(t)) }
    }

    /// Fails with [`Error::Timeout`] once the deadline has passed.
    fn check(&self) -> Result<()> {
        self.budget().map(|_| ()).map_err(|_| Error::Timeout)
    }

    /// Remaining budget, or a `TimedOut` I/O error if it is spent.
    fn budget(&self) -> io::Result<Option<Duration>> {
        match self.at {
            None => Ok(None),
            Some(at) => {
                let left = at.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    Err(io::Error::new(io::ErrorKind::TimedOut, "call deadline elapsed"))
                } else {
                    Ok(Some(left))
                }
            }
        }
    }
}

/// Stream adapter that re-arms the socket's I/O timeout with the
/// remaining budget before every read and write.
///
/// A timeout armed once per phase bounds each syscall, not the call: a
/// peer delivering one byte per interval would reset it every time.
/// Re-armed per syscall, the whole exchange stays inside the deadline,
/// and a spent budget surfaces as a `TimedOut`/`WouldBlock` I/O error
/// that the error mapping turns into [`Error::Timeout`].
struct DeadlineStream<'a> {
    /// The connection; timeouts are set through it before each call.
    stream: &'a UnixStream,
    /// Shared budget for the whole operation.
    deadline: Deadline,
}

impl Read for DeadlineStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.set_read_timeout(self.deadline.budget()?)?;
        self.stream.read(buf)
    }
}

impl Write for DeadlineStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.set_write_timeout(self.deadline.budget()?)?;
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::os::unix::net::UnixListener;
    use std::thread;

    use super::*;

    /// Binds a listener on a fresh socket path and serves exactly one
    /// connection with `serve` on a background thread.
    fn fake_service<T, F>(serve: F) -> (tempfile::TempDir, PathBuf, thread::JoinHandle<T>)
    where
        F: FnOnce(UnixStream) -> T + Send + 'static,
        T: Send + 'static,
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beamto.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            serve(stream)
        });
        (dir, path, handle)
    }

    /// Length-prefixed encoding built by hand, independent of the codec.
    fn wire_string(text: &str) -> Vec<u8> {
        let mut bytes = (text.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(text.as_bytes());
        bytes
    }

    #[test]
    fn list_devices_with_nothing_paired_is_ok_and_empty() {
        let (_dir, path, server) = fake_service(|mut s| {
            let tag = read_string(&mut s).unwrap();
            assert_eq!(Command::from_tag(&tag), Some(Command::DeviceList));
            write_u32(&mut s, 0).unwrap();
        });

        let devices = Client::with_endpoint(&path).list_devices().unwrap();
        assert!(devices.is_empty());
        server.join().unwrap();
    }

    #[test]
    fn list_devices_preserves_service_order() {
        let (_dir, path, server) = fake_service(|mut s| {
            read_string(&mut s).unwrap();
            write_u32(&mut s, 2).unwrap();
            for (id, name) in [("d1", "Phone"), ("d2", "Tablet")] {
                write_string(&mut s, id).unwrap();
                write_string(&mut s, name).unwrap();
            }
        });

        let devices = Client::with_endpoint(&path).list_devices().unwrap();
        assert_eq!(
            devices,
            vec![
                Device { id: "d1".into(), display_name: "Phone".into() },
                Device { id: "d2".into(), display_name: "Tablet".into() },
            ]
        );
        server.join().unwrap();
    }

    #[test]
    fn absent_service_is_unavailable_not_a_protocol_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.sock");

        let err = Client::with_endpoint(&path).list_devices().unwrap_err();
        assert!(err.is_unavailable(), "got {err:?}");
    }

    #[test]
    fn service_closing_before_the_count_is_a_protocol_error() {
        let (_dir, path, server) = fake_service(|mut s| {
            // Read the request, then hang up without answering.
            read_string(&mut s).unwrap();
        });

        let err = Client::with_endpoint(&path).list_devices().unwrap_err();
        assert!(
            matches!(err, Error::Protocol(WireError::ShortRead { .. })),
            "got {err:?}"
        );
        server.join().unwrap();
    }

    #[test]
    fn truncated_device_entry_fails_the_whole_call() {
        let (_dir, path, server) = fake_service(|mut s| {
            read_string(&mut s).unwrap();
            write_u32(&mut s, 2).unwrap();
            write_string(&mut s, "d1").unwrap();
            write_string(&mut s, "Phone").unwrap();
            // Second entry: declare a four-byte id but deliver half of it.
            write_u32(&mut s, 4).unwrap();
            s.write_all(b"ab").unwrap();
        });

        let err = Client::with_endpoint(&path).list_devices().unwrap_err();
        assert!(
            matches!(err, Error::Protocol(WireError::ShortRead { .. })),
            "already-decoded entries must not leak out of a failed call, got {err:?}"
        );
        server.join().unwrap();
    }

    #[test]
    fn garbled_device_name_is_a_protocol_error() {
        let (_dir, path, server) = fake_service(|mut s| {
            read_string(&mut s).unwrap();
            write_u32(&mut s, 1).unwrap();
            write_string(&mut s, "d1").unwrap();
            write_u32(&mut s, 2).unwrap();
            s.write_all(&[0xFF, 0xFE]).unwrap();
        });

        let err = Client::with_endpoint(&path).list_devices().unwrap_err();
        assert!(
            matches!(err, Error::Protocol(WireError::InvalidEncoding(_))),
            "got {err:?}"
        );
        server.join().unwrap();
    }

    #[test]
    fn send_files_writes_the_exact_field_sequence() {
        let (_dir, path, server) = fake_service(|mut s| {
            let mut bytes = Vec::new();
            s.read_to_end(&mut bytes).unwrap();
            bytes
        });

        Client::with_endpoint(&path)
            .send_files("d1", &[r"C:\docs\a.txt", r"C:\docs\b.txt"])
            .unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&wire_string("send-files"));
        expected.extend_from_slice(&wire_string("d1"));
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(&wire_string(r"C:\docs\a.txt"));
        expected.extend_from_slice(&wire_string(r"C:\docs\b.txt"));
        assert_eq!(server.join().unwrap(), expected);
    }

    #[test]
    fn send_files_with_empty_set_is_rejected_before_connecting() {
        // A connect attempt would fail differently (unavailable), so the
        // NoFiles result proves the guard ran first.
        let empty: &[&str] = &[];
        let err = Client::with_endpoint("/nonexistent/beamto.sock")
            .send_files("d1", empty)
            .unwrap_err();
        assert!(matches!(err, Error::NoFiles), "got {err:?}");
    }

    #[test]
    fn send_files_without_service_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.sock");

        let err = Client::with_endpoint(&path)
            .send_files("d1", &["/tmp/a.txt"])
            .unwrap_err();
        assert!(err.is_unavailable(), "got {err:?}");
    }

    #[test]
    fn unresponsive_service_times_out() {
        let (_dir, path, server) = fake_service(|mut s| {
            // Accept the request but never answer; keep the channel open
            // past the client's deadline so it cannot see EOF instead.
            read_string(&mut s).unwrap();
            thread::sleep(Duration::from_millis(500));
        });

        let err = Client::with_endpoint(&path)
            .timeout(Some(Duration::from_millis(100)))
            .list_devices()
            .unwrap_err();
        assert!(err.is_timeout(), "got {err:?}");
        server.join().unwrap();
    }

    #[test]
    fn trickled_bytes_do_not_stretch_the_deadline() {
        let (_dir, path, server) = fake_service(|mut s| {
            read_string(&mut s).unwrap();
            write_u32(&mut s, 1).unwrap();
            // Announce an eight-byte id, then deliver it one byte per
            // 50 ms: each recv succeeds well inside any per-syscall
            // timeout, so only the shared budget can stop the call.
            write_u32(&mut s, 8).unwrap();
            for byte in *b"device-x" {
                thread::sleep(Duration::from_millis(50));
                if s.write_all(&[byte]).is_err() {
                    // The client gave up and hung up; done.
                    break;
                }
            }
        });

        let err = Client::with_endpoint(&path)
            .timeout(Some(Duration::from_millis(100)))
            .list_devices()
            .unwrap_err();
        assert!(err.is_timeout(), "got {err:?}");
        server.join().unwrap();
    }

    #[test]
    fn no_timeout_means_wait_for_the_answer() {
        let (_dir, path, server) = fake_service(|mut s| {
            read_string(&mut s).unwrap();
            // Answer late; with no deadline the call blocks until the
            // data arrives rather than giving up.
            thread::sleep(Duration::from_millis(50));
            write_u32(&mut s, 0).unwrap();
        });

        let devices = Client::with_endpoint(&path)
            .timeout(None)
            .list_devices()
            .unwrap();
        assert!(devices.is_empty());
        server.join().unwrap();
    }

    #[test]
    fn huge_timeout_is_treated_as_no_deadline() {
        let (_dir, path, server) = fake_service(|mut s| {
            read_string(&mut s).unwrap();
            write_u32(&mut s, 0).unwrap();
        });

        // A budget too large for the clock to represent must degrade to
        // waiting, not abort the call.
        let devices = Client::with_endpoint(&path)
            .timeout(Some(Duration::from_secs(u64::MAX)))
            .list_devices()
            .unwrap();
        assert!(devices.is_empty());
        server.join().unwrap();
    }
}
