// SPDX-License-Identifier: MIT
//
// Raw tty device — the input side of the terminal.
//
// Safety: termios (tcgetattr, tcsetattr) and poll are plain POSIX calls
// through libc with no safe std equivalent. Each unsafe block is a single
// call on a file descriptor we own.
#![allow(unsafe_code)]
//
// `Tty::open` opens the controlling terminal (by default /dev/tty, so it
// works even with stdin redirected), saves its termios and switches it to
// raw mode: no echo, no line buffering, no signal keys, 8-bit clean. VMIN
// and VTIME are both zero; the read timeout is enforced with poll() so it
// can be finer than VTIME's tenths of a second.
//
// Every read takes at most six bytes (the longest special-key sequence)
// and hands them to the decoder in `input`. A timeout or a failed read is
// "no key", never an error. Only acquisition fails loudly.
//
// The saved termios is restored by `close()` or on drop, whichever comes
// first, so the terminal is back in cooked mode on every exit path. It is
// also registered process-wide for the panic hook, which cannot reach the
// `Tty` itself and must restore before the panic message is printed.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::input::{self, Key, KeyDecoder, MAX_SEQUENCE};

/// Default read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2);

/// Default device path.
pub const DEFAULT_PATH: &str = "/dev/tty";

// ─── TtyConfig ───────────────────────────────────────────────────────────────

/// Where to open the tty and how long a read may wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtyConfig {
    /// Device path.
    pub path: PathBuf,
    /// Upper bound on how long one read waits for input.
    pub timeout: Duration,
}

impl Default for TtyConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// ─── Tty ─────────────────────────────────────────────────────────────────────

/// The terminal device in raw mode.
///
/// ```no_run
/// use vt_term::tty::{Tty, TtyConfig};
///
/// let mut tty = Tty::open(TtyConfig::default())?;
/// if let Some(key) = tty.key() {
///     println!("{key}");
/// }
/// tty.close()?;
/// # Ok::<(), vt_term::Error>(())
/// ```
pub struct Tty {
    file: File,
    path: PathBuf,
    original: libc::termios,
    timeout: Duration,
    decoder: KeyDecoder,
    restored: bool,
}

impl Tty {
    /// Open the device and switch it to raw mode.
    ///
    /// # Errors
    ///
    /// [`Error::Device`] if the device cannot be opened, [`Error::RawMode`]
    /// if it is not a terminal or its settings cannot be changed.
    pub fn open(config: TtyConfig) -> Result<Self> {
        let TtyConfig { path, timeout } = config;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| Error::Device {
                path: path.clone(),
                source,
            })?;

        let original = enable_raw_mode(&file).map_err(Error::RawMode)?;
        save_termios(file.as_raw_fd(), original);
        crate::terminal::install_panic_hook();
        debug!(path = %path.display(), ?timeout, "tty opened in raw mode");

        Ok(Self {
            file,
            path,
            original,
            timeout,
            decoder: KeyDecoder::new(),
            restored: false,
        })
    }

    /// The device path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current read timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Change the read timeout. Zero makes reads non-blocking.
    pub const fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    // ── Reading ─────────────────────────────────────────────────────

    /// Wait up to the timeout, then read at most six bytes.
    ///
    /// Returns `Ok(0)` on timeout.
    fn read_burst(&mut self, buf: &mut [u8; MAX_SEQUENCE]) -> io::Result<usize> {
        let mut pfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let ready = unsafe { libc::poll(&raw mut pfd, 1, poll_timeout_ms(self.timeout)) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            return if err.kind() == io::ErrorKind::Interrupted {
                Ok(0)
            } else {
                Err(err)
            };
        }
        if ready == 0 {
            return Ok(0);
        }
        match self.file.read(buf) {
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                Ok(0)
            }
            other => other,
        }
    }

    /// One read as a byte slice of `buf`, with failures folded into an
    /// empty read.
    fn read_quiet<'b>(&mut self, buf: &'b mut [u8; MAX_SEQUENCE]) -> &'b [u8] {
        match self.read_burst(buf) {
            Ok(n) => &buf[..n],
            Err(e) => {
                trace!(error = %e, "tty read failed");
                &buf[..0]
            }
        }
    }

    /// Read one key, suppressing an immediate repeat of the previous key.
    ///
    /// `None` on timeout, on a read error, on a NUL byte, and for the
    /// suppressed repeat.
    pub fn key(&mut self) -> Option<Key> {
        let mut buf = [0u8; MAX_SEQUENCE];
        let bytes = self.read_quiet(&mut buf);
        if bytes.is_empty() {
            self.decoder.miss();
            return None;
        }
        self.decoder.key(bytes)
    }

    /// Read one key as a character (glyph for special keys).
    pub fn rune(&mut self) -> Option<char> {
        let mut buf = [0u8; MAX_SEQUENCE];
        input::rune_of(self.read_quiet(&mut buf))
    }

    /// Read one key as a display label. Empty on timeout.
    pub fn label(&mut self) -> String {
        let mut buf = [0u8; MAX_SEQUENCE];
        input::label_of(self.read_quiet(&mut buf))
    }

    /// Read one burst of raw bytes, for inspecting what a key sends.
    ///
    /// # Errors
    ///
    /// Returns the read error instead of folding it into an empty result.
    pub fn raw_bytes(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = [0u8; MAX_SEQUENCE];
        let n = self.read_burst(&mut buf)?;
        Ok(buf[..n].to_vec())
    }

    // ── Writing ─────────────────────────────────────────────────────

    /// Write a string straight to the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.file.write_all(s.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }

    // ── Teardown ────────────────────────────────────────────────────

    /// Restore the saved terminal settings and close the device.
    ///
    /// # Errors
    ///
    /// [`Error::RawMode`] if the settings cannot be restored.
    pub fn close(mut self) -> Result<()> {
        self.restore().map_err(Error::RawMode)
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        let fd = self.file.as_raw_fd();
        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const self.original) } != 0 {
            return Err(io::Error::last_os_error());
        }
        self.restored = true;
        forget_termios(fd);
        debug!(path = %self.path.display(), "tty restored");
        Ok(())
    }
}

impl Drop for Tty {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!(error = %e, "tty restore on drop failed");
        }
        // The descriptor closes with `file`.
        forget_termios(self.file.as_raw_fd());
    }
}

// ─── Panic Restore ───────────────────────────────────────────────────────────

/// The termios of the most recently opened `Tty`, with its descriptor.
static SAVED_TERMIOS: Mutex<Option<(RawFd, libc::termios)>> = Mutex::new(None);

fn save_termios(fd: RawFd, termios: libc::termios) {
    *SAVED_TERMIOS.lock().unwrap_or_else(PoisonError::into_inner) = Some((fd, termios));
}

fn forget_termios(fd: RawFd) {
    let mut saved = SAVED_TERMIOS.lock().unwrap_or_else(PoisonError::into_inner);
    if matches!(*saved, Some((saved_fd, _)) if saved_fd == fd) {
        *saved = None;
    }
}

/// Put back the registered termios, if any. Best effort, for the panic
/// hook.
pub(crate) fn restore_saved_termios() {
    let saved = *SAVED_TERMIOS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some((fd, termios)) = saved {
        unsafe {
            let _ = libc::tcsetattr(fd, libc::TCSANOW, &raw const termios);
        }
    }
}

impl std::fmt::Debug for Tty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tty")
            .field("path", &self.path)
            .field("timeout", &self.timeout)
            .field("last", &self.decoder.last())
            .finish_non_exhaustive()
    }
}

// ─── termios ─────────────────────────────────────────────────────────────────

/// Switch `file` to raw mode, returning the settings to restore later.
fn enable_raw_mode(file: &File) -> io::Result<libc::termios> {
    let fd = file.as_raw_fd();
    unsafe {
        let mut termios: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &raw mut termios) != 0 {
            return Err(io::Error::last_os_error());
        }
        let original = termios;

        termios.c_iflag &= !(libc::IGNBRK
            | libc::BRKINT
            | libc::PARMRK
            | libc::ISTRIP
            | libc::INLCR
            | libc::IGNCR
            | libc::ICRNL
            | libc::IXON);
        termios.c_oflag &= !libc::OPOST;
        termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
        termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
        termios.c_cflag |= libc::CS8;

        // Never block in read(); poll() does the waiting.
        termios.c_cc[libc::VMIN] = 0;
        termios.c_cc[libc::VTIME] = 0;

        if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(original)
    }
}

/// poll() timeout in whole milliseconds, rounding a sub-millisecond
/// (but non-zero) timeout up to 1.
fn poll_timeout_ms(timeout: Duration) -> libc::c_int {
    let ms = timeout.as_millis();
    let ms = if ms == 0 && !timeout.is_zero() { 1 } else { ms };
    libc::c_int::try_from(ms).unwrap_or(libc::c_int::MAX)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
