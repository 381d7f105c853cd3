// SPDX-License-Identifier: MIT
//
// Terminal control — size probing, screen setup, and RAII teardown.
//
// Safety: This module uses `unsafe` for ioctl (TIOCGWINSZ), isatty, and a
// raw fd write in the panic hook. These are the standard POSIX interfaces
// for terminal queries and have no safe std equivalent. Each unsafe block
// is minimal.
#![allow(unsafe_code)]
//
// Entering prepares the screen for a canvas: reset the device, erase the
// screen, hide the cursor, switch off line wrap (a full-width row must not
// scroll the screen) and local echo. Leaving turns wrap and the cursor back
// on and homes the cursor. Every sequence comes from the escape catalog.
//
// Raw input mode is not handled here; the `tty` module owns the input
// device and its termios state.
//
// The panic hook first puts back any termios a `Tty` saved, so the panic
// message is printed in cooked mode, then writes a fixed restore sequence
// directly to fd 1 so a panic mid-draw (while stdout is locked) still
// leaves a usable terminal.

use std::io::{self, Stdout, Write};
use std::sync::{Arc, Once};

use tracing::debug;

use crate::catalog::Catalog;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Size used when the terminal cannot be probed.
    pub const DEFAULT: Self = Self { cols: 80, rows: 25 };
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic-Safe Restore ─────────────────────────────────────────────────────

/// Restore sequence for emergency use: line wrap on, attributes reset,
/// cursor shown.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[?7h\x1b[0m\x1b[?25h";

/// Installs the panic hook at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

pub(crate) fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            #[cfg(unix)]
            crate::tty::restore_saved_termios();
            emergency_restore();
            original(info);
        }));
    });
}

/// Write the restore sequence straight to stdout's file descriptor,
/// bypassing the `io::stdout()` lock.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Screen setup handle with RAII cleanup.
///
/// [`enter`](Self::enter) prepares the screen for canvas drawing; the
/// screen is restored by [`leave`](Self::leave) or on drop.
///
/// ```no_run
/// use std::sync::Arc;
/// use vt_term::catalog::Catalog;
/// use vt_term::terminal::Terminal;
///
/// let mut term = Terminal::stdout(Arc::new(Catalog::new()));
/// term.enter()?;
/// // ... draw ...
/// // Restored automatically on drop.
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Terminal<W: Write = Stdout> {
    out: W,
    catalog: Arc<Catalog>,
    active: bool,
}

impl Terminal<Stdout> {
    /// Terminal writing to stdout.
    #[must_use]
    pub fn stdout(catalog: Arc<Catalog>) -> Self {
        Self::new(io::stdout(), catalog)
    }
}

impl<W: Write> Terminal<W> {
    /// Terminal writing its setup sequences to `out`. Does not enter.
    pub const fn new(out: W, catalog: Arc<Catalog>) -> Self {
        Self {
            out,
            catalog,
            active: false,
        }
    }

    /// Whether the screen is currently set up.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// The catalog used for every sequence.
    #[must_use]
    pub const fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The underlying writer.
    pub const fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    /// Reset, erase, hide the cursor, disable line wrap and echo.
    ///
    /// Idempotent: calling `enter()` while active is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        install_panic_hook();

        let c = &self.catalog;
        let mut seq = String::new();
        seq.push_str(&c.resolve("Reset Device", &[]));
        seq.push_str(&c.resolve("Erase Screen", &[]));
        seq.push_str(&c.cursor_visibility(false));
        seq.push_str(&c.line_wrap(false));
        seq.push_str(&c.resolve("Echo Off", &[]));
        self.out.write_all(seq.as_bytes())?;
        self.out.flush()?;

        debug!("terminal entered");
        self.active = true;
        Ok(())
    }

    /// Re-enable line wrap, show the cursor, and home it.
    ///
    /// Idempotent: calling `leave()` while inactive is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        let c = &self.catalog;
        let mut seq = String::new();
        seq.push_str(&c.reset_attributes());
        seq.push_str(&c.line_wrap(true));
        seq.push_str(&c.cursor_visibility(true));
        seq.push_str(&c.cursor_home());
        self.out.write_all(seq.as_bytes())?;
        self.out.flush()?;

        debug!("terminal left");
        self.active = false;
        Ok(())
    }
}

impl<W: Write> Drop for Terminal<W> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn term() -> Terminal<Vec<u8>> {
        Terminal::new(Vec::new(), Arc::new(Catalog::new()))
    }

    // ── Size ──────────────────────────────────────────────────────────

    #[test]
    fn default_size_is_80_by_25() {
        assert_eq!(Size::DEFAULT, Size { cols: 80, rows: 25 });
    }

    // ── Queries ───────────────────────────────────────────────────────

    #[test]
    fn get_size_does_not_panic() {
        let _ = get_size();
    }

    #[test]
    fn is_tty_does_not_panic() {
        let _ = is_tty();
    }

    // ── Emergency restore ─────────────────────────────────────────────

    #[test]
    fn emergency_restore_shows_cursor_and_wraps() {
        let s = std::str::from_utf8(EMERGENCY_RESTORE).unwrap();
        assert!(s.contains("\x1b[?7h"));
        assert!(s.contains("\x1b[0m"));
        assert!(s.ends_with("\x1b[?25h"));
    }

    // ── Terminal ──────────────────────────────────────────────────────

    #[test]
    fn enter_writes_setup() {
        let mut t = term();
        t.enter().unwrap();
        assert!(t.is_active());
        assert_eq!(t.writer().as_slice(), b"\x1bc\x1b[2J\x1b[?25l\x1b[?7l\x1b[12h");
    }

    #[test]
    fn leave_writes_teardown() {
        let mut t = term();
        t.enter().unwrap();
        t.writer().clear();
        t.leave().unwrap();
        assert!(!t.is_active());
        assert_eq!(t.writer().as_slice(), b"\x1b[0m\x1b[?7h\x1b[?25h\x1b[H");
    }

    #[test]
    fn double_enter_is_idempotent() {
        let mut t = term();
        t.enter().unwrap();
        let len = t.writer().len();
        t.enter().unwrap();
        assert_eq!(t.writer().len(), len);
    }

    #[test]
    fn leave_without_enter_writes_nothing() {
        let mut t = term();
        t.leave().unwrap();
        assert!(t.writer().is_empty());
    }

    #[test]
    fn multiple_cycles() {
        let mut t = term();
        for _ in 0..3 {
            t.enter().unwrap();
            assert!(t.is_active());
            t.leave().unwrap();
            assert!(!t.is_active());
        }
    }

    #[test]
    fn drop_after_enter_does_not_panic() {
        let mut t = term();
        t.enter().unwrap();
        drop(t);
    }
}
