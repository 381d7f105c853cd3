// SPDX-License-Identifier: MIT
//
// Event loop — poll a key, let the app mutate the canvas, draw, repeat.
//
// One iteration:
//
//   1. Poll one key (bounded by the tty timeout). Hand it to the app.
//   2. Drain the resize queue. On a pending resize, re-probe the size,
//      resize the canvas, tell the app, and schedule a full redraw.
//   3. Tick the app.
//   4. If anything happened, let the app paint into the canvas.
//   5. Draw: only dirty rows, or everything after a resize.
//   6. If no key arrived, sleep out the rest of the tick.
//
// While keys keep arriving the loop runs as fast as they come; when idle it
// settles to one iteration per tick. The canvas dirty set means an
// iteration where nothing changed writes zero bytes.
//
// The terminal is entered before the first iteration and left after the
// last one, including when the app or a draw fails.

use std::io::{Stdout, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::canvas::Canvas;
use crate::catalog::Catalog;
use crate::error::Result;
use crate::input::Key;
use crate::resize::ResizeEvents;
use crate::terminal::{self, Size, Terminal};
use crate::tty::{Tty, TtyConfig};

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the loop after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep running.
    Continue,
    /// Leave the loop.
    Quit,
}

/// Application interface for the event loop.
///
/// Only [`paint`](App::paint) is required.
pub trait App {
    /// Handle one key. Return [`Action::Quit`] to leave the loop.
    fn on_key(&mut self, _key: Key, _canvas: &Canvas) -> Action {
        Action::Continue
    }

    /// The canvas has just been resized to `size`.
    fn on_resize(&mut self, _size: Size, _canvas: &Canvas) {}

    /// Called once per iteration. Return `true` to request a paint.
    fn on_tick(&mut self, _canvas: &Canvas) -> bool {
        false
    }

    /// Bring the canvas up to date. Only changed cells reach the screen.
    fn paint(&mut self, canvas: &Canvas);
}

// ─── Key Source ──────────────────────────────────────────────────────────────

/// Where the loop gets keys from.
pub trait KeySource {
    /// One key, or `None` if nothing arrived within the source's timeout.
    fn poll_key(&mut self) -> Option<Key>;
}

impl KeySource for Tty {
    fn poll_key(&mut self) -> Option<Key> {
        self.key()
    }
}

// ─── LoopConfig ──────────────────────────────────────────────────────────────

/// Event loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// Length of an idle iteration. Default: 50ms.
    pub tick: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(50),
        }
    }
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// The render/input loop.
///
/// ```no_run
/// use std::sync::Arc;
/// use vt_term::canvas::Canvas;
/// use vt_term::catalog::Catalog;
/// use vt_term::color::AttributeColor;
/// use vt_term::event_loop::{Action, App, EventLoop};
/// use vt_term::input::Key;
///
/// struct Hello;
///
/// impl App for Hello {
///     fn on_key(&mut self, key: Key, _: &Canvas) -> Action {
///         if key == Key::Byte(b'q') { Action::Quit } else { Action::Continue }
///     }
///
///     fn paint(&mut self, canvas: &Canvas) {
///         canvas.write(0, 0, AttributeColor::LIGHT_GREEN, AttributeColor::empty(), "hello");
///     }
/// }
///
/// EventLoop::new(Arc::new(Catalog::new()))?.run(&mut Hello)?;
/// # Ok::<(), vt_term::Error>(())
/// ```
pub struct EventLoop<K: KeySource = Tty, W: Write = Stdout> {
    keys: K,
    terminal: Terminal<W>,
    canvas: Arc<Canvas>,
    resize: ResizeEvents,
    probe: fn() -> Option<Size>,
    config: LoopConfig,
}

impl EventLoop {
    /// Open the tty, listen for SIGWINCH, and size a canvas to the terminal.
    ///
    /// # Errors
    ///
    /// Fails if the tty cannot be opened in raw mode or the signal listener
    /// cannot be installed.
    pub fn new(catalog: Arc<Catalog>) -> Result<Self> {
        Self::with_config(catalog, TtyConfig::default(), LoopConfig::default())
    }

    /// [`new`](Self::new) with explicit tty and timing settings.
    ///
    /// # Errors
    ///
    /// Fails if the tty cannot be opened in raw mode or the signal listener
    /// cannot be installed.
    pub fn with_config(catalog: Arc<Catalog>, tty: TtyConfig, config: LoopConfig) -> Result<Self> {
        let keys = Tty::open(tty)?;
        let resize = ResizeEvents::listen()?;
        let canvas = Arc::new(Canvas::new(Arc::clone(&catalog)));
        Ok(Self::from_parts(keys, std::io::stdout(), canvas, resize, config))
    }
}

impl<K: KeySource, W: Write> EventLoop<K, W> {
    /// Assemble a loop from its pieces.
    pub fn from_parts(
        keys: K,
        out: W,
        canvas: Arc<Canvas>,
        resize: ResizeEvents,
        config: LoopConfig,
    ) -> Self {
        let terminal = Terminal::new(out, Arc::clone(canvas.catalog()));
        Self {
            keys,
            terminal,
            canvas,
            resize,
            probe: terminal::get_size,
            config,
        }
    }

    /// Replace the terminal size probe used when a resize is pending.
    #[must_use]
    pub fn with_size_probe(mut self, probe: fn() -> Option<Size>) -> Self {
        self.probe = probe;
        self
    }

    /// The shared canvas.
    #[must_use]
    pub const fn canvas(&self) -> &Arc<Canvas> {
        &self.canvas
    }

    /// The output writer.
    pub const fn writer(&mut self) -> &mut W {
        self.terminal.writer()
    }

    /// Run until the app returns [`Action::Quit`].
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails. The terminal is
    /// left either way.
    pub fn run(&mut self, app: &mut impl App) -> Result<()> {
        self.terminal.enter()?;
        debug!(tick = ?self.config.tick, "event loop started");

        let result = self.run_inner(app);
        let left = self.terminal.leave();

        debug!(ok = result.is_ok(), "event loop stopped");
        result?;
        left?;
        Ok(())
    }

    fn run_inner(&mut self, app: &mut impl App) -> Result<()> {
        let canvas = Arc::clone(&self.canvas);
        let mut needs_paint = true;
        let mut full_redraw = true;

        loop {
            let started = Instant::now();

            // ── Input ───────────────────────────────────────────────
            let key = self.keys.poll_key();
            if let Some(key) = key {
                if app.on_key(key, &canvas) == Action::Quit {
                    return Ok(());
                }
                needs_paint = true;
            }

            // ── Resize ──────────────────────────────────────────────
            if self.resize.take() {
                if let Some(size) = (self.probe)() {
                    if canvas.resize_to(size.cols, size.rows) {
                        app.on_resize(size, &canvas);
                    }
                }
                needs_paint = true;
                full_redraw = true;
            }

            // ── Tick ────────────────────────────────────────────────
            if app.on_tick(&canvas) {
                needs_paint = true;
            }

            // ── Paint & draw ────────────────────────────────────────
            if needs_paint {
                app.paint(&canvas);
                needs_paint = false;
            }
            let out = self.terminal.writer();
            if full_redraw {
                let erase = canvas.catalog().resolve("Erase Screen", &[]);
                out.write_all(erase.as_bytes())?;
                canvas.redraw_to(out)?;
                full_redraw = false;
            } else {
                canvas.draw_to(out)?;
            }

            if key.is_none() {
                if let Some(rest) = self.config.tick.checked_sub(started.elapsed()) {
                    thread::sleep(rest);
                }
            }
        }
    }
}

impl<K: KeySource, W: Write> std::fmt::Debug for EventLoop<K, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("canvas", &self.canvas)
            .field("resize", &self.resize)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
