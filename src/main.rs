// SPDX-License-Identifier: MIT
//
// vtcanvas — key and canvas inspector for the vt-term core.
//
// Two modes:
//
//   vtcanvas          full-screen inspector: a status panel showing the last
//                     decoded key, a history of labels, the eight colors in
//                     both bright and dark, and an `@` moved by the arrows.
//   vtcanvas keys     line mode: print the raw bytes, decoded key and label
//                     of every key pressed. Useful to see what a terminal
//                     actually sends.
//
// Both quit on `q` (Ctrl-C also quits the inspector; raw mode turns it
// into a plain byte).
//
// Layout of the inspector:
//
//   ┌──────────────────────────────┐
//   │ title bar                    │  row 0
//   │ size / resizes / ticks       │  row 1
//   │ last key + code              │  row 2
//   │ key history                  │  row 3
//   │ palette (bright, dark)       │  rows 5–6
//   ├──────────────────────────────┤
//   │ playfield for `@`            │  rows 8..
//   └──────────────────────────────┘
//
// Logging goes to $TMPDIR/vtcanvas.log, and only when VTCANVAS_LOG holds a
// filter such as `debug` or `vt_term=trace`; stdout belongs to the canvas.

use std::collections::VecDeque;
use std::env;
use std::fs::File;
use std::process;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use vt_term::canvas::Canvas;
use vt_term::catalog::Catalog;
use vt_term::color::{self, AttributeColor};
use vt_term::event_loop::{Action, App, EventLoop};
use vt_term::input::{self, Key};
use vt_term::terminal::Size;
use vt_term::tty::{Tty, TtyConfig};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "VTCANVAS_LOG";

/// Labels kept in the history row.
const HISTORY: usize = 32;

/// First row of the playfield.
const FIELD_TOP: u16 = 8;

// ─── Inspector ──────────────────────────────────────────────────────────────

/// The full-screen inspector state.
#[derive(Debug)]
struct Inspector {
    /// Position of the `@`.
    pos: (u16, u16),
    /// Where the `@` was last painted, to blank it on the next paint.
    painted: Option<(u16, u16)>,
    last: Option<Key>,
    history: VecDeque<Key>,
    ticks: u64,
    resizes: u32,
    /// Static rows (title, palette) need painting again after a resize.
    fresh: bool,
}

impl Inspector {
    const fn new() -> Self {
        Self {
            pos: (0, FIELD_TOP),
            painted: None,
            last: None,
            history: VecDeque::new(),
            ticks: 0,
            resizes: 0,
            fresh: true,
        }
    }

    /// Move the `@` for a navigation key, staying inside the playfield.
    fn steer(&mut self, key: Key, size: Size) {
        if size.rows <= FIELD_TOP || size.cols == 0 {
            return;
        }
        let (x, y) = self.pos;
        let right = size.cols - 1;
        let bottom = size.rows - 1;
        self.pos = match key {
            Key::Up => (x, y.saturating_sub(1).max(FIELD_TOP)),
            Key::Down => (x, (y + 1).min(bottom)),
            Key::Left => (x.saturating_sub(1), y),
            Key::Right => ((x + 1).min(right), y),
            Key::Home => (0, y),
            Key::End => (right, y),
            Key::PageUp => (x, FIELD_TOP),
            Key::PageDown => (x, bottom),
            _ => return,
        };
    }

    fn clamp(&mut self, size: Size) {
        let (x, y) = self.pos;
        self.pos = (
            x.min(size.cols.saturating_sub(1)),
            y.clamp(FIELD_TOP, size.rows.saturating_sub(1).max(FIELD_TOP)),
        );
    }

    fn paint_static(canvas: &Canvas) {
        let w = usize::from(canvas.width());
        let title = format!("{:<w$}", " vtcanvas · arrows/Home/End/PgUp/PgDn move · q quits");
        canvas.write(0, 0, AttributeColor::WHITE, AttributeColor::BLUE, &title);

        let mut x = 1;
        for name in color::color_names() {
            let dark = AttributeColor::named(name);
            let bright = dark.combine(AttributeColor::BRIGHT);
            let label = format!("{name:<8}");
            canvas.write(x, 5, bright, AttributeColor::empty(), &label);
            canvas.write(x, 6, dark, AttributeColor::empty(), &label);
            x = x.saturating_add(9);
        }
    }
}

/// Write `text` at row `y`, padded with spaces to the full width.
fn line(canvas: &Canvas, y: u16, fg: AttributeColor, text: &str) {
    let w = usize::from(canvas.width());
    let padded = format!("{text:<w$}");
    canvas.write(0, y, fg, AttributeColor::empty(), &padded);
}

impl App for Inspector {
    fn on_key(&mut self, key: Key, canvas: &Canvas) -> Action {
        if key == Key::Byte(b'q') || key == Key::CTRL_C {
            return Action::Quit;
        }
        debug!(code = key.code(), %key, "key");
        self.last = Some(key);
        if self.history.len() == HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(key);
        self.steer(key, canvas.size());
        Action::Continue
    }

    fn on_resize(&mut self, size: Size, _canvas: &Canvas) {
        info!(cols = size.cols, rows = size.rows, "resized");
        self.resizes += 1;
        self.painted = None;
        self.fresh = true;
        self.clamp(size);
    }

    fn on_tick(&mut self, _canvas: &Canvas) -> bool {
        self.ticks += 1;
        self.ticks % 20 == 0
    }

    fn paint(&mut self, canvas: &Canvas) {
        if self.fresh {
            Self::paint_static(canvas);
            self.fresh = false;
        }

        let size = canvas.size();
        line(
            canvas,
            1,
            AttributeColor::LIGHT_GRAY,
            &format!(
                " size {}x{}   resizes {}   ticks {}",
                size.cols, size.rows, self.resizes, self.ticks
            ),
        );
        let last = self.last.map_or_else(
            || " last key: none".to_owned(),
            |k| format!(" last key: {k}   code {:#05x}", k.code()),
        );
        line(canvas, 2, AttributeColor::LIGHT_YELLOW, &last);
        let history: Vec<String> = self.history.iter().map(ToString::to_string).collect();
        line(canvas, 3, AttributeColor::CYAN, &format!(" {}", history.join(" ")));

        if let Some((x, y)) = self.painted {
            canvas.plot(x, y, ' ');
        }
        let (x, y) = self.pos;
        canvas.write_char(x, y, AttributeColor::LIGHT_GREEN, AttributeColor::empty(), '@');
        self.painted = Some(self.pos);
    }
}

// ─── Key dump ───────────────────────────────────────────────────────────────

/// Print every key's bytes, decoded key and label until `q`.
fn dump_keys() -> vt_term::Result<()> {
    let mut tty = Tty::open(TtyConfig {
        timeout: Duration::from_millis(100),
        ..TtyConfig::default()
    })?;
    tty.write_str("press keys, q quits\r\n")?;

    loop {
        let bytes = tty.raw_bytes()?;
        let Some(key) = input::decode(&bytes) else {
            continue;
        };
        tty.write_str(&format!(
            "{bytes:<24}  {label:<6}  {code:#05x}\r\n",
            bytes = format!("{bytes:?}"),
            label = input::label_of(&bytes),
            code = key.code(),
        ))?;
        if key == Key::Byte(b'q') {
            break;
        }
    }
    tty.close()
}

// ─── Logging ────────────────────────────────────────────────────────────────

fn init_logging() {
    let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) else {
        return;
    };
    let path = env::temp_dir().join("vtcanvas.log");
    match File::options().create(true).append(true).open(&path) {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init(),
        Err(e) => eprintln!("vtcanvas: cannot open log file {}: {e}", path.display()),
    }
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn usage() -> ! {
    eprintln!("usage: vtcanvas [keys]");
    process::exit(2);
}

fn main() {
    init_logging();
    let args: Vec<String> = env::args().skip(1).collect();

    let result = match args.first().map(String::as_str) {
        None => EventLoop::new(Arc::new(Catalog::new()))
            .and_then(|mut event_loop| event_loop.run(&mut Inspector::new())),
        Some("keys") => dump_keys(),
        Some(_) => usage(),
    };

    if let Err(e) = result {
        eprintln!("vtcanvas: {e}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
