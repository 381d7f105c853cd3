// SPDX-License-Identifier: MIT
//
// vt-term — VT100 canvas core for vtcanvas.
//
// Renders colored text onto a virtual character grid and flushes only the
// rows that changed, using plain VT100 escape sequences looked up by name
// from an owned catalog. On the input side it puts the controlling tty in
// raw mode and turns short byte bursts (arrows, Home/End, Page Up/Down,
// Ctrl-Insert) into one canonical key space.
//
// Layering, leaves first:
//
//   catalog  → named escape templates with placeholder substitution + cache
//   color    → AttributeColor, an ordered set of SGR codes
//   cell     → one grid position (character + fg + bg)
//   output   → single-write output buffer and the running-attribute writer
//   canvas   → the grid, dirty rows, resize policies, the diffing draw
//   input    → byte tables and the de-duplicating key decoder
//   tty      → the raw-mode device handle (unix)
//   resize   → SIGWINCH turned into a queue the main loop drains
//   terminal → size probing and screen setup/teardown
//   event_loop → poll key → mutate → draw → resize, on a fixed tick

pub mod canvas;
pub mod catalog;
pub mod cell;
pub mod color;
pub mod error;
#[cfg(unix)]
pub mod event_loop;
pub mod input;
pub mod output;
#[cfg(unix)]
pub mod resize;
pub mod terminal;
#[cfg(unix)]
pub mod tty;

pub use error::{Error, Result};
