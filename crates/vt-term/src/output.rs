// SPDX-License-Identifier: MIT
//
// Output buffering and the running-attribute row writer.
//
// Two pieces keep the bytes we send to the terminal to a minimum:
//
//   OutputBuffer — accumulates a whole draw in memory so it reaches the
//   terminal in a single write() instead of one per escape sequence.
//
//   RowWriter — remembers the (fg, bg) pair the terminal is currently
//   using. Runs of identically colored cells cost one SGR sequence for the
//   whole run; the rest of the run is just characters.
//
// Every row starts from a known state: the writer positions the cursor at
// column 0, assumes no attributes, and ends the row with a reset. That
// keeps rows independent, which is what lets the canvas redraw only the
// dirty ones.

use std::io::{self, Write};

use crate::catalog::Catalog;
use crate::cell::Cell;
use crate::color::AttributeColor;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte buffer that collects one draw's output for a single `write()`.
///
/// Default capacity: 16 KB. An 80×25 screen of colored text fits without
/// reallocating.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    /// Create an empty buffer with default capacity (16 KB).
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append a character as UTF-8.
    #[inline]
    pub fn push_char(&mut self, ch: char) {
        let mut enc = [0u8; 4];
        self.buf
            .extend_from_slice(ch.encode_utf8(&mut enc).as_bytes());
    }

    /// Append a string verbatim.
    #[inline]
    pub fn push_str(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Write accumulated output to `w` and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── RowWriter ───────────────────────────────────────────────────────────────

/// Writes canvas rows, emitting SGR only when the color pair changes.
///
/// # Attribute changes
///
/// When the next cell's combined attributes are a superset of what the
/// terminal already has, only the new set is emitted. Anything else (a
/// color switch, dropping a style, going back to plain) first resets, since
/// SGR can only add.
pub struct RowWriter<'a> {
    catalog: &'a Catalog,
    fg: AttributeColor,
    bg: AttributeColor,
}

impl<'a> RowWriter<'a> {
    /// A writer that resolves sequences through `catalog`.
    #[must_use]
    pub const fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            fg: AttributeColor::empty(),
            bg: AttributeColor::empty(),
        }
    }

    /// Position the cursor at the start of row `y` and forget the tracked
    /// colors. The previous row ended with a reset.
    pub fn begin_row(&mut self, out: &mut OutputBuffer, y: u16) {
        out.push_str(&self.catalog.cursor_to(0, y));
        self.fg = AttributeColor::empty();
        self.bg = AttributeColor::empty();
    }

    /// Emit one cell: colors if they changed, then the glyph.
    pub fn cell(&mut self, out: &mut OutputBuffer, cell: &Cell) {
        if cell.fg != self.fg || cell.bg != self.bg {
            let old = self.fg | self.bg;
            let new = cell.fg | cell.bg;
            if old != new {
                if !old.is_empty() && !new.contains(old) {
                    out.push_str(&self.catalog.reset_attributes());
                }
                if !new.is_empty() {
                    out.push_str(&new.render(self.catalog));
                }
            }
            self.fg = cell.fg;
            self.bg = cell.bg;
        }
        out.push_char(cell.glyph());
    }

    /// Close the row with a reset.
    pub fn end_row(&mut self, out: &mut OutputBuffer) {
        out.push_str(&self.catalog.reset_attributes());
        self.fg = AttributeColor::empty();
        self.bg = AttributeColor::empty();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
