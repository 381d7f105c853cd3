// SPDX-License-Identifier: MIT
//
// Canvas — the character grid, its dirty rows, and the diffing draw.
//
// Everything the caller wants on screen is written into a flat, row-major
// `Vec<Cell>`. Each mutation records which rows it touched; `draw` walks
// only those rows and sends them to the terminal in one write:
//
//   hide cursor
//   for each dirty row:  cursor to (0, y) · cells with SGR on color change · reset
//   cursor to bottom-right · restore cursor visibility
//
// A draw with no dirty rows emits nothing at all.
//
// Locking:
//
//   The grid sits behind one `RwLock`. Mutations and `draw` take it
//   exclusively; `at`, `cell` and `Display` take it shared. A resize
//   handler running on another thread therefore never observes (or
//   produces) a half-written grid. Lock poisoning is recovered rather than
//   propagated: the grid is always left structurally valid (cells.len() ==
//   width × height) before any code that could panic runs.
//
// Bounds:
//
//   Coordinates outside the grid are silently ignored by every mutator and
//   reported as `None` by the readers. Strings written near the right edge
//   are clipped at the end of the row.
//
// Resize:
//
//   `ResizePolicy::Preserve` (the default) copies the overlapping top-left
//   rectangle into the new grid. `ResizePolicy::Discard` starts the new
//   grid blank. Either way every row of the new grid is dirty.

use std::collections::BTreeSet;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace};

use crate::catalog::Catalog;
use crate::cell::Cell;
use crate::color::AttributeColor;
use crate::output::{OutputBuffer, RowWriter};
use crate::terminal::{self, Size};

// ─── ResizePolicy ────────────────────────────────────────────────────────────

/// What happens to existing content when the canvas changes size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizePolicy {
    /// Copy the overlapping top-left rectangle into the new grid.
    #[default]
    Preserve,
    /// Start over with a blank grid of the new size.
    Discard,
}

// ─── DrawStats ───────────────────────────────────────────────────────────────

/// Statistics from one draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawStats {
    /// Rows that were dirty and got sent.
    pub rows_drawn: usize,
    /// Bytes written to the output.
    pub bytes_written: usize,
}

// ─── Grid ────────────────────────────────────────────────────────────────────

/// The lock-protected state.
#[derive(Clone)]
struct Grid {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    dirty: BTreeSet<u16>,
    cursor_visible: bool,
}

impl Grid {
    fn blank(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; usize::from(width) * usize::from(height)],
            dirty: BTreeSet::new(),
            cursor_visible: true,
        }
    }

    #[inline]
    const fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    const fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if !self.in_bounds(x, y) {
            trace!(x, y, "write outside canvas ignored");
            return None;
        }
        let idx = self.index(x, y);
        self.dirty.insert(y);
        self.cells.get_mut(idx)
    }

    fn mark_all(&mut self) {
        self.dirty.extend(0..self.height);
    }

    /// A grid of the new size holding the overlapping rectangle of `self`.
    fn copy_resized(&self, width: u16, height: u16) -> Self {
        let mut next = Self::blank(width, height);
        next.cursor_visible = self.cursor_visible;
        let cols = usize::from(self.width.min(width));
        for y in 0..self.height.min(height) {
            let src = self.index(0, y);
            let dst = next.index(0, y);
            next.cells[dst..dst + cols].copy_from_slice(&self.cells[src..src + cols]);
        }
        next.mark_all();
        next
    }

    fn resize(&mut self, width: u16, height: u16, policy: ResizePolicy) {
        let mut next = match policy {
            ResizePolicy::Preserve => self.copy_resized(width, height),
            ResizePolicy::Discard => Self::blank(width, height),
        };
        next.cursor_visible = self.cursor_visible;
        next.mark_all();
        *self = next;
    }

    fn row(&self, y: u16) -> &[Cell] {
        let start = self.index(0, y);
        &self.cells[start..start + usize::from(self.width)]
    }
}

// ─── Canvas ──────────────────────────────────────────────────────────────────

/// A thread-safe character grid with dirty-row tracking.
///
/// All methods take `&self`; share the canvas with an `Arc` between the
/// main loop and a resize handler.
///
/// ```
/// use std::sync::Arc;
/// use vt_term::canvas::Canvas;
/// use vt_term::catalog::Catalog;
/// use vt_term::color::AttributeColor;
///
/// let canvas = Canvas::with_size(10, 2, Arc::new(Catalog::new()));
/// canvas.write(0, 0, AttributeColor::RED, AttributeColor::BLACK, "hi");
/// assert_eq!(canvas.at(1, 0), Some('i'));
///
/// let mut out = Vec::new();
/// canvas.draw_to(&mut out)?;
/// assert!(!canvas.is_dirty());
/// # Ok::<(), vt_term::Error>(())
/// ```
pub struct Canvas {
    grid: RwLock<Grid>,
    catalog: Arc<Catalog>,
    policy: ResizePolicy,
}

impl Canvas {
    /// A canvas sized to the terminal, or 80×25 if the size can't be probed.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let size = terminal::get_size().unwrap_or(Size::DEFAULT);
        Self::with_size(size.cols, size.rows, catalog)
    }

    /// A blank canvas of the given size.
    #[must_use]
    pub fn with_size(width: u16, height: u16, catalog: Arc<Catalog>) -> Self {
        Self {
            grid: RwLock::new(Grid::blank(width, height)),
            catalog,
            policy: ResizePolicy::default(),
        }
    }

    /// Choose what resizing does with existing content.
    #[must_use]
    pub const fn with_policy(mut self, policy: ResizePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The active resize policy.
    #[must_use]
    pub const fn policy(&self) -> ResizePolicy {
        self.policy
    }

    /// The catalog this canvas draws with.
    #[must_use]
    pub const fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    fn read(&self) -> RwLockReadGuard<'_, Grid> {
        self.grid.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, Grid> {
        self.grid.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Current size.
    #[must_use]
    pub fn size(&self) -> Size {
        let g = self.read();
        Size {
            cols: g.width,
            rows: g.height,
        }
    }

    /// Width in columns.
    #[must_use]
    pub fn width(&self) -> u16 {
        self.read().width
    }

    /// Height in rows.
    #[must_use]
    pub fn height(&self) -> u16 {
        self.read().height
    }

    /// The character at `(x, y)`, with blank cells reported as a space.
    ///
    /// `None` when the coordinates are outside the canvas.
    #[must_use]
    pub fn at(&self, x: u16, y: u16) -> Option<char> {
        self.cell(x, y).map(Cell::glyph)
    }

    /// The whole cell at `(x, y)`.
    #[must_use]
    pub fn cell(&self, x: u16, y: u16) -> Option<Cell> {
        let g = self.read();
        if g.in_bounds(x, y) {
            g.cells.get(g.index(x, y)).copied()
        } else {
            None
        }
    }

    /// Whether any row waits to be drawn.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.read().dirty.is_empty()
    }

    /// Indices of the rows waiting to be drawn, ascending.
    #[must_use]
    pub fn dirty_rows(&self) -> Vec<u16> {
        self.read().dirty.iter().copied().collect()
    }

    /// Whether the cursor is shown after a draw.
    #[must_use]
    pub fn cursor_visible(&self) -> bool {
        self.read().cursor_visible
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Set the character at `(x, y)`, keeping its colors.
    pub fn plot(&self, x: u16, y: u16, ch: char) {
        if let Some(cell) = self.write_lock().get_mut(x, y) {
            cell.set_char(ch);
        }
    }

    /// Set the character and foreground at `(x, y)`, keeping the background.
    pub fn plot_color(&self, x: u16, y: u16, fg: AttributeColor, ch: char) {
        if let Some(cell) = self.write_lock().get_mut(x, y) {
            cell.set_char(ch);
            cell.fg = fg;
        }
    }

    /// Write `text` starting at `(x, y)` with both colors.
    ///
    /// `bg` goes through [`AttributeColor::as_background`], so a plain
    /// color like `BLUE` can be passed as a background. Characters past
    /// the end of the row are dropped.
    pub fn write(&self, x: u16, y: u16, fg: AttributeColor, bg: AttributeColor, text: &str) {
        let mut g = self.write_lock();
        if !g.in_bounds(x, y) {
            trace!(x, y, "write outside canvas ignored");
            return;
        }
        let bg = bg.as_background();
        let start = g.index(x, y);
        let room = usize::from(g.width - x);
        let mut wrote = false;
        for (cell, ch) in g.cells[start..start + room].iter_mut().zip(text.chars()) {
            *cell = Cell::styled(ch, fg, bg);
            wrote = true;
        }
        if wrote {
            g.dirty.insert(y);
        }
    }

    /// Write a single character with both colors.
    pub fn write_char(&self, x: u16, y: u16, fg: AttributeColor, bg: AttributeColor, ch: char) {
        if let Some(cell) = self.write_lock().get_mut(x, y) {
            *cell = Cell::styled(ch, fg, bg.as_background());
        }
    }

    /// Set the foreground of every cell.
    pub fn fill_foreground(&self, fg: AttributeColor) {
        let mut g = self.write_lock();
        for cell in &mut g.cells {
            cell.fg = fg;
        }
        g.mark_all();
    }

    /// Set the background of every cell (converted with `as_background`).
    pub fn fill_background(&self, bg: AttributeColor) {
        let bg = bg.as_background();
        let mut g = self.write_lock();
        for cell in &mut g.cells {
            cell.bg = bg;
        }
        g.mark_all();
    }

    /// Blank every character. Colors stay.
    pub fn clear(&self) {
        let mut g = self.write_lock();
        for cell in &mut g.cells {
            cell.clear_char();
        }
        g.mark_all();
    }

    /// Show the cursor after each draw.
    pub fn show_cursor(&self) {
        self.write_lock().cursor_visible = true;
    }

    /// Keep the cursor hidden after each draw.
    pub fn hide_cursor(&self) {
        self.write_lock().cursor_visible = false;
    }

    // ── Drawing ─────────────────────────────────────────────────────

    /// Send every dirty row to `w` and mark the canvas clean.
    ///
    /// Emits nothing when no row is dirty.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails. The dirty rows are kept in
    /// that case so the next draw retries them.
    pub fn draw_to(&self, w: &mut impl Write) -> crate::Result<DrawStats> {
        let mut g = self.write_lock();
        if g.dirty.is_empty() {
            return Ok(DrawStats::default());
        }

        let catalog = &*self.catalog;
        let mut out = OutputBuffer::new();
        let mut rows = RowWriter::new(catalog);

        out.push_str(&catalog.cursor_visibility(false));
        for &y in &g.dirty {
            rows.begin_row(&mut out, y);
            for cell in g.row(y) {
                rows.cell(&mut out, cell);
            }
            rows.end_row(&mut out);
        }
        out.push_str(&catalog.cursor_to(
            g.width.saturating_sub(1),
            g.height.saturating_sub(1),
        ));
        if g.cursor_visible {
            out.push_str(&catalog.cursor_visibility(true));
        }

        let stats = DrawStats {
            rows_drawn: g.dirty.len(),
            bytes_written: out.len(),
        };
        out.flush_to(w)?;
        g.dirty.clear();

        trace!(rows = stats.rows_drawn, bytes = stats.bytes_written, "canvas drawn");
        Ok(stats)
    }

    /// [`draw_to`](Self::draw_to) stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn draw(&self) -> crate::Result<DrawStats> {
        self.draw_to(&mut io::stdout().lock())
    }

    /// Mark every row dirty, then draw to `w`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn redraw_to(&self, w: &mut impl Write) -> crate::Result<DrawStats> {
        self.write_lock().mark_all();
        self.draw_to(w)
    }

    /// [`redraw_to`](Self::redraw_to) stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn redraw(&self) -> crate::Result<DrawStats> {
        self.redraw_to(&mut io::stdout().lock())
    }

    // ── Resizing ────────────────────────────────────────────────────

    /// Re-probe the terminal and resize in place if its size changed.
    ///
    /// Returns whether the canvas changed size. A failed probe is a no-op.
    pub fn resize(&self) -> bool {
        terminal::get_size().is_some_and(|s| self.resize_to(s.cols, s.rows))
    }

    /// Resize in place to `width × height` following the resize policy.
    ///
    /// Returns `false` (and changes nothing) if the size is unchanged.
    pub fn resize_to(&self, width: u16, height: u16) -> bool {
        let mut g = self.write_lock();
        if g.width == width && g.height == height {
            return false;
        }
        debug!(
            from_cols = g.width,
            from_rows = g.height,
            to_cols = width,
            to_rows = height,
            policy = ?self.policy,
            "canvas resized"
        );
        g.resize(width, height, self.policy);
        true
    }

    /// Re-probe the terminal and, if its size changed, build a new canvas
    /// of the new size holding this canvas's overlapping content.
    #[must_use]
    pub fn resized(&self) -> Option<Self> {
        let s = terminal::get_size()?;
        self.resized_to(s.cols, s.rows)
    }

    /// A new canvas of `width × height` holding the overlapping content,
    /// with every row dirty. `None` if the size is unchanged.
    ///
    /// This canvas is left as it was.
    #[must_use]
    pub fn resized_to(&self, width: u16, height: u16) -> Option<Self> {
        let g = self.read();
        if g.width == width && g.height == height {
            return None;
        }
        debug!(to_cols = width, to_rows = height, "canvas copied to new size");
        Some(Self {
            grid: RwLock::new(g.copy_resized(width, height)),
            catalog: Arc::clone(&self.catalog),
            policy: self.policy,
        })
    }
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.read();
        f.debug_struct("Canvas")
            .field("width", &g.width)
            .field("height", &g.height)
            .field("dirty", &g.dirty.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Characters only, one line per row, blanks as spaces.
impl fmt::Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write as _;
        let g = self.read();
        for y in 0..g.height {
            for cell in g.row(y) {
                f.write_char(cell.glyph())?;
            }
            f.write_char('\n')?;
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
