// SPDX-License-Identifier: MIT
//
// Cell — one character position on the canvas.
//
// A cell is a character (or nothing) plus a foreground and a background
// attribute set. Both attribute sets are `Copy` bitsets, so a whole cell is
// a small `Copy` value and rows compare with plain slice equality.
//
// Blank is distinct from a space: a blank cell was never written (or was
// cleared). Both render as a space, but `Canvas::at` reports blanks as a
// space too so callers never see the distinction unless they ask for the
// whole cell.

use crate::color::AttributeColor;

/// A single canvas cell: character plus colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cell {
    /// The character, or `None` for a blank cell.
    pub ch: Option<char>,
    /// Foreground attributes (styles and foreground color).
    pub fg: AttributeColor,
    /// Background attributes, always in the 40–49 range once written
    /// through the canvas.
    pub bg: AttributeColor,
}

impl Cell {
    /// A blank cell with no attributes.
    pub const BLANK: Self = Self {
        ch: None,
        fg: AttributeColor::empty(),
        bg: AttributeColor::empty(),
    };

    /// A cell holding `ch` with no attributes.
    ///
    /// NUL is treated as blank.
    #[inline]
    #[must_use]
    pub const fn new(ch: char) -> Self {
        Self {
            ch: char_or_blank(ch),
            fg: AttributeColor::empty(),
            bg: AttributeColor::empty(),
        }
    }

    /// A cell with character and both colors.
    #[inline]
    #[must_use]
    pub const fn styled(ch: char, fg: AttributeColor, bg: AttributeColor) -> Self {
        Self {
            ch: char_or_blank(ch),
            fg,
            bg,
        }
    }

    /// Whether no character has been written here.
    #[inline]
    #[must_use]
    pub const fn is_blank(self) -> bool {
        self.ch.is_none()
    }

    /// The character to put on screen: the stored one, or a space.
    #[inline]
    #[must_use]
    pub fn glyph(self) -> char {
        self.ch.unwrap_or(' ')
    }

    /// Replace the character, keeping both colors.
    #[inline]
    pub const fn set_char(&mut self, ch: char) {
        self.ch = char_or_blank(ch);
    }

    /// Blank the character, keeping both colors.
    #[inline]
    pub const fn clear_char(&mut self) {
        self.ch = None;
    }
}

const fn char_or_blank(ch: char) -> Option<char> {
    if ch == '\0' { None } else { Some(ch) }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_blank() {
        let c = Cell::default();
        assert!(c.is_blank());
        assert!(c.fg.is_empty());
        assert!(c.bg.is_empty());
        assert_eq!(c, Cell::BLANK);
    }

    #[test]
    fn blank_glyph_is_space() {
        assert_eq!(Cell::BLANK.glyph(), ' ');
    }

    #[test]
    fn new_holds_char() {
        let c = Cell::new('x');
        assert_eq!(c.ch, Some('x'));
        assert_eq!(c.glyph(), 'x');
        assert!(!c.is_blank());
    }

    #[test]
    fn nul_is_blank() {
        assert!(Cell::new('\0').is_blank());
        let mut c = Cell::new('a');
        c.set_char('\0');
        assert!(c.is_blank());
    }

    #[test]
    fn space_is_not_blank() {
        let c = Cell::new(' ');
        assert!(!c.is_blank());
        assert_eq!(c.glyph(), ' ');
    }

    #[test]
    fn set_char_keeps_colors() {
        let mut c = Cell::styled('a', AttributeColor::RED, AttributeColor::BACKGROUND_BLUE);
        c.set_char('b');
        assert_eq!(c.ch, Some('b'));
        assert_eq!(c.fg, AttributeColor::RED);
        assert_eq!(c.bg, AttributeColor::BACKGROUND_BLUE);
    }

    #[test]
    fn clear_char_keeps_colors() {
        let mut c = Cell::styled('a', AttributeColor::RED, AttributeColor::BACKGROUND_BLUE);
        c.clear_char();
        assert!(c.is_blank());
        assert_eq!(c.bg, AttributeColor::BACKGROUND_BLUE);
    }

    #[test]
    fn cell_is_copy() {
        let a = Cell::new('z');
        let b = a;
        assert_eq!(a, b);
    }
}
