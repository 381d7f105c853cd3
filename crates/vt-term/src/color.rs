// SPDX-License-Identifier: MIT
//
// Attribute encoder — colors and styles as a set of SGR codes.
//
// VT100 display attributes are small integers: styles 0–8, foreground
// colors 30–39, background colors 40–49. An `AttributeColor` is a set of
// those codes. Every code fits below 64, so the set is one `u64` with bit
// `n` standing for code `n`. That gives us, for free:
//
//   - order-independent equality (it is just integer equality)
//   - union without duplicates (bitwise OR)
//   - ascending iteration, which is the order codes are rendered in
//   - `Copy`, so cells carry their colors by value
//
// Rendering goes through the escape catalog's "Set Attribute Mode"
// template, so the bytes are memoized per distinct code set.

use std::fmt;

use tracing::trace;

use crate::catalog::Catalog;

// ─── AttributeColor ─────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// A set of SGR attribute codes (styles, foreground and background).
    ///
    /// Flags are named after their code; friendlier aliases such as
    /// [`RED`](AttributeColor::RED) or [`LIGHT_BLUE`](AttributeColor::LIGHT_BLUE)
    /// live in the inherent impl.
    ///
    /// ```
    /// use vt_term::color::AttributeColor;
    ///
    /// let c = AttributeColor::named("Bright").combine(AttributeColor::named("Red"));
    /// assert_eq!(c, AttributeColor::LIGHT_RED);
    /// assert_eq!(c.codes().collect::<Vec<_>>(), vec![1, 31]);
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
    pub struct AttributeColor: u64 {
        /// SGR 0 — reset all attributes.
        const RESET      = 1 << 0;
        /// SGR 1 — bright / bold.
        const BRIGHT     = 1 << 1;
        /// SGR 2 — dim.
        const DIM        = 1 << 2;
        /// SGR 4 — underscore.
        const UNDERSCORE = 1 << 4;
        /// SGR 5 — blink.
        const BLINK      = 1 << 5;
        /// SGR 7 — reverse video.
        const REVERSE    = 1 << 7;
        /// SGR 8 — hidden.
        const HIDDEN     = 1 << 8;

        const FG_BLACK   = 1 << 30;
        const FG_RED     = 1 << 31;
        const FG_GREEN   = 1 << 32;
        const FG_YELLOW  = 1 << 33;
        const FG_BLUE    = 1 << 34;
        const FG_MAGENTA = 1 << 35;
        const FG_CYAN    = 1 << 36;
        const FG_WHITE   = 1 << 37;
        /// SGR 39 — terminal default foreground.
        const FG_DEFAULT = 1 << 39;

        const BG_BLACK   = 1 << 40;
        const BG_RED     = 1 << 41;
        const BG_GREEN   = 1 << 42;
        const BG_YELLOW  = 1 << 43;
        const BG_BLUE    = 1 << 44;
        const BG_MAGENTA = 1 << 45;
        const BG_CYAN    = 1 << 46;
        const BG_WHITE   = 1 << 47;
        /// SGR 49 — terminal default background.
        const BG_DEFAULT = 1 << 49;
    }
}

/// Bits for codes 30–39.
const FOREGROUND_MASK: u64 = range_mask(30, 39);
/// Bits for codes 40–49.
const BACKGROUND_MASK: u64 = range_mask(40, 49);

/// Distance between a foreground code and its background twin.
const BACKGROUND_OFFSET: u32 = 10;

const fn range_mask(lo: u32, hi: u32) -> u64 {
    (u64::MAX >> (63 - hi)) & (u64::MAX << lo)
}

impl AttributeColor {
    // ── Aliases ─────────────────────────────────────────────────────

    pub const BLACK: Self = Self::FG_BLACK;
    pub const RED: Self = Self::FG_RED;
    pub const GREEN: Self = Self::FG_GREEN;
    pub const YELLOW: Self = Self::FG_YELLOW;
    pub const BLUE: Self = Self::FG_BLUE;
    pub const MAGENTA: Self = Self::FG_MAGENTA;
    pub const CYAN: Self = Self::FG_CYAN;
    pub const LIGHT_GRAY: Self = Self::FG_WHITE;

    pub const DARK_GRAY: Self = Self::BRIGHT.union(Self::FG_BLACK);
    pub const LIGHT_RED: Self = Self::BRIGHT.union(Self::FG_RED);
    pub const LIGHT_GREEN: Self = Self::BRIGHT.union(Self::FG_GREEN);
    pub const LIGHT_YELLOW: Self = Self::BRIGHT.union(Self::FG_YELLOW);
    pub const LIGHT_BLUE: Self = Self::BRIGHT.union(Self::FG_BLUE);
    pub const LIGHT_MAGENTA: Self = Self::BRIGHT.union(Self::FG_MAGENTA);
    pub const LIGHT_CYAN: Self = Self::BRIGHT.union(Self::FG_CYAN);
    pub const WHITE: Self = Self::BRIGHT.union(Self::FG_WHITE);

    pub const PINK: Self = Self::LIGHT_MAGENTA;
    pub const GRAY: Self = Self::DARK_GRAY;

    pub const BACKGROUND_BLACK: Self = Self::BG_BLACK;
    pub const BACKGROUND_RED: Self = Self::BG_RED;
    pub const BACKGROUND_GREEN: Self = Self::BG_GREEN;
    pub const BACKGROUND_YELLOW: Self = Self::BG_YELLOW;
    pub const BACKGROUND_BLUE: Self = Self::BG_BLUE;
    pub const BACKGROUND_MAGENTA: Self = Self::BG_MAGENTA;
    pub const BACKGROUND_CYAN: Self = Self::BG_CYAN;
    pub const BACKGROUND_WHITE: Self = Self::BG_WHITE;

    pub const DEFAULT_FOREGROUND: Self = Self::FG_DEFAULT;
    pub const DEFAULT_BACKGROUND: Self = Self::BG_DEFAULT;

    // ── Construction ────────────────────────────────────────────────

    /// The set holding the single code `code`.
    ///
    /// Codes that cannot be represented map to [`RESET`](Self::RESET).
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        if code < 64 {
            Self::from_bits_retain(1 << code)
        } else {
            trace!(code, "attribute code out of range, using reset");
            Self::RESET
        }
    }

    /// The set holding every code in `codes`, duplicates collapsed.
    #[must_use]
    pub fn from_codes(codes: &[u8]) -> Self {
        codes
            .iter()
            .fold(Self::empty(), |acc, &c| acc | Self::from_code(c))
    }

    /// Look up an attribute or color by name, such as `"Bright"`, `"Red"` or
    /// `"Background Blue"`.
    ///
    /// An unrecognized name maps to the reset code. `"Dark"` (a color without
    /// `Bright`) and the empty name map to the empty set.
    #[must_use]
    pub fn named(name: &str) -> Self {
        match attribute_code(name) {
            Some(code) => Self::from_code(code),
            None if name.is_empty() || name == "Dark" => Self::empty(),
            None => {
                trace!(name, "unknown attribute name, using reset");
                Self::RESET
            }
        }
    }

    /// Union of [`named`](Self::named) over every name.
    #[must_use]
    pub fn from_names(names: &[&str]) -> Self {
        names
            .iter()
            .fold(Self::empty(), |acc, name| acc | Self::named(name))
    }

    // ── Set operations ──────────────────────────────────────────────

    /// Set union of both code sets. Commutative and idempotent.
    #[inline]
    #[must_use]
    pub const fn combine(self, other: Self) -> Self {
        self.union(other)
    }

    /// The background version of this attribute.
    ///
    /// Foreground codes (30–39) become their background twins (40–49) and
    /// everything else is dropped. Without any foreground code, only the
    /// background codes already present are kept. Applying it twice changes
    /// nothing.
    #[must_use]
    pub const fn as_background(self) -> Self {
        let fg = self.bits() & FOREGROUND_MASK;
        if fg == 0 {
            Self::from_bits_retain(self.bits() & BACKGROUND_MASK)
        } else {
            Self::from_bits_retain(fg << BACKGROUND_OFFSET)
        }
    }

    /// Whether the set holds any foreground color code.
    #[inline]
    #[must_use]
    pub const fn has_foreground(self) -> bool {
        self.bits() & FOREGROUND_MASK != 0
    }

    /// Whether the set holds any background color code.
    #[inline]
    #[must_use]
    pub const fn has_background(self) -> bool {
        self.bits() & BACKGROUND_MASK != 0
    }

    /// Codes in ascending order.
    pub fn codes(self) -> impl Iterator<Item = u8> {
        let bits = self.bits();
        (0..64u8).filter(move |&c| bits & (1 << c) != 0)
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// The "Set Attribute Mode" sequence for this set.
    ///
    /// The empty set renders as a reset.
    #[must_use]
    pub fn render(self, catalog: &Catalog) -> String {
        if self.is_empty() {
            return catalog.reset_attributes();
        }
        catalog.attribute_mode(&self.to_string())
    }

    /// `text` in this color, followed by a reset.
    #[must_use]
    pub fn wrap(self, catalog: &Catalog, text: &str) -> String {
        let mut s = self.render(catalog);
        s.push_str(text);
        s.push_str(&catalog.reset_attributes());
        s
    }
}

/// The `;`-joined codes, e.g. `1;31;40`.
impl fmt::Display for AttributeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, code) in self.codes().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{code}")?;
        }
        Ok(())
    }
}

// ─── Name Table ─────────────────────────────────────────────────────────────

#[rustfmt::skip]
const ATTRIBUTE_NAMES: &[(&str, u8)] = &[
    ("Reset", 0),
    ("Bright", 1),
    ("Dim", 2),
    ("Underscore", 4),
    ("Blink", 5),
    ("Reverse", 7),
    ("Hidden", 8),
    ("Black", 30),
    ("Red", 31),
    ("Green", 32),
    ("Yellow", 33),
    ("Blue", 34),
    ("Magenta", 35),
    ("Cyan", 36),
    ("White", 37),
    ("Default", 39),
    ("Background Black", 40),
    ("Background Red", 41),
    ("Background Green", 42),
    ("Background Yellow", 43),
    ("Background Blue", 44),
    ("Background Magenta", 45),
    ("Background Cyan", 46),
    ("Background White", 47),
    ("Background Default", 49),
];

const COLOR_NAMES: &[&str] = &[
    "Black", "Red", "Green", "Yellow", "Blue", "Magenta", "Cyan", "White",
];

/// The SGR code for an attribute or color name.
#[must_use]
pub fn attribute_code(name: &str) -> Option<u8> {
    ATTRIBUTE_NAMES
        .iter()
        .find(|&&(n, _)| n == name)
        .map(|&(_, code)| code)
}

/// The eight VT100 color names, in code order.
#[must_use]
pub const fn color_names() -> &'static [&'static str] {
    COLOR_NAMES
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Construction ────────────────────────────────────────────────

    #[test]
    fn default_is_empty() {
        assert!(AttributeColor::default().is_empty());
        assert_eq!(AttributeColor::default().codes().count(), 0);
    }

    #[test]
    fn named_style_and_color() {
        assert_eq!(AttributeColor::named("Bright"), AttributeColor::BRIGHT);
        assert_eq!(AttributeColor::named("Red"), AttributeColor::RED);
        assert_eq!(
            AttributeColor::named("Background Blue"),
            AttributeColor::BACKGROUND_BLUE
        );
    }

    #[test]
    fn unknown_name_is_reset() {
        assert_eq!(AttributeColor::named("Chartreuse"), AttributeColor::RESET);
        assert_eq!(AttributeColor::named("red"), AttributeColor::RESET);
    }

    #[test]
    fn dark_and_empty_names_are_empty() {
        assert!(AttributeColor::named("Dark").is_empty());
        assert!(AttributeColor::named("").is_empty());
        assert_eq!(
            AttributeColor::from_names(&["Dark", "Green"]),
            AttributeColor::GREEN
        );
    }

    #[test]
    fn from_names_unions() {
        assert_eq!(
            AttributeColor::from_names(&["Bright", "Red"]),
            AttributeColor::LIGHT_RED
        );
    }

    #[test]
    fn from_codes_collapses_duplicates() {
        let c = AttributeColor::from_codes(&[31, 1, 31, 1]);
        assert_eq!(c.codes().collect::<Vec<_>>(), vec![1, 31]);
    }

    #[test]
    fn from_code_out_of_range_is_reset() {
        assert_eq!(AttributeColor::from_code(64), AttributeColor::RESET);
        assert_eq!(AttributeColor::from_code(200), AttributeColor::RESET);
    }

    // ── Combine ─────────────────────────────────────────────────────

    #[test]
    fn combine_is_commutative() {
        let a = AttributeColor::LIGHT_RED;
        let b = AttributeColor::BACKGROUND_BLUE;
        assert_eq!(a.combine(b), b.combine(a));
    }

    #[test]
    fn combine_is_idempotent() {
        let a = AttributeColor::LIGHT_CYAN;
        assert_eq!(a.combine(a), a);
    }

    #[test]
    fn combine_has_no_duplicates() {
        let c = AttributeColor::LIGHT_RED.combine(AttributeColor::WHITE);
        assert_eq!(c.codes().collect::<Vec<_>>(), vec![1, 31, 37]);
    }

    #[test]
    fn equality_ignores_order() {
        assert_eq!(
            AttributeColor::from_codes(&[44, 1, 33]),
            AttributeColor::from_codes(&[33, 44, 1])
        );
    }

    // ── Background ──────────────────────────────────────────────────

    #[test]
    fn as_background_shifts_foreground() {
        assert_eq!(
            AttributeColor::BLUE.as_background(),
            AttributeColor::BACKGROUND_BLUE
        );
    }

    #[test]
    fn as_background_drops_styles() {
        assert_eq!(
            AttributeColor::LIGHT_RED.as_background(),
            AttributeColor::BACKGROUND_RED
        );
    }

    #[test]
    fn as_background_keeps_existing_background() {
        let bg = AttributeColor::BACKGROUND_GREEN | AttributeColor::BRIGHT;
        assert_eq!(bg.as_background(), AttributeColor::BACKGROUND_GREEN);
    }

    #[test]
    fn as_background_with_both_prefers_foreground() {
        let c = AttributeColor::RED | AttributeColor::BACKGROUND_GREEN;
        assert_eq!(c.as_background(), AttributeColor::BACKGROUND_RED);
    }

    #[test]
    fn as_background_is_idempotent() {
        for c in [
            AttributeColor::empty(),
            AttributeColor::WHITE,
            AttributeColor::BACKGROUND_CYAN,
            AttributeColor::DEFAULT_FOREGROUND,
        ] {
            assert_eq!(c.as_background().as_background(), c.as_background());
        }
    }

    #[test]
    fn as_background_default_color() {
        assert_eq!(
            AttributeColor::DEFAULT_FOREGROUND.as_background(),
            AttributeColor::DEFAULT_BACKGROUND
        );
    }

    #[test]
    fn as_background_only_background_codes() {
        let c = AttributeColor::from_codes(&[0, 1, 2, 31, 36]).as_background();
        assert!(c.codes().all(|code| (40..=49).contains(&code)));
    }

    #[test]
    fn range_masks() {
        assert!(AttributeColor::FG_DEFAULT.has_foreground());
        assert!(!AttributeColor::BRIGHT.has_foreground());
        assert!(AttributeColor::BG_DEFAULT.has_background());
        assert!(!AttributeColor::FG_WHITE.has_background());
    }

    // ── Rendering ───────────────────────────────────────────────────

    #[test]
    fn render_single() {
        let catalog = Catalog::new();
        assert_eq!(AttributeColor::RED.render(&catalog), "\x1b[31m");
    }

    #[test]
    fn render_ascending() {
        let catalog = Catalog::new();
        let c = AttributeColor::BACKGROUND_BLACK | AttributeColor::RED;
        assert_eq!(c.render(&catalog), "\x1b[31;40m");
        assert_eq!(AttributeColor::WHITE.render(&catalog), "\x1b[1;37m");
    }

    #[test]
    fn render_empty_is_reset() {
        let catalog = Catalog::new();
        assert_eq!(AttributeColor::empty().render(&catalog), "\x1b[0m");
    }

    #[test]
    fn background_renders_like_named_background() {
        let catalog = Catalog::new();
        assert_eq!(
            AttributeColor::BLUE.as_background().render(&catalog),
            AttributeColor::BACKGROUND_BLUE.render(&catalog)
        );
    }

    #[test]
    fn wrap_text() {
        let catalog = Catalog::new();
        assert_eq!(
            AttributeColor::LIGHT_GREEN.wrap(&catalog, "ok"),
            "\x1b[1;32mok\x1b[0m"
        );
    }

    #[test]
    fn display_joins_codes() {
        assert_eq!(AttributeColor::LIGHT_RED.to_string(), "1;31");
        assert_eq!(AttributeColor::empty().to_string(), "");
    }

    // ── Name table ──────────────────────────────────────────────────

    #[test]
    fn attribute_code_lookup() {
        assert_eq!(attribute_code("Hidden"), Some(8));
        assert_eq!(attribute_code("White"), Some(37));
        assert_eq!(attribute_code("Background White"), Some(47));
        assert_eq!(attribute_code("Mauve"), None);
    }

    #[test]
    fn color_names_map_to_consecutive_codes() {
        for (i, name) in color_names().iter().enumerate() {
            assert_eq!(attribute_code(name), Some(30 + u8::try_from(i).unwrap()));
        }
    }
}
