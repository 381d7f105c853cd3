//! Property-based invariant tests for the attribute set, the canvas and the
//! key decoder.
//!
//! 1. Combine is commutative and idempotent.
//! 2. as_background is idempotent and only yields background codes.
//! 3. Plot then At returns the character in bounds, None outside.
//! 4. Draw on a clean canvas writes nothing.
//! 5. Resizing preserves the overlapping rectangle.
//! 6. Decoding never panics and agrees across projections.

use std::sync::Arc;

use proptest::prelude::*;
use vt_term::canvas::Canvas;
use vt_term::catalog::Catalog;
use vt_term::color::AttributeColor;
use vt_term::input::{self, KeyDecoder};

// ── Helpers ─────────────────────────────────────────────────────────────

fn color_strategy() -> impl Strategy<Value = AttributeColor> {
    prop::collection::vec(0u8..50, 0..6).prop_map(|codes| AttributeColor::from_codes(&codes))
}

fn canvas(w: u16, h: u16) -> Canvas {
    Canvas::with_size(w, h, Arc::new(Catalog::new()))
}

fn printable() -> impl Strategy<Value = char> {
    prop::char::range('!', '~')
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Combine
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn combine_commutative(a in color_strategy(), b in color_strategy()) {
        prop_assert_eq!(a.combine(b), b.combine(a));
    }

    #[test]
    fn combine_idempotent(a in color_strategy()) {
        prop_assert_eq!(a.combine(a), a);
    }

    #[test]
    fn combine_contains_both(a in color_strategy(), b in color_strategy()) {
        let c = a.combine(b);
        prop_assert!(c.contains(a) && c.contains(b));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. as_background
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn as_background_idempotent(a in color_strategy()) {
        let once = a.as_background();
        prop_assert_eq!(once.as_background(), once);
    }

    #[test]
    fn as_background_has_no_foreground(a in color_strategy()) {
        let bg = a.as_background();
        prop_assert!(!bg.has_foreground());
        prop_assert!(bg.codes().all(|c| (40..50).contains(&c)), "{:?}", bg);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Plot / At
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn plot_then_at(w in 1u16..60, h in 1u16..30, x in 0u16..80, y in 0u16..40, ch in printable()) {
        let c = canvas(w, h);
        c.plot(x, y, ch);
        if x < w && y < h {
            prop_assert_eq!(c.at(x, y), Some(ch));
            prop_assert_eq!(c.dirty_rows(), vec![y]);
        } else {
            prop_assert_eq!(c.at(x, y), None);
            prop_assert!(!c.is_dirty());
        }
    }

    #[test]
    fn write_never_spills_into_next_row(w in 1u16..20, x in 0u16..20, text in "[a-z]{0,40}") {
        let c = canvas(w, 2);
        c.write(x, 0, AttributeColor::RED, AttributeColor::BLACK, &text);
        for col in 0..w {
            prop_assert_eq!(c.at(col, 1), Some(' '));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Clean draw
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn second_draw_is_empty(w in 1u16..40, h in 1u16..20, x in 0u16..40, y in 0u16..20) {
        let c = canvas(w, h);
        c.plot(x, y, '#');
        let mut first = Vec::new();
        c.draw_to(&mut first).unwrap();
        let mut second = Vec::new();
        let stats = c.draw_to(&mut second).unwrap();
        prop_assert!(second.is_empty());
        prop_assert_eq!(stats.rows_drawn, 0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Resize preservation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn resize_preserves_overlap(
        w in 1u16..30, h in 1u16..20,
        nw in 0u16..40, nh in 0u16..30,
        seed in any::<u64>(),
    ) {
        let c = canvas(w, h);
        let glyph = |x: u16, y: u16| {
            let n = seed.wrapping_add(u64::from(x) * 31 + u64::from(y) * 17) % 26;
            char::from(b'a' + u8::try_from(n).unwrap())
        };
        for y in 0..h {
            for x in 0..w {
                c.plot(x, y, glyph(x, y));
            }
        }

        let copy = c.resized_to(nw, nh);
        c.resize_to(nw, nh);

        for y in 0..nh {
            for x in 0..nw {
                let expected = if x < w && y < h { glyph(x, y) } else { ' ' };
                prop_assert_eq!(c.at(x, y), Some(expected));
                if let Some(copy) = &copy {
                    prop_assert_eq!(copy.at(x, y), Some(expected));
                }
            }
        }
        prop_assert_eq!(c.at(nw, 0), None);
        prop_assert_eq!(c.at(0, nh), None);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Decoding
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn decode_any_read(bytes in prop::collection::vec(any::<u8>(), 0..=6)) {
        let key = input::decode(&bytes);
        prop_assert_eq!(key.is_none(), bytes.is_empty());
        prop_assert_eq!(input::rune_of(&bytes).is_none(), bytes.is_empty());
        prop_assert_eq!(input::label_of(&bytes).is_empty(), bytes.is_empty());

        if let Some(special) = input::special(&bytes) {
            let glyph = special.glyph().unwrap();
            prop_assert_eq!(key, Some(special));
            prop_assert_eq!(input::rune_of(&bytes), Some(glyph));
            prop_assert_eq!(input::label_of(&bytes), glyph.to_string());
        }
    }

    #[test]
    fn repeats_alternate(bytes in prop::collection::vec(1u8..=255, 1..=6), n in 1usize..8) {
        let mut d = KeyDecoder::new();
        for i in 0..n {
            let got = d.key(&bytes);
            prop_assert_eq!(got.is_some(), i % 2 == 0, "read {}", i);
        }
    }
}
