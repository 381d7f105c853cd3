// SPDX-License-Identifier: MIT
//
// Key decoding — raw terminal bytes to one logical key.
//
// A single read from the tty returns at most six bytes. The byte count
// decides which table to consult:
//
//   3 bytes   ESC [ A/B/C/D/H/F        arrows, Home, End
//   4 bytes   ESC [ 1/4/5/6 ~          Home, End, Page Up, Page Down
//   6 bytes   ESC [ 2 ; 5 ~            Ctrl-Insert
//
// Anything else (including a table miss) is passed through as its first
// byte. There is no buffering across reads: a sequence split over two reads
// decodes as two literal bytes, which is what a 2ms read timeout makes rare.
//
// Three projections share the same table lookup so they always agree on
// whether a read was a special key:
//
//   decode    → Key          (integer code space via `Key::code`)
//   rune_of   → char         (arrow glyph, the byte, or the first UTF-8 char)
//   label_of  → String       (arrow glyph, printable char, `c:NN`, or UTF-8)
//
// Key codes: `Byte(b)` is `b` (0–255). Special keys sit just above, from
// 0x100 up, so they can never collide with a byte.

use std::fmt;

use tracing::trace;

/// Longest recognized sequence, and therefore the tty read size.
pub const MAX_SEQUENCE: usize = 6;

// ─── Key ─────────────────────────────────────────────────────────────────────

/// One decoded key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A literal byte: ASCII, a control code, or the lead byte of UTF-8.
    Byte(u8),
    // ── Special keys ────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    CtrlInsert,
}

const SPECIAL: [(Key, u16, char); 9] = [
    (Key::Up, 0x100, '↑'),
    (Key::Down, 0x101, '↓'),
    (Key::Left, 0x102, '←'),
    (Key::Right, 0x103, '→'),
    (Key::Home, 0x104, '⇱'),
    (Key::End, 0x105, '⇲'),
    (Key::PageUp, 0x106, '⇞'),
    (Key::PageDown, 0x107, '⇟'),
    (Key::CtrlInsert, 0x108, '⎘'),
];

impl Key {
    /// Escape (27).
    pub const ESC: Self = Self::Byte(0x1b);
    /// Carriage return, what Enter sends in raw mode.
    pub const ENTER: Self = Self::Byte(b'\r');
    /// Ctrl-C (3). Raw mode delivers it as a byte instead of SIGINT.
    pub const CTRL_C: Self = Self::Byte(3);

    /// The canonical integer code.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            Self::Byte(b) => u16::from(b),
            special => SPECIAL
                .iter()
                .find(|(k, _, _)| *k == special)
                .map_or(0, |&(_, code, _)| code),
        }
    }

    /// The key for an integer code, if the code is in use.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        if let Ok(b) = u8::try_from(code) {
            return Some(Self::Byte(b));
        }
        SPECIAL
            .iter()
            .find(|&&(_, c, _)| c == code)
            .map(|&(k, _, _)| k)
    }

    /// Whether this key came from a multi-byte sequence.
    #[inline]
    #[must_use]
    pub const fn is_special(self) -> bool {
        !matches!(self, Self::Byte(_))
    }

    /// The display glyph of a special key (`↑`, `⇞`, `⎘`, ...).
    #[must_use]
    pub fn glyph(self) -> Option<char> {
        SPECIAL
            .iter()
            .find(|(k, _, _)| *k == self)
            .map(|&(_, _, g)| g)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (*self, self.glyph()) {
            (Self::Byte(b), _) => f.write_str(&label_of(&[b])),
            (_, Some(g)) => write!(f, "{g}"),
            (_, None) => Ok(()),
        }
    }
}

// ─── Sequence Tables ─────────────────────────────────────────────────────────

const SEQ3: [([u8; 3], Key); 6] = [
    (*b"\x1b[A", Key::Up),
    (*b"\x1b[B", Key::Down),
    (*b"\x1b[C", Key::Right),
    (*b"\x1b[D", Key::Left),
    (*b"\x1b[H", Key::Home),
    (*b"\x1b[F", Key::End),
];

const SEQ4: [([u8; 4], Key); 4] = [
    (*b"\x1b[1~", Key::Home),
    (*b"\x1b[4~", Key::End),
    (*b"\x1b[5~", Key::PageUp),
    (*b"\x1b[6~", Key::PageDown),
];

const SEQ6: [([u8; 6], Key); 1] = [(*b"\x1b[2;5~", Key::CtrlInsert)];

fn lookup<const N: usize>(table: &[([u8; N], Key)], bytes: &[u8]) -> Option<Key> {
    table
        .iter()
        .find(|(seq, _)| seq.as_slice() == bytes)
        .map(|&(_, k)| k)
}

/// The special key `bytes` spells, matched on the exact length.
#[must_use]
pub fn special(bytes: &[u8]) -> Option<Key> {
    match bytes.len() {
        3 => lookup(&SEQ3, bytes),
        4 => lookup(&SEQ4, bytes),
        6 => lookup(&SEQ6, bytes),
        _ => None,
    }
}

// ─── Projections ─────────────────────────────────────────────────────────────

/// Decode one read into a key. `None` for an empty read.
#[must_use]
pub fn decode(bytes: &[u8]) -> Option<Key> {
    let first = *bytes.first()?;
    let key = special(bytes).unwrap_or(Key::Byte(first));
    trace!(?bytes, ?key, "decoded");
    Some(key)
}

/// Decode one read into a character. `None` for an empty read.
///
/// Special keys become their glyph; a single byte becomes the character
/// with that code; longer reads are decoded as UTF-8 (U+FFFD if invalid).
#[must_use]
pub fn rune_of(bytes: &[u8]) -> Option<char> {
    match bytes {
        [] => None,
        [b] => Some(char::from(*b)),
        _ => special(bytes)
            .and_then(Key::glyph)
            .or_else(|| String::from_utf8_lossy(bytes).chars().next()),
    }
}

/// Decode one read into a label for display. Empty for an empty read.
///
/// A printable byte is itself; a control byte is `c:NN` with `NN` in
/// decimal; a special key is its glyph; anything else is the bytes as
/// UTF-8 (lossy).
#[must_use]
pub fn label_of(bytes: &[u8]) -> String {
    match bytes {
        [] => String::new(),
        [b] => {
            let ch = char::from(*b);
            if is_printable(ch) {
                ch.to_string()
            } else {
                format!("c:{b}")
            }
        }
        _ => special(bytes).and_then(Key::glyph).map_or_else(
            || String::from_utf8_lossy(bytes).into_owned(),
            String::from,
        ),
    }
}

fn is_printable(ch: char) -> bool {
    ch == ' ' || !(ch.is_control() || ch.is_whitespace())
}

// ─── KeyDecoder ──────────────────────────────────────────────────────────────

/// Decoding with repeat suppression.
///
/// A key identical to the previous one is reported as no key, once: the
/// suppressed read clears the memory, so a third identical read is
/// reported again. An empty read, a NUL byte, a timeout or an error also
/// clears it.
#[derive(Debug, Clone, Default)]
pub struct KeyDecoder {
    last: Option<Key>,
}

impl KeyDecoder {
    /// A decoder with no key remembered.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Decode `bytes`, suppressing an exact repeat of the previous key.
    pub fn key(&mut self, bytes: &[u8]) -> Option<Key> {
        let Some(key) = decode(bytes).filter(|&k| k != Key::Byte(0)) else {
            self.last = None;
            return None;
        };
        if self.last == Some(key) {
            trace!(?key, "repeat suppressed");
            self.last = None;
            return None;
        }
        self.last = Some(key);
        Some(key)
    }

    /// Record a read that produced nothing (timeout or error).
    pub const fn miss(&mut self) {
        self.last = None;
    }

    /// The key the next call would suppress.
    #[must_use]
    pub const fn last(&self) -> Option<Key> {
        self.last
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Key codes ───────────────────────────────────────────────────

    #[test]
    fn byte_code_is_byte() {
        assert_eq!(Key::Byte(b'a').code(), 97);
        assert_eq!(Key::ESC.code(), 27);
        assert_eq!(Key::Byte(255).code(), 255);
    }

    #[test]
    fn special_codes_are_fixed() {
        assert_eq!(Key::Up.code(), 0x100);
        assert_eq!(Key::Down.code(), 0x101);
        assert_eq!(Key::Left.code(), 0x102);
        assert_eq!(Key::Right.code(), 0x103);
        assert_eq!(Key::Home.code(), 0x104);
        assert_eq!(Key::End.code(), 0x105);
        assert_eq!(Key::PageUp.code(), 0x106);
        assert_eq!(Key::PageDown.code(), 0x107);
        assert_eq!(Key::CtrlInsert.code(), 0x108);
    }

    #[test]
    fn from_code_inverts_code() {
        for &(k, code, _) in &SPECIAL {
            assert_eq!(Key::from_code(code), Some(k));
        }
        assert_eq!(Key::from_code(13), Some(Key::ENTER));
        assert_eq!(Key::from_code(0x109), None);
        assert_eq!(Key::from_code(u16::MAX), None);
    }

    #[test]
    fn glyphs() {
        assert_eq!(Key::Up.glyph(), Some('↑'));
        assert_eq!(Key::PageDown.glyph(), Some('⇟'));
        assert_eq!(Key::CtrlInsert.glyph(), Some('⎘'));
        assert_eq!(Key::Byte(b'x').glyph(), None);
    }

    #[test]
    fn display() {
        assert_eq!(Key::Left.to_string(), "←");
        assert_eq!(Key::Byte(b'q').to_string(), "q");
        assert_eq!(Key::Byte(9).to_string(), "c:9");
    }

    // ── decode ──────────────────────────────────────────────────────

    #[test]
    fn decode_empty() {
        assert_eq!(decode(b""), None);
    }

    #[test]
    fn decode_single_byte() {
        assert_eq!(decode(b"a"), Some(Key::Byte(b'a')));
        assert_eq!(decode(b"\x1b"), Some(Key::ESC));
        assert_eq!(decode(b"\x03"), Some(Key::CTRL_C));
    }

    #[test]
    fn decode_arrows() {
        assert_eq!(decode(b"\x1b[A"), Some(Key::Up));
        assert_eq!(decode(b"\x1b[B"), Some(Key::Down));
        assert_eq!(decode(b"\x1b[C"), Some(Key::Right));
        assert_eq!(decode(b"\x1b[D"), Some(Key::Left));
    }

    #[test]
    fn decode_home_end_both_forms() {
        assert_eq!(decode(b"\x1b[H"), Some(Key::Home));
        assert_eq!(decode(b"\x1b[F"), Some(Key::End));
        assert_eq!(decode(b"\x1b[1~"), Some(Key::Home));
        assert_eq!(decode(b"\x1b[4~"), Some(Key::End));
    }

    #[test]
    fn decode_paging() {
        assert_eq!(decode(b"\x1b[5~"), Some(Key::PageUp));
        assert_eq!(decode(b"\x1b[6~"), Some(Key::PageDown));
    }

    #[test]
    fn decode_ctrl_insert() {
        assert_eq!(decode(b"\x1b[2;5~"), Some(Key::CtrlInsert));
    }

    #[test]
    fn decode_unknown_sequence_is_first_byte() {
        assert_eq!(decode(b"\x1b[Z"), Some(Key::ESC));
        assert_eq!(decode(b"\x1b[3~"), Some(Key::ESC));
        assert_eq!(decode(b"\x1b[2;3~"), Some(Key::ESC));
    }

    #[test]
    fn decode_length_must_match_exactly() {
        // Up arrow followed by another byte is not Up.
        assert_eq!(decode(b"\x1b[Ax"), Some(Key::ESC));
        assert_eq!(decode(b"\x1b["), Some(Key::ESC));
    }

    #[test]
    fn decode_utf8_is_lead_byte() {
        assert_eq!(decode("é".as_bytes()), Some(Key::Byte(0xc3)));
    }

    // ── rune_of ─────────────────────────────────────────────────────

    #[test]
    fn rune_of_empty() {
        assert_eq!(rune_of(b""), None);
    }

    #[test]
    fn rune_of_byte() {
        assert_eq!(rune_of(b"z"), Some('z'));
        assert_eq!(rune_of(b"\x01"), Some('\u{1}'));
    }

    #[test]
    fn rune_of_special() {
        assert_eq!(rune_of(b"\x1b[A"), Some('↑'));
        assert_eq!(rune_of(b"\x1b[6~"), Some('⇟'));
        assert_eq!(rune_of(b"\x1b[2;5~"), Some('⎘'));
    }

    #[test]
    fn rune_of_utf8() {
        assert_eq!(rune_of("ø".as_bytes()), Some('ø'));
        assert_eq!(rune_of("→x".as_bytes()), Some('→'));
        assert_eq!(rune_of("🦀".as_bytes()), Some('🦀'));
    }

    #[test]
    fn rune_of_invalid_utf8() {
        assert_eq!(rune_of(b"\xff\xfe"), Some(char::REPLACEMENT_CHARACTER));
    }

    #[test]
    fn rune_of_unknown_escape_is_esc() {
        assert_eq!(rune_of(b"\x1b[Z"), Some('\x1b'));
    }

    // ── label_of ────────────────────────────────────────────────────

    #[test]
    fn label_of_empty() {
        assert_eq!(label_of(b""), "");
    }

    #[test]
    fn label_of_printable() {
        assert_eq!(label_of(b"a"), "a");
        assert_eq!(label_of(b" "), " ");
        assert_eq!(label_of(b"~"), "~");
    }

    #[test]
    fn label_of_control() {
        assert_eq!(label_of(b"\x1b"), "c:27");
        assert_eq!(label_of(b"\r"), "c:13");
        assert_eq!(label_of(b"\x7f"), "c:127");
        assert_eq!(label_of(b"\0"), "c:0");
    }

    #[test]
    fn label_of_special() {
        assert_eq!(label_of(b"\x1b[B"), "↓");
        assert_eq!(label_of(b"\x1b[1~"), "⇱");
        assert_eq!(label_of(b"\x1b[4~"), "⇲");
        assert_eq!(label_of(b"\x1b[5~"), "⇞");
    }

    #[test]
    fn label_of_utf8() {
        assert_eq!(label_of("æøå".as_bytes()), "æøå");
    }

    #[test]
    fn projections_agree_on_special() {
        let reads: [&[u8]; 6] = [b"\x1b[A", b"\x1b[H", b"\x1b[5~", b"\x1b[2;5~", b"\x1b[Q", b"ab"];
        for bytes in reads {
            let key = decode(bytes).unwrap();
            let glyph = key.glyph();
            assert_eq!(glyph.is_some(), key.is_special());
            if let Some(g) = glyph {
                assert_eq!(rune_of(bytes), Some(g));
                assert_eq!(label_of(bytes), g.to_string());
            }
        }
    }

    // ── KeyDecoder ──────────────────────────────────────────────────

    #[test]
    fn up_twice_is_up_then_nothing() {
        let mut d = KeyDecoder::new();
        assert_eq!(d.key(b"\x1b[A"), Some(Key::Up));
        assert_eq!(d.key(b"\x1b[A"), None);
    }

    #[test]
    fn third_repeat_is_reported() {
        let mut d = KeyDecoder::new();
        assert_eq!(d.key(b"j"), Some(Key::Byte(b'j')));
        assert_eq!(d.key(b"j"), None);
        assert_eq!(d.key(b"j"), Some(Key::Byte(b'j')));
    }

    #[test]
    fn different_keys_pass() {
        let mut d = KeyDecoder::new();
        assert_eq!(d.key(b"\x1b[A"), Some(Key::Up));
        assert_eq!(d.key(b"\x1b[B"), Some(Key::Down));
        assert_eq!(d.key(b"\x1b[A"), Some(Key::Up));
    }

    #[test]
    fn miss_clears_memory() {
        let mut d = KeyDecoder::new();
        assert_eq!(d.key(b"x"), Some(Key::Byte(b'x')));
        d.miss();
        assert_eq!(d.last(), None);
        assert_eq!(d.key(b"x"), Some(Key::Byte(b'x')));
    }

    #[test]
    fn empty_read_clears_memory() {
        let mut d = KeyDecoder::new();
        d.key(b"x");
        assert_eq!(d.key(b""), None);
        assert_eq!(d.key(b"x"), Some(Key::Byte(b'x')));
    }

    #[test]
    fn nul_is_no_key() {
        let mut d = KeyDecoder::new();
        assert_eq!(d.key(b"\0"), None);
        assert_eq!(d.last(), None);
    }
}
