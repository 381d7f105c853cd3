// SPDX-License-Identifier: MIT
//
// Escape catalog — VT100 commands looked up by name.
//
// Every escape sequence this crate emits comes from here. A command is a
// human-readable name ("Cursor Home", "Erase Screen") mapped to a template
// containing `{PLACEHOLDER}` markers. Resolving substitutes the caller's
// parameters and memoizes the result, so the renderer's steady state is a
// read-locked hash lookup per attribute change.
//
// The catalog is an owned value, not process-global state. Share it with
// an `Arc` between the canvas, the terminal setup code, and anything else
// that emits sequences; tests build their own.
//
// An unknown command resolves to the empty string and is never cached.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::{PoisonError, RwLock};

use tracing::trace;

/// Name of the SGR command used by the attribute encoder.
pub const SET_ATTRIBUTE_MODE: &str = "Set Attribute Mode";

/// Placeholder in [`SET_ATTRIBUTE_MODE`] replaced by `;`-joined codes.
pub const ATTRIBUTES: &str = "{attr1};...;{attrn}";

/// Row placeholder (1-based) used by the cursor positioning commands.
pub const ROW: &str = "{ROW}";

/// Column placeholder (1-based) used by the cursor positioning commands.
pub const COLUMN: &str = "{COLUMN}";

/// Repeat-count placeholder used by relative cursor movement.
pub const COUNT: &str = "{COUNT}";

// ─── Command Table ──────────────────────────────────────────────────────────

/// The VT100 control set, plus the DEC private modes the canvas needs.
#[rustfmt::skip]
const VT100: &[(&str, &str)] = &[
    // Device status
    ("Query Device Code",       "\x1b[c"),
    ("Report Device Code",      "\x1b[{code}0c"),
    ("Query Device Status",     "\x1b[5n"),
    ("Report Device OK",        "\x1b[0n"),
    ("Report Device Failure",   "\x1b[3n"),
    ("Query Cursor Position",   "\x1b[6n"),
    ("Report Cursor Position",  "\x1b[{ROW};{COLUMN}R"),
    // Terminal setup
    ("Reset Device",            "\x1bc"),
    ("Enable Line Wrap",        "\x1b[?7h"),
    ("Disable Line Wrap",       "\x1b[?7l"),
    ("Echo Off",                "\x1b[12h"),
    // Fonts
    ("Font Set G0",             "\x1b("),
    ("Font Set G1",             "\x1b)"),
    // Cursor control
    ("Cursor Home",             "\x1b[{ROW};{COLUMN}H"),
    ("Cursor Up",               "\x1b[{COUNT}A"),
    ("Cursor Down",             "\x1b[{COUNT}B"),
    ("Cursor Forward",          "\x1b[{COUNT}C"),
    ("Cursor Backward",         "\x1b[{COUNT}D"),
    ("Force Cursor Position",   "\x1b[{ROW};{COLUMN}f"),
    ("Save Cursor",             "\x1b[s"),
    ("Unsave Cursor",           "\x1b[u"),
    ("Save Cursor & Attrs",     "\x1b7"),
    ("Restore Cursor & Attrs",  "\x1b8"),
    ("Show Cursor",             "\x1b[?25h"),
    ("Hide Cursor",             "\x1b[?25l"),
    // Scrolling
    ("Scroll Screen",           "\x1b[r"),
    ("Scroll Region",           "\x1b[{start};{end}r"),
    ("Scroll Down",             "\x1bD"),
    ("Scroll Up",               "\x1bM"),
    // Tab control
    ("Set Tab",                 "\x1bH"),
    ("Clear Tab",               "\x1b[g"),
    ("Clear All Tabs",          "\x1b[3g"),
    // Erasing text
    ("Erase End of Line",       "\x1b[K"),
    ("Erase Start of Line",     "\x1b[1K"),
    ("Erase Line",              "\x1b[2K"),
    ("Erase Down",              "\x1b[J"),
    ("Erase Up",                "\x1b[1J"),
    ("Erase Screen",            "\x1b[2J"),
    // Printing
    ("Print Screen",            "\x1b[i"),
    ("Print Line",              "\x1b[1i"),
    ("Stop Print Log",          "\x1b[4i"),
    ("Start Print Log",         "\x1b[5i"),
    // Define key
    ("Set Key Definition",      "\x1b[{key};\"{string}\"p"),
    // Display attributes
    ("Set Attribute Mode",      "\x1b[{attr1};...;{attrn}m"),
];

// ─── Catalog ────────────────────────────────────────────────────────────────

/// Named escape-sequence templates with a memoizing resolver.
///
/// ```
/// use vt_term::catalog::{Catalog, COLUMN, ROW};
///
/// let catalog = Catalog::new();
/// assert_eq!(catalog.resolve("Cursor Home", &[(ROW, "3"), (COLUMN, "7")]), "\x1b[3;7H");
/// assert_eq!(catalog.resolve("No Such Command", &[]), "");
/// ```
pub struct Catalog {
    templates: HashMap<String, String>,
    /// Command names in definition order, for [`commands`](Self::commands).
    names: Vec<String>,
    cache: RwLock<HashMap<String, String>>,
}

impl Catalog {
    /// Catalog holding the full VT100 command table.
    #[must_use]
    pub fn new() -> Self {
        let mut catalog = Self::empty();
        for &(name, template) in VT100 {
            catalog.define(name, template);
        }
        catalog
    }

    /// Catalog with no commands at all. Every lookup resolves to `""`.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
            names: Vec::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Add or replace a command template.
    ///
    /// Meant for construction time, before the catalog is shared.
    #[must_use]
    pub fn with_template(mut self, name: &str, template: &str) -> Self {
        self.define(name, template);
        self
    }

    fn define(&mut self, name: &str, template: &str) {
        if self
            .templates
            .insert(name.to_owned(), template.to_owned())
            .is_none()
        {
            self.names.push(name.to_owned());
        }
        self.cache
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Whether `name` is a known command.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// All known command names, in definition order.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Resolve `command` with `params` substituted into its template.
    ///
    /// Each `(placeholder, value)` pair replaces the first occurrence of
    /// `placeholder`, in the order given. When a placeholder appears more
    /// than once in `params`, only its last value is used. Placeholders
    /// without a value stay in the output verbatim. An unknown or empty
    /// command name yields `""`.
    pub fn resolve(&self, command: &str, params: &[(&str, &str)]) -> String {
        if command.is_empty() {
            return String::new();
        }

        let params = last_per_placeholder(params);
        let key = cache_key(command, &params);
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = cache.get(&key) {
                return hit.clone();
            }
        }

        let Some(template) = self.templates.get(command) else {
            trace!(command, "unknown escape command");
            return String::new();
        };

        let mut resolved = template.clone();
        for &(placeholder, value) in &params {
            resolved = resolved.replacen(placeholder, value, 1);
        }

        trace!(command, "escape cache miss");
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, resolved.clone());
        resolved
    }

    /// Resolve `command` and write it straight to `w`.
    ///
    /// Unknown commands write nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn execute(
        &self,
        w: &mut impl Write,
        command: &str,
        params: &[(&str, &str)],
    ) -> io::Result<()> {
        let seq = self.resolve(command, params);
        if seq.is_empty() {
            return Ok(());
        }
        w.write_all(seq.as_bytes())
    }

    /// Number of memoized resolutions.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    // ── Convenience commands ────────────────────────────────────────

    /// Move the cursor to `(x, y)`.
    ///
    /// Our coordinates are 0-indexed; VT100 is 1-indexed.
    #[must_use]
    pub fn cursor_to(&self, x: u16, y: u16) -> String {
        let row = (u32::from(y) + 1).to_string();
        let col = (u32::from(x) + 1).to_string();
        self.resolve("Cursor Home", &[(ROW, &row), (COLUMN, &col)])
    }

    /// Move the cursor to the upper left corner.
    #[must_use]
    pub fn cursor_home(&self) -> String {
        self.resolve("Cursor Home", &[("{ROW};{COLUMN}", "")])
    }

    /// Move the cursor up by `n` rows.
    #[must_use]
    pub fn cursor_up(&self, n: u16) -> String {
        self.relative("Cursor Up", n)
    }

    /// Move the cursor down by `n` rows.
    #[must_use]
    pub fn cursor_down(&self, n: u16) -> String {
        self.relative("Cursor Down", n)
    }

    /// Move the cursor right by `n` columns.
    #[must_use]
    pub fn cursor_forward(&self, n: u16) -> String {
        self.relative("Cursor Forward", n)
    }

    /// Move the cursor left by `n` columns.
    #[must_use]
    pub fn cursor_backward(&self, n: u16) -> String {
        self.relative("Cursor Backward", n)
    }

    fn relative(&self, command: &str, n: u16) -> String {
        self.resolve(command, &[(COUNT, &n.to_string())])
    }

    /// Show or hide the cursor.
    #[must_use]
    pub fn cursor_visibility(&self, visible: bool) -> String {
        self.resolve(if visible { "Show Cursor" } else { "Hide Cursor" }, &[])
    }

    /// Enable or disable automatic line wrap.
    #[must_use]
    pub fn line_wrap(&self, enable: bool) -> String {
        self.resolve(
            if enable {
                "Enable Line Wrap"
            } else {
                "Disable Line Wrap"
            },
            &[],
        )
    }

    /// SGR with the given attribute codes, already `;`-joined.
    #[must_use]
    pub fn attribute_mode(&self, codes: &str) -> String {
        self.resolve(SET_ATTRIBUTE_MODE, &[(ATTRIBUTES, codes)])
    }

    /// Reset every display attribute (SGR 0).
    #[must_use]
    pub fn reset_attributes(&self) -> String {
        self.attribute_mode("0")
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("commands", &self.names.len())
            .field("cached", &self.cached())
            .finish()
    }
}

/// Drop every pair whose placeholder is given again later in `params`.
fn last_per_placeholder<'a>(params: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    params
        .iter()
        .enumerate()
        .filter(|&(i, &(placeholder, _))| {
            !params[i + 1..].iter().any(|&(p, _)| p == placeholder)
        })
        .map(|(_, &pair)| pair)
        .collect()
}

/// Cache key: command name plus the parameters in substitution order.
/// Substitution is order-sensitive when placeholders overlap, so two
/// orderings never share an entry.
fn cache_key(command: &str, params: &[(&str, &str)]) -> String {
    let mut key = String::with_capacity(command.len() + 16 * params.len());
    key.push_str(command);
    for (placeholder, value) in params {
        let _ = write!(key, "\u{1f}{placeholder}={value}");
    }
    key
}

// ─── Tests ───────────────────────────────────────────────────────────────────
