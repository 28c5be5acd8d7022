//! 宏展开模块：在消息正文中展开随机选择与掷骰指令。
//!
//! # Macro Evaluator
//!
//! Expands inline `{{ ... }}` directives found in fragment bodies:
//!
//! | Directive | Example | Result |
//! |-----------|---------|--------|
//! | choice | `{{random::sunny::rainy}}`, `{{random:a,b,c}}` | one item, uniformly |
//! | dice | `{{roll:2d6}}`, `{{roll d20}}` | sum of the draws, as decimal |
//!
//! Expansion is total: unrecognized or unterminated directives are kept verbatim and
//! recorded as [`MacroWarning`]s. Nested directives are evaluated innermost first, and
//! every occurrence draws independently.
//!
//! ```rust
//! use ai_lib_preset::macros::MacroEvaluator;
//!
//! let mut macros = MacroEvaluator::seeded(7);
//! let text = macros.expand("It is {{random::sunny::rainy}} and you rolled {{roll:1d1}}.");
//! assert!(text.ends_with("you rolled 1."));
//! ```

mod directive;

pub use directive::{Directive, MAX_DICE};

use directive::find_macro_end;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

/// Why a directive was left verbatim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroWarningKind {
    Unrecognized,
    Unterminated,
}

/// Non-fatal report about directive text that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroWarning {
    pub kind: MacroWarningKind,
    /// Directive text as it appeared, delimiters included
    pub directive: String,
}

impl MacroWarning {
    fn new(kind: MacroWarningKind, directive: &str) -> Self {
        Self {
            kind,
            directive: directive.to_string(),
        }
    }
}

/// Macro expander over a random source.
#[derive(Debug, Clone)]
pub struct MacroEvaluator<R = StdRng> {
    rng: R,
    warnings: Vec<MacroWarning>,
}

impl MacroEvaluator<StdRng> {
    /// Evaluator seeded from OS entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Evaluator with reproducible draws
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for MacroEvaluator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> MacroEvaluator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            warnings: Vec::new(),
        }
    }

    /// Expand every directive in `text`.
    pub fn expand(&mut self, text: &str) -> String {
        if !text.contains("{{") {
            return text.to_string();
        }
        let mut found = Vec::new();
        let out = self.expand_collect(text, &mut found);
        for warning in &found {
            match warning.kind {
                MacroWarningKind::Unrecognized => warn!(
                    directive = %warning.directive,
                    "unrecognized macro directive left verbatim"
                ),
                MacroWarningKind::Unterminated => warn!(
                    directive = %warning.directive,
                    "unterminated macro directive left verbatim"
                ),
            }
        }
        self.warnings.extend(found);
        out
    }

    fn expand_collect(&mut self, text: &str, found: &mut Vec<MacroWarning>) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let Some(end) = find_macro_end(rest, start) else {
                found.push(MacroWarning::new(MacroWarningKind::Unterminated, &rest[start..]));
                out.push_str(&rest[start..]);
                return out;
            };
            let raw = &rest[start..end];
            let replacement = self.evaluate(&raw[2..raw.len() - 2], raw, found);
            out.push_str(&replacement);
            rest = &rest[end..];
        }
        out.push_str(rest);
        out
    }

    fn evaluate(&mut self, inner: &str, raw: &str, found: &mut Vec<MacroWarning>) -> String {
        match Directive::parse(inner) {
            Directive::Choice(items) => {
                // innermost first: every item is expanded before the pick, but only the
                // chosen item's warnings reach the caller
                let mut expanded: Vec<(String, Vec<MacroWarning>)> = items
                    .iter()
                    .map(|item| {
                        let mut item_warnings = Vec::new();
                        let text = self.expand_collect(item, &mut item_warnings);
                        (text, item_warnings)
                    })
                    .collect();
                if expanded.is_empty() {
                    return String::new();
                }
                let idx = self.rng.gen_range(0..expanded.len());
                let (text, item_warnings) = expanded.swap_remove(idx);
                found.extend(item_warnings);
                text
            }
            Directive::Dice { count, sides } => {
                let total: u64 = (0..count)
                    .map(|_| u64::from(self.rng.gen_range(1..=sides)))
                    .sum();
                total.to_string()
            }
            Directive::Unrecognized => {
                found.push(MacroWarning::new(MacroWarningKind::Unrecognized, raw));
                raw.to_string()
            }
        }
    }

    pub fn warnings(&self) -> &[MacroWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<MacroWarning> {
        std::mem::take(&mut self.warnings)
    }
}
