//! Directive parsing for `{{ ... }}` macro bodies

use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound on dice per roll; larger counts are treated as unrecognized.
pub const MAX_DICE: u32 = 1000;

static DICE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d*)d(\d+)\s*$").expect("dice pattern is a valid regex")
});

/// Closed set of directive families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `random::a::b` / `random:a,b`; items still carry their nested directives
    Choice(Vec<String>),
    /// `roll:NdM`: sum of `count` draws in `[1, sides]`
    Dice { count: u32, sides: u32 },
    Unrecognized,
}

impl Directive {
    /// Classify the text between the outer delimiters.
    pub fn parse(inner: &str) -> Self {
        let inner = inner.trim();
        if let Some(rest) = strip_head(inner, "random") {
            let rest = rest.trim_start();
            let body = if let Some(b) = rest.strip_prefix("::") {
                b
            } else if let Some(b) = rest.strip_prefix(':') {
                b
            } else {
                return Directive::Unrecognized;
            };
            return Directive::Choice(split_options(body));
        }
        if let Some(rest) = strip_head(inner, "roll") {
            let rest = rest.trim_start();
            let rest = rest
                .strip_prefix("::")
                .or_else(|| rest.strip_prefix(':'))
                .unwrap_or(rest);
            return parse_dice(rest);
        }
        Directive::Unrecognized
    }
}

fn strip_head<'a>(text: &'a str, head: &str) -> Option<&'a str> {
    let prefix = text.get(..head.len())?;
    if prefix.eq_ignore_ascii_case(head) {
        text.get(head.len()..)
    } else {
        None
    }
}

fn parse_dice(body: &str) -> Directive {
    let Some(caps) = DICE_PATTERN.captures(body) else {
        return Directive::Unrecognized;
    };
    let count = match caps.get(1).map(|m| m.as_str()) {
        Some("") | None => Some(1),
        Some(n) => n.parse::<u32>().ok(),
    };
    let sides = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
    match (count, sides) {
        (Some(count), Some(sides)) if count > 0 && sides > 0 && count <= MAX_DICE => {
            Directive::Dice { count, sides }
        }
        _ => Directive::Unrecognized,
    }
}

/// Split a choice body on `::` or `,` at nesting depth zero.
/// Items are trimmed and empty items dropped.
pub(crate) fn split_options(body: &str) -> Vec<String> {
    let bytes = body.as_bytes();
    let mut options = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i..].starts_with(b"{{") {
            depth += 1;
            i += 2;
            continue;
        }
        if depth > 0 && bytes[i..].starts_with(b"}}") {
            depth -= 1;
            i += 2;
            continue;
        }
        if depth == 0 {
            if bytes[i..].starts_with(b"::") {
                options.push(&body[start..i]);
                i += 2;
                start = i;
                continue;
            }
            if bytes[i] == b',' {
                options.push(&body[start..i]);
                i += 1;
                start = i;
                continue;
            }
        }
        i += 1;
    }
    options.push(&body[start..]);

    options
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Byte index just past the `}}` matching the `{{` at `start`.
pub(crate) fn find_macro_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i + 1 < bytes.len() {
        if bytes[i..].starts_with(b"{{") {
            depth += 1;
            i += 2;
            continue;
        }
        if bytes[i..].starts_with(b"}}") {
            depth = depth.saturating_sub(1);
            i += 2;
            if depth == 0 {
                return Some(i);
            }
            continue;
        }
        i += 1;
    }
    None
}
