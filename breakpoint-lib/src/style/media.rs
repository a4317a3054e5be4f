//! Evaluates media query lists against a fixed viewport width.
//!
//! Only the features a breakpoint stylesheet relies on are understood:
//! `width`, `min-width` and `max-width` (plus the range syntax) in `px`,
//! `em` or `rem`, the media types `all` and `screen`, `not`, `only`, `and`
//! and comma separated lists. Anything else evaluates to false.

use once_cell::sync::Lazy;
use regex::Regex;

/// Assumed root font size for `em`/`rem` lengths.
const FONT_SIZE_PX: f32 = 16.0;

#[allow(clippy::unwrap_used)] // Constant patterns, known to be valid
static RE_FEATURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(\s*(min-|max-)?width\s*:\s*([^)]+?)\s*\)$").unwrap());
#[allow(clippy::unwrap_used)]
static RE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(\s*width\s*(<=|>=|<|>|=)\s*([^)]+?)\s*\)$").unwrap());
#[allow(clippy::unwrap_used)]
static RE_RANGE_REVERSED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(\s*([^)<>=]+?)\s*(<=|>=|<|>|=)\s*width\s*\)$").unwrap());
#[allow(clippy::unwrap_used)]
static RE_AND: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+and\s+").unwrap());

fn parse_length(value: &str) -> Option<f32> {
    let value = value.trim().to_ascii_lowercase();
    let (number, scale) = if let Some(n) = value.strip_suffix("rem") {
        (n, FONT_SIZE_PX)
    } else if let Some(n) = value.strip_suffix("em") {
        (n, FONT_SIZE_PX)
    } else if let Some(n) = value.strip_suffix("px") {
        (n, 1.0)
    } else if value == "0" {
        ("0", 1.0)
    } else {
        return None;
    };
    number.trim().parse::<f32>().ok().map(|n| n * scale)
}

fn compare(width: f32, op: &str, length: f32) -> bool {
    match op {
        "<=" => width <= length,
        ">=" => width >= length,
        "<" => width < length,
        ">" => width > length,
        _ => (width - length).abs() < f32::EPSILON,
    }
}

fn flip(op: &str) -> &str {
    match op {
        "<=" => ">=",
        ">=" => "<=",
        "<" => ">",
        ">" => "<",
        other => other,
    }
}

fn condition_matches(condition: &str, width: f32) -> bool {
    let condition = condition.trim();
    if let Some(caps) = RE_FEATURE.captures(condition) {
        let Some(length) = parse_length(&caps[2]) else {
            return false;
        };
        return match caps.get(1).map(|m| m.as_str()) {
            Some("min-") => width >= length,
            Some("max-") => width <= length,
            _ => compare(width, "=", length),
        };
    }
    if let Some(caps) = RE_RANGE.captures(condition) {
        return parse_length(&caps[2]).is_some_and(|length| compare(width, &caps[1], length));
    }
    if let Some(caps) = RE_RANGE_REVERSED.captures(condition) {
        return parse_length(&caps[1])
            .is_some_and(|length| compare(width, flip(&caps[2]), length));
    }
    false
}

fn query_matches(query: &str, width: f32) -> bool {
    let mut query = query.trim();
    let mut negated = false;
    let lower = query.to_ascii_lowercase();
    if lower.starts_with("not ") {
        negated = true;
        query = query[4..].trim_start();
    } else if lower.starts_with("only ") {
        query = query[5..].trim_start();
    }

    let matched = RE_AND.split(query).all(|part| {
        let part = part.trim();
        if part.starts_with('(') {
            condition_matches(part, width)
        } else {
            part.eq_ignore_ascii_case("all") || part.eq_ignore_ascii_case("screen")
        }
    });
    matched != negated
}

/// True when any query of the comma separated `media_list` matches a viewport
/// `width` pixels wide. An empty list always matches.
pub fn media_matches(media_list: &str, width: f32) -> bool {
    if media_list.trim().is_empty() {
        return true;
    }
    media_list
        .split(',')
        .any(|query| query_matches(query, width))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_and_max_width() {
        assert!(media_matches("(min-width: 600px)", 800.0));
        assert!(!media_matches("(min-width:600px)", 599.0));
        assert!(media_matches("screen and (max-width: 40em)", 640.0));
        assert!(!media_matches("screen and (max-width: 40em)", 641.0));
        assert!(media_matches("(min-width: 600px) and (max-width: 900px)", 700.0));
    }

    #[test]
    fn range_syntax() {
        assert!(media_matches("(width >= 600px)", 600.0));
        assert!(!media_matches("(width < 600px)", 600.0));
        assert!(media_matches("(400px < width)", 500.0));
    }

    #[test]
    fn media_types_and_lists() {
        assert!(!media_matches("print", 1000.0));
        assert!(media_matches("print, (min-width: 10px)", 1000.0));
        assert!(media_matches("not print", 1000.0));
        assert!(media_matches("only screen", 1000.0));
        assert!(media_matches("", 10.0));
        assert!(!media_matches("(orientation: landscape)", 1000.0));
    }
}
