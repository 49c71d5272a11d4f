//! Best-effort parsing of relative timestamps ("5d", "2mo ago").
//!
//! LinkedIn reports post age this way instead of an absolute timestamp. The
//! result is inherently approximate and is used only for display and coarse
//! filtering — never for checkpoint arithmetic.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s*(mo|yr|[smhdwy])").expect("relative-time pattern is valid")
    })
}

/// Parses strings like `"5d"`, `"3w ago"`, `"2mo • Edited"` into an
/// approximate absolute timestamp relative to `now`.
///
/// Units: `s` seconds, `m` minutes, `h` hours, `d` days, `w` weeks,
/// `mo` months (30 days), `yr`/`y` years (365 days). Returns `None` for
/// anything that does not lead with `<count><unit>`.
#[must_use]
pub fn parse_relative_time(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let captures = pattern().captures(raw)?;
    let count: i64 = captures.get(1)?.as_str().parse().ok()?;
    let unit = captures.get(2)?.as_str();

    // Anything claiming to be older than a century is garbage input.
    if count > 36_500 {
        return None;
    }

    let age = match unit {
        "s" => Duration::seconds(count),
        "m" => Duration::minutes(count),
        "h" => Duration::hours(count),
        "d" => Duration::days(count),
        "w" => Duration::weeks(count),
        "mo" => Duration::days(count * 30),
        "yr" | "y" => Duration::days(count * 365),
        _ => return None,
    };

    now.checked_sub_signed(age)
}
