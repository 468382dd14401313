//! Fixed `format` patterns for string validation

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

const DATE_TIME: &str = r"(?i)^\d\d\d\d-[0-1]\d-[0-3]\d[t\s](?:[0-2]\d:[0-5]\d:[0-5]\d|23:59:60)(?:\.\d+)?(?:z|[+-]\d\d(?::?\d\d)?)$";
const DATE: &str = r"^\d\d\d\d-[0-1]\d-[0-3]\d$";
const TIME: &str =
    r"(?i)^(?:[0-2]\d:[0-5]\d:[0-5]\d|23:59:60)(?:\.\d+)?(?:z|[+-]\d\d(?::?\d\d)?)$";
const DURATION: &str = r"^P(?:\d+W|(?:\d+Y)?(?:\d+M)?(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+S)?)?)$";
const EMAIL: &str = r"(?i)^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)*$";
const HOSTNAME: &str =
    r"(?i)^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[-0-9a-z]{0,61}[0-9a-z])?)*\.?$";
const IPV4: &str = r"^(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)$";
const IPV6: &str = r"(?i)^((([0-9a-f]{1,4}:){7}([0-9a-f]{1,4}|:))|(([0-9a-f]{1,4}:){6}(:[0-9a-f]{1,4}|((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3})|:))|(([0-9a-f]{1,4}:){5}(((:[0-9a-f]{1,4}){1,2})|:((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3})|:))|(([0-9a-f]{1,4}:){4}(((:[0-9a-f]{1,4}){1,3})|((:[0-9a-f]{1,4})?:((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}))|:))|(([0-9a-f]{1,4}:){3}(((:[0-9a-f]{1,4}){1,4})|((:[0-9a-f]{1,4}){0,2}:((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}))|:))|(([0-9a-f]{1,4}:){2}(((:[0-9a-f]{1,4}){1,5})|((:[0-9a-f]{1,4}){0,3}:((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}))|:))|(([0-9a-f]{1,4}:){1}(((:[0-9a-f]{1,4}){1,6})|((:[0-9a-f]{1,4}){0,4}:((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}))|:))|(:(((:[0-9a-f]{1,4}){1,7})|((:[0-9a-f]{1,4}){0,5}:((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}))|:)))$";
const URI: &str = r"(?i)^(?:[a-z][a-z0-9+\-.]*:)(?:/?/)?[^\s]*$";
const UUID: &str = r"(?i)^(?:urn:uuid:)?[0-9a-f]{8}-(?:[0-9a-f]{4}-){3}[0-9a-f]{12}$";

static FORMATS: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    [
        ("date-time", DATE_TIME),
        ("date", DATE),
        ("time", TIME),
        ("duration", DURATION),
        ("email", EMAIL),
        ("hostname", HOSTNAME),
        ("ipv4", IPV4),
        ("ipv6", IPV6),
        ("uri", URI),
        ("uuid", UUID),
    ]
    .into_iter()
    .map(|(name, pattern)| {
        let re = Regex::new(pattern).expect("built-in format pattern must compile");
        (name, re)
    })
    .collect()
});

/// Check `value` against a named format.
///
/// Returns `None` for formats outside the fixed set; callers ignore those.
#[must_use]
pub fn check(format: &str, value: &str) -> Option<bool> {
    let re = FORMATS.get(format)?;
    if !re.is_match(value) {
        return Some(false);
    }
    // Lookahead parts of the canonical patterns, expressed as plain checks.
    let ok = match format {
        "duration" => value != "P" && !value.ends_with('T'),
        "hostname" => value.trim_end_matches('.').len() <= 253,
        _ => true,
    };
    Some(ok)
}
