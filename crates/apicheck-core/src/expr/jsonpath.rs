//! Minimal JSONPath: `$`, `.key`, `['key']`, `[N]`, `[*]`, `.*`

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
    Wildcard,
}

/// Query `root` and return every match in document order.
///
/// A path without a leading `$` is treated as relative to the root, so
/// `user.id` and `$.user.id` are equivalent. Unparseable paths match nothing.
#[must_use]
pub fn query<'v>(root: &'v Value, path: &str) -> Vec<&'v Value> {
    let Some(segments) = parse(path) else {
        return Vec::new();
    };
    let mut current = vec![root];
    for segment in &segments {
        let mut next = Vec::new();
        for value in current {
            match (segment, value) {
                (Segment::Key(k), Value::Object(map)) => next.extend(map.get(k)),
                (Segment::Index(i), Value::Array(items)) => next.extend(items.get(*i)),
                (Segment::Wildcard, Value::Array(items)) => next.extend(items.iter()),
                (Segment::Wildcard, Value::Object(map)) => next.extend(map.values()),
                _ => {}
            }
        }
        if next.is_empty() {
            return next;
        }
        current = next;
    }
    current
}

/// First match, if any.
#[must_use]
pub fn first<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    query(root, path).into_iter().next()
}

fn parse(path: &str) -> Option<Vec<Segment>> {
    let path = path.trim();
    // recursive descent is not supported
    if path.is_empty() || path.contains("..") {
        return None;
    }
    match path.strip_prefix('$') {
        Some(rest) => parse_from(rest),
        None if path.starts_with(['.', '[']) => parse_from(path),
        None => parse_from(&format!(".{path}")),
    }
}

fn parse_from(mut rest: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    while !rest.is_empty() {
        if let Some(after_dot) = rest.strip_prefix('.') {
            let end = after_dot.find(['.', '[']).unwrap_or(after_dot.len());
            let key = &after_dot[..end];
            if key.is_empty() {
                return None;
            }
            segments.push(if key == "*" {
                Segment::Wildcard
            } else {
                Segment::Key(key.to_string())
            });
            rest = &after_dot[end..];
        } else if let Some(after_bracket) = rest.strip_prefix('[') {
            let end = after_bracket.find(']')?;
            let inner = after_bracket[..end].trim();
            let segment = if inner == "*" {
                Segment::Wildcard
            } else if let Some(quoted) = strip_quotes(inner) {
                Segment::Key(quoted.to_string())
            } else {
                Segment::Index(inner.parse().ok()?)
            };
            segments.push(segment);
            rest = &after_bracket[end + 1..];
        } else {
            return None;
        }
    }
    Some(segments)
}

fn strip_quotes(s: &str) -> Option<&str> {
    s.strip_prefix('\'')
        .and_then(|r| r.strip_suffix('\''))
        .or_else(|| s.strip_prefix('"').and_then(|r| r.strip_suffix('"')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "access_token": "abc",
            "user": {"id": 7, "tags": ["a", "b"]},
            "items": [{"id": "x"}, {"id": "y"}],
            "odd key": true
        })
    }

    #[test]
    fn dotted_paths_with_and_without_root() {
        let d = doc();
        assert_eq!(first(&d, "$.access_token"), Some(&json!("abc")));
        assert_eq!(first(&d, "access_token"), Some(&json!("abc")));
        assert_eq!(first(&d, ".user.id"), Some(&json!(7)));
    }

    #[test]
    fn indexes_and_wildcards() {
        let d = doc();
        assert_eq!(first(&d, "$.items[1].id"), Some(&json!("y")));
        assert_eq!(first(&d, "user.tags[0]"), Some(&json!("a")));
        assert_eq!(query(&d, "$.items[*].id"), vec![&json!("x"), &json!("y")]);
        assert_eq!(first(&d, "$['odd key']"), Some(&json!(true)));
    }

    #[test]
    fn root_alone_returns_document() {
        let d = doc();
        assert_eq!(first(&d, "$"), Some(&d));
    }

    #[test]
    fn no_match_is_empty() {
        let d = doc();
        assert!(query(&d, "$.missing").is_empty());
        assert!(query(&d, "42").is_empty());
        assert!(query(&d, "10.0").is_empty());
        assert!(query(&d, "$.items[9]").is_empty());
        assert!(query(&d, "$..id").is_empty());
        assert!(query(&d, "").is_empty());
    }

    #[test]
    fn array_root_by_index() {
        let d = json!([{"id": 1}]);
        assert_eq!(first(&d, "[0].id"), Some(&json!(1)));
        assert_eq!(first(&d, "$[0].id"), Some(&json!(1)));
    }
}
