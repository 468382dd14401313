//! Placeholder substitution and assertion evaluation
//!
//! Templates contain zero or more `{…}` groups. Each group body follows a
//! two-rule grammar:
//!
//! ```text
//! primary    := literal | contextRef | responseQuery
//! comparison := primary operator primary
//! ```
//!
//! `contextRef` is `context[N]` followed by an optional JSONPath tail and
//! reads response body `N` of the current test case. A quoted operand is
//! always a literal. Any other operand is a `responseQuery`: it is looked
//! up in the current response and falls back to its own text when nothing
//! matches.

pub mod jsonpath;
pub mod projection;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;

use crate::context::ContextStore;

use projection::{Operator, compare, project};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    #[error("`{{{0}}}` is not a comparison (expected `operand OP operand`)")]
    NotAComparison(String),
}

/// Operand of an expression group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primary<'t> {
    /// `context[N]<path>`
    Context { index: usize, path: &'t str },
    /// Path looked up in the current response, literal on miss
    Query(&'t str),
    /// Quoted text
    Literal(&'t str),
}

impl<'t> Primary<'t> {
    #[must_use]
    pub fn parse(text: &'t str) -> Self {
        let text = text.trim();
        if let Some(rest) = text.strip_prefix("context[") {
            if let Some(close) = rest.find(']') {
                if let Ok(index) = rest[..close].trim().parse() {
                    return Self::Context {
                        index,
                        path: &rest[close + 1..],
                    };
                }
            }
        }
        for quote in ['"', '\''] {
            if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
                return Self::Literal(&text[1..text.len() - 1]);
            }
        }
        Self::Query(text)
    }

    /// Resolve to a JSON value, or `None` when this operand is literal text.
    fn lookup(&self, ctx: &ContextStore, response: Option<&Value>) -> Option<Value> {
        match *self {
            Self::Context { index, path } => {
                let path = if path.is_empty() { "$" } else { path };
                let found = ctx
                    .get(index)
                    .and_then(|body| jsonpath::first(body, path))
                    .cloned();
                Some(found.unwrap_or(Value::Null))
            }
            Self::Query(q) => response.and_then(|r| jsonpath::first(r, q)).cloned(),
            Self::Literal(_) => None,
        }
    }

    fn text(&self, ctx: &ContextStore, response: Option<&Value>) -> String {
        match (self.lookup(ctx, response), self) {
            (Some(v), _) => display(&v),
            (None, Self::Query(t) | Self::Literal(t)) => (*t).to_string(),
            (None, Self::Context { .. }) => "null".to_string(),
        }
    }
}

/// `primary operator primary`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison<'t> {
    pub lhs: Primary<'t>,
    pub op: Operator,
    pub rhs: Primary<'t>,
}

impl<'t> Comparison<'t> {
    /// Split on the first operator outside brackets and quotes.
    ///
    /// A quote only opens when it starts the left operand.
    #[must_use]
    pub fn parse(body: &'t str) -> Option<Self> {
        let mut quote: Option<char> = None;
        let mut brackets = 0usize;
        for (i, c) in body.char_indices() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') if body[..i].trim().is_empty() => quote = Some(c),
                (None, '[') => brackets += 1,
                (None, ']') => brackets = brackets.saturating_sub(1),
                (None, _) if brackets == 0 => {
                    let tail = &body[i..];
                    let Some((token, op)) = Operator::TOKENS
                        .iter()
                        .find(|(token, _)| tail.starts_with(token))
                    else {
                        continue;
                    };
                    let lhs = body[..i].trim();
                    let rhs = body[i + token.len()..].trim();
                    if lhs.is_empty() || rhs.is_empty() {
                        return None;
                    }
                    return Some(Self {
                        lhs: Primary::parse(lhs),
                        op: *op,
                        rhs: Primary::parse(rhs),
                    });
                }
                (None, _) => {}
            }
        }
        None
    }

    #[must_use]
    pub fn evaluate(&self, ctx: &ContextStore, response: Option<&Value>) -> bool {
        let lhs = project(&self.lhs.text(ctx, response));
        let rhs = project(&self.rhs.text(ctx, response));
        compare(&lhs, self.op, &rhs)
    }
}

struct Group<'t> {
    start: usize,
    end: usize,
    body: &'t str,
}

/// Innermost, non-empty `{…}` groups in order.
fn groups(template: &str) -> Vec<Group<'_>> {
    let mut found = Vec::new();
    let mut open = None;
    for (i, b) in template.bytes().enumerate() {
        match b {
            b'{' => open = Some(i),
            b'}' => {
                if let Some(start) = open.take() {
                    if i > start + 1 {
                        found.push(Group {
                            start,
                            end: i + 1,
                            body: &template[start + 1..i],
                        });
                    }
                }
            }
            _ => {}
        }
    }
    found
}

fn replace_groups(template: &str, mut f: impl FnMut(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut cursor = 0;
    for group in groups(template) {
        out.push_str(&template[cursor..group.start]);
        match f(group.body) {
            Some(replacement) => out.push_str(&replacement),
            None => out.push_str(&template[group.start..group.end]),
        }
        cursor = group.end;
    }
    out.push_str(&template[cursor..]);
    out
}

/// Whether `template` contains at least one `{…}` group.
#[must_use]
pub fn has_placeholders(template: &str) -> bool {
    !groups(template).is_empty()
}

/// Render a JSON value the way it appears inside a template.
#[must_use]
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Substitution mode: replace every resolvable group with its value.
///
/// Groups that resolve to nothing (quoted literals, response queries
/// without a match or without a response) are left verbatim.
#[must_use]
pub fn resolve(template: &str, ctx: &ContextStore, response: Option<&Value>) -> String {
    replace_groups(template, |body| {
        Primary::parse(body)
            .lookup(ctx, response)
            .map(|v| display(&v))
    })
}

/// Like [`resolve`], but a template that is exactly one group keeps the
/// JSON type of the resolved value.
#[must_use]
pub fn resolve_value(template: &str, ctx: &ContextStore, response: Option<&Value>) -> Value {
    if let [group] = groups(template).as_slice() {
        if group.start == 0 && group.end == template.len() {
            if let Some(v) = Primary::parse(group.body).lookup(ctx, response) {
                return v;
            }
        }
    }
    Value::String(resolve(template, ctx, response))
}

/// Resolve an `Authorization` header value before the request is sent.
///
/// With the `Basic` scheme a `{user:pass}` group that is not a context
/// reference is base64-encoded in place. Context references resolve as
/// usual; there is no response yet.
#[must_use]
pub fn resolve_authorization(value: &str, ctx: &ContextStore) -> String {
    let basic = value
        .trim_start()
        .get(..6)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("basic "));
    replace_groups(value, |body| match Primary::parse(body) {
        p @ Primary::Context { .. } => p.lookup(ctx, None).map(|v| display(&v)),
        _ if basic && body.contains(':') => Some(BASE64.encode(body)),
        _ => None,
    })
}

/// Assertion mode: every group must be a comparison and all must hold.
///
/// Text outside the groups is not compared. A template without groups
/// falls back to structural equality with `actual`.
///
/// # Errors
///
/// [`ExpressionError::NotAComparison`] when a group is not of the form
/// `operand OP operand`.
pub fn evaluate(
    template: &str,
    ctx: &ContextStore,
    actual: &Value,
) -> Result<bool, ExpressionError> {
    let groups = groups(template);
    if groups.is_empty() {
        return Ok(*actual == Value::String(template.to_string()));
    }
    let mut all = true;
    for group in groups {
        let comparison = Comparison::parse(group.body)
            .ok_or_else(|| ExpressionError::NotAComparison(group.body.to_string()))?;
        all &= comparison.evaluate(ctx, Some(actual));
    }
    Ok(all)
}
