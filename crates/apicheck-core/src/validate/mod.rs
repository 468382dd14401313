//! Recursive schema validation
//!
//! A practical subset of JSON-Schema / OpenAPI keywords: type dispatch,
//! `oneOf`/`anyOf`/`allOf`, `$ref` through [`ComponentResolver`], string
//! formats and numeric/length/item bounds. Objects are closed: every key
//! present in the data must be declared in `properties`.

mod error;
pub mod formats;

use serde_json::Value;

use crate::components::ComponentResolver;

pub use error::{SchemaError, ValidationError};

/// Consecutive `$ref` hops allowed without descending into data.
const MAX_REF_HOPS: u32 = 32;
/// Overall recursion bound.
const MAX_DEPTH: u32 = 256;

/// Validates values against schema nodes, resolving `$ref` via components.
#[derive(Debug, Clone, Copy)]
pub struct SchemaValidator<'a> {
    components: &'a ComponentResolver,
}

#[derive(Clone, Copy)]
struct Depth {
    total: u32,
    ref_hops: u32,
}

impl Depth {
    const ROOT: Self = Self {
        total: 0,
        ref_hops: 0,
    };

    /// Step into a child value.
    fn descend(self) -> Self {
        Self {
            total: self.total + 1,
            ref_hops: 0,
        }
    }

    /// Follow a `$ref` (or composition branch) on the same value.
    fn hop(self) -> Self {
        Self {
            total: self.total + 1,
            ref_hops: self.ref_hops + 1,
        }
    }
}

impl<'a> SchemaValidator<'a> {
    #[must_use]
    pub fn new(components: &'a ComponentResolver) -> Self {
        Self { components }
    }

    /// Validate `value` against `schema` without coercion.
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidDefinition`] when the schema is unusable,
    /// [`SchemaError::Mismatch`] when the data does not conform.
    pub fn validate(&self, value: &Value, schema: &Value) -> Result<(), SchemaError> {
        self.validate_with(value, schema, None, false)
    }

    /// Validate with an optional key label and scalar coercion.
    ///
    /// Coercion (used for path/query parameters) turns non-string input
    /// into a string for `string` nodes and parses strings for
    /// `number`/`integer` nodes.
    ///
    /// # Errors
    ///
    /// See [`SchemaValidator::validate`].
    pub fn validate_with(
        &self,
        value: &Value,
        schema: &Value,
        key: Option<&str>,
        coerce: bool,
    ) -> Result<(), SchemaError> {
        self.check(value, schema, key.unwrap_or(""), coerce, Depth::ROOT)
    }

    fn check(
        &self,
        value: &Value,
        schema: &Value,
        key: &str,
        coerce: bool,
        depth: Depth,
    ) -> Result<(), SchemaError> {
        if depth.total > MAX_DEPTH {
            return Err(SchemaError::invalid(
                format!("schema nesting exceeds {MAX_DEPTH} levels"),
                schema,
            ));
        }
        if depth.ref_hops > MAX_REF_HOPS {
            return Err(SchemaError::invalid("cyclic $ref chain", schema));
        }
        let Some(node) = schema.as_object() else {
            return Err(SchemaError::invalid("schema node is not an object", schema));
        };

        let mut has_composition = false;
        for keyword in ["oneOf", "anyOf"] {
            if let Some(branches) = node.get(keyword) {
                has_composition = true;
                self.check_any(keyword, branches, value, schema, key, coerce, depth)?;
            }
        }
        if let Some(branches) = node.get("allOf") {
            has_composition = true;
            let branches = composition_branches("allOf", branches, schema)?;
            for branch in branches {
                self.check(value, branch, key, coerce, depth.hop())?;
            }
        }

        if let Some(reference) = node.get("$ref") {
            let resolved = reference
                .as_str()
                .and_then(|r| self.components.resolve(r))
                .ok_or_else(|| {
                    SchemaError::invalid(format!("unresolvable $ref {reference}"), schema)
                })?;
            self.check(value, resolved, key, coerce, depth.hop())?;
        } else if !node.contains_key("type") && !has_composition {
            return Err(SchemaError::invalid(
                "schema node has neither `type` nor a composition keyword",
                schema,
            ));
        }

        match node.get("type") {
            None => Ok(()),
            Some(_) if value.is_null() && node.get("nullable") == Some(&Value::Bool(true)) => {
                Ok(())
            }
            Some(Value::String(ty)) => self.check_type(ty, value, schema, key, coerce, depth),
            Some(Value::Array(types)) => {
                let mut first_err = None;
                for ty in types {
                    let Some(ty) = ty.as_str() else {
                        return Err(SchemaError::invalid("`type` entries must be strings", schema));
                    };
                    match self.check_type(ty, value, schema, key, coerce, depth) {
                        Ok(()) => return Ok(()),
                        Err(e @ SchemaError::InvalidDefinition { .. }) => return Err(e),
                        Err(e) => {
                            first_err.get_or_insert(e);
                        }
                    }
                }
                Err(first_err
                    .unwrap_or_else(|| SchemaError::invalid("`type` list is empty", schema)))
            }
            Some(_) => Err(SchemaError::invalid("`type` must be a string", schema)),
        }
    }

    /// `oneOf` / `anyOf`: at least one branch must accept the value.
    #[allow(clippy::too_many_arguments)]
    fn check_any(
        &self,
        keyword: &str,
        branches: &Value,
        value: &Value,
        schema: &Value,
        key: &str,
        coerce: bool,
        depth: Depth,
    ) -> Result<(), SchemaError> {
        let branches = composition_branches(keyword, branches, schema)?;
        let mut representative = None;
        for branch in branches {
            match self.check(value, branch, key, coerce, depth.hop()) {
                Ok(()) => return Ok(()),
                Err(e @ SchemaError::InvalidDefinition { .. }) => return Err(e),
                Err(e) => {
                    representative.get_or_insert(e);
                }
            }
        }
        Err(representative.unwrap_or_else(|| {
            SchemaError::mismatch(format!("no {keyword} branch matched"), schema, value, Some(key))
        }))
    }

    fn check_type(
        &self,
        ty: &str,
        value: &Value,
        schema: &Value,
        key: &str,
        coerce: bool,
        depth: Depth,
    ) -> Result<(), SchemaError> {
        match ty {
            "array" => self.check_array(value, schema, key, coerce, depth),
            "object" => self.check_object(value, schema, key, coerce, depth),
            "string" => check_string(value, schema, key, coerce),
            "number" => check_number(value, schema, key, coerce, false),
            "integer" => check_number(value, schema, key, coerce, true),
            "boolean" if value.is_boolean() => Ok(()),
            "null" if value.is_null() => Ok(()),
            "boolean" | "null" => Err(SchemaError::mismatch(
                format!("expected {ty}, got {}", kind_of(value)),
                schema,
                value,
                Some(key),
            )),
            other => Err(SchemaError::invalid(format!("unknown type `{other}`"), schema)),
        }
    }

    fn check_array(
        &self,
        value: &Value,
        schema: &Value,
        key: &str,
        coerce: bool,
        depth: Depth,
    ) -> Result<(), SchemaError> {
        let Some(items) = value.as_array() else {
            return Err(SchemaError::mismatch(
                format!("expected array, got {}", kind_of(value)),
                schema,
                value,
                Some(key),
            ));
        };
        let len = items.len() as u64;
        if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
            if len < min {
                return Err(SchemaError::mismatch(
                    format!("array has {len} items, fewer than minItems {min}"),
                    schema,
                    value,
                    Some(key),
                ));
            }
        }
        if let Some(max) = schema.get("maxItems").and_then(Value::as_u64) {
            if len > max {
                return Err(SchemaError::mismatch(
                    format!("array has {len} items, more than maxItems {max}"),
                    schema,
                    value,
                    Some(key),
                ));
            }
        }
        if let Some(item_schema) = schema.get("items") {
            let item_schema = self.resolve_direct(item_schema)?;
            for (i, item) in items.iter().enumerate() {
                let child = format!("{key}[{i}]");
                self.check(item, item_schema, &child, coerce, depth.descend())?;
            }
        }
        Ok(())
    }

    fn check_object(
        &self,
        value: &Value,
        schema: &Value,
        key: &str,
        coerce: bool,
        depth: Depth,
    ) -> Result<(), SchemaError> {
        let Some(fields) = value.as_object() else {
            return Err(SchemaError::mismatch(
                format!("expected object, got {}", kind_of(value)),
                schema,
                value,
                Some(key),
            ));
        };
        let properties = schema.get("properties").and_then(Value::as_object);
        for (name, field) in fields {
            let child = if key.is_empty() {
                name.clone()
            } else {
                format!("{key}.{name}")
            };
            let Some(prop_schema) = properties.and_then(|p| p.get(name)) else {
                return Err(SchemaError::mismatch(
                    format!("property `{name}` is not declared in schema"),
                    schema,
                    value,
                    Some(&child),
                ));
            };
            let prop_schema = self.resolve_direct(prop_schema)?;
            self.check(field, prop_schema, &child, coerce, depth.descend())?;
        }
        Ok(())
    }

    /// Follow a bare `{"$ref": ...}` node to its target.
    fn resolve_direct<'s>(&'s self, schema: &'s Value) -> Result<&'s Value, SchemaError> {
        match schema.get("$ref") {
            Some(reference) if schema.as_object().is_some_and(|o| o.len() == 1) => reference
                .as_str()
                .and_then(|r| self.components.resolve(r))
                .ok_or_else(|| {
                    SchemaError::invalid(format!("unresolvable $ref {reference}"), schema)
                }),
            _ => Ok(schema),
        }
    }
}

fn composition_branches<'v>(
    keyword: &str,
    branches: &'v Value,
    schema: &Value,
) -> Result<&'v Vec<Value>, SchemaError> {
    match branches.as_array() {
        Some(list) if !list.is_empty() => Ok(list),
        Some(_) => Err(SchemaError::invalid(format!("`{keyword}` is empty"), schema)),
        None => Err(SchemaError::invalid(
            format!("`{keyword}` must be an array"),
            schema,
        )),
    }
}

fn check_string(value: &Value, schema: &Value, key: &str, coerce: bool) -> Result<(), SchemaError> {
    let text = match value {
        Value::String(s) => s.clone(),
        other if coerce => match other {
            Value::Null => "null".to_string(),
            v => v.to_string(),
        },
        other => {
            return Err(SchemaError::mismatch(
                format!("expected string, got {}", kind_of(other)),
                schema,
                value,
                Some(key),
            ));
        }
    };
    let fail = |message: String| Err(SchemaError::mismatch(message, schema, value, Some(key)));

    let len = text.chars().count() as u64;
    if let Some(min) = schema.get("minLength").and_then(Value::as_u64) {
        if len < min {
            return fail(format!("length {len} is shorter than minLength {min}"));
        }
    }
    if let Some(max) = schema.get("maxLength").and_then(Value::as_u64) {
        if len > max {
            return fail(format!("length {len} is longer than maxLength {max}"));
        }
    }
    if let Some(options) = schema.get("enum").and_then(Value::as_array) {
        if !options.iter().any(|o| o.as_str() == Some(text.as_str())) {
            return fail(format!("`{text}` is not one of {}", Value::Array(options.clone())));
        }
    }
    if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
        let re = regex::Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
            SchemaError::invalid(format!("invalid pattern `{pattern}`: {e}"), schema)
        })?;
        if !re.is_match(&text) {
            return fail(format!("`{text}` does not match pattern `{pattern}`"));
        }
    }
    if let Some(format) = schema.get("format").and_then(Value::as_str) {
        if formats::check(format, &text) == Some(false) {
            return fail(format!("`{text}` is not a valid {format}"));
        }
    }
    Ok(())
}

fn check_number(
    value: &Value,
    schema: &Value,
    key: &str,
    coerce: bool,
    integer: bool,
) -> Result<(), SchemaError> {
    let expected = if integer { "integer" } else { "number" };
    let fail = |message: String| Err(SchemaError::mismatch(message, schema, value, Some(key)));

    let (n, repr) = match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) => (f, n.to_string()),
            None => return fail(format!("{n} is not representable as a number")),
        },
        Value::String(s) if coerce => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => (f, s.trim().to_string()),
            _ => return fail(format!("`{s}` is not a {expected}")),
        },
        other => return fail(format!("expected {expected}, got {}", kind_of(other))),
    };

    if integer && n.fract() != 0.0 {
        return fail(format!("{repr} has a fractional part"));
    }

    let minimum = schema.get("minimum").and_then(Value::as_f64);
    let maximum = schema.get("maximum").and_then(Value::as_f64);
    match schema.get("exclusiveMinimum") {
        Some(Value::Bool(true)) => {
            if let Some(min) = minimum.filter(|min| n <= *min) {
                return fail(format!("{repr} must be greater than {min}"));
            }
        }
        Some(Value::Number(min)) => {
            if let Some(min) = min.as_f64().filter(|min| n <= *min) {
                return fail(format!("{repr} must be greater than {min}"));
            }
        }
        _ => {}
    }
    match schema.get("exclusiveMaximum") {
        Some(Value::Bool(true)) => {
            if let Some(max) = maximum.filter(|max| n >= *max) {
                return fail(format!("{repr} must be less than {max}"));
            }
        }
        Some(Value::Number(max)) => {
            if let Some(max) = max.as_f64().filter(|max| n >= *max) {
                return fail(format!("{repr} must be less than {max}"));
            }
        }
        _ => {}
    }
    if let Some(min) = minimum.filter(|min| n < *min) {
        return fail(format!("{repr} is less than minimum {min}"));
    }
    if let Some(max) = maximum.filter(|max| n > *max) {
        return fail(format!("{repr} is greater than maximum {max}"));
    }
    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests;
