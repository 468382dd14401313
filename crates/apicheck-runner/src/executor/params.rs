//! Parameter declarations and extraction from the request body

use apicheck_core::expr;
use apicheck_core::{ComponentResolver, ContextStore, SchemaValidator};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

use crate::error::StepError;

/// Characters left unescaped in a URL component (RFC 3986 unreserved
/// plus the sub-delims browsers keep in `encodeURIComponent`).
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ParamLocation {
    Path,
    Query,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Parameter {
    pub(super) name: String,
    pub(super) location: ParamLocation,
    pub(super) schema: Value,
    pub(super) required: bool,
}

/// Collect parameters from the path item, then the operation.
///
/// A `$ref` entry names a component schema whose properties are each one
/// parameter: path parameters on the path item, query parameters on the
/// operation.
pub(super) fn collect(
    path_item: &Value,
    operation: &Value,
    components: &ComponentResolver,
) -> Result<Vec<Parameter>, StepError> {
    let mut params = Vec::new();
    for (source, group_location) in [
        (path_item, ParamLocation::Path),
        (operation, ParamLocation::Query),
    ] {
        let Some(entries) = source.get("parameters").and_then(Value::as_array) else {
            continue;
        };
        for entry in entries {
            match entry.get("$ref").and_then(Value::as_str) {
                Some(reference) => {
                    let schema = components.resolve(reference).ok_or_else(|| {
                        StepError::InvalidSchemaDefinition {
                            message: format!("unresolvable parameter $ref {reference}"),
                            schema: entry.clone(),
                        }
                    })?;
                    params.extend(expand_group(schema, group_location));
                }
                None => params.extend(parse_parameter(entry)),
            }
        }
    }
    Ok(params)
}

fn expand_group(schema: &Value, location: ParamLocation) -> Vec<Parameter> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, prop)| Parameter {
                    name: name.clone(),
                    location,
                    schema: prop.clone(),
                    required: required.contains(&name.as_str()),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_parameter(param: &Value) -> Option<Parameter> {
    let name = param.get("name")?.as_str()?.to_string();
    let location = match param.get("in")?.as_str()? {
        "path" => ParamLocation::Path,
        "query" => ParamLocation::Query,
        _ => return None,
    };
    let schema = param
        .get("schema")
        .cloned()
        .unwrap_or(serde_json::json!({"type": "string"}));
    let required = param
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Some(Parameter {
        name,
        location,
        schema,
        required,
    })
}

/// Resolved `(name, encoded value)` pairs plus the body that is left.
pub(super) struct Extracted {
    pub(super) pairs: Vec<(String, String)>,
    pub(super) remaining: Option<Value>,
}

/// Pull every parameter at `location` out of `body`.
///
/// Each value runs through substitution, is validated with coercion and
/// URL-encoded. The input body is consumed; the depleted body is returned.
pub(super) fn extract(
    params: &[Parameter],
    location: ParamLocation,
    body: Option<Value>,
    ctx: &ContextStore,
    validator: &SchemaValidator<'_>,
) -> Result<Extracted, StepError> {
    let mut pairs = Vec::new();
    let mut remaining = body;
    for param in params.iter().filter(|p| p.location == location) {
        let (taken, rest) = take_field(remaining, &param.name);
        remaining = rest;
        let raw = match taken {
            Some(v) => v,
            None if param.required => {
                return Err(StepError::MissingRequiredParameter(param.name.clone()));
            }
            None => continue,
        };
        let value = match raw {
            Value::String(s) => expr::resolve_value(&s, ctx, None),
            other => other,
        };
        validator
            .validate_with(&value, &param.schema, Some(param.name.as_str()), true)
            .map_err(|e| StepError::from_parameter(&param.name, e))?;
        pairs.push((param.name.clone(), encode(&expr::display(&value))));
    }
    Ok(Extracted { pairs, remaining })
}

/// Split `name` off an object body.
fn take_field(body: Option<Value>, name: &str) -> (Option<Value>, Option<Value>) {
    match body {
        Some(Value::Object(mut fields)) => {
            let taken = fields.remove(name);
            (taken, Some(Value::Object(fields)))
        }
        other => (None, other),
    }
}

pub(super) fn encode(text: &str) -> String {
    utf8_percent_encode(text, COMPONENT).to_string()
}

/// Replace `{name}` segments of a path template.
pub(super) fn splice_path(template: &str, pairs: &[(String, String)]) -> String {
    pairs.iter().fold(template.to_string(), |path, (name, value)| {
        path.replace(&format!("{{{name}}}"), value)
    })
}

/// `a=1&b=2`, names encoded.
pub(super) fn query_string(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| format!("{}={value}", encode(name)))
        .collect::<Vec<_>>()
        .join("&")
}
