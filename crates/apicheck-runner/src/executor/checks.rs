//! Response checks: contract conformance, then author expectations
//!
//! No I/O. Each check takes the already received response.

use apicheck_core::expr;
use apicheck_core::{ContextStore, ExpectedHeaders, ExpectedResponse, SchemaValidator};
use serde_json::Value;

use crate::error::StepError;
use crate::transport::HttpResponse;

/// Input for the response checks. Pure data.
pub(super) struct CheckInput<'a> {
    pub(super) operation: &'a Value,
    pub(super) response: &'a HttpResponse,
    pub(super) validator: &'a SchemaValidator<'a>,
}

/// Validate the response against the operation's `responses` entry.
///
/// - status key, then `default`; neither → violation
/// - entry `$ref` → body against the component
/// - no `content` → nothing to check
/// - content type must be declared and `application/json`-prefixed
pub(super) fn check_contract(input: &CheckInput<'_>) -> Result<(), StepError> {
    let response = input.response;
    let body = &response.body;
    let responses = input.operation.get("responses");
    let entry = responses
        .and_then(|r| r.get(response.status.to_string()))
        .or_else(|| responses.and_then(|r| r.get("default")))
        .ok_or_else(|| StepError::ResponseSchemaViolation {
            message: format!("status {} is not declared", response.status),
            detail: None,
            actual_body: body.clone(),
        })?;

    if entry.get("$ref").is_some() {
        return input
            .validator
            .validate(body, entry)
            .map_err(|e| StepError::from_response(e, body));
    }

    let Some(content) = entry.get("content").and_then(Value::as_object) else {
        return Ok(());
    };

    let actual_type = response
        .header("content-type")
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let Some((media_type, media)) = content
        .iter()
        .find(|(declared, _)| declared.to_ascii_lowercase() == actual_type)
    else {
        return Err(StepError::ResponseSchemaViolation {
            message: format!("content type '{actual_type}' is not declared"),
            detail: None,
            actual_body: body.clone(),
        });
    };
    if !media_type.to_ascii_lowercase().starts_with("application/json") {
        return Err(StepError::UnsupportedResponseContentType(media_type.clone()));
    }

    match media.get("schema") {
        Some(schema) => input
            .validator
            .validate(body, schema)
            .map_err(|e| StepError::from_response(e, body)),
        None => Ok(()),
    }
}

/// Compare the response with the step's `response` expectations.
pub(super) fn check_expectations(
    expected: &ExpectedResponse,
    response: &HttpResponse,
    ctx: &ContextStore,
) -> Result<(), StepError> {
    let mismatch = |message: String| StepError::ResponseAssertionMismatch {
        message,
        actual_body: response.body.clone(),
    };

    if let Some(status) = expected.status {
        if status != response.status {
            return Err(mismatch(format!(
                "expected status {status}, got {}",
                response.status
            )));
        }
    }

    match &expected.headers {
        Some(ExpectedHeaders::Exact(headers)) => {
            for (name, value) in headers {
                let actual = response.header(name);
                if actual != Some(value.as_str()) {
                    return Err(mismatch(format!(
                        "header '{name}': expected '{value}', got {}",
                        actual.map_or_else(|| "nothing".to_string(), |a| format!("'{a}'"))
                    )));
                }
            }
        }
        Some(ExpectedHeaders::Template(template)) => {
            let ok = expr::evaluate(template, ctx, &response.headers_value())
                .map_err(|e| mismatch(format!("headers: {e}")))?;
            if !ok {
                return Err(mismatch(format!("headers do not satisfy `{template}`")));
            }
        }
        None => {}
    }

    match &expected.body {
        Some(Value::String(template)) if expr::has_placeholders(template) => {
            let ok = expr::evaluate(template, ctx, &response.body)
                .map_err(|e| mismatch(format!("body: {e}")))?;
            if !ok {
                return Err(mismatch(format!("body does not satisfy `{template}`")));
            }
        }
        Some(body) if *body != response.body => {
            return Err(mismatch(format!(
                "expected body {body}, got {}",
                response.body
            )));
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use apicheck_core::ComponentResolver;
    use serde_json::json;

    use super::*;

    fn response(status: u16, content_type: &str, body: Value) -> HttpResponse {
        let mut headers = BTreeMap::new();
        if !content_type.is_empty() {
            headers.insert("content-type".to_string(), content_type.to_string());
        }
        HttpResponse {
            status,
            headers,
            body,
        }
    }

    fn components() -> ComponentResolver {
        ComponentResolver::from_document(&json!({
            "components": {"schemas": {
                "Item": {
                    "type": "object",
                    "properties": {"id": {"type": "string"}, "name": {"type": "string"}}
                }
            }}
        }))
    }

    fn operation() -> Value {
        json!({
            "responses": {
                "200": {"content": {"application/json": {
                    "schema": {"$ref": "#/components/schemas/Item"}
                }}},
                "204": {"description": "no content"},
                "404": {"$ref": "#/components/schemas/Item"},
                "415": {"content": {"text/plain": {"schema": {"type": "string"}}}}
            }
        })
    }

    fn run(resp: &HttpResponse) -> Result<(), StepError> {
        let c = components();
        let v = SchemaValidator::new(&c);
        let op = operation();
        check_contract(&CheckInput {
            operation: &op,
            response: resp,
            validator: &v,
        })
    }

    #[test]
    fn conforming_body_passes() {
        let resp = response(200, "application/json; charset=utf-8", json!({"id": "1"}));
        assert!(run(&resp).is_ok());
    }

    #[test]
    fn undeclared_key_violates() {
        let resp = response(200, "application/json", json!({"id": "1", "extra": true}));
        let err = run(&resp).unwrap_err();
        assert_eq!(err.kind(), "ResponseSchemaViolation");
        assert_eq!(err.actual_body(), Some(&json!({"id": "1", "extra": true})));
    }

    #[test]
    fn ref_entry_validates_directly() {
        assert!(run(&response(404, "", json!({"id": "x"}))).is_ok());
        assert!(run(&response(404, "", json!({"id": 3}))).is_err());
    }

    #[test]
    fn no_content_skips_body() {
        assert!(run(&response(204, "", json!("anything"))).is_ok());
    }

    #[test]
    fn undeclared_status_without_default_violates() {
        let err = run(&response(500, "application/json", Value::Null)).unwrap_err();
        assert_eq!(err.kind(), "ResponseSchemaViolation");
    }

    #[test]
    fn default_entry_is_fallback() {
        let c = components();
        let v = SchemaValidator::new(&c);
        let op = json!({"responses": {"default": {"content": {"application/json": {
            "schema": {"type": "object", "properties": {"error": {"type": "string"}}}
        }}}}});
        let resp = response(503, "application/json", json!({"error": "down"}));
        assert!(
            check_contract(&CheckInput {
                operation: &op,
                response: &resp,
                validator: &v,
            })
            .is_ok()
        );
    }

    #[test]
    fn non_json_media_type_is_unsupported() {
        let err = run(&response(415, "text/plain", json!("oops"))).unwrap_err();
        assert!(matches!(
            err,
            StepError::UnsupportedResponseContentType(ref t) if t == "text/plain"
        ));
    }

    #[test]
    fn undeclared_media_type_violates() {
        let err = run(&response(200, "text/html", json!("<p>"))).unwrap_err();
        assert_eq!(err.kind(), "ResponseSchemaViolation");
    }

    #[test]
    fn expected_status_and_headers() {
        let ctx = ContextStore::new();
        let resp = response(201, "application/json", json!({}));
        let expected = ExpectedResponse {
            status: Some(200),
            ..Default::default()
        };
        assert!(check_expectations(&expected, &resp, &ctx).is_err());

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        let expected = ExpectedResponse {
            status: Some(201),
            headers: Some(ExpectedHeaders::Exact(headers)),
            body: None,
        };
        assert!(check_expectations(&expected, &resp, &ctx).is_ok());
    }

    #[test]
    fn header_template_is_evaluated() {
        let ctx = ContextStore::new();
        let resp = response(200, "application/json", json!({}));
        let expected = ExpectedResponse {
            headers: Some(ExpectedHeaders::Template(
                "{content-type=application/json}".into(),
            )),
            ..Default::default()
        };
        assert!(check_expectations(&expected, &resp, &ctx).is_ok());
    }

    #[test]
    fn body_template_and_structural_equality() {
        let ctx = ContextStore::new();
        let resp = response(200, "application/json", json!({"id": "42", "n": 3}));

        let template = ExpectedResponse {
            body: Some(json!("{id=42}{n>=3}")),
            ..Default::default()
        };
        assert!(check_expectations(&template, &resp, &ctx).is_ok());

        let exact = ExpectedResponse {
            body: Some(json!({"n": 3, "id": "42"})),
            ..Default::default()
        };
        assert!(check_expectations(&exact, &resp, &ctx).is_ok());

        let wrong = ExpectedResponse {
            body: Some(json!({"id": "42"})),
            ..Default::default()
        };
        let err = check_expectations(&wrong, &resp, &ctx).unwrap_err();
        assert_eq!(err.kind(), "ResponseAssertionMismatch");
        assert_eq!(err.actual_body(), Some(&json!({"id": "42", "n": 3})));
    }

    #[test]
    fn malformed_assertion_is_mismatch() {
        let ctx = ContextStore::new();
        let resp = response(200, "application/json", json!({"id": "42"}));
        let expected = ExpectedResponse {
            body: Some(json!("{id}")),
            ..Default::default()
        };
        let err = check_expectations(&expected, &resp, &ctx).unwrap_err();
        assert_eq!(err.kind(), "ResponseAssertionMismatch");
    }
}
