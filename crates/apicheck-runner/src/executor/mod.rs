//! Sequence executor: runs the steps of one test case in order
//!
//! Each step builds its request from the contract and the context store,
//! dispatches it through the [`Transport`], then checks the response
//! against the contract and the author's expectations.

mod checks;
mod params;

use std::collections::BTreeMap;

use apicheck_core::expr;
use apicheck_core::{
    CaseFailure, CaseReport, ContextStore, Contract, Invoke, SchemaValidator, TestCase,
};
use serde_json::Value;

use crate::canned::CannedSpecs;
use crate::error::StepError;
use crate::log::{Level, Logger};
use crate::transport::{HttpMethod, HttpRequest, Transport};

use checks::{CheckInput, check_contract, check_expectations};
use params::ParamLocation;

/// Request settings applied to every step unless the step overrides them.
#[derive(Debug, Clone, Default)]
pub struct RequestDefaults {
    /// Base URL used when neither the step nor the case sets `contextPath`
    pub base_url: Option<String>,
    /// Headers merged under each step's own headers
    pub headers: BTreeMap<String, String>,
}

pub struct SequenceExecutor<'a> {
    contract: &'a Contract,
    canned: &'a CannedSpecs,
    transport: &'a dyn Transport,
    logger: &'a Logger,
    defaults: &'a RequestDefaults,
}

impl<'a> SequenceExecutor<'a> {
    #[must_use]
    pub fn new(
        contract: &'a Contract,
        canned: &'a CannedSpecs,
        transport: &'a dyn Transport,
        logger: &'a Logger,
        defaults: &'a RequestDefaults,
    ) -> Self {
        Self {
            contract,
            canned,
            transport,
            logger,
            defaults,
        }
    }

    /// Run every step of `case`, stopping at the first failure.
    ///
    /// A case without steps is skipped. The context store lives only for
    /// the duration of this call.
    pub fn run_case(&self, case: &TestCase) -> CaseReport {
        if case.sequence.is_empty() {
            self.logger
                .write_log(Level::INFO, &format!("[SKIP] {}: empty sequence", case.title));
            return CaseReport::skipped(&case.title);
        }

        let mut ctx = ContextStore::new();
        for (index, invoke) in case.sequence.iter().enumerate() {
            let label = format!("{} {}", invoke.method.to_ascii_uppercase(), invoke.path);
            match self.run_step(case, invoke, &ctx) {
                Ok(body) => {
                    self.logger.write_log(
                        Level::INFO,
                        &format!("[PASS] {} step {index}: {label}", case.title),
                    );
                    ctx.push(body);
                }
                Err(err) => {
                    self.logger.write_log(
                        Level::INFO,
                        &format!("[NG] {} step {index}: {label}: {err}", case.title),
                    );
                    if let Some(detail) = err.detail() {
                        self.logger.detail(&detail);
                    }
                    return CaseReport::failed(
                        &case.title,
                        index,
                        CaseFailure {
                            step: index,
                            kind: err.kind().to_string(),
                            message: err.to_string(),
                            actual_body: err.actual_body().cloned(),
                        },
                    );
                }
            }
        }
        CaseReport::passed(&case.title, ctx.len())
    }

    /// Execute one step and return the response body to append to the
    /// context.
    ///
    /// # Errors
    ///
    /// Any [`StepError`]; the context is left untouched.
    pub fn run_step(
        &self,
        case: &TestCase,
        invoke: &Invoke,
        ctx: &ContextStore,
    ) -> Result<Value, StepError> {
        let base = self.base_path(case, invoke);

        let path_item = self
            .contract
            .path_item(&invoke.path)
            .or_else(|| invoke.spec.as_deref().and_then(|name| self.canned.get(name)))
            .ok_or_else(|| StepError::SpecNotFound {
                method: invoke.method.clone(),
                path: invoke.path.clone(),
            })?;

        let method = HttpMethod::parse(&invoke.method)
            .ok_or_else(|| StepError::UnsupportedMethod(invoke.method.clone()))?;
        let operation = method
            .contract_keys()
            .iter()
            .find_map(|key| path_item.get(*key))
            .ok_or_else(|| StepError::SpecNotFound {
                method: invoke.method.clone(),
                path: invoke.path.clone(),
            })?;

        let request = invoke.request.clone().unwrap_or_default();
        let headers = self.resolve_headers(request.headers, ctx);

        let components = self.contract.components();
        let validator = SchemaValidator::new(components);
        let declared = params::collect(path_item, operation, components)?;

        let path = params::extract(&declared, ParamLocation::Path, request.body, ctx, &validator)?;
        let query = params::extract(
            &declared,
            ParamLocation::Query,
            path.remaining,
            ctx,
            &validator,
        )?;

        let mut url = format!("{base}{}", params::splice_path(&invoke.path, &path.pairs));
        if !query.pairs.is_empty() {
            let sep = if url.contains('?') { '&' } else { '?' };
            url = format!("{url}{sep}{}", params::query_string(&query.pairs));
        }

        let body = query
            .remaining
            .filter(|_| method.allows_body())
            .filter(|b| !b.is_null() && b.as_object().is_none_or(|o| !o.is_empty()))
            .map(|b| substitute_body(b, ctx));

        let request = HttpRequest {
            method,
            url,
            headers,
            body,
        };
        if self.logger.is_verbose() {
            self.logger.detail(&format!(
                "request: {} {}\nheaders: {:?}\nbody: {}",
                request.method,
                request.url,
                request.headers,
                request.body.as_ref().map_or_else(String::new, Value::to_string)
            ));
        }

        let response = self.transport.request(&request)?;
        if self.logger.is_verbose() {
            self.logger.detail(&format!(
                "response: {}\nheaders: {:?}\nbody: {}",
                response.status, response.headers, response.body
            ));
        }

        check_contract(&CheckInput {
            operation,
            response: &response,
            validator: &validator,
        })?;
        if let Some(expected) = &invoke.response {
            check_expectations(expected, &response, ctx)?;
        }

        Ok(response.body)
    }

    /// Absolute URL in the path wins; otherwise the first `contextPath`
    /// found on the step, the case, or the configured base URL.
    fn base_path(&self, case: &TestCase, invoke: &Invoke) -> String {
        if is_absolute(&invoke.path) {
            return String::new();
        }
        invoke
            .context_path
            .as_deref()
            .or(case.context_path.as_deref())
            .or(self.defaults.base_url.as_deref())
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string()
    }

    fn resolve_headers(
        &self,
        own: BTreeMap<String, String>,
        ctx: &ContextStore,
    ) -> BTreeMap<String, String> {
        let mut merged = self.defaults.headers.clone();
        merged.retain(|name, _| !own.keys().any(|k| k.eq_ignore_ascii_case(name)));
        merged.extend(own);
        merged
            .into_iter()
            .map(|(name, value)| {
                let value = if name.eq_ignore_ascii_case("authorization") {
                    expr::resolve_authorization(&value, ctx)
                } else {
                    expr::resolve(&value, ctx, None)
                };
                (name, value)
            })
            .collect()
    }
}

fn is_absolute(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Substitute every string leaf of a request body.
fn substitute_body(body: Value, ctx: &ContextStore) -> Value {
    match body {
        Value::String(s) => expr::resolve_value(&s, ctx, None),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| substitute_body(item, ctx))
                .collect(),
        ),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k, substitute_body(v, ctx)))
                .collect(),
        ),
        other => other,
    }
}
