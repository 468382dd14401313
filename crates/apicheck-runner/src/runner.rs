//! Test runner: iterates test cases and aggregates the report

use std::time::Duration;

use apicheck_core::{Config, Contract, RunReport, TestSet};

use crate::canned::CannedSpecs;
use crate::error::RunError;
use crate::executor::{RequestDefaults, SequenceExecutor};
use crate::load;
use crate::log::{Level, Logger};
use crate::transport::{ReqwestTransport, Transport};

/// Runs a test set against one contract.
///
/// Cases run sequentially in declaration order; each gets its own
/// context store, so one failing case never affects another.
pub struct TestRunner {
    contract: Contract,
    canned: CannedSpecs,
    transport: Box<dyn Transport>,
    logger: Logger,
    defaults: RequestDefaults,
}

impl TestRunner {
    /// Runner with the built-in canned operations and no defaults.
    #[must_use]
    pub fn new(contract: Contract, transport: Box<dyn Transport>, logger: Logger) -> Self {
        Self {
            contract,
            canned: CannedSpecs::builtin(),
            transport,
            logger,
            defaults: RequestDefaults::default(),
        }
    }

    /// Build from config: loads the contract and extra canned operations,
    /// and sends over HTTP with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the contract or a canned document cannot be
    /// loaded, or the HTTP client cannot be built.
    pub fn from_config(config: &Config, logger: Logger) -> Result<Self, RunError> {
        let contract = load::load_contract(&config.contract)?;
        let transport = ReqwestTransport::new(Duration::from_secs(config.timeout_secs))?;

        let mut canned = CannedSpecs::builtin();
        for (name, path) in &config.canned {
            canned.register(name.clone(), load::load_document(path)?);
        }

        Ok(Self::new(contract, Box::new(transport), logger)
            .with_canned(canned)
            .with_defaults(RequestDefaults {
                base_url: config.base_url.clone(),
                headers: config.headers.clone(),
            }))
    }

    #[must_use]
    pub fn with_canned(mut self, canned: CannedSpecs) -> Self {
        self.canned = canned;
        self
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: RequestDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Run every case of `tests`.
    ///
    /// # Errors
    ///
    /// [`RunError::InvalidTestSet`] when there are no cases; nothing runs.
    pub fn run(&self, tests: &TestSet) -> Result<RunReport, RunError> {
        if tests.test_cases.is_empty() {
            return Err(RunError::InvalidTestSet(
                "`testCases` is missing or empty".into(),
            ));
        }

        let executor = SequenceExecutor::new(
            &self.contract,
            &self.canned,
            self.transport.as_ref(),
            &self.logger,
            &self.defaults,
        );
        let cases = tests
            .test_cases
            .iter()
            .map(|case| executor.run_case(case))
            .collect();

        let report = RunReport::from_cases(cases);
        self.logger.write_log(
            Level::INFO,
            &format!(
                "{} passed, {} failed, {} skipped",
                report.passed, report.failed, report.skipped
            ),
        );
        Ok(report)
    }
}
