//! apicheck-core: Contract model, schema validation and expression evaluation
//!
//! This crate holds everything that decides what "correct" means for a
//! contract test: the recursive schema validator, the `$ref` component
//! lookup, the placeholder/comparison expression language and the
//! per-case context store. Apart from reading the config file, no I/O
//! happens here.

pub mod components;
pub mod config;
pub mod context;
pub mod expr;
pub mod model;
pub mod report;
pub mod validate;

pub use components::ComponentResolver;
pub use config::{Config, ConfigError};
pub use context::ContextStore;
pub use expr::ExpressionError;
pub use model::{
    Contract, ContractError, ExpectedHeaders, ExpectedResponse, Invoke, RequestSpec, TestCase,
    TestSet,
};
pub use report::{CaseFailure, CaseOutcome, CaseReport, RunReport};
pub use validate::{SchemaError, SchemaValidator, ValidationError};
