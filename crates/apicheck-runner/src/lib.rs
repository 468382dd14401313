//! apicheck-runner: executes contract test sets over HTTP

pub mod canned;
pub mod error;
pub mod executor;
pub mod load;
pub mod log;
pub mod runner;
pub mod transport;

pub use canned::CannedSpecs;
pub use error::{RunError, StepError};
pub use executor::{RequestDefaults, SequenceExecutor};
pub use log::Logger;
pub use runner::TestRunner;
pub use transport::{
    HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError,
};
