//! Distributed orchestration of embedding jobs
//!
//! Splits a large vectorization request into fixed-size batches, submits
//! each as an independent job against a [`JobEndpoint`], and polls a
//! bounded number of jobs per iteration until completion or deadline.
//! Individual batch failures never abort a run; the result carries the
//! vectors that succeeded and the count of batches that did not.

pub mod endpoint;
pub mod error;
pub mod http;
pub mod local;
pub mod orchestrator;

pub use endpoint::{JobEndpoint, JobStatus};
pub use error::OrchestrationError;
pub use http::{HttpEndpointConfig, HttpJobEndpoint};
pub use local::LocalJobEndpoint;
pub use orchestrator::{
    JobOrchestrator, JobState, OrchestrationResult, OrchestratorConfig, RemoteJob,
};

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;
