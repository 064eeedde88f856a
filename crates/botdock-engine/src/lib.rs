//! Container engine operations for botdock.
//!
//! Every docker invocation goes through [`DockerExecutor`], so the pipeline
//! runner and the image audit can be exercised without a container engine.

pub mod audit;
pub mod client;
pub mod docker;
pub mod executor;
pub mod runner;

pub use audit::{AuditError, AuditExpectation, AuditReport, audit_image};
pub use client::{BuildRequest, CheckResult, DockerClient, DoctorReport, ImageSummary, RunRequest};
pub use docker::DockerError;
pub use executor::{DockerExecutor, RealExecutor};
pub use runner::{BuildPlan, ImageRef, PipelineError, PipelineReport, PipelineRunner};
