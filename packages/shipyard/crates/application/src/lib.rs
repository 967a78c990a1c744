//! Use cases: the full build run, the rebuild run, and the server console.

pub mod build_executor;
pub mod console;
pub mod context;
pub mod deploy;
pub mod fetcher;
pub mod image_assembler;
pub mod observer;
pub mod orchestrator;
pub mod pipeline;
pub mod rebuild;
pub mod report;

pub use context::{PipelineContext, PipelineSettings};
pub use deploy::{DeployMode, Deployer};
pub use observer::{EnvSecretSource, NoopObserver, PipelineObserver, SecretSource, Stage};
pub use orchestrator::BuildOrchestrator;
pub use rebuild::{RebuildOrchestrator, RebuildReport};
pub use report::RunReport;
