pub mod allocation;
pub mod catalog;
pub mod descriptor;
pub mod entities;
pub mod error;
pub mod fingerprint;
pub mod image;
pub mod ports;
pub mod project;

pub use entities::allocation::ServiceAllocation;
pub use entities::build::{BuildOutcome, BuildResult, BuiltProject};
pub use entities::project::ProjectSpec;
pub use entities::registry::{ProjectRegistry, RegistryEntry};
pub use error::{OrchestratorError, PipelineError};
