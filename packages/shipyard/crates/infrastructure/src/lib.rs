pub mod adapters;
pub mod storage;

pub use adapters::docker::DockerCli;
pub use adapters::http::{ReqwestClient, RetryPolicy, RetryingHttpClient};
pub use adapters::process::TokioCommandRunner;
pub use storage::descriptor::DescriptorStore;
pub use storage::registry::RegistryStore;
