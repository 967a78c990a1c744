use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Port and service name assigned to one project for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAllocation {
    pub name: String,
    pub path: PathBuf,
    pub port: u16,
    pub service_name: String,
    pub replicas: u32,
}
