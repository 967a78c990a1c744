use domain::{BuildResult, ServiceAllocation};
use std::path::PathBuf;

/// Outcome of a full build run, before deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// One result per input project, in input order.
    pub results: Vec<BuildResult>,
    /// One allocation per succeeded project, in input order.
    pub allocations: Vec<ServiceAllocation>,
    /// Set when the descriptor and registry were written.
    pub descriptor_path: Option<PathBuf>,
    pub registry_path: Option<PathBuf>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Nothing to deploy when every project failed.
    pub fn should_deploy(&self) -> bool {
        self.succeeded() > 0
    }

    pub fn allocation_for(&self, result: &BuildResult) -> Option<&ServiceAllocation> {
        self.allocations.iter().find(|a| a.path == result.path)
    }

    /// `N succeeded, M failed`
    pub fn summary_line(&self) -> String {
        format!("{} succeeded, {} failed", self.succeeded(), self.failed())
    }
}
