pub mod allocation;
pub mod build;
pub mod project;
pub mod registry;
