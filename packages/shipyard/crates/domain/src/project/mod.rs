pub mod loader;

pub use loader::ProjectLoader;
