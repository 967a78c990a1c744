pub mod dependencies;
pub mod metadata;
pub mod validation;

pub use dependencies::*;
pub use metadata::*;
pub use validation::*;
