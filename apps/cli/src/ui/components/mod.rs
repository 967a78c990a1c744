pub mod progress;
pub mod prompt;
pub mod spinner;
pub mod table;

pub use progress::BuildProgress;
pub use spinner::Spinner;
