pub mod atomic;
pub mod descriptor;
pub mod registry;
