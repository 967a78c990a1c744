pub mod docker;
pub mod http;
pub mod process;
