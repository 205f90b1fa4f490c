//! Git access through the system `git` executable.

pub mod gateway;
pub mod process;

pub use gateway::{GitGateway, GitOperations, resolve_workdir};
pub use process::{CommandResult, DEFAULT_TIMEOUT_SECS, ProcessRunner};
