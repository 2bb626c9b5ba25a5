pub mod budget;
pub mod config;
pub mod error;
pub mod formatter;
pub mod git;
pub mod io;
pub mod metrics;
pub mod notify;
pub mod paths;
pub mod presence;
pub mod process;
pub mod reminder;
pub mod statusline;
pub mod tokens;
pub mod types;

pub use error::{HookError, Result};
