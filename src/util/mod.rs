//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod env;
pub mod fs;
pub mod hash;
pub mod process;
pub mod shell;

pub use config::Profile;
pub use diagnostic::Diagnostic;
pub use env::ScopedEnv;
pub use shell::Shell;
