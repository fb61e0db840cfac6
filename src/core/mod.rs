pub mod action;
pub mod command;
pub mod context;
pub mod module;

pub use action::{Action, NotifyLevel, Submission};
pub use command::{parse_command, Command};
pub use context::Context;
pub use module::Module;
