//! 命令

mod rejection_reason_commands;
mod requisition_commands;
mod template_commands;

pub use rejection_reason_commands::*;
pub use requisition_commands::*;
pub use template_commands::*;
