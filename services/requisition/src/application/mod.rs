//! 应用层

pub mod commands;
pub mod dto;
pub mod handler;
pub mod order;
pub mod queries;

pub use commands::*;
pub use handler::ServiceHandler;
pub use queries::*;
