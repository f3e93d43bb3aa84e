//! 领域层

pub mod calculation;
pub mod engine;
pub mod entities;
pub mod enums;
pub mod messages;
pub mod repositories;
pub mod services;
pub mod validation;
pub mod value_objects;
