//! HTTP 接口层

mod error;
mod extract;
pub mod messages;
mod requests;
mod routes;

pub use error::{ApiError, ApiResult};
pub use extract::{ActingUser, USER_ID_HEADER};
pub use messages::{MessageCatalogue, catalogue};
pub use requests::*;
pub use routes::{AppState, routes};
