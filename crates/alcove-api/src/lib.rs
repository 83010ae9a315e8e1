pub mod auth;
pub mod conversations;
pub mod error;
pub mod http;
pub mod messages;
pub mod reactions;
pub mod session;
pub mod users;

pub use error::ApiError;
pub use http::ApiClient;
pub use session::Session;
