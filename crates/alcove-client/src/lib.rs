pub mod backend;
pub mod conversation;
pub mod notifications;

pub use backend::ChatBackend;
pub use conversation::{ConversationView, ViewState};
pub use notifications::NotificationFeed;
