//! Orchestration behind each edge function

pub mod account;
pub mod notification;
pub mod password;

pub use account::{create_account, CreatedAccount, NewAccount};
pub use notification::{notify_status_change, NotificationOutcome};
pub use password::generate_password;
