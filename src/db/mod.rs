pub mod feedback;
pub mod messages;
pub mod password_reset_tokens;
pub mod requests;
pub mod scheduled_emails;
pub mod users;
