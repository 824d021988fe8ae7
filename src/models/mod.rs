pub mod feedback;
pub mod message;
pub mod password_reset_token;
pub mod request;
pub mod scheduled_email;
pub mod user;

pub use feedback::Feedback;
pub use message::Message;
pub use password_reset_token::PasswordResetToken;
pub use request::{CompletedRequestSummary, MaintenanceRequest, RequestStatus};
pub use scheduled_email::ScheduledEmail;
pub use user::{Role, User};
