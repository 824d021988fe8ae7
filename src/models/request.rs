use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Service categories a request can be filed under and a technician can offer.
pub const CATEGORIES: &[&str] = &[
    "Canalização",
    "Eletricidade",
    "Pintura",
    "Carpintaria",
    "Limpeza",
    "Jardinagem",
    "Climatização",
    "Serralharia",
    "Outros",
];

pub fn is_valid_category(category: &str) -> bool {
    CATEGORIES.contains(&category)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub status: RequestStatus,
    pub client_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl MaintenanceRequest {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.client_id == user_id
    }

    pub fn is_assigned_to(&self, user_id: Uuid) -> bool {
        self.technician_id == Some(user_id)
    }

    pub fn is_open(&self) -> bool {
        self.status == RequestStatus::Pending && self.technician_id.is_none()
    }
}

/// Row of the public feed: a completed request with its feedback.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct CompletedRequestSummary {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub client_name: String,
    pub technician_name: Option<String>,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
