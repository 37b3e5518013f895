use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::LogStatus;

/// One adherence event for a medicine on a calendar date.
/// The backend keeps at most one log per `(medicine_id, date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceLog {
    pub id: Uuid,
    pub medicine_id: String,
    pub date: NaiveDate,
    pub status: LogStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
