use serde::Serialize;
use utoipa::ToSchema;

use crate::services::admin_service::{BallotReminders, GuestStats};

/// Attendance counters for the host dashboard.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuestStatsResponse {
    pub total: usize,
    pub attending: usize,
    pub declined: usize,
    pub ballots: usize,
    pub days_until_show: Option<i64>,
}

impl From<GuestStats> for GuestStatsResponse {
    fn from(stats: GuestStats) -> Self {
        Self {
            total: stats.total,
            attending: stats.attending,
            declined: stats.declined,
            ballots: stats.ballots,
            days_until_show: stats.days_until_show,
        }
    }
}

/// Guests still owing a ballot.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BallotRemindersResponse {
    pub guests: Vec<String>,
    pub days_until_show: Option<i64>,
    pub urgent: bool,
    pub alert: Option<String>,
    /// Copyable reminder list.
    pub text: String,
}

impl From<BallotReminders> for BallotRemindersResponse {
    fn from(reminders: BallotReminders) -> Self {
        Self {
            guests: reminders.guests,
            days_until_show: reminders.days_until_show,
            urgent: reminders.urgent,
            alert: reminders.alert,
            text: reminders.text,
        }
    }
}
