use serde::Serialize;
use utoipa::ToSchema;

use crate::services::scoring::{LeaderboardEntry, ShowProgress};

/// One leaderboard row.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryView {
    pub id: String,
    pub name: String,
    pub party_id: Option<String>,
    pub score: u32,
}

impl From<LeaderboardEntry> for LeaderboardEntryView {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            id: entry.guest.id,
            name: entry.guest.name,
            party_id: entry.guest.party_id,
            score: entry.score,
        }
    }
}

/// Announcement progress.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressResponse {
    pub announced: usize,
    pub total: usize,
    pub percent: u32,
    pub complete: bool,
    /// Overall winner, present once every category is announced.
    pub winner: Option<LeaderboardEntryView>,
}

impl From<ShowProgress> for ProgressResponse {
    fn from(progress: ShowProgress) -> Self {
        Self {
            announced: progress.announced,
            total: progress.total,
            percent: progress.percent,
            complete: progress.complete,
            winner: progress.winner.map(Into::into),
        }
    }
}
