/// Host dashboard counters and reminders.
pub mod admin_service;
/// Built-in category list.
pub mod defaults;
/// OpenAPI documentation generation.
pub mod documentation;
/// CSV export.
pub mod export;
/// Guest and party records.
pub mod guest_service;
/// Health check service.
pub mod health_service;
/// Scores, leaderboard and progress.
pub mod scoring;
/// Categories, winners and show date.
pub mod setup_service;
/// Server-Sent Events forwarding of sync events.
pub mod sse_service;
/// Remote store connection supervisor with backoff.
pub mod storage_supervisor;
