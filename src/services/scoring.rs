//! Scores, leaderboard and announcement progress, derived on every read from the
//! current guests, categories and winners.

use std::cmp::Reverse;

use crate::{
    dao::models::{GuestEntity, Winners},
    services::{guest_service, setup_service},
    state::AppState,
};

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub guest: GuestEntity,
    pub score: u32,
}

/// How far the ceremony has progressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowProgress {
    /// Votable categories with an announced winner.
    pub announced: usize,
    /// Categories that have at least one nominee.
    pub total: usize,
    /// `announced / total` as a rounded percentage.
    pub percent: u32,
    /// Every votable category has a winner.
    pub complete: bool,
    /// Leaderboard leader once the show is complete.
    pub winner: Option<LeaderboardEntry>,
}

/// Number of picks matching the announced winner of their category.
pub fn score_against(guest: &GuestEntity, winners: &Winners) -> u32 {
    let hits = guest
        .predictions
        .iter()
        .filter(|(category, pick)| winners.get(*category) == Some(*pick))
        .count();
    u32::try_from(hits).unwrap_or(u32::MAX)
}

/// Score of `guest` against the winners currently stored.
pub fn score_guest(state: &AppState, guest: &GuestEntity) -> u32 {
    score_against(guest, &setup_service::get_winners(state))
}

/// Guests with a ballot, best score first, ties broken by name.
pub fn leaderboard(state: &AppState) -> Vec<LeaderboardEntry> {
    let winners = setup_service::get_winners(state);
    rank(guest_service::get_guests(state), &winners)
}

fn rank(guests: Vec<GuestEntity>, winners: &Winners) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = guests
        .into_iter()
        .filter(|guest| guest.ballot_submitted)
        .map(|guest| LeaderboardEntry {
            score: score_against(&guest, winners),
            guest,
        })
        .collect();
    entries.sort_by(|left, right| {
        Reverse(left.score)
            .cmp(&Reverse(right.score))
            .then_with(|| left.guest.name.cmp(&right.guest.name))
    });
    entries
}

/// Announcement progress and, once every votable category is decided, the overall winner.
pub fn progress(state: &AppState) -> ShowProgress {
    let categories = setup_service::get_categories(state);
    let winners = setup_service::get_winners(state);

    let votable: Vec<_> = categories.iter().filter(|c| c.has_nominees()).collect();
    let total = votable.len();
    let announced = votable
        .iter()
        .filter(|category| winners.contains_key(&category.name))
        .count();
    let percent = if total == 0 {
        0
    } else {
        u32::try_from((announced * 100 + total / 2) / total).unwrap_or(100)
    };
    let complete = total > 0 && announced == total;
    let winner = if complete {
        rank(guest_service::get_guests(state), &winners)
            .into_iter()
            .next()
    } else {
        None
    };

    ShowProgress {
        announced,
        total,
        percent,
        complete,
        winner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            local_cache::LocalCache,
            models::{CategoryEntity, GuestDraft, Picks, Rsvp},
        },
        state::SharedState,
    };

    fn state() -> SharedState {
        let state = AppState::new(AppConfig::default(), LocalCache::in_memory(), None);
        setup_service::save_categories(&state, vec![CategoryEntity::new("Best Picture", ["A", "B"])])
            .unwrap();
        state
    }

    fn voter(state: &AppState, name: &str, pick: Option<&str>) -> GuestEntity {
        let mut predictions = Picks::new();
        if let Some(pick) = pick {
            predictions.insert("Best Picture".into(), pick.into());
        }
        guest_service::save_guest(
            state,
            GuestDraft {
                name: name.into(),
                rsvp: Rsvp::Yes,
                party_size: 1,
                predictions,
                ..GuestDraft::default()
            },
        )
        .unwrap()
    }

    fn names(board: &[LeaderboardEntry]) -> Vec<(&str, u32)> {
        board
            .iter()
            .map(|entry| (entry.guest.name.as_str(), entry.score))
            .collect()
    }

    #[test]
    fn single_correct_pick_scores_one() {
        let state = state();
        let alice = voter(&state, "Alice", Some("A"));
        setup_service::set_winner(&state, "Best Picture", "A").unwrap();

        assert_eq!(score_guest(&state, &alice), 1);
        assert_eq!(names(&leaderboard(&state)), vec![("Alice", 1)]);
    }

    #[test]
    fn leaderboard_orders_by_score_then_name() {
        let state = state();
        voter(&state, "Ann", Some("B"));
        voter(&state, "Bob", Some("A"));
        voter(&state, "Abe", Some("B"));
        voter(&state, "NoBallot", None);
        setup_service::set_winner(&state, "Best Picture", "A").unwrap();

        assert_eq!(
            names(&leaderboard(&state)),
            vec![("Bob", 1), ("Abe", 0), ("Ann", 0)]
        );
    }

    #[test]
    fn score_follows_current_winners() {
        let state = state();
        let bob = voter(&state, "Bob", Some("A"));
        assert_eq!(score_guest(&state, &bob), 0);

        setup_service::set_winner(&state, "Best Picture", "A").unwrap();
        assert_eq!(score_guest(&state, &bob), 1);

        setup_service::set_winner(&state, "Best Picture", "B").unwrap();
        assert_eq!(score_guest(&state, &bob), 0);

        setup_service::clear_winner(&state, "Best Picture");
        assert_eq!(score_guest(&state, &bob), 0);
    }

    #[test]
    fn progress_reports_the_final_winner() {
        let state = state();
        setup_service::save_categories(
            &state,
            vec![
                CategoryEntity::new("Best Picture", ["A", "B"]),
                CategoryEntity::new("Best Sound", ["X"]),
                CategoryEntity::new("Unused", Vec::<String>::new()),
            ],
        )
        .unwrap();
        voter(&state, "Bob", Some("A"));

        setup_service::set_winner(&state, "Best Picture", "A").unwrap();
        let partial = progress(&state);
        assert_eq!((partial.announced, partial.total, partial.percent), (1, 2, 50));
        assert!(!partial.complete);
        assert!(partial.winner.is_none());

        setup_service::set_winner(&state, "Best Sound", "X").unwrap();
        let done = progress(&state);
        assert!(done.complete);
        assert_eq!(done.percent, 100);
        assert_eq!(done.winner.map(|entry| entry.guest.name), Some("Bob".to_string()));
    }

    #[test]
    fn progress_without_categories_is_never_complete() {
        let state = AppState::new(AppConfig::default(), LocalCache::in_memory(), None);
        let progress = progress(&state);
        assert_eq!((progress.announced, progress.total, progress.percent), (0, 0, 0));
        assert!(!progress.complete);
    }
}
