//! Host dashboard helpers: attendance counters and ballot reminders.

use crate::{
    dao::models::Rsvp,
    services::{guest_service, setup_service},
    state::AppState,
};

/// The show is close enough for reminders to be urgent.
const URGENT_WITHIN_DAYS: i64 = 5;

/// Attendance counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestStats {
    pub total: usize,
    pub attending: usize,
    pub declined: usize,
    pub ballots: usize,
    pub days_until_show: Option<i64>,
}

/// Attending guests that still owe a ballot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallotReminders {
    /// Names in guest order.
    pub guests: Vec<String>,
    pub days_until_show: Option<i64>,
    /// The show is 0 to 5 days away.
    pub urgent: bool,
    /// Warning shown when urgent and someone is still missing.
    pub alert: Option<String>,
    /// Copyable list, one `- name` line per guest.
    pub text: String,
}

/// Count guests by answer and ballot.
pub fn guest_stats(state: &AppState) -> GuestStats {
    let guests = guest_service::get_guests(state);
    GuestStats {
        total: guests.len(),
        attending: guests.iter().filter(|g| g.rsvp == Rsvp::Yes).count(),
        declined: guests.iter().filter(|g| g.rsvp == Rsvp::No).count(),
        ballots: guests.iter().filter(|g| g.ballot_submitted).count(),
        days_until_show: setup_service::days_until_show(state),
    }
}

fn plural(count: i64) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// Attending guests without a ballot and the reminder text for them.
pub fn ballot_reminders(state: &AppState) -> BallotReminders {
    let guests: Vec<String> = guest_service::get_guests(state)
        .into_iter()
        .filter(|g| g.rsvp == Rsvp::Yes && !g.ballot_submitted)
        .map(|g| g.name)
        .collect();
    let days_until_show = setup_service::days_until_show(state);
    let urgent = days_until_show.is_some_and(|days| (0..=URGENT_WITHIN_DAYS).contains(&days));

    let alert = match days_until_show {
        Some(days) if urgent && !guests.is_empty() => {
            let missing = i64::try_from(guests.len()).unwrap_or(i64::MAX);
            Some(format!(
                "Only {days} day{} until the show! {missing} guest{} still need{} to submit predictions.",
                plural(days),
                plural(missing),
                if missing == 1 { "s" } else { "" },
            ))
        }
        _ => None,
    };

    let text = std::iter::once("Ballot reminder needed:".to_string())
        .chain(guests.iter().map(|name| format!("- {name}")))
        .collect::<Vec<_>>()
        .join("\n");

    BallotReminders {
        guests,
        days_until_show,
        urgent,
        alert,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};

    use crate::{
        config::AppConfig,
        dao::{
            local_cache::LocalCache,
            models::{CategoryEntity, Picks},
        },
        services::guest_service::{MemberInput, PartySubmission},
        state::SharedState,
    };

    fn state() -> SharedState {
        let state = AppState::new(AppConfig::default(), LocalCache::in_memory(), None);
        setup_service::save_categories(&state, vec![CategoryEntity::new("Best Picture", ["A"])])
            .unwrap();
        let mut ballot = Picks::new();
        ballot.insert("Best Picture".into(), "A".into());
        guest_service::submit_party(
            &state,
            PartySubmission {
                rsvp: Rsvp::Yes,
                host: MemberInput {
                    name: "Bob".into(),
                    predictions: ballot,
                },
                companions: vec![MemberInput::named("Ann"), MemberInput::named("Cy")],
                ..PartySubmission::default()
            },
        )
        .unwrap();
        guest_service::submit_party(
            &state,
            PartySubmission {
                rsvp: Rsvp::No,
                host: MemberInput::named("Dan"),
                ..PartySubmission::default()
            },
        )
        .unwrap();
        state
    }

    fn show_in(state: &AppState, offset: Duration) {
        let at = (OffsetDateTime::now_utc() + offset).format(&Rfc3339).unwrap();
        setup_service::set_show_date(state, &at).unwrap();
    }

    #[test]
    fn stats_count_answers_and_ballots() {
        let state = state();
        let stats = guest_stats(&state);
        assert_eq!(
            stats,
            GuestStats {
                total: 4,
                attending: 3,
                declined: 1,
                ballots: 1,
                days_until_show: None,
            }
        );
    }

    #[test]
    fn reminders_list_attending_guests_without_ballot() {
        let state = state();
        let reminders = ballot_reminders(&state);
        assert_eq!(reminders.guests, vec!["Ann", "Cy"]);
        assert_eq!(reminders.text, "Ballot reminder needed:\n- Ann\n- Cy");
        assert!(!reminders.urgent);
        assert!(reminders.alert.is_none());
    }

    #[test]
    fn reminders_become_urgent_close_to_the_show() {
        let state = state();
        show_in(&state, Duration::hours(60));
        let reminders = ballot_reminders(&state);
        assert_eq!(reminders.days_until_show, Some(3));
        assert!(reminders.urgent);
        assert_eq!(
            reminders.alert.as_deref(),
            Some("Only 3 days until the show! 2 guests still need to submit predictions.")
        );

        show_in(&state, Duration::days(10));
        assert!(!ballot_reminders(&state).urgent);

        show_in(&state, -Duration::days(2));
        assert!(!ballot_reminders(&state).urgent);
    }
}
