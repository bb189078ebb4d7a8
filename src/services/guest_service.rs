//! Guest and party records: reads, single-guest writes and whole-party submissions.
//!
//! Every mutation runs its read-modify-write under the cache gate, then publishes a
//! `guest-updated` event and forwards the change to the remote store once the gate
//! is released.

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        local_cache::Collection,
        models::{GuestDraft, GuestEntity, Picks, Rsvp},
    },
    error::{ServiceError, ValidationError},
    state::{AppState, SyncKind, SyncPayload, sync::now_rfc3339},
};

/// One person of a party submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberInput {
    /// Name as typed; blank companions count as unnamed.
    pub name: String,
    /// Picks for the categories this person voted on.
    pub predictions: Picks,
}

impl MemberInput {
    /// Member without a ballot.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            predictions: Picks::new(),
        }
    }
}

/// Full RSVP form: the host, optional companions and the party being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartySubmission {
    /// Edit key returned by [`lookup_party`]; `None` for a new submission.
    pub editing_party_id: Option<String>,
    pub rsvp: Rsvp,
    /// Dietary notes, stored on the host only.
    pub dietary: String,
    pub host: MemberInput,
    /// Additional party members, ignored when the answer is "no".
    pub companions: Vec<MemberInput>,
}

/// Existing submission found by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyLookup {
    /// Identifier to pass back as [`PartySubmission::editing_party_id`].
    pub edit_key: String,
    /// Members of the party, host first.
    pub members: Vec<GuestEntity>,
}

/// Case- and whitespace-insensitive name identity.
pub fn same_name(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn load(state: &AppState) -> Vec<GuestEntity> {
    state
        .cache()
        .read::<Vec<GuestEntity>>(Collection::Guests)
        .unwrap_or_default()
}

/// All guests in insertion order.
pub fn get_guests(state: &AppState) -> Vec<GuestEntity> {
    load(state)
}

/// Guest with the given id.
pub fn get_guest(state: &AppState, id: &str) -> Result<GuestEntity, ServiceError> {
    load(state)
        .into_iter()
        .find(|guest| guest.id == id)
        .ok_or_else(|| ServiceError::NotFound(format!("guest `{id}`")))
}

/// First guest whose name matches `name` ignoring case and surrounding whitespace.
pub fn find_guest_by_name(state: &AppState, name: &str) -> Option<GuestEntity> {
    load(state)
        .into_iter()
        .find(|guest| same_name(&guest.name, name))
}

/// Guests whose `partyId` equals `party_id`.
pub fn get_guests_by_party_id(state: &AppState, party_id: &str) -> Vec<GuestEntity> {
    load(state)
        .into_iter()
        .filter(|guest| guest.party_id.as_deref() == Some(party_id))
        .collect()
}

/// Create or replace one guest.
///
/// The id is generated on first save. `ballotSubmitted` follows the predictions and
/// `submittedAt` is stamped with the current time.
pub fn save_guest(state: &AppState, draft: GuestDraft) -> Result<GuestEntity, ServiceError> {
    let name = draft.name.trim().to_string();
    if name.is_empty() {
        return Err(ValidationError::MissingField("name").into());
    }

    let guest = {
        let _gate = state.cache().lock();
        let mut guests = load(state);

        let id = draft.id.unwrap_or_else(new_id);
        if guests
            .iter()
            .any(|other| other.id != id && same_name(&other.name, &name))
        {
            return Err(ValidationError::NameTaken { name }.into());
        }

        let guest = GuestEntity {
            id,
            name,
            rsvp: draft.rsvp,
            dietary: draft.dietary,
            party_id: draft.party_id,
            is_party_host: draft.is_party_host,
            party_size: draft.party_size.max(1),
            ballot_submitted: !draft.predictions.is_empty(),
            predictions: draft.predictions,
            submitted_at: Some(now_rfc3339()),
        };
        match guests.iter_mut().find(|existing| existing.id == guest.id) {
            Some(existing) => *existing = guest.clone(),
            None => guests.push(guest.clone()),
        }
        state.cache().write(Collection::Guests, &guests);
        guest
    };

    debug!(id = %guest.id, "guest saved");
    state
        .events()
        .publish(SyncKind::GuestUpdated, SyncPayload::guest(&guest.id));
    state.sync().push_guest(&guest);
    Ok(guest)
}

/// Remove exactly the guest with `id`. Returns whether it existed.
pub fn delete_guest(state: &AppState, id: &str) -> bool {
    let removed = {
        let _gate = state.cache().lock();
        let mut guests = load(state);
        let before = guests.len();
        guests.retain(|guest| guest.id != id);
        let removed = guests.len() != before;
        if removed {
            state.cache().write(Collection::Guests, &guests);
        }
        removed
    };
    if !removed {
        return false;
    }

    state
        .events()
        .publish(SyncKind::GuestUpdated, SyncPayload::guest(id));
    state.sync().push_guest_deletion(id);
    true
}

/// Remove every guest whose `partyId` or own `id` equals `party_key`.
///
/// Returns the removed guests.
pub fn delete_guests_by_party_id(state: &AppState, party_key: &str) -> Vec<GuestEntity> {
    let removed = {
        let _gate = state.cache().lock();
        let (removed, remaining): (Vec<_>, Vec<_>) = load(state)
            .into_iter()
            .partition(|guest| guest.belongs_to(party_key));
        state.cache().write(Collection::Guests, &remaining);
        removed
    };

    state
        .events()
        .publish(SyncKind::GuestUpdated, SyncPayload::party(party_key));
    for guest in &removed {
        state.sync().push_guest_deletion(&guest.id);
    }
    removed
}

/// Find the submission a guest belongs to, for editing.
pub fn lookup_party(state: &AppState, name: &str) -> Option<PartyLookup> {
    let guest = find_guest_by_name(state, name)?;
    match guest.party_id.clone() {
        Some(party_id) => {
            let (hosts, others): (Vec<_>, Vec<_>) = get_guests_by_party_id(state, &party_id)
                .into_iter()
                .partition(|member| member.is_party_host);
            let mut members = hosts;
            members.extend(others);
            Some(PartyLookup {
                edit_key: party_id,
                members,
            })
        }
        None => Some(PartyLookup {
            edit_key: guest.id.clone(),
            members: vec![guest],
        }),
    }
}

/// Save a whole RSVP form.
///
/// A "no" stores the host alone without a party or ballot. A "yes" replaces the
/// edited party (if any) with one fresh guest per member sharing a party id; the
/// host comes first. Nothing is written when validation fails.
pub fn submit_party(
    state: &AppState,
    submission: PartySubmission,
) -> Result<Vec<GuestEntity>, ServiceError> {
    let host_name = submission.host.name.trim().to_string();
    if host_name.is_empty() {
        return Err(ValidationError::MissingField("name").into());
    }
    if submission.rsvp == Rsvp::Unset {
        return Err(ValidationError::MissingField("rsvp").into());
    }

    let attending = submission.rsvp == Rsvp::Yes;
    let mut members = vec![MemberInput {
        name: host_name,
        predictions: if attending {
            submission.host.predictions
        } else {
            Picks::new()
        },
    }];
    if attending {
        for (index, companion) in submission.companions.into_iter().enumerate() {
            let slot = index + 2;
            let name = companion.name.trim().to_string();
            if name.is_empty() || name == format!("Guest {slot}") {
                return Err(ValidationError::UnnamedGuest { slot }.into());
            }
            members.push(MemberInput {
                name,
                predictions: companion.predictions,
            });
        }
    }

    for (index, member) in members.iter().enumerate() {
        if members[..index]
            .iter()
            .any(|earlier| earlier.name.to_lowercase() == member.name.to_lowercase())
        {
            return Err(ValidationError::DuplicateInParty {
                name: member.name.clone(),
            }
            .into());
        }
    }

    let editing = submission.editing_party_id.filter(|key| !key.is_empty());
    let now = now_rfc3339();

    let (removed, created, party_key) = {
        let _gate = state.cache().lock();
        let guests = load(state);

        for member in &members {
            let collision = guests.iter().find(|existing| {
                same_name(&existing.name, &member.name)
                    && editing
                        .as_deref()
                        .is_none_or(|key| !existing.belongs_to(key))
            });
            if collision.is_some() {
                return Err(ValidationError::NameTaken {
                    name: member.name.clone(),
                }
                .into());
            }
        }

        let (removed, mut remaining): (Vec<_>, Vec<_>) = match editing.as_deref() {
            Some(key) => guests.into_iter().partition(|guest| guest.belongs_to(key)),
            None => (Vec::new(), guests),
        };

        let created: Vec<GuestEntity> = if attending {
            let party_id = editing.clone().unwrap_or_else(new_id);
            let party_size = u32::try_from(members.len()).unwrap_or(u32::MAX);
            members
                .into_iter()
                .enumerate()
                .map(|(index, member)| GuestEntity {
                    id: new_id(),
                    name: member.name,
                    rsvp: Rsvp::Yes,
                    dietary: if index == 0 {
                        submission.dietary.trim().to_string()
                    } else {
                        String::new()
                    },
                    party_id: Some(party_id.clone()),
                    is_party_host: index == 0,
                    party_size,
                    ballot_submitted: !member.predictions.is_empty(),
                    predictions: member.predictions,
                    submitted_at: Some(now.clone()),
                })
                .collect()
        } else {
            members
                .into_iter()
                .map(|member| GuestEntity {
                    id: new_id(),
                    name: member.name,
                    rsvp: submission.rsvp,
                    dietary: submission.dietary.trim().to_string(),
                    party_id: None,
                    is_party_host: false,
                    party_size: 1,
                    predictions: Picks::new(),
                    ballot_submitted: false,
                    submitted_at: Some(now.clone()),
                })
                .collect()
        };

        remaining.extend(created.iter().cloned());
        state.cache().write(Collection::Guests, &remaining);

        let party_key = created
            .first()
            .map(|host| host.party_key().to_string())
            .unwrap_or_default();
        (removed, created, party_key)
    };

    info!(
        party = %party_key,
        members = created.len(),
        replaced = removed.len(),
        "party submitted"
    );
    state
        .events()
        .publish(SyncKind::GuestUpdated, SyncPayload::party(&party_key));
    for guest in &removed {
        state.sync().push_guest_deletion(&guest.id);
    }
    for guest in &created {
        state.sync().push_guest(guest);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, time::Duration};

    use crate::{
        config::AppConfig,
        dao::{local_cache::LocalCache, remote_store::memory::InMemoryRemoteStore},
        state::SharedState,
    };

    fn state() -> SharedState {
        AppState::new(AppConfig::default(), LocalCache::in_memory(), None)
    }

    fn picks(entries: &[(&str, &str)]) -> Picks {
        entries
            .iter()
            .map(|(category, nominee)| (category.to_string(), nominee.to_string()))
            .collect()
    }

    fn draft(name: &str) -> GuestDraft {
        GuestDraft {
            name: name.into(),
            rsvp: Rsvp::Yes,
            party_size: 1,
            ..GuestDraft::default()
        }
    }

    fn yes(host: &str, companions: &[&str]) -> PartySubmission {
        PartySubmission {
            rsvp: Rsvp::Yes,
            host: MemberInput::named(host),
            companions: companions.iter().map(|name| MemberInput::named(*name)).collect(),
            ..PartySubmission::default()
        }
    }

    #[test]
    fn get_guest_reports_unknown_ids() {
        let state = state();
        let saved = save_guest(&state, draft("Ann")).unwrap();
        assert_eq!(get_guest(&state, &saved.id).unwrap().name, "Ann");
        assert!(matches!(
            get_guest(&state, "missing"),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn save_guest_assigns_id_and_stamps_ballot() {
        let state = state();
        let mut input = draft("  Alice ");
        input.predictions = picks(&[("Best Picture", "Sinners")]);

        let saved = save_guest(&state, input).unwrap();

        assert!(!saved.id.is_empty());
        assert_eq!(saved.name, "Alice");
        assert!(saved.ballot_submitted);
        assert!(saved.submitted_at.is_some());
        assert_eq!(get_guests(&state), vec![saved]);
    }

    #[test]
    fn save_guest_replaces_by_id() {
        let state = state();
        let saved = save_guest(&state, draft("Alice")).unwrap();

        let mut update = GuestDraft::from(saved.clone());
        update.dietary = "vegan".into();
        let updated = save_guest(&state, update).unwrap();

        assert_eq!(updated.id, saved.id);
        assert_eq!(get_guests(&state).len(), 1);
        assert_eq!(get_guests(&state)[0].dietary, "vegan");
    }

    #[test]
    fn names_are_unique_ignoring_case_and_whitespace() {
        let state = state();
        save_guest(&state, draft("Alice")).unwrap();

        let err = save_guest(&state, draft(" ALICE ")).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::NameTaken { .. })
        ));
        assert_eq!(
            find_guest_by_name(&state, "  alice").map(|g| g.name),
            Some("Alice".to_string())
        );
    }

    #[test]
    fn delete_guest_removes_exactly_one() {
        let state = state();
        let alice = save_guest(&state, draft("Alice")).unwrap();
        save_guest(&state, draft("Bob")).unwrap();

        assert!(delete_guest(&state, &alice.id));
        assert!(!delete_guest(&state, &alice.id));
        let names: Vec<_> = get_guests(&state).into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Bob"]);
    }

    #[test]
    fn party_of_three_has_one_host_and_shared_size() {
        let state = state();
        let created = submit_party(&state, yes("Bob", &["Ann", "Cy"])).unwrap();

        assert_eq!(created.len(), 3);
        let party_id = created[0].party_id.clone().unwrap();
        assert!(created.iter().all(|g| g.party_id.as_deref() == Some(party_id.as_str())));
        assert!(created.iter().all(|g| g.party_size == 3));
        assert_eq!(created.iter().filter(|g| g.is_party_host).count(), 1);
        assert!(created[0].is_party_host);
        assert_eq!(get_guests_by_party_id(&state, &party_id).len(), 3);
    }

    #[test]
    fn resubmitting_a_party_leaves_no_orphans() {
        let state = state();
        let first = submit_party(&state, yes("Bob", &["Ann", "Cy"])).unwrap();
        let party_id = first[0].party_id.clone().unwrap();

        let mut edit = yes("Bob", &["Ann"]);
        edit.editing_party_id = Some(party_id.clone());
        let second = submit_party(&state, edit).unwrap();

        let guests = get_guests(&state);
        assert_eq!(guests.len(), 2);
        assert!(guests.iter().all(|g| g.party_size == 2));
        assert_eq!(second[0].party_id.as_deref(), Some(party_id.as_str()));
        assert!(find_guest_by_name(&state, "Cy").is_none());
    }

    #[test]
    fn placeholder_companion_is_rejected_without_writing() {
        let state = state();
        let err = submit_party(&state, yes("Cara", &["Guest 2"])).unwrap_err();
        assert_eq!(err.to_string(), "please enter a name for Guest 2");
        assert!(get_guests(&state).is_empty());

        let err = submit_party(&state, yes("Cara", &["Dee", "  "])).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::UnnamedGuest { slot: 3 })
        ));
    }

    #[test]
    fn duplicate_names_within_party_are_rejected() {
        let state = state();
        let err = submit_party(&state, yes("Bob", &["bob"])).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::DuplicateInParty { .. })
        ));
    }

    #[test]
    fn outside_collision_is_rejected_but_own_party_is_not() {
        let state = state();
        submit_party(&state, yes("Alice", &[])).unwrap();
        let bob = submit_party(&state, yes("Bob", &["Ann"])).unwrap();

        let err = submit_party(&state, yes("Dan", &["alice"])).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::NameTaken { .. })
        ));

        let mut edit = yes("Bob", &["Ann"]);
        edit.editing_party_id = bob[0].party_id.clone();
        assert!(submit_party(&state, edit).is_ok());
        assert_eq!(get_guests(&state).len(), 3);
    }

    #[test]
    fn declining_stores_a_lone_guest_without_ballot() {
        let state = state();
        let mut submission = yes("Dan", &["Eve"]);
        submission.rsvp = Rsvp::No;
        submission.host.predictions = picks(&[("Best Picture", "F1")]);

        let created = submit_party(&state, submission).unwrap();

        assert_eq!(created.len(), 1);
        let dan = &created[0];
        assert_eq!(dan.rsvp, Rsvp::No);
        assert!(dan.party_id.is_none());
        assert_eq!(dan.party_size, 1);
        assert!(dan.predictions.is_empty());
        assert!(!dan.ballot_submitted);

        let lookup = lookup_party(&state, "dan").unwrap();
        assert_eq!(lookup.edit_key, dan.id);
        assert_eq!(delete_guests_by_party_id(&state, &dan.id).len(), 1);
        assert!(get_guests(&state).is_empty());
    }

    #[test]
    fn lookup_returns_host_first() {
        let state = state();
        let created = submit_party(&state, yes("Bob", &["Ann"])).unwrap();

        let lookup = lookup_party(&state, "ann").unwrap();
        assert_eq!(lookup.edit_key, created[0].party_id.clone().unwrap());
        assert_eq!(lookup.members[0].name, "Bob");
        assert_eq!(lookup.members.len(), 2);
        assert!(lookup_party(&state, "nobody").is_none());
    }

    #[test]
    fn missing_rsvp_is_rejected() {
        let state = state();
        let mut submission = yes("Bob", &[]);
        submission.rsvp = Rsvp::Unset;
        assert!(matches!(
            submit_party(&state, submission),
            Err(ServiceError::Validation(ValidationError::MissingField("rsvp")))
        ));
    }

    #[test]
    fn mutations_publish_guest_events() {
        let state = state();
        let mut receiver = state.events().receiver();
        let saved = save_guest(&state, draft("Alice")).unwrap();
        delete_guest(&state, &saved.id);

        let first = receiver.try_recv().unwrap();
        assert_eq!(first.kind, SyncKind::GuestUpdated);
        assert_eq!(first.payload.id.as_deref(), Some(saved.id.as_str()));
        assert!(receiver.try_recv().is_ok());
    }

    #[tokio::test]
    async fn deleting_an_unknown_guest_is_silent() {
        let state = state();
        let remote = InMemoryRemoteStore::new();
        remote.set_offline(true);
        state.sync().attach(Arc::new(remote));
        save_guest(&state, draft("Alice")).unwrap();
        let mut receiver = state.events().receiver();

        assert!(!delete_guest(&state, "missing"));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(receiver.try_recv().is_err());
        assert!(
            state
                .sync()
                .recent_failures()
                .iter()
                .all(|failure| !failure.operation.starts_with("delete guest"))
        );
        assert_eq!(get_guests(&state).len(), 1);
    }
}
