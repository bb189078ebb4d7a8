use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::{GuestDraft, GuestEntity, Picks, Rsvp},
    dto::validation::validate_not_blank,
    services::guest_service::{MemberInput, PartyLookup, PartySubmission},
};

/// Guest as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuestView {
    pub id: String,
    pub name: String,
    /// `yes`, `no` or `unset`.
    #[schema(value_type = String)]
    pub rsvp: Rsvp,
    pub dietary: String,
    pub party_id: Option<String>,
    pub is_party_host: bool,
    pub party_size: u32,
    /// Category name to picked nominee.
    #[schema(value_type = Object)]
    pub predictions: Picks,
    pub ballot_submitted: bool,
    pub submitted_at: Option<String>,
}

impl From<GuestEntity> for GuestView {
    fn from(guest: GuestEntity) -> Self {
        Self {
            id: guest.id,
            name: guest.name,
            rsvp: guest.rsvp,
            dietary: guest.dietary,
            party_id: guest.party_id,
            is_party_host: guest.is_party_host,
            party_size: guest.party_size,
            predictions: guest.predictions,
            ballot_submitted: guest.ballot_submitted,
            submitted_at: guest.submitted_at,
        }
    }
}

/// Create or replace a single guest.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveGuestRequest {
    /// Omit to create a new guest.
    #[serde(default)]
    pub id: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    #[serde(default)]
    #[schema(value_type = String)]
    pub rsvp: Rsvp,
    #[serde(default)]
    pub dietary: String,
    #[serde(default)]
    pub party_id: Option<String>,
    #[serde(default)]
    pub is_party_host: bool,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub party_size: Option<u32>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub predictions: Picks,
}

impl From<SaveGuestRequest> for GuestDraft {
    fn from(request: SaveGuestRequest) -> Self {
        Self {
            id: request.id,
            name: request.name,
            rsvp: request.rsvp,
            dietary: request.dietary,
            party_id: request.party_id,
            is_party_host: request.is_party_host,
            party_size: request.party_size.unwrap_or(1),
            predictions: request.predictions,
        }
    }
}

/// One person in a party submission.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MemberRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub predictions: Picks,
}

impl From<MemberRequest> for MemberInput {
    fn from(member: MemberRequest) -> Self {
        Self {
            name: member.name,
            predictions: member.predictions,
        }
    }
}

/// RSVP form for a whole party.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartySubmissionRequest {
    /// Edit key returned by the lookup; omit for a new submission.
    #[serde(default)]
    pub editing_party_id: Option<String>,
    #[schema(value_type = String)]
    pub rsvp: Rsvp,
    #[serde(default)]
    pub dietary: String,
    pub host: MemberRequest,
    #[serde(default)]
    pub companions: Vec<MemberRequest>,
}

impl From<PartySubmissionRequest> for PartySubmission {
    fn from(request: PartySubmissionRequest) -> Self {
        Self {
            editing_party_id: request.editing_party_id,
            rsvp: request.rsvp,
            dietary: request.dietary,
            host: request.host.into(),
            companions: request.companions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Query string carrying a guest name.
#[derive(Debug, Deserialize, IntoParams, Validate)]
pub struct NameQuery {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
}

/// Submission found by name, ready for editing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartyLookupResponse {
    pub edit_key: String,
    /// Host first.
    pub members: Vec<GuestView>,
}

impl From<PartyLookup> for PartyLookupResponse {
    fn from(lookup: PartyLookup) -> Self {
        Self {
            edit_key: lookup.edit_key,
            members: lookup.members.into_iter().map(Into::into).collect(),
        }
    }
}

/// Score of one guest against the current winners.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreResponse {
    pub id: String,
    pub score: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_fails_validation() {
        let request: SaveGuestRequest = serde_json::from_str(r#"{"name":"  "}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn party_request_maps_to_submission() {
        let request: PartySubmissionRequest = serde_json::from_str(
            r#"{"rsvp":"yes","host":{"name":"Bob","predictions":{"Best Picture":"A"}},
                "companions":[{"name":"Ann"}]}"#,
        )
        .unwrap();
        let submission = PartySubmission::from(request);
        assert_eq!(submission.rsvp, Rsvp::Yes);
        assert_eq!(submission.host.predictions.len(), 1);
        assert_eq!(submission.companions[0].name, "Ann");
        assert!(submission.editing_party_id.is_none());
    }
}
