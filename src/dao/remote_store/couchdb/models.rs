use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dao::{
    models::{CategoryEntity, ConfigPatch, GuestEntity, Picks, Rsvp, Winners},
    remote_store::couchdb::error::CouchDaoError,
};

pub const GUEST_PREFIX: &str = "guest::";
pub const CONFIG_DOC_ID: &str = "config::main";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Body of a `_changes` long-poll answer. Sequence tokens are opaque values
/// (numbers on CouchDB 1.x, strings afterwards).
#[derive(Debug, Deserialize)]
pub struct ChangesResponse {
    #[serde(default)]
    pub results: Vec<ChangeRow>,
    pub last_seq: Value,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRow {
    pub id: String,
}

/// Minimal projection used to fetch the current revision of any document.
#[derive(Debug, Deserialize)]
pub struct RevisionOnly {
    #[serde(rename = "_rev")]
    pub rev: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchGuestDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub guest: GuestBody,
}

/// Guest fields stored in the document; the identifier lives in `_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestBody {
    pub name: String,
    #[serde(default)]
    pub rsvp: Rsvp,
    #[serde(default)]
    pub dietary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
    #[serde(default)]
    pub is_party_host: bool,
    #[serde(default = "one")]
    pub party_size: u32,
    #[serde(default)]
    pub predictions: Picks,
    #[serde(default)]
    pub ballot_submitted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
}

fn one() -> u32 {
    1
}

impl From<(GuestEntity, Option<String>)> for CouchGuestDocument {
    fn from((guest, rev): (GuestEntity, Option<String>)) -> Self {
        Self {
            id: guest_doc_id(&guest.id),
            rev,
            guest: GuestBody {
                name: guest.name,
                rsvp: guest.rsvp,
                dietary: guest.dietary,
                party_id: guest.party_id,
                is_party_host: guest.is_party_host,
                party_size: guest.party_size,
                predictions: guest.predictions,
                ballot_submitted: guest.ballot_submitted,
                submitted_at: guest.submitted_at,
            },
        }
    }
}

impl TryFrom<CouchGuestDocument> for GuestEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchGuestDocument) -> Result<Self, Self::Error> {
        let id = extract_guest_id(&doc.id)?;
        let body = doc.guest;
        Ok(GuestEntity {
            id,
            name: body.name,
            rsvp: body.rsvp,
            dietary: body.dietary,
            party_id: body.party_id,
            is_party_host: body.is_party_host,
            party_size: body.party_size,
            predictions: body.predictions,
            ballot_submitted: body.ballot_submitted,
            submitted_at: body.submitted_at,
        })
    }
}

/// The single shared configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouchConfigDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoryEntity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winners: Option<Winners>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_date: Option<String>,
}

impl CouchConfigDocument {
    /// Fresh document for a configuration record that does not exist yet.
    pub fn empty() -> Self {
        Self {
            id: CONFIG_DOC_ID.to_string(),
            ..Self::default()
        }
    }

    /// Overlay the fields carried by `patch`, keeping every other stored field.
    pub fn apply(&mut self, patch: ConfigPatch) {
        let mut current = self.to_patch();
        current.merge(patch);
        self.categories = current.categories;
        self.winners = current.winners;
        self.show_date = current.show_date;
    }

    /// Project the stored fields into a snapshot.
    pub fn to_patch(&self) -> ConfigPatch {
        ConfigPatch {
            categories: self.categories.clone(),
            winners: self.winners.clone(),
            show_date: self.show_date.clone(),
        }
    }
}

pub fn guest_doc_id(id: &str) -> String {
    format!("{GUEST_PREFIX}{id}")
}

pub fn extract_guest_id(doc_id: &str) -> Result<String, CouchDaoError> {
    match doc_id.strip_prefix(GUEST_PREFIX) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        Some(_) => Err(CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_string(),
            kind: "empty guest id",
        }),
        None => Err(CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_string(),
            kind: "missing guest prefix",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_document_keeps_id_in_doc_id() {
        let guest: GuestEntity = serde_json::from_str(
            r#"{"id":"abc","name":"Alice","rsvp":"yes","partyId":"p1","isPartyHost":true,"partySize":2}"#,
        )
        .unwrap();
        let doc = CouchGuestDocument::from((guest.clone(), None));
        assert_eq!(doc.id, "guest::abc");

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["_id"], "guest::abc");
        assert!(json.get("_rev").is_none());
        assert_eq!(json["partyId"], "p1");

        let back = GuestEntity::try_from(doc).unwrap();
        assert_eq!(back, guest);
    }

    #[test]
    fn extract_guest_id_rejects_foreign_documents() {
        assert!(extract_guest_id("config::main").is_err());
        assert!(extract_guest_id("guest::").is_err());
        assert_eq!(extract_guest_id("guest::x1").unwrap(), "x1");
    }

    #[test]
    fn config_document_merges_patch_fields() {
        let mut doc = CouchConfigDocument::empty();
        doc.apply(ConfigPatch::show_date("2026-03-15"));
        doc.apply(ConfigPatch::categories(vec![CategoryEntity::new("Best Sound", ["F1"])]));

        let patch = doc.to_patch();
        assert_eq!(patch.show_date.as_deref(), Some("2026-03-15"));
        assert_eq!(patch.categories.map(|c| c.len()), Some(1));
        assert!(patch.winners.is_none());
    }
}
