use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Category → nominee mapping used for both ballots and announced winners.
pub type Picks = IndexMap<String, String>;

/// Announced winners keyed by category name; a missing entry means "not yet announced".
pub type Winners = Picks;

/// Award category with its nominees in display order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryEntity {
    /// Category name, unique within the configured set.
    pub name: String,
    /// Nominees in display order.
    #[serde(default)]
    pub nominees: Vec<String>,
}

impl CategoryEntity {
    /// Build a category from a name and any iterable of nominee names.
    pub fn new<I, S>(name: impl Into<String>, nominees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            nominees: nominees.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the category can be voted on at all.
    pub fn has_nominees(&self) -> bool {
        !self.nominees.is_empty()
    }
}

/// Attendance answer of a guest.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Rsvp {
    /// Attending.
    Yes,
    /// Not attending.
    No,
    /// No answer recorded (also used for unknown stored values).
    #[default]
    #[serde(other)]
    Unset,
}

impl Rsvp {
    /// Textual form used by exports; `Unset` renders as an empty string.
    pub fn as_export_str(self) -> &'static str {
        match self {
            Rsvp::Yes => "yes",
            Rsvp::No => "no",
            Rsvp::Unset => "",
        }
    }
}

/// One person known to the party, as persisted in the local cache and the remote store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GuestEntity {
    /// Opaque identifier, stable after the first save.
    pub id: String,
    /// Display name, unique across guests ignoring case and surrounding whitespace.
    pub name: String,
    #[serde(default)]
    pub rsvp: Rsvp,
    /// Dietary notes, only meaningful for the party host.
    #[serde(default)]
    pub dietary: String,
    /// Group shared by every member of one submission; absent for a lone "no".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
    #[serde(default)]
    pub is_party_host: bool,
    /// Number of guests sharing `party_id`, stored on every member.
    #[serde(default = "default_party_size")]
    pub party_size: u32,
    /// Picks for the categories the person actually voted on.
    #[serde(default)]
    pub predictions: Picks,
    #[serde(default)]
    pub ballot_submitted: bool,
    /// RFC 3339 timestamp of the last save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
}

fn default_party_size() -> u32 {
    1
}

impl GuestEntity {
    /// Identifier used when deleting or editing the submission this guest belongs to.
    ///
    /// Party members answer with their party id; a lone guest stands in with its own id.
    pub fn party_key(&self) -> &str {
        self.party_id.as_deref().unwrap_or(&self.id)
    }

    /// Whether this guest belongs to the submission addressed by `key`.
    pub fn belongs_to(&self, key: &str) -> bool {
        self.party_id.as_deref() == Some(key) || self.id == key
    }
}

/// Guest record handed to `save_guest`; the id is assigned on first save.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GuestDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub rsvp: Rsvp,
    #[serde(default)]
    pub dietary: String,
    #[serde(default)]
    pub party_id: Option<String>,
    #[serde(default)]
    pub is_party_host: bool,
    #[serde(default = "default_party_size")]
    pub party_size: u32,
    #[serde(default)]
    pub predictions: Picks,
}

impl From<GuestEntity> for GuestDraft {
    fn from(guest: GuestEntity) -> Self {
        Self {
            id: Some(guest.id),
            name: guest.name,
            rsvp: guest.rsvp,
            dietary: guest.dietary,
            party_id: guest.party_id,
            is_party_host: guest.is_party_host,
            party_size: guest.party_size,
            predictions: guest.predictions,
        }
    }
}

/// Shared configuration record mirrored by the remote store.
///
/// Every field is optional: a patch only carries the fields it changes, and an
/// incoming snapshot only overwrites the fields it actually contains.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoryEntity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winners: Option<Winners>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_date: Option<String>,
}

impl ConfigPatch {
    /// Patch replacing the category list.
    pub fn categories(categories: Vec<CategoryEntity>) -> Self {
        Self {
            categories: Some(categories),
            ..Self::default()
        }
    }

    /// Patch replacing the winners mapping.
    pub fn winners(winners: Winners) -> Self {
        Self {
            winners: Some(winners),
            ..Self::default()
        }
    }

    /// Patch replacing the show date.
    pub fn show_date(show_date: impl Into<String>) -> Self {
        Self {
            show_date: Some(show_date.into()),
            ..Self::default()
        }
    }

    /// Overlay the fields present in `other` onto `self`, leaving absent fields untouched.
    pub fn merge(&mut self, other: ConfigPatch) {
        if let Some(categories) = other.categories {
            self.categories = Some(categories);
        }
        if let Some(winners) = other.winners {
            self.winners = Some(winners);
        }
        if let Some(show_date) = other.show_date {
            self.show_date = Some(show_date);
        }
    }

    /// True when the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.categories.is_none() && self.winners.is_none() && self.show_date.is_none()
    }

    /// Names of the fields carried by the patch, for logging.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::with_capacity(3);
        if self.categories.is_some() {
            fields.push("categories");
        }
        if self.winners.is_some() {
            fields.push("winners");
        }
        if self.show_date.is_some() {
            fields.push("showDate");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_deserializes_with_missing_optional_fields() {
        let guest: GuestEntity =
            serde_json::from_str(r#"{"id":"g1","name":"Alice","rsvp":"maybe"}"#).unwrap();
        assert_eq!(guest.rsvp, Rsvp::Unset);
        assert_eq!(guest.party_size, 1);
        assert!(guest.predictions.is_empty());
        assert!(guest.party_id.is_none());
    }

    #[test]
    fn guest_serializes_camel_case() {
        let guest = GuestEntity {
            id: "g1".into(),
            name: "Alice".into(),
            rsvp: Rsvp::Yes,
            dietary: String::new(),
            party_id: Some("p1".into()),
            is_party_host: true,
            party_size: 2,
            predictions: Picks::new(),
            ballot_submitted: false,
            submitted_at: None,
        };
        let json = serde_json::to_value(&guest).unwrap();
        assert_eq!(json["partyId"], "p1");
        assert_eq!(json["isPartyHost"], true);
        assert_eq!(json["partySize"], 2);
        assert!(json.get("submittedAt").is_none());
    }

    #[test]
    fn party_key_falls_back_to_guest_id() {
        let mut guest: GuestEntity =
            serde_json::from_str(r#"{"id":"solo","name":"Dan","rsvp":"no"}"#).unwrap();
        assert_eq!(guest.party_key(), "solo");
        assert!(guest.belongs_to("solo"));

        guest.party_id = Some("p9".into());
        assert_eq!(guest.party_key(), "p9");
        assert!(guest.belongs_to("p9"));
        assert!(guest.belongs_to("solo"));
        assert!(!guest.belongs_to("other"));
    }

    #[test]
    fn config_merge_only_overwrites_present_fields() {
        let mut base = ConfigPatch::categories(vec![CategoryEntity::new("Best Picture", ["A"])]);
        base.merge(ConfigPatch::show_date("2026-03-15"));

        assert_eq!(base.categories.as_ref().map(Vec::len), Some(1));
        assert_eq!(base.show_date.as_deref(), Some("2026-03-15"));
        assert!(base.winners.is_none());
        assert_eq!(base.field_names(), vec!["categories", "showDate"]);
    }

    #[test]
    fn config_patch_omits_absent_fields() {
        let json = serde_json::to_string(&ConfigPatch::show_date("")).unwrap();
        assert_eq!(json, r#"{"showDate":""}"#);
    }
}
