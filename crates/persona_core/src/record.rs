//! User record model as stored in the dataset and served by the directory.
//!
//! Only `id`, `username`, `identity_id`, `persona`, `age` and
//! `selectable_user` carry meaning for the directory. Everything else is
//! profile payload that is stored and returned untouched; unknown dataset keys
//! are kept in [`UserRecord::extra`] so a record round-trips without loss.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::segment::{primary_persona, AgeBucket};

/// Postal address attached to a user profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zipcode: String,
    #[serde(default)]
    pub default: bool,
}

/// A synthetic shopper identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique record id. Empty means "not assigned yet" on create.
    #[serde(default)]
    pub id: String,
    pub username: String,
    /// External identity bound to this record. Absent and empty are the same.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        serialize_with = "none_as_empty"
    )]
    pub identity_id: Option<String>,
    /// `<primary>_<variant>`, e.g. `apparel_housewares`.
    #[serde(default)]
    pub persona: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub selectable_user: bool,

    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub discount_persona: String,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub sign_up_date: String,
    #[serde(default)]
    pub last_sign_in_date: String,

    /// Dataset keys the directory does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    /// Create a selectable record with no id assigned yet.
    pub fn new(username: impl Into<String>, persona: impl Into<String>, age: u32) -> Self {
        Self {
            username: username.into(),
            persona: persona.into(),
            age,
            selectable_user: true,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_identity_id(mut self, identity_id: impl Into<String>) -> Self {
        let identity_id = identity_id.into();
        self.identity_id = (!identity_id.is_empty()).then_some(identity_id);
        self
    }

    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable_user = selectable;
        self
    }

    pub fn primary_persona(&self) -> &str {
        primary_persona(&self.persona)
    }

    pub fn age_bucket(&self) -> Option<AgeBucket> {
        AgeBucket::from_age(self.age)
    }

    /// Copy the profile fields that may change after creation from `other`.
    ///
    /// `id`, `username`, persona, age and selectability are left alone.
    pub(crate) fn overwrite_profile(&mut self, other: &UserRecord) {
        self.first_name.clone_from(&other.first_name);
        self.last_name.clone_from(&other.last_name);
        self.email.clone_from(&other.email);
        self.phone_number.clone_from(&other.phone_number);
        self.addresses.clone_from(&other.addresses);
        self.sign_up_date.clone_from(&other.sign_up_date);
        self.last_sign_in_date.clone_from(&other.last_sign_in_date);
        self.identity_id.clone_from(&other.identity_id);
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn none_as_empty<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identity_id_decodes_as_none() {
        let record: UserRecord = serde_json::from_str(
            r#"{"id":"1","username":"user1","identity_id":"","persona":"apparel_footwear","age":30,"selectable_user":true}"#,
        )
        .expect("record should decode");
        assert_eq!(record.identity_id, None);

        let missing: UserRecord =
            serde_json::from_str(r#"{"id":"2","username":"user2","persona":"books","age":40}"#)
                .expect("record should decode");
        assert_eq!(missing.identity_id, None);
        assert!(!missing.selectable_user);
    }

    #[test]
    fn unknown_keys_survive_reserialization() {
        let json = r#"{"id":"7","username":"user7","persona":"tools_outdoors","age":52,"traits":{"loyal":true},"platforms":{"web":{"anonymous_id":"abc"}}}"#;
        let record: UserRecord = serde_json::from_str(json).expect("record should decode");
        assert_eq!(record.extra.len(), 2);

        let encoded = serde_json::to_value(&record).expect("record should encode");
        assert_eq!(encoded["traits"]["loyal"], Value::Bool(true));
        assert_eq!(encoded["identity_id"], Value::String(String::new()));
    }

    #[test]
    fn overwrite_profile_keeps_identity_fields() {
        let mut stored = UserRecord::new("alice", "beauty_jewelry", 28).with_id("3");
        let incoming = UserRecord {
            first_name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            ..UserRecord::new("mallory", "tools_outdoors", 70).with_identity_id("cognito-1")
        };

        stored.overwrite_profile(&incoming);

        assert_eq!(stored.username, "alice");
        assert_eq!(stored.persona, "beauty_jewelry");
        assert_eq!(stored.age, 28);
        assert_eq!(stored.first_name, "Alice");
        assert_eq!(stored.identity_id.as_deref(), Some("cognito-1"));
    }
}
