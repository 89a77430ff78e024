//! Account records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::UserId;

/// The signed-in user's profile.
///
/// The backend owns this record; fields the client does not interpret
/// (timestamps, flags added later) are kept in `extra` so the record
/// survives a round trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    /// Avatar URL from the identity provider.
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Name to greet the user with: full name, then given name, then email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.given_name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email)
    }
}

/// Editable profile fields sent with `PUT /api/auth/profile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_are_preserved() {
        let json = r#"{
            "id": 3,
            "email": "ada@example.com",
            "name": "Ada Lovelace",
            "createdAt": "2024-05-01T10:00:00",
            "lastLogin": [2024, 5, 2, 9, 30]
        }"#;

        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId::new(3));
        assert!(user.extra.contains_key("createdAt"));
        assert!(user.extra.contains_key("lastLogin"));

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["createdAt"], "2024-05-01T10:00:00");
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut user: UserProfile =
            serde_json::from_str(r#"{"id": 1, "email": "kid@example.com"}"#).unwrap();
        assert_eq!(user.display_name(), "kid@example.com");

        user.given_name = Some("Kim".to_string());
        assert_eq!(user.display_name(), "Kim");

        user.name = Some("Kim Park".to_string());
        assert_eq!(user.display_name(), "Kim Park");
    }

    #[test]
    fn test_profile_update_skips_absent_fields() {
        let update = ProfileUpdate {
            given_name: Some("Kim".to_string()),
            ..ProfileUpdate::default()
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"givenName":"Kim"}"#
        );
    }
}
