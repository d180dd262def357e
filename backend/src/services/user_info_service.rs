//! Builds the `me` object returned after login.

use crate::auth::collaborators::UserInfoProvider;
use crate::auth::models::UserRecord;
use serde_json::{Value, json};

/// The projected user record, plus the primary verified email address and
/// an avatar URL.
pub struct DefaultUserInfo {
    site_url: String,
}

impl DefaultUserInfo {
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
        }
    }
}

impl UserInfoProvider for DefaultUserInfo {
    fn derive_user_info(&self, user: &UserRecord) -> Value {
        let mut me = user.fields.clone();
        me.insert("_id".to_string(), json!(user.id));

        if let Some(email) = user.verified_email() {
            me.insert("email".to_string(), json!(email));
        }
        if let Some(username) = user.username() {
            me.insert(
                "avatarUrl".to_string(),
                json!(format!("{}/avatar/{}", self.site_url, username)),
            );
        }

        Value::Object(me)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_email_and_avatar() {
        let mut record = UserRecord::new("u1");
        record.fields.insert("username".into(), json!("alice"));
        record.fields.insert(
            "emails".into(),
            json!([{"address": "alice@x.com", "verified": true}]),
        );

        let me = DefaultUserInfo::new("https://chat.example.com").derive_user_info(&record);

        assert_eq!(me["_id"], "u1");
        assert_eq!(me["email"], "alice@x.com");
        assert_eq!(me["avatarUrl"], "https://chat.example.com/avatar/alice");
        assert_eq!(me["emails"][0]["address"], "alice@x.com");
    }

    #[test]
    fn test_unverified_email_is_not_promoted() {
        let mut record = UserRecord::new("u1");
        record.fields.insert(
            "emails".into(),
            json!([{"address": "alice@x.com", "verified": false}]),
        );

        let me = DefaultUserInfo::new("http://localhost:3000").derive_user_info(&record);

        assert!(me.get("email").is_none());
        assert!(me.get("avatarUrl").is_none());
    }
}
