//! User profile models.

use serde::{Deserialize, Serialize};

const AVATAR_BASE: &str = "https://api.dicebear.com/7.x/avataaars/svg";

/// A user's profile card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_date: Option<String>,
}

impl UserProfile {
    /// Mock profile for user `id`.
    pub fn mock(id: u32) -> Self {
        Self {
            id,
            name: format!("User {}", id),
            email: format!("user{}@example.com", id),
            avatar: avatar_url(id),
            join_date: None,
        }
    }

    /// Set the join date.
    pub fn with_join_date(mut self, date: impl Into<String>) -> Self {
        self.join_date = Some(date.into());
        self
    }
}

/// User record as returned by the placeholder API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub id: u32,
    pub name: String,
    pub email: String,
}

impl From<ApiUser> for UserProfile {
    fn from(user: ApiUser) -> Self {
        Self {
            avatar: avatar_url(user.id),
            id: user.id,
            name: user.name,
            email: user.email,
            join_date: None,
        }
    }
}

/// Generated avatar for a user.
pub fn avatar_url(seed: u32) -> String {
    format!("{}?seed={}", AVATAR_BASE, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_profile() {
        let user = UserProfile::mock(3);
        assert_eq!(user.name, "User 3");
        assert_eq!(user.email, "user3@example.com");
        assert_eq!(user.avatar, "https://api.dicebear.com/7.x/avataaars/svg?seed=3");
        assert!(user.join_date.is_none());
    }

    #[test]
    fn test_api_user_keeps_fetched_name() {
        let user: ApiUser = serde_json::from_str(
            r#"{"id":1,"name":"Leanne Graham","username":"Bret","email":"Sincere@april.biz"}"#,
        )
        .unwrap();
        let profile = UserProfile::from(user);
        assert_eq!(profile.name, "Leanne Graham");
        assert!(profile.avatar.ends_with("seed=1"));
    }
}
