use serde::{Deserialize, Serialize};

/// Opaque identifier issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The signed-in user as seen by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
}

impl AuthUser {
    /// Name shown in the auth bar: display name when set, email otherwise.
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(display_name: Option<&str>) -> AuthUser {
        AuthUser {
            uid: UserId::new("u-1"),
            email: "ada@example.com".to_string(),
            display_name: display_name.map(String::from),
        }
    }

    #[test]
    fn test_greeting_prefers_display_name() {
        assert_eq!(user(Some("Ada")).greeting_name(), "Ada");
    }

    #[test]
    fn test_greeting_falls_back_to_email() {
        assert_eq!(user(None).greeting_name(), "ada@example.com");
        assert_eq!(user(Some("  ")).greeting_name(), "ada@example.com");
    }

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&UserId::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
