use crate::config::AuthConfig;
use serde_json::Value;
use std::collections::HashMap;

/// Boundary input from a login form
///
/// A tagged structure rather than an open string map, so the common fields
/// are checked at compile time; `extra` carries rarely-needed
/// provider-specific fields.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub remember_token: Option<String>,
    pub extra: HashMap<String, Value>,
}

impl Credentials {
    /// Username + password pair, the standard login-form shape
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    /// Remember-token-only credentials, used by the guard's fallback path
    pub fn remember(token: impl Into<String>) -> Self {
        Self {
            remember_token: Some(token.into()),
            ..Default::default()
        }
    }

    /// Build from a parsed form body, honoring the configured field names
    ///
    /// Recognizes both `rememberToken` and `remember_token` spellings;
    /// unrecognized fields land in `extra`.
    pub fn from_form(form: &HashMap<String, String>, config: &AuthConfig) -> Self {
        let mut credentials = Self::default();

        for (key, value) in form {
            if key == &config.username_field {
                credentials.username = Some(value.clone());
            } else if key == &config.password_field {
                credentials.password = Some(value.clone());
            } else if key == "rememberToken" || key == "remember_token" {
                credentials.remember_token = Some(value.clone());
            } else {
                credentials
                    .extra
                    .insert(key.clone(), Value::String(value.clone()));
            }
        }

        credentials
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_form_uses_configured_fields() {
        let config = AuthConfig::default();
        let mut form = HashMap::new();
        form.insert("email".to_string(), "a@b.com".to_string());
        form.insert("password".to_string(), "secret".to_string());
        form.insert("next".to_string(), "/admin".to_string());

        let credentials = Credentials::from_form(&form, &config);
        assert_eq!(credentials.username.as_deref(), Some("a@b.com"));
        assert_eq!(credentials.password.as_deref(), Some("secret"));
        assert!(credentials.remember_token.is_none());
        assert!(credentials.extra.contains_key("next"));
    }

    #[test]
    fn test_remember_token_spellings() {
        let config = AuthConfig::default();
        for spelling in ["rememberToken", "remember_token"] {
            let mut form = HashMap::new();
            form.insert(spelling.to_string(), "tok".to_string());
            let credentials = Credentials::from_form(&form, &config);
            assert_eq!(credentials.remember_token.as_deref(), Some("tok"));
        }
    }
}
