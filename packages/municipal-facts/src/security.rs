//! Provider API keys.
//!
//! Keys are held in `secrecy::SecretString` and tagged with the provider they
//! belong to, so logs and errors can say which key is wrong without ever
//! printing it.

use std::env;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Values left over from `.env.example` style templates.
const PLACEHOLDERS: [&str; 6] = ["changeme", "change-me", "xxx", "todo", "your-api-key", "your_api_key"];

/// A key that cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("{var} must be set")]
    Missing { var: &'static str },

    #[error("{var} is empty")]
    Empty { var: &'static str },

    #[error("{var} contains whitespace")]
    Whitespace { var: &'static str },

    #[error("{var} still holds a placeholder value")]
    Placeholder { var: &'static str },
}

fn is_placeholder(value: &str) -> bool {
    let lowered = value.to_ascii_lowercase();
    PLACEHOLDERS.contains(&lowered.as_str())
        || lowered.starts_with("your-")
        || lowered.starts_with("your_")
        || (lowered.starts_with('<') && lowered.ends_with('>'))
}

/// An API key for one provider.
pub struct ApiKey {
    provider: &'static str,
    secret: SecretString,
}

impl ApiKey {
    /// Validate `value` as the key held in `var` for `provider`.
    ///
    /// Surrounding whitespace is trimmed; inner whitespace is an error.
    pub fn parse(var: &'static str, provider: &'static str, value: &str) -> Result<Self, KeyError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(KeyError::Empty { var });
        }
        if value.chars().any(char::is_whitespace) {
            return Err(KeyError::Whitespace { var });
        }
        if is_placeholder(value) {
            return Err(KeyError::Placeholder { var });
        }
        Ok(Self {
            provider,
            secret: SecretString::new(Box::from(value)),
        })
    }

    /// Required key from the environment.
    pub fn from_env(var: &'static str, provider: &'static str) -> Result<Self, KeyError> {
        Self::optional_from_env(var, provider)?.ok_or(KeyError::Missing { var })
    }

    /// Optional key: unset is `None`, set but unusable is an error.
    pub fn optional_from_env(var: &'static str, provider: &'static str) -> Result<Option<Self>, KeyError> {
        match env::var(var) {
            Ok(value) => Self::parse(var, provider, &value).map(Some),
            Err(_) => Ok(None),
        }
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    /// The raw key, for building a request.
    pub(crate) fn expose(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl Clone for ApiKey {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider,
            secret: SecretString::new(Box::from(self.expose())),
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({}, [REDACTED])", self.provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_names_provider_only() {
        let key = ApiKey::parse("SERPAPI_KEY", "serpapi", "serp-live-key").unwrap();
        let shown = format!("{:?}", key.clone());
        assert_eq!(shown, "ApiKey(serpapi, [REDACTED])");
        assert!(!shown.contains("serp-live-key"));
        assert_eq!(key.expose(), "serp-live-key");
    }

    #[test]
    fn test_key_is_trimmed() {
        let key = ApiKey::parse("GOOGLE_MAPS_API_KEY", "google_maps", "  AIza123\n").unwrap();
        assert_eq!(key.expose(), "AIza123");
        assert_eq!(key.provider(), "google_maps");
    }

    #[test]
    fn test_unusable_keys_are_rejected() {
        let var = "OPENAI_API_KEY";
        assert_eq!(ApiKey::parse(var, "openai", "   ").unwrap_err(), KeyError::Empty { var });
        assert_eq!(ApiKey::parse(var, "openai", "sk-abc def").unwrap_err(), KeyError::Whitespace { var });
        assert_eq!(ApiKey::parse(var, "openai", "your-openai-key").unwrap_err(), KeyError::Placeholder { var });
        assert_eq!(ApiKey::parse(var, "openai", "<key>").unwrap_err(), KeyError::Placeholder { var });
        assert_eq!(ApiKey::parse(var, "openai", "CHANGEME").unwrap_err(), KeyError::Placeholder { var });
    }

    #[test]
    fn test_unset_optional_key_is_none() {
        let key = ApiKey::optional_from_env("MUNICIPAL_FACTS_UNSET_TEST_KEY", "census").unwrap();
        assert!(key.is_none());
        assert_eq!(
            ApiKey::from_env("MUNICIPAL_FACTS_UNSET_TEST_KEY", "census").unwrap_err(),
            KeyError::Missing {
                var: "MUNICIPAL_FACTS_UNSET_TEST_KEY"
            }
        );
    }
}
