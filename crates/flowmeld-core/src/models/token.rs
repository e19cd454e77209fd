use serde::{Deserialize, Serialize};

/// Credentials issued by `token/`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Response of `token/refresh/`. Servers that do not rotate refresh
/// tokens only send `access`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshedToken {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

impl RefreshedToken {
    /// Complete the pair, keeping `current_refresh` when none was issued.
    pub fn into_pair(self, current_refresh: &str) -> TokenPair {
        TokenPair {
            access: self.access,
            refresh: self.refresh.unwrap_or_else(|| current_refresh.to_string()),
        }
    }
}

// Tokens are credentials; keep them out of debug output and logs.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for RefreshedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshedToken")
            .field("access", &"<redacted>")
            .field("rotated", &self.refresh.is_some())
            .finish()
    }
}
