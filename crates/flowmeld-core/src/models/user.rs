use serde::{Deserialize, Serialize};

/// Profile of the signed-in user. Extra fields sent by the server are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub email: String,
}

impl User {
    /// Name to greet the user with on the dashboard.
    pub fn display_name(&self) -> &str {
        &self.username
    }
}
