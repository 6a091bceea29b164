use serde::{Deserialize, Serialize};

/// Server-wide role attached to every user account.
///
/// The first account ever created becomes `Admin`; everyone after that
/// starts as `Staff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Staff,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Staff => "STAFF",
            Role::User => "USER",
        }
    }

    /// Parse the stored/claimed role string. Unknown values map to `User`
    /// so a malformed claim never grants privileges.
    pub fn parse(raw: &str) -> Role {
        match raw {
            "ADMIN" => Role::Admin,
            "STAFF" => Role::Staff,
            _ => Role::User,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
