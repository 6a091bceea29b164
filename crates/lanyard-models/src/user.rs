use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Account row mirroring the external identity provider.
///
/// The id is the identity provider's subject id; rows are created lazily on
/// the first authenticated request that carries a given subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
}
