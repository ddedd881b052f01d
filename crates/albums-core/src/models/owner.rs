use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Generic reference to the record an album is attached to.
///
/// The pair `(owner_type, owner_id)` identifies any kind of record without
/// the album tables knowing about it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct OwnerRef {
    pub owner_type: String,
    pub owner_id: Uuid,
}

impl OwnerRef {
    pub fn new(owner_type: impl Into<String>, owner_id: Uuid) -> Self {
        Self {
            owner_type: owner_type.into().to_lowercase(),
            owner_id,
        }
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner_type, self.owner_id)
    }
}
