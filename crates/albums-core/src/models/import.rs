use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AttachmentResponse;

/// Result of an archive import as reported to the client.
///
/// Only the successfully imported images are listed; rejected entries are not.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImportSummary {
    pub imported: usize,
    pub images: Vec<AttachmentResponse>,
}
