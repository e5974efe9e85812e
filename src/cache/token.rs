use serde::{Deserialize, Serialize};

use crate::utils::constants::MIN_PROOF_LENGTH;

/// The session/proof pair this service produces and serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub session_id: String,
    pub proof: String,
}

impl Credentials {
    pub fn new(session_id: impl Into<String>, proof: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            proof: proof.into(),
        }
    }

    /// A proof shorter than the expected length is a failed derivation,
    /// never a success.
    pub fn is_valid(&self) -> bool {
        self.proof.len() >= MIN_PROOF_LENGTH
    }
}
