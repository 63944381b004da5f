use crate::domain::value_objects::ids::{OwnerId, WebhookId, WorkspaceId};
use std::collections::BTreeMap;

/// A registered delivery target. Read-only from the worker's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Webhook {
    pub id: WebhookId,
    pub owner_id: OwnerId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub is_active: bool,
    pub timeout_seconds: u32,
}

/// Signing material for a webhook. `previous` stays valid for one rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretPair {
    pub current: String,
    pub previous: Option<String>,
}

impl SecretPair {
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            current: current.into(),
            previous: None,
        }
    }

    /// The outgoing current secret becomes `previous`.
    pub fn rotate(&self, next: impl Into<String>) -> Self {
        Self {
            current: next.into(),
            previous: Some(self.current.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SecretPair;

    #[test]
    fn given_pair_when_rotated_should_keep_old_current_as_previous() {
        let pair = SecretPair::new("one");
        let rotated = pair.rotate("two").rotate("three");

        assert_eq!(rotated.current, "three");
        assert_eq!(rotated.previous.as_deref(), Some("two"));
    }
}
