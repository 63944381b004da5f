use crate::domain::entities::webhook::{SecretPair, Webhook};
use crate::domain::value_objects::ids::{OwnerId, WebhookId, WorkspaceId};
use sqlx::types::Json;
use std::collections::BTreeMap;
use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WebhookRow {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub workspace_id: uuid::Uuid,
    pub name: String,
    pub url: String,
    pub headers: Json<BTreeMap<String, String>>,
    pub is_active: bool,
    pub timeout_seconds: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WebhookSecretRow {
    pub webhook_id: uuid::Uuid,
    pub current_secret: String,
    pub previous_secret: Option<String>,
    pub rotated_at: Option<OffsetDateTime>,
}

impl WebhookRow {
    pub fn from_webhook(webhook: &Webhook) -> Self {
        Self {
            id: webhook.id.0,
            owner_id: webhook.owner_id.0,
            workspace_id: webhook.workspace_id.0,
            name: webhook.name.clone(),
            url: webhook.url.clone(),
            headers: Json(webhook.headers.clone()),
            is_active: webhook.is_active,
            timeout_seconds: i32::try_from(webhook.timeout_seconds).unwrap_or(i32::MAX),
        }
    }

    pub fn into_webhook(self) -> Webhook {
        Webhook {
            id: WebhookId(self.id),
            owner_id: OwnerId(self.owner_id),
            workspace_id: WorkspaceId(self.workspace_id),
            name: self.name,
            url: self.url,
            headers: self.headers.0,
            is_active: self.is_active,
            timeout_seconds: self.timeout_seconds.max(0) as u32,
        }
    }
}

impl WebhookSecretRow {
    pub fn into_pair(self) -> SecretPair {
        SecretPair {
            current: self.current_secret,
            previous: self.previous_secret.filter(|s| !s.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{WebhookRow, WebhookSecretRow};
    use crate::domain::entities::webhook::Webhook;
    use crate::domain::value_objects::ids::{OwnerId, WebhookId, WorkspaceId};
    use std::collections::BTreeMap;

    #[test]
    fn given_webhook_with_headers_when_mapped_should_round_trip() {
        let mut headers = BTreeMap::new();
        headers.insert("X-Tenant".to_string(), "acme".to_string());
        let webhook = Webhook {
            id: WebhookId::new(),
            owner_id: OwnerId::new(),
            workspace_id: WorkspaceId::new(),
            name: "orders".to_string(),
            url: "https://example.test/hook".to_string(),
            headers,
            is_active: true,
            timeout_seconds: 15,
        };

        let back = WebhookRow::from_webhook(&webhook).into_webhook();

        assert_eq!(back, webhook);
    }

    #[test]
    fn given_blank_previous_secret_when_into_pair_should_drop_it() {
        let row = WebhookSecretRow {
            webhook_id: uuid::Uuid::new_v4(),
            current_secret: "now".to_string(),
            previous_secret: Some(String::new()),
            rotated_at: None,
        };

        assert_eq!(row.into_pair().previous, None);
    }
}
