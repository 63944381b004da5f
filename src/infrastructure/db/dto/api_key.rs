use crate::domain::value_objects::ids::OwnerId;
use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKeyRow {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub key_hash: String,
    pub created_at: OffsetDateTime,
    pub revoked_at: Option<OffsetDateTime>,
}

impl ApiKeyRow {
    pub fn new(owner_id: OwnerId, key_hash: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            owner_id: owner_id.0,
            key_hash: key_hash.into(),
            created_at: OffsetDateTime::now_utc(),
            revoked_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }
}
