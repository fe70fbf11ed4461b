use loco_rs::prelude::*;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::{prelude::*, webhook_subscriptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSubscription {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub callback_url: String,
    pub event_types: Vec<String>,
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl From<webhook_subscriptions::Model> for WebhookSubscription {
    fn from(model: webhook_subscriptions::Model) -> Self {
        let event_types = serde_json::from_value(model.event_types).unwrap_or_default();
        Self {
            id: model.id,
            workspace_id: model.workspace_id,
            callback_url: model.callback_url,
            event_types,
            secret_key: model.secret_key,
            is_active: model.is_active,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl WebhookSubscription {
    pub async fn create(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        callback_url: String,
        event_types: Vec<String>,
        secret_key: String,
        created_by: Uuid,
    ) -> Result<WebhookSubscription> {
        let record = webhook_subscriptions::ActiveModel {
            id: Set(Uuid::new_v4()),
            workspace_id: Set(workspace_id),
            callback_url: Set(callback_url),
            event_types: Set(serde_json::to_value(&event_types).unwrap_or_default()),
            secret_key: Set(secret_key),
            is_active: Set(true),
            created_by: Set(created_by),
            created_at: Set(chrono::Utc::now().naive_utc()),
            updated_at: Set(chrono::Utc::now().naive_utc()),
        };

        let created = record.insert(db).await?;
        Ok(WebhookSubscription::from(created))
    }

    pub async fn active_for_workspace_and_event(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        event: &str,
    ) -> Result<Vec<WebhookSubscription>> {
        let records = WebhookSubscriptions::find()
            .filter(webhook_subscriptions::Column::WorkspaceId.eq(workspace_id))
            .filter(webhook_subscriptions::Column::IsActive.eq(true))
            .all(db)
            .await?;

        Ok(records
            .into_iter()
            .map(WebhookSubscription::from)
            .filter(|sub| sub.event_types.iter().any(|e| e == event))
            .collect())
    }

    pub async fn list_by_workspace(db: &DatabaseConnection, workspace_id: Uuid) -> Result<Vec<WebhookSubscription>> {
        let records = WebhookSubscriptions::find()
            .filter(webhook_subscriptions::Column::WorkspaceId.eq(workspace_id))
            .order_by_desc(webhook_subscriptions::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(records.into_iter().map(WebhookSubscription::from).collect())
    }
}
