use loco_rs::prelude::*;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::{api_credentials, prelude::*};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCredential {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub provider_name: String,
    pub encrypted_key: String,
    pub encrypted_secret: String,
    pub iv: String,
    pub auth_tag: String,
    pub created_by: Uuid,
    pub created_at: chrono::NaiveDateTime,
    pub last_used_at: Option<chrono::NaiveDateTime>,
}

impl From<api_credentials::Model> for ApiCredential {
    fn from(model: api_credentials::Model) -> Self {
        Self {
            id: model.id,
            workspace_id: model.workspace_id,
            provider_name: model.provider_name,
            encrypted_key: model.encrypted_key,
            encrypted_secret: model.encrypted_secret,
            iv: model.iv,
            auth_tag: model.auth_tag,
            created_by: model.created_by,
            created_at: model.created_at,
            last_used_at: model.last_used_at,
        }
    }
}

#[allow(clippy::too_many_arguments)]
impl ApiCredential {
    pub async fn create(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        provider_name: &str,
        encrypted_key: String,
        encrypted_secret: String,
        iv: String,
        auth_tag: String,
        created_by: Uuid,
    ) -> Result<ApiCredential> {
        let record = api_credentials::ActiveModel {
            id: Set(Uuid::new_v4()),
            workspace_id: Set(workspace_id),
            provider_name: Set(provider_name.to_string()),
            encrypted_key: Set(encrypted_key),
            encrypted_secret: Set(encrypted_secret),
            iv: Set(iv),
            auth_tag: Set(auth_tag),
            created_by: Set(created_by),
            created_at: Set(chrono::Utc::now().naive_utc()),
            last_used_at: Set(None),
        };

        let created = record.insert(db).await?;
        Ok(ApiCredential::from(created))
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<ApiCredential>> {
        let record = ApiCredentials::find_by_id(id).one(db).await?;
        Ok(record.map(ApiCredential::from))
    }

    pub async fn find_by_workspace_and_provider(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        provider_name: &str,
    ) -> Result<Option<ApiCredential>> {
        let record = ApiCredentials::find()
            .filter(api_credentials::Column::WorkspaceId.eq(workspace_id))
            .filter(api_credentials::Column::ProviderName.eq(provider_name))
            .one(db)
            .await?;

        Ok(record.map(ApiCredential::from))
    }

    pub async fn list_by_workspace(db: &DatabaseConnection, workspace_id: Uuid) -> Result<Vec<ApiCredential>> {
        let records = ApiCredentials::find()
            .filter(api_credentials::Column::WorkspaceId.eq(workspace_id))
            .order_by_asc(api_credentials::Column::ProviderName)
            .all(db)
            .await?;

        Ok(records.into_iter().map(ApiCredential::from).collect())
    }

    pub async fn touch_last_used(db: &DatabaseConnection, id: Uuid) -> Result<()> {
        let record = ApiCredentials::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Credential not found"))?;

        let mut active: api_credentials::ActiveModel = record.into();
        active.last_used_at = Set(Some(chrono::Utc::now().naive_utc()));
        active.update(db).await?;
        Ok(())
    }

    pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<()> {
        let record = ApiCredentials::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Credential not found"))?;

        record.delete(db).await?;
        Ok(())
    }
}
