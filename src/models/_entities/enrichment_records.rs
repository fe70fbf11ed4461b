use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "enrichment_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_id: Uuid,
    pub workspace_id: Uuid,
    pub record_index: i32,
    pub field_name: String,
    pub input_data: Json,
    pub output_data: Option<Json>,
    pub provider_slug: Option<String>,
    pub credits_consumed: i64,
    pub status: String,
    pub error_reason: Option<String>,
    pub idempotency_key: String,
    pub credit_transaction_id: Option<Uuid>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::enrichment_jobs::Entity",
        from = "Column::JobId",
        to = "super::enrichment_jobs::Column::Id"
    )]
    EnrichmentJobs,
}

impl Related<super::enrichment_jobs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EnrichmentJobs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
