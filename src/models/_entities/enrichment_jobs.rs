use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "enrichment_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub status: String,
    pub requested_fields: Json,
    pub waterfall_config: Option<Json>,
    pub total_records: i32,
    pub completed_records: i32,
    pub failed_records: i32,
    pub estimated_credits: i64,
    pub created_by: Uuid,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub completed_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::enrichment_records::Entity")]
    EnrichmentRecords,
}

impl Related<super::enrichment_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EnrichmentRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
