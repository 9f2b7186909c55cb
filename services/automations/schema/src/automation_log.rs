use sea_orm::entity::prelude::*;

/// One processed (tenant, rule, target, day) outcome.
///
/// Unique on `(tenant_id, rule_key, target_table, target_id, run_date)` —
/// the constraint the ledger's insert-or-ignore relies on. Rows are written
/// once and never updated or deleted by the engine.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "automation_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub rule_key: String,
    pub target_table: String,
    pub target_id: Uuid,
    pub run_date: chrono::NaiveDate,
    pub status: String,
    pub message: String,
    pub metadata: Json,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
