use sea_orm::entity::prelude::*;

/// Per-tenant automation rule toggle, unique on `(tenant_id, rule_key)`.
///
/// `config` is the raw jsonb blob edited by the rules UI; the service parses
/// it into a typed config on load.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "automation_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub rule_key: String,
    pub enabled: bool,
    pub config: Option<Json>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
