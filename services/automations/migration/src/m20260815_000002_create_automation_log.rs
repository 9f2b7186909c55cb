use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AutomationLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AutomationLog::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AutomationLog::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(AutomationLog::RuleKey)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutomationLog::TargetTable)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AutomationLog::TargetId).uuid().not_null())
                    .col(ColumnDef::new(AutomationLog::RunDate).date().not_null())
                    .col(
                        ColumnDef::new(AutomationLog::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutomationLog::Message)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AutomationLog::Metadata)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutomationLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // The ledger's whole contract hangs on this constraint: a second
        // insert for the same (tenant, rule, target, day) must collide.
        manager
            .create_index(
                Index::create()
                    .table(AutomationLog::Table)
                    .col(AutomationLog::TenantId)
                    .col(AutomationLog::RuleKey)
                    .col(AutomationLog::TargetTable)
                    .col(AutomationLog::TargetId)
                    .col(AutomationLog::RunDate)
                    .unique()
                    .name("uq_automation_log_natural_key")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(AutomationLog::Table)
                    .col(AutomationLog::TenantId)
                    .col((AutomationLog::CreatedAt, IndexOrder::Desc))
                    .name("idx_automation_log_tenant_id_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AutomationLog::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AutomationLog {
    Table,
    Id,
    TenantId,
    RuleKey,
    TargetTable,
    TargetId,
    RunDate,
    Status,
    Message,
    Metadata,
    CreatedAt,
}
