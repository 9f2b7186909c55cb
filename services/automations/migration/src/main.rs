use sea_orm_migration::prelude::*;

use corredor_automations_migration::Migrator;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
