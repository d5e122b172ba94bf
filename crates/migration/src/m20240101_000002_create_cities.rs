//! Create `cities` table with FK to `states`.
//!
//! Deleting a state cascades to its cities at the database level.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cities::Table)
                    .if_not_exists()
                    .col(uuid(Cities::Id).primary_key())
                    .col(uuid(Cities::StateId).not_null())
                    .col(string_len(Cities::Name, 128).not_null())
                    .col(timestamp_with_time_zone(Cities::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Cities::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_city_state")
                            .from(Cities::Table, Cities::StateId)
                            .to(States::Table, States::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Cities::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Cities { Table, Id, StateId, Name, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum States { Table, Id }
