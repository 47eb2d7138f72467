use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Nodes::Table)
                    .col(
                        ColumnDef::new(Nodes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Nodes::SpaceId).big_integer().not_null())
                    .col(ColumnDef::new(Nodes::Name).string().not_null())
                    .col(ColumnDef::new(Nodes::Description).string().not_null())
                    .col(
                        ColumnDef::new(Nodes::UniqueId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Nodes::Secret).string().not_null())
                    .col(ColumnDef::new(Nodes::Ip).string().not_null())
                    .col(
                        ColumnDef::new(Nodes::LastHeartbeat)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Nodes::Accounts).json().not_null())
                    .col(ColumnDef::new(Nodes::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Nodes::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Nodes::Table, Nodes::SpaceId)
                            .to(crate::Spaces::Table, crate::Spaces::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Nodes::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum Nodes {
    Table,
    Id,
    SpaceId,
    Name,
    Description,
    UniqueId,
    Secret,
    Ip,
    LastHeartbeat,
    Accounts,
    CreatedAt,
    UpdatedAt,
}
