use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RoleNodes::Table)
                    .col(
                        ColumnDef::new(RoleNodes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RoleNodes::RoleId).big_integer().not_null())
                    .col(ColumnDef::new(RoleNodes::NodeId).big_integer().not_null())
                    .col(ColumnDef::new(RoleNodes::Account).string().not_null())
                    .col(ColumnDef::new(RoleNodes::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(RoleNodes::Table, RoleNodes::RoleId)
                            .to(crate::Roles::Table, crate::Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RoleNodes::Table, RoleNodes::NodeId)
                            .to(crate::Nodes::Table, crate::Nodes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_role_nodes_role_id_node_id")
                    .table(RoleNodes::Table)
                    .col(RoleNodes::RoleId)
                    .col(RoleNodes::NodeId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoleNodes::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum RoleNodes {
    Table,
    Id,
    RoleId,
    NodeId,
    Account,
    CreatedAt,
}
