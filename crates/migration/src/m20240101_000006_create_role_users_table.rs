use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RoleUsers::Table)
                    .col(
                        ColumnDef::new(RoleUsers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RoleUsers::RoleId).big_integer().not_null())
                    .col(ColumnDef::new(RoleUsers::UserId).big_integer().not_null())
                    .col(ColumnDef::new(RoleUsers::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(RoleUsers::Table, RoleUsers::RoleId)
                            .to(crate::Roles::Table, crate::Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RoleUsers::Table, RoleUsers::UserId)
                            .to(crate::Users::Table, crate::Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_role_users_role_id_user_id")
                    .table(RoleUsers::Table)
                    .col(RoleUsers::RoleId)
                    .col(RoleUsers::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoleUsers::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum RoleUsers {
    Table,
    Id,
    RoleId,
    UserId,
    CreatedAt,
}
