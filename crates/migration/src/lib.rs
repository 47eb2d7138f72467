pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_spaces_table;
mod m20240101_000002_create_users_table;
mod m20240101_000003_create_nodes_table;
mod m20240101_000004_create_roles_table;
mod m20240101_000005_create_role_nodes_table;
mod m20240101_000006_create_role_users_table;
mod m20240101_000007_create_user_certs_table;

pub(crate) use m20240101_000001_create_spaces_table::Spaces;
pub(crate) use m20240101_000002_create_users_table::Users;
pub(crate) use m20240101_000003_create_nodes_table::Nodes;
pub(crate) use m20240101_000004_create_roles_table::Roles;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_spaces_table::Migration),
            Box::new(m20240101_000002_create_users_table::Migration),
            Box::new(m20240101_000003_create_nodes_table::Migration),
            Box::new(m20240101_000004_create_roles_table::Migration),
            Box::new(m20240101_000005_create_role_nodes_table::Migration),
            Box::new(m20240101_000006_create_role_users_table::Migration),
            Box::new(m20240101_000007_create_user_certs_table::Migration),
        ]
    }
}
