//! Named access bundle inside a space.
//!
//! A role couples a set of nodes (each bound under a chosen local account,
//! see [`role_node`]) to a set of users ([`role_user`]). Deleting a role
//! removes both membership tables first.
//!
//! [`role_node`]: super::role_node
//! [`role_user`]: super::role_user

use sea_orm::entity::prelude::*;

/// Role model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub space_id: i64,
    pub name: String,
    pub description: String,
    pub created_at: TimeDateTime,
}

/// Role model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::space::Entity",
        from = "Column::SpaceId",
        to = "super::space::Column::Id"
    )]
    Space,

    #[sea_orm(has_many = "super::role_node::Entity")]
    RoleNodes,

    #[sea_orm(has_many = "super::role_user::Entity")]
    RoleUsers,
}

impl Related<super::space::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Space.def()
    }
}

impl Related<super::role_node::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleNodes.def()
    }
}

impl Related<super::role_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
