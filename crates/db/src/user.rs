//! Registered user.
//!
//! The `pub_key` column holds the user's OpenSSH public key line and is the
//! material certificates are issued against; replacing it revokes every
//! outstanding certificate of the user. Banned users keep their row (and
//! their certificate history, which the revocation list may still need) but
//! are stripped of all role memberships.

use sea_orm::entity::prelude::*;

/// User model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub pub_key: String,
    pub banned: bool,
    pub created_at: TimeDateTime,
    pub updated_at: TimeDateTime,
}

/// User model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::role_user::Entity")]
    RoleUsers,

    #[sea_orm(has_many = "super::user_cert::Entity")]
    Certs,
}

impl Related<super::role_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleUsers.def()
    }
}

impl Related<super::user_cert::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Certs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
