//! Role to user membership.
//!
//! Also hosts the member projections used by the authorization resolver:
//! both queries key on the role id and skip banned users, so ban cleanup
//! and resolver output can never disagree.

use sea_orm::{
    entity::prelude::*, ConnectionTrait, JoinType, QueryOrder, QuerySelect, RelationTrait,
};

/// Role-user membership model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "role_users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub role_id: i64,
    pub user_id: i64,
    pub created_at: TimeDateTime,
}

/// Role-user membership relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::Id"
    )]
    Role,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Email addresses of all non-banned members of a role,
/// in membership creation order.
pub async fn emails_by_role_id<C: ConnectionTrait>(
    conn: &C,
    role_id: i64,
) -> Result<Vec<String>, DbErr> {
    super::user::Entity::find()
        .select_only()
        .column(super::user::Column::Email)
        .join(JoinType::InnerJoin, super::user::Relation::RoleUsers.def())
        .filter(Column::RoleId.eq(role_id))
        .filter(super::user::Column::Banned.eq(false))
        .order_by_asc(Column::Id)
        .into_tuple()
        .all(conn)
        .await
}

/// OpenSSH public key lines of all non-banned members of a role,
/// in membership creation order.
pub async fn public_keys_by_role_id<C: ConnectionTrait>(
    conn: &C,
    role_id: i64,
) -> Result<Vec<String>, DbErr> {
    super::user::Entity::find()
        .select_only()
        .column(super::user::Column::PubKey)
        .join(JoinType::InnerJoin, super::user::Relation::RoleUsers.def())
        .filter(Column::RoleId.eq(role_id))
        .filter(super::user::Column::Banned.eq(false))
        .order_by_asc(Column::Id)
        .into_tuple()
        .all(conn)
        .await
}
