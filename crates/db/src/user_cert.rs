//! Issued SSH user certificate.
//!
//! The primary key doubles as the certificate serial embedded in the signed
//! blob and referenced by the revocation list, so rows are never deleted:
//! revocation flips `is_revoked` and the serial stays resolvable until the
//! certificate ages out. `expires_at` holds the absolute expiry as unix
//! seconds (0 means the certificate never expires).

use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, QuerySelect};

/// User certificate model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_certs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    #[sea_orm(column_type = "Text")]
    pub cert: String,
    pub expires_at: i64,
    pub is_revoked: bool,
    pub created_at: TimeDateTime,
    pub updated_at: TimeDateTime,
}

/// User certificate relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Serials of revoked, already-expired certificates whose owners are
/// reachable from the given node through `role_user → role → role_node`.
///
/// Expired certificates are rejected by sshd regardless; the revocation
/// list covers the window where host clocks or cached material disagree.
pub async fn revoked_serials_by_node_id<C: ConnectionTrait>(
    conn: &C,
    node_id: i64,
    now: i64,
) -> Result<Vec<i64>, DbErr> {
    let role_ids: Vec<i64> = super::role_node::Entity::find()
        .select_only()
        .column(super::role_node::Column::RoleId)
        .filter(super::role_node::Column::NodeId.eq(node_id))
        .into_tuple()
        .all(conn)
        .await?;

    if role_ids.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids: Vec<i64> = super::role_user::Entity::find()
        .select_only()
        .column(super::role_user::Column::UserId)
        .filter(super::role_user::Column::RoleId.is_in(role_ids))
        .into_tuple()
        .all(conn)
        .await?;

    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    Entity::find()
        .select_only()
        .column(Column::Id)
        .filter(Column::UserId.is_in(user_ids))
        .filter(Column::IsRevoked.eq(true))
        .filter(Column::ExpiresAt.lt(now))
        .order_by_asc(Column::Id)
        .into_tuple()
        .all(conn)
        .await
}
