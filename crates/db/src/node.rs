//! Managed host.
//!
//! `unique_id` is the public identifier a host sends with every polled
//! request, `secret` is the shared authenticator behind the request and
//! response signatures. Both are generated at creation time and the secret
//! is returned to the caller exactly once.

use rand::{
    distributions::{Alphanumeric, DistString},
    thread_rng,
};
use sea_orm::{entity::prelude::*, FromJsonQueryResult};
use serde::{Deserialize, Serialize};

/// Length of the generated node unique identifier.
pub const UNIQUE_ID_LENGTH: usize = 16;

/// Length of the generated node shared secret.
pub const SECRET_LENGTH: usize = 32;

/// Ordered list of local account names available on a node.
///
/// Stored as a JSON column so the same entity works against postgres
/// and the in-memory sqlite databases used in tests. The list is never
/// empty; element 0 is the default account for new role bindings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct AccountList(pub Vec<String>);

/// Node model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "nodes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub space_id: i64,
    pub name: String,
    pub description: String,
    #[sea_orm(unique)]
    pub unique_id: String,
    pub secret: String,
    pub ip: String,
    pub last_heartbeat: i64,
    #[sea_orm(column_type = "Json")]
    pub accounts: AccountList,
    pub created_at: TimeDateTime,
    pub updated_at: TimeDateTime,
}

/// Node model relations.
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

impl ActiveModelBehavior for ActiveModel {}

/// Generate a fresh `(unique_id, secret)` credential pair for a new node.
pub fn generate_credentials() -> (String, String) {
    let mut rng = thread_rng();

    let unique_id = Alphanumeric.sample_string(&mut rng, UNIQUE_ID_LENGTH);
    let secret = Alphanumeric.sample_string(&mut rng, SECRET_LENGTH);

    (unique_id, secret)
}

#[cfg(test)]
mod tests {
    use super::{generate_credentials, SECRET_LENGTH, UNIQUE_ID_LENGTH};

    #[test]
    fn credential_lengths() {
        let (unique_id, secret) = generate_credentials();

        assert_eq!(unique_id.len(), UNIQUE_ID_LENGTH);
        assert_eq!(secret.len(), SECRET_LENGTH);
        assert!(unique_id.chars().all(|ch| ch.is_ascii_alphanumeric()));
        assert!(secret.chars().all(|ch| ch.is_ascii_alphanumeric()));
    }
}
