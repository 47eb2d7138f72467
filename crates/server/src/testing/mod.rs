use std::error::Error;
use std::sync::Arc;

use axum::{
    async_trait,
    body::Body,
    http::Request,
};
use common::signature::simple_signature;
use db::{
    node, role, role_node, role_user, space, user, ActiveValue, Database, DatabaseConnection,
    EntityTrait,
};
use hyper::body::{self, Bytes, HttpBody};
use migration::MigratorTrait;
use serde::Serialize;
use ssh_key::{rand_core::OsRng, Algorithm, PrivateKey};

use crate::certificate::CertificateAuthority;

/// Passphrase protecting the test CA private key.
pub(crate) const TEST_PASSPHRASE: &str = "pw";

pub(crate) async fn create_database() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("unable to create test database");

    migration::Migrator::up(&db, None)
        .await
        .expect("unable to run migrations");

    db
}

/// Certificate authority with a freshly generated, passphrase-protected
/// ed25519 keypair.
pub(crate) fn create_certificate_authority() -> Arc<CertificateAuthority> {
    let ca_key =
        PrivateKey::random(&mut OsRng, Algorithm::Ed25519).expect("unable to generate CA key");

    let encrypted = ca_key
        .encrypt(&mut OsRng, TEST_PASSPHRASE)
        .expect("unable to encrypt CA key");

    let private_pem = encrypted
        .to_openssh(ssh_key::LineEnding::LF)
        .expect("unable to encode CA private key");

    let public_line = ca_key
        .public_key()
        .to_openssh()
        .expect("unable to encode CA public key");

    Arc::new(CertificateAuthority::new(
        private_pem.as_bytes().to_vec(),
        format!("{public_line}\n").into_bytes(),
        || TEST_PASSPHRASE.to_string(),
    ))
}

/// Freshly generated OpenSSH public key line.
pub(crate) fn test_public_key() -> String {
    PrivateKey::random(&mut OsRng, Algorithm::Ed25519)
        .expect("unable to generate key")
        .public_key()
        .to_openssh()
        .expect("unable to encode public key")
}

pub(crate) async fn seed_space(db: &DatabaseConnection) -> space::Model {
    space::Entity::insert(space::ActiveModel {
        name: ActiveValue::Set(format!("space-{}", node::generate_credentials().0)),
        description: ActiveValue::Set(String::new()),
        created_at: ActiveValue::Set(db::current_timestamp()),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create space")
}

pub(crate) async fn seed_user(db: &DatabaseConnection, email: &str) -> user::Model {
    user::Entity::insert(user::ActiveModel {
        username: ActiveValue::Set(email.split('@').next().unwrap_or(email).to_owned()),
        email: ActiveValue::Set(email.to_owned()),
        pub_key: ActiveValue::Set(test_public_key()),
        banned: ActiveValue::Set(false),
        created_at: ActiveValue::Set(db::current_timestamp()),
        updated_at: ActiveValue::Set(db::current_timestamp()),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create user")
}

pub(crate) async fn seed_node(
    db: &DatabaseConnection,
    space_id: i64,
    accounts: &[&str],
) -> node::Model {
    let (unique_id, secret) = node::generate_credentials();

    node::Entity::insert(node::ActiveModel {
        space_id: ActiveValue::Set(space_id),
        name: ActiveValue::Set(format!("node-{unique_id}")),
        description: ActiveValue::Set(String::new()),
        unique_id: ActiveValue::Set(unique_id),
        secret: ActiveValue::Set(secret),
        ip: ActiveValue::Set(String::from("10.0.0.1")),
        last_heartbeat: ActiveValue::Set(0),
        accounts: ActiveValue::Set(node::AccountList(
            accounts.iter().map(|account| account.to_string()).collect(),
        )),
        created_at: ActiveValue::Set(db::current_timestamp()),
        updated_at: ActiveValue::Set(db::current_timestamp()),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create node")
}

pub(crate) async fn seed_role(db: &DatabaseConnection, space_id: i64, name: &str) -> role::Model {
    role::Entity::insert(role::ActiveModel {
        space_id: ActiveValue::Set(space_id),
        name: ActiveValue::Set(name.to_owned()),
        description: ActiveValue::Set(String::new()),
        created_at: ActiveValue::Set(db::current_timestamp()),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create role")
}

pub(crate) async fn bind_node(db: &DatabaseConnection, role_id: i64, node_id: i64, account: &str) {
    role_node::Entity::insert(role_node::ActiveModel {
        role_id: ActiveValue::Set(role_id),
        node_id: ActiveValue::Set(node_id),
        account: ActiveValue::Set(account.to_owned()),
        created_at: ActiveValue::Set(db::current_timestamp()),
        ..Default::default()
    })
    .exec_without_returning(db)
    .await
    .expect("unable to bind node to role");
}

pub(crate) async fn bind_user(db: &DatabaseConnection, role_id: i64, user_id: i64) {
    role_user::Entity::insert(role_user::ActiveModel {
        role_id: ActiveValue::Set(role_id),
        user_id: ActiveValue::Set(user_id),
        created_at: ActiveValue::Set(db::current_timestamp()),
        ..Default::default()
    })
    .exec_without_returning(db)
    .await
    .expect("unable to bind user to role");
}

/// Build a polled-endpoint request carrying a valid node signature.
pub(crate) fn signed_request(path: &str, node: &node::Model, timestamp: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(format!("{path}?nodeID={}", node.unique_id))
        .header("X-Timestamp", timestamp)
        .header(
            "X-Signature",
            simple_signature(timestamp.as_bytes(), node.secret.as_bytes()),
        )
        .body(Body::empty())
        .unwrap()
}

pub(crate) trait RequestBodyExt: Sized {
    fn from_json<B: Serialize>(val: B) -> Self;
}

impl<T> RequestBodyExt for T
where
    T: HttpBody + From<Vec<u8>>,
{
    fn from_json<B: Serialize>(val: B) -> Self {
        T::from(serde_json::to_vec(&val).expect("unable to serialize"))
    }
}

#[async_trait(?Send)]
pub(crate) trait ResponseBodyExt {
    async fn bytes(self) -> Bytes;

    async fn text(self) -> String;

    async fn json(self) -> serde_json::Value;
}

#[async_trait(?Send)]
impl<T> ResponseBodyExt for T
where
    T: HttpBody,
    T::Error: Error,
{
    async fn bytes(self) -> Bytes {
        body::to_bytes(self)
            .await
            .expect("unable to convert to bytes")
    }

    async fn text(self) -> String {
        String::from_utf8(self.bytes().await.to_vec()).expect("unable to convert to text")
    }

    async fn json(self) -> serde_json::Value {
        serde_json::from_slice(&self.bytes().await).expect("unable to convert to json")
    }
}
