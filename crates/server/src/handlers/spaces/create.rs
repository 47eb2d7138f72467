use std::sync::Arc;

use axum::{extract::State, Json};
use db::{
    space, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
    SelectExt, TransactionErrorExt, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Space creation request.
#[derive(Deserialize)]
pub(super) struct CreateSpaceRequest {
    /// Unique space name.
    name: String,

    /// Free-form description.
    #[serde(default)]
    description: String,
}

/// Space creation response.
#[derive(Serialize)]
pub(super) struct CreateSpaceResponse {
    /// Created space identifier.
    id: i64,
}

pub(super) async fn create(
    State(db): State<Arc<DatabaseConnection>>,
    Json(request): Json<CreateSpaceRequest>,
) -> Result<Json<CreateSpaceResponse>, ApiError> {
    if request.name.is_empty() {
        return Err(ApiError::InvalidParameter("name is required"));
    }

    db.transaction(|txn| {
        Box::pin(async move {
            let name_exists = space::Entity::find()
                .select_only()
                .filter(space::Column::Name.eq(&request.name))
                .exists(txn)
                .await?;

            if name_exists {
                return Err(ApiError::SpaceNameAlreadyExists);
            }

            let model = space::Entity::insert(space::ActiveModel {
                name: ActiveValue::Set(request.name),
                description: ActiveValue::Set(request.description),
                created_at: ActiveValue::Set(db::current_timestamp()),
                ..Default::default()
            })
            .exec_with_returning(txn)
            .await?;

            Ok(Json(CreateSpaceResponse { id: model.id }))
        })
    })
    .await
    .into_raw_result()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::testing::{
        create_certificate_authority, create_database, RequestBodyExt, ResponseBodyExt,
    };

    use assert_json::assert_json;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use tower::Service;

    #[tokio::test]
    async fn create_and_reject_duplicate_name() {
        let db = create_database().await;

        let mut service = crate::app_router(Arc::new(db), create_certificate_authority());

        let response = service
            .call(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/guard/space")
                    .header("Content-Type", "application/json")
                    .body(Body::from_json(json!({
                        "name": "production",
                        "description": "primary fleet"
                    })))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_json!(response.json().await, { "id": 1 });

        let response = service
            .call(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/guard/space")
                    .header("Content-Type", "application/json")
                    .body(Body::from_json(json!({ "name": "production" })))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_json!(response.json().await, {
            "code": 100005,
            "message": "space name already exists"
        });
    }
}
