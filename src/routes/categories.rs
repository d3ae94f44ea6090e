use crate::{error::AppError, models::Category};
use axum::{Json, extract::State};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn get_categories(
    State(pool): State<PgPool>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, folder_id, created_at, updated_at FROM categories
         ORDER BY created_at DESC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(categories))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub folder_id: Uuid,
}

pub async fn create_category(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<Json<Category>, AppError> {
    validate_category_name(&payload.name)?;

    sqlx::query("SELECT 1 FROM folders WHERE id = $1")
        .bind(payload.folder_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound)?;

    // Category names are unique across every folder; the DB constraint is
    // the duplicate check, not a prior select.
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, folder_id)
         VALUES ($1, $2)
         RETURNING id, name, folder_id, created_at, updated_at",
    )
    .bind(&payload.name)
    .bind(payload.folder_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::validation("a category with that name already exists")
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::NotFound,
        _ => AppError::Database(e),
    })?;

    Ok(Json(category))
}

fn validate_category_name(name: &str) -> Result<(), AppError> {
    let len = name.chars().count();
    if !(2..=16).contains(&len) {
        return Err(AppError::validation(
            "category name must be 2 to 16 characters",
        ));
    }
    Ok(())
}
