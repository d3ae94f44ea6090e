use crate::{
    error::AppError,
    models::{Category, Folder, FolderDetail},
};
use axum::{Json, extract::State};
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashMap;

/// Folders created the first time the system observes an empty folder table,
/// in this order.
pub const DEFAULT_FOLDERS: [&str; 4] = ["region", "ramen-style", "era", "other"];

pub async fn get_folders(
    State(pool): State<PgPool>,
) -> Result<Json<Vec<FolderDetail>>, AppError> {
    let mut folders = fetch_folders(&pool).await?;

    if folders.is_empty() {
        for name in DEFAULT_FOLDERS {
            get_or_create_folder(&pool, name).await?;
        }
        folders = fetch_folders(&pool).await?;
    }

    Ok(Json(folders))
}

#[derive(Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
}

/// Idempotent by name: creating a folder that already exists returns the
/// existing row, never an error.
pub async fn create_folder(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateFolderRequest>,
) -> Result<Json<Folder>, AppError> {
    let folder = get_or_create_folder(&pool, &payload.name).await?;
    Ok(Json(folder))
}

pub async fn get_or_create_folder(pool: &PgPool, name: &str) -> Result<Folder, AppError> {
    // The unique constraint arbitrates concurrent creates; losing the race
    // just means the select below finds the winner's row.
    sqlx::query("INSERT INTO folders (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
        .bind(name)
        .execute(pool)
        .await?;

    let folder = sqlx::query_as::<_, Folder>(
        "SELECT id, name, created_at, updated_at FROM folders WHERE name = $1",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(folder)
}

async fn fetch_folders(pool: &PgPool) -> Result<Vec<FolderDetail>, AppError> {
    let folders = sqlx::query_as::<_, Folder>(
        "SELECT id, name, created_at, updated_at FROM folders ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, folder_id, created_at, updated_at FROM categories ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(group_categories(folders, categories))
}

fn group_categories(folders: Vec<Folder>, categories: Vec<Category>) -> Vec<FolderDetail> {
    let mut details: Vec<FolderDetail> = folders
        .into_iter()
        .map(|folder| FolderDetail {
            folder,
            categories: Vec::new(),
        })
        .collect();

    let index: HashMap<uuid::Uuid, usize> = details
        .iter()
        .enumerate()
        .map(|(i, d)| (d.folder.id, i))
        .collect();

    for category in categories {
        if let Some(&i) = index.get(&category.folder_id) {
            details[i].categories.push(category);
        }
    }

    details
}
