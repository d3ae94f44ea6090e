use crate::{
    error::AppError,
    extractors::AuthUser,
    filter::filter_by_categories,
    models::{CategoryRef, Post, PostDetail},
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

const POST_COLUMNS: &str = "id, title, content, cover_image_key, created_at, updated_at";

#[derive(Deserialize, Default)]
pub struct PostListParams {
    /// Comma-separated category names; a post must carry every one of them.
    categories: Option<String>,
}

impl PostListParams {
    fn selected(&self) -> Vec<String> {
        self.categories
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

#[derive(sqlx::FromRow)]
struct AssociationRow {
    post_id: Uuid,
    category_id: Uuid,
    name: String,
}

pub async fn get_posts(
    State(pool): State<PgPool>,
    Query(params): Query<PostListParams>,
) -> Result<Json<Vec<PostDetail>>, AppError> {
    let query = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC");
    let posts = sqlx::query_as::<_, Post>(&query).fetch_all(&pool).await?;

    let associations = sqlx::query_as::<_, AssociationRow>(
        "SELECT pc.post_id, c.id AS category_id, c.name
         FROM post_categories pc
         JOIN categories c ON c.id = pc.category_id
         ORDER BY c.created_at, c.id",
    )
    .fetch_all(&pool)
    .await?;

    let details = assemble_posts(posts, associations);
    Ok(Json(filter_by_categories(details, &params.selected())))
}

pub async fn get_one_post(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<PostDetail>, AppError> {
    let detail = fetch_post_detail(&pool, id).await?;
    Ok(Json(detail))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub cover_image_key: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<String>,
}

pub async fn create_post(
    State(pool): State<PgPool>,
    _user: AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> Result<Json<PostDetail>, AppError> {
    validate_title(&payload.title)?;
    let category_ids = parse_category_ids(&payload.category_ids)?;

    let mut tx = pool.begin().await?;

    ensure_categories_exist(&mut tx, &category_ids).await?;

    let query = format!(
        "INSERT INTO posts (title, content, cover_image_key)
         VALUES ($1, $2, $3)
         RETURNING {POST_COLUMNS}"
    );
    let post = sqlx::query_as::<_, Post>(&query)
        .bind(&payload.title)
        .bind(&payload.content)
        .bind(&payload.cover_image_key)
        .fetch_one(&mut *tx)
        .await?;

    insert_associations(&mut tx, post.id, &category_ids).await?;

    tx.commit().await?;

    let detail = fetch_post_detail(&pool, post.id).await?;
    Ok(Json(detail))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: String,
    pub content: String,
    pub cover_image_key: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<String>,
}

pub async fn update_post(
    State(pool): State<PgPool>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<PostDetail>, AppError> {
    validate_title(&payload.title)?;
    let category_ids = parse_category_ids(&payload.category_ids)?;

    let mut tx = pool.begin().await?;

    ensure_categories_exist(&mut tx, &category_ids).await?;

    let query = format!(
        "UPDATE posts
         SET title = $1, content = $2, cover_image_key = $3, updated_at = now()
         WHERE id = $4
         RETURNING {POST_COLUMNS}"
    );
    let post = sqlx::query_as::<_, Post>(&query)
        .bind(&payload.title)
        .bind(&payload.content)
        .bind(&payload.cover_image_key)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound)?;

    // Full set-replace of the association set, not a diff
    sqlx::query("DELETE FROM post_categories WHERE post_id = $1")
        .bind(post.id)
        .execute(&mut *tx)
        .await?;

    insert_associations(&mut tx, post.id, &category_ids).await?;

    tx.commit().await?;

    let detail = fetch_post_detail(&pool, post.id).await?;
    Ok(Json(detail))
}

#[derive(Deserialize)]
pub struct DeletePostParams {
    pub id: Option<String>,
}

pub async fn delete_post(
    State(pool): State<PgPool>,
    _user: AuthUser,
    Query(params): Query<DeletePostParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = params
        .id
        .as_deref()
        .ok_or_else(|| AppError::validation("post id is not specified"))?;
    let id = Uuid::parse_str(id).map_err(|_| AppError::validation("invalid post id"))?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM post_categories WHERE post_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    // Dropping the transaction rolls back the association delete
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    tx.commit().await?;

    Ok(Json(json!({ "message": "post deleted" })))
}

async fn fetch_post_detail(pool: &PgPool, id: Uuid) -> Result<PostDetail, AppError> {
    let query = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
    let post = sqlx::query_as::<_, Post>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let associations = sqlx::query_as::<_, AssociationRow>(
        "SELECT pc.post_id, c.id AS category_id, c.name
         FROM post_categories pc
         JOIN categories c ON c.id = pc.category_id
         WHERE pc.post_id = $1
         ORDER BY c.created_at, c.id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let mut details = assemble_posts(vec![post], associations);
    Ok(details.remove(0))
}

async fn ensure_categories_exist(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    category_ids: &[Uuid],
) -> Result<(), AppError> {
    if category_ids.is_empty() {
        return Ok(());
    }

    let found: i64 = sqlx::query_scalar("SELECT count(*) FROM categories WHERE id = ANY($1)")
        .bind(category_ids.to_vec())
        .fetch_one(&mut **tx)
        .await?;

    if found as usize != category_ids.len() {
        return Err(AppError::validation("some categories do not exist"));
    }
    Ok(())
}

async fn insert_associations(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    post_id: Uuid,
    category_ids: &[Uuid],
) -> Result<(), AppError> {
    if category_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO post_categories (post_id, category_id)
         SELECT $1, unnest($2::uuid[])",
    )
    .bind(post_id)
    .bind(category_ids.to_vec())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::validation("title must not be empty"));
    }
    Ok(())
}

/// Parses the request's category id strings, rejecting malformed ids and
/// dropping duplicates while keeping first-seen order.
fn parse_category_ids(raw: &[String]) -> Result<Vec<Uuid>, AppError> {
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(raw.len());
    for s in raw {
        let id =
            Uuid::parse_str(s).map_err(|_| AppError::validation("some categories do not exist"))?;
        if seen.insert(id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Stitches association rows onto their posts, preserving the posts' order.
fn assemble_posts(posts: Vec<Post>, associations: Vec<AssociationRow>) -> Vec<PostDetail> {
    let mut details: Vec<PostDetail> = posts
        .into_iter()
        .map(|post| PostDetail {
            post,
            categories: Vec::new(),
        })
        .collect();

    let index: std::collections::HashMap<Uuid, usize> = details
        .iter()
        .enumerate()
        .map(|(i, d)| (d.post.id, i))
        .collect();

    for row in associations {
        if let Some(&i) = index.get(&row.post_id) {
            details[i].categories.push(CategoryRef {
                id: row.category_id,
                name: row.name,
            });
        }
    }

    details
}


#[cfg(all(test, feature = "db-tests"))]
mod db_tests {
    use super::*;
    use crate::routes::categories::{CreateCategoryRequest, create_category};
    use crate::routes::folders::get_or_create_folder;
    use sqlx::PgPool;

    async fn count(pool: &PgPool, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(pool).await.unwrap()
    }

    async fn make_category(pool: &PgPool, name: &str, folder_id: Uuid) -> crate::models::Category {
        create_category(
            State(pool.clone()),
            Json(CreateCategoryRequest {
                name: name.to_string(),
                folder_id,
            }),
        )
        .await
        .unwrap()
        .0
    }

    async fn make_post(pool: &PgPool, title: &str, category_ids: Vec<String>) -> PostDetail {
        create_post(
            State(pool.clone()),
            AuthUser,
            Json(CreatePostRequest {
                title: title.to_string(),
                content: "body".to_string(),
                cover_image_key: None,
                category_ids,
            }),
        )
        .await
        .unwrap()
        .0
    }

    #[sqlx::test]
    async fn delete_removes_the_post_and_exactly_its_associations(pool: PgPool) {
        let folder = get_or_create_folder(&pool, "region").await.unwrap();
        let tokyo = make_category(&pool, "tokyo", folder.id).await;
        let shio = make_category(&pool, "shio", folder.id).await;

        let kept = make_post(&pool, "kept", vec![tokyo.id.to_string()]).await;
        let doomed = make_post(
            &pool,
            "doomed",
            vec![tokyo.id.to_string(), shio.id.to_string()],
        )
        .await;

        assert_eq!(count(&pool, "SELECT count(*) FROM post_categories").await, 3);

        delete_post(
            State(pool.clone()),
            AuthUser,
            Query(DeletePostParams {
                id: Some(doomed.post.id.to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(count(&pool, "SELECT count(*) FROM posts").await, 1);
        assert_eq!(count(&pool, "SELECT count(*) FROM post_categories").await, 1);

        let dangling: i64 =
            sqlx::query_scalar("SELECT count(*) FROM post_categories WHERE post_id = $1")
                .bind(doomed.post.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(dangling, 0);

        let survivor = fetch_post_detail(&pool, kept.post.id).await.unwrap();
        assert_eq!(survivor.categories.len(), 1);
    }

    #[sqlx::test]
    async fn delete_of_a_vanished_post_is_not_found_and_changes_nothing(pool: PgPool) {
        make_post(&pool, "bystander", Vec::new()).await;

        let result = delete_post(
            State(pool.clone()),
            AuthUser,
            Query(DeletePostParams {
                id: Some(Uuid::new_v4().to_string()),
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::NotFound)));
        assert_eq!(count(&pool, "SELECT count(*) FROM posts").await, 1);
    }

    #[sqlx::test]
    async fn failed_create_leaves_no_post_row(pool: PgPool) {
        let result = create_post(
            State(pool.clone()),
            AuthUser,
            Json(CreatePostRequest {
                title: "ghost".to_string(),
                content: "body".to_string(),
                cover_image_key: None,
                category_ids: vec![Uuid::new_v4().to_string()],
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(count(&pool, "SELECT count(*) FROM posts").await, 0);
    }

    #[sqlx::test]
    async fn update_replaces_the_association_set(pool: PgPool) {
        let folder = get_or_create_folder(&pool, "region").await.unwrap();
        let a = make_category(&pool, "tokyo", folder.id).await;
        let b = make_category(&pool, "osaka", folder.id).await;

        let created = make_post(&pool, "moving", vec![a.id.to_string()]).await;

        let updated = update_post(
            State(pool.clone()),
            AuthUser,
            Path(created.post.id),
            Json(UpdatePostRequest {
                title: "moving".to_string(),
                content: "body".to_string(),
                cover_image_key: None,
                category_ids: vec![b.id.to_string()],
            }),
        )
        .await
        .unwrap()
        .0;

        let names: Vec<&str> = updated.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["osaka"]);
    }
}
