use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub cover_image_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub folder_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category as it appears nested under a post.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
}

/// A post together with its categories, the shape every post endpoint returns
/// and the input to the filtering engine.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub categories: Vec<CategoryRef>,
}

/// A folder with its nested categories, as returned by the folder listing.
#[derive(Serialize, Debug, Clone)]
pub struct FolderDetail {
    #[serde(flatten)]
    pub folder: Folder,
    pub categories: Vec<Category>,
}
