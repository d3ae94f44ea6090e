use crate::models::PostDetail;

/// Intersection-filters a post collection by category names.
///
/// A post is kept only if it carries every selected name; an empty selection
/// keeps everything. Callers own the selection state and must always filter
/// the full unfiltered collection, never an already-filtered one.
pub fn filter_by_categories(posts: Vec<PostDetail>, selected: &[String]) -> Vec<PostDetail> {
    if selected.is_empty() {
        return posts;
    }

    posts
        .into_iter()
        .filter(|post| {
            selected
                .iter()
                .all(|name| post.categories.iter().any(|c| c.name == *name))
        })
        .collect()
}
