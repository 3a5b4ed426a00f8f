use crate::db::models::Post;

/// Only a post's creator may edit or delete it. Checked strictly after
/// existence, so callers see `NotFound` before `Forbidden`.
pub fn can_mutate(post: &Post, user_id: &str) -> bool {
    post.creator.id == user_id
}
