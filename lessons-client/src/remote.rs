use async_trait::async_trait;

use crate::{
    api::{Comment, CommentId, CommentPage, LessonId, NewContent, NewReaction, NodePath, Reply},
    FetchError,
};

/// The comments REST API. Reply calls are addressed through `NodePath`, and
/// the echo shape of each call follows `NodePath::endpoint`.
#[async_trait]
pub trait Remote: Send + Sync {
    async fn fetch_comments(
        &self,
        lesson: &LessonId,
        page: u32,
        limit: u32,
    ) -> Result<CommentPage, FetchError>;

    async fn create_comment(
        &self,
        lesson: &LessonId,
        body: &NewContent,
    ) -> Result<Comment, FetchError>;

    async fn update_comment(&self, id: &CommentId, body: &NewContent)
        -> Result<Comment, FetchError>;

    async fn delete_comment(&self, id: &CommentId) -> Result<(), FetchError>;

    async fn react_comment(&self, id: &CommentId, body: &NewReaction)
        -> Result<Comment, FetchError>;

    /// Replies to the comment or reply at `parent`, returning the whole
    /// top-level comment
    async fn create_reply(&self, parent: &NodePath, body: &NewContent)
        -> Result<Comment, FetchError>;

    async fn update_reply(&self, path: &NodePath, body: &NewContent) -> Result<Reply, FetchError>;

    /// Returns the top-level comment the reply was removed from
    async fn delete_reply(&self, path: &NodePath) -> Result<Comment, FetchError>;

    async fn react_reply(&self, path: &NodePath, body: &NewReaction) -> Result<Reply, FetchError>;
}
