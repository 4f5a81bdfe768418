use std::fmt;

use crate::{Comment, Error};

/// Number of top-level comments per page
pub const PAGE_SIZE: u32 = 10;

#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct LessonId(pub String);

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl LessonId {
    pub fn comments_path(&self) -> Result<String, Error> {
        crate::validate_id(&self.0)?;
        Ok(format!("/lessons/{}/comments", self.0))
    }

    pub fn comments_page_path(&self, page: u32, limit: u32) -> Result<String, Error> {
        Ok(format!("{}?page={page}&limit={limit}", self.comments_path()?))
    }
}

/// One page of top-level comments, newest first
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentPage {
    pub comments: Vec<Comment>,

    /// Number of comments on the whole lesson
    pub total: u64,

    /// Number of pages at the requested limit
    pub pages: u32,
}
