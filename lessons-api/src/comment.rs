use std::fmt;

use crate::{LessonId, Reaction, Time};

#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub String);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct ReplyId(pub String);

impl fmt::Display for ReplyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The part shared by comments and replies
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Remark {
    /// Author identity, snapshotted at post time
    pub author_email: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_photo: Option<String>,

    pub content: String,
    pub created_at: Time,

    /// At most one entry per user, enforced by the server
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl Remark {
    pub fn is_authored_by(&self, email: &str) -> bool {
        self.author_email == email
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(alias = "_id")]
    pub id: CommentId,
    pub lesson_id: LessonId,

    #[serde(flatten)]
    pub remark: Remark,

    /// Depth-1 replies in chronological order
    #[serde(default)]
    pub replies: Vec<Reply>,
}

/// A reply never stores its depth nor its ancestors: both follow from where it
/// sits in the tree, see `NodePath`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(alias = "_id")]
    pub id: ReplyId,

    #[serde(flatten)]
    pub remark: Remark,

    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Reply {
    pub fn reply_count(&self) -> usize {
        self.replies.iter().map(|r| 1 + r.reply_count()).sum()
    }
}

impl Comment {
    /// Number of replies at any depth
    pub fn reply_count(&self) -> usize {
        self.replies.iter().map(|r| 1 + r.reply_count()).sum()
    }

    /// Walks `chain` (reply ids from depth 1 downwards) and returns the reply it
    /// designates
    pub fn find_reply(&self, chain: &[ReplyId]) -> Option<&Reply> {
        let (last, parents) = chain.split_last()?;
        let siblings = parents.iter().try_fold(&self.replies, |replies, id| {
            replies.iter().find(|r| r.id == *id).map(|r| &r.replies)
        })?;
        siblings.iter().find(|r| r.id == *last)
    }

    pub fn find_reply_mut(&mut self, chain: &[ReplyId]) -> Option<&mut Reply> {
        let (last, parents) = chain.split_last()?;
        self.replies_under_mut(parents)?
            .iter_mut()
            .find(|r| r.id == *last)
    }

    /// Children of the node at `chain`, the comment itself for an empty chain
    pub fn replies_under_mut(&mut self, chain: &[ReplyId]) -> Option<&mut Vec<Reply>> {
        chain.iter().try_fold(&mut self.replies, |replies, id| {
            replies
                .iter_mut()
                .find(|r| r.id == *id)
                .map(|r| &mut r.replies)
        })
    }

    pub fn remark_at(&self, chain: &[ReplyId]) -> Option<&Remark> {
        match chain.is_empty() {
            true => Some(&self.remark),
            false => self.find_reply(chain).map(|r| &r.remark),
        }
    }

    pub fn remove_reply(&mut self, chain: &[ReplyId]) -> Option<Reply> {
        let (last, parents) = chain.split_last()?;
        let siblings = self.replies_under_mut(parents)?;
        let idx = siblings.iter().position(|r| r.id == *last)?;
        Some(siblings.remove(idx))
    }
}
