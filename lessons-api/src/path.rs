use std::fmt;

use arrayvec::ArrayVec;
use http::Method;

use crate::{validate_id, CommentId, Error, ReplyId};

/// Replies nest at most this deep under a top-level comment
pub const MAX_REPLY_DEPTH: usize = 3;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Op {
    Update,
    Delete,
    React,
    /// Create a reply one level below the node
    Reply,
}

/// Shape of the server's answer to an operation
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Echo {
    /// The acted-on node alone
    Node,
    /// The whole top-level comment, wrapped in a `ThreadEcho`
    Thread,
    /// An empty success object
    Nothing,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
    pub echo: Echo,
}

/// Position of a node in a thread: the top-level comment, then the id of each
/// reply on the way down. Depth 0 is the comment itself.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct NodePath {
    comment: CommentId,
    replies: ArrayVec<ReplyId, MAX_REPLY_DEPTH>,
}

impl NodePath {
    pub fn comment(comment: CommentId) -> NodePath {
        NodePath {
            comment,
            replies: ArrayVec::new(),
        }
    }

    /// `ancestors` are the replies above `reply`, from depth 1 downwards
    pub fn reply(
        comment: CommentId,
        ancestors: &[ReplyId],
        reply: ReplyId,
    ) -> Result<NodePath, Error> {
        let mut path = NodePath::comment(comment);
        for a in ancestors {
            path = path.child(a.clone())?;
        }
        path.child(reply)
    }

    pub fn child(&self, reply: ReplyId) -> Result<NodePath, Error> {
        let mut replies = self.replies.clone();
        replies
            .try_push(reply)
            .map_err(|_| Error::ReplyDepthExceeded)?;
        Ok(NodePath {
            comment: self.comment.clone(),
            replies,
        })
    }

    pub fn parent(&self) -> Option<NodePath> {
        let mut replies = self.replies.clone();
        replies.pop()?;
        Some(NodePath {
            comment: self.comment.clone(),
            replies,
        })
    }

    pub fn depth(&self) -> usize {
        self.replies.len()
    }

    pub fn is_comment(&self) -> bool {
        self.replies.is_empty()
    }

    pub fn comment_id(&self) -> &CommentId {
        &self.comment
    }

    pub fn chain(&self) -> &[ReplyId] {
        &self.replies
    }

    pub fn reply_id(&self) -> Option<&ReplyId> {
        self.replies.last()
    }

    /// The depth-1 ancestor of a depth-2 or depth-3 reply
    pub fn parent_reply_id(&self) -> Option<&ReplyId> {
        match self.depth() >= 2 {
            true => self.replies.first(),
            false => None,
        }
    }

    /// The depth-2 ancestor of a depth-3 reply
    pub fn parent_nested_reply_id(&self) -> Option<&ReplyId> {
        match self.depth() == MAX_REPLY_DEPTH {
            true => self.replies.get(1),
            false => None,
        }
    }

    pub fn can_reply(&self) -> bool {
        self.depth() < MAX_REPLY_DEPTH
    }

    pub fn resource(&self) -> Result<String, Error> {
        validate_id(&self.comment.0)?;
        let mut path = format!("/comments/{}", self.comment);
        for r in &self.replies {
            validate_id(&r.0)?;
            path.push_str("/replies/");
            path.push_str(&r.0);
        }
        Ok(path)
    }

    pub fn endpoint(&self, op: Op) -> Result<Endpoint, Error> {
        let path = self.resource()?;
        Ok(match op {
            Op::Update => Endpoint {
                method: Method::PATCH,
                path,
                echo: Echo::Node,
            },
            Op::Delete => Endpoint {
                method: Method::DELETE,
                path,
                echo: match self.is_comment() {
                    true => Echo::Nothing,
                    false => Echo::Thread,
                },
            },
            Op::React => Endpoint {
                method: Method::POST,
                path: path + "/reactions",
                echo: Echo::Node,
            },
            Op::Reply => {
                if !self.can_reply() {
                    return Err(Error::ReplyDepthExceeded);
                }
                Endpoint {
                    method: Method::POST,
                    path: path + "/replies",
                    echo: Echo::Thread,
                }
            }
        })
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.comment)?;
        for r in &self.replies {
            write!(f, "/{r}")?;
        }
        Ok(())
    }
}
