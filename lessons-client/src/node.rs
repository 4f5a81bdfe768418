use crate::api::{Comment, NodePath, Remark, Reply};

/// A comment or a reply, borrowed from the thread it lives in
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeRef<'a> {
    Comment(&'a Comment),
    Reply(&'a Reply),
}

impl<'a> NodeRef<'a> {
    pub fn remark(&self) -> &'a Remark {
        match self {
            NodeRef::Comment(c) => &c.remark,
            NodeRef::Reply(r) => &r.remark,
        }
    }

    pub fn replies(&self) -> &'a [Reply] {
        match self {
            NodeRef::Comment(c) => &c.replies,
            NodeRef::Reply(r) => &r.replies,
        }
    }

    pub fn find(comment: &'a Comment, path: &NodePath) -> Option<NodeRef<'a>> {
        if comment.id != *path.comment_id() {
            return None;
        }
        match path.is_comment() {
            true => Some(NodeRef::Comment(comment)),
            false => comment.find_reply(path.chain()).map(NodeRef::Reply),
        }
    }
}

/// Every node of a thread with its position, depth-first in display order
pub fn walk(comment: &Comment) -> Vec<(NodePath, NodeRef<'_>)> {
    let root = NodePath::comment(comment.id.clone());
    let mut res = vec![(root.clone(), NodeRef::Comment(comment))];
    walk_replies(&root, &comment.replies, &mut res);
    res
}

fn walk_replies<'a>(
    parent: &NodePath,
    replies: &'a [Reply],
    res: &mut Vec<(NodePath, NodeRef<'a>)>,
) {
    for r in replies {
        match parent.child(r.id.clone()) {
            Ok(path) => {
                res.push((path.clone(), NodeRef::Reply(r)));
                walk_replies(&path, &r.replies, res);
            }
            Err(_) => tracing::warn!(
                %parent,
                reply = %r.id,
                "ignoring reply nested deeper than the maximum depth"
            ),
        }
    }
}
