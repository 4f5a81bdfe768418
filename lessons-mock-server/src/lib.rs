use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use lessons_client::{
    api::{
        self, Comment, CommentId, CommentPage, Error, LessonId, NewContent, NewReaction, NodePath,
        Op, Reaction, Remark, Reply, ReplyId, Time, User,
    },
    FetchError, Remote,
};
use parking_lot::Mutex;
use uuid::Uuid;

/// In-memory comments server. Clones share the same data.
#[derive(Clone, Debug)]
pub struct MockServer(Arc<Mutex<State>>);

#[derive(Debug)]
struct State {
    /// Comments of each lesson in posting order
    lessons: BTreeMap<LessonId, Vec<Comment>>,

    /// Every call received, as `METHOD /path`
    calls: Vec<String>,
    fail_next: usize,

    /// Creation dates are strictly increasing, one second apart
    clock: Time,
}

/// A client's view of the server, authenticated as `user` if any
#[derive(Clone, Debug)]
pub struct MockSession {
    server: MockServer,
    user: Option<User>,
}

fn authed(user: Option<&User>) -> Result<&User, Error> {
    user.ok_or(Error::NotAuthenticated)
}

fn owned<'a>(remark: &'a mut Remark, user: Option<&User>) -> Result<&'a mut Remark, Error> {
    if !remark.is_authored_by(&authed(user)?.email) {
        return Err(Error::PermissionDenied);
    }
    Ok(remark)
}

/// One reaction per user: the same emoji again removes it, another one
/// replaces it
fn toggle(reactions: &mut Vec<Reaction>, email: &str, emoji: &str) {
    match reactions.iter().position(|r| r.user_email == email) {
        Some(i) if reactions[i].emoji == emoji => {
            reactions.remove(i);
        }
        Some(i) => reactions[i].emoji = String::from(emoji),
        None => reactions.push(Reaction::new(emoji, email)),
    }
}

fn not_found(path: &NodePath) -> Error {
    Error::NotFound(format!("node {path}"))
}

impl State {
    fn tick(&mut self) -> Time {
        self.clock = self.clock + chrono::Duration::seconds(1);
        self.clock
    }

    fn remark(&mut self, author: &User, content: &str) -> Result<Remark, Error> {
        Ok(Remark {
            author_email: author.email.clone(),
            author_name: author.name.clone(),
            author_photo: author.photo.clone(),
            content: String::from(api::validate_content(content)?),
            created_at: self.tick(),
            reactions: Vec::new(),
        })
    }

    fn comment_mut(&mut self, id: &CommentId) -> Result<&mut Comment, Error> {
        self.lessons
            .values_mut()
            .flat_map(|comments| comments.iter_mut())
            .find(|c| c.id == *id)
            .ok_or_else(|| Error::NotFound(format!("comment {id}")))
    }

    fn reply_mut(&mut self, path: &NodePath) -> Result<&mut Reply, Error> {
        self.comment_mut(path.comment_id())?
            .find_reply_mut(path.chain())
            .ok_or_else(|| not_found(path))
    }

    fn fetch_comments(&self, lesson: &LessonId, page: u32, limit: u32) -> CommentPage {
        let limit = limit.max(1);
        let page = page.max(1);
        let all = self.lessons.get(lesson).map(Vec::as_slice).unwrap_or(&[]);
        let total = all.len() as u64;
        CommentPage {
            comments: all
                .iter()
                .rev()
                .skip((page as usize - 1) * limit as usize)
                .take(limit as usize)
                .cloned()
                .collect(),
            total,
            pages: ((total + u64::from(limit) - 1) / u64::from(limit)) as u32,
        }
    }

    fn create_comment(
        &mut self,
        user: Option<&User>,
        lesson: &LessonId,
        content: &str,
    ) -> Result<Comment, Error> {
        let author = authed(user)?;
        let comment = Comment {
            id: CommentId(Uuid::new_v4().to_string()),
            lesson_id: lesson.clone(),
            remark: self.remark(author, content)?,
            replies: Vec::new(),
        };
        self.lessons
            .entry(lesson.clone())
            .or_default()
            .push(comment.clone());
        Ok(comment)
    }

    fn update_comment(
        &mut self,
        user: Option<&User>,
        id: &CommentId,
        content: &str,
    ) -> Result<Comment, Error> {
        let content = api::validate_content(content)?;
        let comment = self.comment_mut(id)?;
        owned(&mut comment.remark, user)?.content = String::from(content);
        Ok(comment.clone())
    }

    fn delete_comment(&mut self, user: Option<&User>, id: &CommentId) -> Result<(), Error> {
        owned(&mut self.comment_mut(id)?.remark, user)?;
        for comments in self.lessons.values_mut() {
            comments.retain(|c| c.id != *id);
        }
        Ok(())
    }

    fn react_comment(
        &mut self,
        user: Option<&User>,
        id: &CommentId,
        emoji: &str,
    ) -> Result<Comment, Error> {
        let email = authed(user)?.email.clone();
        let comment = self.comment_mut(id)?;
        toggle(&mut comment.remark.reactions, &email, emoji);
        Ok(comment.clone())
    }

    fn create_reply(
        &mut self,
        user: Option<&User>,
        parent: &NodePath,
        content: &str,
    ) -> Result<Comment, Error> {
        let author = authed(user)?;
        if !parent.can_reply() {
            return Err(Error::ReplyDepthExceeded);
        }
        let reply = Reply {
            id: ReplyId(Uuid::new_v4().to_string()),
            remark: self.remark(author, content)?,
            replies: Vec::new(),
        };
        let comment = self.comment_mut(parent.comment_id())?;
        comment
            .replies_under_mut(parent.chain())
            .ok_or_else(|| not_found(parent))?
            .push(reply);
        Ok(comment.clone())
    }

    fn update_reply(
        &mut self,
        user: Option<&User>,
        path: &NodePath,
        content: &str,
    ) -> Result<Reply, Error> {
        let content = api::validate_content(content)?;
        let reply = self.reply_mut(path)?;
        owned(&mut reply.remark, user)?.content = String::from(content);
        Ok(reply.clone())
    }

    fn delete_reply(&mut self, user: Option<&User>, path: &NodePath) -> Result<Comment, Error> {
        owned(&mut self.reply_mut(path)?.remark, user)?;
        let comment = self.comment_mut(path.comment_id())?;
        comment
            .remove_reply(path.chain())
            .ok_or_else(|| not_found(path))?;
        Ok(comment.clone())
    }

    fn react_reply(
        &mut self,
        user: Option<&User>,
        path: &NodePath,
        emoji: &str,
    ) -> Result<Reply, Error> {
        let email = authed(user)?.email.clone();
        let reply = self.reply_mut(path)?;
        toggle(&mut reply.remark.reactions, &email, emoji);
        Ok(reply.clone())
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer(Arc::new(Mutex::new(State {
            lessons: BTreeMap::new(),
            calls: Vec::new(),
            fail_next: 0,
            clock: chrono::Utc::now(),
        })))
    }

    pub fn as_user(&self, user: User) -> MockSession {
        MockSession {
            server: self.clone(),
            user: Some(user),
        }
    }

    pub fn anonymous(&self) -> MockSession {
        MockSession {
            server: self.clone(),
            user: None,
        }
    }

    /// Seeds a comment without going through the call log
    pub fn insert_comment(
        &self,
        lesson: &LessonId,
        author: &User,
        content: &str,
    ) -> Result<Comment, Error> {
        self.0.lock().create_comment(Some(author), lesson, content)
    }

    /// Seeds a reply under `parent`, returning the path of the new reply
    pub fn insert_reply(
        &self,
        parent: &NodePath,
        author: &User,
        content: &str,
    ) -> Result<NodePath, Error> {
        let comment = self.0.lock().create_reply(Some(author), parent, content)?;
        let siblings = match parent.chain().is_empty() {
            true => comment.replies.as_slice(),
            false => comment
                .find_reply(parent.chain())
                .map(|r| r.replies.as_slice())
                .unwrap_or(&[]),
        };
        let id = siblings
            .last()
            .map(|r| r.id.clone())
            .ok_or_else(|| not_found(parent))?;
        parent.child(id)
    }

    /// Current comments of `lesson`, newest first
    pub fn test_comments(&self, lesson: &LessonId) -> Vec<Comment> {
        let state = self.0.lock();
        state
            .lessons
            .get(lesson)
            .map(|c| c.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Calls received so far, as `METHOD /path`
    pub fn test_calls(&self) -> Vec<String> {
        self.0.lock().calls.clone()
    }

    pub fn test_num_calls(&self) -> usize {
        self.0.lock().calls.len()
    }

    /// Makes the next `n` calls fail at the transport level
    pub fn test_fail_next(&self, n: usize) {
        self.0.lock().fail_next = n;
    }
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

impl MockSession {
    fn serve<T>(
        &self,
        method: &api::Method,
        path: &str,
        f: impl FnOnce(&mut State, Option<&User>) -> Result<T, Error>,
    ) -> Result<T, FetchError> {
        let mut state = self.server.0.lock();
        state.calls.push(format!("{method} {path}"));
        if state.fail_next > 0 {
            state.fail_next -= 1;
            tracing::debug!(%method, %path, "failing call on request");
            return Err(FetchError::Transport(String::from("connection reset by mock server")));
        }
        let res = f(&mut state, self.user.as_ref());
        if let Err(err) = &res {
            tracing::debug!(%method, %path, ?err, "mock server refused call");
        }
        res.map_err(FetchError::Api)
    }

    fn serve_at<T>(
        &self,
        path: &NodePath,
        op: Op,
        f: impl FnOnce(&mut State, Option<&User>) -> Result<T, Error>,
    ) -> Result<T, FetchError> {
        let endpoint = path.endpoint(op)?;
        self.serve(&endpoint.method, &endpoint.path, f)
    }
}

#[async_trait]
impl Remote for MockSession {
    async fn fetch_comments(
        &self,
        lesson: &LessonId,
        page: u32,
        limit: u32,
    ) -> Result<CommentPage, FetchError> {
        let path = lesson.comments_page_path(page, limit)?;
        self.serve(&api::Method::GET, &path, |state, _| {
            Ok(state.fetch_comments(lesson, page, limit))
        })
    }

    async fn create_comment(
        &self,
        lesson: &LessonId,
        body: &NewContent,
    ) -> Result<Comment, FetchError> {
        let path = lesson.comments_path()?;
        self.serve(&api::Method::POST, &path, |state, user| {
            state.create_comment(user, lesson, &body.content)
        })
    }

    async fn update_comment(
        &self,
        id: &CommentId,
        body: &NewContent,
    ) -> Result<Comment, FetchError> {
        self.serve_at(&NodePath::comment(id.clone()), Op::Update, |state, user| {
            state.update_comment(user, id, &body.content)
        })
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<(), FetchError> {
        self.serve_at(&NodePath::comment(id.clone()), Op::Delete, |state, user| {
            state.delete_comment(user, id)
        })
    }

    async fn react_comment(
        &self,
        id: &CommentId,
        body: &NewReaction,
    ) -> Result<Comment, FetchError> {
        self.serve_at(&NodePath::comment(id.clone()), Op::React, |state, user| {
            state.react_comment(user, id, &body.emoji)
        })
    }

    async fn create_reply(
        &self,
        parent: &NodePath,
        body: &NewContent,
    ) -> Result<Comment, FetchError> {
        self.serve_at(parent, Op::Reply, |state, user| {
            state.create_reply(user, parent, &body.content)
        })
    }

    async fn update_reply(&self, path: &NodePath, body: &NewContent) -> Result<Reply, FetchError> {
        self.serve_at(path, Op::Update, |state, user| {
            state.update_reply(user, path, &body.content)
        })
    }

    async fn delete_reply(&self, path: &NodePath) -> Result<Comment, FetchError> {
        self.serve_at(path, Op::Delete, |state, user| state.delete_reply(user, path))
    }

    async fn react_reply(&self, path: &NodePath, body: &NewReaction) -> Result<Reply, FetchError> {
        self.serve_at(path, Op::React, |state, user| {
            state.react_reply(user, path, &body.emoji)
        })
    }
}
