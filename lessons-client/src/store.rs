use std::collections::HashSet;

use crate::{
    api::{
        self, Comment, CommentId, CommentPage, LessonId, NewContent, NewReaction, NodePath, Op,
        Reply, PAGE_SIZE,
    },
    node, Confirmed, Error, FetchError, Identity, NodeRef, Pager, Remote, ValidationError,
};

/// Identifies one user action for the purpose of refusing duplicate
/// submissions. Different keys may be in flight at the same time.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ActionKey {
    LoadPage,
    Post,
    Edit(NodePath),
    Delete(NodePath),
    React(NodePath),
    Reply(NodePath),
}

#[derive(Debug)]
pub enum Intent {
    LoadPage(u32),
    LoadMore,
    Post(String),
    Edit { path: NodePath, text: String },
    Delete { path: NodePath, confirmed: Confirmed },
    React { path: NodePath, emoji: String },
    Reply { path: NodePath, text: String },
}

#[derive(Debug)]
enum Call {
    FetchPage { lesson: LessonId, page: u32 },
    CreateComment { lesson: LessonId, body: NewContent },
    Update { path: NodePath, body: NewContent },
    Delete { path: NodePath },
    React { path: NodePath, body: NewReaction },
    Reply { path: NodePath, body: NewContent },
}

#[derive(Debug)]
enum Outcome {
    Page { page: u32, data: CommentPage },
    Created(Comment),
    Comment(Comment),
    Reply { path: NodePath, reply: Reply },
    Deleted(CommentId),
    Thread(Comment),
}

/// A validated action holding its lock in the store, ready to be sent
#[derive(Debug)]
pub struct Request {
    generation: u64,
    key: ActionKey,
    call: Call,
}

#[derive(Debug)]
pub struct Response {
    generation: u64,
    key: ActionKey,
    result: Result<Outcome, FetchError>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Applied {
    Loaded { page: u32, added: usize },
    Posted(CommentId),
    Changed(ActionKey),

    /// The response belonged to a lesson the store no longer shows
    Discarded,
}

impl Request {
    pub fn key(&self) -> &ActionKey {
        &self.key
    }

    /// Issues the one network call of this action
    pub async fn send<R: Remote + ?Sized>(self, remote: &R) -> Response {
        tracing::debug!(key = ?self.key, "sending request");
        let result = dispatch(self.call, remote).await;
        Response {
            generation: self.generation,
            key: self.key,
            result,
        }
    }
}

impl Response {
    pub fn key(&self) -> &ActionKey {
        &self.key
    }
}

async fn dispatch<R: Remote + ?Sized>(call: Call, remote: &R) -> Result<Outcome, FetchError> {
    Ok(match call {
        Call::FetchPage { lesson, page } => Outcome::Page {
            page,
            data: remote.fetch_comments(&lesson, page, PAGE_SIZE).await?,
        },
        Call::CreateComment { lesson, body } => {
            Outcome::Created(remote.create_comment(&lesson, &body).await?)
        }
        Call::Update { path, body } => match path.is_comment() {
            true => Outcome::Comment(remote.update_comment(path.comment_id(), &body).await?),
            false => Outcome::Reply {
                reply: remote.update_reply(&path, &body).await?,
                path,
            },
        },
        Call::Delete { path } => match path.is_comment() {
            true => {
                remote.delete_comment(path.comment_id()).await?;
                Outcome::Deleted(path.comment_id().clone())
            }
            false => Outcome::Thread(remote.delete_reply(&path).await?),
        },
        Call::React { path, body } => match path.is_comment() {
            true => Outcome::Comment(remote.react_comment(path.comment_id(), &body).await?),
            false => Outcome::Reply {
                reply: remote.react_reply(&path, &body).await?,
                path,
            },
        },
        Call::Reply { path, body } => Outcome::Thread(remote.create_reply(&path, &body).await?),
    })
}

fn require_login<I: Identity + ?Sized>(identity: &I) -> Result<&str, Error> {
    identity.current_user_email().ok_or(Error::AuthRequired)
}

fn content(text: &str) -> Result<NewContent, Error> {
    Ok(NewContent {
        content: String::from(api::validate_content(text)?),
    })
}

/// The comments of one lesson, kept in sync with the server.
///
/// Every change goes through `prepare`, `Request::send` and `apply`. State only
/// ever changes in `apply`, from what the server echoed, so a failed call
/// leaves nothing to roll back.
#[derive(Debug)]
pub struct ThreadStore {
    lesson: LessonId,

    /// Bumped on lesson switch, so responses to older requests get discarded
    generation: u64,

    /// Newest first, then older pages in load order
    comments: Vec<Comment>,
    total: u64,
    pager: Pager,
    in_flight: HashSet<ActionKey>,
}

impl ThreadStore {
    pub fn new(lesson: LessonId) -> ThreadStore {
        ThreadStore {
            lesson,
            generation: 0,
            comments: Vec::new(),
            total: 0,
            pager: Pager::new(),
            in_flight: HashSet::new(),
        }
    }

    pub fn lesson(&self) -> &LessonId {
        &self.lesson
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page(&self) -> u32 {
        self.pager.page()
    }

    pub fn has_more(&self) -> bool {
        self.pager.has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.pager.is_loading()
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn is_busy(&self, key: &ActionKey) -> bool {
        match key {
            ActionKey::LoadPage => self.pager.is_loading(),
            key => self.in_flight.contains(key),
        }
    }

    /// Drops everything about the current lesson, including requests in flight
    pub fn switch_lesson(&mut self, lesson: LessonId) {
        tracing::debug!(from = %self.lesson, to = %lesson, "switching lesson");
        self.lesson = lesson;
        self.generation += 1;
        self.comments.clear();
        self.total = 0;
        self.pager.reset();
        self.in_flight.clear();
    }

    pub fn comment(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == *id)
    }

    pub fn find(&self, path: &NodePath) -> Option<NodeRef<'_>> {
        self.comment(path.comment_id())
            .and_then(|c| NodeRef::find(c, path))
    }

    /// All loaded nodes in display order
    pub fn nodes(&self) -> impl Iterator<Item = (NodePath, NodeRef<'_>)> {
        self.comments.iter().flat_map(node::walk)
    }

    pub fn can_edit<I: Identity + ?Sized>(&self, path: &NodePath, identity: &I) -> bool {
        self.check_owner(identity, path).is_ok()
    }

    pub fn can_reply(&self, path: &NodePath) -> bool {
        path.can_reply() && self.find(path).is_some()
    }

    fn check_owner<I: Identity + ?Sized>(
        &self,
        identity: &I,
        path: &NodePath,
    ) -> Result<(), Error> {
        let email = require_login(identity)?;
        let node = self
            .find(path)
            .ok_or_else(|| Error::UnknownNode(path.clone()))?;
        if !node.remark().is_authored_by(email) {
            return Err(Error::NotOwner);
        }
        Ok(())
    }

    fn check_exists(&self, path: &NodePath) -> Result<(), Error> {
        match self.find(path) {
            Some(_) => Ok(()),
            None => Err(Error::UnknownNode(path.clone())),
        }
    }

    /// Validates `intent` without any network call and takes its lock
    pub fn prepare<I: Identity + ?Sized>(
        &mut self,
        identity: &I,
        intent: Intent,
    ) -> Result<Request, Error> {
        let (key, call) = match intent {
            Intent::LoadPage(page) => {
                self.pager.begin(page)?;
                return Ok(self.request(
                    ActionKey::LoadPage,
                    Call::FetchPage {
                        lesson: self.lesson.clone(),
                        page,
                    },
                ));
            }
            Intent::LoadMore => {
                let page = self.pager.begin_next()?;
                return Ok(self.request(
                    ActionKey::LoadPage,
                    Call::FetchPage {
                        lesson: self.lesson.clone(),
                        page,
                    },
                ));
            }
            Intent::Post(text) => {
                require_login(identity)?;
                let body = content(&text)?;
                (
                    ActionKey::Post,
                    Call::CreateComment {
                        lesson: self.lesson.clone(),
                        body,
                    },
                )
            }
            Intent::Edit { path, text } => {
                let body = content(&text)?;
                self.check_owner(identity, &path)?;
                path.endpoint(Op::Update)?;
                (ActionKey::Edit(path.clone()), Call::Update { path, body })
            }
            Intent::Delete { path, confirmed: _ } => {
                self.check_owner(identity, &path)?;
                path.endpoint(Op::Delete)?;
                (ActionKey::Delete(path.clone()), Call::Delete { path })
            }
            Intent::React { path, emoji } => {
                require_login(identity)?;
                let emoji = emoji.trim();
                if emoji.is_empty() {
                    return Err(ValidationError::EmptyEmoji.into());
                }
                api::validate_string(emoji)?;
                self.check_exists(&path)?;
                path.endpoint(Op::React)?;
                let body = NewReaction {
                    emoji: String::from(emoji),
                };
                (ActionKey::React(path.clone()), Call::React { path, body })
            }
            Intent::Reply { path, text } => {
                require_login(identity)?;
                let body = content(&text)?;
                path.endpoint(Op::Reply)?;
                self.check_exists(&path)?;
                (ActionKey::Reply(path.clone()), Call::Reply { path, body })
            }
        };
        if !self.in_flight.insert(key.clone()) {
            return Err(Error::Busy(key));
        }
        Ok(self.request(key, call))
    }

    fn request(&self, key: ActionKey, call: Call) -> Request {
        tracing::debug!(?key, lesson = %self.lesson, "prepared request");
        Request {
            generation: self.generation,
            key,
            call,
        }
    }

    /// Releases the lock of a request that will never be sent
    pub fn abandon(&mut self, request: Request) {
        if request.generation == self.generation {
            self.release(&request.key);
        }
    }

    fn release(&mut self, key: &ActionKey) {
        match key {
            ActionKey::LoadPage => self.pager.fail(),
            key => {
                self.in_flight.remove(key);
            }
        }
    }

    /// Reconciles a server response into the thread
    pub fn apply(&mut self, response: Response) -> Result<Applied, Error> {
        let Response {
            generation,
            key,
            result,
        } = response;
        if generation != self.generation {
            tracing::debug!(?key, "discarding response for a previous lesson");
            return Ok(Applied::Discarded);
        }
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(?key, error = %e, "request failed");
                self.release(&key);
                return Err(Error::Fetch(e));
            }
        };
        if key != ActionKey::LoadPage {
            self.in_flight.remove(&key);
        }
        Ok(match outcome {
            Outcome::Page { page, data } => {
                self.pager.finish(page, data.pages);
                self.total = data.total;
                let added = match page {
                    1 => {
                        self.comments = data.comments;
                        self.comments.len()
                    }
                    _ => self.append(data.comments),
                };
                Applied::Loaded { page, added }
            }
            Outcome::Created(c) => {
                let id = c.id.clone();
                self.comments.insert(0, c);
                self.total += 1;
                Applied::Posted(id)
            }
            Outcome::Comment(c) | Outcome::Thread(c) => {
                self.replace_comment(c);
                Applied::Changed(key)
            }
            Outcome::Reply { path, reply } => {
                self.replace_reply(&path, reply);
                Applied::Changed(key)
            }
            Outcome::Deleted(id) => {
                self.comments.retain(|c| c.id != id);
                self.total = self.total.saturating_sub(1);
                self.pager.note_removed();
                Applied::Changed(key)
            }
        })
    }

    /// Prepares, sends and applies `intent` in one go
    pub async fn run<R, I>(
        &mut self,
        remote: &R,
        identity: &I,
        intent: Intent,
    ) -> Result<Applied, Error>
    where
        R: Remote + ?Sized,
        I: Identity + ?Sized,
    {
        let request = self.prepare(identity, intent)?;
        let response = request.send(remote).await;
        self.apply(response)
    }

    /// Comments posted since the last load push older ones down a page, so a
    /// page may repeat what is already loaded
    fn append(&mut self, comments: Vec<Comment>) -> usize {
        let before = self.comments.len();
        for c in comments {
            if self.comments.iter().any(|known| known.id == c.id) {
                tracing::debug!(id = %c.id, "skipping comment already loaded");
                continue;
            }
            self.comments.push(c);
        }
        self.comments.len() - before
    }

    fn replace_comment(&mut self, comment: Comment) {
        match self.comments.iter_mut().find(|c| c.id == comment.id) {
            Some(slot) => *slot = comment,
            None => tracing::warn!(id = %comment.id, "server echoed a comment that is not loaded"),
        }
    }

    fn replace_reply(&mut self, path: &NodePath, reply: Reply) {
        let slot = self
            .comments
            .iter_mut()
            .find(|c| c.id == *path.comment_id())
            .and_then(|c| c.find_reply_mut(path.chain()));
        match slot {
            Some(slot) => *slot = reply,
            None => tracing::warn!(%path, "server echoed a reply that is not loaded"),
        }
    }
}
