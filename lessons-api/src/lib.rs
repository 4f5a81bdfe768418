use chrono::Utc;

pub use http::Method;

mod comment;
pub use comment::{Comment, CommentId, Remark, Reply, ReplyId};

mod error;
pub use error::Error;

mod lesson;
pub use lesson::{CommentPage, LessonId, PAGE_SIZE};

mod path;
pub use path::{Echo, Endpoint, NodePath, Op, MAX_REPLY_DEPTH};

mod reaction;
pub use reaction::{is_catalog_emoji, Reaction, EMOJI_CATALOG};

mod request;
pub use request::{NewContent, NewReaction, ThreadEcho};

mod user;
pub use user::User;

pub type Time = chrono::DateTime<Utc>;

pub fn validate_string(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::NullByteInString(String::from(s)));
    }
    Ok(())
}

/// Returns the trimmed text, refusing whitespace-only content
pub fn validate_content(s: &str) -> Result<&str, Error> {
    validate_string(s)?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyContent);
    }
    Ok(trimmed)
}

/// Ids are spliced into resource paths, so they must stay a single segment
pub fn validate_id(id: &str) -> Result<(), Error> {
    if id.is_empty() || id.contains(|c| matches!(c, '/' | '?' | '#' | '\0')) {
        return Err(Error::InvalidId(String::from(id)));
    }
    Ok(())
}
