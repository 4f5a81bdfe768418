use crate::{
    api::{self, NodePath},
    ActionKey,
};

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("text must not be empty")]
    EmptyContent,

    #[error("no emoji selected")]
    EmptyEmoji,

    #[error("page {requested} cannot follow page {loaded}")]
    InvalidPage { requested: u32, loaded: u32 },
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("server refused the request: {0}")]
    Api(#[from] api::Error),

    #[error("network failure: {0}")]
    Transport(String),

    #[error("unexpected server response: {0}")]
    Decode(String),
}

/// Everything an action can fail with. None of these is fatal: the UI shows
/// them as a dismissible notice and the thread state stays as it was.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("you need to log in to do this")]
    AuthRequired,

    #[error("could not reach the server: {0}")]
    Fetch(#[from] FetchError),

    #[error("only the author can do this")]
    NotOwner,

    #[error("{0:?} is already in progress")]
    Busy(ActionKey),

    #[error("there are no more comments to load")]
    NoMorePages,

    #[error("{0} is not in the loaded thread")]
    UnknownNode(NodePath),

    #[error(transparent)]
    Api(api::Error),
}

impl From<api::Error> for Error {
    fn from(e: api::Error) -> Error {
        match e {
            api::Error::EmptyContent => Error::Validation(ValidationError::EmptyContent),
            e => Error::Api(e),
        }
    }
}
