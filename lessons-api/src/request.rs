use crate::Comment;

/// Body of every create and update call
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewContent {
    pub content: String,
}

/// Body of a reaction toggle: the client sends the intent, the server decides
/// whether it adds, replaces or removes the user's reaction
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewReaction {
    pub emoji: String,
}

/// Envelope of the calls that echo the whole top-level comment
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ThreadEcho {
    pub comment: Comment,
}
