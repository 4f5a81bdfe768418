/// Emojis offered by the reaction picker, in display order
pub const EMOJI_CATALOG: [&str; 6] = ["👍", "❤️", "😂", "😮", "😢", "🙏"];

pub fn is_catalog_emoji(emoji: &str) -> bool {
    EMOJI_CATALOG.contains(&emoji)
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub emoji: String,
    pub user_email: String,
}

impl Reaction {
    pub fn new(emoji: impl Into<String>, user_email: impl Into<String>) -> Reaction {
        Reaction {
            emoji: emoji.into(),
            user_email: user_email.into(),
        }
    }
}
