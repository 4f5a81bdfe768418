use crate::api::{is_catalog_emoji, Reaction, EMOJI_CATALOG};

/// How one emoji is displayed under a comment or reply
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReactionGroup {
    pub emoji: String,
    pub count: usize,

    /// Whether the current user reacted with this emoji
    pub is_mine: bool,

    /// False for emojis the picker does not offer, which get a generic display
    pub in_catalog: bool,
}

/// Groups reactions by emoji: catalog emojis first in catalog order, then the
/// others in order of first appearance. Records are counted as given, the
/// one-reaction-per-user rule is the server's to enforce.
pub fn group_reactions(reactions: &[Reaction], me: Option<&str>) -> Vec<ReactionGroup> {
    let mut groups: Vec<ReactionGroup> = Vec::new();
    for r in reactions {
        let is_mine = me.map_or(false, |me| r.user_email == me);
        match groups.iter_mut().find(|g| g.emoji == r.emoji) {
            Some(g) => {
                g.count += 1;
                g.is_mine |= is_mine;
            }
            None => groups.push(ReactionGroup {
                emoji: r.emoji.clone(),
                count: 1,
                is_mine,
                in_catalog: is_catalog_emoji(&r.emoji),
            }),
        }
    }
    groups.sort_by_key(|g| {
        EMOJI_CATALOG
            .iter()
            .position(|e| *e == g.emoji)
            .unwrap_or(EMOJI_CATALOG.len())
    });
    groups
}

/// The emoji the current user reacted with, if any
pub fn my_reaction<'a>(reactions: &'a [Reaction], me: Option<&str>) -> Option<&'a str> {
    let me = me?;
    reactions
        .iter()
        .find(|r| r.user_email == me)
        .map(|r| r.emoji.as_str())
}
