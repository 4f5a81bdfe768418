use lessons_client::api::{Error, LessonId, NodePath, User, MAX_REPLY_DEPTH};
use lessons_mock_server::MockServer;
use rand::Rng;

const MIN_WORDS: usize = 4;
const MAX_WORDS: usize = 40;

pub fn authors() -> Vec<User> {
    vec![
        User::new("ada@example.com", "Ada Lovelace"),
        User::new("grace@example.com", "Grace Hopper"),
        User::new("alan@example.com", "Alan Turing"),
    ]
}

pub fn text<R: Rng>(rng: &mut R) -> String {
    lipsum::lipsum_words(rng.gen_range(MIN_WORDS..MAX_WORDS))
}

/// Posts `n` comments on `lesson`, each with a random reply tree
pub fn seed_lesson<R: Rng>(
    server: &MockServer,
    lesson: &LessonId,
    n: usize,
    rng: &mut R,
) -> Result<(), Error> {
    let authors = authors();
    for _ in 0..n {
        let author = &authors[rng.gen_range(0..authors.len())];
        let comment = server.insert_comment(lesson, author, &text(rng))?;
        seed_replies(server, &NodePath::comment(comment.id), &authors, rng)?;
    }
    Ok(())
}

// narrower as it goes deeper, so that trees stay small
fn seed_replies<R: Rng>(
    server: &MockServer,
    parent: &NodePath,
    authors: &[User],
    rng: &mut R,
) -> Result<(), Error> {
    if !parent.can_reply() {
        return Ok(());
    }
    for _ in 0..rng.gen_range(0..=MAX_REPLY_DEPTH - parent.depth()) {
        let author = &authors[rng.gen_range(0..authors.len())];
        let path = server.insert_reply(parent, author, &text(rng))?;
        seed_replies(server, &path, authors, rng)?;
    }
    Ok(())
}
