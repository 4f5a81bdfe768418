use lessons_client::{
    api::{self, LessonId, NodePath, Reaction, User},
    group_reactions, ActionKey, Applied, Confirmed, Error, FetchError, Intent, ReactionGroup,
    ThreadStore, ValidationError,
};
use lessons_mock_server::MockServer;
use rand::SeedableRng;

use crate::seed;

fn lesson() -> LessonId {
    LessonId(String::from("intro-to-rust"))
}

fn ada() -> User {
    User::new("ada@example.com", "Ada Lovelace")
}

fn grace() -> User {
    User::new("grace@example.com", "Grace Hopper")
}

/// A store for `user` with the first page loaded
async fn open(server: &MockServer, user: &User) -> ThreadStore {
    let mut store = ThreadStore::new(lesson());
    store
        .run(&server.as_user(user.clone()), user, Intent::LoadPage(1))
        .await
        .expect("loading page 1");
    store
}

fn confirmed() -> Confirmed {
    Confirmed::ask(&mut |_: &str| true, "Delete?").expect("confirming")
}

#[tokio::test]
async fn posting_to_an_empty_lesson() {
    let server = MockServer::new();
    let mut store = open(&server, &ada()).await;
    assert_eq!((store.total(), store.has_more()), (0, false));

    let applied = store
        .run(
            &server.as_user(ada()),
            &ada(),
            Intent::Post(String::from("Great lesson!")),
        )
        .await
        .expect("posting");
    let on_server = server.test_comments(&lesson());
    assert_eq!(applied, Applied::Posted(on_server[0].id.clone()));
    assert_eq!(store.comments(), on_server.as_slice());
    assert_eq!(store.total(), 1);
    assert_eq!(store.comments()[0].remark.content, "Great lesson!");
    assert_eq!(store.comments()[0].remark.author_name, "Ada Lovelace");
}

#[tokio::test]
async fn invalid_input_never_reaches_the_server() {
    let server = MockServer::new();
    let mut store = open(&server, &ada()).await;
    let calls = server.test_num_calls();

    assert_eq!(
        store
            .run(&server.as_user(ada()), &ada(), Intent::Post(String::from(" \n\t ")))
            .await,
        Err(Error::Validation(ValidationError::EmptyContent))
    );
    assert_eq!(
        store
            .run(&server.anonymous(), &None::<User>, Intent::Post(String::from("hi")))
            .await,
        Err(Error::AuthRequired)
    );
    assert_eq!(server.test_num_calls(), calls);
    assert!(store.comments().is_empty());
}

#[tokio::test]
async fn pages_accumulate_until_the_last_one() {
    let server = MockServer::new();
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    seed::seed_lesson(&server, &lesson(), 25, &mut rng).expect("seeding lesson");
    let session = server.anonymous();
    let anonymous = None::<User>;

    let mut store = ThreadStore::new(lesson());
    assert_eq!(
        store.run(&session, &anonymous, Intent::LoadPage(1)).await,
        Ok(Applied::Loaded { page: 1, added: 10 })
    );
    assert!(store.has_more());
    assert_eq!(
        store.run(&session, &anonymous, Intent::LoadMore).await,
        Ok(Applied::Loaded { page: 2, added: 10 })
    );
    assert_eq!(
        store.run(&session, &anonymous, Intent::LoadMore).await,
        Ok(Applied::Loaded { page: 3, added: 5 })
    );
    assert_eq!((store.page(), store.total(), store.has_more()), (3, 25, false));
    assert_eq!(store.comments(), server.test_comments(&lesson()).as_slice());

    let calls = server.test_num_calls();
    assert_eq!(
        store.run(&session, &anonymous, Intent::LoadMore).await,
        Err(Error::NoMorePages)
    );
    assert_eq!(server.test_num_calls(), calls);

    // a reload replaces the accumulated list with the first page
    assert_eq!(
        store.run(&session, &anonymous, Intent::LoadPage(1)).await,
        Ok(Applied::Loaded { page: 1, added: 10 })
    );
    assert_eq!(store.comments().len(), 10);
    assert!(store.has_more());
}

#[tokio::test]
async fn switching_reaction_shows_only_the_new_emoji() {
    let server = MockServer::new();
    let c1 = server
        .insert_comment(&lesson(), &ada(), "Great lesson!")
        .expect("seeding comment");
    let path = NodePath::comment(c1.id.clone());
    let grace_session = server.as_user(grace());
    let mut store = open(&server, &grace()).await;
    let react = |emoji: &str| Intent::React {
        path: path.clone(),
        emoji: String::from(emoji),
    };
    let groups = |store: &ThreadStore| {
        store
            .find(&path)
            .map(|n| group_reactions(&n.remark().reactions, Some(grace().email.as_str())))
            .expect("finding c1")
    };

    store
        .run(&grace_session, &grace(), react("👍"))
        .await
        .expect("reacting");
    assert_eq!(
        groups(&store),
        vec![ReactionGroup {
            emoji: String::from("👍"),
            count: 1,
            is_mine: true,
            in_catalog: true,
        }]
    );

    store
        .run(&grace_session, &grace(), react("❤️"))
        .await
        .expect("switching reaction");
    assert_eq!(
        store.comment(&c1.id).map(|c| c.remark.reactions.clone()),
        Some(vec![Reaction::new("❤️", "grace@example.com")])
    );
    let groups = groups(&store);
    assert_eq!(groups.len(), 1);
    assert_eq!((groups[0].emoji.as_str(), groups[0].count), ("❤️", 1));

    store
        .run(&grace_session, &grace(), react("❤️"))
        .await
        .expect("removing reaction");
    assert_eq!(store.comment(&c1.id).map(|c| c.remark.reactions.len()), Some(0));
}

#[tokio::test]
async fn replies_are_addressed_by_their_ancestors() {
    let server = MockServer::new();
    let c1 = server
        .insert_comment(&lesson(), &ada(), "Great lesson!")
        .expect("seeding comment");
    let r1 = server
        .insert_reply(&NodePath::comment(c1.id.clone()), &grace(), "Agreed")
        .expect("seeding reply");
    let mut store = open(&server, &ada()).await;
    let ada_session = server.as_user(ada());

    store
        .run(
            &ada_session,
            &ada(),
            Intent::Reply {
                path: r1.clone(),
                text: String::from("Thanks!"),
            },
        )
        .await
        .expect("replying to r1");
    let r1_id = r1.reply_id().expect("r1 is a reply");
    assert_eq!(
        server.test_calls().last(),
        Some(&format!("POST /comments/{}/replies/{r1_id}/replies", c1.id))
    );

    let r2 = store
        .nodes()
        .map(|(p, _)| p)
        .find(|p| p.depth() == 2)
        .expect("new depth-2 reply");
    assert_eq!(r2.parent_reply_id(), Some(r1_id));
    assert_eq!(
        store.find(&r2).map(|n| n.remark().content.as_str()),
        Some("Thanks!")
    );
    assert!(store.can_reply(&r2));

    store
        .run(
            &ada_session,
            &ada(),
            Intent::Reply {
                path: r2.clone(),
                text: String::from("One more level"),
            },
        )
        .await
        .expect("replying to r2");
    let r3 = store
        .nodes()
        .map(|(p, _)| p)
        .find(|p| p.depth() == 3)
        .expect("new depth-3 reply");
    assert_eq!(r3.parent_nested_reply_id(), r2.reply_id());
    assert!(!store.can_reply(&r3));

    let calls = server.test_num_calls();
    assert_eq!(
        store
            .run(
                &ada_session,
                &ada(),
                Intent::Reply {
                    path: r3,
                    text: String::from("Too deep"),
                },
            )
            .await,
        Err(Error::Api(api::Error::ReplyDepthExceeded))
    );
    assert_eq!(server.test_num_calls(), calls);
    assert_eq!(store.comment(&c1.id).map(|c| c.reply_count()), Some(3));
}

#[tokio::test]
async fn deletion_needs_confirmation() {
    let server = MockServer::new();
    for text in ["first", "second"] {
        server
            .insert_comment(&lesson(), &ada(), text)
            .expect("seeding comment");
    }
    let mut store = open(&server, &ada()).await;
    let target = store.comments()[0].id.clone();
    let calls = server.test_num_calls();

    let mut decline = |_: &str| false;
    assert!(Confirmed::ask(&mut decline, "Delete this comment?").is_none());
    assert_eq!(server.test_num_calls(), calls);
    assert_eq!(store.total(), 2);

    store
        .run(
            &server.as_user(ada()),
            &ada(),
            Intent::Delete {
                path: NodePath::comment(target.clone()),
                confirmed: confirmed(),
            },
        )
        .await
        .expect("deleting");
    assert_eq!(
        server.test_calls()[calls..],
        [format!("DELETE /comments/{target}")]
    );
    assert_eq!(store.total(), 1);
    assert!(store.comment(&target).is_none());
    assert_eq!(store.comments(), server.test_comments(&lesson()).as_slice());
}

#[tokio::test]
async fn loading_more_after_a_deletion_skips_nothing() {
    let server = MockServer::new();
    for i in 0..25 {
        server
            .insert_comment(&lesson(), &ada(), &format!("comment {i}"))
            .expect("seeding comment");
    }
    let mut store = open(&server, &ada()).await;
    let session = server.as_user(ada());
    store
        .run(&session, &ada(), Intent::LoadMore)
        .await
        .expect("loading page 2");

    let target = store.comments()[3].id.clone();
    store
        .run(
            &session,
            &ada(),
            Intent::Delete {
                path: NodePath::comment(target),
                confirmed: confirmed(),
            },
        )
        .await
        .expect("deleting");

    // "comment 4" slid from page 3 onto page 2
    assert_eq!(
        store.run(&session, &ada(), Intent::LoadMore).await,
        Ok(Applied::Loaded { page: 2, added: 1 })
    );
    assert_eq!(
        server.test_calls().last(),
        Some(&format!("GET /lessons/{}/comments?page=2&limit=10", lesson()))
    );
    while store.has_more() {
        store
            .run(&session, &ada(), Intent::LoadMore)
            .await
            .expect("loading more");
    }
    assert_eq!(store.comments(), server.test_comments(&lesson()).as_slice());
    assert_eq!(store.total(), 24);
}

#[tokio::test]
async fn deleting_a_reply_refreshes_the_thread() {
    let server = MockServer::new();
    let c1 = server
        .insert_comment(&lesson(), &grace(), "Great lesson!")
        .expect("seeding comment");
    let r1 = server
        .insert_reply(&NodePath::comment(c1.id.clone()), &grace(), "Agreed")
        .expect("seeding r1");
    let r2 = server
        .insert_reply(&r1, &ada(), "Me too")
        .expect("seeding r2");
    let mut store = open(&server, &ada()).await;

    assert_eq!(
        store
            .run(
                &server.as_user(ada()),
                &ada(),
                Intent::Delete {
                    path: r1.clone(),
                    confirmed: confirmed(),
                },
            )
            .await,
        Err(Error::NotOwner)
    );
    store
        .run(
            &server.as_user(ada()),
            &ada(),
            Intent::Delete {
                path: r2.clone(),
                confirmed: confirmed(),
            },
        )
        .await
        .expect("deleting r2");
    assert!(store.find(&r2).is_none());
    assert_eq!(store.find(&r1).map(|n| n.replies().len()), Some(0));
    assert_eq!(store.total(), 1);
}

#[tokio::test]
async fn different_actions_run_concurrently() {
    let server = MockServer::new();
    let c1 = server
        .insert_comment(&lesson(), &ada(), "first")
        .expect("seeding c1");
    let c2 = server
        .insert_comment(&lesson(), &grace(), "second")
        .expect("seeding c2");
    let mut store = open(&server, &ada()).await;
    let session = server.as_user(ada());

    let edit = store
        .prepare(
            &ada(),
            Intent::Edit {
                path: NodePath::comment(c1.id.clone()),
                text: String::from("first, edited"),
            },
        )
        .expect("preparing edit");
    let react = store
        .prepare(
            &ada(),
            Intent::React {
                path: NodePath::comment(c2.id.clone()),
                emoji: String::from("🙏"),
            },
        )
        .expect("preparing reaction");
    assert_eq!(
        store
            .prepare(
                &ada(),
                Intent::React {
                    path: NodePath::comment(c2.id.clone()),
                    emoji: String::from("👍"),
                },
            )
            .map(|_| ()),
        Err(Error::Busy(ActionKey::React(NodePath::comment(c2.id.clone()))))
    );

    assert_eq!(edit.key(), &ActionKey::Edit(NodePath::comment(c1.id.clone())));
    let (edited, reacted) = futures::join!(edit.send(&session), react.send(&session));
    assert_eq!(reacted.key(), &ActionKey::React(NodePath::comment(c2.id.clone())));
    store.apply(reacted).expect("applying reaction");
    store.apply(edited).expect("applying edit");

    assert_eq!(
        store.comment(&c1.id).map(|c| c.remark.content.as_str()),
        Some("first, edited")
    );
    assert_eq!(
        store.comment(&c2.id).map(|c| c.remark.reactions.clone()),
        Some(vec![Reaction::new("🙏", "ada@example.com")])
    );
    assert!(!store.is_busy(&ActionKey::React(NodePath::comment(c2.id))));
    assert_eq!(server.test_num_calls(), 3);
}

#[tokio::test]
async fn late_responses_do_not_leak_into_another_lesson() {
    let server = MockServer::new();
    let mut store = open(&server, &ada()).await;
    let session = server.as_user(ada());

    let post = store
        .prepare(&ada(), Intent::Post(String::from("posted on the first lesson")))
        .expect("preparing post");
    let other = LessonId(String::from("ownership"));
    store.switch_lesson(other.clone());
    let load = store
        .prepare(&ada(), Intent::LoadPage(1))
        .expect("loading the new lesson");

    let (posted, loaded) = futures::join!(post.send(&session), load.send(&session));
    assert_eq!(store.apply(posted), Ok(Applied::Discarded));
    assert_eq!(store.apply(loaded), Ok(Applied::Loaded { page: 1, added: 0 }));
    assert_eq!(store.lesson(), &other);
    assert!(store.comments().is_empty());
    assert_eq!(store.total(), 0);
    assert_eq!(server.test_comments(&lesson()).len(), 1);
}

#[tokio::test]
async fn failed_calls_keep_the_thread_as_it_was() {
    let server = MockServer::new();
    let c1 = server
        .insert_comment(&lesson(), &ada(), "original")
        .expect("seeding comment");
    let mut store = open(&server, &ada()).await;
    let session = server.as_user(ada());
    let before = store.comments().to_vec();
    let edit = || Intent::Edit {
        path: NodePath::comment(c1.id.clone()),
        text: String::from("rewritten"),
    };

    server.test_fail_next(1);
    assert!(matches!(
        store.run(&session, &ada(), edit()).await,
        Err(Error::Fetch(FetchError::Transport(_)))
    ));
    assert_eq!(store.comments(), before.as_slice());
    assert!(!store.is_busy(&ActionKey::Edit(NodePath::comment(c1.id.clone()))));

    // the server stays the authority on who may edit
    let impostor = server.as_user(grace());
    assert_eq!(
        store.run(&impostor, &ada(), edit()).await,
        Err(Error::Fetch(FetchError::Api(api::Error::PermissionDenied)))
    );
    assert_eq!(store.comments(), before.as_slice());

    store
        .run(&session, &ada(), edit())
        .await
        .expect("retrying the edit");
    assert_eq!(
        store.comment(&c1.id).map(|c| c.remark.content.as_str()),
        Some("rewritten")
    );
}
