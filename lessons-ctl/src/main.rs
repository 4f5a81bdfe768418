use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Context};
use lessons_client::{
    api::{CommentId, LessonId, NodePath, ReplyId, User},
    group_reactions, Anonymous, Applied, Config, Confirm, Confirmed, HttpRemote, Identity, Intent,
    NodeRef, ThreadStore,
};

#[derive(structopt::StructOpt)]
struct Opt {
    /// Base url of the comments api
    #[structopt(short, long)]
    host: String,

    /// Email of the user LESSONS_TOKEN belongs to
    #[structopt(short, long)]
    email: Option<String>,

    /// Retries for transient failures
    #[structopt(long, default_value = "3")]
    retries: u32,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
struct Target {
    lesson: String,

    /// Top-level comment the node belongs to
    comment: String,

    /// Reply ids from depth 1 downwards, to address a reply
    #[structopt(short, long = "reply")]
    replies: Vec<String>,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Show the comments of a lesson
    List {
        lesson: String,

        /// Load every page instead of only the first one
        #[structopt(long)]
        all: bool,
    },

    /// Post a top-level comment
    Post { lesson: String, text: String },

    /// Edit one of your comments or replies
    Edit {
        #[structopt(flatten)]
        target: Target,
        text: String,
    },

    /// Delete one of your comments or replies
    Delete {
        #[structopt(flatten)]
        target: Target,

        /// Do not ask for confirmation
        #[structopt(short, long)]
        yes: bool,
    },

    /// Toggle your reaction on a comment or reply
    React {
        #[structopt(flatten)]
        target: Target,
        emoji: String,
    },

    /// Reply to a comment or reply
    Reply {
        #[structopt(flatten)]
        target: Target,
        text: String,
    },
}

impl Target {
    fn path(&self) -> anyhow::Result<NodePath> {
        let mut path = NodePath::comment(CommentId(self.comment.clone()));
        for r in &self.replies {
            path = path
                .child(ReplyId(r.clone()))
                .with_context(|| format!("addressing reply {r}"))?;
        }
        Ok(path)
    }
}

struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if let Err(err) = io::stdout().flush() {
            tracing::warn!(?err, "flushing prompt");
        }
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) => matches!(line.trim(), "y" | "Y" | "yes"),
            Err(err) => {
                tracing::warn!(?err, "reading confirmation");
                false
            }
        }
    }
}

fn session_token() -> anyhow::Result<String> {
    std::env::var("LESSONS_TOKEN").context("retrieving LESSONS_TOKEN environment variable")
}

/// Loads pages of the target's lesson until the target node shows up
async fn open(remote: &HttpRemote, target: &Target) -> anyhow::Result<(ThreadStore, NodePath)> {
    let path = target.path()?;
    let mut store = ThreadStore::new(LessonId(target.lesson.clone()));
    store
        .run(remote, &Anonymous, Intent::LoadPage(1))
        .await
        .context("loading comments")?;
    while store.find(&path).is_none() {
        if !store.has_more() {
            return Err(anyhow!("no node {path} on lesson {}", store.lesson()));
        }
        store
            .run(remote, &Anonymous, Intent::LoadMore)
            .await
            .with_context(|| format!("loading page {}", store.page() + 1))?;
    }
    Ok((store, path))
}

fn render<I: Identity>(store: &ThreadStore, me: &I) {
    println!(
        "{} comments on lesson {}, page {} of {}",
        store.total(),
        store.lesson(),
        store.page(),
        store.pager().pages()
    );
    for (path, node) in store.nodes() {
        let indent = "    ".repeat(path.depth());
        let remark = node.remark();
        let author = match remark.author_name.is_empty() {
            true => &remark.author_email,
            false => &remark.author_name,
        };
        println!(
            "{indent}[{path}] {author}, {}",
            remark.created_at.format("%Y-%m-%d %H:%M")
        );
        println!("{indent}  {}", remark.content);

        let groups = group_reactions(&remark.reactions, me.current_user_email());
        if !groups.is_empty() {
            let groups = groups
                .iter()
                .map(|g| match g.is_mine {
                    true => format!("{} {} (you)", g.emoji, g.count),
                    false => format!("{} {}", g.emoji, g.count),
                })
                .collect::<Vec<_>>();
            println!("{indent}  {}", groups.join("  "));
        }

        let mut actions = Vec::new();
        if let NodeRef::Comment(c) = node {
            match c.reply_count() {
                0 => (),
                1 => actions.push(String::from("1 reply")),
                n => actions.push(format!("{n} replies")),
            }
        }
        if me.is_logged_in() && store.can_reply(&path) {
            actions.push(String::from("reply"));
        }
        if store.can_edit(&path, me) {
            actions.push(String::from("edit"));
            actions.push(String::from("delete"));
        }
        if !actions.is_empty() {
            println!("{indent}  [{}]", actions.join(", "));
        }
    }
    if store.has_more() {
        println!("(more comments, pass --all to see them)");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opt = <Opt as structopt::StructOpt>::from_args();

    let token = match opt.cmd {
        Command::List { .. } => session_token().ok(),
        _ => Some(session_token()?),
    };
    let remote = HttpRemote::new(Config {
        host: opt.host,
        token,
        max_retries: opt.retries,
    });
    let me = opt.email.map(|email| User::new(email, ""));

    match opt.cmd {
        Command::List { lesson, all } => {
            let mut store = ThreadStore::new(LessonId(lesson));
            store
                .run(&remote, &Anonymous, Intent::LoadPage(1))
                .await
                .context("loading comments")?;
            while all && store.has_more() {
                store
                    .run(&remote, &Anonymous, Intent::LoadMore)
                    .await
                    .with_context(|| format!("loading page {}", store.page() + 1))?;
            }
            render(&store, &me);
        }
        Command::Post { lesson, text } => {
            let mut store = ThreadStore::new(LessonId(lesson));
            if let Applied::Posted(id) = store
                .run(&remote, &me, Intent::Post(text))
                .await
                .context("posting comment")?
            {
                println!("Posted comment {id}");
            }
        }
        Command::Edit { target, text } => {
            let (mut store, path) = open(&remote, &target).await?;
            store
                .run(&remote, &me, Intent::Edit { path: path.clone(), text })
                .await
                .with_context(|| format!("editing {path}"))?;
            println!("Edited {path}");
        }
        Command::Delete { target, yes } => {
            let (mut store, path) = open(&remote, &target).await?;
            let prompt = match path.is_comment() {
                true => "Delete this comment and all its replies?",
                false => "Delete this reply and all its replies?",
            };
            let confirmed = match yes {
                true => Confirmed::ask(&mut |_: &str| true, prompt),
                false => Confirmed::ask(&mut StdinConfirm, prompt),
            };
            let confirmed = match confirmed {
                Some(c) => c,
                None => {
                    println!("Nothing deleted");
                    return Ok(());
                }
            };
            store
                .run(&remote, &me, Intent::Delete { path: path.clone(), confirmed })
                .await
                .with_context(|| format!("deleting {path}"))?;
            println!("Deleted {path}, {} comments left", store.total());
        }
        Command::React { target, emoji } => {
            let (mut store, path) = open(&remote, &target).await?;
            store
                .run(&remote, &me, Intent::React { path: path.clone(), emoji })
                .await
                .with_context(|| format!("reacting to {path}"))?;
            let groups = store
                .find(&path)
                .map(|n| group_reactions(&n.remark().reactions, me.current_user_email()))
                .unwrap_or_default();
            let groups = groups
                .iter()
                .map(|g| format!("{} {}", g.emoji, g.count))
                .collect::<Vec<_>>();
            println!("Reactions on {path}: {}", groups.join("  "));
        }
        Command::Reply { target, text } => {
            let (mut store, path) = open(&remote, &target).await?;
            store
                .run(&remote, &me, Intent::Reply { path: path.clone(), text })
                .await
                .with_context(|| format!("replying to {path}"))?;
            let count = store
                .comment(path.comment_id())
                .map(|c| c.reply_count())
                .unwrap_or(0);
            println!("Replied to {path}, the thread now has {count} replies");
        }
    }

    Ok(())
}
