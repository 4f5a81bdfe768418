mod confirm;
pub use confirm::{Confirm, Confirmed};

mod error;
pub use error::{Error, FetchError, ValidationError};

mod http;
pub use http::{Config, HttpRemote};

mod identity;
pub use identity::{Anonymous, Identity};

mod node;
pub use node::{walk, NodeRef};

mod pager;
pub use pager::{Pager, PagerState};

mod reaction;
pub use reaction::{group_reactions, my_reaction, ReactionGroup};

mod remote;
pub use remote::Remote;

mod store;
pub use store::{ActionKey, Applied, Intent, Request, Response, ThreadStore};

pub mod api {
    pub use lessons_api::*;
}
