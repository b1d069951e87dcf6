pub mod channel;
pub mod document;
pub mod record;
pub mod user;

pub use channel::Channel;
pub use document::{DocKind, Document};
pub use record::{Record, RecordKind, RecordView, VoteChoice, VoteTally};
pub use user::{Identity, Role, User, UserProfile};
