//! Domain core of the developer forum: records, votes, threads and the store they live in.

pub mod error;
pub mod leaderboard;
pub mod ledger;
pub mod models;
pub mod password;
pub mod retry;
pub mod search;
pub mod services;
pub mod store;
pub mod thread;

pub use error::{ForumError, ForumResult};
pub use leaderboard::{AuthorStats, LeaderboardEntry, PostingExtremes};
pub use ledger::VoteLedger;
pub use services::ServiceRegistry;
pub use store::{RecordStore, StoreError, StoreHandle};
pub use thread::{ThreadReply, ThreadView};
