pub mod accounts;
pub mod forum;

pub use accounts::{AccountService, ProfileUpdate, Registration};
pub use forum::{ForumService, NewPost, NewReply, RecordSet};

use crate::ledger::VoteLedger;
use crate::store::StoreHandle;

/// The domain services sharing one store handle
#[derive(Clone)]
pub struct ServiceRegistry {
    pub accounts: AccountService,
    pub forum: ForumService,
    pub ledger: VoteLedger,
}

impl ServiceRegistry {
    pub fn new(store: StoreHandle, admins: impl IntoIterator<Item = String>) -> Self {
        Self {
            accounts: AccountService::new(store.clone(), admins),
            forum: ForumService::new(store.clone()),
            ledger: VoteLedger::new(store),
        }
    }
}
