mod memory;
mod sqlite;
mod traits;

pub use memory::{MemoryRuleStore, MemoryStateStore};
pub use sqlite::{open_connection, SqliteRuleStore, SqliteStateStore, STATE_KEY};
pub use traits::{RuleStore, StateStore};
