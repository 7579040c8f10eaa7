//! Built-in tools

mod bash;
mod done;
mod memory;
mod modifier;
mod thinking;

pub use bash::{BashTool, MAX_OUTPUT_BYTES, truncate_output};
pub use done::DoneTool;
pub use memory::{InMemoryStore, MemoryEntry, MemoryStore, MemoryTool, basic_summary};
pub use modifier::{ModifierTool, insert_at, replace_all};
pub use thinking::ThinkingTool;
