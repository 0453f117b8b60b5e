//! Domain types shared by the bridge and the MCP server.

pub mod invocation;
pub mod issue;
pub mod page;
pub mod types;

pub use invocation::{ErrorKind, InvocationRequest, InvocationResult, InvocationStatus};
pub use issue::{IssueRecord, SubtaskEntry};
pub use page::{PageAction, PageDraft, PageRecord, PageRef};
pub use types::{ChatMessage, MessageRole};
