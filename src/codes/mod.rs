//! CAMEO code vocabulary: event codes, actor codes and the table that
//! defines which of them exist.

pub mod actor;
pub mod event;
pub mod table;

pub use actor::{ActorCode, Trigram, MAX_TRIGRAMS};
pub use event::EventCode;
pub use table::{AuditFinding, CodeKind, CodeMeta, CodeTable};
