//! Diff presentation engine
//!
//! Two independent producers of [`DiffLine`] sequences, the whole-text
//! aligner and the unified-diff parser, and the adapters that turn a
//! sequence into unified or split display rows.

mod align;
mod cleanup;
mod model;
mod session;
mod unified;
mod view;

pub use model::{DiffLine, DiffStats, LineKind};
pub use session::{DiffSession, DiffSource};
pub use unified::parse_hunk_header;
pub use view::{side_lines, to_unified_view, DiffViewMode, Side, SplitView};
