//! What widgets report back to the App after handling a key

/// Actions that widgets can return from key handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Key was handled internally
    None,
    /// Key was not handled, pass to parent
    Ignored,
    /// The file list cursor moved to another file
    SelectionChanged,
    /// Enter on a file
    FileSelected(String),
}
