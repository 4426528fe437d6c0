mod action;
mod diff_view;
mod file_list;
mod help;
mod scroll;

pub use action::Action;
pub use diff_view::{truncate_or_pad, DiffView, DiffViewState};
pub use file_list::{FileEntry, FileList, FileListState};
pub use help::HelpModal;
pub use scroll::ScrollState;
