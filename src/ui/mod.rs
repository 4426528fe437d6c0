pub mod layout;
pub mod syntax;
pub mod widgets;

pub use layout::{centered_rect, AppLayout};
pub use syntax::Highlighter;
pub use widgets::*;
