pub mod render;
pub mod snapshot;
pub mod store;

pub use render::{BoardLayout, RefreshMode, render_text};
pub use snapshot::{BoardSnapshot, Trigger};
pub use store::BoardStore;
