//! Core data model: widgets, rectangles, windows, matchers, and the wire
//! envelope shared by the API dispatcher and the IPC transactor.

pub mod matcher;
pub mod rect;
pub mod selector;
pub mod widget;
pub mod window;
pub mod wire;

pub use matcher::{MatchPattern, WidgetMatchModel};
pub use rect::Rect;
pub use selector::Selector;
pub use widget::Widget;
pub use window::Window;
pub use wire::{ApiCallInfo, ApiReplyInfo};
