pub mod js_executor;
pub mod page_view;
pub mod view;

pub use js_executor::JsExecutor;
pub use page_view::PageView;
pub use view::{RenderedView, ScrollPosition};
