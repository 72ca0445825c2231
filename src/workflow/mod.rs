pub mod export_session;
pub mod message;
pub mod reconcile;

pub use export_session::ExportSession;
pub use message::{EventSink, ExportMessage};
pub use reconcile::reconcile;
