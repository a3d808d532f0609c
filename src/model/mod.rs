mod application_view;
mod process_view;
mod service_view;
mod tick_snapshot;

pub use application_view::ApplicationView;
pub use process_view::ProcessView;
pub use service_view::ServiceView;
pub use tick_snapshot::*;
