pub mod app;
pub mod domain;
pub mod infra;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{DataAccessError, DataAccessResult, DataLayer, WidgetStore};
pub use domain::Widget;
pub use infra::{logging, Config, DeployMode};
