pub mod data_layer;
pub mod error;
pub mod procedure;

pub use data_layer::{DataLayer, WidgetStore};
pub use error::{DataAccessError, DataAccessResult};
