//! Domain types served by the widget API.

pub mod widget;

pub use widget::Widget;
