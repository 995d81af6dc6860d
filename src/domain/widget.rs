use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single row of the `widgets` table.
///
/// Every read returns a fresh snapshot; nothing holds on to a `Widget` between calls.
/// `id` is assigned by the database on insert and is `0` on a widget that has not been
/// stored yet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct Widget {
    #[serde(default)]
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub location: Option<String>,
}

impl Widget {
    pub fn new(name: impl Into<String>, cost: f64) -> Self {
        Self {
            name: name.into(),
            cost,
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Copy of `self` carrying `id`; the four mutable fields are left untouched.
    pub fn with_id(&self, id: i32) -> Self {
        Self { id, ..self.clone() }
    }
}
