use std::collections::HashMap;
use std::sync::Arc;

use common::DashboardError;
use common::models::FieldId;
#[cfg(test)]
use mockall::automock;
use parking_lot::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub class: Option<String>,
    pub color: Option<String>,
}

impl Style {
    pub fn class(class: &str) -> Self {
        Self {
            class: Some(class.to_string()),
            color: None,
        }
    }

    pub fn color(color: &str) -> Self {
        Self {
            class: None,
            color: Some(color.to_string()),
        }
    }
}

/// Host-provided page elements the presenters write into.
#[cfg_attr(test, automock)]
pub trait DisplayPort: Send {
    fn set_text(&mut self, field: FieldId, text: &str) -> Result<(), DashboardError>;

    fn set_visibility(&mut self, field: FieldId, visible: bool) -> Result<(), DashboardError>;

    fn set_style(&mut self, field: FieldId, style: Style) -> Result<(), DashboardError>;

    fn set_value(&mut self, field: FieldId, value: f64) -> Result<(), DashboardError>;
}

/// Logs a failed field write and carries on with the rest of the panel.
pub(crate) fn skip_on_error(result: Result<(), DashboardError>) {
    if let Err(e) = result {
        warn!("Skipping display write: {}", e);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    pub text: Option<String>,
    pub visible: bool,
    pub style: Style,
    pub value: Option<f64>,
}

impl Default for FieldState {
    fn default() -> Self {
        Self {
            text: None,
            visible: true,
            style: Style::default(),
            value: None,
        }
    }
}

/// In-process page: a shared map of the mounted fields.
#[derive(Clone, Default)]
pub struct MemoryDisplay {
    fields: Arc<RwLock<HashMap<FieldId, FieldState>>>,
}

impl MemoryDisplay {
    /// Every field the dashboard page defines.
    pub fn page() -> Self {
        Self::with_fields(FieldId::ALL)
    }

    pub fn with_fields(fields: impl IntoIterator<Item = FieldId>) -> Self {
        let fields = fields
            .into_iter()
            .map(|f| (f, FieldState::default()))
            .collect();
        Self {
            fields: Arc::new(RwLock::new(fields)),
        }
    }

    pub fn field(&self, field: FieldId) -> Option<FieldState> {
        self.fields.read().get(&field).cloned()
    }

    pub fn text(&self, field: FieldId) -> Option<String> {
        self.field(field).and_then(|f| f.text)
    }

    pub fn is_visible(&self, field: FieldId) -> bool {
        self.field(field).is_some_and(|f| f.visible)
    }

    fn modify(
        &self,
        field: FieldId,
        f: impl FnOnce(&mut FieldState),
    ) -> Result<(), DashboardError> {
        let mut fields = self.fields.write();
        let state = fields
            .get_mut(&field)
            .ok_or(DashboardError::MissingField(field))?;
        f(state);
        Ok(())
    }
}

impl DisplayPort for MemoryDisplay {
    fn set_text(&mut self, field: FieldId, text: &str) -> Result<(), DashboardError> {
        debug!(field = %field, "{}", text);
        self.modify(field, |state| state.text = Some(text.to_string()))
    }

    fn set_visibility(&mut self, field: FieldId, visible: bool) -> Result<(), DashboardError> {
        debug!(field = %field, visible, "visibility");
        self.modify(field, |state| state.visible = visible)
    }

    fn set_style(&mut self, field: FieldId, style: Style) -> Result<(), DashboardError> {
        self.modify(field, |state| {
            if style.class.is_some() {
                state.style.class = style.class;
            }
            if style.color.is_some() {
                state.style.color = style.color;
            }
        })
    }

    fn set_value(&mut self, field: FieldId, value: f64) -> Result<(), DashboardError> {
        self.modify(field, |state| state.value = Some(value))
    }
}
