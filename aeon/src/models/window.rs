//! Observing windows.

use serde::{Deserialize, Serialize};

use crate::error::{ModelResult, ValidationError};
use crate::models::rules;
use crate::models::time::TimeValue;

/// How a [`Window`] treats an `end` that does not follow its `start`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowOrdering {
    /// `end` must be strictly after `start` when both are set.
    #[default]
    Strict,
    /// Ordering is left to the remote scheduler.
    Advisory,
}

/// A period during which an observation may be scheduled.
///
/// `start` is optional (open start); `end` is required. Windows read from a
/// payload always use [`WindowOrdering::Strict`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct Window {
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<TimeValue>,
    end: TimeValue,
    #[serde(skip)]
    ordering: WindowOrdering,
}

crate::validated_fields! {
    Window {
        start / set_start: Option<TimeValue> = |_| Ok(());
        end / set_end: TimeValue = |_| Ok(());
    } cross Window::check_order
}

impl Window {
    pub fn new(start: Option<TimeValue>, end: impl Into<TimeValue>) -> ModelResult<Self> {
        Self::with_ordering(start, end, WindowOrdering::Strict)
    }

    pub fn with_ordering(
        start: Option<TimeValue>,
        end: impl Into<TimeValue>,
        ordering: WindowOrdering,
    ) -> ModelResult<Self> {
        let window = Self {
            start,
            end: end.into(),
            ordering,
        };
        window.validate_fields()?;
        Ok(window)
    }

    /// Window that is open from now until `end`.
    pub fn until(end: impl Into<TimeValue>) -> ModelResult<Self> {
        Self::new(None, end)
    }

    pub fn ordering(&self) -> WindowOrdering {
        self.ordering
    }

    /// Change the ordering policy; switching to strict re-checks the current bounds.
    pub fn set_ordering(&mut self, ordering: WindowOrdering) -> ModelResult<()> {
        let previous = std::mem::replace(&mut self.ordering, ordering);
        if let Err(err) = self.check_order() {
            self.ordering = previous;
            return Err(err);
        }
        Ok(())
    }

    fn check_order(&self) -> ModelResult<()> {
        match (self.ordering, &self.start) {
            (WindowOrdering::Strict, Some(start)) => {
                if start.scale() != self.end.scale() {
                    return Err(ValidationError::not_permitted(
                        "start and end must share a time scale",
                    )
                    .in_field("end"));
                }
                rules::ordered("start", start, "end", &self.end)
            }
            _ => Ok(()),
        }
    }
}

#[derive(Deserialize)]
struct RawWindow {
    #[serde(default)]
    start: Option<TimeValue>,
    end: Option<TimeValue>,
}

impl TryFrom<RawWindow> for Window {
    type Error = ValidationError;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        let end = raw.end.ok_or_else(|| ValidationError::missing("end"))?;
        Window::new(raw.start, end)
    }
}
