//! # Emitters
//!
//! Backends that render the event stream. The engine decides *what* is
//! registered and placed; an emitter decides how that is written out for a
//! particular simulation toolkit.
//!
//! ## Example
//!
//! ```rust
//! use hdds_compose::emitter::{Emitter, EventLog};
//! use hdds_compose::event::Event;
//!
//! let mut log = EventLog::new();
//! log.emit(&Event::RotationRegistered {
//!     id: 1,
//!     matrix: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
//!     axes: [(90.0, 0.0), (90.0, 90.0), (0.0, 0.0)],
//! }).unwrap();
//! assert_eq!(log.len(), 1);
//! ```

use crate::error::{TranslateError, TranslateResult};
use crate::event::Event;
use crate::frame::DivisionAxis;

/// Consumer of translation events.
pub trait Emitter {
    /// Render one event.
    ///
    /// Returning an error aborts the run; events are only handed over once
    /// the whole translation has succeeded, so an emitter never sees a
    /// stream that the engine itself would reject.
    fn emit(&mut self, event: &Event) -> TranslateResult<()>;
}

/// Emitter that records every event.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
    axes: Option<Vec<DivisionAxis>>,
}

impl EventLog {
    /// Record everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record events, rejecting divisions along axes not in `axes`.
    pub fn with_division_axes(axes: &[DivisionAxis]) -> Self {
        Self {
            events: Vec::new(),
            axes: Some(axes.to_vec()),
        }
    }

    /// Recorded events in arrival order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Take the recorded events.
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Recorded events of one kind.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |event| event.kind() == kind)
    }
}

impl Emitter for EventLog {
    fn emit(&mut self, event: &Event) -> TranslateResult<()> {
        if let (Some(axes), Event::DivisionRegistered { axis, container_name, .. }) = (&self.axes, event) {
            if !axes.contains(axis) {
                return Err(TranslateError::UnsupportedDivisionAxis {
                    volume: container_name.clone(),
                    axis: axis.label().to_string(),
                });
            }
        }
        self.events.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn division(axis: DivisionAxis) -> Event {
        Event::DivisionRegistered {
            id: 2,
            name: "zd01".to_string(),
            container: 1,
            container_name: "CDC".to_string(),
            axis,
            start: 0.0,
            step: 1.0,
            copies: 4,
        }
    }

    #[test]
    fn log_records_in_order() {
        let mut log = EventLog::new();
        log.emit(&division(DivisionAxis::Z)).unwrap();
        log.emit(&division(DivisionAxis::Phi)).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.of_kind("DivisionRegistered").count(), 2);
        assert_eq!(log.of_kind("Placement").count(), 0);
    }

    #[test]
    fn restricted_log_rejects_unsupported_axes() {
        let mut log = EventLog::with_division_axes(&[DivisionAxis::Z]);
        log.emit(&division(DivisionAxis::Z)).unwrap();
        let err = log.emit(&division(DivisionAxis::Rho)).unwrap_err();
        assert_eq!(
            err,
            TranslateError::UnsupportedDivisionAxis {
                volume: "CDC".to_string(),
                axis: "rho".to_string(),
            }
        );
        assert_eq!(log.len(), 1);
    }
}
