//! Battlefield events
//!
//! The battlefield owns the only subscription list. Units never hold a
//! reference back to their owner; the controller emits on their behalf.

use serde::Serialize;

use crate::battle::phase::TurnPhase;
use crate::core::types::UnitId;

/// Notifications from the battlefield
///
/// Units are rebuilt as a new variant at every phase boundary but keep
/// their ids, so a boundary is announced once with `PhaseChanged` rather
/// than as a removal and re-creation of every unit. `UnitCreated` and
/// `UnitRemoved` mark units entering or leaving the battle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BattlefieldEvent {
    UnitCreated { unit: UnitId, unit_type: String },
    UnitRemoved { unit: UnitId },
    /// Every active unit was rebuilt for `to`, ids unchanged
    PhaseChanged { from: TurnPhase, to: TurnPhase },
    UnitValidityChanged { unit: UnitId, valid: bool },
    /// Aggregate validity flipped
    ValidityChanged { valid: bool },
    /// Aggregate busy flipped
    BusyChanged { busy: bool },
    DeploymentClosed,
    /// The Acting phase reached the turn period
    ActingDone { turn: u32 },
}

type Listener = Box<dyn FnMut(&BattlefieldEvent) + Send>;

/// Subscribers plus a drainable log of everything emitted
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
    log: Vec<BattlefieldEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&BattlefieldEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&mut self, event: BattlefieldEvent) {
        tracing::trace!(?event, "emit");
        for listener in &mut self.listeners {
            listener(&event);
        }
        self.log.push(event);
    }

    /// Events since the last drain, oldest first
    pub fn drain(&mut self) -> Vec<BattlefieldEvent> {
        std::mem::take(&mut self.log)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("log", &self.log)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_listeners_see_events_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut bus = EventBus::new();
        bus.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        bus.emit(BattlefieldEvent::DeploymentClosed);
        bus.emit(BattlefieldEvent::BusyChanged { busy: true });

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                BattlefieldEvent::DeploymentClosed,
                BattlefieldEvent::BusyChanged { busy: true }
            ]
        );
    }

    #[test]
    fn test_drain_empties_log() {
        let mut bus = EventBus::new();
        bus.emit(BattlefieldEvent::ActingDone { turn: 1 });
        bus.emit(BattlefieldEvent::DeploymentClosed);
        assert_eq!(
            bus.drain(),
            vec![
                BattlefieldEvent::ActingDone { turn: 1 },
                BattlefieldEvent::DeploymentClosed
            ]
        );
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(BattlefieldEvent::UnitValidityChanged {
            unit: UnitId::new(3),
            valid: false,
        })
        .unwrap();
        assert_eq!(json["event"], "unit_validity_changed");
        assert_eq!(json["unit"], 3);
    }
}
