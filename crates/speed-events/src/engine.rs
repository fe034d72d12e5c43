//! Speed Event Engine
//!
//! Compares each newly decoded fix with the one before it and runs the
//! callbacks whose conditions hold.

use crate::registry::CallbackRegistry;
use crate::{EventError, EventKind};
use nmea_protocol::FixSnapshot;
use tracing::debug;

/// Events whose callbacks ran during one evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiredEvents {
    fired: [bool; 3],
}

impl FiredEvents {
    pub fn contains(&self, kind: EventKind) -> bool {
        self.fired[kind.index()]
    }

    pub fn is_empty(&self) -> bool {
        !self.fired.iter().any(|&f| f)
    }

    pub fn len(&self) -> usize {
        self.fired.iter().filter(|&&f| f).count()
    }

    /// Fired kinds, in slot order
    pub fn iter(&self) -> impl Iterator<Item = EventKind> + '_ {
        EventKind::ALL.into_iter().filter(|&kind| self.contains(kind))
    }

    fn insert(&mut self, kind: EventKind) {
        self.fired[kind.index()] = true;
    }
}

/// Owns the callback registry and evaluates it against successive fixes
#[derive(Debug, Default)]
pub struct EventEngine {
    registry: CallbackRegistry,
    /// Times each kind fired since creation
    fire_counts: [u64; 3],
}

impl EventEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`CallbackRegistry::register`]
    pub fn register<F>(&mut self, kind: EventKind, handler: F, threshold: f64) -> Result<(), EventError>
    where
        F: FnMut(&FixSnapshot, &mut CallbackRegistry) + Send + 'static,
    {
        self.registry.register(kind, handler, threshold)
    }

    /// See [`CallbackRegistry::unregister`]
    pub fn unregister(&mut self, kind: EventKind) -> Result<(), EventError> {
        self.registry.unregister(kind)
    }

    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    /// Number of times `kind` has fired
    pub fn fire_count(&self, kind: EventKind) -> u64 {
        self.fire_counts[kind.index()]
    }

    /// Which conditions hold for `previous -> current` with the current thresholds.
    ///
    /// The fall condition is measured against the *rise* threshold; the fall
    /// slot's own threshold is stored but never consulted.
    pub fn conditions(&self, previous: &FixSnapshot, current: &FixSnapshot) -> FiredEvents {
        let tolerance = self.registry.threshold(EventKind::SpeedDelta);
        let barrier = self.registry.threshold(EventKind::SpeedRise);
        let (old, new) = (previous.speed_kmph, current.speed_kmph);

        let mut met = FiredEvents::default();
        if (new - old).abs() > tolerance {
            met.insert(EventKind::SpeedDelta);
        }
        if new > barrier && old <= barrier {
            met.insert(EventKind::SpeedRise);
        }
        // TODO: compare against the fall slot's threshold once callers no
        // longer rely on the fall event mirroring the rise barrier.
        if new < barrier && old >= barrier {
            met.insert(EventKind::SpeedFall);
        }
        met
    }

    /// Evaluate all conditions, then run the registered callbacks that hold.
    ///
    /// Conditions use the thresholds as they were before any callback ran, so
    /// a callback that re-registers takes effect from the next sentence.
    pub fn evaluate(&mut self, previous: &FixSnapshot, current: &FixSnapshot) -> FiredEvents {
        let met = self.conditions(previous, current);
        let mut fired = FiredEvents::default();

        for kind in met.iter() {
            if self.registry.invoke(kind, current) {
                self.fire_counts[kind.index()] += 1;
                fired.insert(kind);
            }
        }

        if !fired.is_empty() {
            debug!(
                "Speed {} -> {} km/h fired {} event(s)",
                previous.speed_kmph,
                current.speed_kmph,
                fired.len()
            );
        }
        fired
    }
}
