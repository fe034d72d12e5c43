//! Callback Registry

use crate::{EventError, EventKind};
use nmea_protocol::FixSnapshot;
use tracing::{debug, info};

/// Handler invoked when its event fires.
///
/// It receives the freshly decoded fix and the registry itself, so it can
/// register or unregister any slot, including its own.
pub type SpeedCallback = Box<dyn FnMut(&FixSnapshot, &mut CallbackRegistry) + Send>;

#[derive(Default)]
struct Slot {
    handler: Option<SpeedCallback>,
    threshold: f64,
    /// Bumped on every register/unregister of this slot
    generation: u64,
}

/// One callback slot per [`EventKind`]; slots are reset, never removed
#[derive(Default)]
pub struct CallbackRegistry {
    slots: [Slot; 3],
}

impl CallbackRegistry {
    /// Create a registry with every slot empty and threshold 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler` for `kind` with `threshold`.
    ///
    /// Rejects a negative or NaN threshold, leaving the slot unchanged.
    pub fn register<F>(&mut self, kind: EventKind, handler: F, threshold: f64) -> Result<(), EventError>
    where
        F: FnMut(&FixSnapshot, &mut CallbackRegistry) + Send + 'static,
    {
        if threshold.is_nan() || threshold < 0.0 {
            return Err(EventError::InvalidArgument(threshold));
        }

        let slot = &mut self.slots[kind.index()];
        slot.handler = Some(Box::new(handler));
        slot.threshold = threshold;
        slot.generation = slot.generation.wrapping_add(1);

        info!("Registered {} callback (threshold {})", kind, threshold);
        Ok(())
    }

    /// Reset the slot for `kind` to no handler and threshold 0
    pub fn unregister(&mut self, kind: EventKind) -> Result<(), EventError> {
        let slot = &mut self.slots[kind.index()];
        slot.handler = None;
        slot.threshold = 0.0;
        slot.generation = slot.generation.wrapping_add(1);

        info!("Unregistered {} callback", kind);
        Ok(())
    }

    /// Register by raw slot identifier
    pub fn register_id<F>(&mut self, id: u8, handler: F, threshold: f64) -> Result<(), EventError>
    where
        F: FnMut(&FixSnapshot, &mut CallbackRegistry) + Send + 'static,
    {
        self.register(EventKind::try_from(id)?, handler, threshold)
    }

    /// Unregister by raw slot identifier
    pub fn unregister_id(&mut self, id: u8) -> Result<(), EventError> {
        self.unregister(EventKind::try_from(id)?)
    }

    /// Configured threshold for `kind`
    pub fn threshold(&self, kind: EventKind) -> f64 {
        self.slots[kind.index()].threshold
    }

    /// Whether a handler is installed for `kind`
    pub fn is_registered(&self, kind: EventKind) -> bool {
        self.slots[kind.index()].handler.is_some()
    }

    /// Run the handler for `kind`, if any. Returns whether one ran.
    ///
    /// The handler is taken out of its slot for the call and put back
    /// afterwards unless it replaced or cleared the slot itself.
    pub(crate) fn invoke(&mut self, kind: EventKind, fix: &FixSnapshot) -> bool {
        let slot = &mut self.slots[kind.index()];
        let Some(mut handler) = slot.handler.take() else {
            return false;
        };
        let generation = slot.generation;

        debug!("Firing {} callback", kind);
        handler(fix, self);

        let slot = &mut self.slots[kind.index()];
        if slot.generation == generation {
            slot.handler = Some(handler);
        }
        true
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for kind in EventKind::ALL {
            map.entry(
                &kind.as_str(),
                &(self.is_registered(kind), self.threshold(kind)),
            );
        }
        map.finish()
    }
}
