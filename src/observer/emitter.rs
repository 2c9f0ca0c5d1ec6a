use std::sync::Mutex;

use event_emitter_rs::EventEmitter;

use super::{LedgerEvent, LedgerObserver};

/// Observer that re-emits each event through an `EventEmitter` for in-process
/// subscribers. The channel is [`LedgerEvent::name`], the payload the event's
/// JSON rendering.
pub struct EmitterObserver {
    emitter: Mutex<EventEmitter>,
}

impl EmitterObserver {
    pub fn new(emitter: EventEmitter) -> Self {
        EmitterObserver {
            emitter: Mutex::new(emitter),
        }
    }
}

impl LedgerObserver for EmitterObserver {
    fn observe(&self, event: &LedgerEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(_) => event.to_string(),
        };
        let mut emitter = match self.emitter.lock() {
            Ok(emitter) => emitter,
            Err(poisoned) => poisoned.into_inner(),
        };
        emitter.emit(event.name(), payload);
    }
}
