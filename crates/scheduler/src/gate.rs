use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-flight guard shared between a scheduler and its in-flight cycle.
///
/// Acquisition yields an RAII [`FlightPermit`]; the busy flag clears exactly
/// once when the permit drops, on every exit path including panics.
#[derive(Clone)]
pub struct SingleFlight {
    busy: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Take the gate if idle. `None` means a previous run is still active.
    pub fn try_acquire(&self) -> Option<FlightPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| FlightPermit {
                busy: self.busy.clone(),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FlightPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}
