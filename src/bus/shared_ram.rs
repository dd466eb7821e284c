//! Host Shared RAM
//!
//! An in-process stand-in for the co-processor RAM as the main processor sees it
//! through the shared window. Clones share the same memory, so one handle can be
//! given to a [`SoundSystem`](crate::SoundSystem) while another plays the
//! co-processor's side (tests, tools, host emulation).

use super::{CoprocessorBus, WINDOW_MASK, WINDOW_SIZE};
use parking_lot::Mutex;
use std::sync::Arc;

/// Bus traffic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Number of bus requests
    pub requests: u32,
    /// Number of bus releases
    pub releases: u32,
    /// Number of completed reset cycles
    pub resets: u32,
    /// Main-processor accesses made without owning the bus
    pub unguarded_accesses: u32,
    /// Co-processor writes refused because the main processor held the bus or
    /// the reset line
    pub refused_coprocessor_writes: u32,
}

#[derive(Debug)]
struct RamState {
    ram: Vec<u8>,
    bus_owned: bool,
    in_reset: bool,
    stats: BusStats,
}

impl RamState {
    /// Why the co-processor cannot write right now
    fn write_blocker(&self) -> Option<&'static str> {
        if self.in_reset {
            Some("co-processor held in reset")
        } else if self.bus_owned {
            Some("bus held by main processor")
        } else {
            None
        }
    }
}

/// Shared co-processor RAM
#[derive(Debug, Clone)]
pub struct SharedRam {
    state: Arc<Mutex<RamState>>,
}

impl SharedRam {
    /// Create a zeroed 8 KiB window
    pub fn new() -> Self {
        SharedRam {
            state: Arc::new(Mutex::new(RamState {
                ram: vec![0; WINDOW_SIZE],
                bus_owned: false,
                in_reset: false,
                stats: BusStats::default(),
            })),
        }
    }

    /// Co-processor side read
    pub fn peek(&self, offset: u16) -> u8 {
        self.state.lock().ram[(offset & WINDOW_MASK) as usize]
    }

    /// Co-processor side write
    ///
    /// Returns `false` (and leaves memory untouched) while the main processor owns
    /// the bus or holds the co-processor in reset.
    pub fn poke(&self, offset: u16, value: u8) -> bool {
        let mut state = self.state.lock();
        if let Some(cause) = state.write_blocker() {
            state.stats.refused_coprocessor_writes += 1;
            log::warn!("co-processor write to {offset:#06X} refused: {cause}");
            return false;
        }
        state.ram[(offset & WINDOW_MASK) as usize] = value;
        true
    }

    /// Copy of the whole window
    pub fn snapshot(&self) -> Vec<u8> {
        self.state.lock().ram.clone()
    }

    /// Bus traffic counters so far
    pub fn stats(&self) -> BusStats {
        self.state.lock().stats
    }

    /// Whether the main processor currently owns the bus
    pub fn is_bus_owned(&self) -> bool {
        self.state.lock().bus_owned
    }

    /// Whether the co-processor is held in reset
    pub fn in_reset(&self) -> bool {
        self.state.lock().in_reset
    }
}

impl Default for SharedRam {
    fn default() -> Self {
        Self::new()
    }
}

impl CoprocessorBus for SharedRam {
    fn request_bus(&mut self) {
        let mut state = self.state.lock();
        if state.bus_owned {
            log::warn!("bus requested while already owned");
        }
        state.bus_owned = true;
        state.stats.requests += 1;
    }

    fn release_bus(&mut self) {
        let mut state = self.state.lock();
        state.bus_owned = false;
        state.stats.releases += 1;
    }

    fn read(&self, offset: u16) -> u8 {
        let mut state = self.state.lock();
        if !state.bus_owned {
            state.stats.unguarded_accesses += 1;
        }
        state.ram[(offset & WINDOW_MASK) as usize]
    }

    fn write(&mut self, offset: u16, value: u8) {
        let mut state = self.state.lock();
        if !state.bus_owned {
            state.stats.unguarded_accesses += 1;
        }
        state.ram[(offset & WINDOW_MASK) as usize] = value;
    }

    fn start_reset(&mut self) {
        self.state.lock().in_reset = true;
    }

    fn end_reset(&mut self) {
        let mut state = self.state.lock();
        state.in_reset = false;
        state.stats.resets += 1;
    }
}
