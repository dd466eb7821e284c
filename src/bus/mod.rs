//! Shared Bus Arbitration
//!
//! The main processor and the sound co-processor share one 8 KiB register window.
//! There is no hardware mutex beyond an explicit request/release handshake: while the
//! main processor owns the bus, the co-processor's own accesses are paused, so the
//! critical section doubles as a lock on co-processor execution and must stay short.
//!
//! Everything in this crate touches the window through [`RegisterWindow`], a guard
//! that requests the bus when created and releases it when dropped.

pub mod shared_ram;

pub use shared_ram::{BusStats, SharedRam};

/// Size of the shared register window in bytes
pub const WINDOW_SIZE: usize = 0x2000;

/// Mask applied to every window offset; out-of-range offsets wrap
pub const WINDOW_MASK: u16 = (WINDOW_SIZE - 1) as u16;

/// Bus arbitration and raw access to the co-processor's memory
///
/// Implemented by the platform layer. `read`/`write` are only meaningful between
/// `request_bus` and `release_bus`; use [`RegisterWindow`] rather than calling
/// them directly.
///
/// # Example
///
/// ```
/// use sound_copro::bus::{CoprocessorBus, RegisterWindow, SharedRam};
///
/// let mut ram = SharedRam::new();
/// {
///     let mut window = RegisterWindow::acquire(&mut ram);
///     window.write(0x0100, 0x01);
/// } // bus released here
/// assert_eq!(ram.stats().requests, ram.stats().releases);
/// ```
pub trait CoprocessorBus {
    /// Request exclusive bus ownership, blocking until granted
    fn request_bus(&mut self);

    /// Give the bus back to the co-processor
    fn release_bus(&mut self);

    /// Read a byte at a window offset
    fn read(&self, offset: u16) -> u8;

    /// Write a byte at a window offset
    fn write(&mut self, offset: u16, value: u8);

    /// Assert the co-processor reset line
    fn start_reset(&mut self);

    /// Release the co-processor reset line; execution restarts at address 0
    fn end_reset(&mut self);

    /// Force the co-processor through a full reset cycle
    fn reset(&mut self) {
        self.start_reset();
        self.end_reset();
    }
}

/// Exclusive, scoped access to the shared register window
///
/// Holding a `RegisterWindow` means holding the bus. The guard borrows the bus
/// mutably, so acquisitions cannot nest or overlap, and `Drop` releases the bus on
/// every exit path: normal return, early return or panic.
pub struct RegisterWindow<'a, B: CoprocessorBus + ?Sized> {
    bus: &'a mut B,
    trace: bool,
}

impl<'a, B: CoprocessorBus + ?Sized> RegisterWindow<'a, B> {
    /// Request the bus and open the window
    pub fn acquire(bus: &'a mut B) -> Self {
        bus.request_bus();
        RegisterWindow { bus, trace: false }
    }

    /// Log every register write at `trace` level
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Read one byte
    #[inline]
    pub fn read(&self, offset: u16) -> u8 {
        self.bus.read(offset & WINDOW_MASK)
    }

    /// Write one byte
    #[inline]
    pub fn write(&mut self, offset: u16, value: u8) {
        let offset = offset & WINDOW_MASK;
        if self.trace {
            log::trace!("window[{offset:#06X}] <- {value:#04X}");
        }
        self.bus.write(offset, value);
    }

    /// Read-modify-write: set `mask` bits at `offset`
    pub fn set_bits(&mut self, offset: u16, mask: u8) {
        let value = self.read(offset) | mask;
        self.write(offset, value);
    }

    /// Read-modify-write: clear `mask` bits at `offset`
    pub fn clear_bits(&mut self, offset: u16, mask: u8) {
        let value = self.read(offset) & !mask;
        self.write(offset, value);
    }

    /// Write a run of bytes starting at `offset`
    pub fn write_bytes(&mut self, offset: u16, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.write(offset.wrapping_add(i as u16), byte);
        }
    }

    /// Fill `buf` with bytes starting at `offset`
    pub fn read_bytes(&self, offset: u16, buf: &mut [u8]) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read(offset.wrapping_add(i as u16));
        }
    }

    /// Hold the co-processor in reset while the window is open
    pub fn hold_reset(&mut self) {
        self.bus.start_reset();
    }

    /// Let the co-processor out of reset
    pub fn release_reset(&mut self) {
        self.bus.end_reset();
    }
}

impl<B: CoprocessorBus + ?Sized> Drop for RegisterWindow<'_, B> {
    fn drop(&mut self) {
        self.bus.release_bus();
    }
}
