//! Tracker driver parameters
//!
//! Song addresses are written little-endian at a fixed offset. Tracker A reads a
//! 3-byte address plus a play-mode byte it updates itself; tracker B only latches a
//! 4-byte address when it boots and reports nothing back.

use super::layout;
use crate::bus::{CoprocessorBus, RegisterWindow};

/// Bytes of the tracker A song address
pub const MVS_ADDRESS_WIDTH: usize = 3;

/// Bytes of the tracker B song address
pub const TFM_ADDRESS_WIDTH: usize = 4;

/// Tracker A play mode, a 2-bit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrackerMode {
    /// Not playing (code 0)
    #[default]
    Silence,
    /// Playing, restart at the end (code 1)
    Loop,
    /// Playing once (code 2)
    Once,
    /// Code 3, never written by this crate
    Unknown(u8),
}

impl TrackerMode {
    /// Decode the low 2 bits of the mode byte
    pub fn from_code(code: u8) -> Self {
        match code & 0x03 {
            0 => TrackerMode::Silence,
            1 => TrackerMode::Loop,
            2 => TrackerMode::Once,
            other => TrackerMode::Unknown(other),
        }
    }

    /// Register code
    pub fn code(self) -> u8 {
        match self {
            TrackerMode::Silence => 0,
            TrackerMode::Loop => 1,
            TrackerMode::Once => 2,
            TrackerMode::Unknown(code) => code & 0x03,
        }
    }

    /// Mode written when starting a song
    pub fn for_start(looping: bool) -> Self {
        if looping {
            TrackerMode::Loop
        } else {
            TrackerMode::Once
        }
    }

    /// Any nonzero code counts as playing
    pub fn is_playing(self) -> bool {
        self.code() != 0
    }
}

/// Write the low `width` bytes of `address`, least significant first
pub fn write_song_address<B: CoprocessorBus + ?Sized>(
    window: &mut RegisterWindow<'_, B>,
    offset: u16,
    address: u32,
    width: usize,
) {
    let bytes = address.to_le_bytes();
    window.write_bytes(offset, &bytes[..width.min(bytes.len())]);
}

/// Read back a song address of `width` bytes
pub fn read_song_address<B: CoprocessorBus + ?Sized>(
    window: &RegisterWindow<'_, B>,
    offset: u16,
    width: usize,
) -> u32 {
    let mut bytes = [0u8; 4];
    let width = width.min(bytes.len());
    window.read_bytes(offset, &mut bytes[..width]);
    u32::from_le_bytes(bytes)
}

/// Set the tracker A play mode
pub fn write_mode<B: CoprocessorBus + ?Sized>(
    window: &mut RegisterWindow<'_, B>,
    mode: TrackerMode,
) {
    window.write(layout::MVS_MODE, mode.code());
}

/// Current tracker A play mode
pub fn read_mode<B: CoprocessorBus + ?Sized>(window: &RegisterWindow<'_, B>) -> TrackerMode {
    TrackerMode::from_code(window.read(layout::MVS_MODE))
}
