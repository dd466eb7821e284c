//! Register Protocol Codec
//!
//! Byte layout of the driver communication area inside the shared window, and the
//! read/write sequences that make up each playback command.
//!
//! | Offset | Contents |
//! |--------|----------|
//! | `0x0100` | command byte, bit n = start pulse for channel n (write-only) |
//! | `0x0102` | status: playing bits (bit 7 = driver ready) |
//! | `0x0103` | loop bits (caller-maintained shadow) |
//! | `0x0104` | parameters, 4 bytes per channel |
//! | `0x0114` | internal parameters, 4 bytes per channel (stop target) |
//! | `0x0124` | envelope volume, 1 byte per channel |
//!
//! Parameters store address and length in block units: with boundary shift `s`,
//! byte 0/1 hold `A >> s` low/high and byte 2/3 hold `L >> s` low/high. The low
//! `s` bits are dropped and come back as zero on the co-processor side.

pub mod tracker;

pub use tracker::TrackerMode;

use crate::bus::{CoprocessorBus, RegisterWindow};
use crate::sample::SampleDescriptor;
use bitflags::bitflags;

/// Fixed offsets inside the shared window
pub mod layout {
    /// Command byte (start pulses)
    pub const COMMAND: u16 = 0x0100;
    /// Status byte (playing bits)
    pub const STATUS: u16 = 0x0102;
    /// Loop status byte
    pub const LOOP_STATUS: u16 = STATUS + 1;
    /// First channel's parameter block
    pub const PARAMS: u16 = 0x0104;
    /// Bytes per channel parameter block
    pub const PARAMS_STRIDE: u16 = 4;
    /// Playback rate code (single channel PCM)
    pub const PCM_RATE: u16 = PARAMS + 4;
    /// Pan code (single channel PCM)
    pub const PCM_PAN: u16 = PARAMS + 6;
    /// Internal (currently playing) parameter blocks
    pub const INTERNAL_PARAMS: u16 = PARAMS + 0x10;
    /// Envelope volume bytes
    pub const VOLUME: u16 = PARAMS + 0x20;
    /// Tracker A song address (3 bytes, little-endian)
    pub const MVS_SONG: u16 = 0x151A;
    /// Tracker A play mode
    pub const MVS_MODE: u16 = 0x151D;
    /// Tracker B song address (4 bytes, little-endian), latched at driver start
    pub const TFM_SONG: u16 = 0x1FFC;

    /// Play pulse for channel 0
    pub const COMMAND_PLAY: u8 = 0x01;
    /// Playing bit for channel 0
    pub const STATUS_PLAYING: u8 = 0x01;
    /// Driver ready bit
    pub const STATUS_READY: u8 = 0x80;
    /// Volume levels are 4 bits wide
    pub const VOLUME_MASK: u8 = 0x0F;

    /// Parameter block of `channel`
    pub fn channel_params(channel: u8) -> u16 {
        PARAMS + channel as u16 * PARAMS_STRIDE
    }

    /// Internal parameter block of `channel`
    pub fn internal_params(channel: u8) -> u16 {
        INTERNAL_PARAMS + channel as u16 * PARAMS_STRIDE
    }

    /// Volume byte of `channel`
    pub fn volume(channel: u8) -> u16 {
        VOLUME + channel as u16
    }
}

bitflags! {
    /// Per-channel bit set, as used by the status and loop bytes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChannelMask: u8 {
        /// Channel 1 (index 0)
        const CH1 = 0x01;
        /// Channel 2 (index 1)
        const CH2 = 0x02;
        /// Channel 3 (index 2)
        const CH3 = 0x04;
        /// Channel 4 (index 3)
        const CH4 = 0x08;
    }
}

impl ChannelMask {
    /// Mask with only `channel`'s bit set
    ///
    /// Indexes past 7 wrap around; channel range is the caller's contract.
    pub fn channel(channel: u8) -> Self {
        ChannelMask::from_bits_retain(layout::STATUS_PLAYING.wrapping_shl(channel as u32))
    }

    /// Whether `channel`'s bit is set
    pub fn has_channel(&self, channel: u8) -> bool {
        self.intersects(Self::channel(channel))
    }
}

/// Address and length in block units, as stored in a parameter block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EncodedSample {
    /// `address >> shift`, truncated to 16 bits
    pub address_blocks: u16,
    /// `len >> shift`, truncated to 16 bits
    pub length_blocks: u16,
}

impl EncodedSample {
    /// Drop the low `shift` bits of address and length
    pub fn from_descriptor(sample: SampleDescriptor, shift: u32) -> Self {
        EncodedSample {
            address_blocks: (sample.address >> shift) as u16,
            length_blocks: (sample.len >> shift) as u16,
        }
    }

    /// Parameter block bytes: address low/high, length low/high
    pub fn to_bytes(self) -> [u8; 4] {
        let [a0, a1] = self.address_blocks.to_le_bytes();
        let [l0, l1] = self.length_blocks.to_le_bytes();
        [a0, a1, l0, l1]
    }

    /// Inverse of [`to_bytes`](Self::to_bytes)
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        EncodedSample {
            address_blocks: u16::from_le_bytes([bytes[0], bytes[1]]),
            length_blocks: u16::from_le_bytes([bytes[2], bytes[3]]),
        }
    }

    /// Descriptor the co-processor reconstructs (low bits zero)
    pub fn to_descriptor(self, shift: u32) -> SampleDescriptor {
        SampleDescriptor::new(
            (self.address_blocks as u32) << shift,
            (self.length_blocks as u32) << shift,
        )
    }
}

/// Write `sample` into the parameter block at `offset`
pub fn encode_sample<B: CoprocessorBus + ?Sized>(
    window: &mut RegisterWindow<'_, B>,
    offset: u16,
    sample: SampleDescriptor,
    shift: u32,
) {
    let encoded = EncodedSample::from_descriptor(sample, shift);
    window.write_bytes(offset, &encoded.to_bytes());
}

/// Read the parameter block at `offset`
pub fn decode_sample<B: CoprocessorBus + ?Sized>(
    window: &RegisterWindow<'_, B>,
    offset: u16,
) -> EncodedSample {
    let mut bytes = [0u8; 4];
    window.read_bytes(offset, &mut bytes);
    EncodedSample::from_bytes(bytes)
}

/// Issue the start pulse for `channel`
pub fn pulse_play<B: CoprocessorBus + ?Sized>(window: &mut RegisterWindow<'_, B>, channel: u8) {
    window.set_bits(
        layout::COMMAND,
        layout::COMMAND_PLAY.wrapping_shl(channel as u32),
    );
}

/// Record the loop flag of `channel` in the loop status byte
///
/// This is a shadow kept by the main processor. The driver never clears it when a
/// one-shot sample ends, so only the playing bit is authoritative.
pub fn set_loop<B: CoprocessorBus + ?Sized>(
    window: &mut RegisterWindow<'_, B>,
    channel: u8,
    looping: bool,
) {
    let bit = ChannelMask::channel(channel).bits();
    if looping {
        window.set_bits(layout::LOOP_STATUS, bit);
    } else {
        window.clear_bits(layout::LOOP_STATUS, bit);
    }
}

/// Channels whose playing bit is set
pub fn playing<B: CoprocessorBus + ?Sized>(window: &RegisterWindow<'_, B>) -> ChannelMask {
    ChannelMask::from_bits_truncate(window.read(layout::STATUS))
}

/// Channels whose loop shadow bit is set
pub fn looping<B: CoprocessorBus + ?Sized>(window: &RegisterWindow<'_, B>) -> ChannelMask {
    ChannelMask::from_bits_truncate(window.read(layout::LOOP_STATUS))
}

/// Whether the driver has flagged itself ready
pub fn is_ready<B: CoprocessorBus + ?Sized>(window: &RegisterWindow<'_, B>) -> bool {
    window.read(layout::STATUS) & layout::STATUS_READY != 0
}

/// Clear both the playing and loop bits of `channel`
pub fn clear_channel_status<B: CoprocessorBus + ?Sized>(
    window: &mut RegisterWindow<'_, B>,
    channel: u8,
) {
    let bit = ChannelMask::channel(channel).bits();
    window.clear_bits(layout::STATUS, bit);
    window.clear_bits(layout::LOOP_STATUS, bit);
}

/// Re-arm `channel`'s internal parameters with the null sample
pub fn arm_null_sample<B: CoprocessorBus + ?Sized>(
    window: &mut RegisterWindow<'_, B>,
    channel: u8,
    null: SampleDescriptor,
    shift: u32,
) {
    encode_sample(window, layout::internal_params(channel), null, shift);
}

/// Set the envelope volume of `channel`; only the low 4 bits are kept
pub fn write_volume<B: CoprocessorBus + ?Sized>(
    window: &mut RegisterWindow<'_, B>,
    channel: u8,
    volume: u8,
) {
    window.write(layout::volume(channel), volume & layout::VOLUME_MASK);
}

/// Envelope volume of `channel` (0-15)
pub fn read_volume<B: CoprocessorBus + ?Sized>(window: &RegisterWindow<'_, B>, channel: u8) -> u8 {
    window.read(layout::volume(channel)) & layout::VOLUME_MASK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::SharedRam;

    #[test]
    fn test_parameter_bytes() {
        let sample = SampleDescriptor::new(0x0012_3400, 0x0000_5600);
        assert_eq!(
            EncodedSample::from_descriptor(sample, 8).to_bytes(),
            [0x34, 0x12, 0x56, 0x00]
        );
        // 128-byte boundary keeps one more address bit
        let sample = SampleDescriptor::new(0x0012_3480, 0x0000_0180);
        assert_eq!(
            EncodedSample::from_descriptor(sample, 7).to_bytes(),
            [0x69, 0x24, 0x03, 0x00]
        );
    }

    #[test]
    fn test_aligned_round_trip() {
        let mut ram = SharedRam::new();
        let mut window = RegisterWindow::acquire(&mut ram);
        for (shift, sample) in [
            (8, SampleDescriptor::new(0x0000_0000, 0x0000_0100)),
            (8, SampleDescriptor::new(0x00FF_FF00, 0x00FF_FF00)),
            (8, SampleDescriptor::new(0x0004_2300, 0x0001_0000)),
            (7, SampleDescriptor::new(0x007F_FF80, 0x0000_0080)),
            (7, SampleDescriptor::new(0x0001_0080, 0x0000_4480)),
        ] {
            encode_sample(&mut window, layout::PARAMS, sample, shift);
            let decoded = decode_sample(&window, layout::PARAMS);
            assert_eq!(decoded.address_blocks as u32, sample.address >> shift);
            assert_eq!(decoded.length_blocks as u32, sample.len >> shift);
            assert_eq!(decoded.to_descriptor(shift), sample);
        }
    }

    #[test]
    fn test_misaligned_sample_is_silently_truncated() {
        let sample = SampleDescriptor::new(0x0004_23FF, 0x0000_01FF);
        let decoded = EncodedSample::from_descriptor(sample, 8).to_descriptor(8);
        assert_eq!(decoded, SampleDescriptor::new(0x0004_2300, 0x0000_0100));
    }

    #[test]
    fn test_pulse_play_only_sets_channel_bit() {
        let mut ram = SharedRam::new();
        let mut window = RegisterWindow::acquire(&mut ram);
        window.write(layout::COMMAND, 0b0000_0001);
        pulse_play(&mut window, 2);
        assert_eq!(window.read(layout::COMMAND), 0b0000_0101);
    }

    #[test]
    fn test_loop_shadow_and_clear() {
        let mut ram = SharedRam::new();
        let mut window = RegisterWindow::acquire(&mut ram);
        window.write(layout::STATUS, layout::STATUS_READY | 0b0000_0011);
        set_loop(&mut window, 1, true);
        set_loop(&mut window, 0, true);
        set_loop(&mut window, 0, false);
        assert_eq!(looping(&window), ChannelMask::CH2);

        clear_channel_status(&mut window, 1);
        assert_eq!(playing(&window), ChannelMask::CH1);
        assert_eq!(looping(&window), ChannelMask::empty());
        assert!(is_ready(&window));
    }

    #[test]
    fn test_volume_masking() {
        let mut ram = SharedRam::new();
        let mut window = RegisterWindow::acquire(&mut ram);
        for volume in 0..=15 {
            write_volume(&mut window, 3, volume);
            assert_eq!(read_volume(&window, 3), volume);
        }
        write_volume(&mut window, 3, 0x1A);
        assert_eq!(window.read(layout::volume(3)), 0x0A);
        assert_eq!(read_volume(&window, 3), 0x0A);
    }

    #[test]
    fn test_channel_mask() {
        assert_eq!(ChannelMask::channel(0), ChannelMask::CH1);
        assert_eq!(ChannelMask::channel(3), ChannelMask::CH4);
        assert!((ChannelMask::CH1 | ChannelMask::CH3).has_channel(2));
        assert!(!(ChannelMask::CH1 | ChannelMask::CH3).has_channel(1));
    }

    #[test]
    fn test_layout_blocks_do_not_overlap() {
        assert!(layout::channel_params(3) + layout::PARAMS_STRIDE <= layout::INTERNAL_PARAMS);
        assert!(layout::internal_params(3) + layout::PARAMS_STRIDE <= layout::VOLUME);
        assert_eq!(layout::MVS_MODE, layout::MVS_SONG + 3);
    }
}
