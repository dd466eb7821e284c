//! Single channel PCM driver
//!
//! One 8-bit signed channel with a selectable output rate and panning. The rate and
//! pan bytes sit in the gaps of the parameter block.

use super::{PlayStatus, PlaybackBackend, SampleRequest, SoundSystem, StartRequest};
use crate::bus::{CoprocessorBus, RegisterWindow};
use crate::codec::{self, layout, ChannelMask};
use crate::driver::{DriverLoader, DriverVariant};
use crate::sample::{NullFamily, NullSamples, SampleDescriptor};

/// Playback rate of the single channel driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SoundRate {
    /// 32 kHz
    Rate32000,
    /// 22.05 kHz
    Rate22050,
    /// 16 kHz
    #[default]
    Rate16000,
    /// 13.4 kHz
    Rate13400,
    /// 11.025 kHz
    Rate11025,
    /// 8 kHz
    Rate8000,
}

impl SoundRate {
    /// All rates, fastest first (register code order)
    pub const ALL: [SoundRate; 6] = [
        SoundRate::Rate32000,
        SoundRate::Rate22050,
        SoundRate::Rate16000,
        SoundRate::Rate13400,
        SoundRate::Rate11025,
        SoundRate::Rate8000,
    ];

    /// Register code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Rate in Hz
    pub fn hz(self) -> u32 {
        match self {
            SoundRate::Rate32000 => 32000,
            SoundRate::Rate22050 => 22050,
            SoundRate::Rate16000 => 16000,
            SoundRate::Rate13400 => 13400,
            SoundRate::Rate11025 => 11025,
            SoundRate::Rate8000 => 8000,
        }
    }

    /// Rate for an exact frequency
    pub fn from_hz(hz: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|rate| rate.hz() == hz)
    }

    /// Rate for a register code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }
}

/// Output panning of the single channel driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SoundPan {
    /// Left speaker
    Left,
    /// Right speaker
    Right,
    /// Both speakers
    #[default]
    Center,
}

impl SoundPan {
    /// Register code (output enable bits)
    pub fn code(self) -> u8 {
        match self {
            SoundPan::Left => 0x80,
            SoundPan::Right => 0x40,
            SoundPan::Center => 0xC0,
        }
    }
}

/// Register sequences of the single channel PCM driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleChannelPcm {
    null: SampleDescriptor,
}

impl SingleChannelPcm {
    const SHIFT: u32 = 8;

    /// Backend stopping with the 8-bit null sample
    pub fn new(null_samples: &NullSamples) -> Self {
        SingleChannelPcm {
            null: null_samples.descriptor(NullFamily::Pcm8),
        }
    }
}

impl PlaybackBackend for SingleChannelPcm {
    fn variant(&self) -> DriverVariant {
        DriverVariant::SingleChannelPcm
    }

    fn status<B: CoprocessorBus + ?Sized>(&self, window: &RegisterWindow<'_, B>) -> PlayStatus {
        PlayStatus::Channels(codec::playing(window) & ChannelMask::CH1)
    }

    fn start<B: CoprocessorBus + ?Sized>(
        &self,
        window: &mut RegisterWindow<'_, B>,
        request: &StartRequest,
    ) -> u8 {
        let request = request.sample();
        codec::encode_sample(window, layout::PARAMS, request.sample, Self::SHIFT);
        window.write(layout::PCM_RATE, request.rate.code());
        window.write(layout::PCM_PAN, request.pan.code());
        codec::pulse_play(window, 0);
        codec::set_loop(window, 0, request.looping);
        0
    }

    fn stop<B: CoprocessorBus + ?Sized>(&self, window: &mut RegisterWindow<'_, B>, _channel: u8) {
        codec::arm_null_sample(window, 0, self.null, Self::SHIFT);
        codec::clear_channel_status(window, 0);
    }
}

impl<B: CoprocessorBus, L: DriverLoader<B>> SoundSystem<B, L> {
    /// Whether the single channel PCM driver is playing
    pub fn is_playing_pcm(&mut self) -> bool {
        self.status(DriverVariant::SingleChannelPcm).is_active()
    }

    /// Play `sample` on the single channel PCM driver, replacing any current sample
    ///
    /// Address and length should be multiples of 256.
    pub fn start_play_pcm(
        &mut self,
        sample: SampleDescriptor,
        rate: SoundRate,
        pan: SoundPan,
        looping: bool,
    ) {
        let request = SampleRequest::new(sample)
            .channel(0u8)
            .rate(rate)
            .pan(pan)
            .looping(looping);
        self.start(DriverVariant::SingleChannelPcm, &request.into());
    }

    /// Stop the single channel PCM driver; no effect when idle
    pub fn stop_play_pcm(&mut self) {
        self.stop(DriverVariant::SingleChannelPcm, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::SharedRam;
    use crate::driver::ImageLoader;

    #[test]
    fn test_rate_codes() {
        for (code, rate) in SoundRate::ALL.into_iter().enumerate() {
            assert_eq!(rate.code() as usize, code);
            assert_eq!(SoundRate::from_code(code as u8), Some(rate));
            assert_eq!(SoundRate::from_hz(rate.hz()), Some(rate));
        }
        assert_eq!(SoundRate::from_hz(44100), None);
        assert_eq!(SoundRate::from_code(6), None);
    }

    #[test]
    fn test_start_writes_parameter_block() {
        let ram = SharedRam::new();
        let mut sound = SoundSystem::new(ram.clone(), ImageLoader::new());
        sound.start_play_pcm(
            SampleDescriptor::new(0x0012_3400, 0x0000_2000),
            SoundRate::Rate8000,
            SoundPan::Left,
            true,
        );

        let mem = ram.snapshot();
        let params = layout::PARAMS as usize;
        assert_eq!(&mem[params..params + 4], &[0x34, 0x12, 0x20, 0x00]);
        assert_eq!(mem[layout::PCM_RATE as usize], 5);
        assert_eq!(mem[layout::PCM_PAN as usize], 0x80);
        assert_eq!(mem[layout::COMMAND as usize], layout::COMMAND_PLAY);
        assert_eq!(mem[layout::LOOP_STATUS as usize], 0x01);
    }

    #[test]
    fn test_stop_arms_null_sample() {
        let ram = SharedRam::new();
        let mut sound = SoundSystem::new(ram.clone(), ImageLoader::new());
        sound.start_play_pcm(
            SampleDescriptor::new(0x0004_0000, 0x0100),
            SoundRate::default(),
            SoundPan::default(),
            true,
        );
        // driver picks the sample up
        assert!(ram.poke(layout::STATUS, layout::STATUS_READY | layout::STATUS_PLAYING));
        assert!(sound.is_playing_pcm());

        sound.stop_play_pcm();
        assert!(!sound.is_playing_pcm());

        let mem = ram.snapshot();
        let internal = layout::internal_params(0) as usize;
        // default null sample: 0x010000, 256 bytes
        assert_eq!(&mem[internal..internal + 4], &[0x00, 0x01, 0x01, 0x00]);
        assert_eq!(mem[layout::STATUS as usize], layout::STATUS_READY);
        assert_eq!(mem[layout::LOOP_STATUS as usize], 0);
    }
}
