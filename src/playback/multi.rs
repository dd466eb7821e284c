//! Multi-channel sample drivers
//!
//! Dual ADPCM, quad PCM and quad PCM with envelope share one register dialect: a
//! 4-byte parameter block per channel, one play pulse bit per channel and stop by
//! re-arming the channel with a null sample. They differ in channel count, block
//! size and whether a volume byte exists.

use super::{PlayStatus, PlaybackBackend, SampleRequest, SoundSystem, StartRequest};
use crate::bus::{CoprocessorBus, RegisterWindow};
use crate::channel::ChannelSelect;
use crate::codec::{self, layout, ChannelMask};
use crate::driver::{DriverLoader, DriverVariant};
use crate::sample::{NullFamily, NullSamples, SampleDescriptor};

/// Register sequences shared by the multi-channel sample drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiChannelPcm {
    variant: DriverVariant,
    null: SampleDescriptor,
    shift: u32,
}

impl MultiChannelPcm {
    /// Backend for one of the multi-channel variants
    ///
    /// Other variants are treated as 8-bit PCM.
    pub fn new(variant: DriverVariant, null_samples: &NullSamples) -> Self {
        let family = variant.null_family().unwrap_or(NullFamily::Pcm8);
        MultiChannelPcm {
            variant,
            null: null_samples.descriptor(family),
            shift: family.shift(),
        }
    }

    /// Number of channels
    pub fn channel_count(&self) -> u8 {
        self.variant.channel_count()
    }
}

impl PlaybackBackend for MultiChannelPcm {
    fn variant(&self) -> DriverVariant {
        self.variant
    }

    fn status<B: CoprocessorBus + ?Sized>(&self, window: &RegisterWindow<'_, B>) -> PlayStatus {
        PlayStatus::Channels(codec::playing(window))
    }

    fn start<B: CoprocessorBus + ?Sized>(
        &self,
        window: &mut RegisterWindow<'_, B>,
        request: &StartRequest,
    ) -> u8 {
        let request = request.sample();
        let channel = request
            .channel
            .resolve(codec::playing(window), self.channel_count());

        codec::encode_sample(
            window,
            layout::channel_params(channel),
            request.sample,
            self.shift,
        );
        codec::pulse_play(window, channel);
        codec::set_loop(window, channel, request.looping);
        channel
    }

    fn stop<B: CoprocessorBus + ?Sized>(&self, window: &mut RegisterWindow<'_, B>, channel: u8) {
        codec::arm_null_sample(window, channel, self.null, self.shift);
        codec::clear_channel_status(window, channel);
    }

    fn set_volume<B: CoprocessorBus + ?Sized>(
        &self,
        window: &mut RegisterWindow<'_, B>,
        channel: u8,
        volume: u8,
    ) {
        if self.variant.has_volume() {
            codec::write_volume(window, channel, volume);
        }
    }

    fn volume<B: CoprocessorBus + ?Sized>(
        &self,
        window: &RegisterWindow<'_, B>,
        channel: u8,
    ) -> Option<u8> {
        self.variant
            .has_volume()
            .then(|| codec::read_volume(window, channel))
    }
}

impl<B: CoprocessorBus, L: DriverLoader<B>> SoundSystem<B, L> {
    fn start_multi(
        &mut self,
        variant: DriverVariant,
        sample: SampleDescriptor,
        channel: ChannelSelect,
        looping: bool,
    ) -> u8 {
        let request = SampleRequest::new(sample).channel(channel).looping(looping);
        self.start(variant, &request.into())
    }

    /// Playing bits of the dual ADPCM driver, restricted to `mask`
    pub fn is_playing_2adpcm(&mut self, mask: ChannelMask) -> ChannelMask {
        self.status(DriverVariant::DualChannelAdpcm).channels() & mask
    }

    /// Play `sample` on the dual ADPCM driver; returns the channel used
    ///
    /// Address and length should be multiples of 128.
    pub fn start_play_2adpcm(
        &mut self,
        sample: SampleDescriptor,
        channel: ChannelSelect,
        looping: bool,
    ) -> u8 {
        self.start_multi(DriverVariant::DualChannelAdpcm, sample, channel, looping)
    }

    /// Stop a dual ADPCM channel; no effect when idle
    pub fn stop_play_2adpcm(&mut self, channel: u8) {
        self.stop(DriverVariant::DualChannelAdpcm, channel);
    }

    /// Playing bits of the quad PCM driver, restricted to `mask`
    pub fn is_playing_4pcm(&mut self, mask: ChannelMask) -> ChannelMask {
        self.status(DriverVariant::QuadChannelPcm).channels() & mask
    }

    /// Play `sample` on the quad PCM driver; returns the channel used
    ///
    /// Address and length should be multiples of 256.
    pub fn start_play_4pcm(
        &mut self,
        sample: SampleDescriptor,
        channel: ChannelSelect,
        looping: bool,
    ) -> u8 {
        self.start_multi(DriverVariant::QuadChannelPcm, sample, channel, looping)
    }

    /// Stop a quad PCM channel; no effect when idle
    pub fn stop_play_4pcm(&mut self, channel: u8) {
        self.stop(DriverVariant::QuadChannelPcm, channel);
    }

    /// Playing bits of the envelope driver, restricted to `mask`
    pub fn is_playing_4pcm_env(&mut self, mask: ChannelMask) -> ChannelMask {
        self.status(DriverVariant::QuadChannelPcmEnv).channels() & mask
    }

    /// Play `sample` on the envelope driver; returns the channel used
    ///
    /// Address and length should be multiples of 256.
    pub fn start_play_4pcm_env(
        &mut self,
        sample: SampleDescriptor,
        channel: ChannelSelect,
        looping: bool,
    ) -> u8 {
        self.start_multi(DriverVariant::QuadChannelPcmEnv, sample, channel, looping)
    }

    /// Stop an envelope driver channel; no effect when idle
    pub fn stop_play_4pcm_env(&mut self, channel: u8) {
        self.stop(DriverVariant::QuadChannelPcmEnv, channel);
    }

    /// Set a channel volume, 0 (quiet) to 15 (loud); higher bits are dropped
    pub fn set_volume_4pcm_env(&mut self, channel: u8, volume: u8) {
        self.set_volume(DriverVariant::QuadChannelPcmEnv, channel, volume);
    }

    /// Channel volume, 0 to 15
    pub fn volume_4pcm_env(&mut self, channel: u8) -> u8 {
        self.volume(DriverVariant::QuadChannelPcmEnv, channel)
            .unwrap_or_default()
    }
}
