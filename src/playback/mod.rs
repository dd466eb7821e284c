//! Playback facade
//!
//! [`SoundSystem`] is the only entry point game code needs. Every operation runs the
//! same three steps:
//!
//! 1. make sure the right driver is loaded (outside the critical section),
//! 2. open a [`RegisterWindow`] and run the variant's register sequence,
//! 3. drop the window, which releases the bus.
//!
//! Tracker B is the exception: it only reads its parameters when it boots, so the
//! song address is written first, then the driver is loaded and the co-processor is
//! reset.
//!
//! The per-variant operations (`start_play_4pcm`, `mvs_mode`, ...) are thin wrappers
//! over the generic [`SoundSystem::start`] family, which dispatches through the
//! closed [`Backend`] enum.

mod multi;
mod pcm;
mod tracker;

pub use multi::MultiChannelPcm;
pub use pcm::{SingleChannelPcm, SoundPan, SoundRate};
pub use tracker::{MvsTracker, TfmTracker};

use crate::bus::{CoprocessorBus, RegisterWindow};
use crate::channel::ChannelSelect;
use crate::codec::{ChannelMask, TrackerMode};
use crate::config::SoundConfig;
use crate::driver::{ActiveDriver, DriverLoader, DriverVariant};
use crate::sample::{NullSamples, SampleDescriptor};

/// Coarse play state, as far as the driver reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStatus {
    /// Playing bits of the sample channels
    Channels(ChannelMask),
    /// Tracker A play mode
    Tracker(TrackerMode),
    /// The driver has no status readback
    Unavailable,
}

impl PlayStatus {
    /// Whether anything is playing; `false` when unknown
    pub fn is_active(&self) -> bool {
        match self {
            PlayStatus::Channels(mask) => !mask.is_empty(),
            PlayStatus::Tracker(mode) => mode.is_playing(),
            PlayStatus::Unavailable => false,
        }
    }

    /// Channel bits, empty for trackers
    pub fn channels(&self) -> ChannelMask {
        match self {
            PlayStatus::Channels(mask) => *mask,
            _ => ChannelMask::empty(),
        }
    }
}

/// Sample start parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRequest {
    /// Sample to play
    pub sample: SampleDescriptor,
    /// Target channel
    pub channel: ChannelSelect,
    /// Restart at the end
    pub looping: bool,
    /// Playback rate (single channel PCM only)
    pub rate: SoundRate,
    /// Output panning (single channel PCM only)
    pub pan: SoundPan,
}

impl SampleRequest {
    /// One-shot on any free channel, 16 kHz centered
    pub fn new(sample: SampleDescriptor) -> Self {
        SampleRequest {
            sample,
            channel: ChannelSelect::Auto,
            looping: false,
            rate: SoundRate::default(),
            pan: SoundPan::default(),
        }
    }

    /// Set the target channel
    pub fn channel(mut self, channel: impl Into<ChannelSelect>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Set the loop flag
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Set the playback rate
    pub fn rate(mut self, rate: SoundRate) -> Self {
        self.rate = rate;
        self
    }

    /// Set the panning
    pub fn pan(mut self, pan: SoundPan) -> Self {
        self.pan = pan;
        self
    }
}

/// What to start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRequest {
    /// A sample, for the PCM and ADPCM drivers
    Sample(SampleRequest),
    /// A song, for the tracker drivers
    Song {
        /// Song data address
        address: u32,
        /// Restart at the end (tracker A only)
        looping: bool,
    },
}

impl StartRequest {
    /// The request seen as a sample
    ///
    /// A song becomes a zero-length sample at the song address.
    pub fn sample(&self) -> SampleRequest {
        match *self {
            StartRequest::Sample(request) => request,
            StartRequest::Song { address, looping } => {
                SampleRequest::new(SampleDescriptor::new(address, 0)).looping(looping)
            }
        }
    }

    /// The request seen as a song: `(address, looping)`
    pub fn song(&self) -> (u32, bool) {
        match *self {
            StartRequest::Sample(request) => (request.sample.address, request.looping),
            StartRequest::Song { address, looping } => (address, looping),
        }
    }
}

impl From<SampleRequest> for StartRequest {
    fn from(request: SampleRequest) -> Self {
        StartRequest::Sample(request)
    }
}

/// When a driver reads its start parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrder {
    /// Load the driver, then write commands it polls for
    LoadFirst,
    /// Write parameters, load the driver, then reset so it boots with them
    LatchedAtBoot,
}

/// Register sequences of one driver family
///
/// Every method runs inside an already open window; loading the driver and
/// taking the bus are the facade's job.
pub trait PlaybackBackend {
    /// Driver this backend talks to
    fn variant(&self) -> DriverVariant;

    /// Ordering of parameter writes relative to loading
    fn load_order(&self) -> LoadOrder {
        LoadOrder::LoadFirst
    }

    /// Read the play state
    fn status<B: CoprocessorBus + ?Sized>(&self, window: &RegisterWindow<'_, B>) -> PlayStatus;

    /// Write a start command; returns the channel used
    fn start<B: CoprocessorBus + ?Sized>(
        &self,
        window: &mut RegisterWindow<'_, B>,
        request: &StartRequest,
    ) -> u8;

    /// Stop `channel` (ignored by single channel drivers)
    fn stop<B: CoprocessorBus + ?Sized>(&self, window: &mut RegisterWindow<'_, B>, channel: u8);

    /// Set a channel volume; no-op without volume support
    fn set_volume<B: CoprocessorBus + ?Sized>(
        &self,
        _window: &mut RegisterWindow<'_, B>,
        _channel: u8,
        _volume: u8,
    ) {
    }

    /// Channel volume, `None` without volume support
    fn volume<B: CoprocessorBus + ?Sized>(
        &self,
        _window: &RegisterWindow<'_, B>,
        _channel: u8,
    ) -> Option<u8> {
        None
    }
}

/// Backend of every driver variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Single channel PCM
    SingleChannelPcm(SingleChannelPcm),
    /// Dual ADPCM, quad PCM and quad PCM with envelope
    MultiChannelPcm(MultiChannelPcm),
    /// Tracker A
    MvsTracker(MvsTracker),
    /// Tracker B
    TfmTracker(TfmTracker),
}

impl Backend {
    /// Backend for `variant`, stopping channels with `null_samples`
    pub fn new(variant: DriverVariant, null_samples: &NullSamples) -> Self {
        match variant {
            DriverVariant::SingleChannelPcm => {
                Backend::SingleChannelPcm(SingleChannelPcm::new(null_samples))
            }
            DriverVariant::DualChannelAdpcm
            | DriverVariant::QuadChannelPcm
            | DriverVariant::QuadChannelPcmEnv => {
                Backend::MultiChannelPcm(MultiChannelPcm::new(variant, null_samples))
            }
            DriverVariant::TrackerMvs => Backend::MvsTracker(MvsTracker),
            DriverVariant::TrackerTfm => Backend::TfmTracker(TfmTracker),
        }
    }
}

macro_rules! dispatch {
    ($self:expr, $backend:ident => $body:expr) => {
        match $self {
            Backend::SingleChannelPcm($backend) => $body,
            Backend::MultiChannelPcm($backend) => $body,
            Backend::MvsTracker($backend) => $body,
            Backend::TfmTracker($backend) => $body,
        }
    };
}

impl PlaybackBackend for Backend {
    fn variant(&self) -> DriverVariant {
        dispatch!(self, b => b.variant())
    }

    fn load_order(&self) -> LoadOrder {
        dispatch!(self, b => b.load_order())
    }

    fn status<B: CoprocessorBus + ?Sized>(&self, window: &RegisterWindow<'_, B>) -> PlayStatus {
        dispatch!(self, b => b.status(window))
    }

    fn start<B: CoprocessorBus + ?Sized>(
        &self,
        window: &mut RegisterWindow<'_, B>,
        request: &StartRequest,
    ) -> u8 {
        dispatch!(self, b => b.start(window, request))
    }

    fn stop<B: CoprocessorBus + ?Sized>(&self, window: &mut RegisterWindow<'_, B>, channel: u8) {
        dispatch!(self, b => b.stop(window, channel))
    }

    fn set_volume<B: CoprocessorBus + ?Sized>(
        &self,
        window: &mut RegisterWindow<'_, B>,
        channel: u8,
        volume: u8,
    ) {
        dispatch!(self, b => b.set_volume(window, channel, volume))
    }

    fn volume<B: CoprocessorBus + ?Sized>(
        &self,
        window: &RegisterWindow<'_, B>,
        channel: u8,
    ) -> Option<u8> {
        dispatch!(self, b => b.volume(window, channel))
    }
}

/// Main-processor side of the sound co-processor
///
/// Owns the bus handle, the driver loader and the record of which driver is
/// loaded. Operations never fail: contract violations (misaligned samples,
/// out-of-range channels) produce wrong audio, not errors.
pub struct SoundSystem<B: CoprocessorBus, L: DriverLoader<B>> {
    bus: B,
    loader: L,
    driver: ActiveDriver,
    config: SoundConfig,
}

impl<B: CoprocessorBus, L: DriverLoader<B>> SoundSystem<B, L> {
    /// Create with the default configuration; no driver is loaded yet
    pub fn new(bus: B, loader: L) -> Self {
        Self::with_config(bus, loader, SoundConfig::default())
    }

    /// Create with an explicit configuration
    pub fn with_config(bus: B, loader: L, config: SoundConfig) -> Self {
        SoundSystem {
            bus,
            loader,
            driver: ActiveDriver::new(),
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &SoundConfig {
        &self.config
    }

    /// Variant currently running on the co-processor
    pub fn loaded_driver(&self) -> Option<DriverVariant> {
        self.driver.loaded()
    }

    /// Number of driver uploads so far
    pub fn driver_switches(&self) -> u32 {
        self.driver.switch_count()
    }

    /// The bus handle
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Give back the bus handle and loader
    pub fn into_parts(self) -> (B, L) {
        (self.bus, self.loader)
    }

    /// Load `variant` unless it is already running
    ///
    /// Returns `true` when an upload happened.
    pub fn load_driver(&mut self, variant: DriverVariant) -> bool {
        self.driver.ensure(&mut self.loader, &mut self.bus, variant)
    }

    /// Backend for `variant` under the current configuration
    pub fn backend_for(&self, variant: DriverVariant) -> Backend {
        Backend::new(variant, &self.config.null_samples)
    }

    /// Backend of the loaded driver
    pub fn backend(&self) -> Option<Backend> {
        self.driver.loaded().map(|variant| self.backend_for(variant))
    }

    fn window(&mut self) -> RegisterWindow<'_, B> {
        RegisterWindow::acquire(&mut self.bus).with_trace(self.config.trace_registers)
    }

    /// Backend for a query, stop or volume call on `variant`, loading it first
    ///
    /// `None` for drivers that only read parameters at boot: loading one of those
    /// would replace the running driver and start it on a stale song address, so
    /// those calls leave the bus alone.
    fn polled_backend(&mut self, variant: DriverVariant) -> Option<Backend> {
        let backend = self.backend_for(variant);
        match backend.load_order() {
            LoadOrder::LoadFirst => {
                self.load_driver(variant);
                Some(backend)
            }
            LoadOrder::LatchedAtBoot => {
                log::trace!("{variant}: no runtime registers, bus untouched");
                None
            }
        }
    }

    /// Play state reported by `variant`
    pub fn status(&mut self, variant: DriverVariant) -> PlayStatus {
        let Some(backend) = self.polled_backend(variant) else {
            return PlayStatus::Unavailable;
        };
        let window = self.window();
        backend.status(&window)
    }

    /// Start a sample or song on `variant`; returns the channel used
    pub fn start(&mut self, variant: DriverVariant, request: &StartRequest) -> u8 {
        let backend = self.backend_for(variant);
        match backend.load_order() {
            LoadOrder::LoadFirst => {
                self.load_driver(variant);
                let mut window = self.window();
                let channel = backend.start(&mut window, request);
                log::trace!("{variant}: start {request:?} on channel {channel}");
                channel
            }
            LoadOrder::LatchedAtBoot => {
                let channel = {
                    let mut window = self.window();
                    backend.start(&mut window, request)
                };
                self.load_driver(variant);
                // restart even when the driver was already running
                self.bus.reset();
                log::debug!("{variant}: co-processor reset to latch {request:?}");
                channel
            }
        }
    }

    /// Stop `channel` on `variant`
    pub fn stop(&mut self, variant: DriverVariant, channel: u8) {
        let Some(backend) = self.polled_backend(variant) else {
            return;
        };
        let mut window = self.window();
        backend.stop(&mut window, channel);
        log::trace!("{variant}: stop channel {channel}");
    }

    /// Set a channel volume (0-15); ignored by drivers without volume
    pub fn set_volume(&mut self, variant: DriverVariant, channel: u8, volume: u8) {
        let Some(backend) = self.polled_backend(variant) else {
            return;
        };
        let mut window = self.window();
        backend.set_volume(&mut window, channel, volume);
    }

    /// Channel volume, `None` for drivers without volume
    pub fn volume(&mut self, variant: DriverVariant, channel: u8) -> Option<u8> {
        let backend = self.polled_backend(variant)?;
        let window = self.window();
        backend.volume(&window, channel)
    }

    /// Whether the driver has set its ready flag
    ///
    /// Sampled once; nothing in this crate waits on it.
    pub fn is_driver_ready(&mut self) -> bool {
        let window = self.window();
        crate::codec::is_ready(&window)
    }
}
