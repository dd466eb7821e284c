//! Driver variants and loading
//!
//! The co-processor runs exactly one firmware image at a time. Each image speaks its
//! own dialect of the register layout, so the variant decides channel count, sample
//! block size and how a channel is stopped.

pub mod image_loader;

pub use image_loader::ImageLoader;

use crate::bus::CoprocessorBus;
use crate::sample::NullFamily;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Firmware image running on the co-processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriverVariant {
    /// One 8-bit PCM channel with rate and pan control
    SingleChannelPcm,
    /// Two 4-bit ADPCM channels
    DualChannelAdpcm,
    /// Four 8-bit PCM channels, software mixed
    QuadChannelPcm,
    /// Four 8-bit PCM channels with per-channel volume envelope
    QuadChannelPcmEnv,
    /// Tracker A (MVS)
    TrackerMvs,
    /// Tracker B (TFM), parameters latched at boot
    TrackerTfm,
}

impl DriverVariant {
    /// Every variant in firmware id order
    pub const ALL: [DriverVariant; 6] = [
        DriverVariant::SingleChannelPcm,
        DriverVariant::DualChannelAdpcm,
        DriverVariant::QuadChannelPcm,
        DriverVariant::QuadChannelPcmEnv,
        DriverVariant::TrackerMvs,
        DriverVariant::TrackerTfm,
    ];

    /// Firmware id (1-based)
    pub fn id(self) -> u16 {
        match self {
            DriverVariant::SingleChannelPcm => 1,
            DriverVariant::DualChannelAdpcm => 2,
            DriverVariant::QuadChannelPcm => 3,
            DriverVariant::QuadChannelPcmEnv => 4,
            DriverVariant::TrackerMvs => 5,
            DriverVariant::TrackerTfm => 6,
        }
    }

    /// Variant for a firmware id
    pub fn from_id(id: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.id() == id)
    }

    /// Number of sample channels (trackers count as one)
    pub fn channel_count(self) -> u8 {
        match self {
            DriverVariant::DualChannelAdpcm => 2,
            DriverVariant::QuadChannelPcm | DriverVariant::QuadChannelPcmEnv => 4,
            _ => 1,
        }
    }

    /// Family of the null sample this variant stops channels with
    pub fn null_family(self) -> Option<NullFamily> {
        match self {
            DriverVariant::SingleChannelPcm
            | DriverVariant::QuadChannelPcm
            | DriverVariant::QuadChannelPcmEnv => Some(NullFamily::Pcm8),
            DriverVariant::DualChannelAdpcm => Some(NullFamily::Adpcm4),
            DriverVariant::TrackerMvs | DriverVariant::TrackerTfm => None,
        }
    }

    /// Boundary shift of sample parameters, `None` for trackers
    pub fn sample_shift(self) -> Option<u32> {
        self.null_family().map(NullFamily::shift)
    }

    /// Required sample alignment in bytes
    pub fn boundary(self) -> Option<usize> {
        self.sample_shift().map(|s| 1usize << s)
    }

    /// Whether channels have a volume register
    pub fn has_volume(self) -> bool {
        self == DriverVariant::QuadChannelPcmEnv
    }

    /// Short name used on the command line and in config files
    pub fn name(self) -> &'static str {
        match self {
            DriverVariant::SingleChannelPcm => "pcm",
            DriverVariant::DualChannelAdpcm => "2adpcm",
            DriverVariant::QuadChannelPcm => "4pcm",
            DriverVariant::QuadChannelPcmEnv => "4pcm-env",
            DriverVariant::TrackerMvs => "mvs",
            DriverVariant::TrackerTfm => "tfm",
        }
    }

    /// Parse a short name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        Self::ALL.into_iter().find(|v| v.name() == name)
    }
}

impl fmt::Display for DriverVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uploads a firmware image into the co-processor
///
/// `load` is unconditional; [`ActiveDriver::ensure`] decides whether it runs. It is
/// always called outside any [`RegisterWindow`](crate::bus::RegisterWindow) and is
/// expected to take the bus itself.
pub trait DriverLoader<B: CoprocessorBus + ?Sized> {
    /// Upload `variant` and restart the co-processor
    fn load(&mut self, bus: &mut B, variant: DriverVariant);
}

impl<B, F> DriverLoader<B> for F
where
    B: CoprocessorBus + ?Sized,
    F: FnMut(&mut B, DriverVariant),
{
    fn load(&mut self, bus: &mut B, variant: DriverVariant) {
        self(bus, variant)
    }
}

/// Which variant is loaded, and the single place that changes it
#[derive(Debug, Clone, Default)]
pub struct ActiveDriver {
    loaded: Option<DriverVariant>,
    switches: u32,
}

impl ActiveDriver {
    /// Nothing loaded yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `variant` unless it is already running
    ///
    /// Returns `true` when the loader was invoked.
    pub fn ensure<B, L>(&mut self, loader: &mut L, bus: &mut B, variant: DriverVariant) -> bool
    where
        B: CoprocessorBus + ?Sized,
        L: DriverLoader<B> + ?Sized,
    {
        if self.loaded == Some(variant) {
            return false;
        }
        log::debug!(
            "switching sound driver: {} -> {} (id {})",
            self.loaded.map_or("none", DriverVariant::name),
            variant,
            variant.id()
        );
        loader.load(bus, variant);
        self.loaded = Some(variant);
        self.switches += 1;
        true
    }

    /// Currently loaded variant
    pub fn loaded(&self) -> Option<DriverVariant> {
        self.loaded
    }

    /// Number of uploads so far
    pub fn switch_count(&self) -> u32 {
        self.switches
    }
}
