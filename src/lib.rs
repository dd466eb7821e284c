//! Sound co-processor control plane
//!
//! The main processor cannot generate audio itself. It hands that work to a small
//! secondary CPU running one of several fixed firmware images ("drivers") and talks
//! to it only through a shared, memory-mapped register window. This crate implements
//! that protocol: taking the shared bus, loading the right driver, encoding playback
//! commands into each driver's byte layout and reading coarse play status back.
//!
//! # Features
//! - Scoped bus ownership (`RegisterWindow`) released on every exit path
//! - Idempotent driver switching with explicit loaded-variant state
//! - Register codec for single/dual/quad channel PCM, ADPCM, envelope and tracker drivers
//! - Automatic channel allocation with first-free / steal-channel-0 policy
//! - Host-side WAV to driver sample conversion (`convert` feature)
//!
//! # Crate feature flags
//! - `convert` (default): WAV decoding and sample preparation (`sample::convert`)
//!
//! # Quick start
//! ```
//! use sound_copro::{ChannelSelect, ImageLoader, SampleDescriptor, SharedRam, SoundSystem};
//!
//! let ram = SharedRam::new();
//! let mut sound = SoundSystem::new(ram.clone(), ImageLoader::new());
//!
//! let explosion = SampleDescriptor::new(0x0004_0000, 0x0800);
//! let channel = sound.start_play_4pcm(explosion, ChannelSelect::Auto, false);
//! assert_eq!(channel, 0);
//!
//! sound.stop_play_4pcm(channel);
//! ```

#![warn(missing_docs)]

pub mod bus; // Shared bus arbitration and register window access
pub mod channel; // Channel allocation
pub mod codec; // Register protocol codec
pub mod config; // Configuration
pub mod driver; // Driver variants and loading
pub mod playback; // Playback facade
pub mod sample; // Sample descriptors, null samples, conversion

/// Error types for sound co-processor operations
#[derive(thiserror::Error, Debug)]
pub enum SoundError {
    /// The requested sample format or rate cannot be produced
    #[error("Unsupported conversion: {0}")]
    UnsupportedConversion(String),

    /// Error decoding a WAV file
    #[cfg(feature = "convert")]
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for SoundError {
    /// Converts a String into `SoundError::Other`.
    ///
    /// Prefer the specific variants (`UnsupportedConversion`, `ConfigError`) where the
    /// failure kind is known.
    fn from(msg: String) -> Self {
        SoundError::Other(msg)
    }
}

impl From<&str> for SoundError {
    fn from(msg: &str) -> Self {
        SoundError::Other(msg.to_string())
    }
}

/// Result type for sound co-processor operations
pub type Result<T> = std::result::Result<T, SoundError>;

// Public API exports
pub use bus::{CoprocessorBus, RegisterWindow, SharedRam};
pub use channel::ChannelSelect;
pub use codec::{ChannelMask, TrackerMode};
pub use config::SoundConfig;
pub use driver::{ActiveDriver, DriverLoader, DriverVariant, ImageLoader};
pub use playback::{
    Backend, LoadOrder, PlayStatus, PlaybackBackend, SampleRequest, SoundPan, SoundRate,
    SoundSystem, StartRequest,
};
pub use sample::{NullSamples, SampleDescriptor};

#[cfg(feature = "convert")]
pub use sample::convert::{pad_to_boundary, raw_from_wav, TargetFormat};
