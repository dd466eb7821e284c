//! Channel allocation
//!
//! Multi-channel drivers let the caller pin a channel or ask for any free one.
//! "Free" means the playing bit is clear in the status byte sampled inside the
//! same bus critical section that then writes the parameters. When every channel is
//! busy, channel 0 is reused; a new sound never fails to start.

use crate::codec::ChannelMask;

/// Which channel a sample should play on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelSelect {
    /// First idle channel, or channel 0 when all are busy
    #[default]
    Auto,
    /// This channel, playing or not; the index is not range checked
    Channel(u8),
}

impl From<u8> for ChannelSelect {
    fn from(channel: u8) -> Self {
        ChannelSelect::Channel(channel)
    }
}

impl ChannelSelect {
    /// Resolve to a concrete channel given the current playing bits
    pub fn resolve(self, playing: ChannelMask, channel_count: u8) -> u8 {
        match self {
            ChannelSelect::Channel(channel) => channel,
            ChannelSelect::Auto => first_free(playing, channel_count),
        }
    }
}

/// Lowest channel below `channel_count` whose playing bit is clear, else 0
pub fn first_free(playing: ChannelMask, channel_count: u8) -> u8 {
    (0..channel_count)
        .find(|&ch| !playing.has_channel(ch))
        .unwrap_or(0)
}
