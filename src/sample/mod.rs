//! Sample Descriptors and Null Samples
//!
//! A sample is an opaque source address plus a byte length. Drivers only see the
//! address and length in block units (256 or 128 bytes), so both must be multiples
//! of the driver's boundary. Nothing on the playback path checks this; a misaligned
//! descriptor plays garbage rather than failing.
//!
//! Stopping a PCM-family channel is done by pointing it at a small "null" sample,
//! one buffer per sample format family.

#[cfg(feature = "convert")]
pub mod convert;

use serde::{Deserialize, Serialize};

/// Source address and byte length of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SampleDescriptor {
    /// Address of the first byte, as seen by the co-processor's banked view
    pub address: u32,
    /// Length in bytes
    pub len: u32,
}

impl SampleDescriptor {
    /// Create a descriptor
    pub const fn new(address: u32, len: u32) -> Self {
        SampleDescriptor { address, len }
    }

    /// Check that address and length are multiples of `1 << shift`
    ///
    /// For callers and tools; the codec never calls it.
    pub fn is_aligned(&self, shift: u32) -> bool {
        let mask = 1u32.checked_shl(shift).map_or(u32::MAX, |block| block - 1);
        self.address & mask == 0 && self.len & mask == 0
    }
}

/// 8-bit signed PCM silence
pub static NULL_PCM_SAMPLE: [u8; 256] = [0; 256];

/// 4-bit ADPCM silence
pub static NULL_ADPCM_SAMPLE: [u8; 128] = [0; 128];

/// Sample format family of a null sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullFamily {
    /// 8-bit signed PCM (single/quad PCM and envelope drivers)
    Pcm8,
    /// 4-bit ADPCM (dual ADPCM driver)
    Adpcm4,
}

impl NullFamily {
    /// The silent buffer for this family
    pub fn data(self) -> &'static [u8] {
        match self {
            NullFamily::Pcm8 => &NULL_PCM_SAMPLE,
            NullFamily::Adpcm4 => &NULL_ADPCM_SAMPLE,
        }
    }

    /// Boundary shift the family's parameters are encoded with
    pub fn shift(self) -> u32 {
        match self {
            NullFamily::Pcm8 => 8,
            NullFamily::Adpcm4 => 7,
        }
    }
}

/// Where the platform placed the null sample buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NullSamples {
    /// Address of [`NULL_PCM_SAMPLE`]
    pub pcm_address: u32,
    /// Address of [`NULL_ADPCM_SAMPLE`]
    pub adpcm_address: u32,
}

impl NullSamples {
    /// Default placement of the 8-bit buffer
    pub const DEFAULT_PCM_ADDRESS: u32 = 0x0001_0000;
    /// Default placement of the 4-bit buffer
    pub const DEFAULT_ADPCM_ADDRESS: u32 = 0x0001_0100;

    /// Descriptor of the null sample for `family`
    pub fn descriptor(&self, family: NullFamily) -> SampleDescriptor {
        let address = match family {
            NullFamily::Pcm8 => self.pcm_address,
            NullFamily::Adpcm4 => self.adpcm_address,
        };
        SampleDescriptor::new(address, family.data().len() as u32)
    }
}

impl Default for NullSamples {
    fn default() -> Self {
        NullSamples {
            pcm_address: Self::DEFAULT_PCM_ADDRESS,
            adpcm_address: Self::DEFAULT_ADPCM_ADDRESS,
        }
    }
}
