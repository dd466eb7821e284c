//! WAV to driver sample conversion
//!
//! Host-side preparation of sample data: decode a WAV file, downmix, resample and
//! requantize it to the raw format a driver streams, then pad it to the driver's
//! block boundary. This is where [`SoundError::UnsupportedConversion`] comes from;
//! nothing on the playback path can fail.

use crate::driver::DriverVariant;
use crate::playback::SoundRate;
use crate::{Result, SoundError};
use hound::{SampleFormat, WavReader, WavSpec};
use std::io::Read;
use std::path::Path;

/// Rate the quad channel drivers mix at
pub const QUAD_PCM_RATE: u32 = 16000;

/// Raw output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetFormat {
    /// Bits per sample (8 or 16)
    pub bits: u16,
    /// Output rate in Hz, 0 keeps the source rate
    pub rate: u32,
    /// Downmix to a single channel
    pub mono: bool,
    /// Signed samples (two's complement)
    pub signed: bool,
    /// Big-endian byte order for 16-bit samples
    pub big_endian: bool,
}

impl TargetFormat {
    /// 8-bit signed mono at `rate`
    pub fn pcm8(rate: u32) -> Self {
        TargetFormat {
            bits: 8,
            rate,
            mono: true,
            signed: true,
            big_endian: false,
        }
    }

    /// Format a driver plays, at `rate` when the driver supports it
    ///
    /// The single channel driver takes any [`SoundRate`] (16 kHz by default), the
    /// quad drivers only their fixed mixing rate. ADPCM encoding and tracker data are
    /// not produced here.
    pub fn for_variant(variant: DriverVariant, rate: Option<u32>) -> Result<Self> {
        match variant {
            DriverVariant::SingleChannelPcm => {
                let rate = rate.unwrap_or(SoundRate::default().hz());
                if SoundRate::from_hz(rate).is_none() {
                    return Err(SoundError::UnsupportedConversion(format!(
                        "{variant} driver cannot play at {rate} Hz"
                    )));
                }
                Ok(Self::pcm8(rate))
            }
            DriverVariant::QuadChannelPcm | DriverVariant::QuadChannelPcmEnv => {
                match rate {
                    None | Some(QUAD_PCM_RATE) => Ok(Self::pcm8(QUAD_PCM_RATE)),
                    Some(other) => Err(SoundError::UnsupportedConversion(format!(
                        "{variant} driver mixes at {QUAD_PCM_RATE} Hz, not {other} Hz"
                    ))),
                }
            }
            DriverVariant::DualChannelAdpcm => Err(SoundError::UnsupportedConversion(
                "ADPCM encoding is not supported".to_string(),
            )),
            DriverVariant::TrackerMvs | DriverVariant::TrackerTfm => {
                Err(SoundError::UnsupportedConversion(format!(
                    "{variant} driver plays song data, not samples"
                )))
            }
        }
    }

    /// Byte pattern of a silent sample
    pub fn silence(&self) -> &'static [u8] {
        match (self.bits, self.signed, self.big_endian) {
            (8, false, _) => &[0x80],
            (16, false, false) => &[0x00, 0x80],
            (16, false, true) => &[0x80, 0x00],
            _ => &[0x00],
        }
    }
}

/// Convert a WAV file to raw sample data
///
/// # Example
///
/// ```no_run
/// use sound_copro::{pad_to_boundary, raw_from_wav, DriverVariant, TargetFormat};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let target = TargetFormat::for_variant(DriverVariant::QuadChannelPcm, None)?;
/// let mut data = raw_from_wav("explosion.wav", target)?;
/// pad_to_boundary(&mut data, 256, target.silence());
/// std::fs::write("explosion.raw", &data)?;
/// # Ok(())
/// # }
/// ```
pub fn raw_from_wav<P: AsRef<Path>>(path: P, target: TargetFormat) -> Result<Vec<u8>> {
    let reader = WavReader::open(path)?;
    convert(reader, target)
}

/// Convert WAV data from any reader
pub fn raw_from_reader<R: Read>(reader: R, target: TargetFormat) -> Result<Vec<u8>> {
    convert(WavReader::new(reader)?, target)
}

fn convert<R: Read>(reader: WavReader<R>, target: TargetFormat) -> Result<Vec<u8>> {
    let spec = reader.spec();
    check_supported(&spec, &target)?;

    let out_rate = if target.rate == 0 {
        spec.sample_rate
    } else {
        target.rate
    };
    log::debug!(
        "converting {} Hz x{} {}-bit -> {} Hz{} {}-bit {}",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        out_rate,
        if target.mono { " mono" } else { "" },
        target.bits,
        if target.signed { "signed" } else { "unsigned" }
    );

    let mut channels = spec.channels as usize;
    let mut samples = decode(reader, &spec)?;
    if target.mono && channels > 1 {
        samples = downmix(&samples, channels);
        channels = 1;
    }
    let samples = resample_linear(&samples, channels, spec.sample_rate, out_rate);
    Ok(quantize(&samples, &target))
}

fn check_supported(spec: &WavSpec, target: &TargetFormat) -> Result<()> {
    if target.bits != 8 && target.bits != 16 {
        return Err(SoundError::UnsupportedConversion(format!(
            "{}-bit output",
            target.bits
        )));
    }
    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(SoundError::UnsupportedConversion(
            "WAV without channels or sample rate".to_string(),
        ));
    }
    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 1..=32) | (SampleFormat::Float, 32) => Ok(()),
        (format, bits) => Err(SoundError::UnsupportedConversion(format!(
            "{bits}-bit {format:?} WAV input"
        ))),
    }
}

/// Samples scaled to [-1.0, 1.0], interleaved
fn decode<R: Read>(reader: WavReader<R>, spec: &WavSpec) -> Result<Vec<f32>> {
    match spec.sample_format {
        SampleFormat::Float => Ok(reader.into_samples::<f32>().collect::<hound::Result<_>>()?),
        SampleFormat::Int => {
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f32;
            let samples = reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<hound::Result<_>>()?;
            Ok(samples)
        }
    }
}

fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear interpolation between neighbouring frames
pub(crate) fn resample_linear(samples: &[f32], channels: usize, from: u32, to: u32) -> Vec<f32> {
    let frames = samples.len() / channels.max(1);
    if from == to || from == 0 || to == 0 || frames == 0 {
        return samples.to_vec();
    }

    let out_frames = ((frames as u64 * to as u64) / from as u64).max(1) as usize;
    let step = from as f64 / to as f64;
    let mut out = Vec::with_capacity(out_frames * channels);

    for i in 0..out_frames {
        let pos = i as f64 * step;
        let idx = (pos.floor() as usize).min(frames - 1);
        let next = (idx + 1).min(frames - 1);
        let frac = (pos - idx as f64) as f32;
        for c in 0..channels {
            let a = samples[idx * channels + c];
            let b = samples[next * channels + c];
            out.push(a + (b - a) * frac);
        }
    }
    out
}

fn quantize(samples: &[f32], target: &TargetFormat) -> Vec<u8> {
    let bytes_per_sample = (target.bits / 8) as usize;
    let mut out = Vec::with_capacity(samples.len() * bytes_per_sample);
    for &sample in samples {
        let sample = sample.clamp(-1.0, 1.0);
        if target.bits == 8 {
            let value = (sample * i8::MAX as f32).round() as i8;
            out.push(if target.signed {
                value as u8
            } else {
                (value as i16 + 128) as u8
            });
        } else {
            let value = (sample * i16::MAX as f32).round() as i16;
            let word = if target.signed {
                value as u16
            } else {
                (value as i32 + 32768) as u16
            };
            if target.big_endian {
                out.extend_from_slice(&word.to_be_bytes());
            } else {
                out.extend_from_slice(&word.to_le_bytes());
            }
        }
    }
    out
}

/// Pad `data` with the `fill` pattern up to a multiple of `boundary` bytes
///
/// Drivers only see whole blocks, so an unpadded tail would be cut off.
pub fn pad_to_boundary(data: &mut Vec<u8>, boundary: usize, fill: &[u8]) {
    if boundary == 0 || fill.is_empty() {
        return;
    }
    let padded = data.len().div_ceil(boundary) * boundary;
    while data.len() < padded {
        data.push(fill[data.len() % fill.len()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    fn wav_i16(channels: u16, rate: u32, samples: &[i16]) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_pcm8_signed_quantization() {
        let wav = wav_i16(1, 16000, &[0, 16384, -16384, 32767]);
        let raw = raw_from_reader(Cursor::new(wav), TargetFormat::pcm8(16000)).unwrap();
        assert_eq!(raw, vec![0x00, 64, 0xC0, 127]);
    }

    #[test]
    fn test_unsigned_output_is_offset() {
        let wav = wav_i16(1, 16000, &[0, -32768]);
        let target = TargetFormat {
            signed: false,
            ..TargetFormat::pcm8(0)
        };
        let raw = raw_from_reader(Cursor::new(wav), target).unwrap();
        assert_eq!(raw, vec![0x80, 0x01]);
    }

    #[test]
    fn test_stereo_downmix() {
        let wav = wav_i16(2, 16000, &[16384, -16384, 16384, 16384]);
        let raw = raw_from_reader(Cursor::new(wav), TargetFormat::pcm8(16000)).unwrap();
        assert_eq!(raw, vec![0, 64]);
    }

    #[test]
    fn test_sixteen_bit_byte_order() {
        let wav = wav_i16(1, 8000, &[0x1234]);
        let mut target = TargetFormat {
            bits: 16,
            ..TargetFormat::pcm8(0)
        };
        let raw = raw_from_reader(Cursor::new(wav.clone()), target).unwrap();
        assert_eq!(raw.len(), 2);
        target.big_endian = true;
        let raw_be = raw_from_reader(Cursor::new(wav), target).unwrap();
        assert_eq!(raw_be, vec![raw[1], raw[0]]);
    }

    #[test]
    fn test_rate_zero_keeps_source_rate() {
        let samples: Vec<i16> = (0..100).map(|i| (i * 100) as i16).collect();
        let wav = wav_i16(1, 22050, &samples);
        let raw = raw_from_reader(Cursor::new(wav), TargetFormat::pcm8(0)).unwrap();
        assert_eq!(raw.len(), 100);
    }

    #[test]
    fn test_resample_linear() {
        let out = resample_linear(&[0.0, 0.5], 1, 8000, 16000);
        assert_eq!(out.len(), 4);
        assert_relative_eq!(out[0], 0.0);
        assert_relative_eq!(out[1], 0.25);
        assert_relative_eq!(out[2], 0.5);
        assert_relative_eq!(out[3], 0.5);

        let down = resample_linear(&[0.0, 0.1, 0.2, 0.3, 0.4, 0.5], 1, 32000, 16000);
        assert_eq!(down.len(), 3);
        assert_relative_eq!(down[1], 0.2);

        let stereo = resample_linear(&[0.0, 1.0, 0.5, 0.0], 2, 8000, 16000);
        assert_eq!(stereo.len(), 8);
        assert_relative_eq!(stereo[2], 0.25);
        assert_relative_eq!(stereo[3], 0.5);
    }

    #[test]
    fn test_unsupported_output_bits() {
        let wav = wav_i16(1, 16000, &[0]);
        let target = TargetFormat {
            bits: 12,
            ..TargetFormat::pcm8(16000)
        };
        let err = raw_from_reader(Cursor::new(wav), target).unwrap_err();
        assert!(matches!(err, SoundError::UnsupportedConversion(_)));
    }

    #[test]
    fn test_invalid_wav_is_wav_error() {
        let err = raw_from_reader(Cursor::new(b"not a wav".to_vec()), TargetFormat::pcm8(0))
            .unwrap_err();
        assert!(matches!(err, SoundError::Wav(_)));
    }

    #[test]
    fn test_variant_presets() {
        let target = TargetFormat::for_variant(DriverVariant::QuadChannelPcm, None).unwrap();
        assert_eq!(target, TargetFormat::pcm8(16000));
        let target =
            TargetFormat::for_variant(DriverVariant::SingleChannelPcm, Some(22050)).unwrap();
        assert_eq!(target.rate, 22050);

        for (variant, rate) in [
            (DriverVariant::SingleChannelPcm, Some(44100)),
            (DriverVariant::QuadChannelPcmEnv, Some(22050)),
            (DriverVariant::DualChannelAdpcm, None),
            (DriverVariant::TrackerMvs, None),
        ] {
            assert!(matches!(
                TargetFormat::for_variant(variant, rate),
                Err(SoundError::UnsupportedConversion(_))
            ));
        }
    }

    #[test]
    fn test_pad_to_boundary() {
        let mut data = vec![1u8; 300];
        pad_to_boundary(&mut data, 256, &[0x80]);
        assert_eq!(data.len(), 512);
        assert!(data[300..].iter().all(|&b| b == 0x80));

        let mut exact = vec![0u8; 256];
        pad_to_boundary(&mut exact, 256, &[0x80]);
        assert_eq!(exact.len(), 256);

        let mut words = vec![0u8; 2];
        pad_to_boundary(&mut words, 8, &[0x00, 0x80]);
        assert_eq!(words, vec![0, 0, 0x00, 0x80, 0x00, 0x80, 0x00, 0x80]);
    }

    #[test]
    fn test_silence_patterns() {
        assert_eq!(TargetFormat::pcm8(0).silence(), &[0x00]);
        let unsigned = TargetFormat {
            signed: false,
            ..TargetFormat::pcm8(0)
        };
        assert_eq!(unsigned.silence(), &[0x80]);
    }

    #[test]
    fn test_raw_from_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        std::fs::write(&path, wav_i16(1, 8000, &[0, 16384, 0, -16384])).unwrap();

        let raw = raw_from_wav(&path, TargetFormat::pcm8(16000)).unwrap();
        assert_eq!(raw.len(), 8);
        assert_eq!(raw[0], 0);
        assert_eq!(raw[2], 64);
    }
}
