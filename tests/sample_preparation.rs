//! Sample preparation through the filesystem

#![cfg(feature = "convert")]

use anyhow::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use sound_copro::{
    pad_to_boundary, raw_from_wav, ChannelSelect, DriverVariant, ImageLoader, SampleDescriptor,
    SharedRam, SoundError, SoundSystem, TargetFormat,
};
use std::path::Path;

fn write_sine(path: &Path, rate: u32, channels: u16, frames: usize) -> Result<()> {
    let spec = WavSpec {
        channels,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for i in 0..frames {
        let t = i as f32 / rate as f32;
        let value = ((t * 440.0 * std::f32::consts::TAU).sin() * 0.5 * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(value)?;
        }
    }
    writer.finalize()?;
    Ok(())
}

#[test]
fn test_prepare_for_quad_driver() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let wav = dir.path().join("tone.wav");
    write_sine(&wav, 32000, 2, 1000)?;

    let variant = DriverVariant::QuadChannelPcm;
    let target = TargetFormat::for_variant(variant, None)?;
    let mut data = raw_from_wav(&wav, target)?;
    assert_eq!(data.len(), 500);
    assert!(data.iter().all(|&b| (b as i8).unsigned_abs() <= 64));

    let boundary = variant.boundary().unwrap_or(1);
    pad_to_boundary(&mut data, boundary, target.silence());
    assert_eq!(data.len(), 512);
    assert!(data[500..].iter().all(|&b| b == 0));

    // the padded sample is encodable as-is
    let sample = SampleDescriptor::new(0x0002_0000, data.len() as u32);
    assert!(sample.is_aligned(variant.sample_shift().unwrap_or(0)));

    let ram = SharedRam::new();
    let mut sound = SoundSystem::new(ram.clone(), ImageLoader::new());
    assert_eq!(sound.start_play_4pcm(sample, ChannelSelect::Auto, false), 0);
    Ok(())
}

#[test]
fn test_single_channel_rate_choice() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let wav = dir.path().join("tone.wav");
    write_sine(&wav, 22050, 1, 2205)?;

    let target = TargetFormat::for_variant(DriverVariant::SingleChannelPcm, Some(11025))?;
    let data = raw_from_wav(&wav, target)?;
    assert_eq!(data.len(), 1102);

    let err = TargetFormat::for_variant(DriverVariant::SingleChannelPcm, Some(12000)).unwrap_err();
    assert!(matches!(err, SoundError::UnsupportedConversion(_)));
    Ok(())
}

#[test]
fn test_missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let result = raw_from_wav(dir.path().join("missing.wav"), TargetFormat::pcm8(16000));
    assert!(matches!(result, Err(SoundError::Wav(_))));
}
