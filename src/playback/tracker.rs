//! Tracker drivers

use super::{LoadOrder, PlayStatus, PlaybackBackend, SoundSystem, StartRequest};
use crate::bus::{CoprocessorBus, RegisterWindow};
use crate::codec::{layout, tracker, TrackerMode};
use crate::driver::{DriverLoader, DriverVariant};

/// Tracker A: song address plus a play-mode byte the driver polls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MvsTracker;

impl PlaybackBackend for MvsTracker {
    fn variant(&self) -> DriverVariant {
        DriverVariant::TrackerMvs
    }

    fn status<B: CoprocessorBus + ?Sized>(&self, window: &RegisterWindow<'_, B>) -> PlayStatus {
        PlayStatus::Tracker(tracker::read_mode(window))
    }

    fn start<B: CoprocessorBus + ?Sized>(
        &self,
        window: &mut RegisterWindow<'_, B>,
        request: &StartRequest,
    ) -> u8 {
        let (address, looping) = request.song();
        tracker::write_song_address(
            window,
            layout::MVS_SONG,
            address,
            tracker::MVS_ADDRESS_WIDTH,
        );
        tracker::write_mode(window, TrackerMode::for_start(looping));
        0
    }

    fn stop<B: CoprocessorBus + ?Sized>(&self, window: &mut RegisterWindow<'_, B>, _channel: u8) {
        tracker::write_mode(window, TrackerMode::Silence);
    }
}

/// Tracker B: reads its song address once, at boot
///
/// No status readback and no stop command; starting another song (or loading
/// another driver) is the only way to change what plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TfmTracker;

impl PlaybackBackend for TfmTracker {
    fn variant(&self) -> DriverVariant {
        DriverVariant::TrackerTfm
    }

    fn load_order(&self) -> LoadOrder {
        LoadOrder::LatchedAtBoot
    }

    fn status<B: CoprocessorBus + ?Sized>(&self, _window: &RegisterWindow<'_, B>) -> PlayStatus {
        PlayStatus::Unavailable
    }

    fn start<B: CoprocessorBus + ?Sized>(
        &self,
        window: &mut RegisterWindow<'_, B>,
        request: &StartRequest,
    ) -> u8 {
        let (address, _) = request.song();
        tracker::write_song_address(
            window,
            layout::TFM_SONG,
            address,
            tracker::TFM_ADDRESS_WIDTH,
        );
        0
    }

    fn stop<B: CoprocessorBus + ?Sized>(&self, _window: &mut RegisterWindow<'_, B>, _channel: u8) {}
}

impl<B: CoprocessorBus, L: DriverLoader<B>> SoundSystem<B, L> {
    /// Tracker A play mode
    pub fn mvs_mode(&mut self) -> TrackerMode {
        match self.status(DriverVariant::TrackerMvs) {
            PlayStatus::Tracker(mode) => mode,
            _ => TrackerMode::Silence,
        }
    }

    /// Whether tracker A is playing
    pub fn is_playing_mvs(&mut self) -> bool {
        self.mvs_mode().is_playing()
    }

    /// Start a tracker A song at `song`
    pub fn start_play_mvs(&mut self, song: u32, looping: bool) {
        self.start(
            DriverVariant::TrackerMvs,
            &StartRequest::Song {
                address: song,
                looping,
            },
        );
    }

    /// Silence tracker A
    pub fn stop_play_mvs(&mut self) {
        self.stop(DriverVariant::TrackerMvs, 0);
    }

    /// Start a tracker B song at `song`
    ///
    /// Restarts the co-processor even when the driver is already loaded.
    pub fn start_play_tfm(&mut self, song: u32) {
        self.start(
            DriverVariant::TrackerTfm,
            &StartRequest::Song {
                address: song,
                looping: false,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusStats, SharedRam};
    use crate::driver::ImageLoader;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_mvs_start_and_stop() {
        let ram = SharedRam::new();
        let mut sound = SoundSystem::new(ram.clone(), ImageLoader::new());

        sound.start_play_mvs(0x0007_1234, true);
        let mem = ram.snapshot();
        let song = layout::MVS_SONG as usize;
        assert_eq!(&mem[song..song + 4], &[0x34, 0x12, 0x07, 0x01]);
        assert_eq!(sound.mvs_mode(), TrackerMode::Loop);

        sound.start_play_mvs(0x0007_1234, false);
        assert_eq!(sound.mvs_mode(), TrackerMode::Once);
        assert!(sound.is_playing_mvs());

        sound.stop_play_mvs();
        assert_eq!(sound.mvs_mode(), TrackerMode::Silence);
        assert!(!sound.is_playing_mvs());
        assert_eq!(sound.driver_switches(), 1);
    }

    #[test]
    fn test_mvs_reports_unknown_mode() {
        let ram = SharedRam::new();
        let mut sound = SoundSystem::new(ram.clone(), ImageLoader::new());
        sound.load_driver(DriverVariant::TrackerMvs);
        assert!(ram.poke(layout::MVS_MODE, 0x03));
        assert_eq!(sound.mvs_mode(), TrackerMode::Unknown(3));
        assert!(sound.is_playing_mvs());
    }

    #[test]
    fn test_tfm_writes_address_before_loading() {
        let ram = SharedRam::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let loader = move |bus: &mut SharedRam, variant: DriverVariant| {
            let stats = bus.stats();
            let mut song = [0u8; 4];
            for (i, byte) in song.iter_mut().enumerate() {
                *byte = bus.peek(layout::TFM_SONG + i as u16);
            }
            log.borrow_mut().push((variant, song, stats));
        };
        let mut sound = SoundSystem::new(ram.clone(), loader);

        sound.start_play_tfm(0x0123_4567);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        let (variant, song, stats) = seen[0];
        assert_eq!(variant, DriverVariant::TrackerTfm);
        assert_eq!(song, [0x67, 0x45, 0x23, 0x01]);
        // the window was already closed when the loader ran
        assert_eq!(stats.requests, stats.releases);
        assert_eq!(
            ram.stats(),
            BusStats {
                requests: 1,
                releases: 1,
                resets: 1,
                ..BusStats::default()
            }
        );
    }

    #[test]
    fn test_tfm_resets_even_when_loaded() {
        let ram = SharedRam::new();
        let mut sound = SoundSystem::new(ram.clone(), ImageLoader::new());
        sound.start_play_tfm(0x0001_0000);
        sound.start_play_tfm(0x0002_0000);

        assert_eq!(sound.driver_switches(), 1);
        // one reset from the upload, one per start
        assert_eq!(ram.stats().resets, 3);
        assert_eq!(sound.status(DriverVariant::TrackerTfm), PlayStatus::Unavailable);
    }
}
