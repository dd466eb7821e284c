//! Firmware image upload
//!
//! Upload sequence: take the bus, hold the co-processor in reset, copy the image to
//! address 0, then let it out of reset and release the bus. The co-processor starts
//! executing the new image from address 0.
//!
//! Memory past the image is left alone: tracker B's song address is written before
//! its driver is uploaded and must survive the upload. A tracker B image long enough
//! to reach that address overwrites it, which is logged.

use super::{DriverLoader, DriverVariant};
use crate::bus::{CoprocessorBus, RegisterWindow, WINDOW_SIZE};
use crate::codec::layout;
use std::collections::HashMap;
use std::sync::Arc;

/// [`DriverLoader`] backed by in-memory firmware images
#[derive(Debug, Clone, Default)]
pub struct ImageLoader {
    images: HashMap<DriverVariant, Arc<[u8]>>,
}

impl ImageLoader {
    /// Loader with no images registered
    ///
    /// Loading an unregistered variant still cycles the reset line, which is
    /// enough for host tests where the co-processor side is simulated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image (builder style)
    pub fn with_image(mut self, variant: DriverVariant, image: impl Into<Arc<[u8]>>) -> Self {
        self.insert(variant, image);
        self
    }

    /// Register or replace an image
    pub fn insert(&mut self, variant: DriverVariant, image: impl Into<Arc<[u8]>>) {
        self.images.insert(variant, image.into());
    }

    /// Registered image for `variant`
    pub fn image(&self, variant: DriverVariant) -> Option<&[u8]> {
        self.images.get(&variant).map(|image| &image[..])
    }
}

/// Whether `len` image bytes reach the song address `variant` latches at boot
fn clobbers_song_address(variant: DriverVariant, len: usize) -> bool {
    variant == DriverVariant::TrackerTfm && len > layout::TFM_SONG as usize
}

impl<B: CoprocessorBus + ?Sized> DriverLoader<B> for ImageLoader {
    fn load(&mut self, bus: &mut B, variant: DriverVariant) {
        let mut window = RegisterWindow::acquire(bus);
        window.hold_reset();

        match self.images.get(&variant) {
            Some(image) => {
                if image.len() > WINDOW_SIZE {
                    log::warn!(
                        "{variant} image is {} bytes, truncating to {WINDOW_SIZE}",
                        image.len()
                    );
                }
                let len = image.len().min(WINDOW_SIZE);
                if clobbers_song_address(variant, len) {
                    log::warn!(
                        "{variant} image is {len} bytes and overwrites the song address at {:#06X}",
                        layout::TFM_SONG
                    );
                }
                window.write_bytes(0, &image[..len]);
                log::debug!("uploaded {variant} driver ({len} bytes)");
            }
            None => log::warn!("no firmware image registered for {variant} driver"),
        }

        window.release_reset();
    }
}
