//! Optional header images (logo and QR code).
//!
//! Both are decorative. A file that is missing or cannot be decoded is
//! logged and treated as absent; the header simply omits it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which header image an element refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageSlot {
    Logo,
    Qr,
}

/// A decoded image kept as its original encoded bytes plus pixel size.
#[derive(Clone)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub px_width: u32,
    pub px_height: u32,
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageData")
            .field("bytes", &self.bytes.len())
            .field("px_width", &self.px_width)
            .field("px_height", &self.px_height)
            .finish()
    }
}

impl ImageData {
    /// Decode `bytes` with the `image` crate to learn the pixel size.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        match ::image::load_from_memory(&bytes) {
            Ok(img) => Some(Self {
                px_width: img.width(),
                px_height: img.height(),
                bytes,
            }),
            Err(e) => {
                log::warn!("skipping header image, decode error: {e}");
                None
            }
        }
    }
}

/// Where to look for the header images.
#[derive(Debug, Clone, Default)]
pub struct AssetPaths {
    pub logo: Option<PathBuf>,
    pub qr: Option<PathBuf>,
}

/// Header images loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct ImageAssets {
    logo: Option<ImageData>,
    qr: Option<ImageData>,
}

impl ImageAssets {
    /// No images at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn load(paths: &AssetPaths) -> Self {
        Self {
            logo: paths.logo.as_deref().and_then(load_optional),
            qr: paths.qr.as_deref().and_then(load_optional),
        }
    }

    pub fn with_image(mut self, slot: ImageSlot, image: ImageData) -> Self {
        match slot {
            ImageSlot::Logo => self.logo = Some(image),
            ImageSlot::Qr => self.qr = Some(image),
        }
        self
    }

    pub fn get(&self, slot: ImageSlot) -> Option<&ImageData> {
        match slot {
            ImageSlot::Logo => self.logo.as_ref(),
            ImageSlot::Qr => self.qr.as_ref(),
        }
    }
}

fn load_optional(path: &Path) -> Option<ImageData> {
    match std::fs::read(path) {
        Ok(bytes) => ImageData::from_bytes(bytes),
        Err(e) => {
            log::info!("header image {} not available ({e}); skipping", path.display());
            None
        }
    }
}
