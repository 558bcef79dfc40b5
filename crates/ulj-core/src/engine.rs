//! Engine Objects
//!
//! Traits for the engine types the bridge hands out, plus in-process
//! implementations backed by plain memory. The in-process objects mirror the
//! engine's CPU bitmap surface and are what the bridge uses when no native
//! engine is linked.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Pixel format of a bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitmapFormat {
    /// Alpha channel only, 8 bits per pixel
    A8Unorm,
    /// Blue Green Red Alpha, 8 bits per channel, sRGB gamma
    Bgra8UnormSrgb,
}

impl BitmapFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            BitmapFormat::A8Unorm => 1,
            BitmapFormat::Bgra8UnormSrgb => 4,
        }
    }

    /// Convert from the engine's raw value
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(BitmapFormat::A8Unorm),
            1 => Some(BitmapFormat::Bgra8UnormSrgb),
            _ => None,
        }
    }

    /// Name of the matching managed enum constant
    pub fn constant_name(self) -> &'static str {
        match self {
            BitmapFormat::A8Unorm => "A8_UNORM",
            BitmapFormat::Bgra8UnormSrgb => "BGRA8_UNORM_SRGB",
        }
    }
}

/// Engine bitmap
pub trait Bitmap: Send + Sync {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn format(&self) -> BitmapFormat;

    /// Bytes between the start of two rows
    fn row_bytes(&self) -> u32;

    /// Bytes per pixel
    fn bpp(&self) -> u32 {
        self.format().bytes_per_pixel()
    }

    /// Total size of the pixel buffer in bytes
    fn size(&self) -> usize {
        self.row_bytes() as usize * self.height() as usize
    }

    fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Engine surface a view paints into
pub trait Surface: Send + Sync {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn row_bytes(&self) -> u32;

    fn size(&self) -> usize;

    /// Checked downcast to a bitmap surface.
    ///
    /// Surfaces backed by something other than a CPU bitmap (GPU textures,
    /// user surface factories) keep the default and return `None`.
    fn as_bitmap_surface(&self) -> Option<&dyn BitmapSurface> {
        None
    }
}

/// Surface whose pixels live in an engine bitmap
pub trait BitmapSurface: Surface {
    /// The bitmap backing this surface; the same bitmap on every call
    fn bitmap(&self) -> Arc<dyn Bitmap>;
}

/// Bitmap owning its pixels in process memory
pub struct OwnedBitmap {
    width: u32,
    height: u32,
    format: BitmapFormat,
    row_bytes: u32,
    pixels: Mutex<Vec<u8>>,
}

impl OwnedBitmap {
    /// Create a zeroed bitmap with tightly packed rows
    pub fn new(width: u32, height: u32, format: BitmapFormat) -> Self {
        let row_bytes = width * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            row_bytes,
            pixels: Mutex::new(vec![0; row_bytes as usize * height as usize]),
        }
    }

    /// Lock the pixel buffer
    pub fn lock_pixels(&self) -> MutexGuard<'_, Vec<u8>> {
        self.pixels.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Bitmap for OwnedBitmap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> BitmapFormat {
        self.format
    }

    fn row_bytes(&self) -> u32 {
        self.row_bytes
    }
}

impl fmt::Debug for OwnedBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .finish()
    }
}

/// CPU surface backed by an [`OwnedBitmap`]
#[derive(Debug)]
pub struct OwnedBitmapSurface {
    bitmap: Arc<OwnedBitmap>,
}

impl OwnedBitmapSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_bitmap(Arc::new(OwnedBitmap::new(width, height, BitmapFormat::Bgra8UnormSrgb)))
    }

    pub fn with_bitmap(bitmap: Arc<OwnedBitmap>) -> Self {
        Self { bitmap }
    }

    /// Concrete bitmap, for callers that need pixel access
    pub fn owned_bitmap(&self) -> &Arc<OwnedBitmap> {
        &self.bitmap
    }
}

impl Surface for OwnedBitmapSurface {
    fn width(&self) -> u32 {
        self.bitmap.width()
    }

    fn height(&self) -> u32 {
        self.bitmap.height()
    }

    fn row_bytes(&self) -> u32 {
        self.bitmap.row_bytes()
    }

    fn size(&self) -> usize {
        self.bitmap.size()
    }

    fn as_bitmap_surface(&self) -> Option<&dyn BitmapSurface> {
        Some(self)
    }
}

impl BitmapSurface for OwnedBitmapSurface {
    fn bitmap(&self) -> Arc<dyn Bitmap> {
        self.bitmap.clone()
    }
}
