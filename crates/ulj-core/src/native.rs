//! Ultralight C API
//!
//! Bindings to the parts of the engine the bridge touches, and adapters
//! exposing engine surfaces and bitmaps through the [`Surface`] and
//! [`Bitmap`] traits.

#![allow(non_camel_case_types, non_snake_case)]

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once, OnceLock};

use crate::engine::{Bitmap, BitmapFormat, BitmapSurface, Surface};
use crate::error::panic_message;
use crate::handle::{Handle, HandleTable, NativeObject};
use crate::log::LogLevel;
use crate::platform::Platform;

#[repr(C)]
pub struct C_String {
    _private: [u8; 0],
}

#[repr(C)]
pub struct C_Surface {
    _private: [u8; 0],
}

#[repr(C)]
pub struct C_Bitmap {
    _private: [u8; 0],
}

pub type ULString = *mut C_String;
pub type ULSurface = *mut C_Surface;
pub type ULBitmap = *mut C_Bitmap;
pub type ULChar16 = u16;

pub type ULLoggerLogMessageCallback =
    Option<unsafe extern "C" fn(log_level: i32, message: ULString)>;

#[repr(C)]
pub struct ULLogger {
    pub log_message: ULLoggerLogMessageCallback,
}

#[link(name = "Ultralight")]
unsafe extern "C" {
    pub fn ulPlatformSetLogger(logger: ULLogger);

    pub fn ulStringGetData(string: ULString) -> *mut ULChar16;
    pub fn ulStringGetLength(string: ULString) -> usize;

    pub fn ulSurfaceGetWidth(surface: ULSurface) -> u32;
    pub fn ulSurfaceGetHeight(surface: ULSurface) -> u32;
    pub fn ulSurfaceGetRowBytes(surface: ULSurface) -> u32;
    pub fn ulSurfaceGetSize(surface: ULSurface) -> usize;

    pub fn ulBitmapSurfaceGetBitmap(surface: ULSurface) -> ULBitmap;

    pub fn ulBitmapGetWidth(bitmap: ULBitmap) -> u32;
    pub fn ulBitmapGetHeight(bitmap: ULBitmap) -> u32;
    pub fn ulBitmapGetFormat(bitmap: ULBitmap) -> i32;
    pub fn ulBitmapGetBpp(bitmap: ULBitmap) -> u32;
    pub fn ulBitmapGetRowBytes(bitmap: ULBitmap) -> u32;
    pub fn ulBitmapGetSize(bitmap: ULBitmap) -> usize;
}

/// Route engine log output through [`Platform::instance`]. Idempotent.
pub fn install_logger_trampoline() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        tracing::debug!("Installing engine logger trampoline");
        // SAFETY: the callback is a plain function valid for the process lifetime
        unsafe {
            ulPlatformSetLogger(ULLogger {
                log_message: Some(log_message_trampoline),
            })
        }
    });
}

unsafe extern "C" fn log_message_trampoline(log_level: i32, message: ULString) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let level = LogLevel::from_raw(log_level).unwrap_or_else(|| {
            tracing::warn!("Unknown engine log level {}, reporting as info", log_level);
            LogLevel::Info
        });
        // SAFETY: the engine passes a valid string for the duration of the call
        let text = unsafe { string_data(message) };
        Platform::instance().log(level, text);
    }));

    if let Err(payload) = result {
        tracing::error!("Engine log callback panicked: {}", panic_message(&*payload));
    }
}

/// Borrow the UTF-16 contents of an engine string
///
/// # Safety
/// `string` must be null or a live `ULString` that outlives the slice.
unsafe fn string_data<'a>(string: ULString) -> &'a [u16] {
    if string.is_null() {
        return &[];
    }
    // SAFETY: forwarded from the caller
    unsafe {
        let data = ulStringGetData(string);
        let len = ulStringGetLength(string);
        if data.is_null() || len == 0 {
            &[]
        } else {
            std::slice::from_raw_parts(data, len)
        }
    }
}

/// What an engine surface is backed by.
///
/// The C API cannot tell a bitmap surface from a user-provided one, so the
/// creator of the surface states it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeSurfaceKind {
    Bitmap,
    Custom,
}

/// Engine surface owned by its view
pub struct NativeSurface {
    raw: ULSurface,
    kind: NativeSurfaceKind,
    bitmap: OnceLock<Arc<NativeBitmap>>,
}

// SAFETY: the engine's surface accessors are plain field reads; the owning
// view outlives every handle registered for its surface.
unsafe impl Send for NativeSurface {}
unsafe impl Sync for NativeSurface {}

impl NativeSurface {
    /// Wrap an engine surface without taking ownership
    ///
    /// # Safety
    /// `raw` must be a valid surface of the given kind, alive for as long as
    /// the wrapper and every bitmap obtained from it.
    pub unsafe fn from_raw(raw: ULSurface, kind: NativeSurfaceKind) -> Self {
        Self {
            raw,
            kind,
            bitmap: OnceLock::new(),
        }
    }

    /// Wrap and register an engine surface, returning the managed-side key.
    ///
    /// This is how surfaces enter the handle table: whatever creates views
    /// and their surfaces calls it and hands the key to the Java
    /// `UltralightBitmapSurface`. Until a surface is registered,
    /// `UltralightBitmapSurface.bitmap()` has nothing to resolve.
    ///
    /// # Safety
    /// Same contract as [`NativeSurface::from_raw`].
    pub unsafe fn register(table: &HandleTable, raw: ULSurface, kind: NativeSurfaceKind) -> Handle {
        // SAFETY: forwarded from the caller
        let surface = unsafe { Self::from_raw(raw, kind) };
        table.insert(NativeObject::Surface(Arc::new(surface)))
    }
}

impl Surface for NativeSurface {
    fn width(&self) -> u32 {
        // SAFETY: `raw` is valid per the constructor contract
        unsafe { ulSurfaceGetWidth(self.raw) }
    }

    fn height(&self) -> u32 {
        unsafe { ulSurfaceGetHeight(self.raw) }
    }

    fn row_bytes(&self) -> u32 {
        unsafe { ulSurfaceGetRowBytes(self.raw) }
    }

    fn size(&self) -> usize {
        unsafe { ulSurfaceGetSize(self.raw) }
    }

    fn as_bitmap_surface(&self) -> Option<&dyn BitmapSurface> {
        match self.kind {
            NativeSurfaceKind::Bitmap => Some(self),
            NativeSurfaceKind::Custom => None,
        }
    }
}

impl BitmapSurface for NativeSurface {
    fn bitmap(&self) -> Arc<dyn Bitmap> {
        self.bitmap
            .get_or_init(|| {
                // SAFETY: only reachable for bitmap surfaces; the bitmap is
                // owned by the surface and shares its lifetime
                let raw = unsafe { ulBitmapSurfaceGetBitmap(self.raw) };
                Arc::new(NativeBitmap { raw })
            })
            .clone()
    }
}

impl fmt::Debug for NativeSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeSurface")
            .field("raw", &self.raw)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Engine bitmap borrowed from a bitmap surface
pub struct NativeBitmap {
    raw: ULBitmap,
}

// SAFETY: see `NativeSurface`
unsafe impl Send for NativeBitmap {}
unsafe impl Sync for NativeBitmap {}

impl Bitmap for NativeBitmap {
    fn width(&self) -> u32 {
        // SAFETY: `raw` came from a live bitmap surface
        unsafe { ulBitmapGetWidth(self.raw) }
    }

    fn height(&self) -> u32 {
        unsafe { ulBitmapGetHeight(self.raw) }
    }

    fn format(&self) -> BitmapFormat {
        let raw = unsafe { ulBitmapGetFormat(self.raw) };
        BitmapFormat::from_raw(raw).unwrap_or_else(|| {
            tracing::warn!("Unknown bitmap format {}", raw);
            BitmapFormat::Bgra8UnormSrgb
        })
    }

    fn row_bytes(&self) -> u32 {
        unsafe { ulBitmapGetRowBytes(self.raw) }
    }

    fn bpp(&self) -> u32 {
        unsafe { ulBitmapGetBpp(self.raw) }
    }

    fn size(&self) -> usize {
        unsafe { ulBitmapGetSize(self.raw) }
    }
}

impl fmt::Debug for NativeBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBitmap").field("raw", &self.raw).finish()
    }
}
