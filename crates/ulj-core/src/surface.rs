//! Bitmap Surface Access

use crate::error::BridgeError;
use crate::handle::{Handle, HandleKind, HandleTable, NativeObject};

/// Resolve `surface` and register the bitmap backing it.
///
/// The returned handle names the very bitmap the surface paints into. Fails
/// with [`BridgeError::InvalidHandle`] when `surface` is null, stale, not a
/// surface, or a surface without a CPU bitmap.
pub fn bitmap_of(table: &HandleTable, surface: Handle) -> Result<Handle, BridgeError> {
    let object = table.surface(surface)?;
    let bitmap = object
        .as_bitmap_surface()
        .map(|s| s.bitmap())
        .ok_or_else(|| {
            BridgeError::invalid_handle(
                surface,
                HandleKind::Surface,
                "surface is not backed by a bitmap",
            )
        })?;

    let handle = table.insert(NativeObject::Bitmap(bitmap));
    tracing::debug!("Surface {} -> bitmap {}", surface, handle);
    Ok(handle)
}

/// Release a bitmap handle previously returned by [`bitmap_of`]
pub fn release_bitmap(table: &HandleTable, bitmap: Handle) -> Result<(), BridgeError> {
    table.release(bitmap, HandleKind::Bitmap).map(drop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Bitmap, OwnedBitmapSurface, Surface};
    use std::sync::Arc;

    /// Surface rendered on the GPU; has no CPU bitmap
    struct TextureSurface;

    impl Surface for TextureSurface {
        fn width(&self) -> u32 {
            256
        }

        fn height(&self) -> u32 {
            256
        }

        fn row_bytes(&self) -> u32 {
            0
        }

        fn size(&self) -> usize {
            0
        }
    }

    #[test]
    fn test_bitmap_identity() {
        let table = HandleTable::new();
        let surface = Arc::new(OwnedBitmapSurface::new(64, 32));
        let expected: Arc<dyn Bitmap> = surface.owned_bitmap().clone();
        let surface_handle = table.insert(NativeObject::Surface(surface));

        let bitmap_handle = bitmap_of(&table, surface_handle).unwrap();
        let bitmap = table.bitmap(bitmap_handle).unwrap();
        assert!(Arc::ptr_eq(&bitmap, &expected));
        assert_eq!((bitmap.width(), bitmap.height()), (64, 32));

        // Every call hands out a fresh key to the same bitmap
        let again = bitmap_of(&table, surface_handle).unwrap();
        assert_ne!(again, bitmap_handle);
        assert!(Arc::ptr_eq(&table.bitmap(again).unwrap(), &expected));
    }

    #[test]
    fn test_non_bitmap_surface() {
        let table = HandleTable::new();
        let handle = table.insert(NativeObject::Surface(Arc::new(TextureSurface)));

        let err = bitmap_of(&table, handle).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidHandle { .. }));
        assert!(!err.is_null());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_bitmap_handle_is_not_a_surface() {
        let table = HandleTable::new();
        let surface = table.insert(NativeObject::Surface(Arc::new(OwnedBitmapSurface::new(2, 2))));
        let bitmap = bitmap_of(&table, surface).unwrap();

        assert!(bitmap_of(&table, bitmap).is_err());
    }

    #[test]
    fn test_release_bitmap() {
        let table = HandleTable::new();
        let surface = table.insert(NativeObject::Surface(Arc::new(OwnedBitmapSurface::new(2, 2))));
        let bitmap = bitmap_of(&table, surface).unwrap();

        release_bitmap(&table, bitmap).unwrap();
        assert!(table.bitmap(bitmap).is_err());
        assert!(release_bitmap(&table, bitmap).is_err());
        assert!(release_bitmap(&table, surface).is_err());
        assert!(table.surface(surface).is_ok());
    }
}
