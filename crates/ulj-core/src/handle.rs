//! Handle Table
//!
//! Managed objects never carry raw native pointers. They carry a [`Handle`],
//! a key into a generational slot map whose entries are tagged with the kind
//! of engine object they hold. Resolving a handle checks liveness (slot and
//! generation) and kind before anything is dispatched, so a stale or
//! mistyped handle becomes an error instead of a type-confused pointer.

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::engine::{Bitmap, Surface};
use crate::error::BridgeError;
use crate::platform::Platform;

/// Generational index for safe references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenIndex {
    pub index: u32,
    pub generation: u32,
}

/// Generational arena (slot map)
#[derive(Debug)]
pub struct GenArena<T> {
    items: Vec<Option<(T, u32)>>,
    free_list: Vec<u32>,
    generations: Vec<u32>,
}

impl<T> GenArena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            free_list: Vec::new(),
            generations: Vec::new(),
        }
    }

    /// Insert item
    pub fn insert(&mut self, value: T) -> GenIndex {
        if let Some(index) = self.free_list.pop() {
            let generation = self.generations[index as usize];
            self.items[index as usize] = Some((value, generation));
            GenIndex { index, generation }
        } else {
            let index = self.items.len() as u32;
            self.items.push(Some((value, 0)));
            self.generations.push(0);
            GenIndex { index, generation: 0 }
        }
    }

    /// Get item
    pub fn get(&self, idx: GenIndex) -> Option<&T> {
        self.items
            .get(idx.index as usize)
            .and_then(|opt| opt.as_ref())
            .filter(|(_, g)| *g == idx.generation)
            .map(|(val, _)| val)
    }

    /// Remove item, bumping the slot generation so old indices go stale
    pub fn remove(&mut self, idx: GenIndex) -> Option<T> {
        let slot = self.items.get_mut(idx.index as usize)?;
        if !matches!(slot.as_ref(), Some((_, g)) if *g == idx.generation) {
            return None;
        }

        let (val, _) = slot.take()?;
        let generation = &mut self.generations[idx.index as usize];
        *generation = generation.wrapping_add(1);
        self.free_list.push(idx.index);
        Some(val)
    }

    /// Drop every item; all outstanding indices go stale
    pub fn clear(&mut self) {
        for (index, slot) in self.items.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.generations[index] = self.generations[index].wrapping_add(1);
                self.free_list.push(index as u32);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.iter().filter(|i| i.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for GenArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque key embedded in a managed object.
///
/// The raw value packs `index + 1` into the low 32 bits and the slot
/// generation into the high 32 bits, so `0` is never a live handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Handle(u64);

impl Handle {
    /// The null handle
    pub const NULL: Handle = Handle(0);

    /// Reinterpret the `long` stored on the managed side
    pub fn from_raw(raw: i64) -> Self {
        Self(raw as u64)
    }

    /// Value to store on the managed side
    pub fn to_raw(self) -> i64 {
        self.0 as i64
    }

    pub fn is_null(self) -> bool {
        self.0 & 0xFFFF_FFFF == 0
    }

    fn from_index(idx: GenIndex) -> Self {
        Self(((idx.generation as u64) << 32) | (idx.index as u64 + 1))
    }

    fn index(self) -> Option<GenIndex> {
        let low = (self.0 & 0xFFFF_FFFF) as u32;
        if low == 0 {
            return None;
        }
        Some(GenIndex {
            index: low - 1,
            generation: (self.0 >> 32) as u32,
        })
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(idx) => write!(f, "Handle({}v{})", idx.index, idx.generation),
            None => f.write_str("Handle(null)"),
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Kind tag stored alongside every table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Platform,
    Surface,
    Bitmap,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandleKind::Platform => "Platform",
            HandleKind::Surface => "Surface",
            HandleKind::Bitmap => "Bitmap",
        };
        f.write_str(name)
    }
}

/// Engine object reachable from the managed side
#[derive(Clone)]
pub enum NativeObject {
    Platform(Arc<Platform>),
    Surface(Arc<dyn Surface>),
    Bitmap(Arc<dyn Bitmap>),
}

impl NativeObject {
    pub fn kind(&self) -> HandleKind {
        match self {
            NativeObject::Platform(_) => HandleKind::Platform,
            NativeObject::Surface(_) => HandleKind::Surface,
            NativeObject::Bitmap(_) => HandleKind::Bitmap,
        }
    }
}

impl fmt::Debug for NativeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeObject::{}", self.kind())
    }
}

/// Thread-safe table of engine objects handed out to the managed side.
///
/// Lookups clone the `Arc` out of the read lock, so an object stays alive
/// for the duration of a call even if its handle is released concurrently.
#[derive(Debug, Default)]
pub struct HandleTable {
    slots: RwLock<GenArena<NativeObject>>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object and return the key for the managed side
    pub fn insert(&self, object: NativeObject) -> Handle {
        let kind = object.kind();
        let handle = Handle::from_index(self.write().insert(object));
        tracing::trace!("Registered {} as {}", kind, handle);
        handle
    }

    /// Look up an object of the given kind
    pub fn get(&self, handle: Handle, expected: HandleKind) -> Result<NativeObject, BridgeError> {
        let Some(idx) = handle.index() else {
            return Err(BridgeError::invalid_handle(handle, expected, "null handle"));
        };

        let slots = self.read();
        let Some(object) = slots.get(idx) else {
            return Err(BridgeError::invalid_handle(handle, expected, "stale or unknown handle"));
        };

        if object.kind() != expected {
            return Err(BridgeError::invalid_handle(
                handle,
                expected,
                format!("handle refers to a {}", object.kind()),
            ));
        }

        Ok(object.clone())
    }

    pub fn platform(&self, handle: Handle) -> Result<Arc<Platform>, BridgeError> {
        match self.get(handle, HandleKind::Platform)? {
            NativeObject::Platform(platform) => Ok(platform),
            other => Err(mismatch(handle, HandleKind::Platform, &other)),
        }
    }

    pub fn surface(&self, handle: Handle) -> Result<Arc<dyn Surface>, BridgeError> {
        match self.get(handle, HandleKind::Surface)? {
            NativeObject::Surface(surface) => Ok(surface),
            other => Err(mismatch(handle, HandleKind::Surface, &other)),
        }
    }

    pub fn bitmap(&self, handle: Handle) -> Result<Arc<dyn Bitmap>, BridgeError> {
        match self.get(handle, HandleKind::Bitmap)? {
            NativeObject::Bitmap(bitmap) => Ok(bitmap),
            other => Err(mismatch(handle, HandleKind::Bitmap, &other)),
        }
    }

    /// Release a handle of the given kind, dropping the table's share of the object
    pub fn release(
        &self,
        handle: Handle,
        expected: HandleKind,
    ) -> Result<NativeObject, BridgeError> {
        let Some(idx) = handle.index() else {
            return Err(BridgeError::invalid_handle(handle, expected, "null handle"));
        };

        let mut slots = self.write();
        match slots.get(idx) {
            None => {
                return Err(BridgeError::invalid_handle(
                    handle,
                    expected,
                    "released twice or never registered",
                ));
            }
            Some(object) if object.kind() != expected => {
                return Err(mismatch(handle, expected, object));
            }
            Some(_) => {}
        }

        let object = slots
            .remove(idx)
            .ok_or_else(|| BridgeError::invalid_handle(handle, expected, "released concurrently"))?;
        tracing::trace!("Released {} ({})", handle, expected);
        Ok(object)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.write().clear();
    }

    // A panic while holding the lock cannot leave the arena half-updated,
    // so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, GenArena<NativeObject>> {
        self.slots.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, GenArena<NativeObject>> {
        self.slots.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn mismatch(handle: Handle, expected: HandleKind, found: &NativeObject) -> BridgeError {
    BridgeError::invalid_handle(handle, expected, format!("handle refers to a {}", found.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BitmapFormat, OwnedBitmap};

    fn bitmap_object() -> NativeObject {
        NativeObject::Bitmap(Arc::new(OwnedBitmap::new(4, 4, BitmapFormat::Bgra8UnormSrgb)))
    }

    #[test]
    fn test_gen_arena() {
        let mut arena = GenArena::new();
        let idx = arena.insert(42);

        assert_eq!(arena.get(idx), Some(&42));
        arena.remove(idx);
        assert_eq!(arena.get(idx), None);
    }

    #[test]
    fn test_gen_arena_slot_reuse() {
        let mut arena = GenArena::new();
        let first = arena.insert("a");
        arena.remove(first);
        let second = arena.insert("b");

        assert_eq!(first.index, second.index);
        assert_ne!(first.generation, second.generation);
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.remove(first), None);
        assert_eq!(arena.get(second), Some(&"b"));
    }

    #[test]
    fn test_handle_encoding() {
        let handle = Handle::from_index(GenIndex { index: 0, generation: 0 });
        assert!(!handle.is_null());
        assert_eq!(handle.to_raw(), 1);

        let handle = Handle::from_index(GenIndex { index: 6, generation: 3 });
        assert_eq!(Handle::from_raw(handle.to_raw()), handle);
        assert_eq!(handle.index(), Some(GenIndex { index: 6, generation: 3 }));

        assert!(Handle::NULL.is_null());
        assert_eq!(Handle::NULL.index(), None);
    }

    #[test]
    fn test_table_kind_check() {
        let table = HandleTable::new();
        let handle = table.insert(bitmap_object());

        assert!(table.bitmap(handle).is_ok());
        let err = match table.surface(handle) {
            Err(err) => err,
            Ok(_) => panic!("bitmap handle resolved as surface"),
        };
        assert!(matches!(err, BridgeError::InvalidHandle { expected: HandleKind::Surface, .. }));
    }

    #[test]
    fn test_table_release() {
        let table = HandleTable::new();
        let handle = table.insert(bitmap_object());
        assert_eq!(table.len(), 1);

        assert!(table.release(handle, HandleKind::Surface).is_err());
        assert_eq!(table.len(), 1);

        table.release(handle, HandleKind::Bitmap).unwrap();
        assert!(table.is_empty());
        assert!(table.bitmap(handle).is_err());
        assert!(table.release(handle, HandleKind::Bitmap).is_err());
    }

    #[test]
    fn test_table_null_handle() {
        let table = HandleTable::new();
        let err = table.bitmap(Handle::NULL).err().unwrap();
        assert!(err.is_null());
        assert!(table.release(Handle::NULL, HandleKind::Bitmap).err().unwrap().is_null());
    }

    #[test]
    fn test_table_clear() {
        let table = HandleTable::new();
        let a = table.insert(bitmap_object());
        let b = table.insert(bitmap_object());

        table.clear();
        assert!(table.is_empty());
        assert!(table.bitmap(a).is_err());
        assert!(table.bitmap(b).is_err());
    }
}
