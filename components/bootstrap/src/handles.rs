//! Handle area and scoped handle marks.
//!
//! Initialization code creates transient references to objects it is
//! building. They are recorded in a [`HandleArea`] so the collector can see
//! them, and a [`HandleMark`] bounds their lifetime: when the mark is
//! dropped the area is truncated back to where it was when the mark was
//! taken. Dropping happens on every exit path, including unwinding out of
//! a fatal abort.

use parking_lot::Mutex;

/// Opaque reference to a managed object, as seen by the bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef(pub u64);

/// Index of a handle slot inside a [`HandleArea`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

impl Handle {
    /// Slot index of this handle.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Stack of live handles.
#[derive(Debug, Default)]
pub struct HandleArea {
    slots: Mutex<Vec<ObjectRef>>,
    high_water: Mutex<usize>,
}

impl HandleArea {
    /// Creates an empty handle area.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `object` and returns its handle.
    pub fn allocate(&self, object: ObjectRef) -> Handle {
        let mut slots = self.slots.lock();
        slots.push(object);
        let len = slots.len();
        let mut high_water = self.high_water.lock();
        *high_water = (*high_water).max(len);
        Handle(len - 1)
    }

    /// Resolves a handle, or `None` if its scope has already been released.
    pub fn resolve(&self, handle: Handle) -> Option<ObjectRef> {
        self.slots.lock().get(handle.0).copied()
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// True when no handles are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Largest number of handles that were live at once.
    pub fn high_water_mark(&self) -> usize {
        *self.high_water.lock()
    }

    /// Opens a handle scope that ends when the returned mark is dropped.
    pub fn mark(&self) -> HandleMark<'_> {
        HandleMark {
            area: self,
            saved_len: self.len(),
        }
    }
}

/// Scope guard returned by [`HandleArea::mark`].
#[derive(Debug)]
#[must_use = "the handle scope ends as soon as the mark is dropped"]
pub struct HandleMark<'a> {
    area: &'a HandleArea,
    saved_len: usize,
}

impl HandleMark<'_> {
    /// Number of handles created inside this scope that are still live.
    pub fn live_in_scope(&self) -> usize {
        self.area.len().saturating_sub(self.saved_len)
    }
}

impl Drop for HandleMark<'_> {
    fn drop(&mut self) {
        let mut slots = self.area.slots.lock();
        let released = slots.len().saturating_sub(self.saved_len);
        slots.truncate(self.saved_len);
        if released > 0 {
            tracing::trace!(released, "released handle scope");
        }
    }
}
