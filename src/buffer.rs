// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Frame buffer allocation and release.
//!
//! Every buffer a [`Frame`](crate::frame::Frame) holds is a [`RawBuffer`]
//! tagged with the [`Ownership`] that says how it must be freed. All releases
//! go through [`release`], whatever path created the memory.

use core::fmt;
use std::{
    alloc::{self, Layout},
    ffi::c_void,
    mem::{self, ManuallyDrop},
    process,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};
use tracing::{debug, error};

/// Alignment of engine buffers, enough for unaligned-free 128-bit loads.
pub const DEFAULT_ALIGNMENT: usize = 16;

static LIVE_ENGINE_BUFFERS: AtomicUsize = AtomicUsize::new(0);

/// Records which deallocation path is responsible for a buffer.
pub enum Ownership {
    /// Foreign memory, never released by this crate.
    NotOwned,
    /// Allocated with `malloc`, released with `free`.
    Heap,
    /// The storage of a `Vec<u8>` with the given capacity.
    Language { capacity: usize },
    /// Released by handing pointer and capacity to the owning allocator.
    External(Box<dyn FnOnce(*mut u8, usize) + Send>),
    /// Allocated by [`allocate_aligned`] with the given alignment.
    Engine { align: usize },
}

/// Copyable summary of an [`Ownership`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OwnershipKind {
    NotOwned,
    Heap,
    Language,
    External,
    Engine,
}

impl Ownership {
    pub fn kind(&self) -> OwnershipKind {
        match self {
            Ownership::NotOwned => OwnershipKind::NotOwned,
            Ownership::Heap => OwnershipKind::Heap,
            Ownership::Language { .. } => OwnershipKind::Language,
            Ownership::External(_) => OwnershipKind::External,
            Ownership::Engine { .. } => OwnershipKind::Engine,
        }
    }
}

impl fmt::Debug for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Ownership::Language { capacity } => {
                f.debug_struct("Language").field("capacity", capacity).finish()
            }
            Ownership::Engine { align } => f.debug_struct("Engine").field("align", align).finish(),
            other => fmt::Debug::fmt(&other.kind(), f),
        }
    }
}

fn engine_layout(size: usize, align: usize) -> Layout {
    match Layout::from_size_align(size.max(1), align) {
        Ok(layout) => layout,
        Err(e) => {
            error!("invalid frame buffer layout size {} align {}: {}", size, align, e);
            process::abort();
        }
    }
}

/// Allocates `size` zeroed bytes aligned to [`DEFAULT_ALIGNMENT`].
pub fn allocate(size: usize) -> NonNull<u8> {
    allocate_aligned(size, DEFAULT_ALIGNMENT)
}

/// Allocates `size` zeroed bytes aligned to `align`.
///
/// Allocation failure aborts the process: a recorder that silently drops or
/// corrupts frames is worse than one that stops.
pub fn allocate_aligned(size: usize, align: usize) -> NonNull<u8> {
    let layout = engine_layout(size, align);
    let ptr = unsafe { alloc::alloc_zeroed(layout) };
    match NonNull::new(ptr) {
        Some(ptr) => {
            LIVE_ENGINE_BUFFERS.fetch_add(1, Ordering::Relaxed);
            ptr
        }
        None => {
            error!("frame buffer allocation of {} bytes failed", size);
            alloc::handle_alloc_error(layout)
        }
    }
}

/// Releases a buffer through the path recorded by `ownership`.
///
/// A null pointer and [`Ownership::NotOwned`] are both no-ops.
///
/// # Safety
///
/// `ptr` must be null or a buffer of `capacity` bytes obtained from the
/// allocator `ownership` describes, not yet released.
pub unsafe fn release(ptr: *mut u8, capacity: usize, ownership: Ownership) {
    if ptr.is_null() {
        return;
    }
    match ownership {
        Ownership::NotOwned => {}
        Ownership::Heap => libc::free(ptr.cast::<c_void>()),
        Ownership::Language { capacity } => drop(Vec::from_raw_parts(ptr, 0, capacity)),
        Ownership::External(free) => free(ptr, capacity),
        Ownership::Engine { align } => {
            alloc::dealloc(ptr, engine_layout(capacity, align));
            LIVE_ENGINE_BUFFERS.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

/// Number of engine buffers currently allocated in this process.
pub fn live_engine_buffers() -> usize {
    LIVE_ENGINE_BUFFERS.load(Ordering::Relaxed)
}

/// A pointer, its usable capacity and the tag that says how to free it.
///
/// Dropping a `RawBuffer` releases it through [`release`].
pub struct RawBuffer {
    ptr: NonNull<u8>,
    capacity: usize,
    ownership: Ownership,
}

// The buffer is plain bytes; the frame that holds it serializes access.
unsafe impl Send for RawBuffer {}

impl RawBuffer {
    /// Allocates an engine-owned zeroed buffer.
    pub fn allocate(capacity: usize) -> Self {
        let ptr = allocate(capacity);
        debug!("frame buffer alloc'd {} bytes", capacity);
        RawBuffer {
            ptr,
            capacity,
            ownership: Ownership::Engine {
                align: DEFAULT_ALIGNMENT,
            },
        }
    }

    /// Adopts the storage of a vector without copying.
    pub fn from_vec(vec: Vec<u8>) -> Self {
        let mut vec = ManuallyDrop::new(vec);
        let capacity = vec.len();
        let ownership = Ownership::Language {
            capacity: vec.capacity(),
        };
        // An empty vector may hold a dangling pointer, which is still non-null.
        let ptr = NonNull::new(vec.as_mut_ptr()).unwrap_or(NonNull::dangling());
        RawBuffer {
            ptr,
            capacity,
            ownership,
        }
    }

    /// Wraps a foreign pointer; returns `None` for null.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `capacity` bytes for as
    /// long as the buffer lives, and `ownership` must describe how it was
    /// allocated. A [`Ownership::NotOwned`] buffer must outlive every frame
    /// that wraps it.
    pub unsafe fn from_raw_parts(
        ptr: *mut u8,
        capacity: usize,
        ownership: Ownership,
    ) -> Option<Self> {
        let ptr = match NonNull::new(ptr) {
            Some(ptr) => ptr,
            None => {
                release(ptr, capacity, ownership);
                return None;
            }
        };
        Some(RawBuffer {
            ptr,
            capacity,
            ownership,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ownership(&self) -> OwnershipKind {
        self.ownership.kind()
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.capacity) }
    }

    pub fn as_slice_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.capacity) }
    }
}

impl fmt::Debug for RawBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RawBuffer")
            .field("ptr", &self.ptr)
            .field("capacity", &self.capacity)
            .field("ownership", &self.ownership)
            .finish()
    }
}

impl Drop for RawBuffer {
    fn drop(&mut self) {
        let ownership = mem::replace(&mut self.ownership, Ownership::NotOwned);
        let kind = ownership.kind();
        unsafe { release(self.ptr.as_ptr(), self.capacity, ownership) };
        if kind != OwnershipKind::NotOwned {
            debug!("frame buffer freed {} bytes ({:?})", self.capacity, kind);
        }
    }
}
