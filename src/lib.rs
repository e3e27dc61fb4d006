// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # EdgeFirst Motion Frame Engine
//!
//! This library provides the frame container and pixel operations behind
//! motion detection on camera streams: buffer ownership across capture
//! libraries, per-format pixel kernels selected for the running CPU, frame
//! comparison and compositing, zone rasterization and frame serialization.
//!
//! ## Features
//!
//! - **Buffer Ownership**: Frames adopt buffers from the heap, from Rust
//!   vectors, or from an external allocator with a release callback, and can
//!   be held on memory owned elsewhere without ever reallocating it.
//! - **Kernel Registry**: Blend, delta, conversion and deinterlace kernels
//!   with SSE2 and AVX2 variants on x86-64, chosen once at startup and
//!   bit-identical to the portable scalar versions.
//! - **Motion Primitives**: Delta against a reference frame, blending,
//!   merging, highlighting, deinterlacing and edge outlines of motion masks.
//! - **Zones and Labels**: Even-odd polygon fills, outlines and bitmap font
//!   annotation.
//! - **Serialization**: JPEG through turbojpeg with SIMD, zlib compression
//!   and raw dumps.
//!
//! ## Example
//!
//! ```
//! use edgefirst_motion::{frame::Frame, pixel::{Rgb, SubpixelOrder}, registry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Select kernels for this CPU before the first frame is processed
//! registry::initialize();
//!
//! let mut reference = Frame::with_format(320, 240, SubpixelOrder::Rgb)?;
//! reference.fill(Rgb::new(40, 40, 40), None)?;
//!
//! // Slowly adapt the reference towards each new frame
//! let current = Frame::with_format(320, 240, SubpixelOrder::Rgb)?;
//! let mut motion = Frame::new();
//! reference.delta(&current, &mut motion)?;
//! reference.blend(&current, 12)?;
//!
//! let changed = motion.buffer().iter().filter(|&&v| v > 20).count();
//! assert_eq!(changed, 320 * 240);
//! # Ok(())
//! # }
//! ```
//!
//! ## Safety
//!
//! Adopting foreign buffers through [`frame::Frame::assign_direct`] is
//! `unsafe`; the caller vouches for the pointer, its capacity and its
//! release. Vector kernels are `unsafe` internally and only reachable after
//! the registry has confirmed CPU support.

pub mod buffer;
pub mod codec;
pub mod draw;
pub mod error;
pub mod frame;
pub mod kernels;
pub mod pixel;
pub mod poly;
pub mod registry;
pub mod transform;
