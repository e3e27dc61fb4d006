// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Pixel kernels.
//!
//! Kernels are plain functions over byte runs in one pixel format. Each
//! operation has a scalar implementation for every format in [`scalar`] and
//! optional vector implementations (see `x86`) that must produce the same
//! bytes. The [`registry`](crate::registry) picks one per format at startup.

pub mod scalar;
#[cfg(target_arch = "x86_64")]
pub(crate) mod x86;

/// Blends `b` into `a` in place with `weight / 256` of `b`.
pub type BlendFn = fn(a: &mut [u8], b: &[u8], weight: u16);

/// Writes one luma byte per pixel of the difference of `a` and `b`.
pub type DeltaFn = fn(a: &[u8], b: &[u8], out: &mut [u8]);

/// Recodes every pixel of `src` into `dst`.
pub type ConvertFn = fn(src: &[u8], dst: &mut [u8]);

/// Repairs the odd lines of `current` using `next` as the following field.
pub type DeinterlaceFn =
    fn(current: &mut [u8], next: &[u8], threshold: u32, width: usize, height: usize);

/// Maximum blend weight, selecting `b` entirely.
pub const BLEND_WEIGHT_MAX: u16 = 256;

/// Converts a transparency percentage in `0..=100` to a blend weight.
///
/// 0 keeps the destination, 100 replaces it with the source.
pub fn blend_weight(transparency: u8) -> u16 {
    let t = transparency.min(100) as u32;
    ((t * BLEND_WEIGHT_MAX as u32 + 50) / 100) as u16
}
