// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Reference kernels, generic over [`Layout`] so every format is covered.

use super::BLEND_WEIGHT_MAX;
use crate::pixel::Layout;

#[inline(always)]
pub(crate) fn mix(a: u8, b: u8, weight: u32) -> u8 {
    ((a as u32 * (256 - weight) + b as u32 * weight + 128) >> 8) as u8
}

/// Blend for byte-linear formats.
pub fn blend_bytes(a: &mut [u8], b: &[u8], weight: u16) {
    let weight = weight.min(BLEND_WEIGHT_MAX) as u32;
    for (x, y) in a.iter_mut().zip(b) {
        *x = mix(*x, *y, weight);
    }
}

/// Blend through the RGBA quad of each pixel, for packed 16-bit formats.
pub fn blend_pixels<L: Layout>(a: &mut [u8], b: &[u8], weight: u16) {
    let weight = weight.min(BLEND_WEIGHT_MAX) as u32;
    let count = a.len().min(b.len()) / L::BYTES;
    for i in 0..count {
        let pa = L::read(a, i);
        let pb = L::read(b, i);
        L::write(
            a,
            i,
            [
                mix(pa[0], pb[0], weight),
                mix(pa[1], pb[1], weight),
                mix(pa[2], pb[2], weight),
                mix(pa[3], pb[3], weight),
            ],
        );
    }
}

pub fn delta<L: Layout>(a: &[u8], b: &[u8], out: &mut [u8]) {
    let count = out.len().min(a.len().min(b.len()) / L::BYTES);
    for (i, o) in out[..count].iter_mut().enumerate() {
        *o = L::delta(a, b, i);
    }
}

pub fn copy(src: &[u8], dst: &mut [u8]) {
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src[..n]);
}

pub fn convert<S: Layout, D: Layout>(src: &[u8], dst: &mut [u8]) {
    let count = (src.len() / S::BYTES).min(dst.len() / D::BYTES);
    for i in 0..count {
        D::write(dst, i, S::read(src, i));
    }
}

/// Conversion to [`Gray8`](crate::pixel::Gray8) through the source's own luma.
pub fn convert_gray<S: Layout>(src: &[u8], dst: &mut [u8]) {
    let count = (src.len() / S::BYTES).min(dst.len());
    for (i, o) in dst[..count].iter_mut().enumerate() {
        *o = S::luma(src, i);
    }
}

/// Four field deinterlace.
///
/// For every odd line the motion at each pixel is the mean luma difference
/// between `current` and `next` over the line itself and the lines above and
/// below. Pixels whose motion reaches `threshold` are rebuilt from the
/// neighbouring lines of `current`; the rest keep the woven line.
pub fn deinterlace_4field<L: Layout>(
    current: &mut [u8],
    next: &[u8],
    threshold: u32,
    width: usize,
    height: usize,
) {
    let frame = width * height * L::BYTES;
    if height < 2 || current.len() < frame || next.len() < frame {
        return;
    }

    for y in (1..height).step_by(2) {
        let has_below = y + 1 < height;
        for x in 0..width {
            let i = y * width + x;
            let above = i - width;
            let below = i + width;

            let mut motion = L::delta(current, next, above) as u32 + L::delta(current, next, i) as u32;
            let mut rows = 2;
            if has_below {
                motion += L::delta(current, next, below) as u32;
                rows += 1;
            }
            if motion / rows < threshold {
                continue;
            }

            if !has_below {
                current.copy_within(above * L::BYTES..(above + 1) * L::BYTES, i * L::BYTES);
            } else if L::FORMAT.is_byte_linear() {
                for k in 0..L::BYTES {
                    let up = current[above * L::BYTES + k] as u32;
                    let down = current[below * L::BYTES + k] as u32;
                    current[i * L::BYTES + k] = ((up + down) >> 1) as u8;
                }
            } else {
                let up = L::read(current, above);
                let down = L::read(current, below);
                let mut px = [0u8; 4];
                for c in 0..4 {
                    px[c] = ((up[c] as u32 + down[c] as u32) >> 1) as u8;
                }
                L::write(current, i, px);
            }
        }
    }
}
