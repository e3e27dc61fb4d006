// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! SSE2 and AVX2 kernels.
//!
//! The safe wrappers are only handed out by the registry once the matching
//! CPU feature has been detected. Each kernel finishes the tail that does not
//! fill a vector with the same arithmetic as the scalar reference.

use super::{scalar, BLEND_WEIGHT_MAX};
use crate::pixel::{luma, Gray8, Layout, Yuyv};
use std::arch::x86_64::*;

pub(crate) fn blend_sse2(a: &mut [u8], b: &[u8], weight: u16) {
    unsafe { blend_sse2_impl(a, b, weight) }
}

pub(crate) fn blend_avx2(a: &mut [u8], b: &[u8], weight: u16) {
    unsafe { blend_avx2_impl(a, b, weight) }
}

pub(crate) fn delta_gray_sse2(a: &[u8], b: &[u8], out: &mut [u8]) {
    unsafe { delta_gray_sse2_impl(a, b, out) }
}

pub(crate) fn delta_gray_avx2(a: &[u8], b: &[u8], out: &mut [u8]) {
    unsafe { delta_gray_avx2_impl(a, b, out) }
}

pub(crate) fn delta_yuyv_sse2(a: &[u8], b: &[u8], out: &mut [u8]) {
    unsafe { delta_yuyv_sse2_impl(a, b, out) }
}

/// Delta for 32-bit formats with red, green and blue at byte `R`, `G`, `B`.
pub(crate) fn delta_rgb32_sse2<const R: usize, const G: usize, const B: usize>(
    a: &[u8],
    b: &[u8],
    out: &mut [u8],
) {
    unsafe { delta_rgb32_sse2_impl::<R, G, B>(a, b, out) }
}

pub(crate) fn convert_rgb32_gray_sse2<const R: usize, const G: usize, const B: usize>(
    src: &[u8],
    dst: &mut [u8],
) {
    unsafe { convert_rgb32_gray_sse2_impl::<R, G, B>(src, dst) }
}

pub(crate) fn convert_yuyv_gray_sse2(src: &[u8], dst: &mut [u8]) {
    unsafe { convert_yuyv_gray_sse2_impl(src, dst) }
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn absdiff_sse2(a: __m128i, b: __m128i) -> __m128i {
    _mm_or_si128(_mm_subs_epu8(a, b), _mm_subs_epu8(b, a))
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn load(buf: &[u8], offset: usize) -> __m128i {
    _mm_loadu_si128(buf.as_ptr().add(offset) as *const __m128i)
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn store(buf: &mut [u8], offset: usize, v: __m128i) {
    _mm_storeu_si128(buf.as_mut_ptr().add(offset) as *mut __m128i, v)
}

#[target_feature(enable = "sse2")]
unsafe fn blend_sse2_impl(a: &mut [u8], b: &[u8], weight: u16) {
    let weight = weight.min(BLEND_WEIGHT_MAX);
    let n = a.len().min(b.len());
    let zero = _mm_setzero_si128();
    let wa = _mm_set1_epi16((BLEND_WEIGHT_MAX - weight) as i16);
    let wb = _mm_set1_epi16(weight as i16);
    let round = _mm_set1_epi16(128);

    let mut i = 0;
    while i + 16 <= n {
        let va = load(a, i);
        let vb = load(b, i);
        // a * (256 - w) + b * w + 128 peaks at 65408 and fits an unsigned lane
        let lo = _mm_add_epi16(
            _mm_add_epi16(
                _mm_mullo_epi16(_mm_unpacklo_epi8(va, zero), wa),
                _mm_mullo_epi16(_mm_unpacklo_epi8(vb, zero), wb),
            ),
            round,
        );
        let hi = _mm_add_epi16(
            _mm_add_epi16(
                _mm_mullo_epi16(_mm_unpackhi_epi8(va, zero), wa),
                _mm_mullo_epi16(_mm_unpackhi_epi8(vb, zero), wb),
            ),
            round,
        );
        let mixed = _mm_packus_epi16(_mm_srli_epi16(lo, 8), _mm_srli_epi16(hi, 8));
        store(a, i, mixed);
        i += 16;
    }
    scalar::blend_bytes(&mut a[i..n], &b[i..n], weight);
}

#[target_feature(enable = "avx2")]
unsafe fn blend_avx2_impl(a: &mut [u8], b: &[u8], weight: u16) {
    let weight = weight.min(BLEND_WEIGHT_MAX);
    let n = a.len().min(b.len());
    let zero = _mm256_setzero_si256();
    let wa = _mm256_set1_epi16((BLEND_WEIGHT_MAX - weight) as i16);
    let wb = _mm256_set1_epi16(weight as i16);
    let round = _mm256_set1_epi16(128);

    let mut i = 0;
    while i + 32 <= n {
        let va = _mm256_loadu_si256(a.as_ptr().add(i) as *const __m256i);
        let vb = _mm256_loadu_si256(b.as_ptr().add(i) as *const __m256i);
        // unpack and pack both work per 128-bit lane, so byte order survives
        let lo = _mm256_add_epi16(
            _mm256_add_epi16(
                _mm256_mullo_epi16(_mm256_unpacklo_epi8(va, zero), wa),
                _mm256_mullo_epi16(_mm256_unpacklo_epi8(vb, zero), wb),
            ),
            round,
        );
        let hi = _mm256_add_epi16(
            _mm256_add_epi16(
                _mm256_mullo_epi16(_mm256_unpackhi_epi8(va, zero), wa),
                _mm256_mullo_epi16(_mm256_unpackhi_epi8(vb, zero), wb),
            ),
            round,
        );
        let mixed = _mm256_packus_epi16(_mm256_srli_epi16(lo, 8), _mm256_srli_epi16(hi, 8));
        _mm256_storeu_si256(a.as_mut_ptr().add(i) as *mut __m256i, mixed);
        i += 32;
    }
    scalar::blend_bytes(&mut a[i..n], &b[i..n], weight);
}

#[target_feature(enable = "sse2")]
unsafe fn delta_gray_sse2_impl(a: &[u8], b: &[u8], out: &mut [u8]) {
    let n = out.len().min(a.len()).min(b.len());
    let mut i = 0;
    while i + 16 <= n {
        store(out, i, absdiff_sse2(load(a, i), load(b, i)));
        i += 16;
    }
    scalar::delta::<Gray8>(&a[i..n], &b[i..n], &mut out[i..n]);
}

#[target_feature(enable = "avx2")]
unsafe fn delta_gray_avx2_impl(a: &[u8], b: &[u8], out: &mut [u8]) {
    let n = out.len().min(a.len()).min(b.len());
    let mut i = 0;
    while i + 32 <= n {
        let va = _mm256_loadu_si256(a.as_ptr().add(i) as *const __m256i);
        let vb = _mm256_loadu_si256(b.as_ptr().add(i) as *const __m256i);
        let d = _mm256_or_si256(_mm256_subs_epu8(va, vb), _mm256_subs_epu8(vb, va));
        _mm256_storeu_si256(out.as_mut_ptr().add(i) as *mut __m256i, d);
        i += 32;
    }
    scalar::delta::<Gray8>(&a[i..n], &b[i..n], &mut out[i..n]);
}

#[target_feature(enable = "sse2")]
unsafe fn delta_yuyv_sse2_impl(a: &[u8], b: &[u8], out: &mut [u8]) {
    let n = out.len().min(a.len() / 2).min(b.len() / 2);
    let luma_mask = _mm_set1_epi16(0x00ff);
    let mut i = 0;
    while i + 16 <= n {
        let d0 = absdiff_sse2(load(a, i * 2), load(b, i * 2));
        let d1 = absdiff_sse2(load(a, i * 2 + 16), load(b, i * 2 + 16));
        let y = _mm_packus_epi16(_mm_and_si128(d0, luma_mask), _mm_and_si128(d1, luma_mask));
        store(out, i, y);
        i += 16;
    }
    scalar::delta::<Yuyv>(&a[i * 2..], &b[i * 2..], &mut out[i..n]);
}

/// Channel extraction and luma weights for four 32-bit pixels per vector.
struct Luma32 {
    mask: __m128i,
    shifts: [__m128i; 3],
    weights: [__m128i; 3],
}

impl Luma32 {
    #[inline]
    #[target_feature(enable = "sse2")]
    unsafe fn new(offsets: [usize; 3]) -> Self {
        Luma32 {
            mask: _mm_set1_epi32(0xff),
            shifts: [
                _mm_cvtsi32_si128((offsets[0] * 8) as i32),
                _mm_cvtsi32_si128((offsets[1] * 8) as i32),
                _mm_cvtsi32_si128((offsets[2] * 8) as i32),
            ],
            weights: [_mm_set1_epi32(77), _mm_set1_epi32(150), _mm_set1_epi32(29)],
        }
    }

    /// Luma of each 32-bit lane, left in the low byte of the lane.
    #[inline]
    #[target_feature(enable = "sse2")]
    unsafe fn apply(&self, v: __m128i) -> __m128i {
        // channels sit in the low 16 bits of each lane and every product is
        // below 2^16, so 16-bit multiplies are exact
        let mut sum = _mm_setzero_si128();
        for c in 0..3 {
            let channel = _mm_and_si128(_mm_srl_epi32(v, self.shifts[c]), self.mask);
            sum = _mm_add_epi32(sum, _mm_mullo_epi16(channel, self.weights[c]));
        }
        _mm_srli_epi32(sum, 8)
    }

    /// Packs 16 lane results from four vectors into 16 bytes.
    #[inline]
    #[target_feature(enable = "sse2")]
    unsafe fn pack(y: [__m128i; 4]) -> __m128i {
        _mm_packus_epi16(_mm_packs_epi32(y[0], y[1]), _mm_packs_epi32(y[2], y[3]))
    }
}

#[target_feature(enable = "sse2")]
unsafe fn delta_rgb32_sse2_impl<const R: usize, const G: usize, const B: usize>(
    a: &[u8],
    b: &[u8],
    out: &mut [u8],
) {
    let n = out.len().min(a.len() / 4).min(b.len() / 4);
    let luma32 = Luma32::new([R, G, B]);
    let mut i = 0;
    while i + 16 <= n {
        let mut y = [_mm_setzero_si128(); 4];
        for (k, lane) in y.iter_mut().enumerate() {
            let offset = (i + k * 4) * 4;
            *lane = luma32.apply(absdiff_sse2(load(a, offset), load(b, offset)));
        }
        store(out, i, Luma32::pack(y));
        i += 16;
    }
    for j in i..n {
        let p = j * 4;
        out[j] = luma(
            a[p + R].abs_diff(b[p + R]),
            a[p + G].abs_diff(b[p + G]),
            a[p + B].abs_diff(b[p + B]),
        );
    }
}

#[target_feature(enable = "sse2")]
unsafe fn convert_rgb32_gray_sse2_impl<const R: usize, const G: usize, const B: usize>(
    src: &[u8],
    dst: &mut [u8],
) {
    let n = dst.len().min(src.len() / 4);
    let luma32 = Luma32::new([R, G, B]);
    let mut i = 0;
    while i + 16 <= n {
        let mut y = [_mm_setzero_si128(); 4];
        for (k, lane) in y.iter_mut().enumerate() {
            *lane = luma32.apply(load(src, (i + k * 4) * 4));
        }
        store(dst, i, Luma32::pack(y));
        i += 16;
    }
    for j in i..n {
        let p = j * 4;
        dst[j] = luma(src[p + R], src[p + G], src[p + B]);
    }
}

#[target_feature(enable = "sse2")]
unsafe fn convert_yuyv_gray_sse2_impl(src: &[u8], dst: &mut [u8]) {
    let n = dst.len().min(src.len() / 2);
    let luma_mask = _mm_set1_epi16(0x00ff);
    let mut i = 0;
    while i + 16 <= n {
        let lo = _mm_and_si128(load(src, i * 2), luma_mask);
        let hi = _mm_and_si128(load(src, i * 2 + 16), luma_mask);
        store(dst, i, _mm_packus_epi16(lo, hi));
        i += 16;
    }
    for j in i..n {
        dst[j] = Yuyv::luma(src, j);
    }
}
