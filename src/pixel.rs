// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Pixel formats, colours and the per-format pixel layouts used by the
//! scalar kernels.

use crate::error::FrameError;
use core::fmt;
use std::str::FromStr;

/// Channel layout of a frame buffer.
///
/// All layouts are interleaved per pixel, row-major and unpadded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubpixelOrder {
    /// 8-bit luminance
    Gray8,
    /// 24-bit R, G, B
    Rgb,
    /// 24-bit B, G, R
    Bgr,
    /// 32-bit R, G, B, A
    Rgba,
    /// 32-bit B, G, R, A
    Bgra,
    /// 32-bit A, R, G, B
    Argb,
    /// 32-bit A, B, G, R
    Abgr,
    /// YUV 4:2:2 packed as Y0 U Y1 V, two pixels per four bytes
    Yuyv,
    /// Little-endian 16-bit x1R5G5B5
    Rgb555,
    /// Little-endian 16-bit R5G6B5
    Rgb565,
}

impl SubpixelOrder {
    pub const ALL: [SubpixelOrder; 10] = [
        SubpixelOrder::Gray8,
        SubpixelOrder::Rgb,
        SubpixelOrder::Bgr,
        SubpixelOrder::Rgba,
        SubpixelOrder::Bgra,
        SubpixelOrder::Argb,
        SubpixelOrder::Abgr,
        SubpixelOrder::Yuyv,
        SubpixelOrder::Rgb555,
        SubpixelOrder::Rgb565,
    ];

    /// Bytes per pixel, the "colours" of a frame.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            SubpixelOrder::Gray8 => 1,
            SubpixelOrder::Rgb | SubpixelOrder::Bgr => 3,
            SubpixelOrder::Rgba
            | SubpixelOrder::Bgra
            | SubpixelOrder::Argb
            | SubpixelOrder::Abgr => 4,
            SubpixelOrder::Yuyv | SubpixelOrder::Rgb555 | SubpixelOrder::Rgb565 => 2,
        }
    }

    /// True when arithmetic on individual bytes is arithmetic on channels.
    pub const fn is_byte_linear(self) -> bool {
        !matches!(self, SubpixelOrder::Rgb555 | SubpixelOrder::Rgb565)
    }

    pub const fn has_colour(self) -> bool {
        !matches!(self, SubpixelOrder::Gray8)
    }

    pub const fn fourcc(self) -> &'static str {
        match self {
            SubpixelOrder::Gray8 => "GREY",
            SubpixelOrder::Rgb => "RGB3",
            SubpixelOrder::Bgr => "BGR3",
            SubpixelOrder::Rgba => "RGBA",
            SubpixelOrder::Bgra => "BGRA",
            SubpixelOrder::Argb => "ARGB",
            SubpixelOrder::Abgr => "ABGR",
            SubpixelOrder::Yuyv => "YUYV",
            SubpixelOrder::Rgb555 => "RGBO",
            SubpixelOrder::Rgb565 => "RGBP",
        }
    }
}

impl fmt::Display for SubpixelOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.fourcc())
    }
}

impl FromStr for SubpixelOrder {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        let format = match upper.as_str() {
            "GREY" | "GRAY" | "GRAY8" => SubpixelOrder::Gray8,
            "RGB3" | "RGB" => SubpixelOrder::Rgb,
            "BGR3" | "BGR" => SubpixelOrder::Bgr,
            "RGBA" => SubpixelOrder::Rgba,
            "BGRA" => SubpixelOrder::Bgra,
            "ARGB" => SubpixelOrder::Argb,
            "ABGR" => SubpixelOrder::Abgr,
            "YUYV" => SubpixelOrder::Yuyv,
            "RGBO" | "RGB555" => SubpixelOrder::Rgb555,
            "RGBP" | "RGB565" => SubpixelOrder::Rgb565,
            _ => return Err(FrameError::Argument(format!("unknown pixel format {s}"))),
        };
        Ok(format)
    }
}

/// An 8-bit per channel colour used for fills, markers and annotation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// The colour as an opaque RGBA quad.
    pub const fn rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// BT.601 luma with 8-bit fixed point weights that sum to 256, so equal
/// channels map back to themselves.
#[inline(always)]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32) >> 8) as u8
}

#[inline(always)]
fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// BT.601 studio range YUV to RGB.
#[inline]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    [
        clamp_u8((298 * c + 409 * e + 128) >> 8),
        clamp_u8((298 * c - 100 * d - 208 * e + 128) >> 8),
        clamp_u8((298 * c + 516 * d + 128) >> 8),
    ]
}

/// BT.601 studio range RGB to YUV.
#[inline]
pub fn rgb_to_yuv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    [
        clamp_u8(((66 * r + 129 * g + 25 * b + 128) >> 8) + 16),
        clamp_u8(((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128),
        clamp_u8(((112 * r - 94 * g - 18 * b + 128) >> 8) + 128),
    ]
}

/// Per-format access to pixel `i` of a buffer as an RGBA quad.
///
/// Formats without alpha read as opaque and ignore alpha on write. Formats
/// with fewer than 8 bits per channel expand by bit replication on read and
/// truncate on write, so a read followed by a write is lossless.
pub trait Layout {
    const FORMAT: SubpixelOrder;
    const BYTES: usize = Self::FORMAT.bytes_per_pixel();

    fn read(buf: &[u8], i: usize) -> [u8; 4];

    fn write(buf: &mut [u8], i: usize, px: [u8; 4]);

    #[inline(always)]
    fn luma(buf: &[u8], i: usize) -> u8 {
        let [r, g, b, _] = Self::read(buf, i);
        luma(r, g, b)
    }

    /// Luma of the per-channel absolute difference of pixel `i`.
    #[inline(always)]
    fn delta(a: &[u8], b: &[u8], i: usize) -> u8 {
        let [ar, ag, ab, _] = Self::read(a, i);
        let [br, bg, bb, _] = Self::read(b, i);
        luma(ar.abs_diff(br), ag.abs_diff(bg), ab.abs_diff(bb))
    }
}

pub struct Gray8;

impl Layout for Gray8 {
    const FORMAT: SubpixelOrder = SubpixelOrder::Gray8;

    #[inline(always)]
    fn read(buf: &[u8], i: usize) -> [u8; 4] {
        let v = buf[i];
        [v, v, v, 255]
    }

    #[inline(always)]
    fn write(buf: &mut [u8], i: usize, px: [u8; 4]) {
        buf[i] = luma(px[0], px[1], px[2]);
    }

    #[inline(always)]
    fn luma(buf: &[u8], i: usize) -> u8 {
        buf[i]
    }

    #[inline(always)]
    fn delta(a: &[u8], b: &[u8], i: usize) -> u8 {
        a[i].abs_diff(b[i])
    }
}

const NO_ALPHA: usize = usize::MAX;

/// 8 bits per channel layout of `N` bytes with the channel offsets given.
pub struct Packed8<
    const N: usize,
    const R: usize,
    const G: usize,
    const B: usize,
    const A: usize,
>;

pub type Rgb24 = Packed8<3, 0, 1, 2, NO_ALPHA>;
pub type Bgr24 = Packed8<3, 2, 1, 0, NO_ALPHA>;
pub type Rgba32 = Packed8<4, 0, 1, 2, 3>;
pub type Bgra32 = Packed8<4, 2, 1, 0, 3>;
pub type Argb32 = Packed8<4, 1, 2, 3, 0>;
pub type Abgr32 = Packed8<4, 3, 2, 1, 0>;

macro_rules! packed8_format {
    ($ty:ty, $format:expr) => {
        impl Layout for $ty {
            const FORMAT: SubpixelOrder = $format;

            #[inline(always)]
            fn read(buf: &[u8], i: usize) -> [u8; 4] {
                Self::read_packed(buf, i)
            }

            #[inline(always)]
            fn write(buf: &mut [u8], i: usize, px: [u8; 4]) {
                Self::write_packed(buf, i, px)
            }
        }
    };
}

impl<const N: usize, const R: usize, const G: usize, const B: usize, const A: usize>
    Packed8<N, R, G, B, A>
{
    /// Byte offsets of the red, green and blue channels within a pixel.
    pub const OFFSETS: [usize; 3] = [R, G, B];

    #[inline(always)]
    fn read_packed(buf: &[u8], i: usize) -> [u8; 4] {
        let px = &buf[i * N..i * N + N];
        let a = if A < N { px[A] } else { 255 };
        [px[R], px[G], px[B], a]
    }

    #[inline(always)]
    fn write_packed(buf: &mut [u8], i: usize, rgba: [u8; 4]) {
        let px = &mut buf[i * N..i * N + N];
        px[R] = rgba[0];
        px[G] = rgba[1];
        px[B] = rgba[2];
        if A < N {
            px[A] = rgba[3];
        }
    }
}

packed8_format!(Rgb24, SubpixelOrder::Rgb);
packed8_format!(Bgr24, SubpixelOrder::Bgr);
packed8_format!(Rgba32, SubpixelOrder::Rgba);
packed8_format!(Bgra32, SubpixelOrder::Bgra);
packed8_format!(Argb32, SubpixelOrder::Argb);
packed8_format!(Abgr32, SubpixelOrder::Abgr);

pub struct Yuyv;

impl Layout for Yuyv {
    const FORMAT: SubpixelOrder = SubpixelOrder::Yuyv;

    #[inline(always)]
    fn read(buf: &[u8], i: usize) -> [u8; 4] {
        let pair = (i & !1) * 2;
        let [r, g, b] = yuv_to_rgb(buf[i * 2], buf[pair + 1], buf[pair + 3]);
        [r, g, b, 255]
    }

    /// Chroma of each pair is taken from its even pixel.
    #[inline(always)]
    fn write(buf: &mut [u8], i: usize, px: [u8; 4]) {
        let [y, u, v] = rgb_to_yuv(px[0], px[1], px[2]);
        buf[i * 2] = y;
        if i & 1 == 0 {
            buf[i * 2 + 1] = u;
            buf[i * 2 + 3] = v;
        }
    }

    #[inline(always)]
    fn luma(buf: &[u8], i: usize) -> u8 {
        buf[i * 2]
    }

    #[inline(always)]
    fn delta(a: &[u8], b: &[u8], i: usize) -> u8 {
        a[i * 2].abs_diff(b[i * 2])
    }
}

#[inline(always)]
fn expand5(v: u16) -> u8 {
    let v = (v & 0x1f) as u8;
    (v << 3) | (v >> 2)
}

#[inline(always)]
fn expand6(v: u16) -> u8 {
    let v = (v & 0x3f) as u8;
    (v << 2) | (v >> 4)
}

#[inline(always)]
fn read_word(buf: &[u8], i: usize) -> u16 {
    u16::from_le_bytes([buf[i * 2], buf[i * 2 + 1]])
}

#[inline(always)]
fn write_word(buf: &mut [u8], i: usize, word: u16) {
    buf[i * 2..i * 2 + 2].copy_from_slice(&word.to_le_bytes());
}

pub struct Rgb555;

impl Layout for Rgb555 {
    const FORMAT: SubpixelOrder = SubpixelOrder::Rgb555;

    #[inline(always)]
    fn read(buf: &[u8], i: usize) -> [u8; 4] {
        let w = read_word(buf, i);
        [expand5(w >> 10), expand5(w >> 5), expand5(w), 255]
    }

    #[inline(always)]
    fn write(buf: &mut [u8], i: usize, px: [u8; 4]) {
        let w = ((px[0] as u16 >> 3) << 10) | ((px[1] as u16 >> 3) << 5) | (px[2] as u16 >> 3);
        write_word(buf, i, w);
    }
}

pub struct Rgb565;

impl Layout for Rgb565 {
    const FORMAT: SubpixelOrder = SubpixelOrder::Rgb565;

    #[inline(always)]
    fn read(buf: &[u8], i: usize) -> [u8; 4] {
        let w = read_word(buf, i);
        [expand5(w >> 11), expand6(w >> 5), expand5(w), 255]
    }

    #[inline(always)]
    fn write(buf: &mut [u8], i: usize, px: [u8; 4]) {
        let w = ((px[0] as u16 >> 3) << 11) | ((px[1] as u16 >> 2) << 5) | (px[2] as u16 >> 3);
        write_word(buf, i, w);
    }
}

/// Runs `$body` with `$l` bound to the [`Layout`] type of a runtime format.
macro_rules! with_layout {
    ($format:expr, $l:ident => $body:expr) => {
        match $format {
            $crate::pixel::SubpixelOrder::Gray8 => {
                type $l = $crate::pixel::Gray8;
                $body
            }
            $crate::pixel::SubpixelOrder::Rgb => {
                type $l = $crate::pixel::Rgb24;
                $body
            }
            $crate::pixel::SubpixelOrder::Bgr => {
                type $l = $crate::pixel::Bgr24;
                $body
            }
            $crate::pixel::SubpixelOrder::Rgba => {
                type $l = $crate::pixel::Rgba32;
                $body
            }
            $crate::pixel::SubpixelOrder::Bgra => {
                type $l = $crate::pixel::Bgra32;
                $body
            }
            $crate::pixel::SubpixelOrder::Argb => {
                type $l = $crate::pixel::Argb32;
                $body
            }
            $crate::pixel::SubpixelOrder::Abgr => {
                type $l = $crate::pixel::Abgr32;
                $body
            }
            $crate::pixel::SubpixelOrder::Yuyv => {
                type $l = $crate::pixel::Yuyv;
                $body
            }
            $crate::pixel::SubpixelOrder::Rgb555 => {
                type $l = $crate::pixel::Rgb555;
                $body
            }
            $crate::pixel::SubpixelOrder::Rgb565 => {
                type $l = $crate::pixel::Rgb565;
                $body
            }
        }
    };
}

pub(crate) use with_layout;

/// Reads pixel `i` of a buffer in `format` as RGBA.
pub fn read_pixel(format: SubpixelOrder, buf: &[u8], i: usize) -> [u8; 4] {
    with_layout!(format, L => L::read(buf, i))
}

/// Writes an RGBA quad to pixel `i` of a buffer in `format`.
pub fn write_pixel(format: SubpixelOrder, buf: &mut [u8], i: usize, px: [u8; 4]) {
    with_layout!(format, L => L::write(buf, i, px))
}
