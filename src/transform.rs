// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Geometric transforms of a [`Frame`].
//!
//! Every transform that changes the frame's shape writes into a fresh engine
//! buffer and adopts it, so a held frame receives the result as a copy.
//! Transforms work on whole pixels and are not defined for
//! [`SubpixelOrder::Yuyv`], where neighbouring pixels share chroma.

use crate::{
    buffer::RawBuffer,
    error::{FrameError, Result},
    frame::{frame_size, Frame, Rect},
    pixel::SubpixelOrder,
};
use core::fmt;
use std::str::FromStr;
use tracing::{error, instrument};

/// Image rotation, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Rotation0 = 0,
    Rotation90 = 1,
    Rotation180 = 2,
    Rotation270 = 3,
}

impl Rotation {
    /// Rotation for a multiple of 90 degrees.
    pub fn from_degrees(degrees: u32) -> Result<Self> {
        match degrees % 360 {
            0 => Ok(Rotation::Rotation0),
            90 => Ok(Rotation::Rotation90),
            180 => Ok(Rotation::Rotation180),
            270 => Ok(Rotation::Rotation270),
            _ => Err(FrameError::Argument(format!(
                "rotation of {} degrees is not a multiple of 90",
                degrees
            ))),
        }
    }
}

/// Mirror axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirror {
    /// Left and right swap
    Horizontal,
    /// Top and bottom swap
    Vertical,
    Both,
}

impl fmt::Display for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Mirror::Horizontal => "horizontal",
            Mirror::Vertical => "vertical",
            Mirror::Both => "both",
        })
    }
}

impl FromStr for Mirror {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "horizontal" | "h" => Ok(Mirror::Horizontal),
            "vertical" | "v" => Ok(Mirror::Vertical),
            "both" => Ok(Mirror::Both),
            _ => Err(FrameError::Argument(format!("unknown mirror {s}"))),
        }
    }
}

impl Frame {
    fn check_transformable(&self, operation: &str) -> Result<()> {
        if self.format() == SubpixelOrder::Yuyv {
            return Err(FrameError::unsupported(operation, self.format()));
        }
        if self.is_empty() {
            return Err(FrameError::Argument(format!("{} of an empty frame", operation)));
        }
        Ok(())
    }

    /// Rebuilds the frame at `width` x `height`, taking each output pixel
    /// from the source pixel `map` returns for it.
    fn remap(
        &mut self,
        width: u32,
        height: u32,
        map: impl Fn(usize, usize) -> (usize, usize),
    ) -> Result<()> {
        let format = self.format();
        let size = frame_size(width, height, format)?;
        let bpp = format.bytes_per_pixel();
        let stride = self.width() as usize * bpp;

        let mut out = RawBuffer::allocate(size);
        {
            let src = self.buffer();
            let dst = out.as_slice_mut();
            for y in 0..height as usize {
                for x in 0..width as usize {
                    let (sx, sy) = map(x, y);
                    let s = sy * stride + sx * bpp;
                    let d = (y * width as usize + x) * bpp;
                    dst[d..d + bpp].copy_from_slice(&src[s..s + bpp]);
                }
            }
        }
        self.assign_buffer(width, height, format, out)
    }

    /// Keeps only the pixels inside `rect`, which must lie within the frame.
    #[instrument(level = "trace", skip_all)]
    pub fn crop(&mut self, rect: &Rect) -> Result<()> {
        self.check_transformable("crop")?;
        let inside = rect.x >= 0
            && rect.y >= 0
            && rect.width > 0
            && rect.height > 0
            && rect.x as i64 + rect.width as i64 <= self.width() as i64
            && rect.y as i64 + rect.height as i64 <= self.height() as i64;
        if !inside {
            error!(
                "crop {:?} is outside the {}x{} frame",
                rect,
                self.width(),
                self.height()
            );
            return Err(FrameError::OutOfBounds {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                frame_width: self.width(),
                frame_height: self.height(),
            });
        }
        if rect.width as u32 == self.width() && rect.height as u32 == self.height() {
            return Ok(());
        }

        let format = self.format();
        let bpp = format.bytes_per_pixel();
        let (width, height) = (rect.width as u32, rect.height as u32);
        let size = frame_size(width, height, format)?;
        let src_stride = self.width() as usize * bpp;
        let row = width as usize * bpp;

        let mut out = RawBuffer::allocate(size);
        {
            let src = self.buffer();
            let dst = out.as_slice_mut();
            for y in 0..height as usize {
                let s = (rect.y as usize + y) * src_stride + rect.x as usize * bpp;
                dst[y * row..(y + 1) * row].copy_from_slice(&src[s..s + row]);
            }
        }
        self.assign_buffer(width, height, format, out)
    }

    /// Rotates clockwise; quarter turns swap width and height.
    #[instrument(level = "trace", skip_all)]
    pub fn rotate(&mut self, rotation: Rotation) -> Result<()> {
        self.check_transformable("rotate")?;
        let (w, h) = (self.width(), self.height());
        let (wu, hu) = (w as usize, h as usize);
        match rotation {
            Rotation::Rotation0 => Ok(()),
            Rotation::Rotation90 => self.remap(h, w, |x, y| (y, hu - 1 - x)),
            Rotation::Rotation180 => self.remap(w, h, |x, y| (wu - 1 - x, hu - 1 - y)),
            Rotation::Rotation270 => self.remap(h, w, |x, y| (wu - 1 - y, x)),
        }
    }

    /// Mirrors the frame in place.
    pub fn flip(&mut self, mirror: Mirror) -> Result<()> {
        self.check_transformable("flip")?;
        let bpp = self.colours();
        let stride = self.width() as usize * bpp;
        let height = self.height() as usize;
        let buf = self.buffer_mut();

        if matches!(mirror, Mirror::Horizontal | Mirror::Both) {
            for row in buf.chunks_exact_mut(stride) {
                let pixels = row.len() / bpp;
                for x in 0..pixels / 2 {
                    let (left, right) = row.split_at_mut((pixels - 1 - x) * bpp);
                    left[x * bpp..(x + 1) * bpp].swap_with_slice(&mut right[..bpp]);
                }
            }
        }
        if matches!(mirror, Mirror::Vertical | Mirror::Both) {
            for y in 0..height / 2 {
                let (top, bottom) = buf.split_at_mut((height - 1 - y) * stride);
                top[y * stride..(y + 1) * stride].swap_with_slice(&mut bottom[..stride]);
            }
        }
        Ok(())
    }

    /// Resizes to `percent` of the current size with nearest-neighbour
    /// sampling. Dimensions never shrink below one pixel.
    #[instrument(level = "trace", skip_all)]
    pub fn scale(&mut self, percent: u32) -> Result<()> {
        if percent == 0 {
            return Err(FrameError::Argument("scale of 0 percent".to_string()));
        }
        self.check_transformable("scale")?;
        if percent == 100 {
            return Ok(());
        }
        let (w, h) = (self.width() as u64, self.height() as u64);
        let width = (w * percent as u64 / 100).max(1);
        let height = (h * percent as u64 / 100).max(1);
        if width > u32::MAX as u64 || height > u32::MAX as u64 {
            return Err(FrameError::Argument(format!("scale of {} percent is too large", percent)));
        }
        self.remap(width as u32, height as u32, |x, y| {
            (
                (x as u64 * w / width) as usize,
                (y as u64 * h / height) as usize,
            )
        })
    }
}
