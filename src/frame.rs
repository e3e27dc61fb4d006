// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    buffer::{Ownership, OwnershipKind, RawBuffer},
    error::{FrameError, Result},
    kernels::blend_weight,
    pixel::{with_layout, Layout, Rgb, SubpixelOrder},
    registry::registry,
};
use core::fmt;
use tracing::{debug, error, instrument, warn};

/// Rectangle specification for crop, fill and overlay regions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rect {
    /// X coordinate of top-left corner
    pub x: i32,
    /// Y coordinate of top-left corner
    pub y: i32,
    /// Width of the rectangle in pixels
    pub width: i32,
    /// Height of the rectangle in pixels
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

/// Overlap of a `width` x `height` source placed at an offset inside a
/// destination, in source and destination coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Clip {
    pub src_x: usize,
    pub src_y: usize,
    pub dst_x: usize,
    pub dst_y: usize,
    pub width: usize,
    pub height: usize,
}

pub(crate) fn clip(dst: (u32, u32), src: (u32, u32), x: i32, y: i32) -> Option<Clip> {
    let (x, y) = (x as i64, y as i64);
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + src.0 as i64).min(dst.0 as i64);
    let y1 = (y + src.1 as i64).min(dst.1 as i64);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some(Clip {
        src_x: (x0 - x) as usize,
        src_y: (y0 - y) as usize,
        dst_x: x0 as usize,
        dst_y: y0 as usize,
        width: (x1 - x0) as usize,
        height: (y1 - y0) as usize,
    })
}

/// Byte size of a frame, validating the dimensions for the format.
pub(crate) fn frame_size(width: u32, height: u32, format: SubpixelOrder) -> Result<usize> {
    if format == SubpixelOrder::Yuyv && width % 2 != 0 {
        return Err(FrameError::Argument(format!(
            "{} frames need an even width, got {}",
            format, width
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(format.bytes_per_pixel()))
        .ok_or_else(|| FrameError::Argument(format!("{}x{} {} is too large", width, height, format)))
}

/// One captured video frame.
///
/// A `Frame` owns at most one [`RawBuffer`], whose size is always
/// `width * height * colours` bytes once assigned. The buffer is replaced
/// only when an operation needs more room than it has, so a capture loop
/// that writes the same dimensions every frame never reallocates.
///
/// A *held* frame never replaces its buffer: operations that would need a
/// larger one fail, and adopted buffers are copied into the held one. This
/// keeps a frame pointed at memory that something else expects it to use.
///
/// Frames are not synchronized; use one frame from one thread at a time.
///
/// # Example
///
/// ```
/// use edgefirst_motion::{frame::Frame, pixel::SubpixelOrder};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let reference = Frame::with_format(640, 480, SubpixelOrder::Rgba)?;
/// let current = Frame::with_format(640, 480, SubpixelOrder::Rgba)?;
///
/// let mut motion = Frame::new();
/// reference.delta(&current, &mut motion)?;
/// assert_eq!(motion.format(), SubpixelOrder::Gray8);
/// assert!(motion.buffer().iter().all(|&v| v == 0));
/// # Ok(())
/// # }
/// ```
pub struct Frame {
    width: u32,
    height: u32,
    format: SubpixelOrder,
    size: usize,
    buffer: Option<RawBuffer>,
    held: bool,
}

impl Default for Frame {
    fn default() -> Self {
        Frame::new()
    }
}

impl Frame {
    /// An empty frame with no buffer.
    pub fn new() -> Self {
        Frame {
            width: 0,
            height: 0,
            format: SubpixelOrder::Gray8,
            size: 0,
            buffer: None,
            held: false,
        }
    }

    /// Allocates a zeroed engine-owned frame.
    pub fn with_format(width: u32, height: u32, format: SubpixelOrder) -> Result<Self> {
        let mut frame = Frame::new();
        frame.write_buffer(width, height, format)?;
        Ok(frame)
    }

    /// Copies `data` into a new engine-owned frame.
    pub fn from_bytes(width: u32, height: u32, format: SubpixelOrder, data: &[u8]) -> Result<Self> {
        let mut frame = Frame::new();
        frame.assign(width, height, format, data)?;
        Ok(frame)
    }

    /// Adopts `data` without copying.
    pub fn from_vec(width: u32, height: u32, format: SubpixelOrder, data: Vec<u8>) -> Result<Self> {
        let mut frame = Frame::new();
        frame.assign_vec(width, height, format, data)?;
        Ok(frame)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bytes per pixel.
    pub fn colours(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    pub fn format(&self) -> SubpixelOrder {
        self.format
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Ownership of the current buffer, `None` when the frame is empty.
    pub fn ownership(&self) -> Option<OwnershipKind> {
        self.buffer.as_ref().map(RawBuffer::ownership)
    }

    /// Bytes the current buffer can hold without reallocating.
    pub fn allocation(&self) -> usize {
        self.buffer.as_ref().map_or(0, RawBuffer::capacity)
    }

    pub fn buffer(&self) -> &[u8] {
        match &self.buffer {
            Some(buf) => &buf.as_slice()[..self.size],
            None => &[],
        }
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        let size = self.size;
        match &mut self.buffer {
            Some(buf) => &mut buf.as_slice_mut()[..size],
            None => &mut [],
        }
    }

    /// The bytes of the pixel at `x`, `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.colours();
        let offset = (y as usize * self.width as usize + x as usize) * bpp;
        Some(&self.buffer()[offset..offset + bpp])
    }

    pub fn is_buffer_held(&self) -> bool {
        self.held
    }

    pub fn hold_buffer(&mut self, hold: bool) {
        self.held = hold;
    }

    /// Drops the contents, releasing the buffer unless it is held.
    pub fn empty(&mut self) {
        if !self.held {
            self.buffer = None;
        }
        self.width = 0;
        self.height = 0;
        self.size = 0;
    }

    /// Zeroes every byte.
    pub fn clear(&mut self) {
        self.buffer_mut().fill(0);
    }

    fn set_shape(&mut self, width: u32, height: u32, format: SubpixelOrder, size: usize) {
        self.width = width;
        self.height = height;
        self.format = format;
        self.size = size;
    }

    /// Makes sure the buffer can hold `size` bytes, releasing and replacing
    /// it if it cannot and it is not held.
    fn reserve(&mut self, size: usize) -> Result<()> {
        match &self.buffer {
            Some(buf) if buf.capacity() >= size => Ok(()),
            Some(buf) if self.held => {
                warn!(
                    "held buffer of {} bytes cannot hold {} bytes",
                    buf.capacity(),
                    size
                );
                Err(FrameError::Argument(format!(
                    "held buffer of {} bytes cannot hold {} bytes",
                    buf.capacity(),
                    size
                )))
            }
            _ => {
                self.buffer = None;
                self.buffer = Some(RawBuffer::allocate(size));
                Ok(())
            }
        }
    }

    /// Shapes the frame and returns its writable buffer.
    ///
    /// The current allocation is reused whenever it is large enough, so
    /// repeated calls with the same shape return the same memory.
    pub fn write_buffer(
        &mut self,
        width: u32,
        height: u32,
        format: SubpixelOrder,
    ) -> Result<&mut [u8]> {
        let size = frame_size(width, height, format)?;
        if size == 0 {
            return Err(FrameError::Argument(format!(
                "cannot shape a {}x{} frame",
                width, height
            )));
        }
        self.reserve(size)?;
        self.set_shape(width, height, format, size);
        Ok(self.buffer_mut())
    }

    /// Copies `data` into the frame's own buffer.
    pub fn assign(
        &mut self,
        width: u32,
        height: u32,
        format: SubpixelOrder,
        data: &[u8],
    ) -> Result<()> {
        let size = frame_size(width, height, format)?;
        if data.len() < size {
            error!("assign needs {} bytes but was given {}", size, data.len());
            return Err(FrameError::SizeMismatch {
                expected: size,
                actual: data.len(),
            });
        }
        // Copies land in engine memory unless the frame is held on its buffer.
        if !self.held && self.ownership() != Some(OwnershipKind::Engine) {
            self.buffer = None;
        }
        self.write_buffer(width, height, format)?
            .copy_from_slice(&data[..size]);
        Ok(())
    }

    /// Makes this frame a deep copy of `other`.
    pub fn assign_frame(&mut self, other: &Frame) -> Result<()> {
        if other.is_empty() {
            self.empty();
            return Ok(());
        }
        self.assign(other.width, other.height, other.format, other.buffer())
    }

    /// Adopts `buffer` and its ownership.
    ///
    /// The previous buffer is released per its own ownership. If the frame is
    /// held the contents are copied into the held buffer instead and
    /// `buffer` is released. On error `buffer` is released as well.
    pub fn assign_buffer(
        &mut self,
        width: u32,
        height: u32,
        format: SubpixelOrder,
        buffer: RawBuffer,
    ) -> Result<()> {
        let size = frame_size(width, height, format)?;
        if size == 0 {
            return Err(FrameError::Argument(format!(
                "cannot shape a {}x{} frame",
                width, height
            )));
        }
        if buffer.capacity() < size {
            error!(
                "buffer of {} bytes is too small for {}x{} {}",
                buffer.capacity(),
                width,
                height,
                format
            );
            return Err(FrameError::SizeMismatch {
                expected: size,
                actual: buffer.capacity(),
            });
        }

        if self.held && self.buffer.is_some() {
            self.reserve(size)?;
            self.set_shape(width, height, format, size);
            self.buffer_mut()
                .copy_from_slice(&buffer.as_slice()[..size]);
            return Ok(());
        }

        debug!(
            "frame adopts {:?} buffer for {}x{} {}",
            buffer.ownership(),
            width,
            height,
            format
        );
        self.buffer = Some(buffer);
        self.set_shape(width, height, format, size);
        Ok(())
    }

    /// Adopts the storage of `data` without copying.
    pub fn assign_vec(
        &mut self,
        width: u32,
        height: u32,
        format: SubpixelOrder,
        data: Vec<u8>,
    ) -> Result<()> {
        self.assign_buffer(width, height, format, RawBuffer::from_vec(data))
    }

    /// Adopts a foreign pointer released per `ownership`.
    ///
    /// Use [`Ownership::NotOwned`] together with [`Frame::hold_buffer`] to
    /// make the frame a window onto memory owned elsewhere.
    ///
    /// # Safety
    ///
    /// See [`RawBuffer::from_raw_parts`].
    pub unsafe fn assign_direct(
        &mut self,
        width: u32,
        height: u32,
        format: SubpixelOrder,
        ptr: *mut u8,
        capacity: usize,
        ownership: Ownership,
    ) -> Result<()> {
        match RawBuffer::from_raw_parts(ptr, capacity, ownership) {
            Some(buffer) => self.assign_buffer(width, height, format, buffer),
            None => Err(FrameError::Argument("null buffer".to_string())),
        }
    }

    /// Copies the contents of a frame of the same size.
    pub fn copy_buffer(&mut self, other: &Frame) -> Result<()> {
        self.copy_from(other.buffer())
    }

    /// Copies `data`, which must be exactly [`Frame::size`] bytes.
    pub fn copy_from(&mut self, data: &[u8]) -> Result<()> {
        if data.len() != self.size {
            error!(
                "attempt to copy different size image buffers, expected {}, got {}",
                self.size,
                data.len()
            );
            return Err(FrameError::SizeMismatch {
                expected: self.size,
                actual: data.len(),
            });
        }
        self.buffer_mut().copy_from_slice(data);
        Ok(())
    }

    /// Fails unless `other` has the same dimensions and format.
    pub(crate) fn check_compatible(&self, other: &Frame) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            error!(
                "frame size mismatch {}x{} vs {}x{}",
                self.width, self.height, other.width, other.height
            );
            return Err(FrameError::SizeMismatch {
                expected: self.size,
                actual: other.size,
            });
        }
        if self.format != other.format {
            error!("frame format mismatch {} vs {}", self.format, other.format);
            return Err(FrameError::Argument(format!(
                "format mismatch {} vs {}",
                self.format, other.format
            )));
        }
        Ok(())
    }

    fn check_not_empty(&self, operation: &str) -> Result<()> {
        if self.is_empty() {
            return Err(FrameError::Argument(format!("{} of an empty frame", operation)));
        }
        Ok(())
    }

    /// Paints every non-black pixel of `src` over this frame.
    ///
    /// `src` must have the same dimensions and either the same format or
    /// [`SubpixelOrder::Gray8`], whose pixels are painted as grey.
    pub fn overlay(&mut self, src: &Frame) -> Result<()> {
        if self.width != src.width || self.height != src.height {
            return Err(FrameError::SizeMismatch {
                expected: self.size,
                actual: src.size,
            });
        }
        let format = self.format;
        if src.format == format {
            let pixels = self.pixels();
            let from = src.buffer();
            let dst = self.buffer_mut();
            // Black is judged on colour alone; alpha and YUV offsets are ignored.
            with_layout!(format, L => {
                for i in 0..pixels {
                    let [r, g, b, _] = L::read(from, i);
                    if r | g | b != 0 {
                        let at = i * L::BYTES;
                        dst[at..at + L::BYTES].copy_from_slice(&from[at..at + L::BYTES]);
                    }
                }
            });
            return Ok(());
        }
        if src.format != SubpixelOrder::Gray8 {
            return Err(FrameError::unsupported(
                format!("overlay of {}", src.format),
                format,
            ));
        }
        let dst = self.buffer_mut();
        with_layout!(format, L => {
            for (i, &v) in src.buffer().iter().enumerate() {
                if v != 0 {
                    L::write(dst, i, [v, v, v, 255]);
                }
            }
        });
        Ok(())
    }

    /// Copies `src` into this frame with its top-left corner at `x`, `y`,
    /// clipped to this frame.
    pub fn overlay_at(&mut self, src: &Frame, x: i32, y: i32) -> Result<()> {
        self.check_placement(src, x)?;
        let Some(c) = clip((self.width, self.height), (src.width, src.height), x, y) else {
            return Ok(());
        };
        let bpp = self.colours();
        let (dst_stride, src_stride) = (self.width as usize * bpp, src.width as usize * bpp);
        let dst = self.buffer_mut();
        let from = src.buffer();
        for row in 0..c.height {
            let d = (c.dst_y + row) * dst_stride + c.dst_x * bpp;
            let s = (c.src_y + row) * src_stride + c.src_x * bpp;
            dst[d..d + c.width * bpp].copy_from_slice(&from[s..s + c.width * bpp]);
        }
        Ok(())
    }

    fn check_placement(&self, src: &Frame, x: i32) -> Result<()> {
        if self.format != src.format {
            return Err(FrameError::Argument(format!(
                "format mismatch {} vs {}",
                self.format, src.format
            )));
        }
        if self.format == SubpixelOrder::Yuyv && x % 2 != 0 {
            return Err(FrameError::Argument(format!(
                "{} frames can only be placed at even columns",
                self.format
            )));
        }
        Ok(())
    }

    /// Blends `other` into this frame; `transparency` 0 keeps this frame,
    /// 100 replaces it with `other`.
    #[instrument(level = "trace", skip_all)]
    pub fn blend(&mut self, other: &Frame, transparency: u8) -> Result<()> {
        let weight = check_transparency(transparency)?;
        self.check_compatible(other)?;
        let kernel = registry().blend(self.format)?;
        kernel(self.buffer_mut(), other.buffer(), weight);
        Ok(())
    }

    /// Blends `src` into this frame at `x`, `y`, clipped to this frame.
    pub fn blend_at(&mut self, src: &Frame, x: i32, y: i32, transparency: u8) -> Result<()> {
        let weight = check_transparency(transparency)?;
        self.check_placement(src, x)?;
        let kernel = registry().blend(self.format)?;
        let Some(c) = clip((self.width, self.height), (src.width, src.height), x, y) else {
            return Ok(());
        };
        let bpp = self.colours();
        let (dst_stride, src_stride) = (self.width as usize * bpp, src.width as usize * bpp);
        let dst = self.buffer_mut();
        let from = src.buffer();
        for row in 0..c.height {
            let d = (c.dst_y + row) * dst_stride + c.dst_x * bpp;
            let s = (c.src_y + row) * src_stride + c.src_x * bpp;
            kernel(
                &mut dst[d..d + c.width * bpp],
                &from[s..s + c.width * bpp],
                weight,
            );
        }
        Ok(())
    }

    /// Writes the single channel difference between this frame and `other`
    /// into `target`, which is reshaped to match.
    #[instrument(level = "trace", skip_all)]
    pub fn delta(&self, other: &Frame, target: &mut Frame) -> Result<()> {
        self.check_compatible(other)?;
        self.check_not_empty("delta")?;
        let kernel = registry().delta(self.format)?;
        let out = target.write_buffer(self.width, self.height, SubpixelOrder::Gray8)?;
        kernel(self.buffer(), other.buffer(), out);
        Ok(())
    }

    /// Recodes the frame into `format`.
    #[instrument(level = "trace", skip_all)]
    pub fn convert_to(&mut self, format: SubpixelOrder) -> Result<()> {
        if format == self.format {
            return Ok(());
        }
        self.check_not_empty("conversion")?;
        let size = frame_size(self.width, self.height, format)?;
        let kernel = registry().convert(self.format, format)?;

        if self.held {
            let src = self.buffer().to_vec();
            self.reserve(size)?;
            self.set_shape(self.width, self.height, format, size);
            kernel(&src, self.buffer_mut());
        } else {
            let mut target = RawBuffer::allocate(size);
            kernel(self.buffer(), &mut target.as_slice_mut()[..size]);
            self.buffer = Some(target);
            self.set_shape(self.width, self.height, format, size);
        }
        Ok(())
    }

    /// Converts to a colour `format`.
    pub fn colourise(&mut self, format: SubpixelOrder) -> Result<()> {
        if !format.has_colour() {
            return Err(FrameError::Argument(format!(
                "{} is not a colour format",
                format
            )));
        }
        self.convert_to(format)
    }

    /// Converts to [`SubpixelOrder::Gray8`].
    pub fn decolourise(&mut self) -> Result<()> {
        self.convert_to(SubpixelOrder::Gray8)
    }

    /// Repairs combing on the odd lines where `next`, the following frame,
    /// shows motion of at least `threshold`.
    #[instrument(level = "trace", skip_all)]
    pub fn deinterlace_4field(&mut self, next: &Frame, threshold: u32) -> Result<()> {
        self.check_compatible(next)?;
        let kernel = registry().deinterlace(self.format)?;
        let (width, height) = (self.width as usize, self.height as usize);
        kernel(self.buffer_mut(), next.buffer(), threshold, width, height);
        Ok(())
    }

    /// Replaces each odd line with the line above it.
    pub fn deinterlace_discard(&mut self) -> Result<()> {
        let stride = self.width as usize * self.colours();
        let height = self.height as usize;
        let buf = self.buffer_mut();
        for y in (1..height).step_by(2) {
            buf.copy_within((y - 1) * stride..y * stride, y * stride);
        }
        Ok(())
    }

    /// Replaces each odd line with the mean of the lines above and below.
    pub fn deinterlace_linear(&mut self) -> Result<()> {
        let kernel = registry().blend(self.format)?;
        let stride = self.width as usize * self.colours();
        let height = self.height as usize;
        let half = blend_weight(50);
        let buf = self.buffer_mut();
        for y in (1..height).step_by(2) {
            buf.copy_within((y - 1) * stride..y * stride, y * stride);
            if y + 1 < height {
                let (head, tail) = buf.split_at_mut((y + 1) * stride);
                kernel(&mut head[y * stride..], &tail[..stride], half);
            }
        }
        Ok(())
    }

    /// Blends every line equally with the line below it.
    pub fn deinterlace_blend(&mut self) -> Result<()> {
        self.deinterlace_blend_ratio(50)
    }

    /// Blends every line with the line below it, taking `transparency`
    /// percent of the lower line.
    pub fn deinterlace_blend_ratio(&mut self, transparency: u8) -> Result<()> {
        let weight = check_transparency(transparency)?;
        let kernel = registry().blend(self.format)?;
        let stride = self.width as usize * self.colours();
        let height = self.height as usize;
        let buf = self.buffer_mut();
        for y in 0..height.saturating_sub(1) {
            let (head, tail) = buf.split_at_mut((y + 1) * stride);
            kernel(&mut head[y * stride..], &tail[..stride], weight);
        }
        Ok(())
    }

    /// Per-channel mean of `frames`, truncated.
    #[instrument(level = "trace", skip_all)]
    pub fn merge(frames: &[&Frame]) -> Result<Frame> {
        let first = check_reduction(frames)?;
        let channels = frames
            .iter()
            .map(|f| channel_bytes(f))
            .collect::<Result<Vec<_>>>()?;

        let n = frames.len() as u32;
        let mut totals = vec![0u32; channels[0].len()];
        for ch in &channels {
            for (t, &v) in totals.iter_mut().zip(ch.iter()) {
                *t += v as u32;
            }
        }
        let mean: Vec<u8> = totals.into_iter().map(|t| (t / n) as u8).collect();
        frame_from_channels(first, &mean)
    }

    /// Weighted mean of `frames` where frame `j` counts `weight (1 - weight)^j`,
    /// so the first frame dominates as `weight` approaches 1.
    pub fn merge_weighted(frames: &[&Frame], weight: f64) -> Result<Frame> {
        let first = check_reduction(frames)?;
        if !(weight > 0.0 && weight <= 1.0) {
            return Err(FrameError::Argument(format!(
                "merge weight {} is outside (0, 1]",
                weight
            )));
        }
        let channels = frames
            .iter()
            .map(|f| channel_bytes(f))
            .collect::<Result<Vec<_>>>()?;

        let mut totals = vec![0f64; channels[0].len()];
        let mut factor = weight;
        let mut weight_sum = 0.0;
        for ch in &channels {
            for (t, &v) in totals.iter_mut().zip(ch.iter()) {
                *t += v as f64 * factor;
            }
            weight_sum += factor;
            factor *= 1.0 - weight;
        }
        let mean: Vec<u8> = totals
            .into_iter()
            .map(|t| (t / weight_sum).round().clamp(0.0, 255.0) as u8)
            .collect();
        frame_from_channels(first, &mean)
    }

    /// A copy of the first frame with `marker` painted wherever any frame
    /// differs from `reference` by more than `threshold` in some channel.
    pub fn highlight(
        frames: &[&Frame],
        threshold: Rgb,
        reference: Rgb,
        marker: Rgb,
    ) -> Result<Frame> {
        let first = check_reduction(frames)?;
        let mut result = first.clone();
        let buffers: Vec<&[u8]> = frames.iter().map(|f| f.buffer()).collect();
        let pixels = first.pixels();
        let out = result.buffer_mut();
        with_layout!(first.format, L => {
            highlight_pixels::<L>(&buffers, pixels, out, threshold, reference, marker)
        });
        Ok(result)
    }
}

fn check_transparency(transparency: u8) -> Result<u16> {
    if transparency > 100 {
        return Err(FrameError::Argument(format!(
            "transparency {} is outside 0..=100",
            transparency
        )));
    }
    Ok(blend_weight(transparency))
}

fn check_reduction<'a>(frames: &[&'a Frame]) -> Result<&'a Frame> {
    let Some(&first) = frames.first() else {
        return Err(FrameError::Argument("no frames to reduce".to_string()));
    };
    first.check_not_empty("reduction")?;
    for frame in &frames[1..] {
        first.check_compatible(frame)?;
    }
    Ok(first)
}

/// Frame contents as per-channel bytes: the buffer itself for byte-linear
/// formats, RGBA otherwise.
fn channel_bytes(frame: &Frame) -> Result<std::borrow::Cow<'_, [u8]>> {
    if frame.format.is_byte_linear() {
        return Ok(std::borrow::Cow::Borrowed(frame.buffer()));
    }
    let convert = registry().convert(frame.format, SubpixelOrder::Rgba)?;
    let mut rgba = vec![0u8; frame.pixels() * 4];
    convert(frame.buffer(), &mut rgba);
    Ok(std::borrow::Cow::Owned(rgba))
}

fn frame_from_channels(like: &Frame, channels: &[u8]) -> Result<Frame> {
    let mut frame = Frame::with_format(like.width, like.height, like.format)?;
    if like.format.is_byte_linear() {
        frame.copy_from(channels)?;
    } else {
        let convert = registry().convert(SubpixelOrder::Rgba, like.format)?;
        convert(channels, frame.buffer_mut());
    }
    Ok(frame)
}

fn highlight_pixels<L: Layout>(
    frames: &[&[u8]],
    pixels: usize,
    out: &mut [u8],
    threshold: Rgb,
    reference: Rgb,
    marker: Rgb,
) {
    let limit = [threshold.r, threshold.g, threshold.b];
    let target = [reference.r, reference.g, reference.b];
    for i in 0..pixels {
        let changed = frames.iter().any(|buf| {
            let px = L::read(buf, i);
            (0..3).any(|c| px[c].abs_diff(target[c]) > limit[c])
        });
        if changed {
            L::write(out, i, marker.rgba());
        }
    }
}

impl Clone for Frame {
    /// Deep copy into an engine-owned buffer; the held flag is not copied.
    fn clone(&self) -> Self {
        let mut frame = Frame::new();
        if !self.is_empty() {
            let mut buffer = RawBuffer::allocate(self.size);
            buffer.as_slice_mut().copy_from_slice(self.buffer());
            frame.buffer = Some(buffer);
            frame.set_shape(self.width, self.height, self.format, self.size);
        }
        frame
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("size", &self.size)
            .field("buffer", &self.buffer)
            .field("held", &self.held)
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}x{} {} buffer:{:?}",
            self.width,
            self.height,
            self.format,
            self.ownership()
        )
    }
}
