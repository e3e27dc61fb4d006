// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Drawing onto a [`Frame`]: solid and sparse fills, polygon zones, text
//! labels and motion edge outlines. Everything drawn is clipped to the
//! frame.

use crate::{
    error::{FrameError, Result},
    frame::{Frame, Rect},
    pixel::{write_pixel, Rgb, SubpixelOrder},
    poly::{Coord, Polygon},
};
use tracing::instrument;

/// Fixed-size bitmap font used by [`Frame::annotate`].
pub trait Font {
    /// Glyph cell width and height in pixels. Widths above 16 are rejected.
    fn char_size(&self) -> (u32, u32);

    /// One bitmask per glyph row, leftmost pixel in bit `width - 1`.
    /// Characters without a glyph draw as blank cells.
    fn glyph(&self, ch: char) -> Option<&[u16]>;
}

/// Colour encoded once for a format, ready to copy into pixels.
///
/// YUYV pixels alternate between the two halves of an encoded pair.
struct Paint {
    bytes: [u8; 4],
    bpp: usize,
    period: usize,
}

impl Paint {
    fn new(format: SubpixelOrder, colour: Rgb) -> Self {
        let mut bytes = [0u8; 4];
        write_pixel(format, &mut bytes, 0, colour.rgba());
        if format == SubpixelOrder::Yuyv {
            write_pixel(format, &mut bytes, 1, colour.rgba());
        }
        let bpp = format.bytes_per_pixel();
        Paint {
            bytes,
            bpp,
            period: if format == SubpixelOrder::Yuyv { 4 } else { bpp },
        }
    }

    #[inline]
    fn put(&self, buf: &mut [u8], index: usize) {
        let offset = (index * self.bpp) % self.period;
        buf[index * self.bpp..(index + 1) * self.bpp]
            .copy_from_slice(&self.bytes[offset..offset + self.bpp]);
    }
}

impl Frame {
    fn clip_rect(&self, limits: Option<&Rect>) -> Option<(usize, usize, usize, usize)> {
        let (w, h) = (self.width() as i64, self.height() as i64);
        let (x0, y0, x1, y1) = match limits {
            Some(r) => (
                (r.x as i64).max(0),
                (r.y as i64).max(0),
                (r.x as i64 + r.width as i64).min(w),
                (r.y as i64 + r.height as i64).min(h),
            ),
            None => (0, 0, w, h),
        };
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }

    /// Paints `colour` over `limits`, or the whole frame.
    pub fn fill(&mut self, colour: Rgb, limits: Option<&Rect>) -> Result<()> {
        self.fill_density(colour, 1, limits)
    }

    /// Paints `colour` on every pixel whose coordinates are both multiples of
    /// `density`; a density of 1 fills solidly.
    pub fn fill_density(&mut self, colour: Rgb, density: u32, limits: Option<&Rect>) -> Result<()> {
        if density == 0 {
            return Err(FrameError::Argument("fill density of 0".to_string()));
        }
        let Some((x0, y0, x1, y1)) = self.clip_rect(limits) else {
            return Ok(());
        };
        let paint = Paint::new(self.format(), colour);
        let width = self.width() as usize;
        let d = density as usize;
        let buf = self.buffer_mut();
        for y in (y0..y1).filter(|y| y % d == 0) {
            for x in (x0..x1).filter(|x| x % d == 0) {
                paint.put(buf, y * width + x);
            }
        }
        Ok(())
    }

    /// Paints the interior of `polygon`.
    #[instrument(level = "trace", skip_all)]
    pub fn fill_polygon(&mut self, colour: Rgb, polygon: &Polygon) -> Result<()> {
        self.fill_polygon_density(colour, 1, polygon)
    }

    pub fn fill_polygon_density(&mut self, colour: Rgb, density: u32, polygon: &Polygon) -> Result<()> {
        if density == 0 {
            return Err(FrameError::Argument("fill density of 0".to_string()));
        }
        let paint = Paint::new(self.format(), colour);
        let (w, h) = (self.width() as i32, self.height() as i32);
        let d = density as i32;
        let buf = self.buffer_mut();
        for span in polygon.spans_within(0..h) {
            if span.y < 0 || span.y >= h || span.y % d != 0 {
                continue;
            }
            for x in span.x0.max(0)..span.x1.min(w) {
                if x % d == 0 {
                    paint.put(buf, (span.y * w + x) as usize);
                }
            }
        }
        Ok(())
    }

    /// Draws the sides of `polygon`.
    pub fn outline(&mut self, colour: Rgb, polygon: &Polygon) -> Result<()> {
        let paint = Paint::new(self.format(), colour);
        let (w, h) = (self.width() as i32, self.height() as i32);
        let buf = self.buffer_mut();
        for p in polygon.outline_within(&Rect::new(0, 0, w, h)) {
            paint.put(buf, (p.y * w + p.x) as usize);
        }
        Ok(())
    }

    /// Renders `text` with its top-left corner at `coord`.
    ///
    /// Each `\n` starts a new line one glyph height lower. Unset glyph bits
    /// are painted with `background` when given and left alone otherwise.
    pub fn annotate(
        &mut self,
        text: &str,
        coord: Coord,
        font: &dyn Font,
        foreground: Rgb,
        background: Option<Rgb>,
    ) -> Result<()> {
        let (cw, ch) = font.char_size();
        if cw == 0 || ch == 0 || cw > 16 {
            return Err(FrameError::Argument(format!(
                "unusable glyph size {}x{}",
                cw, ch
            )));
        }
        let fg = Paint::new(self.format(), foreground);
        let bg = background.map(|c| Paint::new(self.format(), c));
        let (w, h) = (self.width() as i64, self.height() as i64);
        let buf = self.buffer_mut();

        for (line_no, line) in text.split('\n').enumerate() {
            let top = coord.y as i64 + line_no as i64 * ch as i64;
            for (col, c) in line.chars().enumerate() {
                let left = coord.x as i64 + col as i64 * cw as i64;
                let rows = font.glyph(c);
                for ry in 0..ch {
                    let y = top + ry as i64;
                    if y < 0 || y >= h {
                        continue;
                    }
                    let bits = rows.and_then(|r| r.get(ry as usize)).copied().unwrap_or(0);
                    for rx in 0..cw {
                        let x = left + rx as i64;
                        if x < 0 || x >= w {
                            continue;
                        }
                        let index = (y * w + x) as usize;
                        if (bits >> (cw - 1 - rx)) & 1 == 1 {
                            fg.put(buf, index);
                        } else if let Some(bg) = &bg {
                            bg.put(buf, index);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Top-left position that centres `text` in the frame.
    pub fn centre_coord(&self, text: &str, font: &dyn Font) -> Coord {
        let (cw, ch) = font.char_size();
        let lines = text.split('\n');
        let columns = lines.clone().map(|l| l.chars().count()).max().unwrap_or(0);
        let rows = lines.count();
        let text_w = (columns as i64 * cw as i64).min(self.width() as i64);
        let text_h = (rows as i64 * ch as i64).min(self.height() as i64);
        Coord {
            x: ((self.width() as i64 - text_w) / 2) as i32,
            y: ((self.height() as i64 - text_h) / 2) as i32,
        }
    }

    /// Outlines the set regions of a single channel mask.
    ///
    /// Returns a frame in `format`, black except for `colour` on every set
    /// mask pixel within `limits` that touches the frame border or an unset
    /// 4-neighbour.
    #[instrument(level = "trace", skip_all)]
    pub fn highlight_edges(
        &self,
        colour: Rgb,
        format: SubpixelOrder,
        limits: Option<&Rect>,
    ) -> Result<Frame> {
        if self.format() != SubpixelOrder::Gray8 {
            return Err(FrameError::unsupported("edge highlight", self.format()));
        }
        let mut result = Frame::with_format(self.width(), self.height(), format)?;
        result.fill(Rgb::BLACK, None)?;
        let Some((x0, y0, x1, y1)) = self.clip_rect(limits) else {
            return Ok(result);
        };

        let paint = Paint::new(format, colour);
        let (w, h) = (self.width() as usize, self.height() as usize);
        let mask = self.buffer();
        let out = result.buffer_mut();
        for y in y0..y1 {
            for x in x0..x1 {
                let i = y * w + x;
                if mask[i] == 0 {
                    continue;
                }
                let edge = x == 0
                    || y == 0
                    || x == w - 1
                    || y == h - 1
                    || mask[i - 1] == 0
                    || mask[i + 1] == 0
                    || mask[i - w] == 0
                    || mask[i + w] == 0;
                if edge {
                    paint.put(out, i);
                }
            }
        }
        Ok(result)
    }
}
