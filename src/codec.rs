// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Frame serialization: JPEG through turbojpeg, zlib compression of raw
//! frame bytes, and raw file dumps.
//!
//! The codecs sit behind the [`ImageCodec`] and [`Compressor`] traits so the
//! frame operations do not depend on a particular library.

use crate::{
    error::{FrameError, Result},
    frame::{frame_size, Frame},
    pixel::SubpixelOrder,
};
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use std::{
    fs,
    io::{Read, Write},
    path::Path,
};
use tracing::{debug, instrument};

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 90;

/// Pixels decoded from an image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub width: u32,
    pub height: u32,
    pub format: SubpixelOrder,
    pub pixels: Vec<u8>,
}

pub trait ImageCodec {
    /// Encodes tightly packed `pixels` of the given shape.
    fn encode(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: SubpixelOrder,
        quality: u8,
    ) -> Result<Vec<u8>>;

    /// Decodes `data` into tightly packed pixels of `format`.
    fn decode(&self, data: &[u8], format: SubpixelOrder) -> Result<Decoded>;
}

pub trait Compressor {
    fn compress(&self, data: &[u8], level: u32) -> Result<Vec<u8>>;

    /// Inflates `data`, which must expand to exactly `expected` bytes.
    fn decompress(&self, data: &[u8], expected: usize) -> Result<Vec<u8>>;
}

/// JPEG codec backed by libjpeg-turbo.
#[derive(Debug, Default, Clone, Copy)]
pub struct TurboJpeg;

fn pixel_format(format: SubpixelOrder) -> Option<turbojpeg::PixelFormat> {
    use turbojpeg::PixelFormat;
    match format {
        SubpixelOrder::Gray8 => Some(PixelFormat::GRAY),
        SubpixelOrder::Rgb => Some(PixelFormat::RGB),
        SubpixelOrder::Bgr => Some(PixelFormat::BGR),
        SubpixelOrder::Rgba => Some(PixelFormat::RGBA),
        SubpixelOrder::Bgra => Some(PixelFormat::BGRA),
        SubpixelOrder::Argb => Some(PixelFormat::ARGB),
        SubpixelOrder::Abgr => Some(PixelFormat::ABGR),
        SubpixelOrder::Yuyv | SubpixelOrder::Rgb555 | SubpixelOrder::Rgb565 => None,
    }
}

impl ImageCodec for TurboJpeg {
    fn encode(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: SubpixelOrder,
        quality: u8,
    ) -> Result<Vec<u8>> {
        if !(1..=100).contains(&quality) {
            return Err(FrameError::Codec(format!(
                "jpeg quality {} is outside 1..=100",
                quality
            )));
        }
        let pf = pixel_format(format).ok_or_else(|| FrameError::unsupported("jpeg", format))?;
        let subsamp = if format == SubpixelOrder::Gray8 {
            turbojpeg::Subsamp::Gray
        } else {
            turbojpeg::Subsamp::Sub2x2
        };
        let image = turbojpeg::Image {
            width: width as usize,
            height: height as usize,
            format: pf,
            pixels,
            pitch: width as usize * format.bytes_per_pixel(),
        };
        let jpeg = turbojpeg::compress(image, quality as i32, subsamp)
            .map_err(|e| FrameError::Codec(e.to_string()))?;
        debug!("encoded {}x{} {} to {} bytes", width, height, format, jpeg.len());
        Ok(jpeg.to_vec())
    }

    fn decode(&self, data: &[u8], format: SubpixelOrder) -> Result<Decoded> {
        let pf = pixel_format(format).ok_or_else(|| FrameError::unsupported("jpeg", format))?;
        let image =
            turbojpeg::decompress(data, pf).map_err(|e| FrameError::Codec(e.to_string()))?;
        let row = image.width * format.bytes_per_pixel();
        let pixels = if image.pitch == row {
            image.pixels
        } else {
            image
                .pixels
                .chunks(image.pitch)
                .take(image.height)
                .flat_map(|line| &line[..row])
                .copied()
                .collect()
        };
        Ok(Decoded {
            width: image.width as u32,
            height: image.height as u32,
            format,
            pixels,
        })
    }
}

/// zlib stream compression.
#[derive(Debug, Default, Clone, Copy)]
pub struct Zlib;

impl Compressor for Zlib {
    fn compress(&self, data: &[u8], level: u32) -> Result<Vec<u8>> {
        if level > 9 {
            return Err(FrameError::Compression(format!(
                "compression level {} is outside 0..=9",
                level
            )));
        }
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(level));
        encoder
            .write_all(data)
            .map_err(|e| FrameError::Compression(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| FrameError::Compression(e.to_string()))
    }

    fn decompress(&self, data: &[u8], expected: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(expected);
        ZlibDecoder::new(data)
            .take(expected as u64 + 1)
            .read_to_end(&mut out)
            .map_err(|e| FrameError::Compression(e.to_string()))?;
        if out.len() != expected {
            return Err(FrameError::Compression(format!(
                "stream inflated to {} bytes, expected {}",
                out.len(),
                expected
            )));
        }
        Ok(out)
    }
}

/// Reads a raw dump that must be exactly `size` bytes.
pub fn read_raw(path: &Path, size: usize) -> Result<Vec<u8>> {
    let data = fs::read(path).map_err(|source| FrameError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if data.len() != size {
        return Err(FrameError::SizeMismatch {
            expected: size,
            actual: data.len(),
        });
    }
    Ok(data)
}

pub fn write_raw(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data).map_err(|source| FrameError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Frame {
    /// Encodes the frame with `codec`.
    pub fn encode(&self, codec: &dyn ImageCodec, quality: u8) -> Result<Vec<u8>> {
        if self.is_empty() {
            return Err(FrameError::Argument("encode of an empty frame".to_string()));
        }
        codec.encode(self.buffer(), self.width(), self.height(), self.format(), quality)
    }

    /// Replaces the contents with `data` decoded into `format`.
    ///
    /// The decoded pixels are adopted without copying unless the frame is
    /// held.
    pub fn decode(&mut self, codec: &dyn ImageCodec, data: &[u8], format: SubpixelOrder) -> Result<()> {
        let decoded = codec.decode(data, format)?;
        self.assign_vec(decoded.width, decoded.height, decoded.format, decoded.pixels)
    }

    #[instrument(level = "trace", skip_all)]
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        self.encode(&TurboJpeg, quality)
    }

    pub fn decode_jpeg(&mut self, data: &[u8], format: SubpixelOrder) -> Result<()> {
        self.decode(&TurboJpeg, data, format)
    }

    pub fn write_jpeg(&self, path: &Path, quality: u8) -> Result<()> {
        write_raw(path, &self.encode_jpeg(quality)?)
    }

    pub fn read_jpeg(&mut self, path: &Path, format: SubpixelOrder) -> Result<()> {
        let data = fs::read(path).map_err(|source| FrameError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.decode_jpeg(&data, format)
    }

    /// Compresses the frame bytes.
    pub fn zip(&self, compressor: &dyn Compressor, level: u32) -> Result<Vec<u8>> {
        compressor.compress(self.buffer(), level)
    }

    /// Restores the frame bytes from [`Frame::zip`] output. The frame must
    /// already have the shape the data was compressed from.
    pub fn unzip(&mut self, compressor: &dyn Compressor, data: &[u8]) -> Result<()> {
        if self.is_empty() {
            return Err(FrameError::Argument("unzip into an empty frame".to_string()));
        }
        let bytes = compressor.decompress(data, self.size())?;
        self.copy_from(&bytes)
    }

    /// Loads a raw dump of the given shape.
    pub fn read_raw(
        &mut self,
        path: &Path,
        width: u32,
        height: u32,
        format: SubpixelOrder,
    ) -> Result<()> {
        let data = read_raw(path, frame_size(width, height, format)?)?;
        self.assign(width, height, format, &data)
    }

    pub fn write_raw(&self, path: &Path) -> Result<()> {
        write_raw(path, self.buffer())
    }
}
