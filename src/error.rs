// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::pixel::SubpixelOrder;
use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors reported by frame operations and their collaborators.
///
/// Allocation failure is not represented here: running out of memory for a
/// frame buffer terminates the process (see [`crate::buffer::allocate`]).
#[derive(Debug, Error)]
pub enum FrameError {
    /// Two buffers that must be the same size are not.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The caller passed an argument outside the operation's contract.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// A region extends past the frame's dimensions.
    #[error("region {x},{y} {width}x{height} is outside the {frame_width}x{frame_height} frame")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        frame_width: u32,
        frame_height: u32,
    },

    /// No kernel or code path exists for this operation and pixel format.
    #[error("{operation} is not supported for {format} frames")]
    UnsupportedFormat {
        operation: String,
        format: SubpixelOrder,
    },

    /// The image codec rejected the input or the parameters.
    #[error("codec error: {0}")]
    Codec(String),

    /// Compression or decompression failed.
    #[error("compression error: {0}")]
    Compression(String),

    /// A raw file could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FrameError {
    pub(crate) fn unsupported(operation: impl ToString, format: SubpixelOrder) -> Self {
        FrameError::UnsupportedFormat {
            operation: operation.to_string(),
            format,
        }
    }
}

pub type Result<T, E = FrameError> = std::result::Result<T, E>;
