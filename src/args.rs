// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::{Parser, Subcommand};
use edgefirst_motion::{codec::DEFAULT_QUALITY, pixel::SubpixelOrder, registry::CpuLevel};
use std::path::PathBuf;

/// Single-frame deinterlacing methods.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum DeinterlaceMode {
    /// Replace odd lines with the line above
    Discard,
    /// Replace odd lines with the mean of their neighbours
    Linear,
    /// Blend every line with the line below
    Blend,
    /// Repair moving pixels using the following frame (requires --next)
    FourField,
}

/// Command-line arguments for the EdgeFirst Motion tool.
///
/// Runs motion frame engine operations on JPEG files and prints the result
/// as JSON. Global options can also be set through environment variables.
///
/// # Example
///
/// ```bash
/// edgefirst-motion delta reference.jpg current.jpg --threshold 25
///
/// export CPU_LEVEL=sse2
/// edgefirst-motion registry
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Highest instruction set the kernel registry may select (baseline, sse2, avx2)
    #[arg(long, env = "CPU_LEVEL", default_value = "avx2")]
    pub cpu_level: CpuLevel,

    /// JPEG quality for written frames
    #[arg(
        long,
        env = "JPEG_QUALITY",
        default_value_t = DEFAULT_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub jpeg_quality: u8,

    /// Enable verbose debug logging
    #[arg(short, long, env = "VERBOSE")]
    pub verbose: bool,

    /// Also send logs to the systemd journal
    #[arg(long, env = "JOURNALD")]
    pub journald: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Measure motion between a reference frame and a current frame
    Delta {
        reference: PathBuf,
        current: PathBuf,

        /// Per-pixel difference counted as motion
        #[arg(long, default_value = "20")]
        threshold: u8,

        /// Pixel format the frames are compared in
        #[arg(long, default_value = "RGBA")]
        format: SubpixelOrder,

        /// Write the difference image as a greyscale JPEG
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Blend an overlay frame into a base frame
    Blend {
        base: PathBuf,
        overlay: PathBuf,

        /// Percentage of the overlay in the result (0-100)
        #[arg(long, default_value = "12", value_parser = clap::value_parser!(u8).range(0..=100))]
        transparency: u8,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Average several frames of the same size
    Merge {
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Weight of the first frame in (0, 1]; plain mean when omitted
        #[arg(long)]
        weight: Option<f64>,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Remove interlacing artifacts
    Deinterlace {
        input: PathBuf,

        #[arg(long, default_value = "blend", value_enum)]
        mode: DeinterlaceMode,

        /// Following frame for four-field deinterlacing
        #[arg(long)]
        next: Option<PathBuf>,

        /// Motion threshold for four-field deinterlacing
        #[arg(long, default_value = "50")]
        threshold: u32,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert a frame and write it as a raw dump
    Convert {
        input: PathBuf,

        /// Target pixel format (GREY, RGB3, BGR3, RGBA, BGRA, ARGB, ABGR, YUYV, RGBO, RGBP)
        #[arg(long)]
        format: SubpixelOrder,

        /// Zlib level for a compressed dump, raw bytes when omitted
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=9))]
        zip: Option<u32>,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show the selected kernel level per operation and format
    Registry,
}
