// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod args;

use args::{Args, Command, DeinterlaceMode};
use clap::Parser;
use edgefirst_motion::{
    codec::Zlib,
    frame::Frame,
    pixel::SubpixelOrder,
    registry::{self, Registry},
};
use serde_json::{json, Value};
use std::{error::Error, path::Path, time::Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, Layer};

fn init_tracing(args: &Args) -> Result<(), Box<dyn Error>> {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(level);

    let journald = if args.journald {
        match tracing_journald::layer() {
            Ok(layer) => Some(layer.with_filter(level)),
            Err(e) => {
                eprintln!("journald unavailable: {e}");
                None
            }
        }
    } else {
        None
    };

    tracy_client::Client::start();
    let tracy = tracing_tracy::TracyLayer::default();

    let subscriber = tracing_subscriber::registry()
        .with(console)
        .with(journald)
        .with(tracy);
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

fn load(path: &Path, format: SubpixelOrder) -> Result<Frame, Box<dyn Error>> {
    let mut frame = Frame::new();
    frame.read_jpeg(path, format)?;
    debug!("loaded {} as {}", path.display(), frame);
    Ok(frame)
}

fn delta(
    reference: &Path,
    current: &Path,
    threshold: u8,
    format: SubpixelOrder,
    output: Option<&Path>,
    quality: u8,
) -> Result<Value, Box<dyn Error>> {
    let reference = load(reference, format)?;
    let current = load(current, format)?;

    let start = Instant::now();
    let mut motion = Frame::new();
    reference.delta(&current, &mut motion)?;
    let elapsed = start.elapsed();

    let pixels = motion.pixels().max(1);
    let total: u64 = motion.buffer().iter().map(|&v| v as u64).sum();
    let changed = motion.buffer().iter().filter(|&&v| v > threshold).count();

    if let Some(output) = output {
        motion.write_jpeg(output, quality)?;
    }

    Ok(json!({
        "width": motion.width(),
        "height": motion.height(),
        "format": format.to_string(),
        "score": total as f64 / pixels as f64,
        "changed_pixels": changed,
        "changed_ratio": changed as f64 / pixels as f64,
        "delta_us": elapsed.as_micros() as u64,
    }))
}

fn blend(
    base: &Path,
    overlay: &Path,
    transparency: u8,
    output: &Path,
    quality: u8,
) -> Result<Value, Box<dyn Error>> {
    let mut frame = load(base, SubpixelOrder::Rgb)?;
    let overlay = load(overlay, SubpixelOrder::Rgb)?;
    frame.blend(&overlay, transparency)?;
    frame.write_jpeg(output, quality)?;
    Ok(json!({
        "output": output.display().to_string(),
        "transparency": transparency,
    }))
}

fn merge(
    inputs: &[std::path::PathBuf],
    weight: Option<f64>,
    output: &Path,
    quality: u8,
) -> Result<Value, Box<dyn Error>> {
    let frames = inputs
        .iter()
        .map(|path| load(path, SubpixelOrder::Rgb))
        .collect::<Result<Vec<_>, _>>()?;
    let refs: Vec<&Frame> = frames.iter().collect();
    let merged = match weight {
        Some(weight) => Frame::merge_weighted(&refs, weight)?,
        None => Frame::merge(&refs)?,
    };
    merged.write_jpeg(output, quality)?;
    Ok(json!({
        "output": output.display().to_string(),
        "frames": frames.len(),
        "weight": weight,
    }))
}

fn deinterlace(
    input: &Path,
    mode: DeinterlaceMode,
    next: Option<&Path>,
    threshold: u32,
    output: &Path,
    quality: u8,
) -> Result<Value, Box<dyn Error>> {
    let mut frame = load(input, SubpixelOrder::Rgb)?;
    match mode {
        DeinterlaceMode::Discard => frame.deinterlace_discard()?,
        DeinterlaceMode::Linear => frame.deinterlace_linear()?,
        DeinterlaceMode::Blend => frame.deinterlace_blend()?,
        DeinterlaceMode::FourField => {
            let Some(next) = next else {
                return Err("four-field deinterlacing needs --next".into());
            };
            let next = load(next, SubpixelOrder::Rgb)?;
            frame.deinterlace_4field(&next, threshold)?;
        }
    }
    frame.write_jpeg(output, quality)?;
    Ok(json!({
        "output": output.display().to_string(),
        "mode": format!("{:?}", mode),
    }))
}

fn convert(
    input: &Path,
    format: SubpixelOrder,
    zip: Option<u32>,
    output: &Path,
) -> Result<Value, Box<dyn Error>> {
    let mut frame = load(input, SubpixelOrder::Rgb)?;
    frame.convert_to(format)?;
    let written = match zip {
        Some(level) => {
            let data = frame.zip(&Zlib, level)?;
            std::fs::write(output, &data)?;
            data.len()
        }
        None => {
            frame.write_raw(output)?;
            frame.size()
        }
    };
    Ok(json!({
        "output": output.display().to_string(),
        "width": frame.width(),
        "height": frame.height(),
        "format": format.to_string(),
        "size": frame.size(),
        "written": written,
    }))
}

fn selections(registry: &Registry) -> Value {
    let kernels: Vec<Value> = registry
        .selections()
        .into_iter()
        .map(|(op, format, level)| {
            json!({
                "operation": op.to_string(),
                "format": format.to_string(),
                "level": level.to_string(),
            })
        })
        .collect();
    json!({
        "detected": registry::CpuLevel::detect().to_string(),
        "level": registry.cpu_level().to_string(),
        "kernels": kernels,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(&args)?;

    let registry = registry::initialize_with(args.cpu_level);
    if registry.cpu_level() < args.cpu_level {
        warn!(
            "requested cpu level {} but the processor supports {}",
            args.cpu_level,
            registry.cpu_level()
        );
    }

    let quality = args.jpeg_quality;

    let report = match &args.command {
        Command::Delta {
            reference,
            current,
            threshold,
            format,
            output,
        } => delta(
            reference,
            current,
            *threshold,
            *format,
            output.as_deref(),
            quality,
        )?,
        Command::Blend {
            base,
            overlay,
            transparency,
            output,
        } => blend(base, overlay, *transparency, output, quality)?,
        Command::Merge {
            inputs,
            weight,
            output,
        } => merge(inputs, *weight, output, quality)?,
        Command::Deinterlace {
            input,
            mode,
            next,
            threshold,
            output,
        } => deinterlace(input, *mode, next.as_deref(), *threshold, output, quality)?,
        Command::Convert {
            input,
            format,
            zip,
            output,
        } => convert(input, *format, *zip, output)?,
        Command::Registry => selections(registry),
    };

    info!("{:?} complete", args.command);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
