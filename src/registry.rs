// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Process-wide table of the fastest kernel per operation and pixel format.
//!
//! The table is built once, from feature detection on the running CPU, and is
//! read-only afterwards so any thread may look kernels up without locking.
//!
//! ```
//! use edgefirst_motion::{pixel::SubpixelOrder, registry};
//!
//! let delta = registry::registry().delta(SubpixelOrder::Gray8).unwrap();
//! let mut out = [0u8; 4];
//! delta(&[10, 20, 30, 40], &[40, 20, 10, 0], &mut out);
//! assert_eq!(out, [30, 0, 20, 40]);
//! ```

use crate::{
    error::{FrameError, Result},
    kernels::{scalar, BlendFn, ConvertFn, DeinterlaceFn, DeltaFn},
    pixel::{with_layout, Layout, SubpixelOrder},
};
use core::fmt;
use once_cell::sync::OnceCell;
use std::{collections::HashMap, str::FromStr};
use tracing::{debug, info};

/// Instruction set levels, ordered from least to most capable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CpuLevel {
    /// Portable scalar code
    Baseline,
    /// x86-64 SSE2, 128-bit vectors
    Sse2,
    /// x86-64 AVX2, 256-bit vectors
    Avx2,
}

impl CpuLevel {
    /// Probes the executing CPU for the widest supported level.
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx2") {
                return CpuLevel::Avx2;
            }
            if is_x86_feature_detected!("sse2") {
                return CpuLevel::Sse2;
            }
        }
        CpuLevel::Baseline
    }
}

impl fmt::Display for CpuLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            CpuLevel::Baseline => "baseline",
            CpuLevel::Sse2 => "sse2",
            CpuLevel::Avx2 => "avx2",
        })
    }
}

impl FromStr for CpuLevel {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "baseline" | "scalar" => Ok(CpuLevel::Baseline),
            "sse2" => Ok(CpuLevel::Sse2),
            "avx2" => Ok(CpuLevel::Avx2),
            _ => Err(FrameError::Argument(format!("unknown cpu level {s}"))),
        }
    }
}

/// A pixel operation as keyed in the registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Blend,
    Delta,
    /// Conversion from the keyed format to this one.
    Convert(SubpixelOrder),
    Deinterlace4Field,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operation::Blend => f.write_str("blend"),
            Operation::Delta => f.write_str("delta"),
            Operation::Convert(to) => write!(f, "convert to {}", to),
            Operation::Deinterlace4Field => f.write_str("4-field deinterlace"),
        }
    }
}

#[derive(Copy, Clone)]
pub enum Kernel {
    Blend(BlendFn),
    Delta(DeltaFn),
    Convert(ConvertFn),
    Deinterlace(DeinterlaceFn),
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Kernel::Blend(_) => "Kernel::Blend",
            Kernel::Delta(_) => "Kernel::Delta",
            Kernel::Convert(_) => "Kernel::Convert",
            Kernel::Deinterlace(_) => "Kernel::Deinterlace",
        })
    }
}

#[derive(Copy, Clone, Debug)]
struct Entry {
    level: CpuLevel,
    kernel: Kernel,
}

type Key = (Operation, SubpixelOrder);

pub struct Registry {
    level: CpuLevel,
    selected: HashMap<Key, Entry>,
    variants: HashMap<Key, Vec<Entry>>,
}

static REGISTRY: OnceCell<Registry> = OnceCell::new();

/// Builds the process table from the detected CPU level.
///
/// Only the first call to `initialize` or [`initialize_with`] has an effect;
/// later calls return the existing table.
pub fn initialize() -> &'static Registry {
    initialize_with(CpuLevel::Avx2)
}

/// Builds the process table, never selecting kernels above `max_level`.
pub fn initialize_with(max_level: CpuLevel) -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let registry = Registry::build(max_level);
        info!(
            "kernel registry ready: cpu {} selected {} ({} kernels)",
            CpuLevel::detect(),
            registry.level,
            registry.selected.len()
        );
        registry
    })
}

/// The process table, initialized on first use.
pub fn registry() -> &'static Registry {
    initialize()
}

fn scalar_blend(format: SubpixelOrder) -> BlendFn {
    if format.is_byte_linear() {
        scalar::blend_bytes
    } else {
        with_layout!(format, L => scalar::blend_pixels::<L> as BlendFn)
    }
}

fn scalar_convert_from<S: Layout>(to: SubpixelOrder) -> ConvertFn {
    if to == S::FORMAT {
        return scalar::copy;
    }
    match to {
        SubpixelOrder::Gray8 => scalar::convert_gray::<S> as ConvertFn,
        _ => with_layout!(to, D => scalar::convert::<S, D> as ConvertFn),
    }
}

fn candidates() -> Vec<(Key, Entry)> {
    let mut out = Vec::new();
    let mut push = |op: Operation, format: SubpixelOrder, level: CpuLevel, kernel: Kernel| {
        out.push(((op, format), Entry { level, kernel }))
    };

    for format in SubpixelOrder::ALL {
        let base = CpuLevel::Baseline;
        push(Operation::Blend, format, base, Kernel::Blend(scalar_blend(format)));
        push(
            Operation::Delta,
            format,
            base,
            Kernel::Delta(with_layout!(format, L => scalar::delta::<L> as DeltaFn)),
        );
        push(
            Operation::Deinterlace4Field,
            format,
            base,
            Kernel::Deinterlace(
                with_layout!(format, L => scalar::deinterlace_4field::<L> as DeinterlaceFn),
            ),
        );
        for to in SubpixelOrder::ALL {
            let kernel = with_layout!(format, S => scalar_convert_from::<S>(to));
            push(Operation::Convert(to), format, base, Kernel::Convert(kernel));
        }
    }

    #[cfg(target_arch = "x86_64")]
    {
        use crate::kernels::x86;
        use CpuLevel::{Avx2, Sse2};
        use SubpixelOrder::*;

        for format in SubpixelOrder::ALL {
            if format.is_byte_linear() {
                push(Operation::Blend, format, Sse2, Kernel::Blend(x86::blend_sse2));
                push(Operation::Blend, format, Avx2, Kernel::Blend(x86::blend_avx2));
            }
        }

        push(Operation::Delta, Gray8, Sse2, Kernel::Delta(x86::delta_gray_sse2));
        push(Operation::Delta, Gray8, Avx2, Kernel::Delta(x86::delta_gray_avx2));
        push(Operation::Delta, Yuyv, Sse2, Kernel::Delta(x86::delta_yuyv_sse2));

        let rgb32: [(SubpixelOrder, DeltaFn, ConvertFn); 4] = [
            (
                Rgba,
                x86::delta_rgb32_sse2::<0, 1, 2>,
                x86::convert_rgb32_gray_sse2::<0, 1, 2>,
            ),
            (
                Bgra,
                x86::delta_rgb32_sse2::<2, 1, 0>,
                x86::convert_rgb32_gray_sse2::<2, 1, 0>,
            ),
            (
                Argb,
                x86::delta_rgb32_sse2::<1, 2, 3>,
                x86::convert_rgb32_gray_sse2::<1, 2, 3>,
            ),
            (
                Abgr,
                x86::delta_rgb32_sse2::<3, 2, 1>,
                x86::convert_rgb32_gray_sse2::<3, 2, 1>,
            ),
        ];
        for (format, delta, convert) in rgb32 {
            push(Operation::Delta, format, Sse2, Kernel::Delta(delta));
            push(
                Operation::Convert(Gray8),
                format,
                Sse2,
                Kernel::Convert(convert),
            );
        }
        push(
            Operation::Convert(Gray8),
            Yuyv,
            Sse2,
            Kernel::Convert(x86::convert_yuyv_gray_sse2),
        );
    }

    out
}

impl Registry {
    /// Builds a table that selects kernels up to the lower of `max_level`
    /// and the detected CPU level.
    ///
    /// Most callers want the shared table from [`registry`]; this is for
    /// verifying kernel variants against each other.
    pub fn build(max_level: CpuLevel) -> Self {
        let detected = CpuLevel::detect();
        let level = max_level.min(detected);

        let mut selected: HashMap<Key, Entry> = HashMap::new();
        let mut variants: HashMap<Key, Vec<Entry>> = HashMap::new();
        for (key, entry) in candidates() {
            if entry.level > detected {
                continue;
            }
            variants.entry(key).or_default().push(entry);
            if entry.level > level {
                continue;
            }
            match selected.get(&key) {
                Some(current) if current.level >= entry.level => {}
                _ => {
                    selected.insert(key, entry);
                }
            }
        }
        debug!("kernel registry built at level {}", level);

        Registry {
            level,
            selected,
            variants,
        }
    }

    /// The highest level this table may select.
    pub fn cpu_level(&self) -> CpuLevel {
        self.level
    }

    /// The selected kernel for an operation on a format.
    pub fn lookup(&self, op: Operation, format: SubpixelOrder) -> Result<Kernel> {
        self.selected
            .get(&(op, format))
            .map(|entry| entry.kernel)
            .ok_or_else(|| FrameError::unsupported(op, format))
    }

    /// The level of the selected kernel, if any.
    pub fn level(&self, op: Operation, format: SubpixelOrder) -> Option<CpuLevel> {
        self.selected.get(&(op, format)).map(|entry| entry.level)
    }

    /// Every kernel for an operation on a format that this CPU can run.
    pub fn variants(&self, op: Operation, format: SubpixelOrder) -> Vec<(CpuLevel, Kernel)> {
        self.variants
            .get(&(op, format))
            .map(|entries| entries.iter().map(|e| (e.level, e.kernel)).collect())
            .unwrap_or_default()
    }

    /// All selections, sorted by operation then format.
    pub fn selections(&self) -> Vec<(Operation, SubpixelOrder, CpuLevel)> {
        let mut all: Vec<_> = self
            .selected
            .iter()
            .map(|(&(op, format), entry)| (op, format, entry.level))
            .collect();
        all.sort();
        all
    }

    pub fn blend(&self, format: SubpixelOrder) -> Result<BlendFn> {
        match self.lookup(Operation::Blend, format)? {
            Kernel::Blend(f) => Ok(f),
            _ => Err(FrameError::unsupported(Operation::Blend, format)),
        }
    }

    pub fn delta(&self, format: SubpixelOrder) -> Result<DeltaFn> {
        match self.lookup(Operation::Delta, format)? {
            Kernel::Delta(f) => Ok(f),
            _ => Err(FrameError::unsupported(Operation::Delta, format)),
        }
    }

    pub fn convert(&self, from: SubpixelOrder, to: SubpixelOrder) -> Result<ConvertFn> {
        let op = Operation::Convert(to);
        match self.lookup(op, from)? {
            Kernel::Convert(f) => Ok(f),
            _ => Err(FrameError::unsupported(op, from)),
        }
    }

    pub fn deinterlace(&self, format: SubpixelOrder) -> Result<DeinterlaceFn> {
        match self.lookup(Operation::Deinterlace4Field, format)? {
            Kernel::Deinterlace(f) => Ok(f),
            _ => Err(FrameError::unsupported(Operation::Deinterlace4Field, format)),
        }
    }
}
