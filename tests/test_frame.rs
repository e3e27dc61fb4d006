// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use edgefirst_motion::{
    buffer::{live_engine_buffers, Ownership, OwnershipKind},
    error::FrameError,
    frame::{Frame, Rect},
    pixel::{Rgb, SubpixelOrder},
    transform::{Mirror, Rotation},
};
use serial_test::serial;
use std::{
    error::Error,
    mem::ManuallyDrop,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

fn gray(width: u32, height: u32, data: &[u8]) -> Result<Frame, FrameError> {
    Frame::from_bytes(width, height, SubpixelOrder::Gray8, data)
}

fn solid(width: u32, height: u32, format: SubpixelOrder, colour: Rgb) -> Result<Frame, FrameError> {
    let mut frame = Frame::with_format(width, height, format)?;
    frame.fill(colour, None)?;
    Ok(frame)
}

#[test]
#[serial]
fn test_formats() -> Result<(), Box<dyn Error>> {
    let mut frame = Frame::with_format(1920, 1080, SubpixelOrder::Gray8)?;
    println!("{}", frame);
    assert_eq!(frame.size(), 2073600);

    frame = Frame::with_format(1920, 1080, SubpixelOrder::Yuyv)?;
    println!("{}", frame);
    assert_eq!(frame.size(), 4147200);

    frame = Frame::with_format(1920, 1080, SubpixelOrder::Rgb)?;
    assert_eq!(frame.size(), 6220800);

    frame = Frame::with_format(1920, 1080, SubpixelOrder::Rgba)?;
    assert_eq!(frame.size(), 8294400);
    assert_eq!(frame.colours(), 4);
    assert_eq!(frame.pixels(), 1920 * 1080);

    frame = Frame::with_format(1920, 1080, SubpixelOrder::Rgb565)?;
    assert_eq!(frame.size(), 4147200);
    assert_eq!(frame.ownership(), Some(OwnershipKind::Engine));

    assert!(Frame::with_format(641, 480, SubpixelOrder::Yuyv).is_err());
    assert!(Frame::with_format(0, 480, SubpixelOrder::Rgb).is_err());
    Ok(())
}

#[test]
#[serial]
fn test_write_buffer_reuses_allocation() -> Result<(), Box<dyn Error>> {
    let mut frame = Frame::new();
    assert!(frame.is_empty());
    assert_eq!(frame.ownership(), None);

    let first = frame.write_buffer(64, 48, SubpixelOrder::Rgba)?.as_ptr();
    let second = frame.write_buffer(64, 48, SubpixelOrder::Rgba)?.as_ptr();
    assert_eq!(first, second);

    // Smaller shapes fit in the existing allocation.
    let third = frame.write_buffer(32, 24, SubpixelOrder::Rgb)?.as_ptr();
    assert_eq!(first, third);
    assert_eq!(frame.size(), 32 * 24 * 3);
    assert_eq!(frame.allocation(), 64 * 48 * 4);
    Ok(())
}

#[test]
#[serial]
fn test_held_buffer() -> Result<(), Box<dyn Error>> {
    let mut frame = Frame::with_format(8, 8, SubpixelOrder::Gray8)?;
    frame.hold_buffer(true);
    assert!(frame.is_buffer_held());
    let ptr = frame.buffer().as_ptr();

    let err = frame.write_buffer(16, 16, SubpixelOrder::Gray8);
    assert!(matches!(err, Err(FrameError::Argument(_))));
    assert_eq!(frame.size(), 64);

    // Adopted buffers are copied into the held one.
    frame.assign_vec(4, 4, SubpixelOrder::Gray8, vec![9u8; 16])?;
    assert_eq!(frame.buffer().as_ptr(), ptr);
    assert_eq!(frame.ownership(), Some(OwnershipKind::Engine));
    assert!(frame.buffer().iter().all(|&v| v == 9));

    frame.empty();
    assert!(frame.is_empty());
    assert_eq!(frame.allocation(), 64);

    frame.hold_buffer(false);
    frame.empty();
    assert_eq!(frame.allocation(), 0);
    Ok(())
}

#[test]
#[serial]
fn test_not_owned_buffer_survives_drop() -> Result<(), Box<dyn Error>> {
    let mut storage = vec![7u8; 16];
    {
        let mut frame = Frame::new();
        unsafe {
            frame.assign_direct(
                4,
                4,
                SubpixelOrder::Gray8,
                storage.as_mut_ptr(),
                storage.len(),
                Ownership::NotOwned,
            )?;
        }
        frame.hold_buffer(true);
        assert_eq!(frame.ownership(), Some(OwnershipKind::NotOwned));
        frame.buffer_mut()[0] = 1;

        // A held window onto foreign memory receives copies.
        frame.assign(4, 4, SubpixelOrder::Gray8, &[3u8; 16])?;
        frame.buffer_mut()[15] = 5;
    }
    assert_eq!(storage[0], 3);
    assert_eq!(storage[14], 3);
    assert_eq!(storage[15], 5);
    Ok(())
}

#[test]
#[serial]
fn test_assign_leaves_foreign_buffer() -> Result<(), Box<dyn Error>> {
    let mut storage = vec![7u8; 16];
    let before = live_engine_buffers();
    {
        let mut frame = Frame::new();
        unsafe {
            frame.assign_direct(
                4,
                4,
                SubpixelOrder::Gray8,
                storage.as_mut_ptr(),
                storage.len(),
                Ownership::NotOwned,
            )?;
        }

        // Without a hold, copies move the frame onto engine memory.
        frame.assign(4, 4, SubpixelOrder::Gray8, &[3u8; 16])?;
        assert_eq!(frame.ownership(), Some(OwnershipKind::Engine));
        assert_eq!(frame.buffer(), &[3u8; 16]);
        assert_eq!(live_engine_buffers(), before + 1);

        let mut vec_frame = Frame::new();
        vec_frame.assign_vec(4, 4, SubpixelOrder::Gray8, vec![1u8; 16])?;
        vec_frame.assign_frame(&frame)?;
        assert_eq!(vec_frame.ownership(), Some(OwnershipKind::Engine));
        assert_eq!(vec_frame.buffer(), frame.buffer());
    }
    assert!(storage.iter().all(|&v| v == 7));
    assert_eq!(live_engine_buffers(), before);
    Ok(())
}

#[test]
#[serial]
fn test_external_release_runs_once() -> Result<(), Box<dyn Error>> {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut data = ManuallyDrop::new(vec![0u8; 32]);
    let (ptr, capacity) = (data.as_mut_ptr(), data.capacity());

    let counter = calls.clone();
    let ownership = Ownership::External(Box::new(move |p: *mut u8, _: usize| {
        counter.fetch_add(1, Ordering::SeqCst);
        drop(unsafe { Vec::from_raw_parts(p, 0, capacity) });
    }));

    let mut frame = Frame::new();
    unsafe { frame.assign_direct(4, 8, SubpixelOrder::Gray8, ptr, 32, ownership)? };
    assert_eq!(frame.ownership(), Some(OwnershipKind::External));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    frame.empty();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    drop(frame);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A rejected buffer is still released.
    let counter = calls.clone();
    let data = ManuallyDrop::new(vec![0u8; 4]);
    let (ptr, capacity) = (data.as_ptr() as *mut u8, data.capacity());
    let ownership = Ownership::External(Box::new(move |p: *mut u8, _: usize| {
        counter.fetch_add(1, Ordering::SeqCst);
        drop(unsafe { Vec::from_raw_parts(p, 0, capacity) });
    }));
    let mut frame = Frame::new();
    let err = unsafe { frame.assign_direct(4, 8, SubpixelOrder::Gray8, ptr, 4, ownership) };
    assert!(matches!(err, Err(FrameError::SizeMismatch { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
#[serial]
fn test_engine_buffers_released() -> Result<(), Box<dyn Error>> {
    let before = live_engine_buffers();
    {
        let frame = Frame::with_format(320, 240, SubpixelOrder::Rgb)?;
        let copy = frame.clone();
        assert_ne!(frame.buffer().as_ptr(), copy.buffer().as_ptr());
        assert_eq!(live_engine_buffers(), before + 2);

        let mut converted = copy.clone();
        converted.convert_to(SubpixelOrder::Rgba)?;
        assert_eq!(live_engine_buffers(), before + 3);
    }
    assert_eq!(live_engine_buffers(), before);

    let frame = Frame::from_vec(2, 2, SubpixelOrder::Gray8, vec![1, 2, 3, 4])?;
    assert_eq!(frame.ownership(), Some(OwnershipKind::Language));
    assert_eq!(live_engine_buffers(), before);
    Ok(())
}

#[test]
#[serial]
fn test_copy_buffer() -> Result<(), Box<dyn Error>> {
    let src = gray(2, 2, &[1, 2, 3, 4])?;
    let mut dst = Frame::with_format(2, 2, SubpixelOrder::Gray8)?;
    dst.copy_buffer(&src)?;
    assert_eq!(dst.buffer(), &[1, 2, 3, 4]);

    let bigger = Frame::with_format(4, 4, SubpixelOrder::Gray8)?;
    assert!(matches!(
        dst.copy_buffer(&bigger),
        Err(FrameError::SizeMismatch {
            expected: 4,
            actual: 16
        })
    ));

    let mut other = Frame::new();
    other.assign_frame(&src)?;
    assert_eq!(other.buffer(), src.buffer());
    assert!(gray(2, 2, &[1, 2, 3]).is_err());

    dst.copy_from(&[9, 8, 7, 6])?;
    assert_eq!(dst.buffer(), &[9, 8, 7, 6]);
    assert!(dst.copy_from(&[1, 2]).is_err());
    dst.clear();
    assert_eq!(dst.buffer(), &[0, 0, 0, 0]);
    Ok(())
}

#[test]
#[serial]
fn test_crop() -> Result<(), Box<dyn Error>> {
    let data: Vec<u8> = (0..64).collect();
    let mut frame = gray(8, 8, &data)?;

    frame.crop(&Rect::new(2, 2, 4, 4))?;
    assert_eq!((frame.width(), frame.height()), (4, 4));
    assert_eq!(frame.pixel(0, 0), Some(&[18u8][..]));
    assert_eq!(frame.pixel(3, 3), Some(&[45u8][..]));
    assert_eq!(frame.pixel(4, 0), None);

    let mut frame = gray(8, 8, &data)?;
    assert!(matches!(
        frame.crop(&Rect::new(6, 6, 4, 4)),
        Err(FrameError::OutOfBounds { .. })
    ));
    assert!(frame.crop(&Rect::new(-1, 0, 4, 4)).is_err());
    assert!(frame.crop(&Rect::new(0, 0, 0, 4)).is_err());
    assert_eq!(frame.buffer(), &data[..]);

    let mut yuyv = Frame::with_format(8, 8, SubpixelOrder::Yuyv)?;
    assert!(matches!(
        yuyv.crop(&Rect::new(0, 0, 4, 4)),
        Err(FrameError::UnsupportedFormat { .. })
    ));
    Ok(())
}

#[test]
#[serial]
fn test_rotate_flip_scale() -> Result<(), Box<dyn Error>> {
    let data = [1, 2, 3, 4, 5, 6];

    let mut frame = gray(3, 2, &data)?;
    frame.rotate(Rotation::Rotation90)?;
    assert_eq!((frame.width(), frame.height()), (2, 3));
    assert_eq!(frame.buffer(), &[4, 1, 5, 2, 6, 3]);

    let mut frame = gray(3, 2, &data)?;
    frame.rotate(Rotation::Rotation270)?;
    assert_eq!(frame.buffer(), &[3, 6, 2, 5, 1, 4]);

    let mut frame = gray(3, 2, &data)?;
    frame.rotate(Rotation::Rotation180)?;
    assert_eq!(frame.buffer(), &[6, 5, 4, 3, 2, 1]);
    assert_eq!(Rotation::from_degrees(450)?, Rotation::Rotation90);
    assert!(Rotation::from_degrees(45).is_err());

    let mut frame = gray(3, 2, &data)?;
    frame.flip(Mirror::Horizontal)?;
    assert_eq!(frame.buffer(), &[3, 2, 1, 6, 5, 4]);
    frame.flip(Mirror::Vertical)?;
    assert_eq!(frame.buffer(), &[6, 5, 4, 3, 2, 1]);

    let rgb = Frame::from_bytes(2, 1, SubpixelOrder::Rgb, &[1, 2, 3, 4, 5, 6])?;
    let mut mirrored = rgb.clone();
    mirrored.flip(Mirror::Horizontal)?;
    assert_eq!(mirrored.buffer(), &[4, 5, 6, 1, 2, 3]);

    let data: Vec<u8> = (0..16).collect();
    let mut frame = gray(4, 4, &data)?;
    frame.scale(50)?;
    assert_eq!((frame.width(), frame.height()), (2, 2));
    assert_eq!(frame.buffer(), &[0, 2, 8, 10]);
    frame.scale(200)?;
    assert_eq!(frame.buffer(), &[0, 0, 2, 2, 0, 0, 2, 2, 8, 8, 10, 10, 8, 8, 10, 10]);
    assert!(frame.scale(0).is_err());
    Ok(())
}

#[test]
#[serial]
fn test_blend() -> Result<(), Box<dyn Error>> {
    for format in [SubpixelOrder::Gray8, SubpixelOrder::Rgba, SubpixelOrder::Rgb565] {
        let a = solid(16, 4, format, Rgb::new(16, 16, 16))?;
        let b = solid(16, 4, format, Rgb::new(200, 200, 200))?;

        let mut keep = a.clone();
        keep.blend(&b, 0)?;
        assert_eq!(keep.buffer(), a.buffer(), "{}", format);

        let mut replace = a.clone();
        replace.blend(&b, 100)?;
        assert_eq!(replace.buffer(), b.buffer(), "{}", format);

        let mut half = a.clone();
        assert!(half.blend(&b, 101).is_err());
        half.blend(&b, 50)?;
        assert_ne!(half.buffer(), a.buffer());
    }

    let mut small = Frame::with_format(8, 8, SubpixelOrder::Gray8)?;
    let large = Frame::with_format(16, 16, SubpixelOrder::Gray8)?;
    assert!(small.blend(&large, 50).is_err());

    // The command line default of 12% maps to a weight of 31/256.
    let mut reference = gray(2, 1, &[16, 0])?;
    reference.blend(&gray(2, 1, &[200, 200])?, 12)?;
    assert_eq!(reference.buffer(), &[38, 24]);

    // Blending at an offset only touches the overlap.
    let mut base = Frame::with_format(4, 4, SubpixelOrder::Gray8)?;
    let patch = gray(2, 2, &[200; 4])?;
    base.blend_at(&patch, 3, 3, 100)?;
    assert_eq!(base.pixel(3, 3), Some(&[200u8][..]));
    assert_eq!(base.buffer().iter().filter(|&&v| v != 0).count(), 1);
    Ok(())
}

#[test]
#[serial]
fn test_overlay() -> Result<(), Box<dyn Error>> {
    let mut frame = solid(2, 2, SubpixelOrder::Rgb, Rgb::BLUE)?;
    let mask = gray(2, 2, &[0, 255, 0, 0])?;
    frame.overlay(&mask)?;
    assert_eq!(frame.pixel(0, 0), Some(&[0u8, 0, 255][..]));
    assert_eq!(frame.pixel(1, 0), Some(&[255u8, 255, 255][..]));

    // Opaque black is still black: alpha and YUV offsets do not count.
    for format in [SubpixelOrder::Rgba, SubpixelOrder::Argb, SubpixelOrder::Yuyv] {
        let mut frame = solid(2, 2, format, Rgb::WHITE)?;
        let white = frame.buffer().to_vec();
        let mut black = solid(2, 2, format, Rgb::BLACK)?;
        frame.overlay(&black)?;
        assert_eq!(frame.buffer(), &white[..], "{}", format);

        black.fill(Rgb::RED, Some(&Rect::new(0, 1, 2, 1)))?;
        frame.overlay(&black)?;
        assert_eq!(&frame.buffer()[..white.len() / 2], &white[..white.len() / 2]);
        assert_eq!(&frame.buffer()[white.len() / 2..], &black.buffer()[white.len() / 2..]);
    }

    let mut base = Frame::with_format(4, 4, SubpixelOrder::Gray8)?;
    let patch = gray(2, 2, &[1, 2, 3, 4])?;
    base.overlay_at(&patch, -1, -1)?;
    assert_eq!(base.pixel(0, 0), Some(&[4u8][..]));
    assert_eq!(base.buffer().iter().filter(|&&v| v != 0).count(), 1);
    base.overlay_at(&patch, 10, 10)?;
    assert_eq!(base.buffer().iter().filter(|&&v| v != 0).count(), 1);
    Ok(())
}

#[test]
#[serial]
fn test_delta() -> Result<(), Box<dyn Error>> {
    for format in SubpixelOrder::ALL {
        let frame = solid(32, 8, format, Rgb::new(90, 140, 30))?;
        let mut motion = Frame::new();
        frame.delta(&frame, &mut motion)?;
        assert_eq!(motion.format(), SubpixelOrder::Gray8);
        assert_eq!(motion.size(), 32 * 8);
        assert!(motion.buffer().iter().all(|&v| v == 0), "{}", format);
    }

    let a = Frame::from_bytes(2, 1, SubpixelOrder::Rgb, &[100, 0, 0, 7, 7, 7])?;
    let b = Frame::from_bytes(2, 1, SubpixelOrder::Rgb, &[0, 0, 0, 7, 7, 7])?;
    let mut motion = Frame::new();
    a.delta(&b, &mut motion)?;
    assert_eq!(motion.buffer(), &[30, 0]);

    let c = Frame::with_format(2, 1, SubpixelOrder::Rgba)?;
    assert!(a.delta(&c, &mut motion).is_err());
    Ok(())
}

#[test]
#[serial]
fn test_convert() -> Result<(), Box<dyn Error>> {
    let rgb = Frame::from_bytes(2, 1, SubpixelOrder::Rgb, &[255, 0, 0, 10, 20, 30])?;

    let mut same = rgb.clone();
    same.convert_to(SubpixelOrder::Rgb)?;
    assert_eq!(same.buffer(), rgb.buffer());

    let mut round = rgb.clone();
    round.convert_to(SubpixelOrder::Bgra)?;
    assert_eq!(round.buffer(), &[0, 0, 255, 255, 30, 20, 10, 255]);
    round.convert_to(SubpixelOrder::Rgb)?;
    assert_eq!(round.buffer(), rgb.buffer());

    let mut grey = rgb.clone();
    grey.decolourise()?;
    assert_eq!(grey.format(), SubpixelOrder::Gray8);
    assert_eq!(grey.pixel(0, 0), Some(&[76u8][..]));

    grey.colourise(SubpixelOrder::Rgba)?;
    assert_eq!(grey.pixel(0, 0), Some(&[76u8, 76, 76, 255][..]));
    assert!(grey.colourise(SubpixelOrder::Gray8).is_err());

    let mut packed = Frame::from_bytes(2, 1, SubpixelOrder::Rgb565, &[0x1f, 0xf8, 0xe0, 0x07])?;
    let original = packed.buffer().to_vec();
    packed.convert_to(SubpixelOrder::Rgba)?;
    assert_eq!(packed.pixel(0, 0), Some(&[255u8, 0, 255, 255][..]));
    packed.convert_to(SubpixelOrder::Rgb565)?;
    assert_eq!(packed.buffer(), &original[..]);

    let mut odd = Frame::with_format(3, 1, SubpixelOrder::Rgb)?;
    assert!(odd.convert_to(SubpixelOrder::Yuyv).is_err());
    Ok(())
}

#[test]
#[serial]
fn test_merge_and_highlight() -> Result<(), Box<dyn Error>> {
    for format in [SubpixelOrder::Rgb, SubpixelOrder::Rgb555] {
        let frame = solid(8, 8, format, Rgb::new(80, 120, 160))?;
        let merged = Frame::merge(&[&frame, &frame, &frame])?;
        assert_eq!(merged.buffer(), frame.buffer(), "{}", format);
        let weighted = Frame::merge_weighted(&[&frame, &frame], 0.3)?;
        assert_eq!(weighted.buffer(), frame.buffer(), "{}", format);
    }

    let a = gray(2, 1, &[0, 10])?;
    let b = gray(2, 1, &[30, 13])?;
    assert_eq!(Frame::merge(&[&a, &b])?.buffer(), &[15, 11]);
    assert_eq!(Frame::merge_weighted(&[&a, &b], 1.0)?.buffer(), a.buffer());
    assert_eq!(Frame::merge_weighted(&[&a, &b], 0.5)?.buffer(), &[10, 11]);
    assert!(Frame::merge_weighted(&[&a, &b], 0.0).is_err());
    assert!(Frame::merge(&[]).is_err());

    let first = Frame::from_bytes(2, 1, SubpixelOrder::Rgb, &[0, 0, 0, 5, 5, 5])?;
    let second = Frame::from_bytes(2, 1, SubpixelOrder::Rgb, &[0, 0, 0, 100, 100, 100])?;
    let marked = Frame::highlight(
        &[&first, &second],
        Rgb::new(10, 10, 10),
        Rgb::BLACK,
        Rgb::RED,
    )?;
    assert_eq!(marked.buffer(), &[0, 0, 0, 255, 0, 0]);
    Ok(())
}

#[test]
#[serial]
fn test_deinterlace() -> Result<(), Box<dyn Error>> {
    let mut frame = gray(1, 4, &[1, 2, 3, 4])?;
    frame.deinterlace_discard()?;
    assert_eq!(frame.buffer(), &[1, 1, 3, 3]);

    let mut frame = gray(1, 4, &[10, 99, 30, 99])?;
    frame.deinterlace_linear()?;
    assert_eq!(frame.buffer(), &[10, 20, 30, 30]);

    let mut frame = gray(1, 3, &[0, 100, 200])?;
    frame.deinterlace_blend_ratio(0)?;
    assert_eq!(frame.buffer(), &[0, 100, 200]);
    frame.deinterlace_blend_ratio(100)?;
    assert_eq!(frame.buffer(), &[100, 200, 200]);

    let still = gray(1, 3, &[10, 99, 30])?;
    let mut frame = still.clone();
    frame.deinterlace_4field(&still, 50)?;
    assert_eq!(frame.buffer(), still.buffer());

    let moved = gray(1, 3, &[110, 199, 130])?;
    frame.deinterlace_4field(&moved, 50)?;
    assert_eq!(frame.buffer(), &[10, 20, 30]);

    let mut frame = still.clone();
    frame.deinterlace_4field(&moved, 101)?;
    assert_eq!(frame.buffer(), still.buffer());
    Ok(())
}

#[test]
#[serial]
fn test_heap_buffer() -> Result<(), Box<dyn Error>> {
    let ptr = unsafe { libc::malloc(48) as *mut u8 };
    assert!(!ptr.is_null());
    unsafe { std::ptr::write_bytes(ptr, 0x40, 48) };

    let mut frame = Frame::new();
    unsafe { frame.assign_direct(4, 4, SubpixelOrder::Rgb, ptr, 48, Ownership::Heap)? };
    assert_eq!(frame.ownership(), Some(OwnershipKind::Heap));
    assert!(frame.buffer().iter().all(|&v| v == 0x40));

    // Replacing a heap buffer frees it and the frame moves to engine memory.
    frame.write_buffer(8, 8, SubpixelOrder::Rgb)?;
    assert_eq!(frame.ownership(), Some(OwnershipKind::Engine));

    let mut frame = Frame::new();
    let err = unsafe {
        frame.assign_direct(4, 4, SubpixelOrder::Rgb, std::ptr::null_mut(), 48, Ownership::Heap)
    };
    assert!(matches!(err, Err(FrameError::Argument(_))));
    Ok(())
}
