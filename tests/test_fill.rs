// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use edgefirst_motion::{
    draw::Font,
    frame::{Frame, Rect},
    pixel::{Rgb, SubpixelOrder},
    poly::{Coord, Polygon, Span},
};
use std::error::Error;

fn polygon(points: &[(i32, i32)]) -> Result<Polygon, Box<dyn Error>> {
    Ok(Polygon::new(points.iter().map(|&p| Coord::from(p)).collect())?)
}

fn lit(frame: &Frame, x: u32, y: u32) -> bool {
    frame.pixel(x, y).is_some_and(|px| px[0] != 0)
}

fn count(frame: &Frame) -> usize {
    frame.buffer().iter().filter(|&&v| v != 0).count()
}

#[test]
fn test_unit_square() -> Result<(), Box<dyn Error>> {
    let square = polygon(&[(0, 0), (4, 0), (4, 4), (0, 4)])?;
    assert_eq!(square.extent(), Rect::new(0, 0, 5, 5));

    let edges = square.edges();
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0].min_x, 0.0);
    assert_eq!(edges[1].min_x, 4.0);

    let mut frame = Frame::with_format(8, 8, SubpixelOrder::Gray8)?;
    frame.fill_polygon(Rgb::WHITE, &square)?;
    assert_eq!(count(&frame), 16);
    for y in 0..8 {
        for x in 0..8 {
            assert_eq!(lit(&frame, x, y), x < 4 && y < 4, "{},{}", x, y);
        }
    }
    Ok(())
}

#[test]
fn test_adjacent_squares_do_not_overlap() -> Result<(), Box<dyn Error>> {
    let left = polygon(&[(0, 0), (3, 0), (3, 3), (0, 3)])?;
    let right = polygon(&[(3, 0), (6, 0), (6, 3), (3, 3)])?;
    let mut a = Frame::with_format(8, 4, SubpixelOrder::Gray8)?;
    let mut b = Frame::with_format(8, 4, SubpixelOrder::Gray8)?;
    a.fill_polygon(Rgb::WHITE, &left)?;
    b.fill_polygon(Rgb::WHITE, &right)?;
    let shared = a
        .buffer()
        .iter()
        .zip(b.buffer())
        .filter(|(x, y)| **x != 0 && **y != 0)
        .count();
    assert_eq!(shared, 0);
    assert_eq!(count(&a) + count(&b), 18);
    Ok(())
}

#[test]
fn test_bowtie_even_odd() -> Result<(), Box<dyn Error>> {
    let bowtie = polygon(&[(0, 0), (8, 8), (8, 0), (0, 8)])?;
    let spans = bowtie.spans();
    assert!(spans.contains(&Span { y: 2, x0: 0, x1: 2 }));
    assert!(spans.contains(&Span { y: 2, x0: 6, x1: 8 }));

    let mut frame = Frame::with_format(8, 8, SubpixelOrder::Gray8)?;
    frame.fill_polygon(Rgb::WHITE, &bowtie)?;

    assert!(!lit(&frame, 4, 1));
    assert!(!lit(&frame, 4, 6));
    assert!(lit(&frame, 0, 4));
    assert!(lit(&frame, 7, 4));
    assert!(lit(&frame, 1, 2));
    assert!(lit(&frame, 6, 2));
    assert!(bowtie.contains(Coord::new(0, 4)));
    assert!(!bowtie.contains(Coord::new(4, 1)));
    Ok(())
}

#[test]
fn test_polygon_needs_three_vertices() {
    assert!(Polygon::new(vec![Coord::new(0, 0), Coord::new(4, 4)]).is_err());
}

#[test]
fn test_fill_density_and_limits() -> Result<(), Box<dyn Error>> {
    let mut frame = Frame::with_format(8, 8, SubpixelOrder::Gray8)?;
    frame.fill_density(Rgb::WHITE, 2, None)?;
    assert_eq!(count(&frame), 16);
    assert!(lit(&frame, 0, 0));
    assert!(!lit(&frame, 1, 0));
    assert!(lit(&frame, 2, 2));
    assert!(frame.fill_density(Rgb::WHITE, 0, None).is_err());

    let mut frame = Frame::with_format(8, 8, SubpixelOrder::Gray8)?;
    frame.fill(Rgb::WHITE, Some(&Rect::new(-2, -2, 4, 4)))?;
    assert_eq!(count(&frame), 4);
    frame.fill(Rgb::WHITE, Some(&Rect::new(20, 20, 4, 4)))?;
    assert_eq!(count(&frame), 4);

    let square = polygon(&[(0, 0), (8, 0), (8, 8), (0, 8)])?;
    let mut frame = Frame::with_format(8, 8, SubpixelOrder::Gray8)?;
    frame.fill_polygon_density(Rgb::WHITE, 4, &square)?;
    assert_eq!(count(&frame), 4);
    Ok(())
}

#[test]
fn test_fill_yuyv() -> Result<(), Box<dyn Error>> {
    let mut frame = Frame::with_format(4, 2, SubpixelOrder::Yuyv)?;
    frame.fill(Rgb::WHITE, None)?;
    assert!(frame
        .buffer()
        .chunks_exact(2)
        .all(|px| px == [235, 128]));
    Ok(())
}

#[test]
fn test_outline() -> Result<(), Box<dyn Error>> {
    let square = polygon(&[(0, 0), (4, 0), (4, 4), (0, 4)])?;
    let mut frame = Frame::with_format(8, 8, SubpixelOrder::Gray8)?;
    frame.outline(Rgb::WHITE, &square)?;
    assert!(lit(&frame, 0, 0));
    assert!(lit(&frame, 2, 0));
    assert!(lit(&frame, 4, 4));
    assert!(lit(&frame, 0, 2));
    assert!(!lit(&frame, 2, 2));
    assert_eq!(count(&frame), 16);

    // Sides outside the frame are clipped.
    let big = polygon(&[(-4, -4), (20, -4), (20, 3), (-4, 3)])?;
    let mut frame = Frame::with_format(8, 8, SubpixelOrder::Gray8)?;
    frame.outline(Rgb::WHITE, &big)?;
    assert_eq!(count(&frame), 8);
    Ok(())
}

struct CrossFont;

const CROSS: [u16; 3] = [0b101, 0b010, 0b101];

impl Font for CrossFont {
    fn char_size(&self) -> (u32, u32) {
        (3, 3)
    }

    fn glyph(&self, ch: char) -> Option<&[u16]> {
        match ch {
            'X' => Some(&CROSS),
            _ => None,
        }
    }
}

#[test]
fn test_annotate() -> Result<(), Box<dyn Error>> {
    let mut frame = Frame::with_format(5, 5, SubpixelOrder::Gray8)?;
    let at = frame.centre_coord("X", &CrossFont);
    assert_eq!(at, Coord::new(1, 1));

    frame.annotate("X", at, &CrossFont, Rgb::WHITE, None)?;
    assert_eq!(count(&frame), 5);
    assert!(lit(&frame, 1, 1));
    assert!(lit(&frame, 3, 1));
    assert!(lit(&frame, 2, 2));
    assert!(!lit(&frame, 2, 1));

    frame.annotate("X", at, &CrossFont, Rgb::WHITE, Some(Rgb::new(50, 50, 50)))?;
    assert_eq!(frame.pixel(2, 1), Some(&[50u8][..]));
    assert_eq!(count(&frame), 9);

    // Unknown characters are blank cells; lines stack downwards.
    let mut frame = Frame::with_format(6, 6, SubpixelOrder::Gray8)?;
    frame.annotate("?X\nX", Coord::new(0, 0), &CrossFont, Rgb::WHITE, None)?;
    assert_eq!(count(&frame), 10);
    assert!(lit(&frame, 3, 0));
    assert!(lit(&frame, 0, 3));
    Ok(())
}

#[test]
fn test_highlight_edges() -> Result<(), Box<dyn Error>> {
    let mut mask = Frame::with_format(5, 5, SubpixelOrder::Gray8)?;
    mask.fill(Rgb::WHITE, Some(&Rect::new(1, 1, 3, 3)))?;

    let edges = mask.highlight_edges(Rgb::RED, SubpixelOrder::Rgb, None)?;
    assert_eq!(edges.format(), SubpixelOrder::Rgb);
    let red = edges
        .buffer()
        .chunks_exact(3)
        .filter(|px| *px == [255, 0, 0])
        .count();
    assert_eq!(red, 8);
    assert_eq!(edges.pixel(2, 2), Some(&[0u8, 0, 0][..]));
    assert_eq!(edges.pixel(1, 1), Some(&[255u8, 0, 0][..]));

    let limited = mask.highlight_edges(Rgb::RED, SubpixelOrder::Rgb, Some(&Rect::new(0, 0, 2, 5)))?;
    let red = limited
        .buffer()
        .chunks_exact(3)
        .filter(|px| *px == [255, 0, 0])
        .count();
    assert_eq!(red, 3);

    let colour = Frame::with_format(5, 5, SubpixelOrder::Rgb)?;
    assert!(colour.highlight_edges(Rgb::RED, SubpixelOrder::Rgb, None).is_err());
    Ok(())
}

#[test]
fn test_extreme_zones() -> Result<(), Box<dyn Error>> {
    let overflow = Polygon::new(vec![
        Coord::new(i32::MIN, 0),
        Coord::new(i32::MAX, 0),
        Coord::new(0, 5),
    ]);
    assert!(overflow.is_err());

    // Zones far larger than the frame only cost the rows and columns on it.
    let huge = polygon(&[
        (-1_000_000_000, -1_000_000_000),
        (1_000_000_000, -1_000_000_000),
        (1_000_000_000, 1_000_000_000),
        (-1_000_000_000, 1_000_000_000),
    ])?;
    assert!(huge.contains(Coord::new(500_000_000, -500_000_000)));
    assert_eq!(huge.spans_within(0..8).len(), 8);

    let mut frame = Frame::with_format(8, 8, SubpixelOrder::Gray8)?;
    frame.fill_polygon(Rgb::WHITE, &huge)?;
    assert_eq!(count(&frame), 64);

    let mut frame = Frame::with_format(8, 8, SubpixelOrder::Gray8)?;
    frame.outline(Rgb::WHITE, &huge)?;
    assert_eq!(count(&frame), 0);

    let wedge = polygon(&[(-1_000_000_000, 4), (1_000_000_000, 4), (0, -1_000_000_000)])?;
    frame.outline(Rgb::WHITE, &wedge)?;
    assert_eq!(count(&frame), 8);
    assert!((0..8).all(|x| lit(&frame, x, 4)));
    Ok(())
}
