// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gradient, surface and mask sources drawn through a [`Context`].

use std::sync::Arc;

use piet_raster::{
    Color, Context, Extend, Filter, Format, LinearGradient, Matrix, Pattern, RadialGradient,
    Surface,
};

fn canvas(width: i32, height: i32) -> Context {
    let surface = Surface::new(Format::Argb32, width, height).unwrap();
    let mut ctx = Context::new(surface);
    ctx.set_source_rgb(1.0, 1.0, 1.0).unwrap();
    ctx.paint().unwrap();
    ctx
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 2.0 / 255.0
}

#[test]
fn linear_gradient_pads_and_interpolates() {
    let gradient = LinearGradient::new((20.0, 0.0), (80.0, 0.0))
        .with_stops((Color::BLACK, Color::WHITE))
        .unwrap();
    let mut ctx = canvas(100, 4);
    ctx.set_source(&Pattern::linear(gradient)).unwrap();
    ctx.paint().unwrap();
    let target = ctx.target();
    assert_eq!(target.pixel(5, 1).as_rgba_u32(), 0x000000ff);
    assert_eq!(target.pixel(95, 1).as_rgba_u32(), 0xffffffff);
    // Pixel 49 samples at x = 49.5, a little before the midpoint.
    let mid = target.pixel(49, 1);
    assert!(close(mid.r, 29.5 / 60.0), "{mid:?}");
    assert!(target.pixel(30, 1).r < target.pixel(60, 1).r);
}

#[test]
fn gradient_without_extend_leaves_outside_untouched() {
    let gradient = LinearGradient::new((20.0, 0.0), (80.0, 0.0))
        .with_stops((Color::rgb(1.0, 0.0, 0.0), Color::rgb(0.0, 0.0, 1.0)))
        .unwrap();
    let pattern = Pattern::linear(gradient).with_extend(Extend::None);
    let mut ctx = canvas(100, 4);
    ctx.set_source(&pattern).unwrap();
    ctx.paint().unwrap();
    assert_eq!(ctx.target().pixel(5, 1).as_rgba_u32(), 0xffffffff);
    assert_eq!(ctx.target().pixel(95, 1).as_rgba_u32(), 0xffffffff);
    assert!(ctx.target().pixel(50, 1).r > 0.0);
}

#[test]
fn source_is_locked_to_user_space_at_set_time() {
    let gradient = LinearGradient::new((0.0, 0.0), (10.0, 0.0))
        .with_stops((Color::BLACK, Color::WHITE))
        .unwrap();
    let mut ctx = canvas(40, 4);
    ctx.translate(20.0, 0.0).unwrap();
    ctx.set_source(&Pattern::linear(gradient)).unwrap();
    ctx.identity_matrix().unwrap();
    ctx.paint().unwrap();
    // The gradient starts at device x = 20, not 0.
    assert_eq!(ctx.target().pixel(10, 1).as_rgba_u32(), 0x000000ff);
    assert_eq!(ctx.target().pixel(35, 1).as_rgba_u32(), 0xffffffff);
}

#[test]
fn radial_gradient_center_and_rim() {
    let gradient = RadialGradient::new_centered((50.0, 50.0), 40.0)
        .with_stops((Color::WHITE, Color::BLACK))
        .unwrap();
    let mut ctx = canvas(100, 100);
    ctx.set_source(&Pattern::radial(gradient)).unwrap();
    ctx.paint().unwrap();
    let target = ctx.target();
    assert!(target.pixel(50, 50).r > 0.97);
    assert_eq!(target.pixel(2, 2).as_rgba_u32(), 0x000000ff);
    let half = target.pixel(69, 50);
    assert!(close(half.r, 1.0 - 19.5 / 40.0), "{half:?}");
}

fn checker() -> Arc<Surface> {
    let mut surface = Surface::new(Format::Argb32, 2, 2).unwrap();
    surface.set_pixel(0, 0, Color::rgb(1.0, 0.0, 0.0));
    surface.set_pixel(1, 0, Color::rgb(0.0, 1.0, 0.0));
    surface.set_pixel(0, 1, Color::rgb(0.0, 0.0, 1.0));
    surface.set_pixel(1, 1, Color::BLACK);
    Arc::new(surface)
}

#[test]
fn surface_source_nearest() {
    let mut pattern = Pattern::surface(checker()).with_filter(Filter::Nearest);
    pattern
        .set_matrix(Matrix::new_translate(-10.0, -10.0))
        .unwrap();
    let mut ctx = canvas(20, 20);
    ctx.set_source(&pattern).unwrap();
    ctx.paint().unwrap();
    let target = ctx.target();
    assert_eq!(target.pixel(10, 10).as_rgba_u32(), 0xff0000ff);
    assert_eq!(target.pixel(11, 10).as_rgba_u32(), 0x00ff00ff);
    assert_eq!(target.pixel(10, 11).as_rgba_u32(), 0x0000ffff);
    assert_eq!(target.pixel(11, 11).as_rgba_u32(), 0x000000ff);
    // Outside the surface the pattern is transparent.
    assert_eq!(target.pixel(12, 12).as_rgba_u32(), 0xffffffff);
    assert_eq!(target.pixel(9, 10).as_rgba_u32(), 0xffffffff);
}

#[test]
fn surface_source_repeats() {
    let pattern = Pattern::surface(checker())
        .with_filter(Filter::Nearest)
        .with_extend(Extend::Repeat);
    let mut ctx = canvas(6, 6);
    ctx.set_source(&pattern).unwrap();
    ctx.paint().unwrap();
    let target = ctx.target();
    assert_eq!(target.pixel(4, 0).as_rgba_u32(), 0xff0000ff);
    assert_eq!(target.pixel(5, 3).as_rgba_u32(), 0x000000ff);
}

#[test]
fn set_source_surface_offsets_origin() {
    let mut solid = Surface::new(Format::Argb32, 4, 4).unwrap();
    for y in 0..4 {
        for x in 0..4 {
            solid.set_pixel(x, y, Color::rgb(0.0, 0.0, 1.0));
        }
    }
    let mut ctx = canvas(16, 16);
    ctx.set_source_surface(Arc::new(solid), 5.0, 5.0).unwrap();
    ctx.rectangle(5.0, 5.0, 4.0, 4.0).unwrap();
    ctx.fill().unwrap();
    let target = ctx.target();
    assert_eq!(target.pixel(6, 6).as_rgba_u32(), 0x0000ffff);
    assert_eq!(target.pixel(7, 7).as_rgba_u32(), 0x0000ffff);
    assert_eq!(target.pixel(2, 2).as_rgba_u32(), 0xffffffff);
}

#[test]
fn mask_with_constant_alpha() {
    let mut ctx = canvas(8, 8);
    ctx.set_source_rgb(1.0, 0.0, 0.0).unwrap();
    ctx.mask(&Pattern::solid(Color::rgba(0.0, 0.0, 0.0, 0.5)))
        .unwrap();
    let c = ctx.target().pixel(3, 3);
    assert_eq!(c.r, 1.0);
    assert!(close(c.g, 0.5), "{c:?}");
}

#[test]
fn mask_surface_uses_alpha() {
    let mut alpha = Surface::new(Format::A8, 2, 1).unwrap();
    alpha.set_pixel(0, 0, Color::BLACK);
    let mut ctx = canvas(8, 8);
    ctx.set_source_rgb(1.0, 0.0, 0.0).unwrap();
    ctx.mask_surface(Arc::new(alpha), 0.0, 0.0).unwrap();
    let target = ctx.target();
    assert_eq!(target.pixel(0, 0).as_rgba_u32(), 0xff0000ff);
    assert_eq!(target.pixel(1, 0).as_rgba_u32(), 0xffffffff);
    assert_eq!(target.pixel(5, 5).as_rgba_u32(), 0xffffffff);
}

#[test]
fn gradient_stops_are_validated() {
    let mut gradient = LinearGradient::new((0.0, 0.0), (1.0, 0.0));
    assert!(gradient.add_color_stop(0.5, Color::WHITE).is_ok());
    assert!(gradient.add_color_stop(1.5, Color::WHITE).is_err());
    assert_eq!(gradient.stops().len(), 1);
}
