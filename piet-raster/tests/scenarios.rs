// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end rendering checks on small surfaces.

use piet_raster::{Antialias, Color, Context, FillRule, Format, LineCap, Operator, Surface};

const DENSITIES: [(Antialias, u32); 4] = [
    (Antialias::None, 1),
    (Antialias::Fast, 2),
    (Antialias::Default, 4),
    (Antialias::Best, 8),
];

fn white_canvas(size: i32) -> Context {
    let surface = Surface::new(Format::Argb32, size, size).unwrap();
    let mut ctx = Context::new(surface);
    ctx.set_source_rgb(1.0, 1.0, 1.0).unwrap();
    ctx.paint().unwrap();
    ctx
}

fn is_white(c: Color) -> bool {
    c.as_rgba_u32() == 0xffffffff
}

fn is_red(c: Color) -> bool {
    c.as_rgba_u32() == 0xff0000ff
}

fn red_rect(antialias: Antialias, x: f64) -> Context {
    let mut ctx = white_canvas(100);
    ctx.set_antialias(antialias).unwrap();
    ctx.set_operator(Operator::Over).unwrap();
    ctx.set_source_rgb(1.0, 0.0, 0.0).unwrap();
    ctx.rectangle(x, 10.0, 50.0 - x, 40.0).unwrap();
    ctx.fill().unwrap();
    ctx
}

#[test]
fn red_square_on_white() {
    for (antialias, _) in DENSITIES {
        let ctx = red_rect(antialias, 10.0);
        let target = ctx.target();
        assert!(is_white(target.pixel(5, 5)), "{antialias:?}");
        assert!(is_red(target.pixel(30, 30)), "{antialias:?}");
        // The left edge lies on a pixel boundary.
        assert!(is_white(target.pixel(9, 30)), "{antialias:?}");
        assert!(is_red(target.pixel(10, 30)), "{antialias:?}");
        assert!(is_red(target.pixel(49, 49)), "{antialias:?}");
        assert!(is_white(target.pixel(50, 30)), "{antialias:?}");
    }
}

#[test]
fn partial_edge_coverage_depends_on_density() {
    for (antialias, density) in DENSITIES {
        let ctx = red_rect(antialias, 9.75);
        let edge = ctx.target().pixel(9, 30);
        if density == 1 {
            assert!(is_white(edge), "{antialias:?}: {edge:?}");
        } else {
            assert_eq!(edge.r, 1.0, "{antialias:?}");
            assert!(edge.g > 0.0 && edge.g < 1.0, "{antialias:?}: {edge:?}");
            assert_eq!(edge.g, edge.b);
        }
    }
}

#[test]
fn aliased_fill_has_no_intermediate_pixels() {
    let mut ctx = white_canvas(64);
    ctx.set_antialias(Antialias::None).unwrap();
    ctx.set_source_rgb(1.0, 0.0, 0.0).unwrap();
    ctx.arc((32.0, 32.0), 20.3, 0.0, std::f64::consts::TAU).unwrap();
    ctx.fill().unwrap();
    let target = ctx.target();
    for y in 0..64 {
        for x in 0..64 {
            let c = target.pixel(x, y);
            assert!(is_white(c) || is_red(c), "({x}, {y}): {c:?}");
        }
    }
}

fn star(ctx: &mut Context) {
    let (cx, cy, r) = (50.0, 50.0, 40.0);
    for i in 0..5 {
        let angle = -std::f64::consts::FRAC_PI_2 + i as f64 * 4.0 * std::f64::consts::PI / 5.0;
        let p = (cx + r * angle.cos(), cy + r * angle.sin());
        if i == 0 {
            ctx.move_to(p).unwrap();
        } else {
            ctx.line_to(p).unwrap();
        }
    }
    ctx.close_path().unwrap();
}

#[test]
fn star_fill_rules() {
    for (rule, center_filled) in [(FillRule::NonZero, true), (FillRule::EvenOdd, false)] {
        let mut ctx = white_canvas(100);
        ctx.set_source_rgb(1.0, 0.0, 0.0).unwrap();
        ctx.set_fill_rule(rule).unwrap();
        star(&mut ctx);
        ctx.fill().unwrap();
        let target = ctx.target();
        assert_eq!(is_red(target.pixel(50, 50)), center_filled, "{rule:?}");
        // The top point of the star is covered under either rule.
        assert!(is_red(target.pixel(49, 20)), "{rule:?}");
        assert!(is_white(target.pixel(2, 2)), "{rule:?}");
    }
}

#[test]
fn coverage_grows_with_the_shape() {
    // Widening a rectangle inside one pixel never lowers that pixel's coverage.
    let mut last = 1.0;
    for step in 0..=8 {
        let mut ctx = white_canvas(16);
        ctx.set_antialias(Antialias::Best).unwrap();
        ctx.set_source_rgb(0.0, 0.0, 0.0).unwrap();
        ctx.rectangle(4.0, 4.0, 1.0 + step as f64 / 8.0, 4.0).unwrap();
        ctx.fill().unwrap();
        let g = ctx.target().pixel(5, 5).g;
        assert!(g <= last, "step {step}: {g} > {last}");
        last = g;
    }
    assert_eq!(last, 0.0);
}

#[test]
fn stroke_with_butt_caps() {
    let mut ctx = white_canvas(100);
    ctx.set_source_rgb(1.0, 0.0, 0.0).unwrap();
    ctx.set_line_width(10.0).unwrap();
    ctx.set_line_cap(LineCap::Butt).unwrap();
    ctx.move_to((10.0, 50.0)).unwrap();
    ctx.line_to((90.0, 50.0)).unwrap();
    ctx.stroke().unwrap();
    let target = ctx.target();
    assert!(is_red(target.pixel(50, 47)));
    assert!(is_red(target.pixel(50, 52)));
    assert!(is_white(target.pixel(50, 40)));
    assert!(is_white(target.pixel(5, 50)));
    assert!(is_white(target.pixel(95, 50)));
    assert!(!ctx.has_current_point());
}

#[test]
fn square_caps_extend_the_line() {
    let mut ctx = white_canvas(100);
    ctx.set_source_rgb(1.0, 0.0, 0.0).unwrap();
    ctx.set_line_width(10.0).unwrap();
    ctx.set_line_cap(LineCap::Square).unwrap();
    ctx.move_to((10.0, 50.0)).unwrap();
    ctx.line_to((90.0, 50.0)).unwrap();
    ctx.stroke().unwrap();
    assert!(is_red(ctx.target().pixel(7, 50)));
    assert!(is_white(ctx.target().pixel(3, 50)));
}

#[test]
fn dashed_stroke() {
    let mut ctx = white_canvas(100);
    ctx.set_source_rgb(1.0, 0.0, 0.0).unwrap();
    ctx.set_line_width(4.0).unwrap();
    ctx.set_dash(&[10.0, 10.0], 0.0).unwrap();
    ctx.move_to((0.0, 50.0)).unwrap();
    ctx.line_to((100.0, 50.0)).unwrap();
    ctx.stroke().unwrap();
    let target = ctx.target();
    assert!(is_red(target.pixel(5, 50)));
    assert!(is_white(target.pixel(15, 50)));
    assert!(is_red(target.pixel(25, 50)));
}

#[test]
fn clip_limits_paint() {
    let mut ctx = white_canvas(100);
    ctx.rectangle(0.0, 0.0, 50.0, 100.0).unwrap();
    ctx.clip().unwrap();
    ctx.set_source_rgb(1.0, 0.0, 0.0).unwrap();
    ctx.paint().unwrap();
    assert!(is_red(ctx.target().pixel(25, 50)));
    assert!(is_white(ctx.target().pixel(75, 50)));

    ctx.reset_clip().unwrap();
    ctx.set_source_rgb(0.0, 0.0, 1.0).unwrap();
    ctx.paint().unwrap();
    assert_eq!(ctx.target().pixel(75, 50).as_rgba_u32(), 0x0000ffff);
}

#[test]
fn clip_is_restored() {
    let mut ctx = white_canvas(20);
    ctx.save().unwrap();
    ctx.rectangle(0.0, 0.0, 5.0, 5.0).unwrap();
    ctx.clip().unwrap();
    ctx.restore().unwrap();
    ctx.set_source_rgb(1.0, 0.0, 0.0).unwrap();
    ctx.paint().unwrap();
    assert!(is_red(ctx.target().pixel(15, 15)));
}

#[test]
fn transformed_fill() {
    let mut ctx = white_canvas(100);
    ctx.translate(50.0, 50.0).unwrap();
    ctx.scale(10.0, 10.0).unwrap();
    ctx.set_source_rgb(1.0, 0.0, 0.0).unwrap();
    ctx.rectangle(0.0, 0.0, 1.0, 1.0).unwrap();
    ctx.fill().unwrap();
    let target = ctx.target();
    assert!(is_red(target.pixel(55, 55)));
    assert!(is_white(target.pixel(45, 55)));
    assert!(is_white(target.pixel(61, 55)));
}

#[test]
fn source_operator_replaces() {
    let mut ctx = white_canvas(10);
    ctx.set_operator(Operator::Source).unwrap();
    ctx.set_source_rgba(0.0, 0.0, 1.0, 0.5).unwrap();
    ctx.rectangle(0.0, 0.0, 5.0, 10.0).unwrap();
    ctx.fill().unwrap();
    let c = ctx.target().pixel(2, 2);
    assert_eq!(c.b, 1.0);
    assert_eq!(c.r, 0.0);
    assert!((c.a - 0.5).abs() < 1.0 / 255.0);
    // Pixels outside the shape are left alone.
    assert!(is_white(ctx.target().pixel(7, 2)));
}

#[test]
fn clear_operator_erases() {
    let mut ctx = white_canvas(10);
    ctx.set_operator(Operator::Clear).unwrap();
    ctx.rectangle(2.0, 2.0, 4.0, 4.0).unwrap();
    ctx.fill().unwrap();
    assert_eq!(ctx.target().pixel(3, 3), Color::TRANSPARENT);
    assert!(is_white(ctx.target().pixel(8, 8)));
}

#[test]
fn paint_with_alpha_blends() {
    let mut ctx = white_canvas(4);
    ctx.set_source_rgb(0.0, 0.0, 0.0).unwrap();
    ctx.paint_with_alpha(0.5).unwrap();
    let c = ctx.target().pixel(1, 1);
    assert!((c.r - 0.5).abs() <= 1.0 / 255.0, "{c:?}");
    assert_eq!(c.a, 1.0);
}

#[test]
fn glyphs_are_filled() {
    use piet_raster::{Glyph, Path};

    let mut outline = Path::new();
    outline.rectangle(0.0, 0.0, 4.0, 4.0);
    let glyphs = [
        Glyph::new(outline.clone(), (2.0, 2.0)),
        Glyph::new(outline, (10.0, 2.0)),
    ];
    let mut ctx = white_canvas(20);
    ctx.set_source_rgb(1.0, 0.0, 0.0).unwrap();
    ctx.move_to((1.0, 1.0)).unwrap();
    ctx.show_glyphs(&glyphs).unwrap();
    let target = ctx.target();
    assert!(is_red(target.pixel(3, 3)));
    assert!(is_white(target.pixel(8, 3)));
    assert!(is_red(target.pixel(12, 3)));
    // The current path is untouched.
    assert_eq!(ctx.current_point(), Some(piet_raster::kurbo::Point::new(1.0, 1.0)));
}
