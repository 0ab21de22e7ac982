//! Annotation placement and drawing, checked on recording and raster surfaces
//!
//! Run with logs: RUST_LOG=cartouche=debug cargo test --features tracing --test annotation_layout -- --nocapture

use cartouche::render::annotation::{place_icon, resolve_offset};
use cartouche::{
    Alignment, Annotation, AnnotationRenderer, CanvasOffset, CanvasPoint, Color, CurveControl, Direction,
    IconAsset, LeaderOffset, Length, PixmapSurface, RecordingSurface, Surface, SvgIcon, Theme,
};
use glam::DAffine2;

const FLAG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="12" height="8">
    <rect width="12" height="8" fill="#006600"/>
</svg>"##;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn renderer() -> AnnotationRenderer {
    init_tracing();
    AnnotationRenderer::default()
}

#[test]
fn leader_ends_at_the_offset_label_point() {
    let renderer = renderer();
    let anchor = CanvasPoint::pt(100.0, 100.0);
    for direction in Direction::ALL {
        let annotation = Annotation::new(anchor, direction, Length::pt(50.0), "Label");
        let layout = renderer.measure(&annotation, None).unwrap();
        let expected = anchor + resolve_offset(direction, LeaderOffset::Along(Length::pt(50.0)));
        assert_eq!(layout.label_point, expected, "{direction}");
        assert_eq!(layout.leader.end, layout.label_point);
        assert_eq!(layout.leader.start, anchor);
    }
}

#[test]
fn vertical_offsets_move_only_y() {
    let up = resolve_offset(Direction::Up, Length::pt(30.0).into());
    let down = resolve_offset(Direction::Down, Length::pt(30.0).into());
    assert_eq!(up.dx, Length::ZERO);
    assert_eq!(down.dx, Length::ZERO);
    assert_eq!(up.dy, -down.dy);
}

#[test]
fn down_left_aligned_label_hangs_below_the_line() {
    let renderer = renderer();
    let metrics = *renderer.metrics();
    let annotation = Annotation::new(CanvasPoint::pt(100.0, 100.0), Direction::Down, Length::pt(50.0), "Porto");
    let layout = renderer.measure(&annotation, None).unwrap();
    assert_eq!(layout.label_point, CanvasPoint::pt(100.0, 150.0));
    assert_eq!(
        layout.text_origin,
        CanvasPoint::new(Length::pt(100.0) + metrics.horizontal_margin, Length::pt(150.0) + metrics.vertical_margin)
    );
}

#[test]
fn draws_leader_then_marker_then_text() {
    let renderer = renderer();
    let annotation = Annotation::new(CanvasPoint::pt(100.0, 100.0), Direction::Down, Length::pt(50.0), "Porto");
    let mut surface = RecordingSurface::new();
    let layout = renderer.render(&mut surface, &annotation, None).unwrap();

    let head: Vec<String> = surface.ops().iter().take(3).map(|op| op.to_string()).collect();
    insta::assert_snapshot!(head.join("\n"), @r"
    stroke rgb(255,255,255) w=1.50 cap=Round M100.00,100.00 C100.00,100.00 100.00,150.00 100.00,150.00
    stroke rgb(255,255,255) w=1.50 cap=Round A100.00,100.00 r=2.25 Z
    fill rgb(0,0,0) A100.00,100.00 r=1.50 Z
    ");

    // One bar per glyph, starting at the text origin and within the line
    let text_ops = &surface.ops()[3..];
    assert_eq!(text_ops.len(), 5);
    for op in text_ops {
        let bb = op.bounds();
        assert!(op.is_fill());
        assert_eq!(op.color, Color::WHITE);
        assert!(bb.min.x >= layout.text_origin.x, "{op}");
        assert!(bb.min.y >= layout.text_origin.y, "{op}");
        assert!(bb.max.y <= layout.text_origin.y + layout.text_size.h, "{op}");
    }
}

#[test]
fn marker_can_be_turned_off() {
    let renderer = renderer();
    let annotation = Annotation::new(CanvasPoint::pt(10.0, 10.0), Direction::Right, Length::pt(20.0), "A")
        .with_marker(false);
    let mut surface = RecordingSurface::new();
    renderer.render(&mut surface, &annotation, None).unwrap();

    let strokes = surface.ops().iter().filter(|op| op.is_stroke()).count();
    assert_eq!(strokes, 1);
    assert_eq!(surface.ops().len(), 2);
}

#[test]
fn curve_control_bends_the_leader() {
    let renderer = renderer();
    let curve = CurveControl::new(Some(CanvasOffset::pt(0.0, -20.0)), Some(CanvasOffset::pt(-10.0, 0.0)));
    let annotation = Annotation::new(CanvasPoint::pt(0.0, 100.0), Direction::Right, Length::pt(40.0), "Bend")
        .with_curve(curve)
        .with_marker(false);
    let mut surface = RecordingSurface::new();
    renderer.render(&mut surface, &annotation, None).unwrap();

    insta::assert_snapshot!(surface.ops()[0].to_string(), @"stroke rgb(255,255,255) w=1.50 cap=Round M0.00,100.00 C0.00,80.00 30.00,100.00 40.00,100.00");
}

#[test]
fn icon_sits_between_line_end_and_text() {
    let renderer = renderer();
    let metrics = *renderer.metrics();
    let mut icon = SvgIcon::parse(FLAG.as_bytes()).unwrap();
    let annotation = Annotation::new(CanvasPoint::pt(0.0, 50.0), Direction::Right, Length::pt(30.0), "Lagos");

    let without = renderer.measure(&annotation, None).unwrap();
    let mut surface = RecordingSurface::new();
    let layout = renderer.render(&mut surface, &annotation, Some(&mut icon)).unwrap();

    assert_eq!(layout.text_origin.x - without.text_origin.x, Length::pt(12.0) + metrics.icon_gap);
    let icon_position = layout.icon_position.unwrap();
    assert_eq!(icon_position, place_icon(layout.text_origin, &metrics, icon.size()));
    assert_eq!(icon.position(), icon_position);

    // The icon is painted last, in its own colors
    let last = surface.ops().last().unwrap();
    assert_eq!(last.color, Color::rgb8(0x00, 0x66, 0x00));
    assert_eq!(last.bounds().min, icon_position);
    // Clear of the line end
    assert!(last.bounds().min.x > layout.label_point.x);
}

#[test]
fn up_right_aligned_multiline_label() {
    let renderer = renderer();
    let metrics = *renderer.metrics();
    let annotation = Annotation::new(CanvasPoint::pt(200.0, 200.0), Direction::Up, Length::pt(40.0), "Nieuw\nAmsterdam")
        .with_alignment(Alignment::Right);
    let layout = renderer.measure(&annotation, None).unwrap();
    assert_eq!(layout.line_count, 2);
    assert_eq!(layout.text_origin.x, Length::pt(200.0) - layout.text_size.w - metrics.horizontal_margin);
    assert_eq!(layout.text_origin.y, Length::pt(160.0) - layout.text_size.h - metrics.vertical_margin);
}

#[test]
fn surface_state_is_restored() {
    let renderer = renderer().with_theme(Theme::light());
    let mut surface = RecordingSurface::new();
    surface.set_source(Color::rgb8(200, 10, 10));
    let before = surface.source();
    let mut icon = SvgIcon::parse(FLAG.as_bytes()).unwrap();
    let annotation = Annotation::new(CanvasPoint::pt(50.0, 50.0), Direction::Right, Length::pt(10.0), "<b>Bold</b>");
    renderer.render(&mut surface, &annotation, Some(&mut icon)).unwrap();

    assert_eq!(surface.depth(), 0);
    assert_eq!(surface.transform(), DAffine2::IDENTITY);
    assert_eq!(surface.source(), before);
}

#[test]
fn bad_markup_draws_nothing() {
    let renderer = renderer();
    let annotation = Annotation::new(CanvasPoint::pt(0.0, 0.0), Direction::Up, Length::pt(10.0), "<span>open");
    let mut surface = RecordingSurface::new();
    let err = renderer.render(&mut surface, &annotation, None).unwrap_err();
    assert!(matches!(err, cartouche::Error::Markup { .. }));
    assert!(surface.ops().is_empty());
}

#[test]
fn rasterizes_leader_and_marker() {
    let renderer = renderer();
    let mut surface = PixmapSurface::from_px(200.0, 200.0).unwrap();
    let annotation = Annotation::new(CanvasPoint::px(100.0, 100.0), Direction::Down, Length::px(50.0), "Rome");
    renderer.render(&mut surface, &annotation, None).unwrap();

    let pixel = |x, y| {
        let p = surface.pixmap().pixel(x, y).unwrap();
        [p.red(), p.green(), p.blue(), p.alpha()]
    };
    // Marker core
    let core = pixel(100, 100);
    assert!(core[3] >= 250 && core[0] <= 5, "{core:?}");
    // Leader halfway down
    let leader = pixel(100, 125);
    assert!(leader[3] >= 250 && leader[0] >= 250, "{leader:?}");
    // Nothing up and to the left
    assert_eq!(pixel(20, 20), [0, 0, 0, 0]);
    let png = surface.encode_png().unwrap();
    assert!(png.starts_with(b"\x89PNG"));
}

#[test]
fn explicit_offsets_keep_direction_for_placement() {
    let renderer = renderer();
    let offset = CanvasOffset::pt(15.0, -25.0);
    let annotation = Annotation::new(CanvasPoint::pt(40.0, 40.0), Direction::Up, offset, "X");
    let layout = renderer.measure(&annotation, None).unwrap();
    assert_eq!(layout.label_point, CanvasPoint::pt(55.0, 15.0));
    assert!(layout.text_origin.y + layout.text_size.h < layout.label_point.y);
}
