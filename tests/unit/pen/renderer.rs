use super::*;
use crate::foundation::error::PenError;
use crate::render::device::ValueKind;

const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

fn renderer() -> PenRenderer {
    PenRenderer::new(PenRendererOpts::default()).unwrap()
}

#[test]
fn only_sizes_one_and_three_are_offset() {
    assert_eq!(alignment_offset(1.0), 0.5);
    assert_eq!(alignment_offset(3.0), 0.5);
    assert_eq!(alignment_offset(2.0), 0.0);
    assert_eq!(alignment_offset(1.5), 0.0);
}

#[test]
fn degenerate_lines_are_dropped() {
    let mut r = renderer();
    r.queue_line(1.0, 1.0, 1.0, 1.0, 4.0, RED);
    r.queue_line(0.0, 0.0, f64::NAN, 1.0, 4.0, RED);
    r.queue_point(f64::INFINITY, 0.0, 4.0, RED);
    assert!(r.queued().is_empty());
}

#[test]
fn clear_discards_pending_nodes() {
    let mut r = renderer();
    r.queue_line(0.0, 0.0, 5.0, 0.0, 2.0, RED);
    r.queue_point(0.0, 0.0, 2.0, RED);
    r.queue_clear();
    r.queue_point(1.0, 1.0, 2.0, RED);
    let kinds: Vec<_> = r.queued().iter().map(PathNode::kind).collect();
    assert_eq!(kinds, ["clear", "point"]);
}

#[test]
fn empty_flush_is_a_no_op() {
    let mut r = renderer();
    r.flush();
    assert!(!r.is_dirty());
    assert_eq!(r.stats(), PenStats::default());
    assert!(r.canvas().data().iter().all(|&b| b == 0));
}

#[test]
fn flush_marks_dirty_and_sampling_refreshes_lazily() {
    let mut r = renderer();
    r.queue_point(0.0, 0.0, 4.0, RED);
    r.flush();
    assert!(r.queued().is_empty());
    assert!(r.is_dirty());
    assert!(!r.has_snapshot());

    assert_eq!(r.sample_color(0.0, 0.0), [255, 0, 0, 255]);
    assert!(!r.is_dirty());
    assert_eq!(r.sample_color(0.5, 0.5), [255, 0, 0, 255]);
    assert_eq!(r.stats().snapshot_refreshes, 1);

    r.release_cached_data();
    assert!(!r.has_snapshot());
    r.sample_color(0.0, 0.0);
    assert_eq!(r.stats().snapshot_refreshes, 2);
}

#[test]
fn out_of_canvas_samples_are_transparent_without_refresh() {
    let mut r = renderer();
    assert_eq!(r.sample_color(1000.0, 0.0), [0, 0, 0, 0]);
    assert_eq!(r.sample_color(f64::NAN, 0.0), [0, 0, 0, 0]);
    assert_eq!(r.stats().snapshot_refreshes, 0);
}

#[test]
fn flush_restores_device_state() {
    let mut r = renderer();
    let before = r.device().state();
    r.queue_line(-10.0, 0.0, 10.0, 0.0, 2.0, RED);
    r.flush();
    assert_eq!(r.device().state(), before);
}

#[test]
fn stats_count_committed_nodes() {
    let mut r = renderer();
    r.queue_line(-10.0, 0.0, 10.0, 0.0, 2.0, RED);
    r.queue_point(0.0, 20.0, 2.0, RED);
    r.flush();
    r.queue_clear();
    r.flush();
    let s = r.stats();
    assert_eq!(s.flushes, 2);
    assert_eq!(s.nodes_committed, 3);
    assert_eq!((s.lines_drawn, s.points_drawn, s.clears), (1, 1, 1));
}

#[test]
fn line_uniforms_premultiply_and_measure() {
    let u = line_uniforms(
        Point::new(1.0, 2.0),
        Point::new(4.0, 6.0),
        3.0,
        [1.0, 0.5, 0.0, 0.5],
    );
    assert_eq!(u.pen_points, [1.0, 2.0, 3.0, 4.0]);
    assert_eq!(u.pen_color, [0.5, 0.25, 0.0, 0.5]);
    assert_eq!(u.pen_size, 3.0);
    assert_eq!(u.line_length, 5.0);
}

#[test]
fn render_quality_scales_the_canvas() {
    let r = PenRenderer::new(PenRendererOpts::default().with_render_quality(2.0)).unwrap();
    assert_eq!((r.canvas().width(), r.canvas().height()), (960, 720));
    assert_eq!(r.scratch_to_canvas(0.0, 0.0), Point::new(480.0, 360.0));
}

#[test]
fn construction_failures_are_typed() {
    let err = PenRenderer::new(PenRendererOpts::default().with_render_quality(0.0)).unwrap_err();
    assert!(matches!(err, PenError::Validation(_)));

    let broken = ProgramDesc {
        name: "pen_line",
        attributes: &[("a_position", ValueKind::Vec2)],
        uniforms: LINE_PROGRAM.uniforms,
    };
    let err = PenRenderer::with_line_program(PenRendererOpts::default(), broken).unwrap_err();
    assert!(matches!(err, PenError::Shader(_)));
}

#[test]
fn quality_override_accepts_only_positive_numbers() {
    let base = PenRendererOpts::default();
    assert_eq!(base.with_quality_override(Some(" 2.5 ")).render_quality, 2.5);
    assert_eq!(base.with_quality_override(Some("-1")).render_quality, 1.0);
    assert_eq!(base.with_quality_override(Some("fast")).render_quality, 1.0);
    assert_eq!(base.with_quality_override(None).render_quality, 1.0);
}

#[test]
fn opts_deserialize_with_defaults() {
    let opts: PenRendererOpts = serde_json::from_str(r#"{ "render_quality": 2.0 }"#).unwrap();
    assert_eq!(opts.stage, StageSize::default());
    assert_eq!(opts.render_quality, 2.0);
}
