//! Interpreter behavior over small hand-written G-code programs.

use glam::DVec3;

use gcodepreview_renderer::{bounds_of, interpret, Segment};

#[test]
fn absolute_extrusion_emits_one_segment() {
    let toolpath = interpret("G90\nG1 X10 Y10 E1");
    assert_eq!(toolpath.segments.len(), 1);
    assert_eq!(toolpath.segments[0].start, DVec3::ZERO);
    assert_eq!(toolpath.segments[0].end, DVec3::new(10.0, 10.0, 0.0));
}

#[test]
fn relative_moves_accumulate_from_current_position() {
    let toolpath = interpret("G0 X10 Y10\nG91\nG1 X5 E1");
    assert_eq!(toolpath.segments.len(), 1);
    assert_eq!(toolpath.segments[0].start, DVec3::new(10.0, 10.0, 0.0));
    assert_eq!(toolpath.segments[0].end, DVec3::new(15.0, 10.0, 0.0));
}

#[test]
fn travel_moves_emit_nothing() {
    let toolpath = interpret("G0 X50 Y50\nG1 X80 Y80\nG1 X90 Y90 E0\nG1 X95 Y95 E-2");
    assert!(toolpath.segments.is_empty());
    assert!(toolpath.bounds.is_none());
}

#[test]
fn extrusion_without_axis_motion_emits_nothing() {
    let toolpath = interpret("G1 E5");
    assert!(toolpath.segments.is_empty());
}

#[test]
fn negative_destination_is_treated_as_purge() {
    let toolpath = interpret("G1 X-5 Y10 E1\nG1 X10 Y10 E1");
    // The purge move is dropped, but the position still advanced, so the
    // next segment starts where the purge ended.
    assert_eq!(toolpath.segments.len(), 1);
    assert_eq!(toolpath.segments[0].start, DVec3::new(-5.0, 10.0, 0.0));
    assert_eq!(toolpath.segments[0].end, DVec3::new(10.0, 10.0, 0.0));
}

#[test]
fn set_position_and_unknown_words_are_ignored() {
    let toolpath = interpret("G92 E0\nM104 S200\n; comment line\n\nG1 X5 Y5 E1");
    assert_eq!(toolpath.segments.len(), 1);
    assert_eq!(toolpath.segments[0].end, DVec3::new(5.0, 5.0, 0.0));
}

#[test]
fn clockwise_arc_expands_to_chained_sub_segments() {
    let toolpath = interpret("G2 X10 Y0 I5 J0 E1");

    // Semicircle of radius 5: arc length ~15.7 at 1 unit per sub-segment.
    assert_eq!(toolpath.segments.len(), 15);

    // Sub-segments chain without gaps and land exactly on the endpoint.
    for pair in toolpath.segments.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
    assert_eq!(toolpath.segments[0].start, DVec3::ZERO);
    assert_eq!(
        toolpath.segments.last().unwrap().end,
        DVec3::new(10.0, 0.0, 0.0)
    );

    // Every interior endpoint stays on the circle around (5, 0).
    let center = DVec3::new(5.0, 0.0, 0.0);
    for segment in &toolpath.segments {
        let radius = (segment.end - center).length();
        assert!((radius - 5.0).abs() < 1e-9, "off-circle radius {radius}");
    }
}

#[test]
fn counter_clockwise_arc_reaches_commanded_end() {
    let toolpath = interpret("G3 X0 Y10 I0 J5 E1");
    assert_eq!(toolpath.segments.len(), 15);
    assert_eq!(
        toolpath.segments.last().unwrap().end,
        DVec3::new(0.0, 10.0, 0.0)
    );
}

#[test]
fn arc_without_center_offset_degrades_to_chord() {
    let toolpath = interpret("G2 X10 Y0 E1");
    assert_eq!(toolpath.segments.len(), 1);
    assert_eq!(toolpath.segments[0].start, DVec3::ZERO);
    assert_eq!(toolpath.segments[0].end, DVec3::new(10.0, 0.0, 0.0));
}

#[test]
fn arc_without_extrusion_still_advances_position() {
    let toolpath = interpret("G2 X10 Y0 I5 J0\nG1 X20 Y0 E1");
    assert_eq!(toolpath.segments.len(), 1);
    assert_eq!(toolpath.segments[0].start, DVec3::new(10.0, 0.0, 0.0));
    assert_eq!(toolpath.segments[0].end, DVec3::new(20.0, 0.0, 0.0));
}

#[test]
fn bounds_cover_all_segment_endpoints() {
    let segments = [
        Segment {
            start: DVec3::new(0.0, 0.0, 0.0),
            end: DVec3::new(1.0, 1.0, 1.0),
        },
        Segment {
            start: DVec3::new(2.0, 2.0, 2.0),
            end: DVec3::new(3.0, -1.0, 0.0),
        },
    ];
    let bounds = bounds_of(&segments).unwrap();
    assert_eq!(bounds.min, DVec3::new(0.0, -1.0, 0.0));
    assert_eq!(bounds.max, DVec3::new(3.0, 2.0, 2.0));
}

#[test]
fn empty_toolpath_has_no_bounds() {
    assert!(bounds_of(&[]).is_none());
    assert!(interpret("").bounds.is_none());
}
