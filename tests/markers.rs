use std::time::Instant;

use iced::{Point, Rectangle, Size};
use iced_markers::{
    AxesId, AxisScale, Curve, Direction, Figure, InteractionController, MarkerError,
    MarkerEvent, MarkerManager, MarkerOption, MarkerParams, MarkerTarget, space_labels,
};

fn full() -> Rectangle {
    Rectangle::new(Point::ORIGIN, Size::new(1.0, 1.0))
}

fn ramp(n: usize) -> Curve {
    let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
    Curve::from_xy(&x, &x)
}

fn single(curves: Vec<Curve>) -> (Figure, MarkerManager, AxesId) {
    let mut figure = Figure::default();
    let a = figure.add_axes(full());
    for c in curves {
        figure.add_curve(a, c).unwrap();
    }
    let manager = MarkerManager::enable(&mut figure, MarkerParams::default(), &[], false).unwrap();
    (figure, manager, a)
}

#[test]
fn snap_ties_resolve_to_first_curve() {
    let a = Curve::from_xy(&[1.0, 5.0], &[0.0, 0.0]);
    let b = Curve::from_xy(&[3.0, 6.0], &[0.0, 0.0]);
    let (figure, mut manager, axes) = single(vec![a, b]);

    manager
        .add_marker(&figure, axes, MarkerTarget::x(2.0))
        .unwrap();
    let marker = manager.active_marker(axes).unwrap();
    assert_eq!(marker.x(), 1.0);
    assert_eq!(marker.indices(), vec![0, 0]);
}

#[test]
fn snap_uses_distance_in_both_axes_when_y_is_given() {
    let curve = Curve::from_xy(&[0.0, 1.0, 2.0], &[0.0, 10.0, 0.0]);
    let (figure, mut manager, axes) = single(vec![curve]);

    manager
        .add_marker(&figure, axes, MarkerTarget::xy(0.6, 9.0))
        .unwrap();
    assert_eq!(manager.active_marker(axes).unwrap().index(), 1);

    manager
        .add_marker(&figure, axes, MarkerTarget::xy(0.6, 0.0))
        .unwrap();
    assert_eq!(manager.active_marker(axes).unwrap().index(), 0);
}

#[test]
fn index_mode_keeps_curves_on_one_index() {
    let (mut figure, mut manager, axes) = single(vec![ramp(10), ramp(5)]);
    manager
        .set_params(&figure, axes, [MarkerOption::IndexOnlyMode(true)])
        .unwrap();

    manager.add_marker_at_index(&figure, axes, 2).unwrap();
    manager
        .shift_linked(&figure, axes, Direction::Forward)
        .unwrap();
    assert_eq!(manager.active_marker(axes).unwrap().indices(), vec![3, 3]);

    // Clamped to the shortest curve.
    manager
        .move_linked(&figure, axes, MarkerTarget::Index(8))
        .unwrap();
    let marker = manager.active_marker(axes).unwrap();
    assert_eq!(marker.indices(), vec![4, 4]);
    assert_eq!(marker.x(), 4.0);

    // Shifting past the end is a no-op without wrap-around.
    manager
        .shift_linked(&figure, axes, Direction::Forward)
        .unwrap();
    assert_eq!(manager.active_marker(axes).unwrap().indices(), vec![4, 4]);

    manager
        .set_params(&figure, axes, [MarkerOption::AllowWrapAround(true)])
        .unwrap();
    manager
        .shift_linked(&figure, axes, Direction::Forward)
        .unwrap();
    assert_eq!(manager.active_marker(axes).unwrap().indices(), vec![0, 0]);

    figure.set_x_lim(axes, -1.0, 20.0).unwrap();
    manager.sync(&figure).unwrap();
    assert_eq!(manager.active_marker(axes).unwrap().indices(), vec![0, 0]);
}

#[test]
fn shift_round_trip_returns_to_start() {
    let (figure, mut manager, axes) = single(vec![Curve::from_xy(
        &(0..=10).map(f64::from).collect::<Vec<_>>(),
        &[1.0; 11],
    )]);
    manager
        .add_marker(&figure, axes, MarkerTarget::x(5.0))
        .unwrap();

    manager
        .shift_linked(&figure, axes, Direction::Forward)
        .unwrap();
    assert_eq!(manager.active_marker(axes).unwrap().x(), 6.0);
    manager
        .shift_linked(&figure, axes, Direction::Backward)
        .unwrap();
    let marker = manager.active_marker(axes).unwrap();
    assert_eq!(marker.x(), 5.0);
    assert_eq!(marker.index(), 5);
}

#[test]
fn reversed_x_inverts_shift_direction() {
    let (figure, mut manager, axes) = single(vec![ramp(11)]);
    manager
        .set_params(&figure, axes, [MarkerOption::XReversed(true)])
        .unwrap();
    manager
        .add_marker(&figure, axes, MarkerTarget::x(5.0))
        .unwrap();
    manager
        .shift_linked(&figure, axes, Direction::Forward)
        .unwrap();
    assert_eq!(manager.active_marker(axes).unwrap().x(), 4.0);
}

#[test]
fn value_mode_shift_uses_largest_step() {
    let fine = Curve::from_xy(&[0.0, 0.5, 1.0, 1.5, 2.0], &[0.0; 5]);
    let coarse = Curve::from_xy(&[0.0, 2.0], &[1.0; 2]);
    let (figure, mut manager, axes) = single(vec![fine, coarse]);
    manager
        .add_marker(&figure, axes, MarkerTarget::x(0.0))
        .unwrap();
    manager
        .shift_linked(&figure, axes, Direction::Forward)
        .unwrap();
    let marker = manager.active_marker(axes).unwrap();
    assert_eq!(marker.x(), 2.0);
    assert_eq!(marker.indices(), vec![4, 1]);
}

#[test]
fn out_of_domain_hides_only_that_curve() {
    let (figure, mut manager, axes) = single(vec![ramp(11), ramp(6)]);
    manager
        .add_marker(&figure, axes, MarkerTarget::x(8.0))
        .unwrap();
    let marker = manager.active_marker(axes).unwrap();
    let [long, short] = marker.traces() else {
        panic!("expected two traces");
    };
    assert!(long.dot.visible && long.label.visible);
    assert!(!short.dot.visible && !short.label.visible);
    assert_eq!(short.index, 5);
}

#[test]
fn non_finite_sample_hides_its_readout() {
    let curve = Curve::from_xy(&[0.0, 1.0, 2.0], &[0.0, f64::NAN, 2.0]);
    let (figure, mut manager, axes) = single(vec![curve]);
    manager
        .add_marker(&figure, axes, MarkerTarget::x(1.0))
        .unwrap();
    let trace = &manager.active_marker(axes).unwrap().traces()[0];
    assert_eq!(trace.index, 1);
    assert!(!trace.dot.visible);
    assert!(!trace.label.visible);
}

#[test]
fn close_value_labels_do_not_overlap() {
    let x = [0.0, 1.0, 2.0];
    let a = Curve::from_xy(&x, &[5.0; 3]);
    let b = Curve::from_xy(&x, &[5.1; 3]);
    let (mut figure, mut manager, axes) = single(vec![a, b]);
    figure.set_y_lim(axes, 0.0, 10.0).unwrap();
    manager
        .add_marker(&figure, axes, MarkerTarget::x(1.0))
        .unwrap();
    let marker = manager.active_marker(axes).unwrap();
    let [a, b] = marker.traces() else {
        panic!("expected two traces");
    };
    let gap = (b.label.anchor.y - a.label.anchor.y).abs();
    assert!(gap >= a.label.size.y - 1e-9);
    assert!(b.label.anchor.y > a.label.anchor.y);
}

#[test]
fn label_solver_spreads_a_dense_stack() {
    let out = space_labels(&[0.0, 0.01, 0.02], 0.05, None);
    let expected = [-0.05, 0.0, 0.05];
    for (got, want) in out.iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "{out:?}");
    }
}

#[test]
fn empty_axes_reject_markers() {
    let (figure, mut manager, axes) = single(vec![]);
    assert_eq!(
        manager.add_marker(&figure, axes, MarkerTarget::x(1.0)),
        Err(MarkerError::NoEligibleCurves { axes })
    );
}

#[test]
fn unsupported_scale_fails_before_geometry() {
    let (mut figure, mut manager, axes) = single(vec![ramp(5)]);
    figure.set_x_scale(axes, AxisScale::Logit).unwrap();
    assert_eq!(
        manager.add_marker(&figure, axes, MarkerTarget::x(1.0)),
        Err(MarkerError::UnsupportedScaleKind {
            axes,
            scale: AxisScale::Logit
        })
    );
}

#[test]
fn log_axes_are_supported() {
    let x: Vec<f64> = (1..=100).map(f64::from).collect();
    let y: Vec<f64> = x.iter().map(|v| v * v).collect();
    let (mut figure, mut manager, axes) = single(vec![Curve::from_xy(&x, &y)]);
    figure.set_x_scale(axes, AxisScale::Log10).unwrap();
    figure.set_y_scale(axes, AxisScale::Log10).unwrap();
    manager
        .add_marker(&figure, axes, MarkerTarget::x(10.2))
        .unwrap();
    let marker = manager.active_marker(axes).unwrap();
    assert_eq!(marker.x(), 10.0);
    assert!(marker.traces()[0].label.visible);
}

fn linked_pair(a_len: usize, b_len: usize) -> (Figure, MarkerManager, AxesId, AxesId) {
    let (mut figure, ids) = Figure::subplots(Size::new(400.0, 400.0), 2, 1);
    let xa: Vec<f64> = (0..a_len).map(|i| i as f64 * 0.1).collect();
    let xb: Vec<f64> = (0..b_len).map(|i| i as f64 * 0.2).collect();
    let sin: Vec<f64> = xa.iter().map(|v| v.sin()).collect();
    let cos: Vec<f64> = xb.iter().map(|v| v.cos()).collect();
    figure.add_curve(ids[0], Curve::from_xy(&xa, &sin)).unwrap();
    figure.add_curve(ids[1], Curve::from_xy(&xb, &cos)).unwrap();
    let manager = MarkerManager::enable(&mut figure, MarkerParams::default(), &[], true).unwrap();
    (figure, manager, ids[0], ids[1])
}

#[test]
fn linked_groups_share_the_sample_index() {
    let (figure, mut manager, a, b) = linked_pair(100, 50);
    let outcome = manager
        .add_linked(&figure, a, MarkerTarget::Index(10))
        .unwrap();
    assert!(outcome.errors.is_empty());
    assert_eq!(manager.active_marker(a).unwrap().index(), 10);
    assert_eq!(manager.active_marker(b).unwrap().index(), 10);

    manager
        .shift_linked(&figure, b, Direction::Forward)
        .unwrap();
    assert_eq!(manager.active_marker(b).unwrap().index(), 11);
    assert_eq!(manager.active_marker(a).unwrap().index(), 11);
}

#[test]
fn linked_add_and_delete_propagate_both_ways() {
    let (figure, mut manager, a, b) = linked_pair(20, 20);
    assert!(manager.links().is_linked(a, b));
    assert!(manager.links().is_linked(b, a));

    manager.add_linked(&figure, a, MarkerTarget::x(0.5)).unwrap();
    manager.add_linked(&figure, b, MarkerTarget::x(1.0)).unwrap();
    for id in [a, b] {
        let set = manager.markers(id).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.active_index(), Some(1));
    }

    manager.activate_linked(b, Some(0)).unwrap();
    assert_eq!(manager.markers(a).unwrap().active_index(), Some(0));

    manager.delete_linked(&figure, b).unwrap();
    for id in [a, b] {
        let set = manager.markers(id).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.active_index(), Some(0));
    }
}

#[test]
fn unlinked_groups_stay_independent() {
    let (mut figure, ids) = Figure::subplots(Size::new(400.0, 400.0), 1, 2);
    for id in &ids {
        figure.add_curve(*id, ramp(10)).unwrap();
    }
    let mut manager =
        MarkerManager::enable(&mut figure, MarkerParams::default(), &[], false).unwrap();
    manager
        .add_linked(&figure, ids[0], MarkerTarget::x(3.0))
        .unwrap();
    assert_eq!(manager.markers(ids[0]).unwrap().len(), 1);
    assert!(manager.markers(ids[1]).unwrap().is_empty());
}

#[test]
fn click_on_one_subplot_marks_every_linked_subplot() {
    let (mut figure, ids) = Figure::subplots(Size::new(400.0, 400.0), 2, 1);
    for id in &ids {
        let x: Vec<f64> = (0..=10).map(f64::from).collect();
        figure.add_curve(*id, Curve::from_xy(&x, &[5.0; 11])).unwrap();
        figure.set_x_lim(*id, 0.0, 10.0).unwrap();
        figure.set_y_lim(*id, 0.0, 10.0).unwrap();
    }
    let mut manager =
        MarkerManager::enable(&mut figure, MarkerParams::default(), &[], true).unwrap();
    let mut controller = InteractionController::new();
    let now = Instant::now();

    let center = figure.device_bounds(ids[1]).unwrap().center();
    for event in [
        MarkerEvent::PointerPressed(center),
        MarkerEvent::PointerReleased(center),
    ] {
        controller
            .handle(&figure, &mut manager, event, now)
            .unwrap();
    }
    for id in &ids {
        let marker = manager.active_marker(*id).unwrap();
        assert_eq!(marker.x(), 5.0);
    }
}
