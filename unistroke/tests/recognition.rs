use unistroke::{Path2D, Recognizer};

/// Walk a polyline and emit points every `step` units, roughly the way a
/// pointer capture layer samples a drawn stroke.
fn trace_polyline(corners: &[(f32, f32)], step: f32) -> Path2D {
    let mut points = vec![corners[0]];
    for pair in corners.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        let len = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
        let segments = (len / step).ceil().max(1.0) as usize;
        for s in 1..=segments {
            let t = s as f32 / segments as f32;
            points.push((x0 + t * (x1 - x0), y0 + t * (y1 - y0)));
        }
    }
    Path2D::from_points(&points)
}

fn square_from_origin() -> Path2D {
    trace_polyline(
        &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0), (0.0, 0.0)],
        4.0,
    )
}

fn triangle() -> Path2D {
    trace_polyline(&[(0.0, 0.0), (100.0, 0.0), (50.0, 90.0), (0.0, 0.0)], 4.0)
}

fn caret() -> Path2D {
    trace_polyline(&[(0.0, 80.0), (50.0, 0.0), (100.0, 80.0)], 4.0)
}

fn transformed(path: &Path2D, degrees: f32, scale: f32) -> Path2D {
    let points = path.points();
    let count = points.len() as f32;
    let cx = points.iter().map(|p| p.0).sum::<f32>() / count;
    let cy = points.iter().map(|p| p.1).sum::<f32>() / count;
    let (sin, cos) = degrees.to_radians().sin_cos();
    let moved: Vec<_> = points
        .iter()
        .map(|&(x, y)| {
            let (dx, dy) = (x - cx, y - cy);
            (
                (dx * cos - dy * sin) * scale + cx,
                (dx * sin + dy * cos) * scale + cy,
            )
        })
        .collect();
    Path2D::from_points(&moved)
}

#[test]
fn self_match_is_near_identity() {
    let mut recognizer = Recognizer::new();
    recognizer.add_gesture("caret", &caret());
    let result = recognizer.recognize(&caret());
    assert_eq!(result.name(), Some("caret"));
    assert!(result.score >= 0.95, "score {}", result.score);
}

#[test]
fn small_rotation_still_matches() {
    let mut recognizer = Recognizer::new();
    recognizer.add_gesture("triangle", &triangle());
    let result = recognizer.recognize(&transformed(&triangle(), 10.0, 1.0));
    assert_eq!(result.name(), Some("triangle"));
    assert!(result.score >= 0.8, "score {}", result.score);
}

#[test]
fn uniform_scaling_still_matches() {
    let mut recognizer = Recognizer::new();
    recognizer.add_gesture("caret", &caret());
    for scale in [0.5, 2.0] {
        let result = recognizer.recognize(&transformed(&caret(), 0.0, scale));
        assert_eq!(result.name(), Some("caret"), "scale {scale}");
        assert!(result.score >= 0.8, "scale {scale} score {}", result.score);
    }
}

#[test]
fn empty_store_returns_no_match() {
    let recognizer = Recognizer::new();
    let result = recognizer.recognize(&caret());
    assert!(!result.is_match());
    assert_eq!(result.name(), None);
    assert_eq!(result.score, 0.0);
}

#[test]
fn recognition_is_deterministic() {
    let mut recognizer = Recognizer::new();
    recognizer.add_gesture("square", &square_from_origin());
    recognizer.add_gesture("triangle", &triangle());
    let query = transformed(&square_from_origin(), 7.0, 1.3);
    let first = recognizer.recognize(&query);
    let second = recognizer.recognize(&query);
    assert_eq!(first.name(), second.name());
    assert_eq!(first.score.to_bits(), second.score.to_bits());
}

#[test]
fn picks_the_closest_of_several_templates() {
    let mut recognizer = Recognizer::new();
    recognizer.add_gesture("square", &square_from_origin());
    recognizer.add_gesture("triangle", &triangle());
    recognizer.add_gesture("caret", &caret());
    // Trace the triangle again with a different sampling density.
    let query = trace_polyline(&[(0.0, 0.0), (100.0, 0.0), (50.0, 90.0), (0.0, 0.0)], 7.0);
    assert_eq!(recognizer.recognize(&query).name(), Some("triangle"));
}

// Indicative-angle normalization removes gross orientation but not the
// direction a shape was traced in: the same square drawn backwards from
// another corner lines up badly point-for-point, and that is expected.
#[test]
fn reversed_winding_scores_measurably_lower() {
    let mut recognizer = Recognizer::new();
    recognizer.add_gesture("square", &square_from_origin());

    let same_start = recognizer.recognize(&square_from_origin());
    assert!(same_start.score >= 0.95, "score {}", same_start.score);

    let reversed = trace_polyline(
        &[(100.0, 100.0), (100.0, 0.0), (0.0, 0.0), (0.0, 100.0), (100.0, 100.0)],
        4.0,
    );
    let reversed_result = recognizer.recognize(&reversed);
    assert!(
        same_start.score - reversed_result.score > 0.05,
        "same-start {} vs reversed {}",
        same_start.score,
        reversed_result.score
    );
}
