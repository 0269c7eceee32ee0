//! Vertical de-overlap of value labels.

/// Spread label centers apart so that no two boxes of height `height` overlap.
///
/// `ys` are label centers in normalized-axes units. The result holds the adjusted centers
/// in input order; relative order is preserved. `floor`, when given, is the top of the
/// index label box: the lowest value label is never placed below it.
///
/// Overlapping neighbours are split apart evenly, and whatever the split pushes into
/// already-settled labels below is propagated downwards. This is a greedy pass and does
/// not find the minimal total displacement.
pub fn space_labels(ys: &[f64], height: f64, floor: Option<f64>) -> Vec<f64> {
    let half = height / 2.0;
    let mut order: Vec<usize> = (0..ys.len()).collect();
    order.sort_by(|&a, &b| ys[a].total_cmp(&ys[b]));
    let mut sorted: Vec<f64> = order.iter().map(|&i| ys[i]).collect();

    // The first label is pinned once it has been lifted off the index label.
    let mut pinned = false;
    if let (Some(floor), Some(first)) = (floor, sorted.first_mut())
        && *first - half < floor
    {
        *first = floor + half;
        pinned = true;
    }

    for i in 0..sorted.len().saturating_sub(1) {
        let overlap = (sorted[i] + half) - (sorted[i + 1] - half);
        if overlap <= 0.0 {
            continue;
        }
        if pinned && i == 0 {
            sorted[i + 1] += overlap;
        } else {
            sorted[i] -= overlap / 2.0;
            sorted[i + 1] += overlap / 2.0;
        }
        for j in (0..i).rev() {
            let overlap = (sorted[j] + half) - (sorted[j + 1] - half);
            if overlap > 0.0 {
                sorted[j] -= overlap;
            }
        }
    }

    // Backward propagation can push the lowest labels through the floor; settle upwards.
    if let (Some(floor), Some(first)) = (floor, sorted.first_mut()) {
        *first = first.max(floor + half);
    }
    for i in 1..sorted.len() {
        sorted[i] = sorted[i].max(sorted[i - 1] + height);
    }

    let mut out = vec![0.0; ys.len()];
    for (slot, y) in order.into_iter().zip(sorted) {
        out[slot] = y;
    }
    out
}
