//! Association of detections to tracks across consecutive frames.

use ndarray::Array2;

use crate::filter::config::MatchStrategy;
use crate::filter::detection::Detection;
use crate::filter::rect::{Rect, iou_batch};

/// Cost used for padding and for pairs that may never be matched.
const FORBIDDEN_COST: f64 = 1e6;

/// IoU differences up to this size are treated as ties and decided by score.
/// Covers f32 rounding in `Rect::iou` for boxes that overlap equally.
pub const IOU_TOLERANCE: f32 = 1e-5;

/// Weight of the score term folded into the assignment cost. At most
/// `IOU_TOLERANCE`, so it never outweighs an IoU difference larger than a tie.
const SCORE_TIE_WEIGHT: f64 = IOU_TOLERANCE as f64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    /// (track index, detection index) pairs, sorted by track index.
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Compute IoU distance matrix between tracks and detections.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    iou_batch(track_boxes, det_boxes).mapv(|iou| 1.0 - iou)
}

/// Match each track's last known box against this frame's detections.
///
/// A pair is only eligible when its IoU is positive and at least
/// `iou_threshold`. Every track and every detection appears exactly once in
/// the result, either in a match or in its unmatched list.
pub fn match_detections(
    track_boxes: &[Rect],
    detections: &[Detection],
    iou_threshold: f32,
    strategy: MatchStrategy,
) -> AssignmentResult {
    let det_boxes: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();
    let dists = iou_distance(track_boxes, &det_boxes);
    let scores: Vec<f32> = detections.iter().map(|d| d.score).collect();

    let matches = match strategy {
        MatchStrategy::Optimal => linear_assignment(&dists, &scores, iou_threshold),
        MatchStrategy::Greedy => greedy_assignment(&dists, &scores, iou_threshold),
    };

    finish(matches, track_boxes.len(), detections.len())
}

fn eligible(dist: f32, iou_threshold: f32) -> bool {
    let iou = 1.0 - dist;
    iou > 0.0 && iou >= iou_threshold
}

/// Minimum-cost assignment over `1 - IoU`, solved with LAPJV on a padded
/// square matrix.
pub fn linear_assignment(
    dists: &Array2<f32>,
    scores: &[f32],
    iou_threshold: f32,
) -> Vec<(usize, usize)> {
    let (num_rows, num_cols) = dists.dim();
    if num_rows == 0 || num_cols == 0 {
        return Vec::new();
    }

    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), FORBIDDEN_COST);

    for i in 0..num_rows {
        for j in 0..num_cols {
            let dist = dists[[i, j]];
            if eligible(dist, iou_threshold) {
                padded[[i, j]] = dist as f64 + SCORE_TIE_WEIGHT * (1.0 - scores[j] as f64);
            }
        }
    }

    let Ok((row_to_col, _)) = lapjv::lapjv(&padded) else {
        // Solver failure leaves everything unmatched for this frame.
        return Vec::new();
    };

    row_to_col
        .iter()
        .enumerate()
        .filter(|&(row, &col)| row < num_rows && col < num_cols)
        .filter(|&(row, &col)| eligible(dists[[row, col]], iou_threshold))
        .map(|(row, &col)| (row, col))
        .collect()
}

/// Repeatedly take the best remaining eligible pair: highest IoU first, with
/// IoUs within [`IOU_TOLERANCE`] of the best treated as equal and decided by
/// detection score, then by lowest track and detection index.
pub fn greedy_assignment(
    dists: &Array2<f32>,
    scores: &[f32],
    iou_threshold: f32,
) -> Vec<(usize, usize)> {
    let (num_rows, num_cols) = dists.dim();

    let mut candidates: Vec<(usize, usize)> = (0..num_rows)
        .flat_map(|i| (0..num_cols).map(move |j| (i, j)))
        .filter(|&(i, j)| eligible(dists[[i, j]], iou_threshold))
        .collect();

    let mut matches = Vec::new();
    while let Some(best_dist) = candidates
        .iter()
        .map(|&(i, j)| dists[[i, j]])
        .min_by(f32::total_cmp)
    {
        let Some((i, j)) = candidates
            .iter()
            .copied()
            .filter(|&(i, j)| dists[[i, j]] - best_dist <= IOU_TOLERANCE)
            .min_by(|&(ia, ja), &(ib, jb)| {
                scores[jb]
                    .total_cmp(&scores[ja])
                    .then(ia.cmp(&ib))
                    .then(ja.cmp(&jb))
            })
        else {
            break;
        };
        matches.push((i, j));
        candidates.retain(|&(ci, cj)| ci != i && cj != j);
    }
    matches
}

fn finish(
    mut matches: Vec<(usize, usize)>,
    num_tracks: usize,
    num_dets: usize,
) -> AssignmentResult {
    matches.sort_unstable();

    let mut track_matched = vec![false; num_tracks];
    let mut det_matched = vec![false; num_dets];
    for &(i, j) in &matches {
        track_matched[i] = true;
        det_matched[j] = true;
    }

    let unmatched = |mask: Vec<bool>| -> Vec<usize> {
        mask.iter()
            .enumerate()
            .filter_map(|(i, &m)| if m { None } else { Some(i) })
            .collect()
    };

    AssignmentResult {
        matches,
        unmatched_tracks: unmatched(track_matched),
        unmatched_detections: unmatched(det_matched),
    }
}
