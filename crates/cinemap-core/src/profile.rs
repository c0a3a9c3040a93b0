//! Preference vector built from a user's binary feedback.
//!
//! The profile is the weighted mean of rated embeddings, with liked items
//! pulling toward and disliked items pushing away:
//!
//! ```text
//! profile = sum(w_i * e_i) / sum(|w_i|),   w = +1 liked, -1 disliked
//! ```
//!
//! Profiles are computed fresh per request and never cached.

use crate::types::FeedbackRow;
use crate::vector;

/// Builds the user's preference vector.
///
/// Rows whose item has no embedding are skipped, as are rows whose
/// embedding length disagrees with the first contributing row. Returns
/// `None` when nothing contributes, which callers treat as "no profile
/// yet" rather than as an error.
pub fn build_profile(feedback: &[FeedbackRow]) -> Option<Vec<f64>> {
    let mut acc: Option<Vec<f64>> = None;
    let mut total_weight = 0.0f64;

    for row in feedback {
        let Some(embedding) = row.embedding.as_deref() else {
            continue;
        };
        let acc = acc.get_or_insert_with(|| vec![0.0; embedding.len()]);
        if acc.len() != embedding.len() {
            continue;
        }
        let weight = row.weight();
        vector::add_scaled(acc, embedding, weight);
        total_weight += weight.abs();
    }

    let mut profile = acc?;
    if total_weight == 0.0 {
        return None;
    }
    vector::scale(&mut profile, 1.0 / total_weight);
    Some(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::norm;

    fn row(item_id: i64, liked: bool, embedding: Option<Vec<f64>>) -> FeedbackRow {
        FeedbackRow {
            item_id,
            title: format!("item-{}", item_id),
            liked,
            embedding,
        }
    }

    #[test]
    fn test_no_feedback_no_profile() {
        assert_eq!(build_profile(&[]), None);
    }

    #[test]
    fn test_only_unembedded_rows_no_profile() {
        let rows = vec![row(1, true, None), row(2, false, None)];
        assert_eq!(build_profile(&rows), None);
    }

    #[test]
    fn test_liked_and_disliked_opposites_agree() {
        // Liking A=[1,0] and disliking C=[-1,0] both point toward +x.
        let rows = vec![
            row(1, true, Some(vec![1.0, 0.0])),
            row(3, false, Some(vec![-1.0, 0.0])),
        ];
        assert_eq!(build_profile(&rows), Some(vec![1.0, 0.0]));
    }

    #[test]
    fn test_missing_embedding_does_not_dilute() {
        let rows = vec![
            row(1, true, Some(vec![2.0, 4.0])),
            row(2, true, None),
            row(3, true, Some(vec![0.0, 2.0])),
        ];
        assert_eq!(build_profile(&rows), Some(vec![1.0, 3.0]));
    }

    #[test]
    fn test_mismatched_dimension_skipped() {
        let rows = vec![
            row(1, true, Some(vec![1.0, 1.0])),
            row(2, true, Some(vec![5.0, 5.0, 5.0])),
        ];
        assert_eq!(build_profile(&rows), Some(vec![1.0, 1.0]));
    }

    #[test]
    fn test_order_independent() {
        let rows = vec![
            row(1, true, Some(vec![0.3, -1.2, 0.8])),
            row(2, false, Some(vec![1.5, 0.1, -0.4])),
            row(3, true, Some(vec![-0.7, 0.9, 2.2])),
            row(4, false, Some(vec![0.0, 0.5, 0.5])),
        ];
        let forward = build_profile(&rows).unwrap();
        let mut reversed_rows = rows.clone();
        reversed_rows.reverse();
        let reversed = build_profile(&reversed_rows).unwrap();
        let mut rotated_rows = rows.clone();
        rotated_rows.rotate_left(2);
        let rotated = build_profile(&rotated_rows).unwrap();

        for i in 0..forward.len() {
            assert!((forward[i] - reversed[i]).abs() < 1e-12);
            assert!((forward[i] - rotated[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_normalization_never_amplifies() {
        let rows = vec![
            row(1, true, Some(vec![3.0, 4.0])),
            row(2, false, Some(vec![-6.0, 8.0])),
            row(3, true, Some(vec![1.0, 1.0])),
            row(4, true, Some(vec![3.0, 4.0])),
        ];
        let max_norm = rows
            .iter()
            .filter_map(|r| r.embedding.as_deref())
            .map(norm)
            .fold(0.0, f64::max);
        let profile = build_profile(&rows).unwrap();
        assert!(
            norm(&profile) <= max_norm + 1e-12,
            "profile norm {} exceeds max contributing norm {}",
            norm(&profile),
            max_norm
        );
    }
}
