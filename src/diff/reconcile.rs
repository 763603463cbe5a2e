//! Turning raw per-hunk anchors into added, deleted and touched lines.
//!
//! A positive anchor is a substantive change at that line of the resulting
//! file, a negative one a whitespace or comment change at its absolute value.
//! A line is *touched* when an addition and a deletion land on it and at
//! least one of the two is substantive. Noise anchors that pair with nothing
//! are dropped.

use super::line::Anchor;
use crate::change::FileChange;
use std::collections::BTreeSet;

/// Reconcile raw added and deleted anchors of one file.
///
/// ```
/// use patch_lines::diff::reconcile::reconcile;
/// use patch_lines::FileChange;
///
/// let change = reconcile(&[1, 2, 3, 4, -5, -6, -7, 8, 10], &[4, 5, 6, -7, 9, -10]);
/// assert_eq!(
///     change,
///     FileChange::Modified {
///         added: vec![1, 2, 3, 8],
///         deleted: vec![9],
///         touched: vec![4, 5, 6, 10],
///     }
/// );
/// ```
pub fn reconcile(added: &[Anchor], deleted: &[Anchor]) -> FileChange {
    let added: BTreeSet<Anchor> = added.iter().copied().collect();
    let deleted: BTreeSet<Anchor> = deleted.iter().copied().collect();

    let touched: BTreeSet<Anchor> = paired(&added, &deleted)
        .chain(paired(&deleted, &added))
        .collect();

    let unpaired = |anchors: &BTreeSet<Anchor>| -> Vec<u32> {
        anchors
            .iter()
            .filter(|&&a| a > 0 && !touched.contains(&a))
            .filter_map(|&a| u32::try_from(a).ok())
            .collect()
    };

    FileChange::Modified {
        added: unpaired(&added),
        deleted: unpaired(&deleted),
        touched: touched
            .iter()
            .filter_map(|&a| u32::try_from(a).ok())
            .collect(),
    }
}

/// Substantive anchors of `anchors` mirrored in `other` at either sign.
fn paired<'a>(
    anchors: &'a BTreeSet<Anchor>,
    other: &'a BTreeSet<Anchor>,
) -> impl Iterator<Item = Anchor> + 'a {
    anchors
        .iter()
        .copied()
        .filter(move |&a| a > 0 && (other.contains(&a) || other.contains(&-a)))
}
