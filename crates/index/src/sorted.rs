//! Stable sorted sequences.
//!
//! `push` and `pull` maintain a `Vec` ordered by a [`Comparator`]. Items that
//! compare equal keep their insertion order: a new item is placed after every
//! item it compares equal to. Without a comparator the sequence is a plain
//! insertion-ordered list.

use crate::comparator::Comparator;
use alloc::vec::Vec;
use core::cmp::Ordering;

/// Inserts `item` and returns its position.
///
/// With a comparator, the item goes to the upper bound of its equal range;
/// without one it is appended.
pub fn push<T>(seq: &mut Vec<T>, item: T, cmp: Option<&dyn Comparator<T>>) -> usize {
    let pos = match cmp {
        Some(cmp) => upper_bound(seq, &item, cmp),
        None => seq.len(),
    };
    seq.insert(pos, item);
    pos
}

/// Removes the item for which `is_target` holds and returns it.
///
/// `probe` is an item comparing equal to the target (typically the target as
/// it was when pushed). With a comparator the equal range of `probe` is
/// searched first; if the comparator disagrees with the stored order (the
/// target was mutated in place) the whole sequence is scanned.
pub fn pull<T, P>(
    seq: &mut Vec<T>,
    probe: &T,
    cmp: Option<&dyn Comparator<T>>,
    is_target: P,
) -> Option<T>
where
    P: Fn(&T) -> bool,
{
    if let Some(cmp) = cmp {
        let mut pos = lower_bound(seq, probe, cmp);
        while pos < seq.len() && cmp.compare(&seq[pos], probe) == Ordering::Equal {
            if is_target(&seq[pos]) {
                return Some(seq.remove(pos));
            }
            pos += 1;
        }
    }
    let pos = seq.iter().position(|x| is_target(x))?;
    Some(seq.remove(pos))
}

/// Position of the first item not less than `item`.
pub fn lower_bound<T>(seq: &[T], item: &T, cmp: &dyn Comparator<T>) -> usize {
    seq.partition_point(|x| cmp.compare(x, item) == Ordering::Less)
}

/// Position after the last item not greater than `item`.
pub fn upper_bound<T>(seq: &[T], item: &T, cmp: &dyn Comparator<T>) -> usize {
    seq.partition_point(|x| cmp.compare(x, item) != Ordering::Greater)
}
