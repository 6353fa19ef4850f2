use std::cmp::Ordering;

use tricrunch_core::ResultRow;

/// Score descending, then `p1`, `p2`, `p3` ascending.
pub fn compare_rows(a: &ResultRow, b: &ResultRow) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.p1.cmp(&b.p1))
        .then_with(|| a.p2.cmp(&b.p2))
        .then_with(|| a.p3.cmp(&b.p3))
}

pub fn rank(rows: &mut [ResultRow]) {
    rows.sort_unstable_by(compare_rows);
}

pub fn is_ranked(rows: &[ResultRow]) -> bool {
    rows.windows(2)
        .all(|pair| compare_rows(&pair[0], &pair[1]) != Ordering::Greater)
}
