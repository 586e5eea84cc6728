//! Comparison-order planning for one alignment block.
//!
//! A block's pairwise relationships do not need all-pairs comparison: it is
//! enough to partition the column range into disjoint segments, each with a
//! single reference row that has no gap anywhere in its segment. Pinching
//! every other row against the reference unites the whole column through
//! transitivity.

use itertools::Itertools;

use crate::libs::maf::{MafAli, GAP};

/// A half-open interval of alignment-block column indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: usize,
    pub end: usize,
}

impl Region {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// One planned segment: a column range and the row acting as its reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefSegment {
    pub ref_row: usize,
    pub region: Region,
}

pub fn gap_counts(rows: &[&[u8]]) -> Vec<usize> {
    rows.iter()
        .map(|row| row.iter().filter(|&&c| c == GAP).count())
        .collect()
}

/// Row order for planning: ascending gap count, stable, ties broken by the
/// original row index. Rows with fewer gaps claim first and so tend to
/// produce fewer, longer segments.
pub fn sort_rows_by_gap(rows: &[&[u8]]) -> Vec<usize> {
    let counts = gap_counts(rows);
    (0..rows.len()).sorted_by_key(|&i| counts[i]).collect()
}

/// Claim pass: rows are processed top-down in the order given; each row
/// claims every maximal run of still-unclaimed columns where it has bases.
///
/// For the matrix
///
/// ```text
///   0123456789
/// 0 AC---ACG-G
/// 1 ACG--ACGGC
/// 2 A-G-TACGGC
/// 3 ACGTTACGGC
/// ```
///
/// the result is `{3,[3,4)} {2,[4,5)} {1,[8,9)} {1,[2,3)} {0,[9,10)}
/// {0,[5,8)} {0,[0,2)}` — new segments go to the head of the list, and only
/// completeness and disjointness are contractual, never the order.
pub fn comparison_order(rows: &[&[u8]]) -> Vec<RefSegment> {
    let num_cols = rows.first().map_or(0, |row| row.len());
    let mut done: Vec<RefSegment> = vec![];
    if num_cols == 0 {
        return done;
    }

    let mut todo = vec![Region::new(0, num_cols)];
    for (ri, row) in rows.iter().enumerate() {
        if todo.is_empty() {
            break;
        }
        todo = claim_row(row, ri, &mut done, &todo);
    }
    done
}

/// Splits each todo region into claimed runs (non-gap content of this row)
/// and leftover gap stretches, which become the next row's todo list.
fn claim_row(row: &[u8], ri: usize, done: &mut Vec<RefSegment>, todo: &[Region]) -> Vec<Region> {
    let mut rest = vec![];
    for region in todo {
        let mut c = region.start;
        while c < region.end {
            let s = c;
            if row[c] == GAP {
                while c < region.end && row[c] == GAP {
                    c += 1;
                }
                rest.push(Region::new(s, c));
            } else {
                while c < region.end && row[c] != GAP {
                    c += 1;
                }
                done.insert(
                    0,
                    RefSegment {
                        ref_row: ri,
                        region: Region::new(s, c),
                    },
                );
            }
        }
    }
    rest
}

/// Verifies the partition invariant: every column of `[0, num_cols)` covered
/// by exactly one segment.
pub fn check_coverage(segments: &[RefSegment], num_cols: usize) -> anyhow::Result<()> {
    let mut covered = vec![false; num_cols];
    for seg in segments {
        for c in seg.region.start..seg.region.end {
            anyhow::ensure!(c < num_cols, "segment column {} out of range", c);
            anyhow::ensure!(!covered[c], "column {} claimed by two segments", c);
            covered[c] = true;
        }
    }
    if let Some(c) = covered.iter().position(|&v| !v) {
        anyhow::bail!("planning left column {} of {} uncovered", c, num_cols);
    }
    Ok(())
}

/// Plans one block: sorts rows by ascending gap count, claims in that order,
/// then maps segment references back to original row indices and checks the
/// partition invariant.
pub fn plan_block(ali: &MafAli) -> anyhow::Result<Vec<RefSegment>> {
    anyhow::ensure!(!ali.components.is_empty(), "empty alignment block");

    let rows: Vec<&[u8]> = ali.components.iter().map(|c| c.seq()).collect();
    let order = sort_rows_by_gap(&rows);
    let sorted: Vec<&[u8]> = order.iter().map(|&i| rows[i]).collect();

    let mut segments = comparison_order(&sorted);
    for seg in segments.iter_mut() {
        seg.ref_row = order[seg.ref_row];
    }

    check_coverage(&segments, ali.num_cols())?;
    Ok(segments)
}
