//! Issuing of base-range merge operations for planned segments.

use anyhow::Context;

use crate::libs::coords::{self, Bookmark};
use crate::libs::maf::{MafAli, MafComp, GAP};
use crate::libs::planner::{Region, RefSegment};

/// Merge capability of the thread-graph storage.
///
/// `a_start`/`b_start` are positive-strand coordinates of the first base of
/// each range; with `same_strand` false, base `a_start + k` pairs with
/// `b_start + length - 1 - k`.
pub trait Pinch {
    fn pinch(
        &mut self,
        a: &str,
        a_start: i64,
        b: &str,
        b_start: i64,
        length: i64,
        same_strand: bool,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinchOp {
    pub a: String,
    pub a_start: i64,
    pub b: String,
    pub b_start: i64,
    pub length: i64,
    pub same_strand: bool,
}

/// Collects pinch operations instead of applying them. Lets block-local
/// work run off-thread while merge application stays sequential.
#[derive(Debug, Default)]
pub struct PinchRecorder {
    pub ops: Vec<PinchOp>,
}

impl Pinch for PinchRecorder {
    fn pinch(
        &mut self,
        a: &str,
        a_start: i64,
        b: &str,
        b_start: i64,
        length: i64,
        same_strand: bool,
    ) -> anyhow::Result<()> {
        self.ops.push(PinchOp {
            a: a.to_string(),
            a_start,
            b: b.to_string(),
            b_start,
            length,
            same_strand,
        });
        Ok(())
    }
}

/// Walks every planned segment and pinches each other row of the block
/// against the segment's reference row.
pub fn issue_pinches(
    ali: &MafAli,
    segments: &[RefSegment],
    sink: &mut impl Pinch,
) -> anyhow::Result<()> {
    for seg in segments {
        let rf = &ali.components[seg.ref_row];
        for (pi, comp) in ali.components.iter().enumerate() {
            if pi == seg.ref_row {
                continue;
            }
            pinch_pair(rf, comp, seg.region, sink).with_context(|| {
                format!(
                    "pinching {} against reference {} in columns [{}, {})",
                    comp.src, rf.src, seg.region.start, seg.region.end
                )
            })?;
        }
    }
    Ok(())
}

/// Pinches every maximal sub-run of `region` where both rows are gap-free.
///
/// Bookmarks are fresh per pair traversal; columns are visited left to
/// right, so the forward-only scan contract of the mapper holds.
fn pinch_pair(
    a: &MafComp,
    b: &MafComp,
    region: Region,
    sink: &mut impl Pinch,
) -> anyhow::Result<()> {
    let sa = a.seq();
    let sb = b.seq();
    let a_gaps = a.has_gaps();
    let b_gaps = b.has_gaps();
    let same_strand = a.strand == b.strand;

    let mut a_bm = Bookmark::new();
    let mut b_bm = Bookmark::new();

    let mut c = region.start;
    while c < region.end {
        if sa[c] == GAP || sb[c] == GAP {
            c += 1;
            continue;
        }
        let s = c;
        while c < region.end && sa[c] != GAP && sb[c] != GAP {
            c += 1;
        }
        let run_len = c - s;

        let a_off = coords::local_offset(sa, s, &mut a_bm, a_gaps);
        let b_off = coords::local_offset(sb, s, &mut b_bm, b_gaps);
        let a_span = coords::local_offset(sa, c - 1, &mut a_bm, a_gaps) - a_off + 1;
        let b_span = coords::local_offset(sb, c - 1, &mut b_bm, b_gaps) - b_off + 1;
        if a_span != run_len as i64 || b_span != run_len as i64 {
            anyhow::bail!(
                "paired runs of unequal length in columns [{}, {}): {} spans {} bases, {} spans {}",
                s,
                c,
                a.src,
                a_span,
                b.src,
                b_span
            );
        }

        let a_start = coords::global_positive_start(a_off, a.positive_start(), a.size, a.strand, run_len);
        let b_start = coords::global_positive_start(b_off, b.positive_start(), b.size, b.strand, run_len);
        sink.pinch(&a.src, a_start, &b.src, b_start, run_len as i64, same_strand)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::maf::MafReader;
    use crate::libs::planner::plan_block;

    fn parse_one(input: &str) -> MafAli {
        MafReader::new(input.as_bytes()).next().unwrap().unwrap()
    }

    fn record(input: &str) -> Vec<PinchOp> {
        let ali = parse_one(input);
        let segments = plan_block(&ali).unwrap();
        let mut rec = PinchRecorder::default();
        issue_pinches(&ali, &segments, &mut rec).unwrap();
        rec.ops
    }

    #[test]
    fn test_single_row_block_no_pinches() {
        let ops = record("a\ns s1 0 4 + 50 ACGT\n\n");
        assert!(ops.is_empty());
    }

    #[test]
    fn test_gapless_pair_single_op() {
        let ops = record(
            "a\n\
             s tgt 10 6 + 100 ACGTCA\n\
             s qry 20 6 + 100 ACGTCA\n\n",
        );
        assert_eq!(
            ops,
            vec![PinchOp {
                a: "tgt".to_string(),
                a_start: 10,
                b: "qry".to_string(),
                b_start: 20,
                length: 6,
                same_strand: true,
            }]
        );
    }

    #[test]
    fn test_gaps_split_runs() {
        // reference (gapless) vs a row with a middle gap
        let ops = record(
            "a\n\
             s tgt 0 8 + 100 ACGTACGT\n\
             s qry 5 6 + 100 AC--ACGT\n\n",
        );
        assert_eq!(ops.len(), 2);
        assert_eq!((ops[0].a_start, ops[0].b_start, ops[0].length), (0, 5, 2));
        assert_eq!((ops[1].a_start, ops[1].b_start, ops[1].length), (4, 7, 4));
    }

    #[test]
    fn test_minus_strand_coordinates() {
        // qry: srcSize 100, strand-local start 10, size 6
        // positive-strand chunk is [84, 90)
        let ops = record(
            "a\n\
             s tgt 10 6 + 100 ACGTCA\n\
             s qry 10 6 - 100 ACGTCA\n\n",
        );
        assert_eq!(
            ops,
            vec![PinchOp {
                a: "tgt".to_string(),
                a_start: 10,
                b: "qry".to_string(),
                b_start: 84,
                length: 6,
                same_strand: false,
            }]
        );
    }

    #[test]
    fn test_minus_strand_split_runs_stay_contiguous() {
        // qry positive chunk: srcSize 50, start 4, size 6 -> [40, 46)
        let ops = record(
            "a\n\
             s tgt 0 8 + 100 ACGTACGT\n\
             s qry 4 6 - 50 AC--GTAC\n\n",
        );
        assert_eq!(ops.len(), 2);
        // first run: columns [0,2), qry offsets 0..2 -> positive [44, 46)
        assert_eq!((ops[0].a_start, ops[0].b_start, ops[0].length), (0, 44, 2));
        // second run: columns [4,8), qry offsets 2..6 -> positive [40, 44)
        assert_eq!((ops[1].a_start, ops[1].b_start, ops[1].length), (4, 40, 4));
        assert!(ops.iter().all(|op| !op.same_strand));
    }

    #[test]
    fn test_cross_block_closure() {
        use crate::libs::registry::SeqPool;

        let input = "\
a
s seqA 2 6 + 20 AC---ACG-G
s seqB 0 8 + 12 ACG--ACGGC
s seqC 3 8 - 15 A-G-TACGGC
s seqD 5 10 + 18 ACGTTACGGC

a
s seqA 2 4 + 20 ACAC
s seqE 0 4 + 10 ACAC

";
        let blocks: Vec<MafAli> = MafReader::new(input.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        let mut pool = SeqPool::new();
        for ali in &blocks {
            for comp in &ali.components {
                pool.fill(comp).unwrap();
            }
        }
        let mut thread_set = pool.build_thread_set().unwrap();
        for ali in &blocks {
            let segments = plan_block(ali).unwrap();
            issue_pinches(ali, &segments, &mut thread_set).unwrap();
        }

        // within the first block, column 0 unites all four rows
        assert!(thread_set.same_base("seqA", 2, "seqD", 5).unwrap());
        assert!(thread_set.same_base("seqB", 0, "seqD", 5).unwrap());
        // seqC is reverse complemented; its column-0 base sits at
        // positive-strand position 4 + (8 - 1) = 11
        assert!(thread_set.same_base("seqC", 11, "seqD", 5).unwrap());
        // seqE was only aligned against seqA in the second block, yet joins
        // seqD through the closure
        assert!(thread_set.same_base("seqE", 0, "seqD", 5).unwrap());
        assert!(thread_set.same_base("seqE", 1, "seqB", 1).unwrap());
        // untouched bases stay apart
        assert!(!thread_set.same_base("seqE", 0, "seqD", 6).unwrap());
    }

    #[test]
    fn test_worked_example_pairings() {
        let ali = parse_one(
            "a\n\
             s seqA 2 6 + 20 AC---ACG-G\n\
             s seqB 0 8 + 12 ACG--ACGGC\n\
             s seqC 3 8 - 15 A-G-TACGGC\n\
             s seqD 5 10 + 18 ACGTTACGGC\n\n",
        );
        let segments = plan_block(&ali).unwrap();
        let mut rec = PinchRecorder::default();
        issue_pinches(&ali, &segments, &mut rec).unwrap();

        // seqD is the lone gapless reference; each other row contributes its
        // gap-free runs: seqA 3, seqB 2, seqC 3
        assert_eq!(rec.ops.len(), 8);
        assert!(rec.ops.iter().all(|op| op.a == "seqD"));
        let bases: i64 = rec.ops.iter().map(|op| op.length).sum();
        assert_eq!(bases, 22);
    }
}
