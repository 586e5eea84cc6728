//! Pinch-graph storage: one thread per sequence, merged base by base.
//!
//! Threads live in one concatenated coordinate space backed by an
//! orientation-aware union-find. Each element carries a flip bit relative
//! to its parent, so a class knows the relative orientation of every member
//! and merged blocks can be reconstructed with correct strands.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::libs::pinch::Pinch;

#[derive(Debug, Clone)]
pub struct Thread {
    pub name: String,
    pub offset: usize,
    pub length: usize,
}

/// Union-find with a relative-orientation bit per element.
///
/// `flip[x]` is the orientation of `x` relative to its parent; parities
/// accumulate along the path to the root. Path compression rewrites them
/// relative to the root, union is by rank.
#[derive(Debug, Default)]
struct BidiUnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
    flip: Vec<bool>,
}

impl BidiUnionFind {
    fn grow(&mut self, n: usize) {
        let old = self.parent.len();
        self.parent.extend(old..old + n);
        self.rank.resize(old + n, 0);
        self.flip.resize(old + n, false);
    }

    /// Root of `x` and the orientation of `x` relative to that root.
    fn find(&mut self, x: usize) -> (usize, bool) {
        let mut root = x;
        let mut parity = false;
        while self.parent[root] != root {
            parity ^= self.flip[root];
            root = self.parent[root];
        }

        // compress, rewriting parities relative to the root
        let mut cur = x;
        let mut cur_parity = parity;
        while self.parent[cur] != root && self.parent[cur] != cur {
            let next = self.parent[cur];
            let next_parity = cur_parity ^ self.flip[cur];
            self.parent[cur] = root;
            self.flip[cur] = cur_parity;
            cur = next;
            cur_parity = next_parity;
        }

        (root, parity)
    }

    /// Unites `x` and `y` with relative orientation `flipped`.
    ///
    /// Uniting bases already in one class is a no-op; an orientation
    /// conflict keeps the existing relation (conflicting alignments are
    /// executed in input order, not reconciled).
    fn union(&mut self, x: usize, y: usize, flipped: bool) {
        let (rx, px) = self.find(x);
        let (ry, py) = self.find(y);
        if rx == ry {
            return;
        }

        let rel = px ^ py ^ flipped;
        match self.rank[rx].cmp(&self.rank[ry]) {
            std::cmp::Ordering::Less => {
                self.parent[rx] = ry;
                self.flip[rx] = rel;
            }
            std::cmp::Ordering::Greater => {
                self.parent[ry] = rx;
                self.flip[ry] = rel;
            }
            std::cmp::Ordering::Equal => {
                self.parent[ry] = rx;
                self.flip[ry] = rel;
                self.rank[rx] += 1;
            }
        }
    }
}

/// One member of a merged block: a gap-free base run on one thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMember {
    pub thread: usize,
    pub start: i64,
    pub length: i64,
    pub forward: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedBlock {
    pub members: Vec<BlockMember>,
}

#[derive(Debug, Default)]
pub struct ThreadSet {
    threads: IndexMap<String, Thread>,
    total: usize,
    dsu: BidiUnionFind,
}

impl ThreadSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_threads(&self) -> usize {
        self.threads.len()
    }

    pub fn total_bases(&self) -> usize {
        self.total
    }

    pub fn thread(&self, idx: usize) -> Option<&Thread> {
        self.threads.get_index(idx).map(|(_, t)| t)
    }

    pub fn threads(&self) -> impl Iterator<Item = &Thread> {
        self.threads.values()
    }

    /// A thread is created exactly once per name.
    pub fn create_thread(&mut self, name: &str, length: usize) -> anyhow::Result<()> {
        if self.threads.contains_key(name) {
            anyhow::bail!("thread {} already exists", name);
        }
        self.threads.insert(
            name.to_string(),
            Thread {
                name: name.to_string(),
                offset: self.total,
                length,
            },
        );
        self.total += length;
        self.dsu.grow(length);
        Ok(())
    }

    fn pos(&self, name: &str, p: i64) -> anyhow::Result<usize> {
        let thread = self
            .threads
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("unknown thread: {}", name))?;
        anyhow::ensure!(
            p >= 0 && (p as usize) < thread.length,
            "position {} out of thread {} (length {})",
            p,
            name,
            thread.length
        );
        Ok(thread.offset + p as usize)
    }

    /// Unites base `a_start + k` with `b_start + k` (same strand) or with
    /// `b_start + length - 1 - k` (opposite strand), for `k` in `0..length`.
    pub fn merge_ranges(
        &mut self,
        a: &str,
        a_start: i64,
        b: &str,
        b_start: i64,
        length: i64,
        same_strand: bool,
    ) -> anyhow::Result<()> {
        anyhow::ensure!(length > 0, "zero-length merge of {} and {}", a, b);
        for k in 0..length {
            let x = self.pos(a, a_start + k)?;
            let y = if same_strand {
                self.pos(b, b_start + k)?
            } else {
                self.pos(b, b_start + length - 1 - k)?
            };
            self.dsu.union(x, y, !same_strand);
        }
        Ok(())
    }

    /// Whether two bases have been united, directly or transitively.
    pub fn same_base(&mut self, a: &str, pa: i64, b: &str, pb: i64) -> anyhow::Result<bool> {
        let x = self.pos(a, pa)?;
        let y = self.pos(b, pb)?;
        Ok(self.dsu.find(x).0 == self.dsu.find(y).0)
    }

    fn thread_index_of(&self, global: usize) -> usize {
        // threads are laid out in creation order; offsets are ascending
        let mut lo = 0;
        let mut hi = self.threads.len();
        while lo + 1 < hi {
            let mid = (lo + hi) / 2;
            let (_, t) = self.threads.get_index(mid).unwrap();
            if t.offset <= global {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Reconstructs maximal merged blocks by walking every thread left to
    /// right and extending a block while all member classes advance in
    /// parallel. Members of opposite orientation advance backward.
    ///
    /// Blocks with fewer than `min_rows` members are dropped, so
    /// `min_rows = 1` reports unmerged runs too.
    pub fn merged_blocks(&mut self, min_rows: usize) -> Vec<MergedBlock> {
        // class membership: root -> sorted member (position, parity) list
        let mut classes: BTreeMap<usize, Vec<(usize, bool)>> = BTreeMap::new();
        for g in 0..self.total {
            let (root, parity) = self.dsu.find(g);
            classes.entry(root).or_default().push((g, parity));
        }

        let mut consumed = vec![false; self.total];
        let mut blocks = vec![];

        for ti in 0..self.threads.len() {
            let (offset, length) = {
                let (_, t) = self.threads.get_index(ti).unwrap();
                (t.offset, t.length)
            };
            let mut p = 0;
            while p < length {
                let anchor = offset + p;
                if consumed[anchor] {
                    p += 1;
                    continue;
                }

                let (root, anchor_parity) = self.dsu.find(anchor);
                let column = classes[&root].clone();
                let run_len = self.extend_run(&column, anchor_parity, anchor, &classes, &consumed);

                // mark every member base of every column in the run
                for k in 0..run_len {
                    let (r, _) = self.dsu.find(anchor + k);
                    for &(pos, _) in &classes[&r] {
                        consumed[pos] = true;
                    }
                }

                if column.len() >= min_rows {
                    let mut members: Vec<BlockMember> = column
                        .iter()
                        .map(|&(pos, parity)| {
                            let mt = self.thread_index_of(pos);
                            let local = (pos - self.threads.get_index(mt).unwrap().1.offset) as i64;
                            let forward = parity == anchor_parity;
                            let start = if forward { local } else { local - run_len as i64 + 1 };
                            BlockMember {
                                thread: mt,
                                start,
                                length: run_len as i64,
                                forward,
                            }
                        })
                        .collect();
                    members.sort_by_key(|m| (m.thread, m.start));
                    blocks.push(MergedBlock { members });
                }

                p += run_len;
            }
        }

        blocks
    }

    /// Number of columns the block anchored at `anchor` can cover.
    fn extend_run(
        &mut self,
        column: &[(usize, bool)],
        anchor_parity: bool,
        anchor: usize,
        classes: &BTreeMap<usize, Vec<(usize, bool)>>,
        consumed: &[bool],
    ) -> usize {
        let mut run_len = 1;
        'extend: loop {
            let next = anchor + run_len;
            if next >= self.total || consumed[next] {
                break;
            }
            let (next_root, next_anchor_parity) = self.dsu.find(next);
            let next_column = &classes[&next_root];
            if next_column.len() != column.len() {
                break;
            }

            // every member of the first column must advance run_len bases,
            // keeping its relative orientation and staying on its own thread
            for &(pos, parity) in column {
                let rel = parity ^ anchor_parity;
                let (t_start, t_end) = {
                    let t = self.thread_index_of(pos);
                    let (_, th) = self.threads.get_index(t).unwrap();
                    (th.offset, th.offset + th.length)
                };
                let expected = if !rel {
                    if pos + run_len >= t_end {
                        break 'extend;
                    }
                    pos + run_len
                } else {
                    if pos < t_start + run_len {
                        break 'extend;
                    }
                    pos - run_len
                };
                let wanted_parity = rel ^ next_anchor_parity;
                if !next_column.contains(&(expected, wanted_parity)) {
                    break 'extend;
                }
            }
            run_len += 1;
        }
        run_len
    }
}

impl Pinch for ThreadSet {
    fn pinch(
        &mut self,
        a: &str,
        a_start: i64,
        b: &str,
        b_start: i64,
        length: i64,
        same_strand: bool,
    ) -> anyhow::Result<()> {
        self.merge_ranges(a, a_start, b, b_start, length, same_strand)
    }
}
