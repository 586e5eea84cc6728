//! Registry of the distinct sequences named across all input blocks.
//!
//! Each name is registered once, sized to its ungapped source length and
//! initialized to `N`; actual bases are filled in from every row
//! encountered, so regions never covered by an alignment stay `N`.

use indexmap::IndexMap;

use crate::libs::maf::{MafComp, GAP};
use crate::libs::thread_set::ThreadSet;

#[derive(Debug, Clone)]
pub struct RegSeq {
    pub name: String,
    pub length: usize,
    bases: Vec<u8>,
}

impl RegSeq {
    pub fn bases(&self) -> &[u8] {
        &self.bases
    }
}

pub fn complement(c: u8) -> u8 {
    match c {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        _ => c, // N and other ambiguity codes stay as-is
    }
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&c| complement(c)).collect()
}

#[derive(Debug, Default)]
pub struct SeqPool {
    seqs: IndexMap<String, RegSeq>,
}

impl SeqPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&RegSeq> {
        self.seqs.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegSeq> {
        self.seqs.values()
    }

    /// Registers a name, idempotently, and returns its sequence.
    ///
    /// Re-registering an existing name with a different length is a
    /// consistency error in the input and fatal for the run.
    pub fn register(&mut self, name: &str, src_size: usize) -> anyhow::Result<&mut RegSeq> {
        if let Some(seq) = self.seqs.get(name) {
            if seq.length != src_size {
                anyhow::bail!(
                    "sequence {} registered with conflicting lengths: {} then {}",
                    name,
                    seq.length,
                    src_size
                );
            }
        } else {
            self.seqs.insert(
                name.to_string(),
                RegSeq {
                    name: name.to_string(),
                    length: src_size,
                    bases: vec![b'N'; src_size],
                },
            );
        }
        Ok(self.seqs.get_mut(name).unwrap())
    }

    /// Registers the row's sequence and copies its ungapped bases into the
    /// positive strand, reverse complementing `-` rows.
    pub fn fill(&mut self, comp: &MafComp) -> anyhow::Result<()> {
        let mut chunk: Vec<u8> = comp.seq().iter().copied().filter(|&c| c != GAP).collect();
        if comp.strand == '-' {
            chunk = reverse_complement(&chunk);
        }
        let start = comp.positive_start();

        let seq = self.register(&comp.src, comp.src_size)?;
        anyhow::ensure!(
            start + chunk.len() <= seq.length,
            "row of {} extends past its declared source length {}",
            comp.src,
            seq.length
        );
        seq.bases[start..start + chunk.len()].copy_from_slice(&chunk);
        Ok(())
    }

    /// One thread per registered sequence, in registration order.
    pub fn build_thread_set(&self) -> anyhow::Result<ThreadSet> {
        let mut thread_set = ThreadSet::new();
        for seq in self.seqs.values() {
            thread_set.create_thread(&seq.name, seq.length)?;
        }
        Ok(thread_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::maf::MafReader;

    #[test]
    fn test_register_idempotent() {
        let mut pool = SeqPool::new();
        pool.register("seqA", 100).unwrap();
        pool.register("seqA", 100).unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_conflicting_length_rejected() {
        let mut pool = SeqPool::new();
        pool.register("seqA", 100).unwrap();
        assert!(pool.register("seqA", 90).is_err());
    }

    #[test]
    fn test_fill_plus_strand() {
        let input = "a\ns seqA 2 4 + 10 AC-GT\n\n";
        let ali = MafReader::new(input.as_bytes()).next().unwrap().unwrap();

        let mut pool = SeqPool::new();
        pool.fill(&ali.components[0]).unwrap();

        let seq = pool.get("seqA").unwrap();
        assert_eq!(seq.bases(), b"NNACGTNNNN");
    }

    #[test]
    fn test_fill_minus_strand_lands_on_positive() {
        // strand-local start 1, size 4, srcSize 10 -> positive chunk [5, 9)
        let input = "a\ns seqB 1 4 - 10 ACGT\n\n";
        let ali = MafReader::new(input.as_bytes()).next().unwrap().unwrap();

        let mut pool = SeqPool::new();
        pool.fill(&ali.components[0]).unwrap();

        let seq = pool.get("seqB").unwrap();
        assert_eq!(seq.bases(), b"NNNNNACGTN");
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement(b"ACGT"), b"ACGT".to_vec());
        assert_eq!(reverse_complement(b"AACG"), b"CGTT".to_vec());
        assert_eq!(reverse_complement(b"ANt"), b"aNT".to_vec());
    }

    #[test]
    fn test_build_thread_set() {
        let mut pool = SeqPool::new();
        pool.register("seqA", 100).unwrap();
        pool.register("seqB", 50).unwrap();

        let thread_set = pool.build_thread_set().unwrap();
        assert_eq!(thread_set.num_threads(), 2);
        assert_eq!(thread_set.total_bases(), 150);
    }
}
