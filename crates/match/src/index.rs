//! Weak-sum index over the control file's block table.

use std::collections::HashMap;

use checksums::weak_mask;
use controlfile::ControlFile;

/// One indexed block, with the lookahead needed for pair confirmation.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Candidate {
    /// Target block index.
    pub block: usize,
    /// Masked weak sum of the following block, when the producer asked for
    /// two consecutive matches and a following block exists.
    pub next_weak: Option<u32>,
}

/// Maps masked weak sums to the target blocks that carry them.
///
/// Every block is reachable from its own weak sum. With two sequence matches
/// each entry (except the last block's) also records the next block's weak
/// sum so a hit can be extended to a verified pair without a second lookup.
#[derive(Clone, Debug)]
pub struct BlockIndex {
    buckets: HashMap<u32, Vec<Candidate>>,
    mask: u32,
}

impl BlockIndex {
    /// Builds the index from a parsed control file.
    #[must_use]
    pub fn new(control: &ControlFile) -> Self {
        let header = control.header();
        let mask = weak_mask(usize::from(header.weak_len));
        let paired = header.sequence_matches == 2;
        let sums = control.block_sums();

        let mut buckets: HashMap<u32, Vec<Candidate>> = HashMap::with_capacity(sums.len());
        for (block, sum) in sums.iter().enumerate() {
            let next_weak = if paired && block + 1 < sums.len() {
                Some(sums[block + 1].weak() & mask)
            } else {
                None
            };
            buckets
                .entry(sum.weak() & mask)
                .or_default()
                .push(Candidate { block, next_weak });
        }

        Self { buckets, mask }
    }

    /// Candidate blocks whose stored weak sum equals `weak` under the mask.
    pub(crate) fn candidates(&self, weak: u32) -> Option<&[Candidate]> {
        self.buckets.get(&(weak & self.mask)).map(Vec::as_slice)
    }

    /// Mask reducing a packed rolling value to the stored weak-sum width.
    #[must_use]
    pub const fn mask(&self) -> u32 {
        self.mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use controlfile::{BlockSum, FileChecksum, Header};

    fn control(sequence_matches: u8, weaks: &[u32]) -> ControlFile {
        let header = Header {
            version: "0.6.2".to_string(),
            producer: None,
            filename: "t".to_string(),
            url: "t".to_string(),
            mtime: None,
            length: 4 * weaks.len() as u64,
            block_size: 4,
            sequence_matches,
            weak_len: 2,
            strong_len: 3,
            file_checksum: FileChecksum::Md4([0u8; 16]),
        };
        let sums = weaks
            .iter()
            .map(|&weak| BlockSum::new(weak, vec![0u8; 3]))
            .collect();
        ControlFile::new(header, sums)
    }

    #[test]
    fn every_block_is_reachable_from_its_weak_sum() {
        let control = control(2, &[0x1111, 0x2222, 0x1111]);
        let index = BlockIndex::new(&control);

        let first = index.candidates(0x1111).expect("bucket");
        assert_eq!(
            first.iter().map(|c| c.block).collect::<Vec<_>>(),
            vec![0, 2]
        );
        let second = index.candidates(0x2222).expect("bucket");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].block, 1);
    }

    #[test]
    fn paired_entries_record_the_next_weak_sum() {
        let control = control(2, &[0x1111, 0x2222, 0x3333]);
        let index = BlockIndex::new(&control);

        assert_eq!(index.candidates(0x1111).expect("bucket")[0].next_weak, Some(0x2222));
        assert_eq!(index.candidates(0x2222).expect("bucket")[0].next_weak, Some(0x3333));
        // The last block's entry uses only its own key.
        assert_eq!(index.candidates(0x3333).expect("bucket")[0].next_weak, None);
    }

    #[test]
    fn single_sequence_match_skips_lookahead() {
        let control = control(1, &[0x1111, 0x2222]);
        let index = BlockIndex::new(&control);
        assert_eq!(index.candidates(0x1111).expect("bucket")[0].next_weak, None);
        assert_eq!(index.candidates(0x2222).expect("bucket")[0].next_weak, None);
    }

    #[test]
    fn probe_applies_the_weak_mask() {
        let control = control(1, &[0x1111]);
        let index = BlockIndex::new(&control);
        assert_eq!(index.mask(), 0xffff);
        // High bytes beyond the stored width are ignored.
        assert!(index.candidates(0xdead_1111).is_some());
        assert!(index.candidates(0x1112).is_none());
    }
}
