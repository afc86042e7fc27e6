//! Per-chromosome parallelism using Rayon.

use crate::coverage::{CountingStrategy, SparseCoverageIndex};
use crate::error::{CountsError, Result};
use crate::interval::BedRecord;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Group BED records by chromosome, keeping file order within each group.
pub fn group_records_by_chromosome(records: Vec<BedRecord>) -> FxHashMap<String, Vec<BedRecord>> {
    let mut groups: FxHashMap<String, Vec<BedRecord>> = FxHashMap::default();

    for record in records {
        groups
            .entry(record.chrom().to_string())
            .or_default()
            .push(record);
    }

    groups
}

/// Chromosome names sorted for deterministic output.
pub fn sorted_chromosomes<T>(groups: &FxHashMap<String, T>) -> Vec<String> {
    let mut names: Vec<String> = groups.keys().cloned().collect();
    names.sort_unstable();
    names
}

/// Build an accumulated coverage index from the reads of one chromosome.
///
/// With `weighted`, read `i` of the group is weighted by its score.
pub fn build_index(
    chrom: &str,
    reads: &[BedRecord],
    weighted: bool,
) -> Result<SparseCoverageIndex> {
    let strategy = if weighted {
        CountingStrategy::Weighted {
            weights: reads.iter().map(BedRecord::weight).collect(),
        }
    } else {
        CountingStrategy::Unweighted
    };

    let mut index = SparseCoverageIndex::with_strategy(strategy);
    for (query_index, read) in reads.iter().enumerate() {
        let (Ok(start), Ok(end)) = (u32::try_from(read.start()), u32::try_from(read.end())) else {
            return Err(CountsError::InvalidFormat(format!(
                "read {}:{}-{} exceeds 32-bit coordinates",
                chrom,
                read.start(),
                read.end()
            )));
        };
        index.populate_query(start, end, query_index);
    }
    index.accumulate();
    log::info!("{}: indexed {} reads", chrom, index.len());
    Ok(index)
}

/// Build one coverage index per chromosome in parallel.
pub fn build_indexes(
    groups: &FxHashMap<String, Vec<BedRecord>>,
    weighted: bool,
) -> Result<FxHashMap<String, SparseCoverageIndex>> {
    groups
        .par_iter()
        .map(|(chrom, reads)| Ok((chrom.clone(), build_index(chrom, reads, weighted)?)))
        .collect()
}

/// Process chromosomes in parallel, returning results in chromosome order.
pub fn process_chromosomes<K, F, T>(groups: &FxHashMap<String, K>, f: F) -> Result<Vec<(String, T)>>
where
    K: Sync,
    F: Fn(&str, &K) -> Result<T> + Sync + Send,
    T: Send,
{
    sorted_chromosomes(groups)
        .into_par_iter()
        .map(|chrom| {
            let value = &groups[&chrom];
            let result = f(&chrom, value)?;
            Ok((chrom, result))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<BedRecord> {
        let mut weighted = BedRecord::new("chr1", 15, 25);
        weighted.score = Some(3.0);
        vec![
            BedRecord::new("chr1", 10, 20),
            BedRecord::new("chr2", 100, 200),
            weighted,
        ]
    }

    #[test]
    fn test_group_by_chromosome() {
        let groups = group_records_by_chromosome(records());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["chr1"].len(), 2);
        assert_eq!(groups["chr2"].len(), 1);
        assert_eq!(sorted_chromosomes(&groups), vec!["chr1", "chr2"]);
    }

    #[test]
    fn test_build_indexes() {
        let groups = group_records_by_chromosome(records());
        let plain = build_indexes(&groups, false).unwrap();
        assert_eq!(plain["chr1"].value_at(17), 2.0);
        assert_eq!(plain["chr2"].value_at(150), 1.0);

        let weighted = build_indexes(&groups, true).unwrap();
        assert_eq!(weighted["chr1"].value_at(17), 4.0);
    }

    #[test]
    fn test_process_chromosomes_is_ordered() {
        let groups = group_records_by_chromosome(records());
        let counts = process_chromosomes(&groups, |_, reads| Ok(reads.len())).unwrap();
        assert_eq!(
            counts,
            vec![("chr1".to_string(), 2), ("chr2".to_string(), 1)]
        );
    }

    #[test]
    fn test_oversized_read_is_rejected() {
        let groups = group_records_by_chromosome(vec![BedRecord::new("chr1", 0, 1 << 33)]);
        assert!(build_indexes(&groups, false).is_err());
    }
}
