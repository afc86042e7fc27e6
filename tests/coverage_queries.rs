//! Coverage index queries checked against brute force over random reads.

use countrun::interval::Strand;
use countrun::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn random_reads(rng: &mut SmallRng, n: usize) -> Vec<(u32, u32)> {
    (0..n)
        .map(|_| {
            let start = rng.gen_range(0..300);
            (start, start + rng.gen_range(1..60))
        })
        .collect()
}

fn build(reads: &[(u32, u32)]) -> SparseCoverageIndex {
    let mut index = SparseCoverageIndex::new();
    for &(start, end) in reads {
        index.populate(start, end);
    }
    index.accumulate();
    index
}

fn overlaps(read: (u32, u32), start: u32, end: u32) -> bool {
    read.0 <= end && read.1 > start
}

fn contained(read: (u32, u32), start: u32, end: u32) -> bool {
    read.0 >= start && read.1 - 1 <= end
}

#[test]
fn test_queries_match_brute_force() {
    let mut rng = SmallRng::seed_from_u64(17);
    let reads = random_reads(&mut rng, 120);
    let index = build(&reads);

    for position in 0..400 {
        let depth = reads
            .iter()
            .filter(|&&(s, e)| s <= position && position < e)
            .count() as f64;
        assert_eq!(index.value_at(position), depth, "depth at {}", position);
    }

    for _ in 0..300 {
        let start = rng.gen_range(0..380);
        let end = start + rng.gen_range(0..60);

        let overlap = reads.iter().filter(|&&r| overlaps(r, start, end)).count() as f64;
        let inside = reads.iter().filter(|&&r| contained(r, start, end)).count() as f64;
        assert_eq!(index.overlap_count(start, end), overlap, "[{}, {}]", start, end);
        assert_eq!(
            index.strictly_contained_count(start, end),
            inside,
            "[{}, {}]",
            start,
            end
        );
        assert!(overlap >= inside);

        let mean = (start..=end).map(|p| index.value_at(p)).sum::<f64>() / (end - start + 1) as f64;
        assert!((index.average_value(start, end) - mean).abs() < 1e-9);
    }
}

#[test]
fn test_gene_expression_matches_brute_force() {
    let mut rng = SmallRng::seed_from_u64(23);
    let reads = random_reads(&mut rng, 200);
    let index = build(&reads);

    let exons = vec![
        Segment::new(20, 59),
        Segment::new(120, 149),
        Segment::new(230, 279),
    ];
    let gene = Annotation::new("g", "chr1", Strand::Plus, exons.clone());

    // Reads touching the gene span, minus those lying wholly within one intron.
    let introns: Vec<Segment> = gene.introns().collect();
    assert_eq!(introns, vec![Segment::new(60, 119), Segment::new(150, 229)]);
    let expected = reads
        .iter()
        .filter(|&&r| overlaps(r, 20, 279))
        .filter(|&&r| !introns.iter().any(|i| contained(r, i.start, i.end)))
        .count() as f64;

    assert_eq!(index.gene_expression(&gene), expected);
}

#[test]
fn test_expression_from_bed_text() {
    let reads = parse_records(
        "chr1\t100\t150\nchr1\t160\t190\nchr1\t195\t260\nchr2\t0\t10\n",
    )
    .unwrap();
    let genes = parse_annotations(
        "chr1\t100\t300\tgeneA\t0\t+\t100\t300\t0\t2\t50,50,\t0,150,\n",
    )
    .unwrap();

    let mut index = SparseCoverageIndex::new();
    for read in reads.iter().filter(|r| r.chrom() == "chr1") {
        index.populate(read.start() as u32, read.end() as u32);
    }
    index.accumulate();

    // exons [100,149] [250,299]; intron [150,249] holds only 160-190
    assert_eq!(index.gene_expression(&genes[0]), 2.0);
}
