//! Expression command implementation.
//!
//! Builds one coverage index per chromosome from the reads, then reports for
//! each gene the read count over its exons and its average depth.

use crate::annotation::Annotation;
use crate::bed::{read_annotations, read_records};
use crate::coverage::SparseCoverageIndex;
use crate::error::Result;
use crate::interval::BedRecord;
use crate::output::TsvWriter;
use crate::parallel::{build_indexes, group_records_by_chromosome};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::fmt;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpressionStats {
    pub reads: usize,
    pub chromosomes: usize,
    pub genes: usize,
    /// Genes on a chromosome without reads.
    pub genes_without_reads: usize,
}

impl fmt::Display for ExpressionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reads={} chromosomes={} genes={} genes_without_reads={}",
            self.reads, self.chromosomes, self.genes, self.genes_without_reads
        )
    }
}

/// Expression command configuration.
#[derive(Debug, Clone, Default)]
pub struct ExpressionCommand {
    /// Weight each read by its BED score.
    pub weighted: bool,
}

impl ExpressionCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }

    pub fn run<P: AsRef<Path>, Q: AsRef<Path>, W: Write>(
        &self,
        reads: P,
        genes: Q,
        output: &mut W,
    ) -> Result<ExpressionStats> {
        let reads = read_records(reads)?;
        let genes = read_annotations(genes)?;
        self.expression(reads, &genes, output)
    }

    /// Write one line per gene, in input order.
    pub fn expression<W: Write>(
        &self,
        reads: Vec<BedRecord>,
        genes: &[Annotation],
        output: &mut W,
    ) -> Result<ExpressionStats> {
        let mut stats = ExpressionStats {
            reads: reads.len(),
            genes: genes.len(),
            ..Default::default()
        };
        let groups = group_records_by_chromosome(reads);
        let indexes: FxHashMap<String, SparseCoverageIndex> =
            build_indexes(&groups, self.weighted)?;
        stats.chromosomes = indexes.len();

        let values: Vec<Option<(f64, f64)>> = genes
            .par_iter()
            .map(|gene| {
                indexes.get(&gene.chrom).map(|index| {
                    (
                        index.gene_expression(gene),
                        index.average_value(gene.start(), gene.end()),
                    )
                })
            })
            .collect();

        let mut writer = TsvWriter::new(output);
        for (gene, value) in genes.iter().zip(values) {
            let (expression, average) = value.unwrap_or_else(|| {
                stats.genes_without_reads += 1;
                (0.0, 0.0)
            });
            writer.write_expression(gene, expression, average)?;
        }
        writer.flush()?;
        log::info!("expression: {}", stats);
        Ok(stats)
    }
}
