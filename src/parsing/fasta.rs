//! Loads a FASTA reference into memory using noodles.
//!
//! Supports both uncompressed and gzip/bgzip compressed files.
//!
//! Supported extensions:
//! - `.fa`, `.fasta`, `.fna` (uncompressed)
//! - `.fa.gz`, `.fasta.gz`, `.fna.gz` (gzip compressed)
//! - `.fa.bgz`, `.fasta.bgz`, `.fna.bgz` (bgzip compressed)

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use noodles::fasta;
use tracing::debug;

use crate::core::record::ReferenceWindowSource;
use crate::parsing::sam::ParseError;
use crate::utils::validation::{check_contig_limit, is_gzipped};

/// Every contig of a reference, held in memory in file order.
///
/// Bases are uppercased on load so that soft-masked (lowercase) regions
/// compare equal to unmasked ones.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSequences {
    contigs: Vec<(String, Vec<u8>)>,
    index: HashMap<String, usize>,
}

impl ReferenceSequences {
    /// Read a FASTA file, decompressing `.gz`/`.bgz` files transparently
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
    /// parsing fails, `ParseError::InvalidFormat` if no contigs are found or a
    /// contig name repeats, or `ParseError::TooManyContigs` if the limit is exceeded.
    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        let file = std::fs::File::open(path)?;
        if is_gzipped(path) {
            Self::from_reader(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Self::from_reader(BufReader::new(file))
        }
    }

    /// Read FASTA records from any buffered reader
    ///
    /// # Errors
    ///
    /// See [`from_path`](Self::from_path).
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        let mut reader = fasta::io::Reader::new(reader);
        let mut sequences = Self::default();

        for result in reader.records() {
            let record = result
                .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

            // Check contig limit for DOS protection
            if check_contig_limit(sequences.contigs.len()).is_some() {
                return Err(ParseError::TooManyContigs(sequences.contigs.len()));
            }

            let name = String::from_utf8_lossy(record.name()).to_string();
            let bases: Vec<u8> = record
                .sequence()
                .as_ref()
                .iter()
                .map(u8::to_ascii_uppercase)
                .collect();

            sequences.push(name, bases)?;
        }

        if sequences.contigs.is_empty() {
            return Err(ParseError::InvalidFormat(
                "No sequences found in FASTA file".to_string(),
            ));
        }

        debug!(
            contigs = sequences.len(),
            bases = sequences.total_bases(),
            "Loaded reference"
        );
        Ok(sequences)
    }

    fn push(&mut self, name: String, bases: Vec<u8>) -> Result<(), ParseError> {
        if self.index.contains_key(&name) {
            return Err(ParseError::InvalidFormat(format!(
                "Duplicate contig name in FASTA: {name}"
            )));
        }
        self.index.insert(name.clone(), self.contigs.len());
        self.contigs.push((name, bases));
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    #[must_use]
    pub fn total_bases(&self) -> u64 {
        self.contigs.iter().map(|(_, bases)| bases.len() as u64).sum()
    }

}

impl ReferenceWindowSource for ReferenceSequences {
    fn contig_names(&self) -> Vec<&str> {
        self.contigs.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn sequence(&self, name: &str) -> Option<&[u8]> {
        self.index
            .get(name)
            .map(|&i| self.contigs[i].1.as_slice())
    }
}
