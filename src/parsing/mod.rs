//! Readers for the two inputs of a metrics run.
//!
//! - **FASTA** ([`fasta`]): the reference, loaded into memory so bias
//!   metrics can look up the bases under any read
//! - **SAM/BAM** ([`sam`]): alignment records plus the `@RG` table that maps
//!   read groups to samples and libraries
//!
//! ## Example
//!
//! ```rust,no_run
//! use flow_metrics::parsing::fasta::ReferenceSequences;
//! use flow_metrics::parsing::sam::AlignmentReader;
//! use std::path::Path;
//!
//! let reference = ReferenceSequences::from_path(Path::new("ref.fa")).unwrap();
//! let reader = AlignmentReader::from_path(Path::new("sample.bam")).unwrap();
//! println!("{} contigs, {} read groups", reference.len(), reader.read_groups().len());
//! for read in reader {
//!     let read = read.unwrap();
//!     println!("{} {:?}", read.name, read.contig);
//! }
//! ```
//!
//! ## `@RG` Tags
//!
//! | Tag | Description | Used for |
//! |-----|-------------|----------|
//! | ID  | Read group identifier | `READ_GROUP` level |
//! | SM  | Sample | `SAMPLE` level |
//! | LB  | Library | `LIBRARY` level |

pub mod fasta;
pub mod sam;
