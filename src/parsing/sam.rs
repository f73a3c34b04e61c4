//! SAM/BAM input: header metadata and a record stream of [`AlignedRead`]s.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use noodles::bam;
use noodles::sam;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::header::record::value::map::read_group::tag as rg_tag;
use thiserror::Error;
use tracing::debug;

use crate::collector::ReadGroupInfo;
use crate::core::record::{AlignedRead, ReadFlags};
use crate::utils::validation::{check_contig_limit, check_read_group_limit, lowercase_file_name};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Too many contigs: {0} exceeds maximum allowed (100000)")]
    TooManyContigs(usize),

    #[error("Too many read groups: {0} exceeds maximum allowed (100000)")]
    TooManyReadGroups(usize),
}

/// Sample and library of every `@RG` record in `header`, in header order
///
/// # Errors
///
/// Returns `ParseError::TooManyReadGroups` if the limit is exceeded.
pub fn read_groups_from_header(header: &sam::Header) -> Result<Vec<ReadGroupInfo>, ParseError> {
    let mut read_groups = Vec::with_capacity(header.read_groups().len());

    for (id, map) in header.read_groups() {
        if check_read_group_limit(read_groups.len()).is_some() {
            return Err(ParseError::TooManyReadGroups(read_groups.len()));
        }

        let fields = map.other_fields();
        let mut info = ReadGroupInfo::new(id.to_string());
        info.sample = fields.get(&rg_tag::SAMPLE).map(ToString::to_string);
        info.library = fields.get(&rg_tag::LIBRARY).map(ToString::to_string);
        read_groups.push(info);
    }

    Ok(read_groups)
}

/// Reads that noodles can decode into a `RecordBuf`
trait RecordSource {
    fn read_header(&mut self) -> io::Result<sam::Header>;
    fn read_record_buf(&mut self, header: &sam::Header, record: &mut RecordBuf) -> io::Result<usize>;
}

impl<R: BufRead> RecordSource for sam::io::Reader<R> {
    fn read_header(&mut self) -> io::Result<sam::Header> {
        sam::io::Reader::read_header(self)
    }

    fn read_record_buf(&mut self, header: &sam::Header, record: &mut RecordBuf) -> io::Result<usize> {
        sam::io::Reader::read_record_buf(self, header, record)
    }
}

impl<R: Read> RecordSource for bam::io::Reader<R> {
    fn read_header(&mut self) -> io::Result<sam::Header> {
        bam::io::Reader::read_header(self)
    }

    fn read_record_buf(&mut self, header: &sam::Header, record: &mut RecordBuf) -> io::Result<usize> {
        bam::io::Reader::read_record_buf(self, header, record)
    }
}

/// Streams [`AlignedRead`]s from a SAM or BAM file.
///
/// The header is read on open; its read groups and reference names are
/// available before the first record.
pub struct AlignmentReader {
    source: Box<dyn RecordSource>,
    header: sam::Header,
    contigs: Vec<String>,
    read_groups: Vec<ReadGroupInfo>,
    record: RecordBuf,
}

impl AlignmentReader {
    /// Open a SAM or BAM file, chosen by extension (SAM when there is none)
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the file cannot be opened,
    /// `ParseError::UnsupportedFormat` for unknown extensions, or
    /// `ParseError::Noodles` if the header cannot be parsed.
    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        let source: Box<dyn RecordSource> = match extension.as_deref() {
            Some("sam") | None => Box::new(sam::io::Reader::new(BufReader::new(File::open(path)?))),
            Some("bam") => Box::new(bam::io::Reader::new(File::open(path)?)),
            Some(_) => {
                return Err(ParseError::UnsupportedFormat(lowercase_file_name(path)));
            }
        };

        Self::from_source(source)
    }

    /// Read SAM text from any buffered reader, such as stdin
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Noodles` if the header cannot be parsed.
    pub fn from_sam_reader<R: BufRead + 'static>(reader: R) -> Result<Self, ParseError> {
        Self::from_source(Box::new(sam::io::Reader::new(reader)))
    }

    fn from_source(mut source: Box<dyn RecordSource>) -> Result<Self, ParseError> {
        let header = source
            .read_header()
            .map_err(|e| ParseError::Noodles(e.to_string()))?;

        let mut contigs = Vec::new();
        for (name, _) in header.reference_sequences() {
            if check_contig_limit(contigs.len()).is_some() {
                return Err(ParseError::TooManyContigs(contigs.len()));
            }
            contigs.push(name.to_string());
        }

        let read_groups = read_groups_from_header(&header)?;
        debug!(
            contigs = contigs.len(),
            read_groups = read_groups.len(),
            "Read alignment header"
        );

        Ok(Self {
            source,
            header,
            contigs,
            read_groups,
            record: RecordBuf::default(),
        })
    }

    /// Reference sequence names from `@SQ`, in header order
    #[must_use]
    pub fn contig_names(&self) -> &[String] {
        &self.contigs
    }

    #[must_use]
    pub fn read_groups(&self) -> &[ReadGroupInfo] {
        &self.read_groups
    }

    /// Decode the next record, or `None` at end of input
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Noodles` if the record cannot be decoded.
    pub fn next_read(&mut self) -> Result<Option<AlignedRead>, ParseError> {
        let n = self
            .source
            .read_record_buf(&self.header, &mut self.record)
            .map_err(|e| ParseError::Noodles(e.to_string()))?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(to_aligned_read(&self.record, &self.contigs)))
    }
}

impl Iterator for AlignmentReader {
    type Item = Result<AlignedRead, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_read().transpose()
    }
}

fn to_aligned_read(record: &RecordBuf, contigs: &[String]) -> AlignedRead {
    let flags = record.flags();
    let mut read = AlignedRead {
        name: record.name().map(ToString::to_string).unwrap_or_default(),
        flags: ReadFlags {
            unmapped: flags.is_unmapped(),
            reverse: flags.is_reverse_complemented(),
            secondary: flags.is_secondary(),
            supplementary: flags.is_supplementary(),
            qc_fail: flags.is_qc_fail(),
            duplicate: flags.is_duplicate(),
        },
        bases: record.sequence().as_ref().to_vec(),
        ..AlignedRead::default()
    };

    if let Some(Value::String(id)) = record.data().get(&Tag::READ_GROUP) {
        read.read_group = Some(id.to_string());
    }

    let contig = record
        .reference_sequence_id()
        .and_then(|id| contigs.get(id));
    if let (false, Some(contig), Some(start)) = (flags.is_unmapped(), contig, record.alignment_start())
    {
        let start = usize::from(start) - 1;
        // An empty CIGAR yields an end before the start; treat it as zero span
        let end = record
            .alignment_end()
            .map_or(start, |end| usize::from(end).max(start));
        read.contig = Some(contig.clone());
        read.start = Some(start);
        read.end = Some(end);
    } else {
        read.flags.unmapped = true;
    }

    read
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use noodles::sam::alignment::io::Write as AlignmentWrite;
    use tempfile::NamedTempFile;

    use super::*;

    const SAM: &str = "@HD\tVN:1.6\tSO:unsorted
@SQ\tSN:chr1\tLN:16
@RG\tID:rg1\tSM:s1\tLB:lib1
@RG\tID:rg2\tSM:s1
r1\t0\tchr1\t1\t60\t4M\t*\t0\t0\tACGT\t*\tRG:Z:rg1
r2\t16\tchr1\t5\t60\t2M1D2M\t*\t0\t0\tCCGG\t*\tRG:Z:rg2
r3\t4\t*\t0\t0\t*\t*\t0\t0\tTTTT\t*
r4\t1536\tchr1\t9\t60\t4M\t*\t0\t0\tGGGG\t*
";

    #[test]
    fn test_read_groups_from_header() {
        let header: sam::Header =
            "@HD\tVN:1.6\n@RG\tID:A\tSM:NA12878\tLB:lib\tPL:ILLUMINA\n@RG\tID:B\n"
                .parse()
                .unwrap();
        let groups = read_groups_from_header(&header).unwrap();
        assert_eq!(
            groups,
            vec![
                ReadGroupInfo::new("A")
                    .with_sample("NA12878")
                    .with_library("lib"),
                ReadGroupInfo::new("B"),
            ]
        );
    }

    #[test]
    fn test_read_sam_records() {
        let reader = AlignmentReader::from_sam_reader(Cursor::new(SAM.as_bytes().to_vec())).unwrap();
        assert_eq!(reader.contig_names(), &["chr1".to_string()]);
        assert_eq!(reader.read_groups().len(), 2);
        assert_eq!(reader.read_groups()[0].library.as_deref(), Some("lib1"));

        let reads: Vec<AlignedRead> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(reads.len(), 4);

        assert_eq!(reads[0].name, "r1");
        assert_eq!(reads[0].read_group.as_deref(), Some("rg1"));
        assert_eq!(reads[0].contig.as_deref(), Some("chr1"));
        assert_eq!((reads[0].start, reads[0].end), (Some(0), Some(4)));
        assert_eq!(reads[0].bases, b"ACGT");

        // 2M1D2M spans five reference bases
        assert!(reads[1].flags.reverse);
        assert_eq!((reads[1].start, reads[1].end), (Some(4), Some(9)));

        assert!(!reads[2].is_mapped());
        assert_eq!(reads[2].contig, None);

        assert!(reads[3].flags.qc_fail);
        assert!(reads[3].flags.duplicate);
        assert_eq!(reads[3].read_group, None);
    }

    #[test]
    fn test_from_path_sam() {
        let mut temp = NamedTempFile::with_suffix(".sam").unwrap();
        temp.write_all(SAM.as_bytes()).unwrap();
        temp.flush().unwrap();

        let reader = AlignmentReader::from_path(temp.path()).unwrap();
        assert_eq!(reader.count(), 4);
    }

    #[test]
    fn test_from_path_bam() {
        let mut sam_reader = sam::io::Reader::new(Cursor::new(SAM.as_bytes().to_vec()));
        let header = sam_reader.read_header().unwrap();
        let records: Vec<RecordBuf> = sam_reader
            .record_bufs(&header)
            .collect::<Result<_, _>>()
            .unwrap();

        let temp = NamedTempFile::with_suffix(".bam").unwrap();
        let mut writer = bam::io::Writer::new(temp.reopen().unwrap());
        writer.write_header(&header).unwrap();
        for record in &records {
            writer.write_alignment_record(&header, record).unwrap();
        }
        writer.finish(&header).unwrap();
        drop(writer);

        let reader = AlignmentReader::from_path(temp.path()).unwrap();
        assert_eq!(reader.contig_names(), &["chr1".to_string()]);
        assert_eq!(reader.read_groups()[0].sample.as_deref(), Some("s1"));
        assert_eq!(reader.read_groups()[0].library.as_deref(), Some("lib1"));

        let reads: Vec<AlignedRead> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(reads.len(), 4);

        assert_eq!(reads[0].read_group.as_deref(), Some("rg1"));
        assert_eq!((reads[0].start, reads[0].end), (Some(0), Some(4)));
        assert_eq!(reads[0].bases, b"ACGT");

        assert!(reads[1].flags.reverse);
        assert_eq!(reads[1].read_group.as_deref(), Some("rg2"));
        assert_eq!((reads[1].start, reads[1].end), (Some(4), Some(9)));

        assert!(!reads[2].is_mapped());
        assert!(reads[3].flags.qc_fail);
        assert!(reads[3].flags.duplicate);
    }

    #[test]
    fn test_unsupported_extension() {
        let temp = NamedTempFile::with_suffix(".cram").unwrap();
        assert!(matches!(
            AlignmentReader::from_path(temp.path()),
            Err(ParseError::UnsupportedFormat(_))
        ));
    }
}
