use serde::{Deserialize, Serialize};

use crate::core::error::MalformedRecord;

/// Subset of SAM flags the metrics care about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadFlags {
    pub unmapped: bool,
    pub reverse: bool,
    pub secondary: bool,
    pub supplementary: bool,
    pub qc_fail: bool,
    pub duplicate: bool,
}

impl ReadFlags {
    /// Neither secondary nor supplementary
    #[must_use]
    pub fn is_primary(&self) -> bool {
        !self.secondary && !self.supplementary
    }
}

/// A decoded alignment record.
///
/// Positions are 0-based; `end` is exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedRead {
    pub name: String,
    pub flags: ReadFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contig: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
    pub bases: Vec<u8>,
}

impl AlignedRead {
    /// An unmapped read with the given bases
    pub fn new(name: impl Into<String>, bases: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            flags: ReadFlags {
                unmapped: true,
                ..ReadFlags::default()
            },
            bases: bases.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_read_group(mut self, read_group: impl Into<String>) -> Self {
        self.read_group = Some(read_group.into());
        self
    }

    /// Place the read on `contig` over `[start, end)`
    #[must_use]
    pub fn mapped_to(mut self, contig: impl Into<String>, start: usize, end: usize) -> Self {
        self.contig = Some(contig.into());
        self.start = Some(start);
        self.end = Some(end);
        self.flags.unmapped = false;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: ReadFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn is_mapped(&self) -> bool {
        !self.flags.unmapped && self.start.is_some()
    }

    /// Number of reference bases covered by the alignment
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord::InvertedAlignment` if the end precedes the start.
    pub fn reference_span(&self) -> Result<usize, MalformedRecord> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end < start => Err(MalformedRecord::InvertedAlignment {
                read: self.name.clone(),
                start,
                end,
            }),
            (Some(start), Some(end)) => Ok(end - start),
            _ => Ok(0),
        }
    }
}

/// A read bound to the bases of the contig it aligns to.
///
/// The reference is `None` for unmapped reads or when the contig is absent
/// from the reference.
#[derive(Debug, Clone, Copy)]
pub struct ReadReferencePair<'a> {
    pub read: &'a AlignedRead,
    pub reference: Option<&'a [u8]>,
}

impl<'a> ReadReferencePair<'a> {
    #[must_use]
    pub fn new(read: &'a AlignedRead, reference: Option<&'a [u8]>) -> Self {
        Self { read, reference }
    }

    /// Reference bases of length `size` anchored at the read's 5' end.
    ///
    /// For forward reads the window starts at the alignment start; for reverse
    /// reads it ends at the alignment end. The returned slice is always on the
    /// forward strand. Returns `Ok(None)` when the read is unmapped.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord` if the read is mapped without reference bases
    /// or the window falls off either end of the contig.
    pub fn five_prime_window(&self, size: usize) -> Result<Option<&'a [u8]>, MalformedRecord> {
        let read = self.read;
        let Some(start) = read.start.filter(|_| read.is_mapped()) else {
            return Ok(None);
        };
        let bases = self
            .reference
            .ok_or_else(|| MalformedRecord::MissingReference {
                read: read.name.clone(),
            })?;

        let out_of_bounds = |window_start: usize| MalformedRecord::WindowOutOfBounds {
            read: read.name.clone(),
            start: window_start,
            needed: size,
            contig_length: bases.len(),
        };

        let window_start = if read.flags.reverse {
            let end = read.end.unwrap_or(start);
            end.checked_sub(size).ok_or_else(|| out_of_bounds(0))?
        } else {
            start
        };

        bases
            .get(window_start..window_start + size)
            .map(Some)
            .ok_or_else(|| out_of_bounds(window_start))
    }
}

/// Supplies reference sequences by name, in dictionary order.
///
/// Implemented by the in-memory FASTA loader; tests use plain vectors.
pub trait ReferenceWindowSource {
    /// Contig names in dictionary order
    fn contig_names(&self) -> Vec<&str>;

    /// Bases of the named contig
    fn sequence(&self, name: &str) -> Option<&[u8]>;

    /// Bases of the contig `read` is aligned to, if any
    fn sequence_for(&self, read: &AlignedRead) -> Option<&[u8]> {
        read.contig.as_deref().and_then(|name| self.sequence(name))
    }
}

impl ReferenceWindowSource for Vec<(String, Vec<u8>)> {
    fn contig_names(&self) -> Vec<&str> {
        self.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn sequence(&self, name: &str) -> Option<&[u8]> {
        self.iter()
            .find(|(contig, _)| contig == name)
            .map(|(_, bases)| bases.as_slice())
    }
}
