//! Flow-order scanning.
//!
//! A flow-based sequencer introduces one nucleotide per flow, cycling through a
//! fixed flow order. At each flow the polymerase extends across the whole
//! homopolymer run matching that nucleotide, so the number of bases a read can
//! reach within `n` flows depends on the template sequence. [`scan_length`]
//! computes that number for a single template slice and [`FlowScanner`] applies
//! it to every window of a reference sequence.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{MetricsError, Result};

/// A non-empty cyclic flow order over `{A, C, G, T}`, stored upper case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FlowOrder(Vec<u8>);

impl FlowOrder {
    /// Parse a flow order such as `TGCA`.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidConfiguration` if the order is empty or
    /// contains a symbol outside `ACGT`.
    pub fn new(order: &str) -> Result<Self> {
        if order.is_empty() {
            return Err(MetricsError::invalid("flow-order", "must not be empty"));
        }

        let mut symbols = Vec::with_capacity(order.len());
        for byte in order.bytes() {
            let upper = byte.to_ascii_uppercase();
            if !matches!(upper, b'A' | b'C' | b'G' | b'T') {
                return Err(MetricsError::invalid(
                    "flow-order",
                    format!("invalid symbol '{}' in '{order}'", byte as char),
                ));
            }
            symbols.push(upper);
        }

        Ok(Self(symbols))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a constructed order
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The symbol introduced at flow `index`
    #[must_use]
    pub fn symbol(&self, index: usize) -> u8 {
        self.0[index % self.0.len()]
    }
}

impl TryFrom<String> for FlowOrder {
    type Error = MetricsError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<FlowOrder> for String {
    fn from(order: FlowOrder) -> Self {
        order.to_string()
    }
}

impl fmt::Display for FlowOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Number of bases of `slice` consumed by `flow_count` flows of `flow_order`.
///
/// Each flow consumes the full run of bases equal to its symbol at the cursor.
/// The scan stops at the end of `slice`, so the result never exceeds
/// `slice.len()`. Slice bases are compared case-insensitively and anything
/// outside `ACGT` ends consumption.
///
/// # Examples
///
/// ```
/// use flow_metrics::core::flow::{scan_length, FlowOrder};
///
/// let order = FlowOrder::new("TGCA").unwrap();
/// assert_eq!(scan_length(b"TGCATGCA", &order, 4), 4);
/// assert_eq!(scan_length(b"TTGCAC", &order, 4), 5);
/// assert_eq!(scan_length(b"ACGT", &order, 0), 0);
/// ```
#[must_use]
pub fn scan_length(slice: &[u8], flow_order: &FlowOrder, flow_count: usize) -> usize {
    let mut cursor = 0;
    for flow in 0..flow_count {
        if cursor == slice.len() {
            break;
        }
        let symbol = flow_order.symbol(flow);
        while cursor < slice.len() && slice[cursor].to_ascii_uppercase() == symbol {
            cursor += 1;
        }
    }
    cursor
}

/// Validated flow parameters shared by the scanner and the flow-bias metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    pub flow_order: FlowOrder,
    pub flow_count: usize,
}

impl FlowConfig {
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidConfiguration` if the flow order is
    /// invalid or `flow_count` is zero (the scan window would be empty).
    pub fn new(flow_order: &str, flow_count: usize) -> Result<Self> {
        let flow_order = FlowOrder::new(flow_order)?;
        if flow_count == 0 {
            return Err(MetricsError::invalid(
                "flow-count",
                "a flow count of 0 gives an empty scan window",
            ));
        }
        Ok(Self {
            flow_order,
            flow_count,
        })
    }

    /// Window size used when scanning a reference; equal to the flow count
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.flow_count
    }
}

/// Applies [`scan_length`] at every window start of a sequence
#[derive(Debug, Clone)]
pub struct FlowScanner {
    config: FlowConfig,
}

impl FlowScanner {
    #[must_use]
    pub fn new(config: FlowConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Flow length of a single window
    #[must_use]
    pub fn scan(&self, window: &[u8]) -> usize {
        scan_length(window, &self.config.flow_order, self.config.flow_count)
    }

    /// Flow length for every full window of `sequence`, in position order.
    ///
    /// A sequence shorter than the window yields nothing.
    pub fn window_lengths<'a>(&'a self, sequence: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
        sequence
            .windows(self.config.window_size())
            .map(move |window| self.scan(window))
    }

    /// Histogram of window flow lengths, indexed `0..=flow_count`
    #[must_use]
    pub fn histogram(&self, sequence: &[u8]) -> Vec<u64> {
        let mut counts = vec![0u64; self.config.flow_count + 1];
        for length in self.window_lengths(sequence) {
            counts[length] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tgca() -> FlowOrder {
        FlowOrder::new("TGCA").unwrap()
    }

    #[test]
    fn test_flow_order_rejects_empty() {
        let result = FlowOrder::new("");
        assert!(matches!(
            result,
            Err(MetricsError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_flow_order_rejects_non_nucleotide() {
        assert!(FlowOrder::new("TGNA").is_err());
        assert!(FlowOrder::new("TG-A").is_err());
    }

    #[test]
    fn test_flow_order_uppercases() {
        let order = FlowOrder::new("tgca").unwrap();
        assert_eq!(order.to_string(), "TGCA");
    }

    #[test]
    fn test_flow_order_cycles() {
        let order = tgca();
        assert_eq!(order.symbol(0), b'T');
        assert_eq!(order.symbol(4), b'T');
        assert_eq!(order.symbol(7), b'A');
    }

    #[test]
    fn test_scan_length_one_base_per_flow() {
        assert_eq!(scan_length(b"TGCAC", &tgca(), 4), 4);
    }

    #[test]
    fn test_scan_length_homopolymer_in_one_flow() {
        // T consumes "TT", G "G", C "C", A "A"
        assert_eq!(scan_length(b"TTGCAC", &tgca(), 4), 5);
    }

    #[test]
    fn test_scan_length_skips_absent_flows() {
        // T and G flows consume nothing; C consumes "C"; A consumes "AA"
        assert_eq!(scan_length(b"CAAG", &tgca(), 4), 3);
    }

    #[test]
    fn test_scan_length_zero_flows() {
        assert_eq!(scan_length(b"TGCA", &tgca(), 0), 0);
    }

    #[test]
    fn test_scan_length_stops_at_slice_end() {
        assert_eq!(scan_length(b"TTTT", &tgca(), 10), 4);
        assert_eq!(scan_length(b"", &tgca(), 10), 0);
    }

    #[test]
    fn test_scan_length_case_insensitive() {
        assert_eq!(scan_length(b"tgca", &tgca(), 4), 4);
    }

    #[test]
    fn test_scan_length_n_stops_consumption() {
        assert_eq!(scan_length(b"TNGCA", &tgca(), 8), 1);
    }

    #[test]
    fn test_flow_config_rejects_zero_flows() {
        let error = FlowConfig::new("TGCA", 0).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid configuration for 'flow-count': a flow count of 0 gives an empty scan window"
        );
        assert!(FlowConfig::new("", 4).is_err());
        assert!(FlowConfig::new("TGCA", 4).is_ok());
    }

    #[test]
    fn test_window_lengths() {
        let scanner = FlowScanner::new(FlowConfig::new("TGCA", 2).unwrap());
        // windows: TG, GC, CA, AT
        let lengths: Vec<usize> = scanner.window_lengths(b"TGCAT").collect();
        assert_eq!(lengths, vec![2, 1, 0, 0]);
    }

    #[test]
    fn test_window_lengths_short_sequence() {
        let scanner = FlowScanner::new(FlowConfig::new("TGCA", 8).unwrap());
        assert_eq!(scanner.window_lengths(b"TGCA").count(), 0);
        assert_eq!(scanner.histogram(b"TGCA"), vec![0; 9]);
    }

    #[test]
    fn test_histogram() {
        let scanner = FlowScanner::new(FlowConfig::new("TGCA", 2).unwrap());
        assert_eq!(scanner.histogram(b"TGCAT"), vec![2, 1, 1]);
    }
}
