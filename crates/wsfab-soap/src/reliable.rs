//! WS-ReliableMessaging state (spec.md §3.3, §4.7 step 3, glossary).

/// One `AcknowledgementRange(Lower,Upper)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckRange {
    pub lower: u32,
    pub upper: u32,
}

/// WS-RM header state carried on `SoapMessage`.
#[derive(Debug, Clone, Default)]
pub struct Reliable {
    pub reliable: bool,
    pub client_seq_guid: Option<String>,
    pub server_seq_guid: Option<String>,
    pub client_msg_number: u32,
    pub server_msg_number: u32,
    pub last_message: bool,
    pub acknowledged_ranges: Vec<AckRange>,
}

impl Reliable {
    pub fn server_sequence_id(&mut self) -> &str {
        self.server_seq_guid.get_or_insert_with(|| format!("urn:uuid:{}", uuid::Uuid::new_v4()))
    }

    /// The acknowledgement range to emit: the known ranges if any were
    /// recorded, else the `(1, server_msg_number)` fallback (spec.md
    /// §4.7 step 3).
    pub fn ranges_to_acknowledge(&self) -> Vec<AckRange> {
        if self.acknowledged_ranges.is_empty() {
            vec![AckRange { lower: 1, upper: self.server_msg_number }]
        } else {
            self.acknowledged_ranges.clone()
        }
    }

    /// Computes gaps between the acknowledged ranges (caller decides what
    /// to do with them, e.g. request retransmission — spec.md §4.7's
    /// decomposition step: "computing any range gaps for retransmit
    /// (caller concern)").
    pub fn gaps(&self) -> Vec<(u32, u32)> {
        let mut ranges = self.acknowledged_ranges.clone();
        ranges.sort_by_key(|r| r.lower);
        let mut gaps = Vec::new();
        let mut expected = 1u32;
        for range in &ranges {
            if range.lower > expected {
                gaps.push((expected, range.lower - 1));
            }
            expected = range.upper + 1;
        }
        gaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_range_covers_one_through_server_number_when_nothing_recorded() {
        let r = Reliable { server_msg_number: 5, ..Default::default() };
        assert_eq!(r.ranges_to_acknowledge(), vec![AckRange { lower: 1, upper: 5 }]);
    }

    #[test]
    fn gaps_detects_a_missing_middle_range() {
        let r = Reliable {
            acknowledged_ranges: vec![AckRange { lower: 1, upper: 2 }, AckRange { lower: 5, upper: 6 }],
            ..Default::default()
        };
        assert_eq!(r.gaps(), vec![(3, 4)]);
    }
}
