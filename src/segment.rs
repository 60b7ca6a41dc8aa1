// ABOUTME: Splits SMS text into fixed-size chunks with optional "(i/N) " counters
// ABOUTME: Also derives the chunk size from the transport's segment capacity estimate

use tracing::debug;

/// Characters reserved for the longest plausible `(i/N) ` counter
pub const COUNTER_RESERVE: usize = 6;

/// Capacity estimate reported by the transport for one body of text
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct SegmentCapacity {
    /// Number of SMS segments the text needs
    pub segment_count: usize,
    /// Code units consumed by the text
    pub code_units_used: usize,
    /// Code units still free in the last segment
    pub code_units_remaining: usize,
}

impl SegmentCapacity {
    pub fn new(segment_count: usize, code_units_used: usize, code_units_remaining: usize) -> Self {
        Self {
            segment_count,
            code_units_used,
            code_units_remaining,
        }
    }
}

/// How a body will be cut before sending
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SplitPlan {
    pub chunk_limit: usize,
    pub counter: bool,
}

/// Derive the chunk size for `body`.
///
/// The characters the full segment set can hold are spread evenly over the
/// segments. When counters are requested and the body will actually be cut,
/// room for the counter is taken off each chunk.
pub fn plan_split(body: &str, capacity: &SegmentCapacity, with_counter: bool) -> SplitPlan {
    let length = body.chars().count();
    let segments = capacity.segment_count.max(1);
    let mut chunk_limit = (length + capacity.code_units_remaining) / segments;

    let counter = with_counter && length > chunk_limit;
    if counter {
        chunk_limit = chunk_limit.saturating_sub(COUNTER_RESERVE);
    }

    let plan = SplitPlan {
        chunk_limit: chunk_limit.max(1),
        counter,
    };
    debug!(length, chunk_limit = plan.chunk_limit, counter, "Planned SMS split");
    plan
}

/// Plan that keeps the whole body in one chunk
pub fn unsplit(body: &str) -> SplitPlan {
    SplitPlan {
        chunk_limit: body.chars().count().max(1),
        counter: false,
    }
}

/// Cut `body` every `chunk_limit` characters.
///
/// An empty body yields one empty chunk. Counters are prefixed after
/// cutting and only when there is more than one chunk.
pub fn split_by_length(body: &str, chunk_limit: usize, counter: bool) -> Vec<String> {
    let chars: Vec<char> = body.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }

    let chunks: Vec<String> = chars
        .chunks(chunk_limit.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect();

    if !counter || chunks.len() == 1 {
        return chunks;
    }

    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| format!("({}/{}) {}", index + 1, total, chunk))
        .collect()
}

/// Split following a plan
pub fn split(body: &str, plan: SplitPlan) -> Vec<String> {
    split_by_length(body, plan.chunk_limit, plan.counter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_counter(chunk: &str) -> &str {
        match chunk.find(") ") {
            Some(index) if chunk.starts_with('(') => &chunk[index + 2..],
            _ => chunk,
        }
    }

    #[test]
    fn empty_body_is_one_empty_chunk() {
        assert_eq!(split_by_length("", 10, true), vec![String::new()]);
    }

    #[test]
    fn chunks_concatenate_back() {
        let body: String = ('a'..='z').cycle().take(95).collect();
        for limit in [1, 7, 10, 94, 95, 200] {
            let chunks = split_by_length(&body, limit, false);
            assert_eq!(chunks.len(), body.len().div_ceil(limit), "limit {limit}");
            assert!(chunks.iter().all(|c| c.chars().count() <= limit));
            assert_eq!(chunks.concat(), body);

            let counted = split_by_length(&body, limit, true);
            let rebuilt: String = counted.iter().map(|c| strip_counter(c)).collect();
            assert_eq!(rebuilt, body);
        }
    }

    #[test]
    fn counters_only_when_more_than_one_chunk() {
        assert_eq!(split_by_length("short", 160, true), vec!["short".to_string()]);

        let chunks = split_by_length("abcdef", 2, true);
        assert_eq!(chunks, vec!["(1/3) ab", "(2/3) cd", "(3/3) ef"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let chunks = split_by_length("ééééé", 2, false);
        assert_eq!(chunks, vec!["éé", "éé", "é"]);
    }

    #[test]
    fn long_body_with_counters() {
        let body = "x".repeat(320);
        let chunks = split_by_length(&body, 160, true);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with("(1/2) "));
        assert!(chunks[1].starts_with("(2/2) "));
        assert!(chunks.iter().all(|c| c.chars().count() <= 167));
    }

    #[test]
    fn plan_spreads_capacity_over_segments() {
        // 320 GSM characters need 3 segments of 153 with 139 to spare
        let body = "x".repeat(320);
        let capacity = SegmentCapacity::new(3, 320, 139);

        let plan = plan_split(&body, &capacity, false);
        assert_eq!(plan, SplitPlan { chunk_limit: 153, counter: false });

        let plan = plan_split(&body, &capacity, true);
        assert_eq!(plan, SplitPlan { chunk_limit: 147, counter: true });
        assert_eq!(split(&body, plan).len(), 3);
    }

    #[test]
    fn plan_skips_counter_for_single_segment() {
        let capacity = SegmentCapacity::new(1, 5, 155);
        let plan = plan_split("hello", &capacity, true);
        assert_eq!(plan, SplitPlan { chunk_limit: 160, counter: false });
    }

    #[test]
    fn unsplit_keeps_one_chunk() {
        let body = "y".repeat(500);
        assert_eq!(split(&body, unsplit(&body)).len(), 1);
        assert_eq!(split("", unsplit("")), vec![String::new()]);
    }
}
