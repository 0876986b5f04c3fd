/// Computes the checkpoint that should be persisted after delivering one
/// batch, given the tracked value of every row in the batch (in
/// non-decreasing `_tracked_field` order) and the checkpoint threaded in
/// from the previous batch of the same extraction run.
///
/// - A batch shorter than `batch_size` is the tail of the run: nothing more
///   is pending this cycle, so the checkpoint becomes `(last row's value, 0)`
///   unconditionally — this takes precedence even if the tail is itself
///   part of an still-open tied group (see the `tail_rule_wins_over_tie`
///   test).
/// - A full batch entirely tied to one value extends (or starts) that
///   value's running count, since more rows at the same value may still
///   arrive in the next batch.
/// - A full batch whose trailing run is shorter than the batch has a
///   boundary row where the tracked value changes for the last time: the
///   checkpoint stays at that row's value (not the tied value itself, since
///   `render` binds it against `>` and must not exclude the still-open tied
///   rows that follow it) with `offset` set to the full trailing count, so
///   a resumed query re-skips exactly the tied rows already delivered.
/// - An empty batch leaves the checkpoint untouched.
pub fn compute_checkpoint(
    tracked_values: &[String],
    batch_size: usize,
    running_value: Option<&str>,
    running_offset: u64,
) -> (Option<String>, u64) {
    if tracked_values.is_empty() {
        return (running_value.map(str::to_string), running_offset);
    }

    let last_value = tracked_values.last().unwrap();

    if tracked_values.len() < batch_size {
        return (Some(last_value.clone()), 0);
    }

    let trailing_count = tracked_values
        .iter()
        .rev()
        .take_while(|value| *value == last_value)
        .count();

    if trailing_count == tracked_values.len() {
        let offset = if running_value == Some(last_value.as_str()) {
            running_offset + trailing_count as u64
        } else {
            trailing_count as u64
        };
        (Some(last_value.clone()), offset)
    } else {
        let boundary_value = tracked_values[tracked_values.len() - trailing_count - 1].clone();
        (Some(boundary_value), trailing_count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(vs: &[&str]) -> Vec<String> {
        vs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_batch_propagates_incoming_checkpoint_unchanged() {
        let (value, offset) = compute_checkpoint(&[], 2, Some("2022-01-01"), 3);
        assert_eq!(value.as_deref(), Some("2022-01-01"));
        assert_eq!(offset, 3);
    }

    #[test]
    fn tail_batch_sets_offset_to_zero() {
        let (value, offset) = compute_checkpoint(&values(&["A", "B"]), 5, None, 0);
        assert_eq!(value.as_deref(), Some("B"));
        assert_eq!(offset, 0);
    }

    #[test]
    fn s3_full_batch_of_distinct_values_closes_at_last_row() {
        // batch_size=5, rows 1..5 of 7 distinct timestamps.
        let (value, offset) = compute_checkpoint(&values(&["1", "2", "3", "4", "5"]), 5, None, 0);
        assert_eq!(value.as_deref(), Some("5"));
        assert_eq!(offset, 0);
    }

    #[test]
    fn s3_tail_batch_of_remaining_distinct_rows() {
        let (value, offset) = compute_checkpoint(&values(&["6", "7"]), 5, Some("5"), 0);
        assert_eq!(value.as_deref(), Some("7"));
        assert_eq!(offset, 0);
    }

    #[test]
    fn s4_full_batch_entirely_tied_accumulates_fresh_offset() {
        // batch_size=3, 5 rows all at T.
        let (value, offset) = compute_checkpoint(&values(&["T", "T", "T"]), 3, None, 0);
        assert_eq!(value.as_deref(), Some("T"));
        assert_eq!(offset, 3);
    }

    #[test]
    fn tail_rule_wins_over_tie() {
        // The remaining 2 of the 5 T-valued rows arrive as a tail batch;
        // the tail rule resets offset to 0 even though the whole group
        // (5 rows) shares one timestamp.
        let (value, offset) = compute_checkpoint(&values(&["T", "T"]), 3, Some("T"), 3);
        assert_eq!(value.as_deref(), Some("T"));
        assert_eq!(offset, 0);
    }

    #[test]
    fn whole_tied_batch_continuing_running_value_accumulates() {
        let (value, offset) = compute_checkpoint(&values(&["T", "T"]), 2, Some("T"), 3);
        assert_eq!(value.as_deref(), Some("T"));
        assert_eq!(offset, 5);
    }

    #[test]
    fn mixed_full_batch_keeps_boundary_value_and_full_tied_count() {
        // Rows at B continue past this chunk (e.g. more B-valued rows still
        // pending), so the checkpoint must stay at the last differing value
        // (A) with offset covering all 3 delivered B rows - using B itself
        // as the checkpoint value would make the resumed `> B` predicate
        // exclude the undelivered B rows outright.
        let (value, offset) = compute_checkpoint(&values(&["A", "A", "B", "B", "B"]), 5, Some("A"), 1);
        assert_eq!(value.as_deref(), Some("A"));
        assert_eq!(offset, 3);
    }
}
