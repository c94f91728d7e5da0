//! Per-repeat-block stitch-count math (spec section 4.5.1).

use stitch_model::{RepeatBlock, RepeatMode};

/// Net stitch-count change contributed by one `RepeatBlock`, plus an
/// optional diagnostic message. The caller classifies the message as a
/// warning if it mentions "does not divide evenly" or "leftover", and as an
/// error otherwise.
pub struct BlockOutcome {
    pub net_change: i64,
    pub message: Option<String>,
}

/// Evaluate one repeat block against the stitches available to it.
pub fn evaluate_repeat_block(block: &RepeatBlock, available: i64) -> BlockOutcome {
    let consumed_per = block.consumed_per_repeat();
    let net_per = block.net_per_repeat();

    match block.mode {
        RepeatMode::Fixed(n) => {
            if consumed_per == 0 {
                return BlockOutcome { net_change: net_per * n, message: None };
            }
            let total_consumed = consumed_per * n;
            if total_consumed > available {
                return BlockOutcome {
                    net_change: 0,
                    message: Some(format!(
                        "Repeat block consumes {consumed_per} sts x {n} = {total_consumed} sts, but only {available} available"
                    )),
                };
            }
            BlockOutcome { net_change: net_per * n, message: None }
        }
        RepeatMode::UntilRemain(k) => {
            if consumed_per == 0 {
                return BlockOutcome {
                    net_change: 0,
                    message: Some("Repeat block consumes 0 stitches — infinite loop".to_string()),
                };
            }
            let workable = available - k;
            if workable < 0 {
                return BlockOutcome {
                    net_change: 0,
                    message: Some(format!("'Until {k} sts remain' but only {available} available")),
                };
            }
            let repeats = workable / consumed_per;
            if repeats == 0 {
                return BlockOutcome { net_change: 0, message: None };
            }
            let leftover = workable - repeats * consumed_per;
            if leftover != 0 {
                return BlockOutcome {
                    net_change: net_per * repeats,
                    message: Some(format!(
                        "Repeat block does not divide evenly: {workable} workable sts / {consumed_per} per repeat = {repeats} repeats with {leftover} leftover"
                    )),
                };
            }
            BlockOutcome { net_change: net_per * repeats, message: None }
        }
        RepeatMode::ToEnd => {
            if consumed_per == 0 {
                return BlockOutcome {
                    net_change: 0,
                    message: Some("Repeat-to-end block consumes 0 stitches — infinite loop".to_string()),
                };
            }
            let repeats = available / consumed_per;
            let leftover = available % consumed_per;
            if leftover != 0 {
                return BlockOutcome {
                    net_change: net_per * repeats,
                    message: Some(format!(
                        "Repeat-to-end does not divide evenly: {available} sts / {consumed_per} per repeat = {repeats} repeats with {leftover} leftover"
                    )),
                };
            }
            BlockOutcome { net_change: net_per * repeats, message: None }
        }
    }
}

/// After a block executes, how much of `remaining` it consumes -- used by
/// the row evaluator to feed the correct `available` count to the next
/// block in the same row.
pub fn remaining_after(block: &RepeatBlock, remaining: i64) -> i64 {
    let consumed_per = block.consumed_per_repeat();
    match block.mode {
        RepeatMode::Fixed(n) => remaining - consumed_per * n,
        RepeatMode::ToEnd => {
            if consumed_per > 0 {
                let repeats = remaining / consumed_per;
                remaining - consumed_per * repeats
            } else {
                remaining
            }
        }
        RepeatMode::UntilRemain(k) => k,
    }
}
