/// Result of dividing one well's stock across repeated dispenses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub count: u32,
    pub stock_volume_ul: f64,
    pub buffer_volume_ul: f64,
}

/// Find the smallest divisor `d` with `raw_stock_ul / d <= max_tip_ul`.
///
/// Both per-dispense volumes are shares of the undivided totals, so `d` repeats
/// add up to exactly `raw_stock_ul` of stock and `target_volume_ul - raw_stock_ul`
/// of buffer. Returns `None` when more than `max_splits` dispenses would be needed.
pub fn split_dispense(
    raw_stock_ul: f64,
    target_volume_ul: f64,
    max_tip_ul: f64,
    max_splits: u32,
) -> Option<Split> {
    let mut count: u32 = 1;
    while raw_stock_ul / f64::from(count) > max_tip_ul {
        if count >= max_splits {
            return None;
        }
        count += 1;
    }

    let d = f64::from(count);
    Some(Split {
        count,
        stock_volume_ul: raw_stock_ul / d,
        buffer_volume_ul: (target_volume_ul - raw_stock_ul) / d,
    })
}
