//! Proportional server allocation.
//!
//! Each station gets `max(1, floor(d_i / sum(d) * total_servers))` servers.
//! Flooring and the minimum of one mean the allocations generally do not add
//! up to `total_servers`; the budget is a guide, not a hard constraint.

/// Split `total_servers` across stations in proportion to their service
/// durations.
///
/// The result has one entry per duration and every entry is at least 1.
#[must_use]
pub fn allocate_servers(durations: &[f64], total_servers: u32) -> Vec<usize> {
    let total_duration: f64 = durations.iter().sum();
    durations
        .iter()
        .map(|&duration| {
            let share = (duration / total_duration) * f64::from(total_servers);
            // NaN (zero total) casts to 0 and is clamped like any other
            // sub-unit share.
            (share.floor() as usize).max(1)
        })
        .collect()
}
