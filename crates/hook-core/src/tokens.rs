//! Compact token-count formatting for the status line.

/// Format a token count the way the status line shows it.
///
/// - below 1,000: the integer (`999`)
/// - below 1,000,000: whole thousands with `k` (`1500` → `2k`)
/// - otherwise: millions with one decimal and `M` (`1250000` → `1.3M`)
///
/// Rounding is half-up and done in integers so the output never depends on
/// float formatting. A count that rounds to 1000k is shown as `1.0M`.
pub fn format_tokens(n: u64) -> String {
    if n < 1_000 {
        return n.to_string();
    }

    let thousands = n.saturating_add(500) / 1_000;
    if n < 1_000_000 && thousands < 1_000 {
        return format!("{thousands}k");
    }

    let tenths = n.saturating_add(50_000) / 100_000;
    format!("{}.{}M", tenths / 10, tenths % 10)
}

/// `numerator / denominator` as a percentage with one decimal, half-up.
/// A zero denominator yields `0.0`.
pub fn format_percent_tenths(numerator: u64, denominator: u64) -> String {
    if denominator == 0 {
        return "0.0".to_string();
    }
    let scaled = u128::from(numerator) * 1_000;
    let den = u128::from(denominator);
    let tenths = (scaled + den / 2) / den;
    format!("{}.{}", tenths / 10, tenths % 10)
}
