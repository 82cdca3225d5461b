//! One module per subcommand. Progress and summaries go to stdout.

pub mod check_missing;
pub mod custom_game;
pub mod map_cards;
pub mod mapping_tools;
pub mod scan;
pub mod validate_years;

pub(crate) const RULE: &str = "========================================";

/// Percentage of `found` in `total`, 0 for an empty total.
pub(crate) fn match_rate(found: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    found as f64 / total as f64 * 100.0
}
