/// Format a number for display.
///
/// Whole numbers print without a decimal point; anything else uses the
/// shortest representation that round-trips.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // Also covers -0.0.
        "0".to_string()
    } else if n.is_finite() && n == n.floor() {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}
