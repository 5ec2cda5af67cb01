/// Format a price the way the form displays it: `Rp 1,234,567.89`.
///
/// Non-finite values are rendered verbatim after the prefix.
pub fn format_rupiah(prefix: &str, value: f64) -> String {
    if !value.is_finite() {
        return format!("{prefix} {value}");
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // -0.001 rounds to 0.00; don't print a sign for it
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{prefix} {sign}{grouped}.{frac_part}")
}
