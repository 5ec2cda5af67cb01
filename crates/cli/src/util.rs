use griya_core::form::FieldKind;
use griya_core::{FormProfile, PropertyRecord};
use unicode_width::UnicodeWidthStr;

/// Display width of a string, accounting for the `²` in unit labels and other wide glyphs.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if width < 3 {
        for ch in s.chars() {
            let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
            if cw <= width {
                return ch.to_string();
            }
        }
        return String::new();
    }

    if display_width(s) <= width {
        return s.to_string();
    }

    // Stop at width - 2 to leave room for ".."
    let budget = width - 2;
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            end_byte = i;
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }

    format!("{}..", &s[..end_byte])
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = display_width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

const LABEL_WIDTH: usize = 22;

/// The two-column input summary shown before the estimate.
pub fn render_summary(profile: FormProfile, record: &PropertyRecord) -> String {
    let mut rows: Vec<(&str, String)> = Vec::new();
    for field in profile.fields() {
        let value = match field.name {
            "bedrooms" => record.bedrooms.to_string(),
            "bathrooms" => record.bathrooms.to_string(),
            "land_size_m2" => format!("{}", record.land_size_m2),
            "building_size_m2" => format!("{}", record.building_size_m2),
            "floors" => record.floors.to_string(),
            "carports" => opt(record.carports),
            "building_age" => opt(record.building_age),
            "garages" => opt(record.garages),
            "city" => record.city.label().to_string(),
            "furnishing" => record.furnishing.label().to_string(),
            _ => continue,
        };
        rows.push((field.label, value));
    }

    let mut out = String::new();
    for (label, value) in rows {
        out.push_str(&pad_right(label, LABEL_WIDTH));
        out.push_str("  ");
        out.push_str(&value);
        out.push('\n');
    }
    out
}

/// Field table for `griya form`: name, label, allowed values, default.
pub fn render_form(profile: FormProfile) -> String {
    let mut out = String::new();
    for field in profile.fields() {
        let (allowed, default) = match &field.kind {
            FieldKind::Integer { min, max, default } => (format!("{min}..={max}"), default.to_string()),
            FieldKind::Float { min, max, default } => (format!("{min}..={max}"), default.to_string()),
            FieldKind::Choice { options, default } => (options.join(" | "), default.to_string()),
        };
        out.push_str(&pad_right(field.name, 18));
        out.push_str(&pad_right(field.label, LABEL_WIDTH));
        out.push_str(&pad_right(&default, 16));
        out.push_str(&allowed);
        out.push('\n');
    }
    out
}

fn opt(v: Option<u32>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use griya_core::City;

    #[test]
    fn display_width_counts_superscript_once() {
        assert_eq!(display_width("m²"), 2);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn display_width_cjk() {
        assert_eq!(display_width("\u{4e16}\u{754c}"), 4); // "世界"
    }

    #[test]
    fn truncate_cuts() {
        assert_eq!(truncate_display("abc", 5), "abc");
        assert_eq!(truncate_display("abcdef", 5), "abc..");
        assert_eq!(truncate_display("abc", 2), "a");
        assert_eq!(truncate_display("", 0), "");
    }

    #[test]
    fn pad_right_widths() {
        assert_eq!(pad_right("ab", 5), "ab   ");
        assert_eq!(pad_right("abcde", 5), "abcde");
        assert_eq!(pad_right("abcdef", 5), "abc..");
    }

    #[test]
    fn summary_aligns_values() {
        let record = PropertyRecord { city: City::JakartaUtara, ..PropertyRecord::default() };
        let summary = render_summary(FormProfile::Adaptive, &record);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines[2].starts_with("Land size (m²)"));
        assert!(lines[5].ends_with("Jakarta Utara"));
        // Values start in the same column whatever the label's glyphs
        assert_eq!(display_width(lines[0]), LABEL_WIDTH + 2 + "3".len());
        assert_eq!(display_width(lines[2]), LABEL_WIDTH + 2 + "100".len());
    }

    #[test]
    fn form_lists_choices_and_ranges() {
        let form = render_form(FormProfile::Adaptive);
        let city = form.lines().find(|l| l.starts_with("city")).unwrap();
        assert!(city.contains("Bekasi | Bogor | Depok"), "{city}");
        let bedrooms = form.lines().find(|l| l.starts_with("bedrooms")).unwrap();
        assert!(bedrooms.ends_with("1..=8"), "{bedrooms}");
        let furnishing = form.lines().find(|l| l.starts_with("furnishing")).unwrap();
        assert!(furnishing.contains("baru"), "{furnishing}");
    }

    #[test]
    fn full_summary_shows_missing_extras_as_dash() {
        let summary = render_summary(FormProfile::Full, &PropertyRecord::default());
        assert_eq!(summary.lines().count(), 10);
        assert!(summary.lines().any(|l| l.starts_with("Garages") && l.ends_with('-')));
    }
}
