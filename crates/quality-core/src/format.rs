//! Display helpers for currency and counts in reports and alert messages.

/// `$1,234.50` style currency
pub fn money(value: f64) -> String {
    if value < 0.0 {
        format!("-${}", group_thousands(-value, 2))
    } else {
        format!("${}", group_thousands(value, 2))
    }
}

/// `$285,000` style currency, rounded to whole dollars
pub fn whole_dollars(value: f64) -> String {
    if value < 0.0 {
        format!("-${}", group_thousands(-value, 0))
    } else {
        format!("${}", group_thousands(value, 0))
    }
}

/// Thousands-separated number with `decimals` fraction digits
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.5), "$1,234.50");
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(-1_000_000.0), "-$1,000,000.00");
        assert_eq!(whole_dollars(285_000.0), "$285,000");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(999.0, 0), "999");
        assert_eq!(group_thousands(1000.0, 0), "1,000");
        assert_eq!(group_thousands(1234567.891, 1), "1,234,567.9");
        assert_eq!(group_thousands(-1500.0, 0), "-1,500");
    }
}
