//! Vietnamese number reading.

use super::language::Verbalizer;

const DIGITS: [&str; 10] = [
    "không", "một", "hai", "ba", "bốn", "năm", "sáu", "bảy", "tám", "chín",
];

const BILLION: u64 = 1_000_000_000;

/// Vietnamese verbalizer (`vi`, `vi-vn`)
#[derive(Debug, Clone, Copy, Default)]
pub struct Vietnamese;

/// Read 10..=99.
fn tens_and_units(n: u64) -> String {
    let tens = (n / 10) as usize;
    let units = (n % 10) as usize;

    let head = if tens == 1 {
        "mười".to_string()
    } else {
        format!("{} mươi", DIGITS[tens])
    };

    match units {
        0 => head,
        1 if tens > 1 => format!("{} mốt", head),
        5 => format!("{} lăm", head),
        _ => format!("{} {}", head, DIGITS[units]),
    }
}

/// Read one group of three digits.
///
/// `full` forces the hundreds word even when it is zero; groups that follow
/// a larger group are read that way ("một nghìn không trăm lẻ năm").
fn three_digits(n: u64, full: bool) -> String {
    let hundreds = (n / 100) as usize;
    let rest = n % 100;
    let mut parts: Vec<String> = Vec::new();

    if hundreds > 0 || full {
        parts.push(format!("{} trăm", DIGITS[hundreds]));
    }

    if rest >= 10 {
        parts.push(tens_and_units(rest));
    } else if rest > 0 {
        if !parts.is_empty() {
            parts.push("lẻ".to_string());
        }
        parts.push(DIGITS[rest as usize].to_string());
    }

    parts.join(" ")
}

/// Spell out a cardinal number in Vietnamese.
pub fn cardinal(n: u64) -> String {
    if n == 0 {
        return DIGITS[0].to_string();
    }

    let mut words: Vec<String> = Vec::new();
    let billions = n / BILLION;
    let rest = n % BILLION;

    // "nghìn tỷ", "triệu tỷ", ... come out of the recursion
    if billions > 0 {
        words.push(cardinal(billions));
        words.push("tỷ".to_string());
    }

    let mut emitted = billions > 0;
    let groups = [
        (rest / 1_000_000, "triệu"),
        ((rest / 1000) % 1000, "nghìn"),
        (rest % 1000, ""),
    ];
    for (value, scale) in groups {
        if value == 0 {
            continue;
        }
        words.push(three_digits(value, emitted));
        if !scale.is_empty() {
            words.push(scale.to_string());
        }
        emitted = true;
    }

    words.join(" ")
}

impl Verbalizer for Vietnamese {
    fn cardinal(&self, n: u64) -> String {
        cardinal(n)
    }

    fn digit(&self, d: u32) -> &'static str {
        DIGITS[(d % 10) as usize]
    }

    fn decimal_point(&self) -> &'static str {
        "phẩy"
    }

    fn date(&self, day: u64, month: u64, year: u64) -> String {
        format!(
            "ngày {} tháng {} năm {}",
            cardinal(day),
            cardinal(month),
            cardinal(year)
        )
    }

    fn currency_word(&self, marker: &str) -> String {
        match marker {
            "$" => "đô la".to_string(),
            "€" => "euro".to_string(),
            "đ" | "₫" => "đồng".to_string(),
            other => other.to_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_and_teens() {
        assert_eq!(cardinal(0), "không");
        assert_eq!(cardinal(7), "bảy");
        assert_eq!(cardinal(10), "mười");
        assert_eq!(cardinal(11), "mười một");
        assert_eq!(cardinal(15), "mười lăm");
    }

    #[test]
    fn test_tens() {
        assert_eq!(cardinal(20), "hai mươi");
        assert_eq!(cardinal(21), "hai mươi mốt");
        assert_eq!(cardinal(24), "hai mươi bốn");
        assert_eq!(cardinal(55), "năm mươi lăm");
        assert_eq!(cardinal(91), "chín mươi mốt");
    }

    #[test]
    fn test_hundreds() {
        assert_eq!(cardinal(100), "một trăm");
        assert_eq!(cardinal(105), "một trăm lẻ năm");
        assert_eq!(cardinal(110), "một trăm mười");
        assert_eq!(cardinal(345), "ba trăm bốn mươi lăm");
    }

    #[test]
    fn test_thousands_and_inner_zero_groups() {
        assert_eq!(cardinal(1005), "một nghìn không trăm lẻ năm");
        assert_eq!(cardinal(2024), "hai nghìn không trăm hai mươi bốn");
        assert_eq!(cardinal(2345), "hai nghìn ba trăm bốn mươi lăm");
        assert_eq!(cardinal(50000), "năm mươi nghìn");
        assert_eq!(cardinal(1_000_000), "một triệu");
        assert_eq!(cardinal(1_000_005), "một triệu không trăm lẻ năm");
    }

    #[test]
    fn test_billions() {
        assert_eq!(cardinal(1_000_000_000), "một tỷ");
        assert_eq!(
            cardinal(2_000_050_000),
            "hai tỷ không trăm năm mươi nghìn"
        );
        assert_eq!(cardinal(1_000_000_000_000), "một nghìn tỷ");
        assert!(!cardinal(u64::MAX).is_empty());
    }

    #[test]
    fn test_verbalizer_phrases() {
        let vi = Vietnamese;
        assert_eq!(vi.date(1, 1, 2024), "ngày một tháng một năm hai nghìn không trăm hai mươi bốn");
        assert_eq!(vi.decimal_point(), "phẩy");
        assert_eq!(vi.digit(4), "bốn");
        assert_eq!(vi.currency_word("VNĐ"), "vnđ");
        assert_eq!(vi.currency_word("$"), "đô la");
        assert_eq!(vi.currency_word("đ"), "đồng");
    }
}
