//! English number reading.

use super::language::Verbalizer;

const ONES: &[&str] = &[
    "", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
    "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen", "nineteen",
];
const TENS: &[&str] = &[
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];
const SCALE: &[&str] = &[
    "", "thousand", "million", "billion", "trillion", "quadrillion", "quintillion",
];
const DIGITS: [&str; 10] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];
const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// English verbalizer (`en`, `en-us`, `en-gb`)
#[derive(Debug, Clone, Copy, Default)]
pub struct English;

fn three_digits_to_words(n: u64) -> String {
    let mut parts = Vec::new();
    let hundreds = n / 100;
    let remainder = n % 100;
    if hundreds > 0 {
        parts.push(format!("{} hundred", ONES[hundreds as usize]));
    }
    if remainder < 20 {
        if remainder > 0 {
            parts.push(ONES[remainder as usize].to_string());
        }
    } else {
        let tens_word = TENS[(remainder / 10) as usize];
        let ones_word = ONES[(remainder % 10) as usize];
        if ones_word.is_empty() {
            parts.push(tens_word.to_string());
        } else {
            parts.push(format!("{}-{}", tens_word, ones_word));
        }
    }
    parts.join(" ")
}

/// Convert a non-negative integer to English words.
pub fn cardinal(n: u64) -> String {
    if n == 0 {
        return "zero".to_string();
    }
    let mut parts = Vec::new();
    let mut remaining = n;
    for scale in SCALE {
        let group = remaining % 1000;
        if group > 0 {
            let words = three_digits_to_words(group);
            if scale.is_empty() {
                parts.push(words);
            } else {
                parts.push(format!("{} {}", words, scale));
            }
        }
        remaining /= 1000;
        if remaining == 0 {
            break;
        }
    }
    parts.reverse();
    parts.join(" ")
}

impl Verbalizer for English {
    fn cardinal(&self, n: u64) -> String {
        cardinal(n)
    }

    fn digit(&self, d: u32) -> &'static str {
        DIGITS[(d % 10) as usize]
    }

    fn decimal_point(&self) -> &'static str {
        "point"
    }

    fn date(&self, day: u64, month: u64, year: u64) -> String {
        let month = match month {
            1..=12 => MONTHS[(month - 1) as usize].to_string(),
            other => cardinal(other),
        };
        format!("{} {} {}", cardinal(day), month, cardinal(year))
    }

    fn currency_word(&self, marker: &str) -> String {
        match marker {
            "$" => "dollars".to_string(),
            "€" => "euros".to_string(),
            "đ" | "₫" => "dong".to_string(),
            other => other.to_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinal() {
        assert_eq!(cardinal(0), "zero");
        assert_eq!(cardinal(13), "thirteen");
        assert_eq!(cardinal(42), "forty-two");
        assert_eq!(cardinal(100), "one hundred");
        assert_eq!(cardinal(1_000_000), "one million");
        assert_eq!(cardinal(2024), "two thousand twenty-four");
        assert!(cardinal(u64::MAX).starts_with("eighteen quintillion"));
    }

    #[test]
    fn test_date_keeps_order() {
        assert_eq!(English.date(1, 2, 2024), "one February two thousand twenty-four");
        assert_eq!(English.date(5, 13, 2000), "five thirteen two thousand");
    }

    #[test]
    fn test_currency_word() {
        assert_eq!(English.currency_word("USD"), "usd");
        assert_eq!(English.currency_word("$"), "dollars");
    }
}
