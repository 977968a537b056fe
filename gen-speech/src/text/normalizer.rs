//! Rewrite numeric tokens as spoken words.
//!
//! A single combined pattern is scanned left to right. At each position the
//! alternatives are tried in order: currency amount, date, 10-digit phone
//! number, decimal, bare integer. The first alternative that matches wins.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::language::{Language, Verbalizer};

static RE_NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        (?P<amount>[0-9]{1,3}(?:,[0-9]{3})+|[0-9]+)(?:\.(?P<amount_frac>[0-9]+))?
            \s*(?P<currency>(?:VNĐ|VND|USD|EUR|đ)\b|₫|\$|€)
        | \b(?P<day>[0-9]{1,2})[/-](?P<month>[0-9]{1,2})[/-](?P<year>[0-9]{4})\b
        | \b(?P<phone>[0-9]{10})\b
        | (?P<int>[0-9]+)\.(?P<frac>[0-9]+)
        | (?P<bare>[0-9]+)
        ",
    )
    .unwrap()
});

/// Normalize `text` for speech in `language`.
pub fn normalize(text: &str, language: Language) -> String {
    normalize_with(text, language.verbalizer())
}

/// Normalize `text` with an explicit verbalizer.
pub fn normalize_with(text: &str, verbalizer: &dyn Verbalizer) -> String {
    RE_NUMERIC
        .replace_all(text, |caps: &Captures| verbalize_match(caps, verbalizer))
        .into_owned()
}

fn verbalize_match(caps: &Captures, v: &dyn Verbalizer) -> String {
    if let (Some(amount), Some(currency)) = (caps.name("amount"), caps.name("currency")) {
        let integer = amount.as_str().replace(',', "");
        let mut words = number(&integer, v);
        words.push(' ');
        words.push_str(&v.currency_word(currency.as_str()));
        if let Some(frac) = caps.name("amount_frac") {
            words.push(' ');
            words.push_str(&fraction(frac.as_str(), v));
        }
        return words;
    }

    if let (Some(day), Some(month), Some(year)) =
        (caps.name("day"), caps.name("month"), caps.name("year"))
    {
        // at most 4 digits each, always fits
        let field = |s: &str| s.parse::<u64>().unwrap_or_default();
        return v.date(field(day.as_str()), field(month.as_str()), field(year.as_str()));
    }

    if let Some(phone) = caps.name("phone") {
        return phone_groups(phone.as_str())
            .into_iter()
            .map(|group| number(group, v))
            .collect::<Vec<_>>()
            .join(" ");
    }

    if let (Some(int), Some(frac)) = (caps.name("int"), caps.name("frac")) {
        return format!("{} {}", number(int.as_str(), v), fraction(frac.as_str(), v));
    }

    match caps.name("bare") {
        Some(bare) => number(bare.as_str(), v),
        None => caps[0].to_string(),
    }
}

/// Read a digit string as one cardinal, or digit by digit if it does not
/// fit in a u64.
fn number(digits: &str, v: &dyn Verbalizer) -> String {
    match digits.parse::<u64>() {
        Ok(n) => v.cardinal(n),
        Err(_) => spell_digits(digits, v),
    }
}

/// `<decimal point word> <digit> <digit> ...`
fn fraction(digits: &str, v: &dyn Verbalizer) -> String {
    format!("{} {}", v.decimal_point(), spell_digits(digits, v))
}

fn spell_digits(digits: &str, v: &dyn Verbalizer) -> String {
    digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| v.digit(d))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a phone number into a 3-digit group followed by 4-digit groups.
pub fn phone_groups(digits: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut start = 0;
    let mut size = 3;
    while start < digits.len() {
        let end = (start + size).min(digits.len());
        groups.push(&digits[start..end]);
        start = end;
        size = 4;
    }
    groups
}
