//! Sanitizing of extracted text before normalization.

/// Characters that trip up synthesis engines and their replacements.
const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2018}', "'"),   // Left single quote
    ('\u{2019}', "'"),   // Right single quote
    ('\u{201c}', "\""),  // Left double quote
    ('\u{201d}', "\""),  // Right double quote
    ('\u{00ab}', "\""),  // Left-pointing double angle quote
    ('\u{00bb}', "\""),  // Right-pointing double angle quote
    ('\u{2013}', "-"),   // En dash
    ('\u{2014}', "-"),   // Em dash
    ('\u{2011}', "-"),   // Non-breaking hyphen
    ('\u{2026}', "..."), // Ellipsis
    ('\u{00a0}', " "),   // Non-breaking space
    ('\u{2009}', " "),   // Thin space
    ('\u{200b}', ""),    // Zero-width space
    ('\u{200c}', ""),    // Zero-width non-joiner
    ('\u{200d}', ""),    // Zero-width joiner
    ('\u{feff}', ""),    // BOM
];

/// Clean extracted text for normalization and chunking.
///
/// - Replaces typographic quotes, dashes and invisible characters
/// - Drops control characters except newlines and tabs
/// - Converts `\r\n` and lone `\r` to `\n`
/// - Collapses runs of spaces/tabs and more than two consecutive newlines
/// - Trims leading and trailing whitespace on every line
pub fn clean_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut replaced = String::with_capacity(text.len());

    for c in text.chars() {
        if let Some((_, r)) = REPLACEMENTS.iter().find(|(ch, _)| *ch == c) {
            replaced.push_str(r);
        } else if c == '\n' || c == '\t' || !c.is_control() {
            replaced.push(c);
        }
    }

    let mut result = String::with_capacity(replaced.len());
    let mut blank_run = 0;
    for line in replaced.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || result.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(&line);
    }

    result.trim_end().to_string()
}

/// Cut `text` to at most `max_chars` characters.
///
/// Returns the (possibly shortened) text and whether anything was dropped.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => (&text[..byte_index], true),
        None => (text, false),
    }
}
