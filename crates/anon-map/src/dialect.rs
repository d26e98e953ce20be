//! CSV dialect detection.
//!
//! Mapping files are edited in spreadsheet programs, which save with `,` or
//! `;` depending on the locale of the machine. The delimiter is detected on
//! load and reused on save.

use std::fmt;

use tracing::debug;

use crate::error::{MapperError, Result};

/// Lines looked at by the first, strict pass.
const STRICT_SAMPLE_LINES: usize = 10;
/// Lines looked at by the fallback pass.
const WIDE_SAMPLE_LINES: usize = 100;

/// Line terminator used for writing, what spreadsheet programs expect.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Field delimiter of a CSV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dialect {
    delimiter: u8,
}

impl Dialect {
    pub const COMMA: Dialect = Dialect { delimiter: b',' };
    pub const SEMICOLON: Dialect = Dialect { delimiter: b';' };

    /// Candidates in order of preference.
    const CANDIDATES: [Dialect; 2] = [Self::COMMA, Self::SEMICOLON];

    pub fn from_char(delimiter: char) -> Option<Self> {
        Self::CANDIDATES
            .into_iter()
            .find(|dialect| char::from(dialect.delimiter) == delimiter)
    }

    pub fn delimiter(self) -> u8 {
        self.delimiter
    }

    pub fn delimiter_char(self) -> char {
        char::from(self.delimiter)
    }

    /// The other candidate delimiter.
    pub fn alternative(self) -> Self {
        if self == Self::SEMICOLON {
            Self::COMMA
        } else {
            Self::SEMICOLON
        }
    }

    /// Dialect for a locale name like `nl_NL.UTF-8`: `;` where a comma is the
    /// decimal separator, `,` elsewhere.
    pub fn for_locale(locale: &str) -> Self {
        if locale_uses_decimal_comma(locale) {
            Self::SEMICOLON
        } else {
            Self::COMMA
        }
    }

    /// Dialect for the locale of this process, from `LC_ALL`, `LC_NUMERIC`
    /// or `LANG`.
    pub fn local() -> Self {
        let locale = ["LC_ALL", "LC_NUMERIC", "LANG"]
            .into_iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.is_empty())
            .unwrap_or_default();
        Self::for_locale(&locale)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::COMMA
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.delimiter_char())
    }
}

/// Languages that write decimals with a comma.
const DECIMAL_COMMA_LANGUAGES: &[&str] = &[
    "af", "az", "be", "bg", "bs", "ca", "cs", "da", "de", "el", "es", "et", "eu", "fi", "fo",
    "fr", "gl", "hr", "hu", "hy", "id", "is", "it", "ka", "kk", "ky", "lt", "lv", "mk", "mn",
    "nb", "nl", "nn", "no", "pl", "pt", "ro", "ru", "sk", "sl", "sq", "sr", "sv", "tr", "uk",
    "uz", "vi",
];

/// Regions where these languages use a decimal point after all.
const DECIMAL_POINT_REGIONS: &[&str] = &["de_CH", "de_LI", "it_CH", "fr_CH"];

fn locale_uses_decimal_comma(locale: &str) -> bool {
    let name = locale
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .replace('-', "_");
    if DECIMAL_POINT_REGIONS.contains(&name.as_str()) {
        return false;
    }
    let language = name.split('_').next().unwrap_or_default().to_ascii_lowercase();
    DECIMAL_COMMA_LANGUAGES.contains(&language.as_str())
}

/// Number of times `delimiter` appears outside double quotes.
fn count_outside_quotes(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for byte in line.bytes() {
        match byte {
            b'"' => in_quotes = !in_quotes,
            b if b == delimiter && !in_quotes => count += 1,
            _ => {}
        }
    }
    count
}

fn sample<'a>(lines: &[&'a str], limit: usize) -> Vec<&'a str> {
    lines
        .iter()
        .map(|line| line.trim_end_matches(['\r', '\n']))
        .filter(|line| !line.trim().is_empty())
        .take(limit)
        .collect()
}

/// Per-line delimiter count if it is the same, non-zero, on every line.
fn consistent_count(lines: &[&str], dialect: Dialect) -> Option<usize> {
    let mut counts = lines
        .iter()
        .map(|line| count_outside_quotes(line, dialect.delimiter));
    let first = counts.next()?;
    (first > 0 && counts.all(|count| count == first)).then_some(first)
}

/// Number of lines sharing the most common non-zero delimiter count.
fn modal_score(lines: &[&str], dialect: Dialect) -> usize {
    let mut frequencies: Vec<(usize, usize)> = Vec::new();
    for count in lines
        .iter()
        .map(|line| count_outside_quotes(line, dialect.delimiter))
        .filter(|count| *count > 0)
    {
        match frequencies.iter_mut().find(|(seen, _)| *seen == count) {
            Some((_, frequency)) => *frequency += 1,
            None => frequencies.push((count, 1)),
        }
    }
    frequencies
        .into_iter()
        .map(|(_, frequency)| frequency)
        .max()
        .unwrap_or(0)
}

/// Pick the better of the candidates by `score`. Ties go to the comma.
fn best_by(score: impl Fn(Dialect) -> usize) -> Option<Dialect> {
    let mut best: Option<(Dialect, usize)> = None;
    for dialect in Dialect::CANDIDATES {
        let value = score(dialect);
        if value > 0 && best.is_none_or(|(_, best_value)| value > best_value) {
            best = Some((dialect, value));
        }
    }
    best.map(|(dialect, _)| dialect)
}

/// Determine whether `lines` are separated by `,` or `;`.
///
/// A strict pass over the first few lines accepts a delimiter that occurs
/// the same number of times on every line. If neither does, a wider pass
/// picks the delimiter whose most common per-line count is shared by the
/// most lines.
pub fn sniff_dialect(lines: &[&str]) -> Result<Dialect> {
    let strict = sample(lines, STRICT_SAMPLE_LINES);
    if let Some(dialect) = best_by(|dialect| consistent_count(&strict, dialect).unwrap_or(0)) {
        debug!(%dialect, "dialect found in strict pass");
        return Ok(dialect);
    }

    let wide = sample(lines, WIDE_SAMPLE_LINES);
    if let Some(dialect) = best_by(|dialect| modal_score(&wide, dialect)) {
        debug!(%dialect, "dialect found in wide pass");
        return Ok(dialect);
    }
    Err(MapperError::UndeterminedDialect)
}

/// Like [`sniff_dialect`], but returns `default` when no delimiter can be
/// found. A single column file has no delimiter at all.
pub fn sniff_dialect_safe(lines: &[&str], default: Dialect) -> Dialect {
    sniff_dialect(lines).unwrap_or_else(|err| {
        debug!(%default, error = %err, "could not determine dialect, using default");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sniff(text: &str) -> Result<Dialect> {
        let lines: Vec<&str> = text.lines().collect();
        sniff_dialect(&lines)
    }

    #[test]
    fn test_basic_comma_input() {
        let text = "\ndestination_path,\\\\someserver\\share\\folder1\npims_key,555\n";
        assert_eq!(sniff(text).unwrap(), Dialect::COMMA);
    }

    #[test]
    fn test_separator_late_in_text() {
        let text = "\nA lot of text but actually no comma. Which should be fine, 1\n";
        assert_eq!(sniff(text).unwrap(), Dialect::COMMA);
    }

    #[test]
    fn test_not_csv_fails() {
        let err = sniff("\nThis is just a text. Not a csv file.\n").unwrap_err();
        assert_eq!(err.to_string(), "Could not determine dialect");
    }

    #[test]
    fn test_wide_pass_for_inconsistent_lines() {
        let text = "## Description ##,,,\nsome comment,,,\n,,,,\nsource,patient_id,patient_name,description\n";
        assert_eq!(sniff(text).unwrap(), Dialect::COMMA);
    }

    #[test]
    fn test_quoted_delimiters_do_not_count() {
        let text = "a;\"b,c\"\nd;\"e,f,g\"\n";
        assert_eq!(sniff(text).unwrap(), Dialect::SEMICOLON);
    }

    #[test]
    fn test_safe_returns_default() {
        let lines = ["source", "folder:a"];
        assert_eq!(
            sniff_dialect_safe(&lines, Dialect::SEMICOLON),
            Dialect::SEMICOLON
        );
    }

    #[test]
    fn test_locale_heuristic() {
        assert_eq!(Dialect::for_locale("nl_NL.UTF-8"), Dialect::SEMICOLON);
        assert_eq!(Dialect::for_locale("de_DE@euro"), Dialect::SEMICOLON);
        assert_eq!(Dialect::for_locale("de_CH.UTF-8"), Dialect::COMMA);
        assert_eq!(Dialect::for_locale("en_US.UTF-8"), Dialect::COMMA);
        assert_eq!(Dialect::for_locale("C"), Dialect::COMMA);
        assert_eq!(Dialect::for_locale(""), Dialect::COMMA);
    }

    #[test]
    fn test_from_char() {
        assert_eq!(Dialect::from_char(';'), Some(Dialect::SEMICOLON));
        assert_eq!(Dialect::from_char('\t'), None);
    }
}
