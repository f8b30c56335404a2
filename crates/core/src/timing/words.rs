//! Spoken-text normalization for narration length estimation.
//!
//! Timing is estimated from how the narration *sounds*, not how it is
//! written: "$4.2" is read as "four point two us dollars", "1999" as
//! "nineteen ninety nine". Normalization rewrites the text into the
//! spoken form, then strips everything that carries no speaking time.
//!
//! The stored narration text is never mutated; only the estimator sees
//! the normalized form.

use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};

const ONES: [&str; 20] = [
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

/// Spell an integer in standard English scale words.
///
/// Covers 0–999,999,999 with "and" inserted after a hundreds group when a
/// remainder follows ("one hundred and five"). Larger numbers are spelled
/// digit by digit.
pub fn number_to_words(n: u64) -> String {
    if n == 0 {
        return "zero".to_string();
    }
    if n >= 1_000_000_000 {
        return spell_digits(&n.to_string());
    }

    let millions = n / 1_000_000;
    let thousands = (n / 1_000) % 1_000;
    let units = n % 1_000;

    let mut parts: Vec<String> = Vec::new();
    if millions > 0 {
        parts.push(format!("{} million", triplet(millions)));
    }
    if thousands > 0 {
        parts.push(format!("{} thousand", triplet(thousands)));
    }
    if units > 0 {
        parts.push(triplet(units));
    }
    parts.join(" ")
}

/// Spell a 1–999 group.
fn triplet(n: u64) -> String {
    let hundreds = (n / 100) as usize;
    let rem = n % 100;
    match (hundreds, rem) {
        (0, rem) => tens_units(rem),
        (h, 0) => format!("{} hundred", ONES[h]),
        (h, rem) => format!("{} hundred and {}", ONES[h], tens_units(rem)),
    }
}

/// Spell a 1–99 group.
fn tens_units(n: u64) -> String {
    if n < 20 {
        return ONES[n as usize].to_string();
    }
    let tens = TENS[(n / 10) as usize];
    match n % 10 {
        0 => tens.to_string(),
        unit => format!("{} {}", tens, ONES[unit as usize]),
    }
}

/// Spell a digit string one digit at a time.
fn spell_digits(digits: &str) -> String {
    digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| ONES[d as usize])
        .collect::<Vec<_>>()
        .join(" ")
}

/// Spell an integer token, falling back to digit-by-digit when it does
/// not fit in u64.
fn integer_words(digits: &str) -> String {
    digits
        .parse::<u64>()
        .map(number_to_words)
        .unwrap_or_else(|_| spell_digits(digits))
}

static CURRENCY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\d[\d,]*(?:\.\d+)?)").expect("currency pattern"));
static PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("percent pattern"));
static COMMA_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d),(\d)").expect("comma pattern"));
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)(\d\d)\b").expect("year pattern"));
static DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\.(\d+)").expect("decimal pattern"));
static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("integer pattern"));
static NON_SPOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9 ]").expect("strip pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Rewrite narration text into its spoken form for length estimation.
pub fn normalize_spoken(text: &str) -> String {
    let mut s = text.to_lowercase();

    s = CURRENCY.replace_all(&s, "${1} us dollars").into_owned();
    s = PERCENT.replace_all(&s, "${1} percent").into_owned();

    // Strip thousands separators so "1,000,000" reads as one number.
    loop {
        let next = COMMA_GROUP.replace_all(&s, "${1}${2}").into_owned();
        if next == s {
            break;
        }
        s = next;
    }

    // Year-shaped numbers are spoken as two two-digit groups.
    s = YEAR
        .replace_all(&s, |caps: &Captures| {
            format!(
                "{} {}",
                integer_words(&caps[1]),
                integer_words(&caps[2])
            )
        })
        .into_owned();

    s = DECIMAL
        .replace_all(&s, |caps: &Captures| {
            format!(
                "{} point {}",
                integer_words(&caps[1]),
                integer_words(&caps[2])
            )
        })
        .into_owned();

    s = INTEGER
        .replace_all(&s, |caps: &Captures| integer_words(&caps[0]))
        .into_owned();

    s = NON_SPOKEN.replace_all(&s, "").into_owned();
    WHITESPACE.replace_all(&s, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_to_words_spot_values() {
        assert_eq!(number_to_words(0), "zero");
        assert_eq!(number_to_words(7), "seven");
        assert_eq!(number_to_words(13), "thirteen");
        assert_eq!(number_to_words(21), "twenty one");
        assert_eq!(number_to_words(40), "forty");
        assert_eq!(number_to_words(100), "one hundred");
        assert_eq!(number_to_words(105), "one hundred and five");
        assert_eq!(number_to_words(342), "three hundred and forty two");
        assert_eq!(number_to_words(1_000), "one thousand");
        assert_eq!(number_to_words(1_005), "one thousand five");
        assert_eq!(
            number_to_words(1_999),
            "one thousand nine hundred and ninety nine"
        );
        assert_eq!(number_to_words(1_000_000), "one million");
        assert_eq!(
            number_to_words(2_300_047),
            "two million three hundred thousand forty seven"
        );
        assert_eq!(
            number_to_words(999_999_999),
            "nine hundred and ninety nine million nine hundred and ninety nine thousand nine hundred and ninety nine"
        );
    }

    #[test]
    fn test_number_to_words_out_of_range_spells_digits() {
        assert_eq!(number_to_words(1_000_000_000), "one zero zero zero zero zero zero zero zero zero");
    }

    #[test]
    fn test_normalize_lowercases_and_strips() {
        assert_eq!(normalize_spoken("Wait, WHAT?!"), "wait what");
    }

    #[test]
    fn test_normalize_currency() {
        assert_eq!(normalize_spoken("a $5 fee"), "a five us dollars fee");
        assert_eq!(
            normalize_spoken("$4.2 billion"),
            "four point two us dollars billion"
        );
        assert_eq!(
            normalize_spoken("$1,000,000 gone"),
            "one million us dollars gone"
        );
    }

    #[test]
    fn test_normalize_percent() {
        assert_eq!(normalize_spoken("rose 12%"), "rose twelve percent");
        assert_eq!(
            normalize_spoken("up 3.5% today"),
            "up three point five percent today"
        );
    }

    #[test]
    fn test_normalize_years_as_two_digit_groups() {
        assert_eq!(normalize_spoken("in 1999"), "in nineteen ninety nine");
        assert_eq!(normalize_spoken("since 2024"), "since twenty twenty four");
        // Two-digit group "05" reads as its own number word.
        assert_eq!(normalize_spoken("by 2005"), "by twenty five");
        // Non-year four-digit numbers take the full reading.
        assert_eq!(
            normalize_spoken("unit 1850"),
            "unit one thousand eight hundred and fifty"
        );
    }

    #[test]
    fn test_normalize_decimals() {
        assert_eq!(normalize_spoken("pi is 3.14"), "pi is three point fourteen");
    }

    #[test]
    fn test_normalize_bare_integers() {
        assert_eq!(
            normalize_spoken("47 cranes went idle"),
            "forty seven cranes went idle"
        );
        assert_eq!(normalize_spoken("1,000,000 views"), "one million views");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_spoken("  a\t lot \n of   space "), "a lot of space");
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let text = "In 1999, $4.2 billion vanished: 12% of everything.";
        assert_eq!(normalize_spoken(text), normalize_spoken(text));
    }
}
