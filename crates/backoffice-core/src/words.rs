//! # Amount in Words
//!
//! Renders an invoice grand total the way it is printed under the totals box,
//! e.g. `Rupees One Thousand Sixty Two and Fifty Paisa Only`.
//!
//! Uses the short scale (thousand, million, billion, trillion).

const ONES: [&str; 20] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
    "Eleven", "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

const SCALES: [(u64, &str); 4] = [
    (1_000_000_000_000, "Trillion"),
    (1_000_000_000, "Billion"),
    (1_000_000, "Million"),
    (1_000, "Thousand"),
];

/// Spells out an amount in rupees and paisa.
///
/// ```rust
/// use backoffice_core::amount_in_words;
///
/// assert_eq!(amount_in_words(1062.0), "Rupees One Thousand Sixty Two Only");
/// assert_eq!(amount_in_words(10.5), "Rupees Ten and Fifty Paisa Only");
/// ```
pub fn amount_in_words(amount: f64) -> String {
    let cents = (crate::round2(amount.abs()) * 100.0).round() as u64;
    let rupees = cents / 100;
    let paisa = cents % 100;

    let mut out = String::from("Rupees ");
    if amount < 0.0 && cents > 0 {
        out.push_str("Minus ");
    }
    out.push_str(&integer_in_words(rupees));
    if paisa > 0 {
        out.push_str(" and ");
        out.push_str(&below_thousand(paisa));
        out.push_str(" Paisa");
    }
    out.push_str(" Only");
    out
}

/// Spells out a non-negative integer.
pub fn integer_in_words(mut n: u64) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }

    let mut parts: Vec<String> = Vec::new();
    for (scale, name) in SCALES {
        if n >= scale {
            parts.push(format!("{} {}", integer_in_words(n / scale), name));
            n %= scale;
        }
    }
    if n > 0 {
        parts.push(below_thousand(n));
    }
    parts.join(" ")
}

fn below_thousand(n: u64) -> String {
    debug_assert!(n < 1000);
    let mut parts: Vec<&str> = Vec::new();

    let hundreds = n / 100;
    let rest = n % 100;
    if hundreds > 0 {
        parts.push(ONES[hundreds as usize]);
        parts.push("Hundred");
    }
    if rest >= 20 {
        parts.push(TENS[(rest / 10) as usize]);
        if rest % 10 > 0 {
            parts.push(ONES[(rest % 10) as usize]);
        }
    } else if rest > 0 || parts.is_empty() {
        parts.push(ONES[rest as usize]);
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_amounts() {
        assert_eq!(amount_in_words(0.0), "Rupees Zero Only");
        assert_eq!(amount_in_words(7.0), "Rupees Seven Only");
        assert_eq!(amount_in_words(100.0), "Rupees One Hundred Only");
        assert_eq!(amount_in_words(115.0), "Rupees One Hundred Fifteen Only");
        assert_eq!(
            amount_in_words(19188.0),
            "Rupees Nineteen Thousand One Hundred Eighty Eight Only"
        );
    }

    #[test]
    fn test_large_amounts() {
        assert_eq!(
            amount_in_words(1_250_000.0),
            "Rupees One Million Two Hundred Fifty Thousand Only"
        );
        assert_eq!(
            amount_in_words(3_000_000_001.0),
            "Rupees Three Billion One Only"
        );
    }

    #[test]
    fn test_paisa() {
        assert_eq!(amount_in_words(0.75), "Rupees Zero and Seventy Five Paisa Only");
        assert_eq!(amount_in_words(99.99), "Rupees Ninety Nine and Ninety Nine Paisa Only");
    }

    #[test]
    fn test_negative_amount() {
        assert_eq!(amount_in_words(-40.0), "Rupees Minus Forty Only");
        assert_eq!(amount_in_words(-0.0), "Rupees Zero Only");
    }
}
