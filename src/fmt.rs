/// Parse a decimal amount. Surrounding whitespace is ignored; anything that
/// does not parse to a finite number is 0.
pub fn parse_amount(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Fixed two-decimal rendering used for totals: 150.5 -> "150.50".
pub fn two_decimals(val: f64) -> String {
    let s = format!("{val:.2}");
    // -0.00 reads as a negative total
    if s == "-0.00" {
        "0.00".to_string()
    } else {
        s
    }
}

/// Amount in soles as shown in the totals row: S/. 1234.56
pub fn soles(val: f64) -> String {
    format!("S/. {}", two_decimals(val))
}

/// Integer with thousands separators: 12,345
pub fn number(val: usize) -> String {
    let digits = val.to_string();
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}
