// Number formatting shared by the HTML and plain-text report.

/// `1234567` -> `"1,234,567"`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn dollars(n: u64) -> String {
    format!("${}", thousands(n))
}

/// `2.0` -> `"2"`, `1.5` -> `"1.5"`.
pub fn baths(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as u64)
    } else {
        format!("{n}")
    }
}

/// `"1,300 - 5,000"`, or `"at least 1,300"` without an upper bound.
pub fn sqft_range(min: u32, max: Option<u32>) -> String {
    match max {
        Some(max) => format!("{} - {}", thousands(min as u64), thousands(max as u64)),
        None => format!("at least {}", thousands(min as u64)),
    }
}
