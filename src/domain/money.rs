use std::fmt;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// For BRL/EUR/USD, 1 unit = 100 cents, so R$50.00 = 5000 cents.
pub type Cents = i64;

/// Rates (interest, penalty) are expressed in basis points: 100 bp = 1%.
pub type BasisPoints = i64;

const BP_SCALE: i128 = 10_000;

/// Format cents as a human-readable currency string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let negative = input.starts_with('-');
    let input = input.trim_start_matches('-');

    let parts: Vec<&str> = input.split('.').collect();
    match parts.len() {
        1 => {
            // No decimal point, treat as whole units
            let units: i64 = parts[0]
                .parse()
                .map_err(|_| ParseCentsError::InvalidFormat)?;
            let cents = units * 100;
            Ok(if negative { -cents } else { cents })
        }
        2 => {
            let units: i64 = if parts[0].is_empty() {
                0
            } else {
                parts[0]
                    .parse()
                    .map_err(|_| ParseCentsError::InvalidFormat)?
            };

            // Handle decimal part - pad or truncate to 2 digits
            let decimal_str = parts[1];
            let decimal_cents: i64 = match decimal_str.len() {
                0 => 0,
                1 => {
                    // Single digit like "5" means 50 cents
                    decimal_str
                        .parse::<i64>()
                        .map_err(|_| ParseCentsError::InvalidFormat)?
                        * 10
                }
                2 => decimal_str
                    .parse()
                    .map_err(|_| ParseCentsError::InvalidFormat)?,
                _ => {
                    // More than 2 decimal places - truncate
                    decimal_str[..2]
                        .parse()
                        .map_err(|_| ParseCentsError::InvalidFormat)?
                }
            };

            let cents = units * 100 + decimal_cents;
            Ok(if negative { -cents } else { cents })
        }
        _ => Err(ParseCentsError::InvalidFormat),
    }
}

/// Apply a flat basis-point rate to an amount, rounding half away from zero.
/// Example: 2% penalty on 120000 cents -> apply_rate(120000, 200) = 2400
pub fn apply_rate(amount: Cents, rate_bp: BasisPoints) -> Cents {
    let numerator = amount as i128 * rate_bp as i128;
    round_div(numerator, BP_SCALE) as Cents
}

/// Apply a monthly basis-point rate pro-rata over a number of days,
/// with a month fixed at 30 days (the billing convention).
/// Example: 1%/month on 120000 cents for 30 days -> 1200
pub fn pro_rata_monthly(amount: Cents, monthly_rate_bp: BasisPoints, days: i64) -> Cents {
    let numerator = amount as i128 * monthly_rate_bp as i128 * days as i128;
    round_div(numerator, BP_SCALE * 30) as Cents
}

/// Integer division rounded half away from zero.
fn round_div(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseCentsError {}
