use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;

use crate::totals::round_minor;

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// COP amount for documents: no decimals, thousands grouped with `.`,
/// `$` prefix. Matches the es-CO formatting the documents have always used,
/// so it must stay locale-independent at runtime.
pub fn format_cop(amount: Decimal) -> String {
    let rounded = round_minor(amount);
    let negative = rounded.is_sign_negative();
    let digits = rounded.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-$ {grouped}")
    } else {
        format!("$ {grouped}")
    }
}

/// Long-form es-CO date: `6 de agosto de 2026`.
pub fn format_long_date(date: &DateTime<Utc>) -> String {
    let month = MONTHS[date.month0() as usize];
    format!("{} de {} de {}", date.day(), month, date.year())
}
