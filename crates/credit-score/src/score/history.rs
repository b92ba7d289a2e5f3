//! Parsing of the free-text "Credit History Age" field.

use thiserror::Error;

/// The duration field could not be read as two whole numbers.
/// Recoverable: the user is prompted to correct the field and resubmit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationFormatError {
    #[error("expected a duration like '15 Years and 3 Months'")]
    MissingComponent,
    #[error("'{token}' is not a whole number of {unit}")]
    NotANumber { token: String, unit: &'static str },
    #[error("the duration is too large to express as a month count")]
    OutOfRange,
}

/// Convert a duration such as "15 Years and 3 Months" into a month count.
///
/// The literal tokens "and", "Years" and "Months" are stripped; whatever
/// remains is read positionally, first number as years and second as months.
/// The parser is deliberately not label-aware: "3 Months and 15 Years"
/// yields 51, matching the behaviour the preprocessor was fitted against.
pub fn parse_credit_history_age(text: &str) -> Result<u32, DurationFormatError> {
    let stripped = text
        .replace("and", "")
        .replace("Months", "")
        .replace("Years", "");
    let mut tokens = stripped.split_whitespace();

    let years = parse_component(tokens.next(), "years")?;
    let months = parse_component(tokens.next(), "months")?;

    years
        .checked_mul(12)
        .and_then(|total| total.checked_add(months))
        .ok_or(DurationFormatError::OutOfRange)
}

fn parse_component(
    token: Option<&str>,
    unit: &'static str,
) -> Result<u32, DurationFormatError> {
    let token = token.ok_or(DurationFormatError::MissingComponent)?;
    token
        .parse::<u32>()
        .map_err(|_| DurationFormatError::NotANumber {
            token: token.to_string(),
            unit,
        })
}
