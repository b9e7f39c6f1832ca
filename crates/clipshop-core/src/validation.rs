//! # Validation Module
//!
//! Input validation rules for clipshop.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE - input and business rule validation              │
//! │  Layer 2: Database - NOT NULL, CHECK, UNIQUE, foreign keys              │
//! │                                                                         │
//! │  Every failed check short-circuits before any mutation happens.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::CardDetails;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum quantity of a single product per order line.
/// Guards against accidental over-ordering (1000 typed instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order line quantity.
///
/// ## Rules
/// - Must be positive (> 0); zero is malformed input, not a no-op
/// - Must not exceed [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (promotional items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock level. Negative stock is never representable.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates an entity display name.
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 100 {
        return Err(ValidationError::OutOfRange {
            field: "name".to_string(),
            min: 1,
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Duration Parsing
// =============================================================================

/// Parses an ISO-8601 duration of the `PT1H30M` family into whole minutes.
///
/// Accepted components are hours, minutes and seconds; seconds must divide
/// evenly into minutes. `PT45M` → 45, `PT1H` → 60, `PT1H30M` → 90.
pub fn parse_iso_duration_minutes(input: &str) -> ValidationResult<i64> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "duration".to_string(),
        reason: reason.to_string(),
    };

    let rest = input
        .strip_prefix("PT")
        .ok_or_else(|| invalid("must start with PT"))?;

    if rest.is_empty() {
        return Err(invalid("must contain at least one component"));
    }

    let mut hours: i64 = 0;
    let mut minutes: i64 = 0;
    let mut seconds: i64 = 0;
    let mut number = String::new();

    for c in rest.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        let value: i64 = number
            .parse()
            .map_err(|_| invalid("component without a number"))?;
        number.clear();
        match c {
            'H' => hours = value,
            'M' => minutes = value,
            'S' => seconds = value,
            _ => return Err(invalid("unknown component")),
        }
    }

    if !number.is_empty() {
        return Err(invalid("trailing number without a unit"));
    }
    if seconds % 60 != 0 {
        return Err(invalid("seconds must be a whole number of minutes"));
    }

    let total = hours * 60 + minutes + seconds / 60;
    if total <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "duration".to_string(),
        });
    }

    Ok(total)
}

// =============================================================================
// Card Validators (simulated payment)
// =============================================================================

/// Validates card fields for the simulated payment flow.
///
/// ## Rules
/// - Number: 16 digits, optionally grouped with spaces or hyphens
/// - Expiry: `MM/YY`, not before the month containing `today`
/// - CVC: exactly 3 digits
///
/// Format and non-expiry only; nothing is charged and nothing is stored.
pub fn validate_card(card: &CardDetails, today: NaiveDate) -> ValidationResult<()> {
    validate_card_number(&card.number)?;
    validate_card_expiry(&card.expiry, today)?;
    validate_card_cvc(&card.cvc)?;
    Ok(())
}

fn validate_card_number(number: &str) -> ValidationResult<()> {
    let digits: String = number
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();

    if digits.len() != 16 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "card_number".to_string(),
            reason: "must be 16 digits".to_string(),
        });
    }

    Ok(())
}

fn validate_card_expiry(expiry: &str, today: NaiveDate) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidFormat {
        field: "expiry".to_string(),
        reason: "must be MM/YY".to_string(),
    };

    let (month, year) = expiry.split_once('/').ok_or_else(invalid)?;
    if month.len() != 2 || year.len() != 2 {
        return Err(invalid());
    }

    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }

    // Two-digit years are 2000-based. The card is valid through the last
    // day of its expiry month.
    use chrono::Datelike;
    let year = 2000 + year;
    if (year, month) < (today.year(), today.month()) {
        return Err(ValidationError::CardExpired);
    }

    Ok(())
}

fn validate_card_cvc(cvc: &str) -> ValidationResult<()> {
    if cvc.len() != 3 || !cvc.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "cvc".to_string(),
            reason: "must be 3 digits".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn card(number: &str, expiry: &str, cvc: &str) -> CardDetails {
        CardDetails {
            number: number.to_string(),
            expiry: expiry.to_string(),
            cvc: cvc.to_string(),
        }
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_and_stock() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());

        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
    }

    #[test]
    fn test_parse_iso_duration() {
        assert_eq!(parse_iso_duration_minutes("PT45M").unwrap(), 45);
        assert_eq!(parse_iso_duration_minutes("PT1H").unwrap(), 60);
        assert_eq!(parse_iso_duration_minutes("PT1H30M").unwrap(), 90);
        assert_eq!(parse_iso_duration_minutes("PT120S").unwrap(), 2);

        assert!(parse_iso_duration_minutes("45M").is_err());
        assert!(parse_iso_duration_minutes("PT").is_err());
        assert!(parse_iso_duration_minutes("PT90S").is_err());
        assert!(parse_iso_duration_minutes("PT0M").is_err());
    }

    #[test]
    fn test_validate_card_accepts_valid() {
        let today = date(2025, 6, 10);
        assert!(validate_card(&card("4242424242424242", "12/27", "123"), today).is_ok());
        assert!(validate_card(&card("4242 4242 4242 4242", "06/25", "999"), today).is_ok());
        assert!(validate_card(&card("4242-4242-4242-4242", "07/25", "000"), today).is_ok());
    }

    #[test]
    fn test_validate_card_rejects_bad_format() {
        let today = date(2025, 6, 10);
        assert!(validate_card(&card("1234", "12/27", "123"), today).is_err());
        assert!(validate_card(&card("4242424242424242", "13/27", "123"), today).is_err());
        assert!(validate_card(&card("4242424242424242", "2027-12", "123"), today).is_err());
        assert!(validate_card(&card("4242424242424242", "12/27", "12"), today).is_err());
        assert!(validate_card(&card("4242424242424242", "12/27", "12a"), today).is_err());
    }

    #[test]
    fn test_validate_card_rejects_expired() {
        let today = date(2025, 6, 10);
        let err = validate_card(&card("4242424242424242", "05/25", "123"), today).unwrap_err();
        assert!(matches!(err, ValidationError::CardExpired));

        // Expiring this month is still valid.
        assert!(validate_card(&card("4242424242424242", "06/25", "123"), today).is_ok());
    }
}
