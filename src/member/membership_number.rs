//! Membership number formatting and allocation helpers.
//!
//! Numbers look like `PSP-K-2025-00001`: a fixed party prefix, the calendar
//! year of approval, and a 5-digit zero-padded sequence that restarts at
//! `00001` every year.

const PREFIX: &str = "PSP-K";
const SEQUENCE_WIDTH: usize = 5;

/// Prefix shared by every membership number issued in `year`.
#[must_use]
pub fn year_prefix(year: i32) -> String {
    format!("{PREFIX}-{year:04}-")
}

/// Render a membership number from a year and sequence value.
#[must_use]
pub fn format_number(year: i32, sequence: u32) -> String {
    format!("{PREFIX}-{year:04}-{sequence:05}")
}

/// Parse the numeric sequence out of a membership number issued in `year`.
///
/// Returns `None` for numbers from other years or malformed values, so a
/// stray row cannot poison allocation for the current year.
#[must_use]
pub fn parse_sequence(number: &str, year: i32) -> Option<u32> {
    let suffix = number.strip_prefix(&year_prefix(year))?;
    if suffix.len() != SEQUENCE_WIDTH || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Compute the next membership number for `year` given the highest number
/// currently on record for that year (lexicographic max, which matches the
/// numeric max because sequences are zero-padded).
#[must_use]
pub fn next_number(highest: Option<&str>, year: i32) -> String {
    let next = highest
        .and_then(|number| parse_sequence(number, year))
        .map_or(1, |sequence| sequence + 1);
    format_number(year, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_number_of_a_year_is_00001() {
        assert_eq!(next_number(None, 2025), "PSP-K-2025-00001");
    }

    #[test]
    fn next_number_increments_and_keeps_padding() {
        assert_eq!(
            next_number(Some("PSP-K-2025-00001"), 2025),
            "PSP-K-2025-00002"
        );
        assert_eq!(
            next_number(Some("PSP-K-2025-00099"), 2025),
            "PSP-K-2025-00100"
        );
        assert_eq!(
            next_number(Some("PSP-K-2025-12345"), 2025),
            "PSP-K-2025-12346"
        );
    }

    #[test]
    fn numbers_from_other_years_restart_the_sequence() {
        assert_eq!(
            next_number(Some("PSP-K-2024-00412"), 2025),
            "PSP-K-2025-00001"
        );
    }

    #[test]
    fn malformed_numbers_are_ignored() {
        assert_eq!(next_number(Some("garbage"), 2025), "PSP-K-2025-00001");
        assert_eq!(
            next_number(Some("PSP-K-2025-1"), 2025),
            "PSP-K-2025-00001"
        );
        assert_eq!(
            next_number(Some("PSP-K-2025-abcde"), 2025),
            "PSP-K-2025-00001"
        );
    }

    #[test]
    fn parse_sequence_round_trips_format() {
        let number = format_number(2025, 42);
        assert_eq!(number, "PSP-K-2025-00042");
        assert_eq!(parse_sequence(&number, 2025), Some(42));
        assert_eq!(parse_sequence(&number, 2024), None);
    }
}
