//! Small presentation helpers shared by session hosts.
//!
//! Deliberately locale-free; anything needing translation belongs to the UI.

/// Countdown label for the remaining time, `MM:SS` under an hour and
/// `H:MM:SS` above it.
#[must_use]
pub fn format_remaining(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Cursor label, e.g. `Question 3 of 10` (indices are zero-based inputs).
#[must_use]
pub fn position_label(current_index: usize, total: usize) -> String {
    format!("Question {} of {}", current_index + 1, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_under_an_hour() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(59), "00:59");
        assert_eq!(format_remaining(90), "01:30");
        assert_eq!(format_remaining(3599), "59:59");
    }

    #[test]
    fn remaining_with_hours() {
        assert_eq!(format_remaining(3600), "1:00:00");
        assert_eq!(format_remaining(3661), "1:01:01");
        assert_eq!(format_remaining(10_800), "3:00:00");
    }

    #[test]
    fn position_is_one_based() {
        assert_eq!(position_label(0, 10), "Question 1 of 10");
        assert_eq!(position_label(9, 10), "Question 10 of 10");
    }
}
