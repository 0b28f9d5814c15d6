//! # Portal Primitives
//!
//! Fixed rules and limits compiled into the portal.
//!
//! The portal starts with an empty store but fixed logic.
//! These constants are immutable at runtime.

/// Experience thresholds for levels 1..=7, ascending.
///
/// Level `n` is reached once XP is at least `XP_THRESHOLDS[n - 1]`.
/// The same thresholds apply to the overall counter and to every track.
pub const XP_THRESHOLDS: [u64; 7] = [0, 100, 250, 500, 1000, 1500, 2500];

// =============================================================================
// BADGE RULES
// =============================================================================

/// Badge awarded for the first completed mission.
pub const FIRST_COMPLETION_BADGE: &str = "badge-1";

/// Badge awarded once five missions are completed.
pub const FIVE_COMPLETIONS_BADGE: &str = "badge-2";

/// Badge awarded for completing any Orientation mission.
pub const ORIENTATION_BADGE: &str = "badge-3";

/// Completed missions needed for [`FIVE_COMPLETIONS_BADGE`].
pub const FIVE_COMPLETIONS_COUNT: usize = 5;

/// Catalog entries `(id, name, description)` for the rule badges.
///
/// A rule badge missing from the catalog is installed from here before it
/// is awarded.
pub const RULE_BADGES: [(&str, &str, &str); 3] = [
    (
        FIRST_COMPLETION_BADGE,
        "First Mission Complete",
        "Completed a first mission.",
    ),
    (
        FIVE_COMPLETIONS_BADGE,
        "Five Missions Complete",
        "Completed five missions.",
    ),
    (
        ORIENTATION_BADGE,
        "Orientation Complete",
        "Completed the Orientation stage.",
    ),
];

// =============================================================================
// SNAPSHOT FORMAT
// =============================================================================

/// Magic bytes for the portal snapshot header.
pub const MAGIC_BYTES: &[u8; 4] = b"HBPT";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the record layout.
/// Version 2 added announcements.
pub const FORMAT_VERSION: u8 = 2;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of names and titles.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of descriptions.
pub const MAX_DESCRIPTION_LENGTH: usize = 4096;

/// Maximum length of a support request message.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Smallest XP reward an admin may put on a task.
pub const MIN_TASK_XP: u64 = 10;

/// Largest XP reward an admin may put on a task.
pub const MAX_TASK_XP: u64 = 300;

// =============================================================================
// DASHBOARD
// =============================================================================

/// Number of "this week's focus" suggestions on the home view.
pub const FOCUS_SUGGESTION_LIMIT: usize = 3;

/// Look-back window for "recent progress" on the home view.
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// Newest announcements shown on the home view.
pub const ANNOUNCEMENT_FEED_LIMIT: usize = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_strictly_ascending_from_zero() {
        assert_eq!(XP_THRESHOLDS[0], 0);
        assert!(XP_THRESHOLDS.windows(2).all(|w| w[0] < w[1]));
    }
}
