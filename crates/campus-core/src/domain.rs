//! Domain results returned by the data collaborators.

use indexmap::IndexMap;

/// Fixed arity of a rendered lesson list. A rendering contract, not a
/// scheduling fact: sparse days are padded, overlong days truncated.
pub const LESSON_SLOTS: usize = 6;

/// Outcome of a timetable lookup for one class and date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimetableDay {
    /// Exactly [`LESSON_SLOTS`] entries of the form `"Lesson N: <subject>"`.
    Lessons(Vec<String>),
    /// The cycle calendar marks this date as a non-school day.
    /// A valid outcome, not an error — the view stays navigable.
    NoSchool,
}

/// Activities for one date, grouped by slot ("AM", "PM", ...).
///
/// Slot order is the feed's own arrival order — never re-sorted.
/// Built fresh per query and discarded after rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivitySet {
    /// Slot name → activity lines. Empty when the date has no activities.
    pub slots: IndexMap<String, Vec<String>>,
    /// Row-level remark from the feed.
    pub remark: Option<String>,
    /// Set when the requested date was absent and the nearest available
    /// date was substituted.
    pub note: Option<String>,
}
