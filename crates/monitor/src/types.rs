//! Statuses and results produced by one poll attempt.

use std::fmt;

use tempfile::TempPath;

/// The literal text identifying one offered appointment time.
///
/// The text is also the click reference: a reservation attempt re-locates
/// the element by this exact text on the same surface. Valid only within
/// the attempt that discovered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDescriptor {
    pub text: String,
}

/// Classification of the availability view's content, produced fresh each
/// attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The canonical "no slots" notice was present. The common case.
    NoSlots,
    /// A time token co-located with the open-slot marker.
    SlotFound(SlotDescriptor),
    /// Navigation never reached the target fragment.
    UnreachableTarget,
    /// Text was collected but matched no known pattern.
    AmbiguousContent,
}

impl Status {
    /// Terminal statuses end the poll run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::SlotFound(_) | Self::AmbiguousContent)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NoSlots => "no_slots",
            Self::SlotFound(_) => "slot_found",
            Self::UnreachableTarget => "unreachable_target",
            Self::AmbiguousContent => "ambiguous_content",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlotFound(slot) => write!(f, "slot_found({})", slot.text),
            other => f.write_str(other.label()),
        }
    }
}

/// Outcome of the best-effort reservation click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOutcome {
    NotAttempted,
    Clicked,
    ClickFailed,
}

/// Everything one attempt produced. Consumed by logging and then dropped;
/// dropping deletes the screenshot temp file.
#[derive(Debug)]
pub struct AttemptResult {
    pub status: Status,
    pub location: String,
    pub text_preview: String,
    pub screenshot: Option<TempPath>,
    pub reservation: ReservationOutcome,
}

/// What stopped a poll run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A terminal attempt was reached and its notification dispatched.
    FoundAndHandled,
    /// All attempts ran without a terminal status. `classified_any` is
    /// false when every attempt failed before producing a status.
    ExhaustedAttempts { classified_any: bool },
    /// The environment cannot support a run at all (e.g. no browser).
    FatalError(String),
}

/// Truncate text for log output, on a char boundary.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    let cleaned: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() <= max_chars {
        cleaned
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{truncated}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(
            Status::SlotFound(SlotDescriptor {
                text: "14:30 Hueco libre".into()
            })
            .is_terminal()
        );
        assert!(Status::AmbiguousContent.is_terminal());
        assert!(!Status::NoSlots.is_terminal());
        assert!(!Status::UnreachableTarget.is_terminal());
    }

    #[test]
    fn status_display_includes_slot_text() {
        let status = Status::SlotFound(SlotDescriptor {
            text: "14:30 Hueco libre".into(),
        });
        assert_eq!(status.to_string(), "slot_found(14:30 Hueco libre)");
        assert_eq!(Status::NoSlots.to_string(), "no_slots");
    }

    #[test]
    fn preview_collapses_whitespace_and_truncates() {
        assert_eq!(truncate_preview("a  b\n\nc", 10), "a b c");
        assert_eq!(truncate_preview("abcdef", 3), "abc…");
    }
}
