//! Content classification for the availability view.
//!
//! Ordered rules, first match wins. The negative notice outranks the slot
//! pattern because the page can mention times in unrelated static content
//! (footers, opening hours) while still saying there is nothing bookable.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{SlotDescriptor, Status};

/// The canonical "no slots" notice and its known paraphrases, lowercase.
const NO_SLOTS_PHRASES: &[&str] = &[
    "no hay horas disponibles",
    "no hay citas disponibles",
    "no hay huecos disponibles",
];

/// A two-digit hour:minute token followed on the same line by the
/// open-slot marker.
#[allow(clippy::expect_used)] // pattern is a compile-time constant
static SLOT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{2}:\d{2}\b[^\n]*?hueco libre").expect("slot pattern compiles")
});

/// Map the visible text of the current surface to exactly one status.
///
/// `reached_target` is the navigation driver's report of whether the
/// location ever showed the target fragment; content evidence is checked
/// first because the fragment can lag behind an otherwise-loaded view.
pub fn classify(text: &str, reached_target: bool) -> Status {
    let lowered = text.to_lowercase();
    if NO_SLOTS_PHRASES.iter().any(|p| lowered.contains(p)) {
        return Status::NoSlots;
    }

    if let Some(found) = SLOT_PATTERN.find(text) {
        return Status::SlotFound(SlotDescriptor {
            text: found.as_str().trim().to_string(),
        });
    }

    if !reached_target {
        return Status::UnreachableTarget;
    }

    Status::AmbiguousContent
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {rstest::rstest, super::*};

    #[rstest]
    #[case("Lo sentimos. No hay horas disponibles.")]
    #[case("NO HAY HORAS DISPONIBLES")]
    #[case("Aviso: no hay citas disponibles para este servicio")]
    #[case("Actualmente no hay huecos disponibles")]
    fn no_slots_phrases_match(#[case] text: &str) {
        assert_eq!(classify(text, true), Status::NoSlots);
    }

    #[test]
    fn negative_phrase_wins_over_stray_time_token() {
        // Precedence: the notice can co-occur with unrelated hour displays.
        let text = "No hay horas disponibles. Horario de atención: 09:00 Hueco libre";
        assert_eq!(classify(text, true), Status::NoSlots);
    }

    #[test]
    fn slot_pattern_yields_descriptor() {
        let text = "Servicios consulares\nLunes 14:30 Hueco libre\npie de página";
        match classify(text, true) {
            Status::SlotFound(slot) => assert_eq!(slot.text, "14:30 Hueco libre"),
            other => panic!("expected SlotFound, got {other:?}"),
        }
    }

    #[test]
    fn slot_marker_is_case_insensitive() {
        let text = "09:15   HUECO LIBRE";
        assert!(matches!(classify(text, true), Status::SlotFound(_)));
    }

    #[test]
    fn time_and_marker_on_different_lines_do_not_match() {
        let text = "Cierre: 14:30\nHueco libre en otra oficina";
        assert_eq!(classify(text, true), Status::AmbiguousContent);
    }

    #[test]
    fn unreached_target_without_patterns_is_unreachable() {
        let text = "Bienvenido al portal de citas. Pulse continuar.";
        assert_eq!(classify(text, false), Status::UnreachableTarget);
    }

    #[test]
    fn reached_target_without_patterns_is_ambiguous() {
        let text = "Contenido genérico sin relación con citas.";
        assert_eq!(classify(text, true), Status::AmbiguousContent);
    }

    #[test]
    fn scenario_no_slots_notice() {
        let text = "No hay horas disponibles. Inténtelo de nuevo.";
        assert_eq!(classify(text, true), Status::NoSlots);
    }

    #[test]
    fn scenario_slot_found_descriptor_is_matched_substring() {
        let text = "Nacionalidad LMD 14:30 Hueco libre Reservar";
        match classify(text, true) {
            Status::SlotFound(slot) => assert_eq!(slot.text, "14:30 Hueco libre"),
            other => panic!("expected SlotFound, got {other:?}"),
        }
    }

    #[test]
    fn empty_text_unreached_is_unreachable() {
        assert_eq!(classify("", false), Status::UnreachableTarget);
    }

    #[test]
    fn empty_text_reached_is_ambiguous() {
        assert_eq!(classify("", true), Status::AmbiguousContent);
    }
}
