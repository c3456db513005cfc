//! Guided exercise catalog.
//!
//! Fixed lookup table keyed by exercise kind. Unknown kinds fall back to the
//! default grounding sequence instead of failing, so a mistyped kind from a
//! client never breaks the conversational surface.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static CATALOG: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        "breathing",
        vec![
            "Find a comfortable position, sitting or lying down",
            "Close your eyes or soften your gaze",
            "Breathe in slowly through your nose for 4 counts",
            "Hold your breath gently for 4 counts",
            "Exhale slowly through your mouth for 6 counts",
            "Repeat this cycle 5-10 times",
            "Notice how your body feels more relaxed with each breath",
        ],
    );
    m.insert(
        "relaxation",
        vec![
            "Lie down in a comfortable position",
            "Start by tensing the muscles in your toes for 5 seconds, then release",
            "Move up to your calves - tense for 5 seconds, then relax",
            "Continue with your thighs, buttocks, and abdomen",
            "Tense your arms, hands, and shoulders, then let go",
            "Finally, scrunch your face muscles, then relax completely",
            "Take a moment to notice the feeling of complete relaxation",
            "Breathe deeply and enjoy this peaceful state",
        ],
    );
    m.insert(
        "mindfulness",
        vec![
            "Sit comfortably with your feet flat on the ground",
            "Take three deep breaths to center yourself",
            "Notice 5 things you can see around you",
            "Identify 4 things you can physically feel (chair, clothes, temperature)",
            "Listen for 3 different sounds in your environment",
            "Find 2 things you can smell",
            "Think of 1 thing you can taste",
            "Take a final deep breath and return to the present moment",
        ],
    );
    m
});

/// Default grounding sequence for unknown exercise kinds.
static DEFAULT_EXERCISE: &[&str] = &[
    "Sit in a quiet, comfortable space",
    "Take a few deep breaths to center yourself",
    "Focus on the present moment",
    "Allow thoughts to come and go without judgment",
    "When ready, gently return your attention to your surroundings",
];

/// Look up the steps for an exercise kind.
pub fn steps_for(kind: &str) -> Vec<String> {
    CATALOG
        .get(kind.to_lowercase().as_str())
        .map(|steps| steps.iter().map(|s| s.to_string()).collect())
        .unwrap_or_else(|| DEFAULT_EXERCISE.iter().map(|s| s.to_string()).collect())
}

/// Kinds with a dedicated sequence in the catalog.
pub fn known_kinds() -> Vec<&'static str> {
    let mut kinds: Vec<_> = CATALOG.keys().copied().collect();
    kinds.sort_unstable();
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breathing_has_at_least_four_steps() {
        let steps = steps_for("breathing");
        assert!(steps.len() >= 4);
        assert!(steps[0].contains("comfortable position"));
    }

    #[test]
    fn unknown_kind_falls_back_to_default() {
        let steps = steps_for("unknown-kind");
        assert_eq!(steps.len(), DEFAULT_EXERCISE.len());
        assert_eq!(steps[0], "Sit in a quiet, comfortable space");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(steps_for("Breathing"), steps_for("breathing"));
    }

    #[test]
    fn known_kinds_are_sorted() {
        assert_eq!(known_kinds(), vec!["breathing", "mindfulness", "relaxation"]);
    }
}
