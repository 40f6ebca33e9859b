//! Specificity scoring for match patterns.
//!
//! Mirrors the default-priority rules of stylesheet processors: a bare name
//! scores 0, wildcards score below it, predicates and descendant steps
//! above. An explicit `priority` on a template always overrides the
//! computed score.

/// Computes the default priority of a match pattern. Pure and
/// deterministic: the score depends on the pattern text alone.
pub fn resolve(pattern: &str) -> f64 {
    let trimmed = pattern.trim();

    // Predicates and descendant steps are the most specific class.
    if trimmed.contains('[') && !trimmed.contains("[*]") {
        return 0.5;
    }
    if trimmed.contains("//") || trimmed.contains("..") {
        return 0.5;
    }

    // Wildcard steps and attribute wildcards are the least specific.
    if trimmed.contains('*') {
        return -0.5;
    }

    0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_names_score_zero() {
        assert_eq!(resolve("$.customer"), 0.0);
        assert_eq!(resolve("chapter/title"), 0.0);
        assert_eq!(resolve("/"), 0.0);
    }

    #[test]
    fn wildcards_score_below_names() {
        assert_eq!(resolve("$.*"), -0.5);
        assert_eq!(resolve("chapter/*"), -0.5);
        assert_eq!(resolve("@*"), -0.5);
        assert_eq!(resolve("$.items[*]"), -0.5);
    }

    #[test]
    fn predicates_and_descendants_score_above_names() {
        assert_eq!(resolve("item[1]"), 0.5);
        assert_eq!(resolve("$..price"), 0.5);
        assert_eq!(resolve("//title"), 0.5);
    }

    #[test]
    fn deterministic_for_identical_input() {
        for _ in 0..3 {
            assert_eq!(resolve("$.items[*]"), resolve("$.items[*]"));
        }
    }
}
