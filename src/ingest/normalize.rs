/// Canonical content title for a topic label: every `.` removed, nothing else touched.
pub fn normalize(topic: &str) -> String {
    topic.replace('.', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "Thermodynamics.",
        "U.S. Constitution",
        "...",
        "  Laws of motion. ",
        "Mughal Empire",
        "",
        "   ",
        "Ph.D. level. topics..",
    ];

    #[test]
    fn strips_every_dot() {
        assert_eq!(normalize("Thermodynamics."), "Thermodynamics");
        assert_eq!(normalize("U.S. Constitution"), "US Constitution");
        assert_eq!(normalize("..."), "");
        for s in SAMPLES {
            assert!(!normalize(s).contains('.'), "dot left in {:?}", s);
        }
    }

    #[test]
    fn idempotent() {
        for s in SAMPLES {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn case_and_whitespace_untouched() {
        assert_eq!(normalize("  Laws of motion. "), "  Laws of motion ");
        assert_eq!(normalize("   "), "   ");
        assert_eq!(normalize("eNtRoPy"), "eNtRoPy");
    }
}
