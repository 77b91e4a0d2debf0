use lexicon_model::{CompoundKind, CompoundSpec};
use proptest::prelude::*;

fn side() -> impl Strategy<Value = String> {
    // Names as they appear in the datasets: words, hyphens, inner spaces.
    proptest::string::string_regex("[A-Za-z][A-Za-z0-9 _-]{0,12}").unwrap()
}

fn kind() -> impl Strategy<Value = CompoundKind> {
    prop_oneof![
        Just(CompoundKind::Responsibility),
        Just(CompoundKind::Transformation),
        Just(CompoundKind::EnhancementMedium),
    ]
}

proptest! {
    #[test]
    fn one_colon_always_parses_to_trimmed_sides(kind in kind(), left in side(), right in side(), pad in 0usize..3) {
        let spaces = " ".repeat(pad);
        let raw = format!("{spaces}{left}{spaces}:{spaces}{right}{spaces}");
        let spec = CompoundSpec::parse(kind, &raw).unwrap();
        prop_assert_eq!(spec.kind, kind);
        prop_assert_eq!(spec.left, left.trim());
        prop_assert_eq!(spec.right, right.trim());
        prop_assert_eq!(spec.raw, raw);
    }

    #[test]
    fn colon_free_values_never_parse(kind in kind(), text in side()) {
        prop_assert!(CompoundSpec::parse(kind, &text).is_err());
    }

    #[test]
    fn extra_colons_never_parse(kind in kind(), a in side(), b in side(), c in side()) {
        let raw = format!("{a}:{b}:{c}");
        prop_assert!(CompoundSpec::parse(kind, &raw).is_err());
    }
}
