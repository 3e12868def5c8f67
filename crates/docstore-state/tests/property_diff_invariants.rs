use docstore_state::{
    apply_diff, diff_states, ApplyOptions, Delta, ListDiff, ListElementDiff, State, StateDiff,
    StateValue,
};
use proptest::prelude::*;

fn items(values: &[i64]) -> StateValue {
    StateValue::List(values.iter().map(|v| StateValue::long(*v)).collect())
}

proptest! {
    #[test]
    fn property_deltas_sum_increments(base in -1_000_000i64..1_000_000, incs in prop::collection::vec(-1000i64..1000, 1..8)) {
        let mut s = State::new().with("n", base);
        let mut seen = base;
        for inc in &incs {
            let diff = StateDiff::new().delta("n", Delta::long(seen, *inc));
            apply_diff(&mut s, &diff, &ApplyOptions::default()).unwrap();
            seen += inc;
        }
        let expected: i64 = base + incs.iter().sum::<i64>();
        prop_assert_eq!(s.get("n"), Some(&StateValue::long(expected)));
    }

    #[test]
    fn property_composed_delta_matches_sequential(a in -1000i64..1000, b in -1000i64..1000, base in -1000i64..1000) {
        let mut sequential = State::new().with("n", base);
        let opts = ApplyOptions::default();
        apply_diff(&mut sequential, &StateDiff::new().delta("n", Delta::long(base, a)), &opts).unwrap();
        apply_diff(&mut sequential, &StateDiff::new().delta("n", Delta::long(base + a, b)), &opts).unwrap();

        let mut composed = State::new().with("n", base);
        let delta = Delta::long(base, a).add(&Delta::long(base + a, b)).unwrap();
        apply_diff(&mut composed, &StateDiff::new().delta("n", delta), &opts).unwrap();

        prop_assert_eq!(sequential, composed);
    }

    #[test]
    fn property_rpush_appends(head in prop::collection::vec(any::<i64>(), 1..6), tail in prop::collection::vec(any::<i64>(), 0..6)) {
        let mut s = State::new().with("l", items(&head));
        let diff = StateDiff::new().list(
            "l",
            ListDiff::list().with_rpush(tail.iter().map(|v| StateValue::long(*v)).collect()),
        );
        apply_diff(&mut s, &diff, &ApplyOptions::strict()).unwrap();
        let mut expected = head.clone();
        expected.extend(&tail);
        prop_assert_eq!(s.get("l"), Some(&items(&expected)));
    }

    #[test]
    fn property_positional_overwrite(values in prop::collection::vec(any::<i64>(), 2..8), at in 0usize..8, replacement in any::<i64>()) {
        let at = at % values.len();
        let mut positions = vec![ListElementDiff::Nop; values.len()];
        positions[at] = ListElementDiff::Value(StateValue::long(replacement));

        let mut s = State::new().with("l", items(&values));
        let diff = StateDiff::new().list("l", ListDiff::list().with_diff(positions));
        apply_diff(&mut s, &diff, &ApplyOptions::strict()).unwrap();

        let mut expected = values.clone();
        expected[at] = replacement;
        prop_assert_eq!(s.get("l"), Some(&items(&expected)));
    }

    #[test]
    fn property_computed_diff_reaches_target(old in prop::collection::vec(any::<i64>(), 0..6), new in prop::collection::vec(any::<i64>(), 0..6), title in "[a-z]{0,4}") {
        let mut a = State::new().with("title", "t");
        if !old.is_empty() {
            a.put("l", items(&old));
        }
        let mut b = State::new();
        if !title.is_empty() {
            b.put("title", title.as_str());
        }
        if !new.is_empty() {
            b.put("l", items(&new));
        }
        let diff = diff_states(&a, &b);
        apply_diff(&mut a, &diff, &ApplyOptions::strict()).unwrap();
        prop_assert_eq!(a, b);
    }
}

#[test]
fn test_append_two_strings() {
    let mut s = State::new().with("tags", StateValue::string_array(["a", "b"]));
    let diff = StateDiff::new().list("tags", ListDiff::array().with_rpush(vec!["c".into(), "d".into()]));
    apply_diff(&mut s, &diff, &ApplyOptions::default()).unwrap();
    assert_eq!(s.get("tags"), Some(&StateValue::string_array(["a", "b", "c", "d"])));
}

#[test]
fn test_nop_then_value() {
    let mut s = State::new().with("tags", StateValue::string_array(["a", "b"]));
    let diff = StateDiff::new().list(
        "tags",
        ListDiff::array().with_diff(vec![ListElementDiff::Nop, ListElementDiff::Value("x".into())]),
    );
    apply_diff(&mut s, &diff, &ApplyOptions::default()).unwrap();
    assert_eq!(s.get("tags"), Some(&StateValue::string_array(["a", "x"])));
}
