// Property tests for the matchers: every source row lands in exactly one
// output, exact joins reconstruct the source, and fuzzy matches never
// cross a block.

use heatmatch::prelude::*;
use proptest::prelude::*;

type Rows = Vec<(String, i64)>;

fn rows_strategy(max: usize) -> impl Strategy<Value = Rows> {
    prop::collection::vec(("[a-c]{1,4}", 0i64..4), 0..max)
}

fn source_table(rows: &Rows) -> Table {
    Table::from_rows(
        ["Name", "Key"],
        rows.iter()
            .map(|(name, key)| vec![Value::from(name.as_str()), Value::Int(*key)])
            .collect(),
    )
    .unwrap()
}

fn target_table(rows: &Rows) -> Table {
    Table::from_rows(
        ["Target Name", "Target Key", "Student HEAT ID"],
        rows.iter()
            .enumerate()
            .map(|(id, (name, key))| {
                vec![
                    Value::from(name.as_str()),
                    Value::Int(*key),
                    Value::Int(id as i64 + 1),
                ]
            })
            .collect(),
    )
    .unwrap()
}

fn position(label: &Value) -> usize {
    label.as_int().unwrap() as usize
}

fn assert_partition(outcome: &MatchOutcome, source_len: usize) -> Result<(), TestCaseError> {
    let mut seen = vec![false; source_len];
    for label in outcome.unmatched.index() {
        let pos = position(label);
        prop_assert!(!seen[pos], "row {} unmatched twice", pos);
        seen[pos] = true;
    }
    let mut matched = vec![false; source_len];
    for label in outcome.matched.index() {
        let pos = position(label);
        prop_assert!(!seen[pos], "row {} both matched and unmatched", pos);
        matched[pos] = true;
    }
    for pos in 0..source_len {
        prop_assert!(seen[pos] || matched[pos], "row {} lost", pos);
    }
    Ok(())
}

fn fuzzy_config(threshold: f64) -> FuzzyMatchConfig {
    FuzzyMatchConfig::new(["Key"], ["Target Key"], "Name", "Target Name", "Fuzzy")
        .with_threshold(threshold)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn exact_match_reconstructs_source(source in rows_strategy(12), target in rows_strategy(12)) {
        let src = source_table(&source);
        let config = ExactMatchConfig::new(["Name", "Key"], ["Target Name", "Target Key"], "Exact");
        let outcome = exact_match(&src, &target_table(&target), &config).unwrap();

        assert_partition(&outcome, source.len())?;

        let hits = |row: &(String, i64)| target.iter().filter(|t| *t == row).count();
        let expected: usize = source.iter().map(hits).sum();
        prop_assert_eq!(outcome.matched.len(), expected);

        for (i, label) in outcome.matched.index().iter().enumerate() {
            let (name, key) = &source[position(label)];
            prop_assert_eq!(outcome.matched.get(i, "Name").cloned(), Some(Value::from(name.as_str())));
            prop_assert_eq!(outcome.matched.get(i, "Key").cloned(), Some(Value::Int(*key)));
        }
        for label in outcome.unmatched.index() {
            prop_assert_eq!(hits(&source[position(label)]), 0);
        }
    }

    #[test]
    fn fuzzy_match_partitions_and_respects_blocks(
        source in rows_strategy(12),
        target in rows_strategy(12),
        threshold in 0.0f64..=100.0,
    ) {
        let outcome =
            fuzzy_match(&source_table(&source), &target_table(&target), &fuzzy_config(threshold))
                .unwrap();

        assert_partition(&outcome, source.len())?;
        for i in 0..outcome.matched.len() {
            prop_assert_eq!(
                outcome.matched.get(i, "Key"),
                outcome.matched.get(i, "HEAT: Target Key")
            );
            let score = outcome.matched.get(i, "Fuzzy Score").and_then(|v| match v {
                Value::Float(f) => Some(*f),
                _ => None,
            });
            // scores are rounded to two decimals
            prop_assert!(score.is_some_and(|s| s >= threshold - 0.006));
        }
    }

    #[test]
    fn perfect_threshold_matches_identical_names(source in rows_strategy(12), target in rows_strategy(12)) {
        let outcome =
            fuzzy_match(&source_table(&source), &target_table(&target), &fuzzy_config(100.0))
                .unwrap();

        for i in 0..outcome.matched.len() {
            prop_assert_eq!(
                outcome.matched.get(i, "Name"),
                outcome.matched.get(i, "HEAT: Target Name")
            );
        }
        for label in outcome.unmatched.index() {
            let row = &source[position(label)];
            prop_assert!(!target.contains(row));
        }
    }

    #[test]
    fn rows_without_a_block_stay_unmatched(source in rows_strategy(12), target in rows_strategy(12)) {
        let outcome =
            fuzzy_match(&source_table(&source), &target_table(&target), &fuzzy_config(0.0))
                .unwrap();

        for label in outcome.unmatched.index() {
            let (_, key) = &source[position(label)];
            prop_assert!(!target.iter().any(|(_, k)| k == key));
        }
        for label in outcome.matched.index() {
            let (_, key) = &source[position(label)];
            prop_assert!(target.iter().any(|(_, k)| k == key));
        }
    }
}
