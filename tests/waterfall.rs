// End-to-end waterfall: exact, then fuzzy, then age-range matching, with
// the matched tables stacked and checked for updates and duplicates.

use heatmatch::algorithms::Ratio;
use heatmatch::matching::{FUZZY_SCORE_COLUMN, MATCH_TYPE_COLUMN};
use heatmatch::prelude::*;
use heatmatch::{fuzzy_match_with_scorer, DuplicateGroups};

fn heat_export() -> Table {
    Table::from_rows(
        [
            "Student HEAT ID",
            "Student Name",
            "Date of Birth",
            "Postcode",
            "School",
        ],
        vec![
            vec![
                Value::Int(1001),
                "Jane Doe".into(),
                "2008-09-02".into(),
                "AA1 1AA".into(),
                "Oak Academy".into(),
            ],
            vec![
                Value::Int(1002),
                "Sarah Jane Brown".into(),
                "2009-03-14".into(),
                "AA1 1AA".into(),
                "Oak Academy".into(),
            ],
            vec![
                Value::Int(1003),
                "Mohammed Ali".into(),
                "2010-11-20".into(),
                "BB2 2BB".into(),
                "Oak Academy".into(),
            ],
            vec![
                Value::Int(1004),
                "Chloe Smith".into(),
                "2012-01-05".into(),
                "CC3 3CC".into(),
                "Elm School".into(),
            ],
        ],
    )
    .unwrap()
}

fn school_list() -> Table {
    Table::from_rows(
        ["Full Name", "DOB", "Postcode", "Year Group", "School"],
        vec![
            vec![
                "Mohammed Ali".into(),
                "2010-11-20".into(),
                "BB2 2BB".into(),
                "Year 8".into(),
                "Oak Academy".into(),
            ],
            vec![
                "Jane Doe".into(),
                "2008-09-02".into(),
                "AA1 1AA".into(),
                "Year 11".into(),
                "Oak Academy".into(),
            ],
            vec![
                "Chloe Smyth".into(),
                Value::Null,
                "CC3 3CD".into(),
                "Year 7".into(),
                "Elm School".into(),
            ],
            vec![
                "Oliver Twist".into(),
                "2011-02-02".into(),
                "DD4 4DD".into(),
                "Year 8".into(),
                "Elm School".into(),
            ],
        ],
    )
    .unwrap()
}

#[test]
fn test_jane_doe_fuzzy_scenario() {
    let source = Table::from_rows(
        ["Full Name", "DOB", "Postcode"],
        vec![vec!["Jane Doe".into(), "2008-09-02".into(), "AA1 1AA".into()]],
    )
    .unwrap();
    let config = FuzzyMatchConfig::new(
        ["DOB", "Postcode"],
        ["Date of Birth", "Postcode"],
        "Full Name",
        "Student Name",
        "Fuzzy: DOB + Postcode",
    )
    .with_threshold(70.0);

    let outcome = fuzzy_match(&source, &heat_export(), &config).unwrap();

    assert_eq!(outcome.matched.len(), 1);
    assert!(outcome.unmatched.is_empty());
    assert_eq!(
        outcome.matched.get(0, "HEAT: Student Name"),
        Some(&Value::from("Jane Doe"))
    );
    assert_eq!(
        outcome.matched.get(0, "HEAT: Student HEAT ID"),
        Some(&Value::Int(1001))
    );
    assert_eq!(
        outcome.matched.get(0, FUZZY_SCORE_COLUMN),
        Some(&Value::Float(100.0))
    );
}

#[test]
fn test_waterfall_stages_partition_the_source() {
    let heat = heat_export();
    let source = school_list();

    let exact = exact_match(
        &source,
        &heat,
        &ExactMatchConfig::new(
            ["Full Name", "DOB", "Postcode"],
            ["Student Name", "Date of Birth", "Postcode"],
            "Exact: Name + DOB + Postcode",
        ),
    )
    .unwrap();
    assert_eq!(exact.matched.len(), 2);
    assert!(exact.advisories.is_empty());

    let fuzzy = fuzzy_match(
        &exact.unmatched,
        &heat,
        &FuzzyMatchConfig::new(
            ["DOB"],
            ["Date of Birth"],
            "Full Name",
            "Student Name",
            "Fuzzy: DOB",
        ),
    )
    .unwrap();
    // Chloe has no DOB, Oliver is not in HEAT
    assert!(fuzzy.matched.is_empty());
    assert_eq!(fuzzy.unmatched.len(), 2);

    // Year 7 in 2023/24: born 2011-09-01..=2012-08-31
    let age = age_range_fuzzy_match(
        &fuzzy.unmatched,
        &heat,
        &AgeRangeMatchConfig::new(
            "Year Group",
            "Full Name",
            "Student Name",
            "Date of Birth",
            2023,
            "Fuzzy: Age Range + School",
        )
        .with_filters(["School"], ["School"]),
    )
    .unwrap();
    assert_eq!(age.matched.len(), 1);
    assert_eq!(
        age.matched.get(0, "HEAT: Student HEAT ID"),
        Some(&Value::Int(1004))
    );
    assert_eq!(age.unmatched.len(), 1);
    assert_eq!(
        age.unmatched.get(0, "Full Name"),
        Some(&Value::from("Oliver Twist"))
    );

    // Every source row ends up in exactly one place
    let matched = exact.matched.concat(&age.matched);
    let mut labels: Vec<Value> = matched
        .index()
        .iter()
        .chain(age.unmatched.index())
        .cloned()
        .collect();
    labels.sort_by(Value::sort_cmp);
    assert_eq!(labels, source.index().to_vec());

    // Stacked output keeps every stage's columns
    assert!(matched.has_column("Student HEAT ID"));
    assert!(matched.has_column("HEAT: Student HEAT ID"));
    assert!(matched.has_column(FUZZY_SCORE_COLUMN));
    assert_eq!(
        matched.get(2, MATCH_TYPE_COLUMN),
        Some(&Value::from("Fuzzy: Age Range + School"))
    );

    // The postcode Chloe gave differs from HEAT's
    let updates = get_updates(&age.matched, "Postcode", "HEAT: Postcode").unwrap();
    assert_eq!(updates.values, vec![Value::from("CC3 3CD")]);
    assert!(updates.advisories.is_empty());
}

#[test]
fn test_strict_scorer_swap() {
    let source = Table::from_rows(
        ["Full Name", "DOB"],
        vec![vec!["Doe Jane".into(), "2008-09-02".into()]],
    )
    .unwrap();
    let config = FuzzyMatchConfig::new(
        ["DOB"],
        ["Date of Birth"],
        "Full Name",
        "Student Name",
        "Fuzzy",
    )
    .with_threshold(100.0);

    // Token order is ignored by the default scorer, not by plain ratio
    let sorted = fuzzy_match(&source, &heat_export(), &config).unwrap();
    assert_eq!(sorted.matched.len(), 1);
    let plain = fuzzy_match_with_scorer(&source, &heat_export(), &config, &Ratio).unwrap();
    assert!(plain.matched.is_empty());
}

#[test]
fn test_duplicates_in_a_school_list() {
    let list = Table::from_rows(
        ["Forename", "Surname", "DOB", "Postcode", "Ref"],
        vec![
            vec!["Amy".into(), "Khan".into(), "2009-05-01".into(), "EE5 5EE".into(), "S-03".into()],
            vec!["Amy ".into(), "Kahn".into(), "2009-05-01".into(), "EE5 5EE".into(), "S-01".into()],
            vec!["Ben".into(), "Khan".into(), "2009-05-01".into(), "EE5 5EE".into(), "S-02".into()],
        ],
    )
    .unwrap();
    let config = DuplicateConfig::new(["Forename", "Surname"], "DOB", "Postcode")
        .with_threshold(75.0)
        .with_id_field("Ref");

    let out = find_duplicates(&list, &config).unwrap();
    let labels = out.column("Potential Duplicates").unwrap();
    assert_eq!(labels[0], Value::from("S-01, S-03"));
    assert_eq!(labels[1], Value::from("S-01, S-03"));
    assert_eq!(labels[2], Value::Null);

    let groups: DuplicateGroups = heatmatch::find_duplicate_groups(&list, &config).unwrap();
    assert_eq!(groups.flagged(), 2);
}
