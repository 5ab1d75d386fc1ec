//! End-to-end tests for the feature pipeline
//!
//! Fits encoders on a small labelled set and checks the properties every
//! downstream consumer relies on.

use chrono::NaiveDate;
use inspecta_features::text::WordFrequencies;
use inspecta_features::{
    prepare_features, FeatureConfig, FeatureError, FittedEncoders, InspectionRecord, VenueIndex,
    VenueRecord, ViolationRecord,
};

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, month, day).unwrap()
}

fn inspection(
    id: &str,
    camis: u64,
    when: NaiveDate,
    boro: &str,
    cuisine: &str,
    passed: Option<bool>,
) -> InspectionRecord {
    InspectionRecord {
        id: id.into(),
        camis,
        inspection_date: when,
        inspection_type: "Cycle Inspection / Initial Inspection".into(),
        passed,
        boro: Some(boro.into()),
        cuisine_description: Some(cuisine.into()),
    }
}

fn violation(camis: u64, when: NaiveDate, text: &str) -> ViolationRecord {
    ViolationRecord {
        camis,
        inspection_date: when,
        violation_description: Some(text.into()),
    }
}

/// Pizza passes 3 of 4 training inspections.
fn training_set() -> Vec<InspectionRecord> {
    vec![
        inspection("1", 100, date(1, 10), "BROOKLYN", "Pizza", Some(true)),
        inspection("2", 100, date(7, 10), "BROOKLYN", "Pizza", Some(false)),
        inspection("3", 200, date(2, 3), "QUEENS", "Pizza", Some(true)),
        inspection("4", 300, date(6, 21), "MANHATTAN", "Pizza", Some(true)),
        inspection("5", 400, date(12, 1), "Missing", "Thai", Some(false)),
    ]
}

fn evaluation_set() -> Vec<InspectionRecord> {
    vec![
        inspection("6", 100, date(8, 2), "BROOKLYN", "Pizza", None),
        inspection("7", 500, date(3, 9), "STATEN ISLAND", "Ethiopian", None),
        inspection("8", 400, date(4, 4), "BRONX", "Thai", None),
    ]
}

fn violations() -> Vec<ViolationRecord> {
    vec![
        violation(100, date(1, 10), "Cold food item held above 41º F."),
        violation(100, date(7, 10), "Evidence of live mice present in facility's food area."),
        violation(100, date(7, 10), "Filth flies present in kitchen food area."),
        violation(200, date(2, 3), "Food contact surface not properly maintained."),
        violation(400, date(12, 1), "Evidence of rats or live rats present in kitchen."),
        violation(400, date(12, 1), "Food not protected in kitchen."),
        // evaluation-time violations
        violation(100, date(8, 2), "Live roaches present in food area."),
        violation(400, date(4, 4), "Raw sewage disposal system improper."),
    ]
}

fn prepare() -> inspecta_features::PreparedFeatures {
    let training = training_set();
    let evaluation = evaluation_set();
    prepare_features(
        &training,
        &[&evaluation],
        &violations(),
        &VenueIndex::default(),
        &FeatureConfig::default(),
    )
    .unwrap()
}

#[test]
fn training_and_evaluation_columns_identical() {
    let prepared = prepare();
    let eval = &prepared.evaluation[0];

    assert_eq!(prepared.training.schema(), eval.schema());
    assert_eq!(prepared.training.n_cols(), eval.n_cols());
    // Every configured keyword gets a column, observed in training or not
    for keyword in &FeatureConfig::default().extreme_keywords {
        assert!(eval.schema().index_of(keyword).is_some(), "{keyword}");
    }
}

#[test]
fn cuisine_hit_rate_comes_from_training_only() {
    let prepared = prepare();
    let train = &prepared.training;

    for row in 0..4 {
        assert_eq!(train.value(row, "cuisine_hr"), Some(0.75));
    }
    assert_eq!(train.value(4, "cuisine_hr"), Some(0.0));

    let eval = &prepared.evaluation[0];
    assert_eq!(eval.value(0, "cuisine_hr"), Some(0.75));
    assert!(eval.value(1, "cuisine_hr").unwrap().is_nan());
}

#[test]
fn inspection_without_violations_gets_zeros() {
    let prepared = prepare();
    let train = &prepared.training;

    // venue 300 has no violation rows
    assert_eq!(train.value(3, "n_violations"), Some(0.0));
    assert_eq!(train.value(3, "violation_score"), Some(0.0));
    assert_eq!(train.value(3, "mice"), Some(0.0));

    // venue 500 only appears at evaluation time
    let eval = &prepared.evaluation[0];
    assert_eq!(eval.value(1, "n_violations"), Some(0.0));
    assert_eq!(eval.value(1, "violation_score"), Some(0.0));
}

#[test]
fn categorical_encodings() {
    let prepared = prepare();
    let train = &prepared.training;

    assert_eq!(train.value(0, "boro_idx"), Some(2.0));
    assert_eq!(train.value(4, "boro_idx"), Some(0.0));
    assert_eq!(train.value(0, "inspection_month"), Some(7.0));
    assert_eq!(train.value(1, "inspection_month"), Some(1.0));
    assert_eq!(train.value(3, "inspection_month"), Some(0.0));
    assert_eq!(train.value(4, "inspection_month"), Some(6.0));
    assert_eq!(train.value(0, "initial_inspect"), Some(1.0));
    assert_eq!(train.value(0, "re_inspect"), Some(0.0));
}

#[test]
fn keyword_indicators_are_per_inspection() {
    let prepared = prepare();
    let train = &prepared.training;

    assert_eq!(train.value(1, "n_violations"), Some(2.0));
    assert_eq!(train.value(1, "mice"), Some(1.0));
    assert_eq!(train.value(1, "live"), Some(1.0));
    assert_eq!(train.value(1, "flies"), Some(1.0));
    assert_eq!(train.value(1, "rats"), Some(0.0));
    assert_eq!(train.value(4, "rats"), Some(1.0));

    // keyword never seen in training still lights up at evaluation time
    let eval = &prepared.evaluation[0];
    assert_eq!(eval.value(0, "roaches"), Some(1.0));
    assert_eq!(eval.value(2, "sewage"), Some(1.0));
}

#[test]
fn differential_words_present_in_both_classes() {
    let training = training_set();
    let violations = violations();
    let (encoders, _) = FittedEncoders::fit(
        &training,
        &violations,
        &VenueIndex::default(),
        &FeatureConfig::default(),
    )
    .unwrap();

    let failed = WordFrequencies::from_descriptions([
        "Evidence of live mice present in facility's food area.",
        "Filth flies present in kitchen food area.",
        "Evidence of rats or live rats present in kitchen.",
        "Food not protected in kitchen.",
    ]);
    let passed = WordFrequencies::from_descriptions([
        "Cold food item held above 41º F.",
        "Food contact surface not properly maintained.",
    ]);

    let table = encoders.differential_table();
    assert!(!table.is_empty());
    for (word, value) in table.iter() {
        assert!(failed.contains(word) && passed.contains(word), "{word}");
        assert_eq!(
            value,
            failed.relative(word).unwrap() - passed.relative(word).unwrap()
        );
    }
    // "food" is the only word shared by both classes
    assert_eq!(table.iter().map(|(w, _)| w).collect::<Vec<_>>(), vec!["food"]);
}

#[test]
fn rerun_is_byte_identical() {
    let first = prepare();
    let second = prepare();

    let mut a = Vec::new();
    let mut b = Vec::new();
    first.training.write_csv(&mut a).unwrap();
    second.training.write_csv(&mut b).unwrap();
    assert_eq!(a, b);
    assert_eq!(first.training.fingerprint(), second.training.fingerprint());
    assert_eq!(
        first.evaluation[0].fingerprint(),
        second.evaluation[0].fingerprint()
    );
}

#[test]
fn unknown_borough_is_fatal() {
    let training = training_set();
    let mut evaluation = evaluation_set();
    evaluation[1].boro = Some("JERSEY CITY".into());

    let err = prepare_features(
        &training,
        &[&evaluation],
        &violations(),
        &VenueIndex::default(),
        &FeatureConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, FeatureError::UnknownBorough(ref b) if b == "JERSEY CITY"));
}

#[test]
fn venue_metadata_fills_gaps_and_adds_columns() {
    let mut training = training_set();
    training[0].boro = None;
    training[0].cuisine_description = None;

    let mut venue = VenueRecord {
        camis: 100,
        ..Default::default()
    };
    venue.attributes.insert("boro".into(), "BROOKLYN".into());
    venue.attributes.insert("cuisine_description".into(), "Pizza".into());
    venue.attributes.insert("seating".into(), "40".into());
    let venues = VenueIndex::new(vec![venue]).unwrap();

    let config = FeatureConfig {
        venue_columns: vec!["seating".into()],
        ..Default::default()
    };
    let evaluation = evaluation_set();
    let prepared =
        prepare_features(&training, &[&evaluation], &violations(), &venues, &config).unwrap();

    let train = &prepared.training;
    assert_eq!(train.schema().columns()[7], "seating");
    assert_eq!(train.value(0, "boro_idx"), Some(2.0));
    assert_eq!(train.value(0, "cuisine_hr"), Some(0.75));
    assert_eq!(train.value(0, "seating"), Some(40.0));
    assert!(train.value(2, "seating").unwrap().is_nan());
}

#[test]
fn csv_dump_matches_schema() {
    let prepared = prepare();
    let file = tempfile::NamedTempFile::new().unwrap();
    prepared.evaluation[0]
        .write_csv(std::fs::File::create(file.path()).unwrap())
        .unwrap();

    let mut reader = csv::Reader::from_path(file.path()).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header[0], "id");
    assert_eq!(&header[1..], prepared.training.schema().columns());

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    // unseen cuisine is written as an empty field
    let cuisine_col = header.iter().position(|h| h == "cuisine_hr").unwrap();
    assert_eq!(&rows[1][cuisine_col], "");
}

#[test]
fn repeated_inspection_keys_keep_one_row_each() {
    let training = training_set();
    let mut evaluation = evaluation_set();
    evaluation.push(inspection("9", 100, date(8, 2), "BROOKLYN", "Pizza", None));

    let prepared = prepare_features(
        &training,
        &[&evaluation],
        &violations(),
        &VenueIndex::default(),
        &FeatureConfig::default(),
    )
    .unwrap();

    let eval = &prepared.evaluation[0];
    assert_eq!(eval.n_rows(), evaluation.len());
    assert_eq!(eval.ids()[3], "9");
    assert_eq!(eval.value(0, "n_violations"), Some(1.0));
    assert_eq!(eval.value(3, "n_violations"), Some(1.0));
    assert_eq!(eval.value(3, "roaches"), eval.value(0, "roaches"));
}
