use angles::AnglesError;
use angles::interface::Session;
use angles::resolve::{Operation, Resolved};

fn setup() -> Session {
    Session::from_json(
        r#"{"rows": [
            {"row_name": "Kick Off", "clips": [
                {"uuid": "k1", "time_start": 100, "time_end": 102},
                {"uuid": "k2", "time_start": 2800, "time_end": 2802}
            ]},
            {"row_name": "Home Shot", "clips": [
                {"uuid": "s1", "time_start": 200, "time_end": 205, "qualifiers": {"qualifiers_array": [
                    {"category": "Chance Quality", "name": "Big Chance", "time": 201},
                    {"category": "Outcome", "name": "Goal", "time": 204}
                ]}},
                {"uuid": "s2", "time_start": 1500, "time_end": 1504, "qualifiers": {"qualifiers_array": [
                    {"category": "Chance Quality", "name": "Normal Chance", "time": 1501},
                    {"category": "Outcome", "name": "Saved", "time": 1503}
                ]}},
                {"uuid": "s3", "time_start": 2900, "time_end": 2910, "qualifiers": {"qualifiers_array": [
                    {"category": "Chance Quality", "name": "Big Chance", "time": 2901},
                    {"category": "Outcome", "name": "Goal", "time": 2905}
                ]}}
            ]},
            {"row_name": "Away Shot", "clips": [
                {"uuid": "a1", "time_start": 400, "time_end": 403, "qualifiers": {"qualifiers_array": [
                    {"category": "Chance Quality", "name": "Big Chance", "time": 401},
                    {"category": "Outcome", "name": "Wide", "time": 402}
                ]}}
            ]},
            {"row_name": "Subs"}
        ]}"#,
    )
    .expect("timeline ok")
}

#[test]
fn single_count() {
    let session = setup();
    let resolution = session
        .resolve_document(r#"{"variables": {"a": ["count_clips", "Home Shot", []]}}"#)
        .expect("document ok");
    assert_eq!(resolution.get("a"), Some(&Resolved::Count(3)));
    assert!(resolution.skipped.is_empty());
    let json = serde_json::to_value(&resolution).expect("serializes");
    assert_eq!(json, serde_json::json!({"values": {"a": 3}}));
}

#[test]
fn every_operation_resolves() {
    let session = setup();
    let resolution = session
        .resolve_document(
            r#"{"variables": {
                "kickoff": ["min_time_start", "Kick Off"],
                "last_whistle": ["max_time_end", "Kick Off"],
                "big_chances": ["count_clips", "", [{"Chance Quality": "Big Chance"}]],
                "goals": ["count_qualifiers", "Home Shot", [{"Outcome": "Goal"}]],
                "chance_then_goal": ["count_qualifier_patterns", "Home Shot",
                    [{"Chance Quality": "Big Chance"}, {"Outcome": "Goal"}]],
                "footed": ["count_attributes", "Home Shot", [{"Outcome": "", "attributes": {"Foot": ""}}]],
                "home_time": ["sum_clip_durations", "Home Shot", []],
                "durations": ["all_row_durations", ["Home Shot", "Away Shot"]]
            }}"#,
        )
        .expect("document ok");
    assert!(resolution.skipped.is_empty());
    assert_eq!(resolution.get("kickoff"), Some(&Resolved::Seconds(100.0)));
    assert_eq!(resolution.get("last_whistle"), Some(&Resolved::Seconds(2802.0)));
    assert_eq!(resolution.get("big_chances"), Some(&Resolved::Count(3)));
    assert_eq!(resolution.get("goals"), Some(&Resolved::Count(2)));
    assert_eq!(resolution.get("chance_then_goal"), Some(&Resolved::Count(2)));
    assert_eq!(resolution.get("footed"), Some(&Resolved::Count(0)));
    assert_eq!(resolution.get("home_time"), Some(&Resolved::Seconds(19.0)));
    let json = serde_json::to_value(&resolution.values).expect("serializes");
    assert_eq!(json["durations"], serde_json::json!({"Home Shot": 19.0, "Away Shot": 3.0}));
    // document order is kept
    let names: Vec<&str> = resolution.values.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names[..3], ["kickoff", "last_whistle", "big_chances"]);
}

#[test]
fn time_bounds_reference_earlier_variables() {
    let session = setup();
    let resolution = session
        .resolve_document(
            r#"{"variables": {
                "kickoff": ["min_time_start", "Kick Off"],
                "first_half": ["count_clips", "Home Shot", [], "kickoff", "kickoff + 45 * 60"],
                "second_half": ["count_clips", "Home Shot", [], "kickoff + 2700"],
                "window": ["count_clips", "Home Shot", [], 0, "Infinity"],
                "zero_end": ["count_clips", "Home Shot", [], 0, 0]
            }}"#,
        )
        .expect("document ok");
    assert_eq!(resolution.get("first_half"), Some(&Resolved::Count(2)));
    assert_eq!(resolution.get("second_half"), Some(&Resolved::Count(1)));
    assert_eq!(resolution.get("window"), Some(&Resolved::Count(3)));
    // a zero end bound falls back to Infinity
    assert_eq!(resolution.get("zero_end"), Some(&Resolved::Count(3)));
}

#[test]
fn clips_table_expands_all_rows() {
    let session = setup();
    let resolution = session
        .resolve_document(
            r#"{"variables": {"table": ["count_clips_table", ["all_rows"], ["Big Chance", "Goal"]]}}"#,
        )
        .expect("document ok");
    let Some(Resolved::Table(table)) = resolution.get("table") else {
        panic!("expected a table, got {:?}", resolution.get("table"));
    };
    assert_eq!(table.rows(), ["Kick Off", "Home Shot", "Away Shot", "Subs"]);
    assert_eq!(table.column("Big Chance"), Some(&[0, 2, 1, 0][..]));
    assert_eq!(table.column("Goal"), Some(&[0, 2, 0, 0][..]));
    let json = serde_json::to_string(table).expect("serializes");
    assert_eq!(
        json,
        r#"{"Clips":["Kick Off","Home Shot","Away Shot","Subs"],"Big Chance":[0,2,1,0],"Goal":[0,2,0,0]}"#
    );
}

#[test]
fn clips_table_expands_all_qualifiers() {
    let session = setup();
    let resolution = session
        .resolve_document(
            r#"{"variables": {"table": ["count_clips_table", ["Away Shot"], ["all_qualifiers"], 0, 1000]}}"#,
        )
        .expect("document ok");
    let Some(Resolved::Table(table)) = resolution.get("table") else {
        panic!("expected a table");
    };
    let columns: Vec<&str> = table.columns().keys().map(String::as_str).collect();
    assert_eq!(columns, ["Big Chance", "Goal", "Normal Chance", "Saved", "Wide"]);
    assert_eq!(table.column("Wide"), Some(&[1][..]));
    assert_eq!(table.column("Goal"), Some(&[0][..]));
}

#[test]
fn failures_stay_with_their_entry() {
    let session = setup();
    let resolution = session
        .resolve_document(
            r#"{"variables": {
                "early": ["count_clips", "Home Shot", [], "later"],
                "unknown": ["median_clips", "Home Shot", []],
                "broken": ["count_clips", "Home Shot", [], "kickoff +"],
                "empty_row": ["min_time_start", "Subs"],
                "table": ["count_clips_table", ["Home Shot"], ["Goal"]],
                "not_a_number": ["count_clips", "Home Shot", [], "table"],
                "not_a_list": "count_clips",
                "later": ["count_clips", "Home Shot", []]
            }}"#,
        )
        .expect("document ok");
    assert_eq!(resolution.get("later"), Some(&Resolved::Count(3)));
    assert!(resolution.get("table").is_some());
    let reasons: Vec<(&str, &AnglesError)> =
        resolution.skipped.iter().map(|s| (s.name.as_str(), &s.error)).collect();
    assert_eq!(reasons.len(), 6);
    assert!(matches!(reasons[0], ("early", AnglesError::UnknownVariable(name)) if name == "later"));
    assert!(matches!(reasons[1], ("unknown", AnglesError::UnsupportedOperation(op)) if op == "median_clips"));
    assert!(matches!(reasons[2], ("broken", AnglesError::Parse { .. })));
    assert!(matches!(reasons[3], ("empty_row", AnglesError::InvalidEntry { .. })));
    assert!(matches!(reasons[4], ("not_a_number", AnglesError::NotNumeric { .. })));
    assert!(matches!(reasons[5], ("not_a_list", AnglesError::InvalidEntry { .. })));
    for name in ["early", "unknown", "broken", "empty_row", "not_a_number", "not_a_list"] {
        assert!(resolution.get(name).is_none(), "{name} should not be bound");
    }
    let json = serde_json::to_value(&resolution).expect("serializes");
    assert_eq!(json["skipped"][1]["name"], "unknown");
    assert_eq!(json["skipped"][1]["reason"], "Unsupported operation: median_clips");
}

#[test]
fn document_needs_variables() {
    let session = setup();
    assert!(matches!(session.resolve_document(r#"{"content": {}}"#), Err(AnglesError::Config(_))));
    assert!(matches!(session.resolve_document("not json"), Err(AnglesError::Json(_))));
    let empty = session.resolve_document(r#"{"variables": {}}"#).expect("document ok");
    assert!(empty.values.is_empty());
}

#[test]
fn operation_names() {
    assert_eq!("count_clips_table".parse::<Operation>().expect("known"), Operation::CountClipsTable);
    assert_eq!("all_row_durations".parse::<Operation>().expect("known"), Operation::AllRowDurations);
    assert!(matches!("count_everything".parse::<Operation>(), Err(AnglesError::UnsupportedOperation(_))));
}

#[test]
fn each_count_runs_its_own_aggregate() {
    let session = setup();
    let resolution = session
        .resolve_document(
            r#"{"variables": {
                "clips": ["count_clips", "Home Shot", [{"": ""}, {"": ""}]],
                "qualifiers": ["count_qualifiers", "Home Shot", [{"": ""}, {"": ""}]],
                "patterns": ["count_qualifier_patterns", "Home Shot", [{"": ""}, {"": ""}]],
                "attributes": ["count_attributes", "Home Shot", [{"": ""}, {"": ""}]],
                "seconds": ["sum_clip_durations", "Home Shot", [{"": ""}, {"": ""}], "-Infinity"]
            }}"#,
        )
        .expect("document ok");
    assert!(resolution.skipped.is_empty());
    assert_eq!(resolution.get("clips"), Some(&Resolved::Count(3)));
    assert_eq!(resolution.get("qualifiers"), Some(&Resolved::Count(12)));
    assert_eq!(resolution.get("patterns"), Some(&Resolved::Count(3)));
    assert_eq!(resolution.get("attributes"), Some(&Resolved::Count(0)));
    assert_eq!(resolution.get("seconds"), Some(&Resolved::Seconds(19.0)));
}
