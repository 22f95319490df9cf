use angles::aggregate::{Filter, count_attributes, count_qualifier_patterns, count_qualifiers};
use angles::construct::Timeline;
use angles::criteria::SearchCriteria;

fn setup() -> Timeline {
    Timeline::from_json(
        r#"{"rows": [
            {"row_name": "Home Pass", "clips": [
                {"uuid": "h1", "time_start": 100, "time_end": 110, "qualifiers": {"qualifiers_array": [
                    {"category": "Pass", "name": "Short", "time": 101},
                    {"category": "Pass", "name": "Long", "time": 102},
                    {"category": "Pass", "name": "Short", "time": 103},
                    {"category": "Pass", "name": "Long", "time": 104}
                ]}},
                {"uuid": "h2", "time_start": 200, "time_end": 210, "qualifiers": {"qualifiers_array": [
                    {"category": "Pass", "name": "Short", "time": 201},
                    {"category": "Pass", "name": "Short", "time": 202},
                    {"category": "Pass", "name": "Long", "time": 203}
                ]}},
                {"uuid": "h3", "time_start": 300, "time_end": 310, "qualifiers": {"qualifiers_array": [
                    {"category": "Pass", "name": "Short", "time": 300},
                    {"category": "Pass", "name": "Long", "time": 315}
                ]}}
            ]},
            {"row_name": "Away Pass", "clips": [
                {"uuid": "a1", "time_start": 500, "time_end": 510, "qualifiers": {"qualifiers_array": [
                    {"category": "Pass", "name": "Short", "time": 501,
                     "qualifier_attributes": [{"category": "Foot", "name": "Left"}]},
                    {"category": "Pass", "name": "Long", "time": 502,
                     "qualifier_attributes": [{"category": "Foot", "name": "Right"}]},
                    {"category": "Pass", "name": "Short", "time": 503},
                    {"category": "Pass", "name": "Short", "time": 504,
                     "qualifier_attributes": [{"category": "Foot", "name": "Left"}]},
                    {"category": "Pass", "name": "Long", "time": 505,
                     "qualifier_attributes": [{"category": "Foot", "name": "Right"}]}
                ]}}
            ]}
        ]}"#,
    )
    .expect("timeline ok")
}

fn criteria(json: &str) -> SearchCriteria {
    serde_json::from_str(json).expect("criteria ok")
}

#[test]
fn qualifiers_are_counted_per_criterion() {
    let timeline = setup();
    let home = Filter::row("Home Pass");
    assert_eq!(count_qualifiers(&timeline, &home, &criteria(r#"[{"Pass": "Short"}]"#)), 5);
    assert_eq!(count_qualifiers(&timeline, &home, &criteria(r#"[{"Pass": ""}]"#)), 9);
    // one qualifier meeting two criteria counts twice
    assert_eq!(
        count_qualifiers(&timeline, &home, &criteria(r#"[{"Pass": "Short"}, {"": "Short"}]"#)),
        10
    );
    assert_eq!(count_qualifiers(&timeline, &home, &SearchCriteria::new()), 0);
}

#[test]
fn qualifier_window_checks_clip_span_and_instant() {
    let timeline = setup();
    let long = criteria(r#"[{"Pass": "Long"}]"#);
    // h3's Long is tagged at 315, after the window closes
    assert_eq!(count_qualifiers(&timeline, &Filter::row("Home Pass").between(0.0, 310.0), &long), 3);
    assert_eq!(count_qualifiers(&timeline, &Filter::row("Home Pass").between(0.0, 320.0), &long), 4);
    // h1 starts before the window opens
    let short = criteria(r#"[{"Pass": "Short"}]"#);
    assert_eq!(count_qualifiers(&timeline, &Filter::row("Home Pass").between(102.0, 500.0), &short), 3);
}

#[test]
fn repeated_pattern_in_one_clip() {
    let timeline = setup();
    let short_long = criteria(r#"[{"Pass": "Short"}, {"Pass": "Long"}]"#);
    // h1 holds two, h2 none (the second Short is not re-tested), h3 one
    assert_eq!(count_qualifier_patterns(&timeline, &Filter::row("Home Pass"), &short_long), 3);
    let windowed = Filter::row("Home Pass").between(150.0, 400.0);
    assert_eq!(count_qualifier_patterns(&timeline, &windowed, &short_long), 1);
}

#[test]
fn patterns_never_span_clips() {
    let timeline = setup();
    let long_short = criteria(r#"[{"Pass": "Long"}, {"Pass": "Short"}]"#);
    assert_eq!(count_qualifier_patterns(&timeline, &Filter::row("Home Pass"), &long_short), 1);
}

#[test]
fn empty_pattern_counts_nothing() {
    let timeline = setup();
    assert_eq!(count_qualifier_patterns(&timeline, &Filter::default(), &SearchCriteria::new()), 0);
    assert_eq!(count_attributes(&timeline, &Filter::default(), &SearchCriteria::new()), 0);
}

#[test]
fn attribute_sequences_use_wildcard_names() {
    let timeline = setup();
    let away = Filter::row("Away Pass");
    let any_then_right = criteria(
        r#"[{"Pass": "", "attributes": {"Foot": ""}}, {"Pass": "", "attributes": {"Foot": "Right"}}]"#,
    );
    assert_eq!(count_attributes(&timeline, &away, &any_then_right), 2);
    // the exact gate reads an empty attribute name literally
    assert_eq!(count_qualifier_patterns(&timeline, &away, &any_then_right), 0);
}

#[test]
fn attribute_sequences_require_attributes() {
    let timeline = setup();
    let away = Filter::row("Away Pass");
    let short = criteria(r#"[{"Pass": "Short"}]"#);
    assert_eq!(count_attributes(&timeline, &away, &short), 2);
    assert_eq!(count_qualifier_patterns(&timeline, &away, &short), 3);
}

#[test]
fn untimed_data_passes_every_window() {
    let timeline = Timeline::from_json(
        r#"{"rows": [{"row_name": "Home Shot", "clips": [
            {"uuid": "s1", "time_start": 200, "time_end": 210, "qualifiers": {"qualifiers_array": [
                {"category": "Outcome", "name": "Goal"}
            ]}},
            {"uuid": "s2", "qualifiers": {"qualifiers_array": [
                {"category": "Chance Quality", "name": "Big Chance", "time": null},
                {"category": "Outcome", "name": "Goal", "time": 5}
            ]}}
        ]}]}"#,
    )
    .expect("timeline ok");
    let window = Filter::row("Home Shot").between(100.0, 300.0);
    let goal = criteria(r#"[{"Outcome": "Goal"}]"#);
    // s1's goal has no time; s2's goal is tagged before the window
    assert_eq!(count_qualifiers(&timeline, &window, &goal), 1);
    let chance = criteria(r#"[{"Chance Quality": "Big Chance"}]"#);
    assert_eq!(count_qualifiers(&timeline, &window, &chance), 1);
    let chance_then_goal = criteria(r#"[{"Chance Quality": ""}, {"Outcome": "Goal"}]"#);
    assert_eq!(count_qualifier_patterns(&timeline, &window, &chance_then_goal), 1);
}
