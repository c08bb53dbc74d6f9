//! Property tests for censoring and line rendering.

use cloudwatch_log::{
    Callouts, Censor, CloudWatchRenderer, EventMeta, EventRecord, Renderer, CENSORED_PLACEHOLDER,
};
use proptest::prelude::*;
use serde_json::Value;
use slog::Level;

// Floats are left out: not every f64 survives a JSON text round trip bit for bit.
fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            proptest::collection::vec(("[a-z]{1,4}", inner), 0..4)
                .prop_map(|pairs| Value::Object(pairs.into_iter().collect())),
        ]
    })
}

fn record_strategy() -> impl Strategy<Value = EventRecord> {
    proptest::collection::vec(("[a-z]{1,6}", value_strategy()), 0..12)
        .prop_map(|pairs| pairs.into_iter().collect())
}

fn names_strategy() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z]{1,6}", 0..4)
}

proptest! {
    #[test]
    fn censor_replaces_exactly_the_listed_keys(
        record in record_strategy(),
        wordlist in names_strategy(),
    ) {
        let censor = Censor::new(&wordlist);
        let censored = censor.apply(record.clone());

        prop_assert_eq!(
            censored.keys().collect::<Vec<_>>(),
            record.keys().collect::<Vec<_>>()
        );
        for (key, value) in &record {
            if wordlist.contains(key) {
                prop_assert_eq!(&censored[key], CENSORED_PLACEHOLDER);
            } else {
                prop_assert_eq!(&censored[key], value);
            }
        }
    }

    #[test]
    fn censoring_twice_changes_nothing(
        record in record_strategy(),
        wordlist in names_strategy(),
    ) {
        let censor = Censor::new(&wordlist);
        let once = censor.apply(record);
        let twice = censor.apply(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn callouts_prefix_has_one_segment_per_present_name(
        record in record_strategy(),
        names in names_strategy(),
    ) {
        let renderer = CloudWatchRenderer::new(Callouts::new(&names));
        let line = renderer.render(&EventMeta::new(Level::Info), &record).unwrap();

        let mut expected = String::from("[INFO]");
        for name in names.iter().take(2) {
            let text = match record.get(name) {
                None => continue,
                Some(Value::String(text)) => text.clone(),
                Some(other) => other.to_string(),
            };
            expected.push(' ');
            expected.push_str(&serde_json::to_string(&text).unwrap());
        }
        expected.push(' ');
        expected.push_str(&serde_json::to_string(&record).unwrap());

        prop_assert_eq!(line, expected);
    }

    #[test]
    fn body_parses_back_to_the_record(record in record_strategy()) {
        let renderer = CloudWatchRenderer::new(Callouts::none());
        let line = renderer.render(&EventMeta::default(), &record).unwrap();

        let body = line.strip_prefix("[LOG] ").unwrap();
        let parsed: EventRecord = serde_json::from_str(body).unwrap();
        prop_assert_eq!(parsed, record);
    }
}
