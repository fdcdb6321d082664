//! Property tests: encoded values decode back to themselves.

use proptest::prelude::*;
use std::collections::BTreeMap;
use yamlbind::{Decode, Encode, EncodeOptions};

#[derive(Debug, Clone, Default, PartialEq, Encode, Decode)]
struct Endpoint {
    path: String,
    weight: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Encode, Decode)]
struct Service {
    name: String,
    enabled: bool,
    replicas: Option<u32>,
    #[yaml("limit,omitempty")]
    limit: u64,
    tags: Vec<String>,
    labels: BTreeMap<String, i64>,
    endpoints: Vec<Endpoint>,
}

/// Text that exercises quoting: reserved words, indicators, spaces and quotes.
fn text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 :#'\".,-]{0,16}",
        Just("true".to_string()),
        Just("null".to_string()),
        Just("~".to_string()),
        Just("0o17".to_string()),
        Just("1e3".to_string()),
        Just("<<".to_string()),
        Just("- x".to_string()),
        Just("line one\nline two".to_string()),
    ]
}

fn endpoint() -> impl Strategy<Value = Endpoint> {
    (text(), any::<i64>()).prop_map(|(path, weight)| Endpoint { path, weight })
}

fn service() -> impl Strategy<Value = Service> {
    (
        text(),
        any::<bool>(),
        proptest::option::of(any::<u32>()),
        any::<u64>(),
        proptest::collection::vec(text(), 0..4),
        proptest::collection::btree_map(text(), any::<i64>(), 0..4),
        proptest::collection::vec(endpoint(), 0..3),
    )
        .prop_map(
            |(name, enabled, replicas, limit, tags, labels, endpoints)| Service {
                name,
                enabled,
                replicas,
                limit,
                tags,
                labels,
                endpoints,
            },
        )
}

proptest! {
    #[test]
    fn block_style_roundtrip(service in service()) {
        let text = yamlbind::to_string(&service).unwrap();
        let decoded: Service = yamlbind::from_str(&text).unwrap();
        prop_assert_eq!(decoded, service, "encoded as:\n{}", text);
    }

    #[test]
    fn flow_style_roundtrip(service in service()) {
        let text = yamlbind::to_string_with(&service, EncodeOptions::new().flow(true)).unwrap();
        let decoded: Service = yamlbind::from_str(&text).unwrap();
        prop_assert_eq!(decoded, service, "encoded as:\n{}", text);
    }

    #[test]
    fn literal_and_single_quote_roundtrip(service in service()) {
        let options = EncodeOptions::new()
            .literal_style_if_multiline(true)
            .single_quote(true)
            .indent(4);
        let text = yamlbind::to_string_with(&service, options).unwrap();
        let decoded: Service = yamlbind::from_str(&text).unwrap();
        prop_assert_eq!(decoded, service, "encoded as:\n{}", text);
    }
}
