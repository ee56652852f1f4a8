//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::Value;

use kvscope::StoreOptions;

/// Generate a logical key.
pub fn logical_key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,31}".prop_map(String::from)
}

/// Generate a persistence namespace.
pub fn namespace() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}".prop_map(String::from)
}

/// Generate a cookie record name.
pub fn cookie_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9._-]{0,24}".prop_map(String::from)
}

/// Generate a printable single-line cookie value.
pub fn cookie_value() -> impl Strategy<Value = String> {
    "[ -~]{0,48}".prop_map(String::from)
}

/// Generate a JSON scalar.
pub fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,24}".prop_map(Value::from),
    ]
}

/// Generate an arbitrary JSON value with bounded depth.
pub fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::hash_map("[a-z][a-z0-9_]{0,7}", inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Generate a valid option set across every mode combination.
pub fn store_options() -> impl Strategy<Value = StoreOptions> {
    (any::<bool>(), any::<bool>(), any::<bool>(), namespace()).prop_map(
        |(persistent, mirror, isolated, namespace)| {
            let mut options = StoreOptions::shared().with_namespace(namespace);
            options.persistent = persistent;
            options.mirror_to_cookies = persistent && mirror;
            options.isolated = isolated;
            options
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvscope::KvStore;
    use kvscope_persist::CookieRecord;

    proptest! {
        #[test]
        fn test_json_values_survive_serialization(value in json_value()) {
            let text = serde_json::to_string(&value).unwrap();
            let back: Value = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(back, value);
        }

        #[test]
        fn test_generated_options_always_validate(options in store_options()) {
            prop_assert!(options.validate().is_ok());
        }

        #[test]
        fn test_cookie_lines_round_trip(name in cookie_name(), value in cookie_value()) {
            let record = CookieRecord::new(name.as_str(), value.as_str());
            let parsed = CookieRecord::parse_line(&record.to_line()).unwrap();

            prop_assert_eq!(parsed.name, name);
            prop_assert_eq!(parsed.value, value);
        }

        #[test]
        fn test_stores_accept_generated_values(key in logical_key(), value in json_value()) {
            let store = KvStore::new(StoreOptions::shared()).unwrap();
            let mut binding = store.bind_with(key.as_str(), Value::Null).unwrap();
            binding.mount();

            binding.set(value.clone()).unwrap();
            prop_assert_eq!(binding.value(), value);
        }
    }
}
