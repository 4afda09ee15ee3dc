//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    use crate::core::document::Document;

    /// Generate a dictionary key that YAML reads back as a plain string
    pub fn dict_key() -> impl Strategy<Value = String> {
        "k[a-z0-9_]{0,7}"
    }

    /// Generate a valid semver version string
    pub fn semver_version() -> impl Strategy<Value = String> {
        (0u32..20, 0u32..20, 0u32..20)
            .prop_map(|(major, minor, patch)| format!("{major}.{minor}.{patch}"))
    }

    /// Generate a device address
    pub fn device_addr() -> impl Strategy<Value = String> {
        (prop_oneof!["ssh", "local"], "[a-z]{1,8}")
            .prop_map(|(scheme, host)| format!("{scheme}://{host}"))
    }

    /// Generate a document touching records, dictionaries and scalars
    pub fn document() -> impl Strategy<Value = Document> {
        (
            "[a-z]{0,6}",
            semver_version(),
            prop::collection::btree_map(dict_key(), "v[a-z]{0,4}", 0..4),
            prop::collection::btree_map(dict_key(), device_addr(), 0..3),
            any::<bool>(),
        )
            .prop_map(|(name, version, env, devices, cross)| {
                let mut doc = Document::default();
                doc.app.name = name;
                doc.app.version = version;
                doc.app.env = env;
                doc.build.cross_compile = cross;
                for (key, addr) in devices {
                    doc.devices.entry(key).or_default().addr = addr;
                }
                doc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_dict_key_generator_is_plain_yaml_string(key in dict_key()) {
            let parsed: serde_yaml::Value = serde_yaml::from_str(&key).unwrap();
            prop_assert_eq!(parsed, serde_yaml::Value::String(key));
        }

        #[test]
        fn test_semver_version_generator(version in semver_version()) {
            prop_assert!(semver::Version::parse(&version).is_ok());
        }

        #[test]
        fn test_device_addr_generator(addr in device_addr()) {
            prop_assert!(addr.contains("://"));
        }
    }
}
