//! Application settings validation
//!
//! Checks the `app` record before a project is created or its configuration
//! changes, and reconciles `app.options` with the options declared by the
//! selected language template.

use serde_yaml::Value;
use tracing::info;
use uuid::Uuid;

use crate::core::document::AppSettings;
use crate::core::template::{OptionKind, TemplateCatalog, TemplateOption};
use crate::error::{AppError, OptionError};

/// Device unique identifier derived from the application FQDN
pub fn generate_duid(fqdn: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, fqdn.as_bytes()).to_string()
}

/// Validate `app` and fill in derived values
///
/// With `require_complete`, `lang`, `title`, `name`, `version` and `fqdn`
/// must all be set. A missing `duid` is derived from `fqdn`. When `lang`
/// names a template, every declared option is validated or defaulted.
pub fn validate_app_settings(
    app: &mut AppSettings,
    catalog: &TemplateCatalog,
    require_complete: bool,
) -> Result<(), AppError> {
    let template = if app.lang.is_empty() {
        None
    } else {
        Some(catalog.get(&app.lang).map_err(|_| AppError::UnknownLanguage {
            lang: app.lang.clone(),
            available: catalog.names(),
        })?)
    };

    if require_complete {
        for (field, value) in [
            ("lang", &app.lang),
            ("title", &app.title),
            ("name", &app.name),
            ("version", &app.version),
            ("fqdn", &app.fqdn),
        ] {
            if value.is_empty() {
                return Err(AppError::MissingField {
                    field: field.to_string(),
                });
            }
        }
    }

    if app.name.chars().any(char::is_whitespace) {
        return Err(AppError::InvalidName {
            name: app.name.clone(),
        });
    }
    if !app.version.is_empty() {
        semver::Version::parse(&app.version).map_err(|e| AppError::InvalidVersion {
            version: app.version.clone(),
            error: e.to_string(),
        })?;
    }

    if app.duid.is_empty() && !app.fqdn.is_empty() {
        app.duid = generate_duid(&app.fqdn);
        info!("Generated application DUID: {}", app.duid);
    }

    let Some(template) = template else {
        return Ok(());
    };
    for option in &template.options {
        let value = match app.options.get(&option.name) {
            Some(value) => validate_option(option, value)?,
            None => option.default.clone(),
        };
        app.options.insert(option.name.clone(), value);
    }
    Ok(())
}

/// Validate a value against a template option, returning its coerced form
pub fn validate_option(option: &TemplateOption, value: &Value) -> Result<Value, OptionError> {
    match option.kind {
        OptionKind::Boolean => validate_bool(&option.name, value),
        OptionKind::Text => validate_text(&option.name, value),
        OptionKind::Choice => validate_choice(&option.name, value, &option.values),
    }
}

fn validate_bool(name: &str, value: &Value) -> Result<Value, OptionError> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        _ => Err(OptionError::InvalidType {
            name: name.to_string(),
            expected: "boolean".to_string(),
            got: describe(value),
        }),
    }
}

fn validate_text(name: &str, value: &Value) -> Result<Value, OptionError> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => {
            return Err(OptionError::InvalidType {
                name: name.to_string(),
                expected: "text".to_string(),
                got: describe(value),
            })
        }
    };
    Ok(Value::String(text))
}

fn validate_choice(name: &str, value: &Value, choices: &[String]) -> Result<Value, OptionError> {
    if choices.is_empty() {
        return Err(OptionError::EmptyChoices {
            name: name.to_string(),
        });
    }
    let text = validate_text(name, value)?;
    let choice = text.as_str().unwrap_or_default();
    if choices.iter().any(|c| c == choice) {
        Ok(text)
    } else {
        Err(OptionError::InvalidChoice {
            name: name.to_string(),
            value: choice.to_string(),
            choices: choices.to_vec(),
        })
    }
}

fn describe(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_else(|_| format!("{value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::TEMPLATE_INFO_FILE;
    use crate::infra::filesystem;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn option(kind: OptionKind, values: &[&str]) -> TemplateOption {
        TemplateOption {
            name: "opt".to_string(),
            description: String::new(),
            kind,
            default: Value::Null,
            values: values.iter().map(ToString::to_string).collect(),
        }
    }

    fn catalog_with_go() -> (TempDir, TemplateCatalog) {
        let temp = TempDir::new().unwrap();
        filesystem::write_file(
            &temp.path().join("go").join(TEMPLATE_INFO_FILE),
            "name: go\noptions:\n  - name: docs\n    type: boolean\n    default: false\n  - name: flavor\n    type: choice\n    default: slim\n    values: [slim, full]\n",
        )
        .unwrap();
        let catalog = TemplateCatalog::discover(&[temp.path().to_path_buf()]).unwrap();
        (temp, catalog)
    }

    fn complete_app() -> AppSettings {
        AppSettings {
            lang: "go".to_string(),
            title: "My App".to_string(),
            name: "my_app".to_string(),
            version: "1.0.0".to_string(),
            fqdn: "app.example.com".to_string(),
            ..AppSettings::default()
        }
    }

    // ============================================
    // Unit Tests - Option validation
    // ============================================

    #[test]
    fn test_bool_option_accepts_bool_and_text() {
        let opt = option(OptionKind::Boolean, &[]);
        assert_eq!(validate_option(&opt, &Value::Bool(true)).unwrap(), Value::Bool(true));
        assert_eq!(
            validate_option(&opt, &Value::String("false".to_string())).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_bool_option_rejects_number() {
        let opt = option(OptionKind::Boolean, &[]);
        match validate_option(&opt, &Value::from(1)) {
            Err(OptionError::InvalidType { name, expected, .. }) => {
                assert_eq!(name, "opt");
                assert_eq!(expected, "boolean");
            }
            other => panic!("Expected InvalidType, got {other:?}"),
        }
    }

    #[test]
    fn test_text_option_stringifies_scalars() {
        let opt = option(OptionKind::Text, &[]);
        assert_eq!(
            validate_option(&opt, &Value::from(42)).unwrap(),
            Value::String("42".to_string())
        );
    }

    #[test]
    fn test_choice_option() {
        let opt = option(OptionKind::Choice, &["slim", "full"]);
        assert!(validate_option(&opt, &Value::String("full".to_string())).is_ok());
        assert!(matches!(
            validate_option(&opt, &Value::String("huge".to_string())),
            Err(OptionError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn test_choice_without_values() {
        let opt = option(OptionKind::Choice, &[]);
        assert!(matches!(
            validate_option(&opt, &Value::String("x".to_string())),
            Err(OptionError::EmptyChoices { .. })
        ));
    }

    // ============================================
    // Unit Tests - App settings
    // ============================================

    #[test]
    fn test_complete_app_gets_duid_and_defaults() {
        let (_temp, catalog) = catalog_with_go();
        let mut app = complete_app();
        app.options
            .insert("docs".to_string(), Value::String("true".to_string()));

        validate_app_settings(&mut app, &catalog, true).unwrap();

        assert_eq!(app.duid, generate_duid("app.example.com"));
        assert_eq!(app.options.get("docs"), Some(&Value::Bool(true)));
        assert_eq!(app.options.get("flavor"), Some(&Value::String("slim".to_string())));
    }

    #[test]
    fn test_existing_duid_is_kept() {
        let (_temp, catalog) = catalog_with_go();
        let mut app = complete_app();
        app.duid = "fixed".to_string();
        validate_app_settings(&mut app, &catalog, true).unwrap();
        assert_eq!(app.duid, "fixed");
    }

    #[test]
    fn test_missing_field_when_complete_required() {
        let (_temp, catalog) = catalog_with_go();
        let mut app = complete_app();
        app.fqdn.clear();
        match validate_app_settings(&mut app, &catalog, true) {
            Err(AppError::MissingField { field }) => assert_eq!(field, "fqdn"),
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_partial_app_allowed_when_not_required() {
        let (_temp, catalog) = catalog_with_go();
        let mut app = AppSettings::default();
        validate_app_settings(&mut app, &catalog, false).unwrap();
        assert!(app.duid.is_empty());
        assert!(app.options.is_empty());
    }

    #[test]
    fn test_unknown_language() {
        let (_temp, catalog) = catalog_with_go();
        let mut app = complete_app();
        app.lang = "cobol".to_string();
        match validate_app_settings(&mut app, &catalog, false) {
            Err(AppError::UnknownLanguage { lang, available }) => {
                assert_eq!(lang, "cobol");
                assert_eq!(available, vec!["go".to_string()]);
            }
            other => panic!("Expected UnknownLanguage, got {other:?}"),
        }
    }

    #[test]
    fn test_name_with_space_rejected() {
        let (_temp, catalog) = catalog_with_go();
        let mut app = complete_app();
        app.name = "my app".to_string();
        assert!(matches!(
            validate_app_settings(&mut app, &catalog, true),
            Err(AppError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_non_semver_version_rejected() {
        let (_temp, catalog) = catalog_with_go();
        let mut app = complete_app();
        app.version = "1.0".to_string();
        assert!(matches!(
            validate_app_settings(&mut app, &catalog, true),
            Err(AppError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_invalid_option_value_rejected() {
        let (_temp, catalog) = catalog_with_go();
        let mut app = complete_app();
        app.options
            .insert("flavor".to_string(), Value::String("huge".to_string()));
        assert!(matches!(
            validate_app_settings(&mut app, &catalog, true),
            Err(AppError::Option(OptionError::InvalidChoice { .. }))
        ));
    }

    // ============================================
    // Property Tests
    // ============================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_duid_is_deterministic(fqdn in "[a-z]{1,10}\\.[a-z]{2,5}") {
            prop_assert_eq!(generate_duid(&fqdn), generate_duid(&fqdn));
            prop_assert_eq!(generate_duid(&fqdn).len(), 36);
        }

        #[test]
        fn prop_text_option_accepts_any_string(s in ".*") {
            let opt = option(OptionKind::Text, &[]);
            prop_assert_eq!(validate_option(&opt, &Value::String(s.clone())).unwrap(), Value::String(s));
        }
    }
}
