#[cfg(test)]
mod config_tests {
    use report_card_server::config::Settings;
    use std::time::Duration;

    #[test]
    fn test_defaults_match_source_behavior() {
        let settings = Settings::default();

        assert_eq!(settings.header_rows_to_skip, 4);
        assert_eq!(settings.placeholder_prefix, "{{");
        assert_eq!(settings.placeholder_suffix, "}}");
        assert_eq!(settings.default_null_value, "---");
        assert_eq!(
            settings.null_indicators,
            vec!["NAN", "NONE", "NA", "NULL"]
        );
        assert_eq!(settings.identity_key, "name");
        assert_eq!(settings.class_key, "class");
        assert_eq!(settings.engine_timeout_secs, 60);
        assert!(settings.soffice_path.is_none());
    }

    #[test]
    fn test_batch_options_carry_settings() {
        let mut settings = Settings::default();
        settings.header_rows_to_skip = 2;
        settings.default_null_value = "n/a".to_string();

        let options = settings.batch_options();
        assert_eq!(options.header_rows_to_skip, 2);
        assert_eq!(options.default_null_value, "n/a");
        assert_eq!(options.identity_key, settings.identity_key);
    }

    #[test]
    fn test_engine_timeout_is_seconds() {
        let mut settings = Settings::default();
        settings.engine_timeout_secs = 90;
        assert_eq!(settings.engine_timeout(), Duration::from_secs(90));
    }

    #[test]
    fn test_from_env_overrides() {
        std::env::set_var("REPORT_HEADER_ROWS_TO_SKIP", "1");
        std::env::set_var("REPORT_NULL_INDICATORS", "NAN, MISSING");
        std::env::set_var("REPORT_DEFAULT_NULL_VALUE", "n/a");

        let settings = Settings::from_env();
        assert_eq!(settings.header_rows_to_skip, 1);
        assert_eq!(settings.null_indicators, vec!["NAN", "MISSING"]);
        assert_eq!(settings.default_null_value, "n/a");

        std::env::remove_var("REPORT_HEADER_ROWS_TO_SKIP");
        std::env::remove_var("REPORT_NULL_INDICATORS");
        std::env::remove_var("REPORT_DEFAULT_NULL_VALUE");
    }
}
