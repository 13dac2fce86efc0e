use super::*;

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.content.directory, PathBuf::from("content"));
    assert_eq!(settings.content.default_language.as_str(), "de");
    let languages: Vec<&str> = settings
        .content
        .languages
        .iter()
        .map(LanguageCode::as_str)
        .collect();
    assert_eq!(languages, ["de", "en"]);
    assert_eq!(settings.cache.default_ttl, Duration::from_secs(300));
    assert_eq!(settings.cache.sweep_interval, Duration::from_secs(60));
    assert_eq!(settings.api_rate_limit.window_seconds.get(), 60);
    assert_eq!(settings.api_rate_limit.max_requests.get(), 120);
    assert_eq!(settings.environment, RuntimeEnvironment::Production);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.cache.default_ttl_seconds = Some(10);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        cache_default_ttl_seconds: Some(42),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.cache.default_ttl, Duration::from_secs(42));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_language_is_always_offered() {
    let mut raw = RawSettings::default();
    raw.content.default_language = Some("fr".to_string());
    raw.content.languages = Some(vec!["en".to_string(), "EN".to_string()]);

    let settings = Settings::from_raw(raw).expect("valid settings");
    let languages: Vec<&str> = settings
        .content
        .languages
        .iter()
        .map(LanguageCode::as_str)
        .collect();
    assert_eq!(languages, ["fr", "en"]);
}

#[test]
fn invalid_default_language_is_rejected() {
    let mut raw = RawSettings::default();
    raw.content.default_language = Some("not a language".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid language");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "content.default_language",
            ..
        }
    ));
}

#[test]
fn zero_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.default_ttl_seconds = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero ttl");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.default_ttl_seconds",
            ..
        }
    ));
}

#[test]
fn environment_parses_aliases() {
    let mut raw = RawSettings::default();
    raw.environment = Some("Dev".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.environment.is_development());

    let mut raw = RawSettings::default();
    raw.environment = Some("staging".to_string());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["folio"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_import_arguments() {
    let args = CliArgs::parse_from([
        "folio",
        "import",
        "--content-directory",
        "/srv/content",
        "projects",
        "en",
        "/tmp/projects.json",
    ]);

    match args.command.expect("import command") {
        Command::Import(import) => {
            assert_eq!(
                import.content.content_directory.as_deref(),
                Some(std::path::Path::new("/srv/content"))
            );
            assert_eq!(import.collection, "projects");
            assert_eq!(import.language, "en");
            assert_eq!(import.file, std::path::Path::new("/tmp/projects.json"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "folio",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--cache-sweep-interval-seconds",
        "5",
        "--environment",
        "development",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(serve.overrides.cache_sweep_interval_seconds, Some(5));
            assert_eq!(serve.overrides.environment.as_deref(), Some("development"));
        }
        _ => panic!("wrong command parsed"),
    }
}
