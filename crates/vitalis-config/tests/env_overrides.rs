use figment::Jail;
use pretty_assertions::assert_eq;
use vitalis_config::VitalisConfig;

#[test]
fn env_sets_nested_fields() {
    Jail::expect_with(|jail| {
        jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
        jail.set_env("VITALIS_DATABASE__PATH", ":memory:");
        jail.set_env("VITALIS_BOOTSTRAP__MAX_ATTEMPTS", "2");

        let config = VitalisConfig::load().expect("config loads");
        assert!(config.database.is_in_memory());
        assert_eq!(config.bootstrap.max_attempts, 2);
        Ok(())
    });
}

#[test]
fn env_beats_project_toml() {
    Jail::expect_with(|jail| {
        jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
        jail.create_dir(".vitalis")?;
        jail.create_file(
            ".vitalis/config.toml",
            r"
            [bootstrap]
            backoff_ms = 500
            ",
        )?;
        jail.set_env("VITALIS_BOOTSTRAP__BACKOFF_MS", "10");

        let config = VitalisConfig::load().expect("config loads");
        assert_eq!(config.bootstrap.backoff_ms, 10);
        Ok(())
    });
}

#[test]
fn env_zero_attempts_fails_validation() {
    Jail::expect_with(|jail| {
        jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
        jail.set_env("VITALIS_BOOTSTRAP__MAX_ATTEMPTS", "0");

        assert!(VitalisConfig::load().is_err());
        Ok(())
    });
}
