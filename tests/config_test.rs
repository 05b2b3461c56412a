use std::{env, time::Duration};

use txguard::{Config, POSTGRES_URL_ENV, TxOptions};

#[test]
fn default_config_has_a_two_second_budget_and_no_url() {
    let config = Config::default();

    assert_eq!(config.url, None);
    assert_eq!(config.timeout, Duration::from_secs(2));
    assert_eq!(config.tx, TxOptions::default());
}

#[test]
fn with_url_keeps_the_remaining_defaults() {
    let config = Config::with_url("postgres://postgres@127.0.0.1:5432/postgres");

    assert_eq!(
        config.url.as_deref(),
        Some("postgres://postgres@127.0.0.1:5432/postgres")
    );
    assert_eq!(config.timeout, Duration::from_secs(2));
}

#[test]
fn from_env_reads_the_well_known_variable() {
    // The only test in this binary that touches the variable.
    unsafe {
        env::set_var(POSTGRES_URL_ENV, "postgres://env@127.0.0.1:5432/envdb");
    }
    let config = Config::from_env();
    assert_eq!(
        config.url.as_deref(),
        Some("postgres://env@127.0.0.1:5432/envdb")
    );

    unsafe {
        env::remove_var(POSTGRES_URL_ENV);
    }
    let config = Config::from_env();
    assert_eq!(config.url, None);
}
