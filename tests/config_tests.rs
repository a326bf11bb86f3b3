//! Configuration loading from disk.

use std::io::Write;
use std::time::Duration;

use rust_decimal_macros::dec;
use tempfile::NamedTempFile;
use yieldlord::error::{ConfigError, Error};
use yieldlord::infrastructure::config::logging::LogFormat;
use yieldlord::infrastructure::config::Config;

const FULL: &str = r#"
[portals]
api_url = "https://api.portals.fi/v2"
network = "arbitrum"
max_attempts = 5
retry_base_delay_ms = 250
request_timeout_secs = 10

[chain]
rpc_url = "https://arb1.arbitrum.io/rpc"
chain_id = 42161

[feed]
platforms = ["aavev3"]
min_liquidity_usd = 100000
min_apy = 0.02
limit = 20

[risk]
max_per_protocol = 0.4

[execution]
slippage_tolerance = 1.0
confirmation_timeout_secs = 60
poll_interval_ms = 500
max_attempts = 2
retry_base_delay_ms = 100
auto_approve = false

[strategy]
capital = 2500
dry_run = true

[logging]
level = "debug"
format = "json"
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_every_section_from_disk() {
    let file = write_config(FULL);

    let config = Config::load(file.path()).unwrap();

    assert_eq!(config.portals.max_attempts, 5);
    assert_eq!(config.portals.retry_policy().base_delay, Duration::from_millis(250));
    assert_eq!(config.portals.request_timeout(), Duration::from_secs(10));
    assert_eq!(config.chain.rpc_url, "https://arb1.arbitrum.io/rpc");
    assert_eq!(config.feed.platforms, vec!["aavev3"]);
    assert_eq!(config.risk_profile().unwrap().max_per_protocol(), dec!(0.4));
    assert_eq!(config.strategy.capital, dec!(2500));
    assert!(config.strategy.dry_run);
    assert_eq!(config.logging.format, LogFormat::Json);

    let query = config.feed.query(&config.portals.network);
    assert_eq!(query.network, "arbitrum");
    assert_eq!(query.limit, 20);
    assert_eq!(query.min_apy, Some(dec!(0.02)));

    let settings = config
        .execution
        .settings(&config.portals.network, config.chain.chain_id)
        .unwrap();
    assert_eq!(settings.chain_id, 42161);
    assert_eq!(settings.retry.max_attempts, 2);
    assert_eq!(settings.confirmation_timeout, Duration::from_secs(60));
    assert!(!settings.auto_approve);
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::load(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(Error::Config(ConfigError::ReadFile(_)))));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let file = write_config("[logging\nlevel = ");
    assert!(matches!(
        Config::load(file.path()),
        Err(Error::Config(ConfigError::Parse(_)))
    ));
}

#[test]
fn invalid_cap_names_the_field() {
    let file = write_config("[logging]\nlevel = \"info\"\n[risk]\nmax_per_protocol = 2\n");
    assert!(matches!(
        Config::load(file.path()),
        Err(Error::Config(ConfigError::InvalidValue { field: "max_per_protocol", .. }))
    ));
}

#[test]
fn shipped_example_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml");
    let config = Config::load(path).unwrap();
    assert_eq!(config.chain.chain_id, 42161);
}
