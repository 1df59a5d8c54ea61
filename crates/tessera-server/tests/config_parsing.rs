use std::{env, fs, time::Duration};

use tessera_auth::GrantType;
use tessera_server::config::loader::load_config;

const TOML: &str = r#"
[server]
host = "127.0.0.1"
port = 8081

[logging]
level = "debug"

[provider]
issuer = "https://op.example.com"
refresh_token_rotation = "none"

[provider.ttl]
access_token = "30m"

[provider.signing]
algorithm = "ES384"

[provider.cookies]
keys = ["k2", "k1"]

[[clients]]
client_id = "rp"
client_secret = "secret"
redirect_uris = ["https://rp.example.com/cb"]
response_types = ["code", "code id_token"]
grant_types = ["authorization_code", "refresh_token"]

[[accounts]]
account_id = "alice"

[accounts.claims]
email = "alice@example.com"
"#;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("tessera.toml");
    fs::write(&path, TOML).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(&path).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.provider.issuer, "https://op.example.com");
    assert_eq!(cfg.provider.ttl.access_token, Duration::from_secs(1800));
    assert_eq!(cfg.provider.ttl.authorization_code, Duration::from_secs(600));
    assert_eq!(cfg.provider.cookies.keys, vec!["k2", "k1"]);
    assert_eq!(cfg.clients.len(), 1);
    assert_eq!(
        cfg.clients[0].grant_types,
        vec![GrantType::AuthorizationCode, GrantType::RefreshToken]
    );
    assert_eq!(cfg.accounts[0].claims["email"], "alice@example.com");

    // 2) Env override should win over file
    unsafe {
        env::set_var("TESSERA__LOGGING__LEVEL", "warn");
    }
    let cfg_env = load_config(&path).expect("should parse config with env overrides");
    assert_eq!(cfg_env.logging.level, "warn");
    unsafe {
        env::remove_var("TESSERA__LOGGING__LEVEL");
    }

    // 3) Invalid provider configuration is rejected
    let invalid = TOML.replace("algorithm = \"ES384\"", "algorithm = \"HS256\"");
    fs::write(&path, invalid).expect("write toml");
    let err = load_config(&path).unwrap_err();
    assert!(err.contains("signing algorithm"), "{err}");
}

#[test]
fn invalid_client_registration_is_rejected() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("tessera.toml");
    let toml = TOML.replace("redirect_uris = [\"https://rp.example.com/cb\"]", "redirect_uris = []");
    fs::write(&path, toml).expect("write toml");

    let err = load_config(&path).unwrap_err();
    assert!(err.contains("client 'rp'"), "{err}");
}

#[test]
fn missing_file_uses_defaults() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("absent.toml");

    let cfg = load_config(&path).expect("defaults are valid");
    assert_eq!(cfg.server.port, 3000);
    assert!(cfg.clients.is_empty());
}

#[test]
fn duplicate_client_ids_are_rejected() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("tessera.toml");
    let second = r#"
[[clients]]
client_id = "rp"
client_secret = "other"
redirect_uris = ["https://rp.example.com/other"]
"#;
    fs::write(&path, format!("{TOML}{second}")).expect("write toml");

    let err = load_config(&path).unwrap_err();
    assert!(err.contains("registered twice"), "{err}");
}
