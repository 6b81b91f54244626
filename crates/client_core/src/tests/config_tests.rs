use super::{apply_overrides, normalize_base_url, read_file_settings, FileSettings, SettingsError};
use crate::ClientSettings;

use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn normalizes_base_url_with_trailing_slash() {
    let url = normalize_base_url("  https://erp.example.com/api  ").expect("url");
    assert_eq!(url.as_str(), "https://erp.example.com/api/");
    assert_eq!(
        url.join("transferencias/").expect("join").as_str(),
        "https://erp.example.com/api/transferencias/"
    );
}

#[test]
fn rejects_non_http_base_url() {
    let err = normalize_base_url("ftp://erp.example.com").expect_err("must fail");
    assert!(matches!(err, SettingsError::BaseUrl { .. }));
    assert!(normalize_base_url("   ").is_err());
}

#[test]
fn app_prefixed_env_wins_over_plain_env_and_file() {
    let file = FileSettings {
        api_base_url: Some("http://file.local/api".into()),
        auth_token: Some("file-token".into()),
        page_size: Some(50),
    };
    let settings = apply_overrides(
        ClientSettings::default(),
        Some(file),
        env_from(&[
            ("API_BASE_URL", "http://plain.local/api"),
            ("APP__API_BASE_URL", "http://app.local/api"),
            ("API_TOKEN", "env-token"),
        ]),
    )
    .expect("settings");

    assert_eq!(settings.api_base_url.as_str(), "http://app.local/api/");
    assert_eq!(settings.auth_token.as_deref(), Some("env-token"));
    assert_eq!(settings.page_size, 50);
}

#[test]
fn blank_token_disables_auth_header() {
    let settings = apply_overrides(
        ClientSettings::default(),
        None,
        env_from(&[("API_TOKEN", "   ")]),
    )
    .expect("settings");
    assert_eq!(settings.auth_token, None);
}

#[test]
fn rejects_out_of_range_page_size() {
    let err = apply_overrides(
        ClientSettings::default(),
        None,
        env_from(&[("APP__PAGE_SIZE", "0")]),
    )
    .expect_err("must fail");
    assert!(matches!(err, SettingsError::PageSize(_)));
}

#[test]
fn missing_settings_file_is_not_an_error() {
    let path = env::temp_dir().join("transfers_missing_settings_file.toml");
    let _ = fs::remove_file(&path);
    assert!(read_file_settings(&path).expect("read").is_none());
}

#[test]
fn reads_settings_file_from_disk() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("transfers_settings_test_{suffix}.toml"));
    fs::write(
        &path,
        "api_base_url = \"https://wms.example.com/api\"\npage_size = 25\n",
    )
    .expect("write");

    let file = read_file_settings(&path).expect("read").expect("present");
    let settings = apply_overrides(ClientSettings::default(), Some(file), |_| None).expect("apply");
    assert_eq!(settings.api_base_url.as_str(), "https://wms.example.com/api/");
    assert_eq!(settings.page_size, 25);

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn malformed_settings_file_is_reported() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("transfers_settings_bad_{suffix}.toml"));
    fs::write(&path, "page_size = \"many\"\n").expect("write");

    let err = read_file_settings(&path).expect_err("must fail");
    assert!(matches!(err, SettingsError::Parse { .. }));

    fs::remove_file(path).expect("cleanup");
}
