use std::collections::BTreeMap;
use std::time::Duration;

use crate::types::PollPolicy;
use crate::{CoverError, Result};

use super::*;

#[tokio::test]
async fn resolves_api_key_from_default_env_key() -> Result<()> {
    let env = Env {
        dotenv: BTreeMap::from([("AI_IMAGE_API_KEY".to_string(), " sk-test ".to_string())]),
    };
    let token = resolve_api_key(None, &env).await?;
    assert_eq!(token, "sk-test");

    let token = resolve_api_key(Some(&ProviderAuth::ApiKeyEnv { keys: Vec::new() }), &env).await?;
    assert_eq!(token, "sk-test");
    Ok(())
}

#[tokio::test]
async fn resolves_api_key_from_custom_keys_in_order() -> Result<()> {
    let env = Env {
        dotenv: BTreeMap::from([
            ("HONGBAO_TEST_SECOND".to_string(), "sk-second".to_string()),
            ("HONGBAO_TEST_THIRD".to_string(), "sk-third".to_string()),
        ]),
    };
    let auth = ProviderAuth::ApiKeyEnv {
        keys: vec![
            "HONGBAO_TEST_MISSING".to_string(),
            "HONGBAO_TEST_SECOND".to_string(),
            "HONGBAO_TEST_THIRD".to_string(),
        ],
    };
    let token = resolve_api_key(Some(&auth), &env).await?;
    assert_eq!(token, "sk-second");
    Ok(())
}

#[tokio::test]
async fn missing_api_key_is_a_config_error() {
    let env = Env::default();
    let auth = ProviderAuth::ApiKeyEnv {
        keys: vec!["HONGBAO_TEST_NEVER_SET".to_string()],
    };
    let err = resolve_api_key(Some(&auth), &env)
        .await
        .expect_err("missing key should fail");
    match err {
        CoverError::Config(message) => assert!(message.contains("HONGBAO_TEST_NEVER_SET")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_auth_command_is_rejected() {
    let auth = ProviderAuth::Command {
        command: Vec::new(),
    };
    let err = resolve_api_key(Some(&auth), &Env::default())
        .await
        .expect_err("empty command should fail");
    assert!(matches!(err, CoverError::AuthCommand(_)));
}

#[test]
fn parses_dotenv_basic() {
    let parsed = parse_dotenv(
        r#"
# AtlasCloud
export AI_IMAGE_API_KEY="sk-test"
AI_IMAGE_MODEL='google/imagen4'
EMPTY=
"#,
    );
    assert_eq!(
        parsed.get("AI_IMAGE_API_KEY").map(String::as_str),
        Some("sk-test")
    );
    assert_eq!(
        parsed.get("AI_IMAGE_MODEL").map(String::as_str),
        Some("google/imagen4")
    );
    assert_eq!(parsed.get("EMPTY"), None);
}

#[test]
fn loads_dotenv_file_when_present() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(".env.local");
    assert!(Env::load_dotenv_if_exists(&path)?.dotenv.is_empty());

    std::fs::write(&path, "AI_IMAGE_API_KEY=sk-file\n")?;
    let env = Env::load_dotenv_if_exists(&path)?;
    assert_eq!(env.get("AI_IMAGE_API_KEY").as_deref(), Some("sk-file"));
    Ok(())
}

#[test]
fn http_headers_reject_invalid_name() {
    let headers = BTreeMap::from([("bad header".to_string(), "value".to_string())]);
    let err = super::http::header_map_from_pairs(&headers)
        .expect_err("should reject invalid header name");
    match err {
        CoverError::Config(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn provider_config_parses_toml() -> Result<()> {
    let parsed = ProviderConfig::from_toml_str(
        r#"
base_url = "https://api.atlascloud.ai/api/v1"
model = "google/imagen4"
request_timeout_secs = 90

[auth]
type = "api_key_env"
keys = ["ATLAS_KEY"]

[http_headers]
x-client = "hongbao-cover"

[poll]
interval_ms = 500
"#,
    )?;
    assert_eq!(
        parsed.base_url.as_deref(),
        Some("https://api.atlascloud.ai/api/v1")
    );
    assert_eq!(parsed.default_model.as_deref(), Some("google/imagen4"));
    assert_eq!(parsed.request_timeout_secs, Some(90));
    assert_eq!(
        parsed.auth,
        Some(ProviderAuth::ApiKeyEnv {
            keys: vec!["ATLAS_KEY".to_string()]
        })
    );
    assert_eq!(
        parsed.http_headers.get("x-client").map(String::as_str),
        Some("hongbao-cover")
    );
    assert_eq!(
        parsed.poll.policy()?,
        PollPolicy::new(Duration::from_millis(500), Duration::from_millis(120_000))
    );
    Ok(())
}

#[test]
fn empty_provider_config_uses_default_poll_policy() -> Result<()> {
    let parsed = ProviderConfig::from_toml_str("")?;
    assert_eq!(parsed, ProviderConfig::default());
    assert_eq!(parsed.poll.policy()?, PollPolicy::default());
    Ok(())
}

#[test]
fn zero_poll_interval_is_rejected() -> Result<()> {
    let parsed = ProviderConfig::from_toml_str("[poll]\ninterval_ms = 0\n")?;
    match parsed.poll.policy() {
        Err(CoverError::Config(message)) => assert!(message.contains("poll.interval_ms")),
        other => panic!("unexpected policy: {other:?}"),
    }

    let parsed = ProviderConfig::from_toml_str("[poll]\ntimeout_ms = 0\n")?;
    assert!(matches!(parsed.poll.policy(), Err(CoverError::Config(_))));
    Ok(())
}

#[test]
fn bearer_auth_redacts_debug_output() -> Result<()> {
    let auth = BearerAuth::new("sk-secret")?;
    let rendered = format!("{auth:?}");
    assert!(!rendered.contains("sk-secret"));
    assert!(BearerAuth::new("   ").is_err());
    Ok(())
}
