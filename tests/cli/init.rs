use anyhow::{Context, Result};
use serde_json::Value;

use crate::CliTest;

/// Validates config file structure and default values.
fn assert_config_content(content: &str) -> Result<()> {
    let parsed: Value = serde_json::from_str(content).context("Config should be valid JSON")?;

    for field in ["input", "output", "patterns", "format", "parsers"] {
        assert!(
            parsed.get(field).is_some(),
            "Config should have '{field}' field"
        );
    }
    assert_eq!(parsed["format"], "json");

    // 2-space indentation
    assert!(content.contains("\n  \"input\""));

    Ok(())
}

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().arg("init").output()?;
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)?.contains("Created .ngx-extract.json"));

    assert!(test.root().join(".ngx-extract.json").exists());
    let content = test.read_file(".ngx-extract.json")?;
    assert_config_content(&content)?;

    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(".ngx-extract.json", "{}")?;

    let output = test.command().arg("init").output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8(output.stderr)?.contains("Error: .ngx-extract.json already exists"));
    assert_eq!(test.read_file(".ngx-extract.json")?, "{}");

    Ok(())
}

#[test]
fn test_init_config_is_immediately_usable() -> Result<()> {
    let test = CliTest::new()?;

    test.command().arg("init").output()?;
    test.write_file(
        "src/app/app.component.html",
        "<h1>{{ 'APP.TITLE' | translate }}</h1>",
    )?;

    let output = test.extract_command().output()?;
    assert!(
        output.status.success(),
        "Extract should work with initialized config. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(test.read_file("src/assets/i18n/en.json")?.contains("APP.TITLE"));

    Ok(())
}
