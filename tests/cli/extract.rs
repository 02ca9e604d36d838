use anyhow::Result;
use serde_json::{Value, json};

use crate::CliTest;

const TEMPLATE: &str = r#"<h1>{{ 'HOME.TITLE' | translate }}</h1>
<p translate>HOME.WELCOME</p>
<button [title]="(isAdmin ? 'HOME.ADMIN' : 'HOME.GUEST') | translate"></button>
"#;

const COMPONENT: &str = r#"import { Component, inject } from '@angular/core';
import { TranslateService } from '@ngx-translate/core';
import { marker as _ } from '@colsen1991/ngx-translate-extract-marker';

const LABELS = [_('LABEL.SAVE'), _('LABEL.CANCEL')];

@Component({ selector: 'app-home', templateUrl: './home.component.html' })
export class HomeComponent {
  private translate = inject(TranslateService);

  greet() {
    return this.translate.instant('HOME.GREETING');
  }
}
"#;

fn project() -> Result<CliTest> {
    let test = CliTest::with_file("src/app/home.component.html", TEMPLATE)?;
    test.write_file("src/app/home.component.ts", COMPONENT)?;
    test.write_file("src/styles.css", "h1 { color: red; }")?;
    Ok(test)
}

fn json_file(test: &CliTest, path: &str) -> Result<Value> {
    Ok(serde_json::from_str(&test.read_file(path)?)?)
}

#[test]
fn test_extract_creates_json_catalog() -> Result<()> {
    let test = project()?;

    let output = test
        .extract_command()
        .args(["-i", "src", "-o", "src/assets/i18n/en.json", "--sort"])
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Found 7 strings."));
    assert!(stdout.contains("Saving:\n- src/assets/i18n/en.json [CREATED]\n"));

    let keys: Vec<String> = json_file(&test, "src/assets/i18n/en.json")?
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(
        keys,
        vec![
            "HOME.ADMIN",
            "HOME.GREETING",
            "HOME.GUEST",
            "HOME.TITLE",
            "HOME.WELCOME",
            "LABEL.CANCEL",
            "LABEL.SAVE"
        ]
    );
    assert!(test.read_file("src/assets/i18n/en.json")?.contains("\n\t\"HOME.ADMIN\": \"\""));

    Ok(())
}

#[test]
fn test_extract_merges_existing_translations() -> Result<()> {
    let test = project()?;
    test.write_file(
        "i18n/fr.json",
        r#"{ "HOME.TITLE": "Accueil", "OBSOLETE": "Ancien" }"#,
    )?;

    let output = test
        .extract_command()
        .args(["-i", "src", "-o", "i18n/fr.json", "--parsers", "pipe"])
        .output()?;
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)?.contains("- i18n/fr.json [MERGED]"));
    assert_eq!(
        json_file(&test, "i18n/fr.json")?,
        json!({
            "HOME.TITLE": "Accueil",
            "HOME.ADMIN": "",
            "HOME.GUEST": "",
            "OBSOLETE": "Ancien"
        })
    );

    // --clean drops keys no longer in the sources.
    test.extract_command()
        .args(["-i", "src", "-o", "i18n/fr.json", "--parsers", "pipe", "--clean"])
        .output()?;
    let catalog = json_file(&test, "i18n/fr.json")?;
    assert!(catalog.get("OBSOLETE").is_none());
    assert_eq!(catalog["HOME.TITLE"], "Accueil");

    Ok(())
}

#[test]
fn test_extract_replace() -> Result<()> {
    let test = project()?;
    test.write_file("en.json", r#"{ "HOME.TITLE": "Home" }"#)?;

    let output = test
        .extract_command()
        .args(["-i", "src", "-o", "en.json", "-r", "-k", "--parsers", "directive"])
        .output()?;
    assert!(String::from_utf8(output.stdout)?.contains("- en.json [REPLACED]"));
    assert_eq!(
        json_file(&test, "en.json")?,
        json!({ "HOME.WELCOME": "HOME.WELCOME" })
    );

    Ok(())
}

#[test]
fn test_extract_po_into_directory() -> Result<()> {
    let test = project()?;
    test.write_file("i18n/.keep", "")?;

    let output = test
        .extract_command()
        .args([
            "-i",
            "src",
            "-o",
            "i18n",
            "-f",
            "po",
            "--parsers",
            "directive",
        ])
        .output()?;
    assert!(String::from_utf8(output.stdout)?.contains("- i18n/strings.po [CREATED]"));

    let catalog = test.read_file("i18n/strings.po")?;
    assert!(catalog.contains("Content-Type: text/plain; charset=utf-8"));
    assert!(catalog.contains("#: src/app/home.component.html"));
    assert!(catalog.contains("msgid \"HOME.WELCOME\""));

    Ok(())
}

#[test]
fn test_extract_namespaced_json_with_custom_marker() -> Result<()> {
    let test = CliTest::with_file(
        "src/labels.ts",
        "export const LABELS = [t('FORM.NAME'), t('FORM.EMAIL')];\n",
    )?;

    let output = test
        .extract_command()
        .args([
            "-o",
            "en.json",
            "-f",
            "namespaced-json",
            "--format-indentation",
            "  ",
            "-m",
            "t",
        ])
        .output()?;
    assert!(output.status.success());
    assert_eq!(
        test.read_file("en.json")?,
        "{\n  \"FORM\": {\n    \"NAME\": \"\",\n    \"EMAIL\": \"\"\n  }\n}\n"
    );

    Ok(())
}

#[test]
fn test_extract_reads_config_file() -> Result<()> {
    let test = project()?;
    test.write_file(
        ".ngx-extract.json",
        r#"{ "output": ["i18n/en.json"], "parsers": ["marker"], "stringAsDefaultValue": "TODO" }"#,
    )?;

    let output = test.extract_command().output()?;
    assert!(output.status.success());
    assert_eq!(
        json_file(&test, "i18n/en.json")?,
        json!({ "LABEL.SAVE": "TODO", "LABEL.CANCEL": "TODO" })
    );

    Ok(())
}

#[test]
fn test_extract_without_output_is_an_error() -> Result<()> {
    let test = project()?;

    let output = test.extract_command().output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stderr)?.contains("No output specified"));

    Ok(())
}

#[test]
fn test_extract_missing_input_is_an_error() -> Result<()> {
    let test = project()?;

    let output = test
        .extract_command()
        .args(["-i", "nowhere", "-o", "en.json"])
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(!test.exists("en.json"));

    Ok(())
}

#[test]
fn test_extract_failing_destination() -> Result<()> {
    let test = project()?;
    test.write_file("broken.json", "[]")?;

    let output = test
        .extract_command()
        .args(["-i", "src", "-o", "broken.json", "ok.json"])
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("- broken.json [ERROR]"));
    assert!(stdout.contains("- ok.json [CREATED]"));
    assert_eq!(test.read_file("broken.json")?, "[]");

    Ok(())
}

#[test]
fn test_extract_reports_parse_errors() -> Result<()> {
    let test = CliTest::with_file(
        "src/broken.ts",
        "import { TranslateService } from '@ngx-translate/core';\nclass {",
    )?;
    test.write_file("src/ok.html", "{{ 'OK' | translate }}")?;

    let output = test
        .extract_command()
        .args(["-o", "en.json"])
        .output()?;
    assert!(output.status.success());
    assert!(String::from_utf8(output.stderr)?.contains("parser error(s) (use -v for details)"));
    assert_eq!(json_file(&test, "en.json")?, json!({ "OK": "" }));

    let output = test
        .extract_command()
        .args(["-o", "en.json", "-v"])
        .output()?;
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("service parser failed on src/broken.ts"));
    assert!(stderr.contains("Writing json catalogs, parsers: pipe, directive, service, marker"));

    Ok(())
}

#[test]
fn test_extract_with_cache_file() -> Result<()> {
    let test = project()?;
    let args = ["-i", "src", "-o", "en.json", "--cache-file", ".cache/extract.json", "-v"];

    let output = test.extract_command().args(args).output()?;
    assert!(output.status.success());
    assert!(test.exists(".cache/extract.json"));
    assert!(String::from_utf8(output.stdout)?.contains("(0 cached)"));

    let output = test.extract_command().args(args).output()?;
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Extracted from 2 files"));
    assert!(stdout.contains("(2 cached)"));
    assert!(stdout.contains("Found 7 strings."));

    Ok(())
}

#[test]
fn test_input_help_mentions_relative_paths() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().args(["extract", "--help"]).output()?;
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)?.contains("relative to the working directory"));

    Ok(())
}

#[test]
fn test_no_command_prints_help() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().output()?;
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)?.contains("extract"));

    Ok(())
}
