//! Literal placeholder substitution across the workspace config directory
//!
//! The token set is closed: three markers, replaced by exact string matching.
//! Substituted values are never re-scanned, so a value containing marker-like
//! text cannot trigger a second expansion.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;

use crate::options::CliOptions;

pub const APP_CODE_TOKEN: &str = "%APP_CODE%";
pub const APP_NAME_TOKEN: &str = "%APP_NAME%";
pub const DOMAIN_NAME_TOKEN: &str = "%DOMAINNAME%";

/// Token/value pairs in replacement order.
fn token_table(options: &CliOptions) -> [(&'static str, &str); 3] {
    [
        (APP_CODE_TOKEN, options.app_code.as_str()),
        (APP_NAME_TOKEN, options.app_name.as_str()),
        (DOMAIN_NAME_TOKEN, options.domain_name.as_str()),
    ]
}

/// Replace every token occurrence in `input` in a single left-to-right pass.
pub fn replace_tokens(input: &str, options: &CliOptions) -> String {
    let table = token_table(options);
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while !rest.is_empty() {
        // Earliest match wins; table order breaks ties.
        let mut earliest: Option<(usize, &str, &str)> = None;
        for (token, value) in table {
            if let Some(pos) = rest.find(token) {
                if earliest.map(|(best, _, _)| pos < best).unwrap_or(true) {
                    earliest = Some((pos, token, value));
                }
            }
        }

        match earliest {
            Some((pos, token, value)) => {
                out.push_str(&rest[..pos]);
                out.push_str(value);
                rest = &rest[pos + token.len()..];
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }

    out
}

/// Apply the token table to every file in `<workspace>/config/`.
///
/// One file failing is logged and skipped; the rest of the set is still
/// processed.
pub async fn substitute(workspace: &Path, options: &CliOptions) -> Result<()> {
    let config_dir = workspace.join("config");
    let mut entries = fs::read_dir(&config_dir)
        .await
        .with_context(|| format!("Failed to read {}", config_dir.display()))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to read {}", config_dir.display()))?
    {
        let path = entry.path();
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        match apply_to_file(&path, options).await {
            Ok(()) => {
                let _ = cliclack::log::info(format!(
                    "/config/{}",
                    entry.file_name().to_string_lossy()
                ));
            }
            Err(e) => {
                let _ = cliclack::log::warning(format!("Skipping {}: {:#}", path.display(), e));
            }
        }
    }

    Ok(())
}

/// Whole-file read, replace, write back. No partial writes.
async fn apply_to_file(path: &Path, options: &CliOptions) -> Result<()> {
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let replaced = replace_tokens(&text, options);
    fs::write(path, replaced)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_options() -> CliOptions {
        CliOptions::new("CLItesting", "TST", "clitesting.com").unwrap()
    }

    #[test]
    fn replaces_every_occurrence_of_every_token() {
        let input = "%APP_CODE%-%APP_CODE% name=%APP_NAME% host=%DOMAINNAME%";
        let out = replace_tokens(input, &test_options());
        assert_eq!(out, "TST-TST name=CLItesting host=clitesting.com");
    }

    #[test]
    fn leaves_unmarked_text_alone() {
        let input = "nothing to see here";
        assert_eq!(replace_tokens(input, &test_options()), input);
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let options = CliOptions::new("%DOMAINNAME%", "TST", "clitesting.com").unwrap();
        let out = replace_tokens("name=%APP_NAME%", &options);
        assert_eq!(out, "name=%DOMAINNAME%");
    }

    #[tokio::test]
    async fn fills_the_common_config_fields() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("config");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("common.ts"),
            concat!(
                "export const commonVars = {\n",
                "  APP_CODE: \"%APP_CODE%\",\n",
                "  PRODUCTNAME: \"%APP_NAME%\",\n",
                "  DOMAINNAME: \"%DOMAINNAME%\",\n",
                "};\n",
            ),
        )
        .unwrap();

        substitute(dir.path(), &test_options()).await.unwrap();

        let content = std::fs::read_to_string(config_dir.join("common.ts")).unwrap();
        assert!(content.contains("APP_CODE: \"TST\""));
        assert!(content.contains("PRODUCTNAME: \"CLItesting\""));
        assert!(content.contains("DOMAINNAME: \"clitesting.com\""));
        assert!(!content.contains('%'));
    }

    #[tokio::test]
    async fn one_bad_file_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("config");
        std::fs::create_dir_all(&config_dir).unwrap();
        // Invalid UTF-8 makes the whole-file read fail for this entry.
        std::fs::write(config_dir.join("binary.bin"), [0xff, 0xfe, 0x00, 0x01]).unwrap();
        std::fs::write(config_dir.join("dev.ts"), "code: \"%APP_CODE%\"").unwrap();

        substitute(dir.path(), &test_options()).await.unwrap();

        let content = std::fs::read_to_string(config_dir.join("dev.ts")).unwrap();
        assert_eq!(content, "code: \"TST\"");
    }
}
