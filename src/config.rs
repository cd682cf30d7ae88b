//! Runtime configuration.
//!
//! Built once in `main` from CLI arguments and environment variables, then
//! passed by reference into the orchestrator and its collaborators. Core
//! logic never reads ambient environment state, so tests can inject any
//! configuration they need.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::CheckArgs;
use crate::error::ConfigError;

pub const DEFAULT_KEEP: usize = 10;
pub const DEFAULT_FROM: &str = "Vigil <onboarding@resend.dev>";
pub const DEFAULT_SUBJECT: &str = "Page updated";
pub const DEFAULT_TEMPLATE: &str =
    "The page has changed! <br> <a href='{url}'>View page</a>";

pub struct Config {
    pub urls: Vec<String>,
    pub keep: usize,
    pub timeout: Duration,
    pub db_path: Option<PathBuf>,
    pub api_key: Option<String>,
    pub recipients: Vec<String>,
    pub from: String,
    pub subject: String,
    pub template: String,
    pub notify: bool,
}

impl Config {
    pub fn from_check_args(args: &CheckArgs) -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::resolve(args, &vars)
    }

    /// Builds the configuration from explicit inputs. CLI arguments win over
    /// environment variables, which win over defaults.
    pub fn resolve(
        args: &CheckArgs,
        vars: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let urls: Vec<String> = match &args.urls {
            Some(list) if !list.is_empty() => list
                .iter()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect(),
            _ => vars
                .get("VIGIL_URLS")
                .map(|raw| split_list(raw))
                .unwrap_or_default(),
        };

        if urls.is_empty() {
            return Err(ConfigError::NoTargets);
        }

        let keep = match args.keep {
            Some(keep) => keep,
            None => keep_from_vars(vars)?,
        };

        let db_path = args
            .db
            .clone()
            .or_else(|| vars.get("VIGIL_DB").map(PathBuf::from));

        Ok(Config {
            urls,
            keep,
            timeout: args.timeout,
            db_path,
            api_key: vars
                .get("RESEND_API_KEY")
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            recipients: vars
                .get("EMAIL_RECIPIENTS")
                .map(|raw| split_list(raw))
                .unwrap_or_default(),
            from: vars
                .get("EMAIL_FROM")
                .cloned()
                .unwrap_or_else(|| DEFAULT_FROM.to_string()),
            subject: vars
                .get("EMAIL_SUBJECT")
                .cloned()
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            template: vars
                .get("EMAIL_HTML")
                .cloned()
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            notify: !args.no_notify,
        })
    }
}

/// Splits a comma-separated list, trimming items and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Retention bound for commands that take `--keep` without a full config.
pub fn resolve_keep(cli: Option<usize>) -> Result<usize, ConfigError> {
    match cli {
        Some(keep) => Ok(keep),
        None => {
            let vars: HashMap<String, String> = std::env::vars().collect();
            keep_from_vars(&vars)
        }
    }
}

/// Database path override for commands that take `--db` without a full config.
pub fn resolve_db(cli: Option<PathBuf>) -> Option<PathBuf> {
    cli.or_else(|| std::env::var("VIGIL_DB").ok().map(PathBuf::from))
}

fn keep_from_vars(vars: &HashMap<String, String>) -> Result<usize, ConfigError> {
    match vars.get("VIGIL_KEEP") {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidKeep(raw.clone())),
        None => Ok(DEFAULT_KEEP),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_args(urls: Option<Vec<&str>>) -> CheckArgs {
        CheckArgs {
            urls: urls.map(|list| list.into_iter().map(String::from).collect()),
            keep: None,
            timeout: Duration::from_secs(30),
            db: None,
            no_notify: false,
            json: false,
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn split_list_trims_and_drops_empty_items() {
        assert_eq!(
            split_list(" https://a.example , ,https://b.example,"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(split_list("").is_empty());
        assert!(split_list(" , ,").is_empty());
    }

    #[test]
    fn missing_urls_is_fatal() {
        let result = Config::resolve(&check_args(None), &vars(&[]));
        assert!(matches!(result, Err(ConfigError::NoTargets)));
    }

    #[test]
    fn urls_from_environment() {
        let config = Config::resolve(
            &check_args(None),
            &vars(&[("VIGIL_URLS", "https://a.example,https://b.example")]),
        )
        .unwrap();
        assert_eq!(config.urls.len(), 2);
        assert_eq!(config.keep, DEFAULT_KEEP);
    }

    #[test]
    fn cli_urls_override_environment() {
        let config = Config::resolve(
            &check_args(Some(vec!["https://cli.example"])),
            &vars(&[("VIGIL_URLS", "https://env.example")]),
        )
        .unwrap();
        assert_eq!(config.urls, vec!["https://cli.example"]);
    }

    #[test]
    fn keep_parses_from_environment() {
        let config = Config::resolve(
            &check_args(Some(vec!["https://a.example"])),
            &vars(&[("VIGIL_KEEP", "3")]),
        )
        .unwrap();
        assert_eq!(config.keep, 3);
    }

    #[test]
    fn invalid_keep_is_rejected() {
        let result = Config::resolve(
            &check_args(Some(vec!["https://a.example"])),
            &vars(&[("VIGIL_KEEP", "ten")]),
        );
        assert!(matches!(result, Err(ConfigError::InvalidKeep(_))));
    }

    #[test]
    fn blank_api_key_treated_as_absent() {
        let config = Config::resolve(
            &check_args(Some(vec!["https://a.example"])),
            &vars(&[("RESEND_API_KEY", "   ")]),
        )
        .unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn notification_defaults_applied() {
        let config =
            Config::resolve(&check_args(Some(vec!["https://a.example"])), &vars(&[]))
                .unwrap();
        assert_eq!(config.from, DEFAULT_FROM);
        assert_eq!(config.subject, DEFAULT_SUBJECT);
        assert!(config.template.contains("{url}"));
        assert!(config.recipients.is_empty());
    }
}
