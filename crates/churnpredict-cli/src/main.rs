// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use churnpredict_app::AppState;
use churnpredict_client::Client;
use churnpredict_tui::{Theme, UiOptions};
use config::{API_BASE_ENV, Config};
use runtime::HttpRuntime;
use std::env;
use std::path::PathBuf;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `churnpredict --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    if let Err(error) = logging::init(config.log_filter()) {
        eprintln!("logging disabled: {error}");
    }

    let base_url = config.resolve_api_base(options.api_base.as_deref());
    let timeout = config.api_timeout()?;
    let client = Client::new(&base_url, timeout).with_context(|| {
        format!(
            "invalid API base URL; set --api-base, {API_BASE_ENV} or [api].base_url in {}",
            options.config_path.display()
        )
    })?;
    info!(base_url = client.base_url(), ?timeout, "prediction service resolved");

    if options.check_only {
        client.ping()?;
        println!("ok: {}", client.base_url());
        return Ok(());
    }

    let theme = Theme::by_name(config.theme_name())
        .ok_or_else(|| anyhow!("unknown theme {:?}", config.theme_name()))?;
    let ui_options = UiOptions {
        theme,
        report_path: Some(config.report_path()),
    };

    let mut state = AppState::default();
    let mut runtime = HttpRuntime::new(client);
    churnpredict_tui::run_app(&mut state, &mut runtime, ui_options)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    api_base: Option<String>,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        api_base: None,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_ref() {
            "--config" => {
                let path = flag_value(&mut args, "--config", "a file path")?;
                options.config_path = PathBuf::from(path);
            }
            "--api-base" => {
                options.api_base = Some(flag_value(&mut args, "--api-base", "a URL")?);
            }
            "--print-config-path" => options.print_config_path = true,
            "--print-example-config" => options.print_example = true,
            "--check" => options.check_only = true,
            "--help" | "-h" => options.show_help = true,
            other => bail!("unknown argument {other:?}; run with --help to list the flags"),
        }
    }

    Ok(options)
}

fn flag_value<I, S>(args: &mut I, flag: &str, expected: &str) -> Result<String>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    args.next()
        .map(|value| value.as_ref().to_owned())
        .ok_or_else(|| anyhow!("{flag} requires {expected}"))
}

fn print_help() {
    println!("churnpredict - customer churn prediction console");
    println!("  --config <path>          Use a specific config path");
    println!("  --api-base <url>         Prediction service base URL (overrides {API_BASE_ENV})");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and probe the service health endpoint");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn fallback_path() -> PathBuf {
        PathBuf::from("/tmp/churnpredict-config.toml")
    }

    #[test]
    fn no_arguments_keep_fallback_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<&str>::new(), fallback_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: fallback_path(),
                api_base: None,
                print_config_path: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn config_and_api_base_flags_take_values() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--config",
                "/custom/config.toml",
                "--api-base",
                "http://churn.internal:8000",
            ],
            fallback_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(
            options.api_base.as_deref(),
            Some("http://churn.internal:8000")
        );
        Ok(())
    }

    #[test]
    fn value_flags_without_value_fail() {
        let error = parse_cli_args(vec!["--config"], fallback_path())
            .expect_err("--config needs a path");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--api-base"], fallback_path())
            .expect_err("--api-base needs a URL");
        assert!(error.to_string().contains("--api-base requires a URL"));
    }

    #[test]
    fn unknown_flag_points_at_help() {
        let error = parse_cli_args(vec!["--verbose"], fallback_path())
            .expect_err("--verbose is not a flag");
        assert_eq!(
            error.to_string(),
            "unknown argument \"--verbose\"; run with --help to list the flags"
        );
    }

    #[test]
    fn switches_combine() -> Result<()> {
        let options = parse_cli_args(vec!["--check", "--print-example-config"], fallback_path())?;
        assert!(options.check_only);
        assert!(options.print_example);
        assert!(!options.print_config_path);
        assert!(!options.show_help);

        let options = parse_cli_args(vec!["--print-config-path"], fallback_path())?;
        assert!(options.print_config_path);
        Ok(())
    }

    #[test]
    fn help_has_short_and_long_forms() -> Result<()> {
        for flag in ["--help", "-h"] {
            assert!(parse_cli_args(vec![flag], fallback_path())?.show_help);
        }
        Ok(())
    }
}
