use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "hongbao-cover", version, about = "Red packet cover image generator")]
pub(crate) struct Cli {
    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub(crate) struct ProviderArgs {
    /// TOML provider config; values there win over the environment.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Dotenv file consulted before the process environment.
    #[arg(long, global = true, default_value = ".env.local")]
    pub dotenv: PathBuf,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Serve the generate/themes HTTP API.
    #[cfg(feature = "server")]
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,
    },
    /// Generate one cover and print its URL.
    Generate(GenerateArgs),
    /// List the built-in cover themes.
    Themes,
}

#[derive(Debug, Args)]
pub(crate) struct GenerateArgs {
    /// Raw prompt sent to the provider as-is.
    #[arg(long, conflicts_with_all = ["theme", "text"])]
    pub prompt: Option<String>,

    /// Theme id, see `themes`.
    #[arg(long)]
    pub theme: Option<String>,

    /// Caption for the theme; defaults to the theme's suggested text.
    #[arg(long, requires = "theme")]
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_accepts_theme_and_text() {
        let cli = Cli::try_parse_from([
            "hongbao-cover",
            "generate",
            "--theme",
            "ink-horse",
            "--text",
            "一马当先",
        ])
        .expect("parse");
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.theme.as_deref(), Some("ink-horse"));
        assert_eq!(args.text.as_deref(), Some("一马当先"));
        assert_eq!(cli.provider.dotenv, PathBuf::from(".env.local"));
    }

    #[test]
    fn prompt_conflicts_with_theme() {
        let err = Cli::try_parse_from([
            "hongbao-cover",
            "generate",
            "--prompt",
            "horse",
            "--theme",
            "ink-horse",
        ]);
        assert!(err.is_err());
    }
}
