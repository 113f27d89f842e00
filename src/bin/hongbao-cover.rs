#[path = "hongbao_cover/cli.rs"]
mod cli;

use clap::Parser as _;

use hongbao_cover::{
    AtlasCloudImages, CoverGenerator as _, Env, GenerationResult, ProviderConfig, build_prompt,
    find_theme, themes,
};

use cli::{Cli, Command, GenerateArgs, ProviderArgs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = match &cli.command {
        #[cfg(feature = "server")]
        Command::Serve { .. } => "info",
        _ => "warn",
    };
    hongbao_cover::telemetry::init_tracing(default_filter, cli.json_logs)
        .map_err(|err| err.to_string())?;

    match cli.command {
        #[cfg(feature = "server")]
        Command::Serve { listen } => serve(&cli.provider, &listen).await,
        Command::Generate(args) => generate(&cli.provider, args).await,
        Command::Themes => {
            for theme in themes() {
                println!(
                    "{}\t{} {}\t{}",
                    theme.id, theme.emoji, theme.name, theme.default_text
                );
            }
            Ok(())
        }
    }
}

async fn load_client(args: &ProviderArgs) -> Result<AtlasCloudImages, Box<dyn std::error::Error>> {
    let env = Env::load_dotenv_if_exists(&args.dotenv)?;
    let config = match &args.config {
        Some(path) => ProviderConfig::load(path)?,
        None => ProviderConfig::default(),
    };
    Ok(AtlasCloudImages::from_config(&config, &env).await?)
}

#[cfg(feature = "server")]
async fn serve(args: &ProviderArgs, listen: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = load_client(args).await?;
    tracing::info!(base_url = client.base_url(), model = client.model_id(), "provider configured");

    let app = hongbao_cover::server::router(hongbao_cover::server::CoverHttpState::new(client));
    let listener = tokio::net::TcpListener::bind(listen).await?;
    println!("hongbao-cover listening on {listen}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn generate(
    provider: &ProviderArgs,
    args: GenerateArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let prompt = match (args.prompt, args.theme) {
        (Some(prompt), _) => prompt,
        (None, Some(theme_id)) => {
            let theme = find_theme(&theme_id).ok_or_else(|| format!("unknown theme: {theme_id}"))?;
            let caption = args.text.as_deref().unwrap_or(theme.default_text);
            build_prompt(theme, caption)
        }
        (None, None) => return Err("either --prompt or --theme is required".into()),
    };

    let client = load_client(provider).await?;
    match client.generate(&prompt).await {
        GenerationResult::Success { url } => {
            println!("{url}");
            Ok(())
        }
        GenerationResult::Failure {
            reason,
            http_status,
            ..
        } => Err(format!("generation failed ({http_status}): {reason}").into()),
    }
}
