use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use storybook_generator::app::{App, StoryRenderer};
use storybook_generator::form::{FormController, FormField};
use storybook_generator::models::Config;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "storybook-generator")]
#[command(about = "Create illustrated short stories for kids")]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the story form over HTTP (default).
    Serve {
        /// Address to listen on; overrides BIND_ADDRESS.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Generate one story from the command line.
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[arg(long)]
    character1_name: Option<String>,
    #[arg(long)]
    character1_age: Option<String>,
    #[arg(long)]
    character1_type: Option<String>,
    #[arg(long)]
    character2_name: Option<String>,
    #[arg(long)]
    character2_age: Option<String>,
    #[arg(long)]
    character2_type: Option<String>,
    #[arg(long)]
    story_location: Option<String>,
    #[arg(long)]
    story_type: Option<String>,
    /// Request the whole answer at once instead of streaming it.
    #[arg(long)]
    no_stream: bool,
}

impl GenerateArgs {
    fn edits(&self) -> Vec<(FormField, &str)> {
        [
            (FormField::Character1Name, &self.character1_name),
            (FormField::Character1Age, &self.character1_age),
            (FormField::Character1Kind, &self.character1_type),
            (FormField::Character2Name, &self.character2_name),
            (FormField::Character2Age, &self.character2_age),
            (FormField::Character2Kind, &self.character2_type),
            (FormField::StoryLocation, &self.story_location),
            (FormField::StoryGenre, &self.story_type),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }
}

struct ConsoleRenderer;

impl StoryRenderer for ConsoleRenderer {
    fn render_story(&mut self, text: &str) {
        println!("{}\n", text);
    }

    fn render_image(&mut self, url: &str) {
        println!("Illustration: {}", url);
    }
}

async fn generate_once(config: Config, args: GenerateArgs) -> Result<()> {
    let mut controller = FormController::new();
    for (field, value) in args.edits() {
        controller.set(field, value)?;
    }
    let form = controller.submit()?;

    let config = Config {
        stream_text: config.stream_text && !args.no_stream,
        ..config
    };
    let app = App::new(&config);
    let outcome = app.generate(&form, &mut ConsoleRenderer).await?;
    info!("Finished with state {:?}", outcome.state);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storybook_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting storybook-generator");

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            let bind_address = bind.unwrap_or_else(|| config.bind_address.clone());
            let app = Arc::new(App::new(&config));
            storybook_generator::web::serve(app, &bind_address)
                .await
                .map_err(anyhow::Error::from)
        }
        Command::Generate(generate) => generate_once(config, generate).await,
    };

    if let Err(e) = result {
        error!("Story creator failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_serve() {
        let args = CliArgs::try_parse_from(["storybook-generator"]).unwrap();
        assert!(args.command.is_none());
    }

    #[test]
    fn test_generate_flags_become_form_edits() {
        let args = CliArgs::try_parse_from([
            "storybook-generator",
            "generate",
            "--character1-name",
            "Milo",
            "--story-location",
            "Outer Space",
            "--no-stream",
        ])
        .unwrap();

        let Some(Command::Generate(generate)) = args.command else {
            panic!("expected generate command");
        };
        assert!(generate.no_stream);
        assert_eq!(
            generate.edits(),
            vec![
                (FormField::Character1Name, "Milo"),
                (FormField::StoryLocation, "Outer Space"),
            ]
        );
    }
}
