//! # menuvision: A CLI for the menu digitizer
//!
//! Extracts the items of a photographed menu page and illustrates each one.
//! Logs go to `menuvision-cli.log`; results are printed to stdout.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use menuvision::{
    constants::{
        DEFAULT_FAL_IMAGE_SIZE, DEFAULT_FAL_MODEL, DEFAULT_IMAGE_FORMAT, DEFAULT_IMAGE_MODEL,
        DEFAULT_IMAGE_PROVIDER, DEFAULT_MAX_WORKERS, DEFAULT_TEXT_MODEL, FAL_API_BASE,
        FLASH_LITE_MODEL, GEMINI_API_BASE,
    },
    providers::factory::{create_image_provider, create_vision_provider},
    settings::{Credentials, ImageSettings, ProviderEndpoints},
    MenuError, MenuPipeline, MenuPipelineBuilder,
};
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about = "Menu digitizer and illustrator", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract the items of a menu photo and generate one image per item
    Process(ProcessArgs),
    /// Extract the items of a menu photo without generating images
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Path to the menu image file
    menu_image: PathBuf,
    /// Directory where generated assets are stored
    #[arg(long, default_value = "menu_output")]
    output_dir: PathBuf,
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Gemini model for menu extraction
    #[arg(long, default_value = DEFAULT_TEXT_MODEL)]
    text_model: String,
    /// Shortcut for --text-model gemini-2.5-flash-lite
    #[arg(long)]
    flash_lite: bool,
    #[arg(long, env = "MENUVISION_GEMINI_API_BASE", default_value = GEMINI_API_BASE, hide = true)]
    gemini_api_base: String,
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Parser, Debug)]
struct ProcessArgs {
    #[command(flatten)]
    model: ModelArgs,
    /// Image generation backend to use
    #[arg(long, default_value = DEFAULT_IMAGE_PROVIDER, value_parser = ["fal_flux_krea", "gemini_imagen"], ignore_case = true)]
    image_provider: String,
    /// FAL API key
    #[arg(long, env = "FAL_KEY", hide_env_values = true)]
    fal_api_key: Option<String>,
    /// FAL model identifier (fal_flux_krea only)
    #[arg(long, default_value = DEFAULT_FAL_MODEL)]
    fal_model: String,
    /// FAL image size preset (fal_flux_krea only)
    #[arg(long, default_value = DEFAULT_FAL_IMAGE_SIZE)]
    fal_image_size: String,
    /// Imagen model for dish illustration
    #[arg(long, default_value = DEFAULT_IMAGE_MODEL)]
    image_model: String,
    /// Image format for generated dishes
    #[arg(long, default_value = DEFAULT_IMAGE_FORMAT, value_parser = ["png", "jpeg", "jpg"], ignore_case = true)]
    image_format: String,
    /// Maximum concurrent image generation requests
    #[arg(long, default_value_t = DEFAULT_MAX_WORKERS)]
    max_workers: usize,
    /// Only extract and record items; do not generate images
    #[arg(long)]
    skip_images: bool,
    #[arg(long, env = "MENUVISION_FAL_API_BASE", default_value = FAL_API_BASE, hide = true)]
    fal_api_base: String,
}

impl ModelArgs {
    fn text_model(&self) -> &str {
        if self.flash_lite {
            FLASH_LITE_MODEL
        } else {
            &self.text_model
        }
    }
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Setup logging to a file
    if let Ok(log_file) = File::create("menuvision-cli.log") {
        let subscriber = fmt::Subscriber::builder()
            .with_writer(log_file)
            .with_ansi(false)
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Process(args) => handle_process(args).await,
        Commands::Extract(args) => handle_extract(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command failed: {e:?}");
            eprintln!("Error: {e}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Maps a failure class to the process exit code.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<MenuError>() {
        Some(MenuError::Config(_)) => 2,
        Some(MenuError::Extraction(_)) => 3,
        Some(MenuError::ImageGeneration(_)) => 4,
        _ => 1,
    }
}

// --- Command Handlers ---

fn build_pipeline(
    model: &ModelArgs,
    credentials: &Credentials,
    endpoints: &ProviderEndpoints,
) -> Result<MenuPipelineBuilder, MenuError> {
    let vision = create_vision_provider(model.text_model(), credentials, endpoints)?;
    Ok(MenuPipelineBuilder::new().vision_provider(vision))
}

async fn handle_extract(args: &ExtractArgs) -> Result<()> {
    let credentials = Credentials {
        gemini_api_key: args.model.api_key.clone(),
        fal_api_key: None,
    };
    let endpoints = ProviderEndpoints {
        gemini_api_base: args.model.gemini_api_base.clone(),
        ..Default::default()
    };
    let pipeline: MenuPipeline = build_pipeline(&args.model, &credentials, &endpoints)?
        .build()
        .map_err(MenuError::from)?;

    let processed = pipeline
        .process_menu(&args.model.menu_image, &args.model.output_dir, false)
        .await?;
    info!("Extraction finished with {} items", processed.items.len());

    println!("Metadata saved to: {}", processed.metadata_path.display());
    for entry in &processed.items {
        println!("- {} ({})", entry.item.name, entry.item.price);
        println!("  Description: {}", entry.item.description);
    }
    Ok(())
}

async fn handle_process(args: &ProcessArgs) -> Result<()> {
    let credentials = Credentials {
        gemini_api_key: args.model.api_key.clone(),
        fal_api_key: args.fal_api_key.clone(),
    };
    let endpoints = ProviderEndpoints {
        gemini_api_base: args.model.gemini_api_base.clone(),
        fal_api_base: args.fal_api_base.clone(),
    };
    let settings = ImageSettings {
        image_provider: args.image_provider.to_lowercase(),
        image_model: args.image_model.clone(),
        image_format: args.image_format.to_lowercase(),
        fal_model: args.fal_model.clone(),
        fal_image_size: args.fal_image_size.clone(),
    };

    let mut builder = build_pipeline(&args.model, &credentials, &endpoints)?
        .image_format(&settings.image_format)
        .max_workers(args.max_workers);
    if !args.skip_images {
        let image_provider =
            create_image_provider(&settings, &credentials, &endpoints).map_err(MenuError::from)?;
        builder = builder.image_provider(image_provider);
    }
    let pipeline = builder.build().map_err(MenuError::from)?;

    info!(
        "Processing {} with provider '{}'",
        args.model.menu_image.display(),
        settings.image_provider
    );
    let processed = pipeline
        .process_menu(&args.model.menu_image, &args.model.output_dir, !args.skip_images)
        .await?;

    println!("Metadata saved to: {}", processed.metadata_path.display());
    for entry in &processed.items {
        let image = entry.image_path.as_deref().unwrap_or("(no image)");
        println!("- {} ({}) -> {image}", entry.item.name, entry.item.price);
        if !entry.item.description.is_empty() {
            println!("  Description: {}", entry.item.description);
        }
    }
    Ok(())
}
