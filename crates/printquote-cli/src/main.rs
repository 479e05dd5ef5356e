//! printquote CLI - quote a print job from the terminal
//!
//! Decodes an STL or 3MF file, prices it and estimates delivery.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use printquote::cost::{estimated_weights, Material, PricingMode, MATERIALS};
use printquote::delivery::{AddressDescriptor, Destination};
use printquote::{acquire_location, estimate_quote, FixedLocation, QuoteConfig, QuoteError, QuoteRequest};

mod report;

#[derive(Parser)]
#[command(name = "printquote")]
#[command(about = "Instant quotes for 3D print jobs", long_about = None)]
struct Cli {
    /// TOML config file (default: $PRINTQUOTE_CONFIG, else built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a model and estimate delivery
    Quote {
        /// Path to an .stl or .3mf file
        file: PathBuf,
        /// Material id or name (default from config)
        #[arg(short, long)]
        material: Option<String>,
        /// Pricing mode
        #[arg(long, value_enum)]
        mode: Option<Mode>,
        /// Infill percentage (10-100)
        #[arg(long)]
        infill: Option<f64>,
        /// Layer height in mm
        #[arg(long)]
        layer_height: Option<f64>,
        /// Print speed in mm/s (20-100)
        #[arg(long)]
        speed: Option<f64>,
        #[command(flatten)]
        address: AddressArgs,
        /// Device latitude in degrees
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Device longitude in degrees
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
        /// Product name for the checkout line
        #[arg(long)]
        product_name: Option<String>,
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Show geometry of a model without pricing it
    Info {
        /// Path to an .stl or .3mf file
        file: PathBuf,
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// List the material catalog
    Materials {
        /// Show estimated weight for this volume (cm³)
        #[arg(long)]
        volume: Option<f64>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Tiered pricing by print time
    Regular,
    /// Flat hourly rate
    Batch,
}

impl From<Mode> for PricingMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Regular => PricingMode::Regular,
            Mode::Batch => PricingMode::Batch,
        }
    }
}

#[derive(clap::Args)]
struct AddressArgs {
    /// Delivery city
    #[arg(long)]
    city: Option<String>,
    /// Delivery state or region
    #[arg(long)]
    state: Option<String>,
    /// Delivery postal code
    #[arg(long)]
    postcode: Option<String>,
    /// Delivery country
    #[arg(long)]
    country: Option<String>,
}

impl AddressArgs {
    fn into_address(self) -> Option<AddressDescriptor> {
        let address = AddressDescriptor {
            city: self.city.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
            postal_code: self.postcode.unwrap_or_default(),
            country: self.country.unwrap_or_default(),
        };
        (!address.is_blank()).then_some(address)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = QuoteConfig::discover(cli.config.as_deref()).context("failed to load config")?;

    match cli.command {
        Commands::Quote {
            file,
            material,
            mode,
            infill,
            layer_height,
            speed,
            address,
            lat,
            lon,
            product_name,
            json,
        } => {
            let mut request = QuoteRequest::from_config(&config)?;
            if let Some(id) = material {
                request.material =
                    Material::by_id(&id).ok_or_else(|| QuoteError::UnknownMaterial(id.clone()))?;
            }
            if let Some(mode) = mode {
                request.print.pricing_mode = mode.into();
            }
            if let Some(infill) = infill {
                request.print.infill_percentage = infill;
            }
            if let Some(layer_height) = layer_height {
                request.print.layer_height = layer_height;
            }
            if let Some(speed) = speed {
                request.print.print_speed = speed;
            }
            if let Err(err) = request.print.validate() {
                tracing::warn!(error = %err, "print settings adjusted to supported range");
            }

            request.destination = Destination {
                address: address.into_address(),
                location: None,
            };
            if let (Some(lat), Some(lon)) = (lat, lon) {
                let fix = acquire_location(&FixedLocation::at(lat, lon), config.geolocation_timeout()).await;
                request.destination.location = Some(fix);
            }

            quote_file(&file, &request, &config, product_name.as_deref(), json)?;
        }
        Commands::Info { file, json } => {
            show_info(&file, json)?;
        }
        Commands::Materials { volume, json } => {
            list_materials(volume, json)?;
        }
    }

    Ok(())
}

fn read_model(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Attach the customer-facing message to a pipeline error.
fn explain(err: QuoteError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

fn quote_file(
    path: &Path,
    request: &QuoteRequest,
    config: &QuoteConfig,
    product_name: Option<&str>,
    json: bool,
) -> Result<()> {
    let bytes = read_model(path)?;
    let quote = estimate_quote(&bytes, file_name(path), request, config, Utc::now())
        .map_err(explain)?;
    let item = printquote::CheckoutItem::from_quote(&quote, product_name);

    if json {
        let out = serde_json::json!({
            "quote": quote,
            "delivery_date": config.delivery.delivery_date_label(&quote.eta),
            "checkout": item,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        report::print_quote(path, &quote, config, &item);
    }
    Ok(())
}

fn show_info(path: &Path, json: bool) -> Result<()> {
    let bytes = read_model(path)?;
    let stats = printquote::mesh::decode_and_analyze(&bytes, file_name(path))
        .map_err(|err| explain(err.into()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        report::print_stats(path, &stats);
    }
    Ok(())
}

fn list_materials(volume: Option<f64>, json: bool) -> Result<()> {
    if json {
        let rows: Vec<_> = match volume {
            Some(volume) => estimated_weights(volume)
                .map(|(material, grams)| serde_json::json!({ "material": material, "weight_grams": grams }))
                .collect(),
            None => MATERIALS
                .iter()
                .map(|material| serde_json::json!({ "material": material }))
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        report::print_materials(volume);
    }
    Ok(())
}
