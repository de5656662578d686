use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use formats::{GpsTable, PointsDocument};
use foundation::dms::parse_dms;
use foundation::{GeoPoint, ImagePoint};
use overlay::{ImageInfo, OverlayConfig, OverlayController};
use serde::Serialize;
use tools::ViewOverrides;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Georeference a raster image against GPS points")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit the image center and scale to GPS points matched by id
    Fit {
        #[command(flatten)]
        image: ImageArgs,

        #[command(flatten)]
        view: ViewArgs,

        /// Annotated points JSON ({"points": [{"id", "x", "y"}]})
        #[arg(long)]
        points: PathBuf,

        /// GPS table (CSV, or JSON array of rows); header row first
        #[arg(long)]
        gps: PathBuf,
    },

    /// Match annotated points to GPS points without fitting
    Match {
        #[arg(long)]
        points: PathBuf,

        #[arg(long)]
        gps: PathBuf,
    },

    /// Convert an image pixel to a geographic coordinate
    Project {
        #[command(flatten)]
        image: ImageArgs,

        #[command(flatten)]
        view: ViewArgs,

        #[arg(long)]
        x: f64,

        #[arg(long)]
        y: f64,
    },

    /// Print the geographic bounds of a placement
    Bounds {
        #[command(flatten)]
        image: ImageArgs,

        #[command(flatten)]
        view: ViewArgs,
    },
}

#[derive(Args, Debug)]
struct ImageArgs {
    /// Image width in pixels
    #[arg(long)]
    width: u32,

    /// Image height in pixels
    #[arg(long)]
    height: u32,

    /// Image file name, compared against a points document's imageReference
    #[arg(long)]
    name: Option<String>,
}

/// Placement overrides. Unset values come from GEOREF_* env vars or defaults.
#[derive(Args, Debug)]
struct ViewArgs {
    /// Overlay center latitude, decimal or DMS (34°51'13.20"N)
    #[arg(long, allow_hyphen_values = true, value_parser = parse_angle)]
    lat: Option<f64>,

    /// Overlay center longitude, decimal or DMS
    #[arg(long, allow_hyphen_values = true, value_parser = parse_angle)]
    lng: Option<f64>,

    /// Map zoom level used for meters-per-pixel
    #[arg(long)]
    zoom: Option<u32>,

    /// Overlay scale factor
    #[arg(long)]
    scale: Option<f64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let cli = Cli::parse();
    let config = OverlayConfig::from_env();

    match cli.command {
        Command::Fit {
            image,
            view,
            points,
            gps,
        } => {
            let mut controller = controller(&config, image, view)?;
            let doc = PointsDocument::load(&points).map_err(|e| e.to_string())?;
            let table = GpsTable::load(&gps).map_err(|e| e.to_string())?;
            let report = tools::fit(&mut controller, &doc, table)?;
            if let Some(m) = &report.image_reference_mismatch {
                eprintln!("warning: {m}");
            }
            print_json(&report)
        }
        Command::Match { points, gps } => {
            let doc = PointsDocument::load(&points).map_err(|e| e.to_string())?;
            let table = GpsTable::load(&gps).map_err(|e| e.to_string())?;
            print_json(&tools::match_report(&doc, &table))
        }
        Command::Project {
            image,
            view,
            x,
            y,
        } => {
            let placement = placement(&config, image, view)?;
            print_json(&tools::project(&placement, ImagePoint::new(x, y))?)
        }
        Command::Bounds { image, view } => {
            let placement = placement(&config, image, view)?;
            print_json(&tools::bounds(&placement)?)
        }
    }
}

fn controller(
    config: &OverlayConfig,
    image: ImageArgs,
    view: ViewArgs,
) -> Result<OverlayController, String> {
    let mut info = ImageInfo::new(image.width, image.height);
    if let Some(name) = image.name {
        info = info.with_file_name(name);
    }
    let center = match (view.lat, view.lng) {
        (None, None) => None,
        (lat, lng) => {
            let lat = lat.unwrap_or(config.initial_center.lat);
            let lng = lng.unwrap_or(config.initial_center.lng);
            let center = GeoPoint::try_new(lat, lng)
                .ok_or_else(|| format!("invalid center: {lat}, {lng}"))?;
            Some(center)
        }
    };
    let overrides = ViewOverrides {
        center,
        zoom: view.zoom,
        scale: view.scale,
    };
    let controller = tools::load_controller(config, info, overrides)?;
    info!(?overrides, "placement ready");
    Ok(controller)
}

fn placement(
    config: &OverlayConfig,
    image: ImageArgs,
    view: ViewArgs,
) -> Result<overlay::OverlayPlacement, String> {
    controller(config, image, view)?
        .placement()
        .ok_or_else(|| "no image loaded".to_string())
}

fn parse_angle(s: &str) -> Result<f64, String> {
    s.trim()
        .parse::<f64>()
        .ok()
        .or_else(|| parse_dms(s))
        .ok_or_else(|| format!("not a decimal or DMS angle: {s}"))
}

fn print_json(value: &impl Serialize) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| format!("serialize: {e}"))?;
    println!("{json}");
    Ok(())
}
