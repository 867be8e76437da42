use std::path::PathBuf;

use clap::{Parser, Subcommand};
use foundation::geo::LngLatAlt;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use viewer::{RenderCameraConfig, RenderMode, Viewer};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect street-level image datasets")]
struct Args {
    /// JSON dataset with images, sequences and meshes
    #[arg(long)]
    dataset: PathBuf,

    /// JSON viewer config; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the navigation edges of an image
    Edges {
        key: String,
    },

    /// Follow one direction from an image and print every settled step
    Walk {
        key: String,

        /// Direction name, e.g. next, step_forward, turn_left
        #[arg(long, default_value = "next")]
        direction: String,

        #[arg(long, default_value_t = 10)]
        steps: usize,

        #[arg(long, default_value_t = 640.0)]
        width: f64,

        #[arg(long, default_value_t = 480.0)]
        height: f64,

        /// fill or letterbox
        #[arg(long, default_value = "fill")]
        render_mode: String,
    },

    /// Project a geodetic point into the canvas seen from an image
    Project {
        key: String,

        #[arg(long)]
        lng: f64,

        #[arg(long)]
        lat: f64,

        #[arg(long, default_value_t = 0.0)]
        alt: f64,

        #[arg(long, default_value_t = 640.0)]
        width: f64,

        #[arg(long, default_value_t = 480.0)]
        height: f64,
    },
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
    let args = Args::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| format!("start runtime: {e}"))?;

    let service =
        tools::load_service(&args.dataset, args.config.as_deref()).map_err(|e| e.to_string())?;

    let result = match args.command {
        Command::Edges { key } => {
            let edges = runtime
                .block_on(tools::edges(&service, &key))
                .map_err(|e| e.to_string())?;
            print_json(&edges)
        }
        Command::Walk {
            key,
            direction,
            steps,
            width,
            height,
            render_mode,
        } => {
            let direction = tools::parse_direction(&direction).map_err(|e| e.to_string())?;
            let render_mode = RenderMode::parse(&render_mode)
                .ok_or_else(|| format!("unknown render mode: {render_mode}"))?;
            let config = RenderCameraConfig {
                render_mode,
                ..RenderCameraConfig::default()
            };
            let viewer = Viewer::new(service.clone(), &config, width, height);
            let walked = runtime
                .block_on(tools::walk(&viewer, &key, direction, steps))
                .map_err(|e| e.to_string())?;
            print_json(&walked)
        }
        Command::Project {
            key,
            lng,
            lat,
            alt,
            width,
            height,
        } => {
            let config = RenderCameraConfig::default();
            let viewer = Viewer::new(service.clone(), &config, width, height);
            let pixel = runtime
                .block_on(tools::project(&viewer, &key, LngLatAlt::new(lng, lat, alt)))
                .map_err(|e| e.to_string())?;
            print_json(&pixel)
        }
    };
    debug!("metrics: {}", service.metrics());
    result
}

fn print_json(value: &impl Serialize) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| format!("encode output: {e}"))?;
    println!("{json}");
    Ok(())
}
