use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use image_to_color_names_wasm::{
    ColorTable, LogNotifier, Notifier, PixelGrid, ProfileOptions, Strategy, VoteOrder,
    dominant_color_name, profile_bytes,
};
use anyhow::Context;
use anyhow::Result;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    /// Cluster with k-means, then name each centroid
    Centroid,
    /// Name every pixel and keep the most voted names
    Vote,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Centroid => Strategy::Centroid,
            StrategyArg::Vote => Strategy::Vote,
        }
    }
}

/// Describe the dominant colors of images by name.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of colors to report (positive integer, 3 when omitted)
    #[arg(short = 'k', long)]
    k: Option<String>,

    /// How colors are found
    #[arg(short, long, value_enum, default_value_t = StrategyArg::Centroid)]
    strategy: StrategyArg,

    /// Fixed clustering seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Shrink images so the longest side is at most this many pixels
    #[arg(short, long)]
    downscale: Option<u32>,

    /// CSV color table with Name,R,G,B columns (built-in table when omitted)
    #[arg(short = 'c', long)]
    palette: Option<PathBuf>,

    /// Order vote results from most to fewest votes
    #[arg(long)]
    descending_votes: bool,

    /// Only report the single most dominant color
    #[arg(long)]
    dominant: bool,

    /// Also publish each description to this topic
    #[arg(short, long)]
    topic: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: log::LevelFilter,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .init();

    let table = match &args.palette {
        Some(path) => ColorTable::from_path(path)
            .with_context(|| format!("loading color table {}", path.display()))?,
        None => ColorTable::builtin().context("loading built-in color table")?,
    };

    let mut options = ProfileOptions {
        seed: args.seed,
        ..ProfileOptions::default()
    };
    if args.descending_votes {
        options = options.with_vote_order(VoteOrder::Descending);
    }
    if let Some(side) = args.downscale {
        options = options.with_downscale(side);
    }

    let notifier = LogNotifier;

    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;

        let description = if args.dominant {
            let grid = PixelGrid::decode(&bytes, options.downscale)
                .with_context(|| format!("decoding {}", input.display()))?;
            let dominant = dominant_color_name(&grid, &table, &options)?;
            let line = serde_json::json!({
                "colors": dominant.as_ref().map(|c| c.name.as_str()).unwrap_or(""),
                "rgb": dominant.as_ref().map(|c| vec![c.rgb]).unwrap_or_default(),
            });
            println!("{}: {line}", input.display());
            dominant.map(|c| c.name).unwrap_or_default()
        } else {
            let profile = profile_bytes(
                &bytes,
                args.k.as_deref(),
                args.strategy.into(),
                &table,
                &options,
            )
            .with_context(|| format!("profiling {}", input.display()))?;
            println!(
                "{}: {}",
                input.display(),
                serde_json::to_string(&profile.to_response())?
            );
            profile.description
        };

        if let Some(topic) = &args.topic {
            notifier.publish(topic, &description);
        }
    }

    Ok(())
}
