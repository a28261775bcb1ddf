//! Nebula CLI - rotation-invariant SOM training and mapping.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use nebula::grid::{CartesianLayout, GridLayout, HexLayout};
use nebula::storage::{write_som_grid, write_som_stack, DataIterator, MappingWriter};
use nebula::{
    map_images, CancelToken, Initialization, NebulaError, NeighborhoodKind, Result, Schedule, Som,
    SomConfig, SomTrainer, TrainConfig,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "nebula")]
#[command(author = "Nebula Contributors")]
#[command(version)]
#[command(about = "Rotation- and flip-invariant SOM training for image corpora", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Cartesian,
    Hexagonal,
}

#[derive(Clone, Copy, ValueEnum)]
enum InitArg {
    Zero,
    Random,
}

#[derive(Clone, Copy, ValueEnum)]
enum NeighborhoodArg {
    Gaussian,
    MexicanHat,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a map on a binary image file
    Train {
        /// Input image file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the trained map (composite image)
        #[arg(short, long)]
        output: PathBuf,

        /// Grid side length (cartesian) or radius (hexagonal)
        #[arg(long, default_value = "10")]
        som_dim: u32,

        /// Neuron side length in pixels
        #[arg(long, default_value = "32")]
        neuron_dim: usize,

        /// Number of discrete rotations (the bank holds twice as many variants)
        #[arg(short, long, default_value = "360")]
        rotations: u32,

        /// Weight initialization
        #[arg(long, value_enum, default_value = "zero")]
        init: InitArg,

        /// Grid topology
        #[arg(short, long, value_enum, default_value = "cartesian")]
        layout: LayoutArg,

        /// Neighborhood width at the start of training
        #[arg(long, default_value = "1.1")]
        sigma: f32,

        /// Neighborhood width at the end of training (default: constant)
        #[arg(long)]
        sigma_end: Option<f32>,

        /// Learning-rate damping at the start of training
        #[arg(long, default_value = "0.2")]
        damping: f32,

        /// Learning-rate damping at the end of training (default: constant)
        #[arg(long)]
        damping_end: Option<f32>,

        /// Number of passes over the input
        #[arg(short, long, default_value = "1")]
        epochs: usize,

        /// Neighborhood function
        #[arg(long, value_enum, default_value = "gaussian")]
        neighborhood: NeighborhoodArg,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Also save a reloadable checkpoint of the map
        #[arg(long)]
        checkpoint: Option<PathBuf>,
    },

    /// Map images onto a trained map, writing per-image distance vectors
    Map {
        /// Input image file
        #[arg(short, long)]
        input: PathBuf,

        /// Map checkpoint written by `train --checkpoint`
        #[arg(short, long)]
        som: PathBuf,

        /// Output file for the distance vectors
        #[arg(short, long)]
        output: PathBuf,

        /// Grid topology of the checkpoint
        #[arg(short, long, value_enum, default_value = "cartesian")]
        layout: LayoutArg,

        /// Number of discrete rotations
        #[arg(short, long, default_value = "360")]
        rotations: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let result = match cli.command {
        Commands::Train {
            input,
            output,
            som_dim,
            neuron_dim,
            rotations,
            init,
            layout,
            sigma,
            sigma_end,
            damping,
            damping_end,
            epochs,
            neighborhood,
            seed,
            checkpoint,
        } => train(TrainArgs {
            input,
            output,
            som_dim,
            neuron_dim,
            rotations,
            init,
            layout,
            sigma,
            sigma_end,
            damping,
            damping_end,
            epochs,
            neighborhood,
            seed,
            checkpoint,
        }),

        Commands::Map {
            input,
            som,
            output,
            layout,
            rotations,
        } => map(input, som, output, layout, rotations),
    };

    if let Err(e) = result {
        error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(exit_code(&e));
    }
}

/// Exit codes: 0 success, 1 malformed input, 2 I/O error, 3 bad parameters.
fn exit_code(err: &NebulaError) -> i32 {
    match err {
        NebulaError::MalformedHeader(_)
        | NebulaError::DimensionMismatch { .. }
        | NebulaError::Serialization(_) => 1,
        NebulaError::Io(_) => 2,
        NebulaError::InvalidParameter(_) => 3,
        NebulaError::Cancelled => 0,
    }
}

struct TrainArgs {
    input: PathBuf,
    output: PathBuf,
    som_dim: u32,
    neuron_dim: usize,
    rotations: u32,
    init: InitArg,
    layout: LayoutArg,
    sigma: f32,
    sigma_end: Option<f32>,
    damping: f32,
    damping_end: Option<f32>,
    epochs: usize,
    neighborhood: NeighborhoodArg,
    seed: Option<u64>,
    checkpoint: Option<PathBuf>,
}

fn train(args: TrainArgs) -> Result<()> {
    let som_config = SomConfig {
        neuron_height: args.neuron_dim,
        neuron_width: args.neuron_dim,
        init: match args.init {
            InitArg::Zero => Initialization::Zero,
            InitArg::Random => Initialization::Random,
        },
        seed: args.seed,
    };

    let train_config = TrainConfig {
        rotations: args.rotations,
        epochs: args.epochs,
        sigma: Schedule {
            start: args.sigma,
            end: args.sigma_end.unwrap_or(args.sigma),
        },
        damping: Schedule {
            start: args.damping,
            end: args.damping_end.unwrap_or(args.damping),
        },
        neighborhood: match args.neighborhood {
            NeighborhoodArg::Gaussian => NeighborhoodKind::Gaussian,
            NeighborhoodArg::MexicanHat => NeighborhoodKind::MexicanHat,
        },
    };

    match args.layout {
        LayoutArg::Cartesian => {
            let layout = CartesianLayout::new([args.som_dim, args.som_dim])?;
            let som = train_som(layout, &som_config, &train_config, &args)?;
            let mut writer = BufWriter::new(File::create(&args.output)?);
            write_som_grid(
                som.weights(),
                args.som_dim as usize,
                args.som_dim as usize,
                args.neuron_dim,
                args.neuron_dim,
                &mut writer,
            )?;
        }
        LayoutArg::Hexagonal => {
            let layout = HexLayout::new(args.som_dim);
            let som = train_som(layout, &som_config, &train_config, &args)?;
            let mut writer = BufWriter::new(File::create(&args.output)?);
            write_som_stack(som.weights(), args.neuron_dim, args.neuron_dim, &mut writer)?;
        }
    }

    println!("✓ Wrote trained map to {}", args.output.display());
    Ok(())
}

fn train_som<L>(
    layout: L,
    som_config: &SomConfig,
    train_config: &TrainConfig,
    args: &TrainArgs,
) -> Result<Som<L>>
where
    L: GridLayout + Sync + Serialize,
{
    let file = File::open(&args.input)?;
    let mut data = DataIterator::open(BufReader::new(file))?;

    info!(
        "Loaded {} images of {:?} from {}",
        data.total(),
        data.header().extents,
        args.input.display()
    );

    let mut som = Som::new(layout, som_config)?;
    let trainer = SomTrainer::new(train_config.clone())?;

    let pb = ProgressBar::new((data.total() * train_config.epochs) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA: {eta}")
            .unwrap()
            .progress_chars("█▓▒░  "),
    );
    pb.set_message("Training...");

    let report = trainer.train_with_progress(&mut som, &mut data, &CancelToken::new(), |step, _| {
        pb.set_position(step as u64);
    })?;
    pb.finish_and_clear();

    println!(
        "✓ Trained {} cells on {} samples over {} epochs",
        som.cells(),
        report.samples,
        report.epochs
    );

    if let Some(checkpoint) = &args.checkpoint {
        som.save(checkpoint)?;
        println!("✓ Saved checkpoint to {}", checkpoint.display());
    }

    Ok(som)
}

fn map(
    input: PathBuf,
    som_path: PathBuf,
    output: PathBuf,
    layout: LayoutArg,
    rotations: u32,
) -> Result<()> {
    match layout {
        LayoutArg::Cartesian => {
            map_with_layout::<CartesianLayout<2>>(&input, &som_path, &output, rotations)
        }
        LayoutArg::Hexagonal => map_with_layout::<HexLayout>(&input, &som_path, &output, rotations),
    }
}

fn map_with_layout<L>(
    input: &Path,
    som_path: &Path,
    output: &Path,
    rotations: u32,
) -> Result<()>
where
    L: GridLayout + Sync + DeserializeOwned,
{
    let som: Som<L> = Som::load(som_path)?;
    let file = File::open(input)?;
    let mut data = DataIterator::open(BufReader::new(file))?;

    info!(
        "Mapping {} images onto {} cells",
        data.total(),
        som.cells()
    );

    let pb = ProgressBar::new(data.total() as u64);
    let mut writer = MappingWriter::new(
        BufWriter::new(File::create(output)?),
        data.total(),
        som.cells(),
    )?;

    let count = map_images(&som, &mut data, rotations, |index, matched| {
        writer.write_distances(&matched.distances)?;
        log::debug!("image {index}: bmu={} d={:.6}", matched.bmu, matched.distances[matched.bmu]);
        pb.inc(1);
        Ok(())
    })?;

    writer.finish()?;
    pb.finish_and_clear();
    println!("✓ Mapped {count} images to {}", output.display());
    Ok(())
}
