//! Runs every replanning strategy over a batch of gridworlds and records the results.
//!
//! Usage:
//!   cargo run --release --example run_gridworlds -- --n-worlds 50 --grid-size 101
//!   cargo run --release --example run_gridworlds -- --input output/worlds -a adaptive

use anyhow::{Context, Result};
use clap::Parser;
use grid_replanning::{Algorithm, GridMap, Point};
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use replanning_gridworlds::{
    generate_gridworld, gridworld_paths, load_gridworld, save_gridworld, write_records, RunRecord,
    DEFAULT_BLOCK_PROBABILITY,
};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Side length of generated gridworlds
    #[arg(long, default_value_t = 101)]
    grid_size: usize,

    /// Number of gridworlds to generate
    #[arg(long, default_value_t = 50)]
    n_worlds: usize,

    /// Seed for gridworld generation
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Probability that the generator blocks a newly visited cell
    #[arg(long, default_value_t = DEFAULT_BLOCK_PROBABILITY, value_parser = parse_probability)]
    block_probability: f64,

    /// Strategies to run; all of them if omitted
    #[arg(short, long)]
    algorithm: Vec<Algorithm>,

    /// Directory of `.map` files to run on instead of generating new worlds
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for maps, rendered traces and results.csv
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,
}

fn parse_probability(s: &str) -> Result<f64, String> {
    let p: f64 = s.parse().map_err(|e| format!("{s:?} is not a number: {e}"))?;
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(format!("{p} is not within [0, 1]"))
    }
}

fn load_worlds(args: &Args) -> Result<Vec<Vec<Vec<bool>>>> {
    match &args.input {
        Some(dir) => gridworld_paths(dir)
            .with_context(|| format!("listing {}", dir.display()))?
            .iter()
            .map(|path| {
                load_gridworld(path).with_context(|| format!("loading {}", path.display()))
            })
            .collect(),
        None => {
            let mut rng = StdRng::seed_from_u64(args.seed);
            let worlds_dir = args.output.join("worlds");
            (0..args.n_worlds)
                .map(|i| {
                    let rows = generate_gridworld(args.grid_size, args.block_probability, &mut rng)
                        .context("generating gridworld")?;
                    let path = worlds_dir.join(format!("gridworld_{i:02}.map"));
                    save_gridworld(&path, &rows)
                        .with_context(|| format!("saving {}", path.display()))?;
                    Ok(rows)
                })
                .collect()
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let algorithms = if args.algorithm.is_empty() {
        Algorithm::ALL.to_vec()
    } else {
        args.algorithm.clone()
    };

    let worlds = load_worlds(&args)?;
    let traces_dir = args.output.join("traces");
    fs::create_dir_all(&traces_dir)
        .with_context(|| format!("creating {}", traces_dir.display()))?;

    let mut records = Vec::new();
    for (i, rows) in worlds.into_iter().enumerate() {
        let world = GridMap::from_rows(rows).with_context(|| format!("gridworld {i}"))?;
        let n = world.size() as i32;
        let start = Point::new(0, 0);
        let goal = Point::new(n - 1, n - 1);
        for &algorithm in &algorithms {
            let replanner = algorithm.replanner();
            let before = Instant::now();
            let nav = replanner
                .navigate(&world, start, goal)
                .with_context(|| format!("{algorithm} on gridworld {i}"))?;
            let elapsed = before.elapsed();
            info!(
                "gridworld {i:02}, {algorithm}: {} in {:.2?}, trace {}, {} searches, {} expansions",
                if nav.success() { "reached" } else { "failed" },
                elapsed,
                nav.trace.len(),
                nav.stats.searches,
                nav.stats.expanded
            );

            let render_path = traces_dir.join(format!("gridworld_{i:02}_{algorithm}.txt"));
            fs::write(&render_path, world.render_trace(&nav.trace).to_string())
                .with_context(|| format!("writing {}", render_path.display()))?;
            records.push(RunRecord {
                world: i,
                algorithm: algorithm.name().to_owned(),
                grid_size: world.size(),
                success: nav.success(),
                trace_len: nav.trace.len(),
                searches: nav.stats.searches,
                expanded: nav.stats.expanded,
                backtracks: nav.stats.backtracks,
                runtime_secs: elapsed.as_secs_f64(),
            });
        }
    }

    let results = args.output.join("results.csv");
    write_records(&results, &records).with_context(|| format!("writing {}", results.display()))?;
    for algorithm in algorithms {
        let runs = records
            .iter()
            .filter(|r| r.algorithm == algorithm.name())
            .collect::<Vec<_>>();
        let reached = runs.iter().filter(|r| r.success).count();
        let runtime = runs.iter().map(|r| r.runtime_secs).sum::<f64>();
        let expanded = runs.iter().map(|r| r.expanded).sum::<usize>();
        info!(
            "{algorithm}: reached {reached}/{} goals, {expanded} expansions, {runtime:.3}s total",
            runs.len()
        );
    }
    info!("Results written to {}", results.display());
    Ok(())
}
