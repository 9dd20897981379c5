//! Command-line driver: reads 80-column observations, scores each
//! tracklet against the population model, and prints one line per
//! object.

use std::io::{BufRead, BufReader};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use tracing::{error, info, warn};

use digest2::config::OutputOptions;
use digest2::{
    observers, split_tracklets, Digest2Config, Digest2Error, Lcg, ParallaxMap, PlatformRng,
    PopulationFile, Scores, Solver, SolverRng, Tracklet, CLASS_LIST, MODEL_FILE_NAME,
    REPEATABLE_SEED,
};

const OBS_CODES_FILE_NAME: &str = "digest2.obscodes";
const CONFIG_FILE_NAME: &str = "digest2.config";

/// Orbit-class scores for short-arc astrometry.
///
/// Input is a file of observations in the MPC 80-column format, at
/// least two per object, grouped by object and sorted by time. Output
/// is one line of orbit-class scores per object.
#[derive(Parser)]
#[command(name = "digest2", version, about)]
struct Cli {
    /// Configuration file
    #[arg(short = 'c', value_name = "config-file")]
    config: Option<Utf8PathBuf>,

    /// Population model file
    #[arg(short = 'm', value_name = "model-file")]
    model: Option<Utf8PathBuf>,

    /// Observatory code file
    #[arg(short = 'o', value_name = "obscode-file")]
    obscodes: Option<Utf8PathBuf>,

    /// Common path for the three data files
    #[arg(short = 'p', value_name = "path", default_value = ".")]
    path: Utf8PathBuf,

    /// Observations in the MPC 80-column format, or - for stdin
    obs_file: String,
}

impl Cli {
    /// A `-c`/`-m`/`-o` path wins outright; otherwise the default file
    /// name under `-p`.
    fn data_file(&self, explicit: &Option<Utf8PathBuf>, default_name: &str) -> Utf8PathBuf {
        match explicit {
            Some(path) => path.clone(),
            None => self.path.join(default_name),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Digest2Error> {
    let sites = load_obs_codes(&cli.data_file(&cli.obscodes, OBS_CODES_FILE_NAME))?;
    let model = PopulationFile::read(&cli.data_file(&cli.model, MODEL_FILE_NAME))?;

    let config_path = cli.data_file(&cli.config, CONFIG_FILE_NAME);
    let config = if cli.config.is_some() || config_path.exists() {
        Digest2Config::from_file(&config_path, &sites)?
    } else {
        Digest2Config::default()
    };

    let solver = Solver::new(
        model,
        config.class_compute.clone(),
        config.obs_err_map.clone(),
        config.obs_err_default,
    )?;

    let tracklets = if cli.obs_file == "-" {
        split_tracklets(std::io::stdin().lock(), &sites)?
    } else {
        split_tracklets(BufReader::new(std::fs::File::open(&cli.obs_file)?), &sites)?
    };
    info!("{} tracklets to score", tracklets.len());

    // headings go out only after every input has loaded cleanly
    print_headings(&config.output);
    for line in solve_all(&solver, &tracklets, &config) {
        println!("{line}");
    }
    Ok(())
}

fn load_obs_codes(path: &Utf8Path) -> Result<ParallaxMap, Digest2Error> {
    match observers::load_obs_codes(path) {
        Ok(map) => Ok(map),
        Err(read_err) => {
            // no usable file on disk: try a fresh copy from the MPC
            warn!("{read_err}; fetching {}", observers::OBS_CODES_URL);
            observers::fetch_obs_codes(path)?;
            observers::load_obs_codes(path)
        }
    }
}

/// Score every tracklet on a pool of worker threads, one output line
/// each, in input order.
fn solve_all(solver: &Solver, tracklets: &[Tracklet], config: &Digest2Config) -> Vec<String> {
    let workers = std::thread::available_parallelism()
        .map(usize::from)
        .unwrap_or(1)
        .min(tracklets.len().max(1));

    let cursor = AtomicUsize::new(0);
    let mut results: Vec<Option<String>> = vec![None; tracklets.len()];
    let (tx, rx) = mpsc::channel::<(usize, String)>();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let cursor = &cursor;
            scope.spawn(move || {
                let mut lcg = Lcg::default();
                let mut platform = PlatformRng::from_clock();
                loop {
                    let index = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(tracklet) = tracklets.get(index) else {
                        return;
                    };
                    let rng: &mut dyn SolverRng = if config.repeatable {
                        lcg.reseed(REPEATABLE_SEED);
                        &mut lcg
                    } else {
                        &mut platform
                    };
                    let line = match solver.solve(tracklet, tracklet.mean_vmag(), rng) {
                        Ok((rms, scores)) => format_line(tracklet, rms, &scores, config),
                        Err(err) => {
                            warn!("{}: {err}", tracklet.designation);
                            format!("{:>7} ---", tracklet.designation)
                        }
                    };
                    if tx.send((index, line)).is_err() {
                        return;
                    }
                }
            });
        }
        drop(tx);
        for (index, line) in rx {
            results[index] = Some(line);
        }
    });

    results.into_iter().flatten().collect()
}

fn print_headings(output: &OutputOptions) {
    if !output.headings {
        return;
    }
    println!("digest2 version {} Rust source.", env!("CARGO_PKG_VERSION"));

    // first line: class tags over their raw/no-ID column pairs
    if output.raw && output.noid && !output.class_columns.is_empty() {
        let mut line = "-------".to_string();
        if output.rms {
            line.push_str("  ----");
        }
        for &c in &output.class_columns {
            line.push_str(&format!("   {:3}  ", CLASS_LIST[c].abbr));
        }
        if output.class_possible {
            line.push_str(" ---------------");
        }
        println!("{line}");
    }

    // second line: column labels
    let mut line = "Desig. ".to_string();
    if output.rms {
        line.push_str("   RMS");
    }
    for &c in &output.class_columns {
        if output.raw && output.noid {
            line.push_str(" Raw NID");
        } else {
            line.push_str(&format!(" {:3}", CLASS_LIST[c].abbr));
        }
    }
    if output.class_possible {
        if output.class_columns.is_empty() {
            line.push_str(" Possibilities");
        } else {
            line.push_str(" Other Possibilities");
        }
    }
    println!("{line}");
}

fn format_line(
    tracklet: &Tracklet,
    rms: f64,
    scores: &[Scores],
    config: &Digest2Config,
) -> String {
    let output = &config.output;
    let mut line = format!("{:>7}", tracklet.designation);

    if output.rms {
        let rs = format!(" {rms:5.2}");
        if rs.len() == 6 {
            line.push_str(&rs);
        } else {
            line.push_str(" **.**");
        }
    }

    if output.class_possible {
        // dedicated columns first; scores cover the whole class list
        for &c in &output.class_columns {
            let cs = scores[c];
            if output.raw {
                line.push_str(&format!(" {:3.0}", cs.raw));
            }
            if output.noid {
                line.push_str(&format!(" {:3.0}", cs.no_id));
            }
        }
        // then everything else that shows any possibility at all
        for (c, entry) in CLASS_LIST.iter().enumerate() {
            if output.class_columns.contains(&c) {
                continue;
            }
            let cs = scores[c];
            let score = if output.noid { cs.no_id } else { cs.raw };
            if score > 0.5 {
                line.push_str(&format!(" ({} {score:.0})", entry.abbr));
            } else if score > 0. {
                line.push_str(&format!(" ({} <1)", entry.abbr));
            }
        }
    } else {
        // restricted class list: scores are positional
        for cs in scores {
            if output.raw {
                line.push_str(&format!(" {:3.0}", cs.raw));
            }
            if output.noid {
                line.push_str(&format!(" {:3.0}", cs.no_id));
            }
        }
    }
    line
}
