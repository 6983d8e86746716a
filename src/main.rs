use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use opening_hand::card::Card;
use opening_hand::simulation::{
    deck_summary, parse_condition_arg, parse_deck_file, ConditionSet, SimulationParams,
    SimulationReport, Simulator,
};
use opening_hand::simulation::engine::{
    DEFAULT_HAND_SIZE, DEFAULT_MULLIGANS, DEFAULT_TRACKED_EXTRA, DEFAULT_TRIALS,
};

#[derive(Parser)]
#[command(name = "opening-hand")]
#[command(about = "Opening hand probability simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate how often a deck's opening hand meets the conditions
    Run {
        /// Deck list file ("COUNT,NAME,TYPE TYPE ..." per line)
        #[arg(short, long, default_value = "deck.txt")]
        deck: String,

        #[command(flatten)]
        options: SimOptions,

        /// Write the full report as JSON
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Compare two decks against the same conditions
    Compare {
        /// First deck file
        deck1: String,

        /// Second deck file
        deck2: String,

        #[command(flatten)]
        options: SimOptions,
    },
}

#[derive(Args)]
struct SimOptions {
    /// Condition set JSON file ({"Land": {"min": 2, "max": 4}, ...})
    #[arg(short, long)]
    conditions: Option<String>,

    /// Extra condition as TYPE:MIN-MAX, TYPE:MIN+ or TYPE:N (repeatable)
    #[arg(short, long = "require", value_name = "CONDITION")]
    require: Vec<String>,

    /// Save the combined condition set to a JSON file
    #[arg(long)]
    save_conditions: Option<String>,

    /// Cards in the opening hand
    #[arg(long, default_value_t = DEFAULT_HAND_SIZE)]
    hand_size: usize,

    /// Mulligans allowed; each one draws a fresh hand with one card fewer
    #[arg(short, long, default_value_t = DEFAULT_MULLIGANS)]
    mulligans: usize,

    /// Number of trials
    #[arg(short = 'n', long, default_value_t = DEFAULT_TRIALS)]
    trials: usize,

    /// Hand sizes reported beyond the opening hand size
    #[arg(long, default_value_t = DEFAULT_TRACKED_EXTRA)]
    tracked_extra: usize,

    /// Seed for random number generator (for reproducibility)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

impl SimOptions {
    fn params(&self) -> SimulationParams {
        SimulationParams {
            start_hand_size: self.hand_size,
            max_mulligans: self.mulligans,
            trials: self.trials,
            tracked_extra: self.tracked_extra,
        }
    }

    /// The condition file (if any) with --require entries layered on top
    fn condition_set(&self) -> Result<ConditionSet, String> {
        let mut conditions = match &self.conditions {
            Some(path) => ConditionSet::from_json_file(path)
                .map_err(|e| format!("Failed to load conditions '{}': {}", path, e))?,
            None => ConditionSet::new(),
        };
        for arg in &self.require {
            let (tag, condition) = parse_condition_arg(arg).map_err(|e| e.to_string())?;
            conditions.insert(tag, condition);
        }
        conditions.validate().map_err(|e| e.to_string())?;

        if let Some(path) = &self.save_conditions {
            conditions
                .save_to_file(path)
                .map_err(|e| format!("Failed to save conditions '{}': {}", path, e))?;
            println!("Conditions saved to: {}", path);
        }
        Ok(conditions)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            deck,
            options,
            output,
        } => run_simulation(&deck, &options, output.as_deref()),
        Commands::Compare {
            deck1,
            deck2,
            options,
        } => compare_decks(&deck1, &deck2, &options),
    };

    if let Err(e) = result {
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
}

fn load_deck(path: &str) -> Result<Vec<Card>, String> {
    parse_deck_file(path).map_err(|e| format!("Failed to parse deck file '{}': {}", path, e))
}

fn progress_bar(trials: usize, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(trials as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} trials")
    {
        bar.set_style(style);
    }
    bar
}

fn simulate_deck(
    deck: &[Card],
    conditions: &ConditionSet,
    options: &SimOptions,
) -> Result<SimulationReport, String> {
    let params = options.params();
    let progress = progress_bar(params.trials, options.quiet);
    let report = Simulator::new(deck, conditions, params)
        .with_seed(options.seed)
        .with_progress(progress.clone())
        .run()
        .map_err(|e| e.to_string());
    progress.finish_and_clear();
    report
}

fn run_simulation(deck_file: &str, options: &SimOptions, output: Option<&str>) -> Result<(), String> {
    let deck = load_deck(deck_file)?;
    let conditions = options.condition_set()?;

    println!("\n=== Opening Hand Simulator ===\n");
    println!("Deck: {} ({} cards)", deck_file, deck.len());
    for (tag, count) in deck_summary(&deck) {
        println!("  {:16} {:3}", tag, count);
    }
    println!();

    let report = simulate_deck(&deck, &conditions, options)?;

    println!("=== Results ===\n");
    print!("{}", report);
    println!();
    println!("Seed: {}", report.seed);
    match report.trials_per_sec() {
        Some(rate) => println!(
            "Simulation completed in {:.2}s ({:.0} trials/sec)",
            report.elapsed_secs, rate
        ),
        None => println!("Simulation completed in {:.2}s", report.elapsed_secs),
    }

    if let Some(path) = output {
        report
            .save_to_file(path)
            .map_err(|e| format!("Failed to save report '{}': {}", path, e))?;
        println!("\nReport saved to: {}", path);
    }
    Ok(())
}

fn compare_decks(deck1_file: &str, deck2_file: &str, options: &SimOptions) -> Result<(), String> {
    let deck1 = load_deck(deck1_file)?;
    let deck2 = load_deck(deck2_file)?;
    let conditions = options.condition_set()?;

    println!("\n=== Opening Hand Comparison ===\n");
    println!("Deck 1: {} ({} cards)", deck1_file, deck1.len());
    println!("Deck 2: {} ({} cards)", deck2_file, deck2.len());
    println!("Conditions: {}", conditions);
    println!("Trials per deck: {}", options.trials);
    println!();

    println!("Running deck 1...");
    let report1 = simulate_deck(&deck1, &conditions, options)?;
    println!("Running deck 2...");
    let report2 = simulate_deck(&deck2, &conditions, options)?;

    println!("\n=== Results ===\n");
    println!("{:10} {:>12} {:>12} {:>9}", "Cards", "Deck 1", "Deck 2", "Diff");
    println!("{:-<46}", "");
    for ((bucket, p1), (_, p2)) in report1.results.iter().zip(report2.results.iter()) {
        println!(
            "{:10} {:>11.2}% {:>11.2}% {:>+8.2}%",
            bucket,
            p1 * 100.0,
            p2 * 100.0,
            (p2 - p1) * 100.0
        );
    }

    println!();
    let final1 = report1.results.final_probability().unwrap_or(0.0);
    let final2 = report2.results.final_probability().unwrap_or(0.0);
    if final1 > final2 {
        println!("✓ {} succeeds {:.2}% more often", deck1_file, (final1 - final2) * 100.0);
    } else if final2 > final1 {
        println!("✓ {} succeeds {:.2}% more often", deck2_file, (final2 - final1) * 100.0);
    } else {
        println!("Both decks have the same success rate");
    }
    Ok(())
}
