//! CLI interface for rust-itinerary

use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_itinerary::{
    decorate, extract_content_from_str, BudgetEstimate, BudgetTier, CityRecommendation, DropPolicy,
    ItineraryEntry, Normalized, Normalizer, PlaceRecommendation, PlannerConfig, SeatCell,
    SeatLayout, SeatMap, Session, StaticSession, TravelPlanner, TravellerType, TripPlan,
    TripRequest,
};
use serde::Serialize;
use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rust-itinerary")]
#[command(about = "AI travel planning from the command line")]
#[command(version)]
pub struct Cli {
    /// JSON config file
    #[arg(long, global = true, default_value = "planner.json")]
    pub config: PathBuf,
    /// How to treat records that fail validation (silent, warn, strict)
    #[arg(long, global = true)]
    pub drop_policy: Option<String>,
    /// Output file for JSON results
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a day-by-day itinerary
    Plan {
        /// Destination city or region
        #[arg(short, long)]
        destination: String,
        /// Start date (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,
        /// End date (YYYY-MM-DD)
        #[arg(short, long)]
        end: String,
        /// Only show entries for this day label
        #[arg(long)]
        day: Option<String>,
        /// Signed-in user's id, forwarded to the provider
        #[arg(long, requires = "email")]
        uid: Option<String>,
        /// Signed-in user's email
        #[arg(long)]
        email: Option<String>,
    },
    /// Generate a structured plan with hotels and local transport
    Trip {
        /// Destination city or region
        #[arg(short, long)]
        destination: String,
        /// Start date (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,
        /// End date (YYYY-MM-DD)
        #[arg(short, long)]
        end: String,
        /// Free-text preferences (e.g. "vegetarian food, no trekking")
        #[arg(short, long)]
        preferences: Option<String>,
        /// Who is travelling (solo, couple, family, friends)
        #[arg(long, requires = "budget")]
        travellers: Option<String>,
        /// Budget tier (budget, moderate, luxury)
        #[arg(long, requires = "travellers")]
        budget: Option<String>,
    },
    /// Recommend must-visit places
    Places {
        /// Region or city to search
        query: String,
        /// Attach display-only ratings and image placeholders
        #[arg(long)]
        decorate: bool,
    },
    /// Recommend cities with their must-visit places
    Cities {
        /// Region to search
        query: String,
    },
    /// Normalize a saved completion response without calling the provider
    Parse {
        /// Record kind to produce
        #[arg(short, long, value_enum, default_value = "itinerary")]
        kind: RecordKind,
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,
        /// Input is a full provider response, not just the message text
        #[arg(long)]
        envelope: bool,
    },
    /// Print a mock bus seat map
    Seats {
        /// Share of seats left available (0.0-1.0)
        #[arg(long)]
        ratio: Option<f64>,
        /// Seed for a reproducible map
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RecordKind {
    Itinerary,
    Places,
    Cities,
    TripPlan,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("rust_itinerary=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rust_itinerary=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<PlannerConfig, Box<dyn std::error::Error>> {
    let mut config = PlannerConfig::load(&cli.config)?.with_env_overrides();
    if let Some(policy) = &cli.drop_policy {
        config.drop_policy = policy.parse::<DropPolicy>()?;
    }
    Ok(config)
}

fn emit<T: Serialize>(value: &T, output: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    emit_to(value, output, &mut std::io::stdout().lock())
}

/// JSON goes to `output` or `stdout`; status text always goes to stderr.
fn emit_to<T: Serialize, W: Write>(
    value: &T,
    output: Option<&PathBuf>,
    stdout: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(output_file) = output {
        fs::write(output_file, &json)?;
        eprintln!("Results saved to {}", output_file.display());
    } else {
        writeln!(stdout, "{}", json)?;
    }
    Ok(())
}

fn report_dropped<R>(normalized: &Normalized<R>) {
    if !normalized.is_complete() {
        eprintln!(
            "Note: {} record(s) could not be read and were left out",
            normalized.dropped_count()
        );
    }
}

fn print_seat_grid(map: &SeatMap) -> Result<(), Box<dyn std::error::Error>> {
    for row in map.layout.grid()? {
        let line: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                SeatCell::Seat(id) if map.is_booked(id) => format!("[{:>3}x]", id),
                SeatCell::Seat(id) => format!("[{:>4}]", id),
                SeatCell::Driver => " DRVR ".to_string(),
                SeatCell::Entrance => " DOOR ".to_string(),
                SeatCell::Aisle => "      ".to_string(),
            })
            .collect();
        println!("{}", line.join(" "));
    }
    println!("\nAvailable: {}  Booked: {}", map.available.len(), map.booked.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(&cli)?;
    let output = cli.output.as_ref();

    match cli.command {
        Commands::Plan {
            ref destination,
            ref start,
            ref end,
            ref day,
            ref uid,
            ref email,
        } => {
            let trip = TripRequest::new(destination, start, end)?;
            let planner = match (uid, email) {
                (Some(uid), Some(email)) => {
                    let session = Session::from_identity(uid, email, None);
                    TravelPlanner::new(&config, Arc::new(StaticSession(session)))?
                }
                _ => TravelPlanner::from_config(&config)?,
            };

            eprintln!("Planning {} day(s) in {}...", trip.num_days(), trip.destination);
            match planner.plan_itinerary(&trip).await {
                Ok(itinerary) => {
                    if let Some(day) = day {
                        let entries: Vec<&ItineraryEntry> = itinerary.filter_day(day).collect();
                        emit(&entries, output)?;
                    } else {
                        emit(&itinerary, output)?;
                    }
                    eprintln!("Days: {}", itinerary.days().join(", "));
                    if !itinerary.dropped.is_empty() {
                        eprintln!("Note: {} line(s) could not be read and were left out", itinerary.dropped.len());
                    }
                }
                Err(e) => {
                    eprintln!("Error generating itinerary: {}", e);
                    if e.is_retryable() {
                        eprintln!("Please try again.");
                    }
                    std::process::exit(1);
                }
            }
        }
        Commands::Trip {
            ref destination,
            ref start,
            ref end,
            ref preferences,
            ref travellers,
            ref budget,
        } => {
            let trip = TripRequest::new(destination, start, end)?;
            let estimate = match (travellers, budget) {
                (Some(travellers), Some(budget)) => Some(BudgetEstimate::new(
                    trip.num_days(),
                    travellers.parse::<TravellerType>()?,
                    budget.parse::<BudgetTier>()?,
                )?),
                _ => None,
            };

            let planner = TravelPlanner::from_config(&config)?;
            eprintln!("Planning a {}-day trip to {}...", trip.num_days(), trip.destination);
            match planner.plan_trip(&trip, preferences.as_deref()).await {
                Ok(plan) => {
                    report_dropped(&plan);
                    emit(
                        &serde_json::json!({
                            "trip": &trip,
                            "budget": estimate,
                            "plan": plan.records.first(),
                        }),
                        output,
                    )?;
                    if let Some(estimate) = estimate {
                        eprintln!("Estimated budget: {}", estimate);
                    }
                }
                Err(e) => {
                    eprintln!("Error generating trip plan: {}", e);
                    if e.is_retryable() {
                        eprintln!("Please try again.");
                    }
                    std::process::exit(1);
                }
            }
        }
        Commands::Places { ref query, decorate: with_decorations } => {
            let planner = TravelPlanner::from_config(&config)?;
            match planner.recommend_places(query).await {
                Ok(places) => {
                    report_dropped(&places);
                    if with_decorations {
                        let decorated = decorate(places.records, &mut rand::thread_rng());
                        emit(&decorated, output)?;
                    } else {
                        emit(&places.records, output)?;
                    }
                }
                Err(e) => {
                    eprintln!("Error recommending places: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Cities { ref query } => {
            let planner = TravelPlanner::from_config(&config)?;
            match planner.recommend_cities(query).await {
                Ok(cities) => {
                    report_dropped(&cities);
                    emit(&cities.records, output)?;
                }
                Err(e) => {
                    eprintln!("Error recommending cities: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Parse { kind, ref input, envelope } => {
            let mut raw = String::new();
            match input {
                Some(path) => raw = fs::read_to_string(path)?,
                None => {
                    std::io::stdin().read_to_string(&mut raw)?;
                }
            }
            let text = if envelope { extract_content_from_str(&raw)? } else { raw };

            let parser = config.parser()?;
            let normalizer = Normalizer::new(config.drop_policy);
            match kind {
                RecordKind::Itinerary => {
                    let normalized = normalizer.normalize::<ItineraryEntry>(parser.parse(&text)?)?;
                    report_dropped(&normalized);
                    emit(&normalized, output)?;
                }
                RecordKind::Places => {
                    let normalized = normalizer.normalize::<PlaceRecommendation>(parser.parse(&text)?)?;
                    report_dropped(&normalized);
                    emit(&normalized, output)?;
                }
                RecordKind::Cities => {
                    let normalized = normalizer.normalize::<CityRecommendation>(parser.parse(&text)?)?;
                    report_dropped(&normalized);
                    emit(&normalized, output)?;
                }
                RecordKind::TripPlan => {
                    let normalized = normalizer.normalize::<TripPlan>(parser.parse_object(&text)?)?;
                    report_dropped(&normalized);
                    emit(&normalized, output)?;
                }
            }
        }
        Commands::Seats { ratio, seed } => {
            let ratio = ratio.unwrap_or(config.seat_availability_ratio);
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let map = SeatMap::generate(SeatLayout::bus(), ratio, &mut rng)?;
            if output.is_some() {
                emit(&map, output)?;
            } else {
                print_seat_grid(&map)?;
            }
        }
    }

    Ok(())
}
