use std::path::PathBuf;
use clap::{Parser, ValueEnum};
use log::{debug, error, info, LevelFilter};
use rand::rngs::StdRng;
use rand::SeedableRng;
use hyperplay::arena::play_match;
use hyperplay::config::AgentConfig;
use hyperplay::games::krieg_tictactoe::KriegTicTacToe;
use hyperplay::games::rps::Rps;
use hyperplay::player::{build_agent, PlayerKind};
use hyperplay::utils::Game;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GameKind {
    Rps,
    Krieg,
}

/// Play HyperPlay agents against each other on a demo game
#[derive(Parser, Debug)]
#[command(name = "hyperplay", version, about)]
struct Args {
    #[arg(long, value_enum, default_value = "rps")]
    game: GameKind,

    /// Rounds of Rock-Paper-Scissors
    #[arg(long, default_value_t = 3)]
    rounds: u8,

    /// One player kind per role, in role order
    #[arg(long, value_enum, num_args = 1.., default_values_t = [PlayerKind::HyperPlay, PlayerKind::Random])]
    players: Vec<PlayerKind>,

    #[arg(long, default_value_t = 5000)]
    playclock_ms: u64,

    #[arg(long, default_value_t = 1)]
    matches: usize,

    #[arg(long)]
    seed: Option<u64>,

    /// Agent options as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra option passed to every agent at game start, as key=value
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,

    #[arg(long)]
    telemetry_dir: Option<PathBuf>,

    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected key=value, got {:?}", s))
}

fn init_logging(log_file: Option<&PathBuf>) -> hyperplay::Result<()> {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    let mut loggers: Vec<Box<dyn simplelog::SharedLogger>> = vec![simplelog::TermLogger::new(
        LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        loggers.push(simplelog::WriteLogger::new(LevelFilter::Debug, config, std::fs::File::create(path)?));
    }
    simplelog::CombinedLogger::init(loggers)
        .map_err(|e| hyperplay::HyperPlayError::Config(format!("logger: {}", e)))
}

fn run<G: Game + 'static>(game: G, args: &Args, config: &AgentConfig) -> hyperplay::Result<()> {
    debug!("agent config: {}", config.to_json()?);
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut totals = vec![0i64; args.players.len()];
    for m in 0..args.matches {
        let mut agents: Vec<_> = args.players.iter()
            .enumerate()
            .map(|(i, &kind)| {
                let seeded = AgentConfig { seed: config.seed.map(|s| s + i as u64), ..config.clone() };
                build_agent(kind, game.clone(), &seeded)
            })
            .collect();
        let match_id = format!("{}-{}", game.name(), m);
        let result = play_match(&game, &mut agents, &match_id, args.playclock_ms, &args.params, &mut rng)?;
        for (i, (_, goal)) in result.goals.iter().enumerate() {
            totals[i] += *goal as i64;
        }
        info!("{}: goals {:?}, {} fallbacks", match_id, result.goals, result.fallbacks);
    }
    for (kind, total) in args.players.iter().zip(&totals) {
        info!("{}: average goal {:.1}", kind, *total as f64 / args.matches.max(1) as f64);
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = init_logging(args.log_file.as_ref()) {
        eprintln!("{}", e);
    }
    let config = match &args.config {
        Some(path) => AgentConfig::from_file(path),
        None => Ok(AgentConfig::default()),
    };
    let outcome = config.and_then(|mut config| {
        config.seed = args.seed.or(config.seed);
        if args.telemetry_dir.is_some() {
            config.telemetry_dir = args.telemetry_dir.clone();
        }
        match args.game {
            GameKind::Rps => run(Rps::new(args.rounds), &args, &config),
            GameKind::Krieg => run(KriegTicTacToe, &args, &config),
        }
    });
    if let Err(e) = outcome {
        error!("{}", e);
        std::process::exit(1);
    }
}
