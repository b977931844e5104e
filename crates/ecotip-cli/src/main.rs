mod render;

use std::env;
use std::io::{self, BufRead, ErrorKind, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ecotip_contracts::activity::ActivityLog;
use ecotip_contracts::chat::{parse_command, ChatCommand, CHAT_HELP_COMMANDS};
use ecotip_contracts::events::EventWriter;
use ecotip_engine::{ApiKey, DryrunProvider, EcoSession, TipOutcome, TipProvider, TogetherProvider};

#[derive(Debug, Parser)]
#[command(
    name = "ecotip",
    version,
    about = "Daily carbon footprint calculator with AI eco tips"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive session: log activities, ask for tips, unlock the chart.
    Chat(ChatArgs),
    /// Evaluate one day of activities and exit.
    Run(RunArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderKind {
    Together,
    Dryrun,
}

#[derive(Debug, Args)]
struct ProviderArgs {
    #[arg(long, value_enum, default_value_t = ProviderKind::Together)]
    provider: ProviderKind,
    /// Chat model id; defaults to Mistral-7B-Instruct.
    #[arg(long)]
    model: Option<String>,
    /// API base URL (env: TOGETHER_API_BASE).
    #[arg(long)]
    api_base: Option<String>,
    /// API key (env: TOGETHER_API_KEY); prompted for in chat when absent.
    #[arg(long)]
    api_key: Option<String>,
    /// Append session events as JSONL to this file.
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[command(flatten)]
    provider: ProviderArgs,
}

#[derive(Debug, Parser)]
struct RunArgs {
    #[arg(long, default_value_t = 0.0)]
    car_km: f64,
    #[arg(long, default_value_t = 0)]
    meat_meals: u32,
    #[arg(long, default_value_t = 0.0)]
    electricity_kwh: f64,
    /// Ask the model for a tip.
    #[arg(long)]
    tip: bool,
    /// Unlock pro and print the per-activity chart.
    #[arg(long)]
    pro: bool,
    #[command(flatten)]
    provider: ProviderArgs,
}

const API_KEY_PROMPT: &str = "Enter your Together.ai API key: ";
const EXIT_TIP_FAILED: i32 = 2;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("ecotip error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Chat(args) => {
            run_chat_native(args)?;
            Ok(0)
        }
        Command::Run(args) => run_run_native(args),
    }
}

fn run_chat_native(args: ChatArgs) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let api_key = match args.provider.provider {
        ProviderKind::Dryrun => None,
        ProviderKind::Together => match configured_api_key(&args.provider) {
            Some(key) => Some(key),
            None => Some(
                prompt_for_api_key(&mut input, &mut out)?
                    .context("an API key is required to use the tip service")?,
            ),
        },
    };
    let mut session = open_session(&args.provider, api_key)?;
    run_chat_session(&mut session, &mut input, &mut out)
}

fn run_run_native(args: RunArgs) -> Result<i32> {
    let log = ActivityLog::new(args.car_km, args.meat_meals, args.electricity_kwh)
        .context("invalid activity values")?;
    let api_key = match (args.tip, args.provider.provider) {
        (true, ProviderKind::Together) => Some(configured_api_key(&args.provider).context(
            "missing API key: pass --api-key or set TOGETHER_API_KEY",
        )?),
        _ => None,
    };
    let mut session = open_session(&args.provider, api_key)?;
    session.record_activity(&log)?;
    println!("{}", render::metric_line(&log.estimate()));

    let mut code = 0;
    if args.tip {
        match session.generate_tip(&log)? {
            TipOutcome::Success(tip) => println!("{}", render::tip_card(&tip)),
            TipOutcome::Failure(failure) => {
                eprintln!("{}", render::failure_line(&failure));
                code = EXIT_TIP_FAILED;
            }
        }
    }
    if args.pro {
        session.unlock_pro()?;
    }
    println!(
        "{}",
        render::pro_panel(session.state().pro_unlocked(), &log)
    );
    session.finish()?;
    Ok(code)
}

fn open_session(args: &ProviderArgs, api_key: Option<ApiKey>) -> Result<EcoSession> {
    let provider: Box<dyn TipProvider> = match args.provider {
        ProviderKind::Dryrun => Box::new(DryrunProvider),
        ProviderKind::Together => {
            let api_base = args
                .api_base
                .clone()
                .or_else(|| first_non_empty_env(&["TOGETHER_API_BASE"]));
            Box::new(TogetherProvider::new(api_base.as_deref(), api_key))
        }
    };
    let events = EventWriter::for_new_session(args.events.clone());
    EcoSession::new(provider, args.model.clone(), events)
}

fn configured_api_key(args: &ProviderArgs) -> Option<ApiKey> {
    args.api_key
        .as_deref()
        .and_then(ApiKey::new)
        .or_else(|| first_non_empty_env(&["TOGETHER_API_KEY"]).and_then(ApiKey::new))
}

/// Asks until a non-blank key is entered. `None` on end of input.
fn prompt_for_api_key(input: &mut impl BufRead, out: &mut impl Write) -> Result<Option<ApiKey>> {
    let mut line = String::new();
    loop {
        write!(out, "{API_KEY_PROMPT}")?;
        out.flush()?;
        line.clear();
        if read_line(input, &mut line)? == 0 {
            return Ok(None);
        }
        if let Some(key) = ApiKey::new(&line) {
            return Ok(Some(key));
        }
        writeln!(out, "Please enter your API key to use EcoTip.")?;
    }
}

fn read_line(input: &mut impl BufRead, line: &mut String) -> Result<usize> {
    loop {
        match input.read_line(line) {
            Ok(read) => return Ok(read),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

fn run_chat_session(
    session: &mut EcoSession,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let mut log = ActivityLog::default();
    let mut line = String::new();

    writeln!(
        out,
        "EcoTip chat started ({}, {}). Type /help for commands.",
        session.provider_name(),
        session.model()
    )?;
    if let Some(path) = session.events_path() {
        writeln!(
            out,
            "Logging session {} to {}",
            session.session_id(),
            path.display()
        )?;
    }
    writeln!(out, "{}", render::metric_line(&log.estimate()))?;

    loop {
        write!(out, "> ")?;
        out.flush()?;

        line.clear();
        if read_line(input, &mut line)? == 0 {
            break;
        }

        let updated = match parse_command(line.trim_end_matches(['\n', '\r'])) {
            ChatCommand::Noop => continue,
            ChatCommand::Quit => break,
            ChatCommand::Help => {
                writeln!(out, "Commands: {}", CHAT_HELP_COMMANDS.join(" "))?;
                continue;
            }
            ChatCommand::SetCarKm(value) => log.with_car_km(value),
            ChatCommand::SetMeatMeals(value) => Ok(log.with_meat_meals(value)),
            ChatCommand::SetElectricityKwh(value) => log.with_electricity_kwh(value),
            ChatCommand::SetActivity {
                car_km,
                meat_meals,
                electricity_kwh,
            } => ActivityLog::new(car_km, meat_meals, electricity_kwh),
            ChatCommand::SetModel(model) => {
                session.set_model(&model);
                writeln!(out, "Model set to {}", session.model())?;
                continue;
            }
            ChatCommand::GenerateTip => {
                writeln!(out, "Getting your AI eco tip...")?;
                match session.generate_tip(&log)? {
                    TipOutcome::Success(tip) => writeln!(out, "{}", render::tip_card(&tip))?,
                    TipOutcome::Failure(failure) => {
                        writeln!(out, "{}", render::failure_line(&failure))?
                    }
                }
                continue;
            }
            ChatCommand::UnlockPro => {
                session.unlock_pro()?;
                writeln!(out, "{}", render::pro_panel(true, &log))?;
                continue;
            }
            ChatCommand::Show => {
                write_full_view(out, session, &log)?;
                continue;
            }
            ChatCommand::Invalid { reason, .. } => {
                writeln!(out, "{reason}")?;
                continue;
            }
            ChatCommand::Unknown { command, .. } if command.is_empty() => {
                writeln!(
                    out,
                    "Use /log <km> <meals> <kwh> to record your day, then /tip. Type /help for commands."
                )?;
                continue;
            }
            ChatCommand::Unknown { command, .. } => {
                writeln!(out, "Unknown command /{command}. Type /help for commands.")?;
                continue;
            }
        };

        match updated {
            Ok(next) => {
                log = next;
                session.record_activity(&log)?;
                writeln!(out, "{}", render::metric_line(&log.estimate()))?;
                if session.state().pro_unlocked() {
                    writeln!(out, "{}", render::bar_chart(&log.breakdown()))?;
                }
            }
            Err(err) => writeln!(out, "Invalid input: {err}")?,
        }
    }

    session.finish()?;
    writeln!(out)?;
    Ok(())
}

fn write_full_view(out: &mut impl Write, session: &EcoSession, log: &ActivityLog) -> Result<()> {
    writeln!(
        out,
        "Car travel: {} km | Meat meals: {} | Electricity: {} kWh",
        log.car_km(),
        log.meat_meals(),
        log.electricity_kwh()
    )?;
    writeln!(out, "{}", render::metric_line(&log.estimate()))?;
    if let Some(tip) = session.state().eco_tip() {
        writeln!(out, "{}", render::tip_card(tip))?;
    }
    writeln!(
        out,
        "{}",
        render::pro_panel(session.state().pro_unlocked(), log)
    )?;
    Ok(())
}

fn first_non_empty_env(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(value) = env::var(key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}
