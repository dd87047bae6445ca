//! # mc: MemberConnect from the terminal
//!
//! - `mc data "role=admin|smith"`: run a directory query on the hub.
//! - `mc user keala`: members whose email is `keala@...`.
//! - `mc filter --file people.json email`: run a query offline over an export.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use mc_core::{Combinator, FilterEngine, JsonExport, Record};
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Parser)]
#[command(name = "mc", version, about, long_about = None)]
struct Cli {
    /// Print raw JSON instead of a table.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the directory (`/data/<segment>`); no segment lists everyone.
    Data { segment: Option<String> },

    /// Members whose email local part is HANDLE.
    User { handle: String },

    /// A single member by `_id`.
    Member { id: String },

    /// List achievements.
    Achievements,

    /// Hub status as JSON.
    Status,

    /// Run a query offline against a JSON export of the people collection.
    Filter {
        /// JSON array of records.
        #[arg(long)]
        file: PathBuf,

        segment: Option<String>,

        #[arg(long, value_enum, default_value_t = CombinatorArg::Any)]
        combinator: CombinatorArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CombinatorArg {
    Any,
    All,
}

impl From<CombinatorArg> for Combinator {
    fn from(arg: CombinatorArg) -> Self {
        match arg {
            CombinatorArg::Any => Combinator::Any,
            CombinatorArg::All => Combinator::All,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Filter {
            file,
            segment,
            combinator,
        } => run_filter(&file, segment.as_deref(), combinator.into(), cli.json),
        Commands::Data { segment } => fetch(data_path(segment), cli.json),
        Commands::User { handle } => fetch(vec!["user".into(), handle], cli.json),
        Commands::Member { id } => fetch(vec!["getMember".into(), id], cli.json),
        Commands::Achievements => fetch(vec!["achievements".into()], cli.json),
        Commands::Status => fetch(vec!["api".into(), "status".into()], cli.json),
    }
}

/// `/data` or `/data/<segment>`; an empty segment lists everyone.
fn data_path(segment: Option<String>) -> Vec<String> {
    let mut path = vec!["data".to_string()];
    path.extend(segment.filter(|s| !s.is_empty()));
    path
}

/// Run a query offline over a JSON export.
fn run_filter(file: &Path, segment: Option<&str>, combinator: Combinator, json: bool) -> ExitCode {
    let engine = FilterEngine::default().with_combinator(combinator);
    let response = match engine.query(&JsonExport::new(file), segment.unwrap_or("")) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}: {}", file.display(), e);
            return ExitCode::from(2);
        }
    };
    for err in &response.invalid_keys {
        eprintln!("warning: {} (missing on {} record(s))", err, err.records);
    }
    print_records(&response.records, json);
    if response.invalid_keys.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// GET a hub endpoint on a current-thread runtime.
fn fetch(segments: Vec<String>, json: bool) -> ExitCode {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to build tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    match rt.block_on(async_main(segments, json)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn async_main(segments: Vec<String>, json: bool) -> Result<ExitCode, reqwest::Error> {
    let client = reqwest::Client::new();
    let base_url =
        std::env::var("MC_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:9696".to_string());

    let Some(url) = endpoint(&base_url, &segments) else {
        eprintln!("Error: invalid MC_BASE_URL '{}'", base_url);
        return Ok(ExitCode::FAILURE);
    };

    let resp = client.get(url).send().await?;
    let status = resp.status();
    let body = resp.json::<serde_json::Value>().await?;

    if !status.is_success() {
        report_error(&body);
        return Ok(ExitCode::FAILURE);
    }

    let records = match &body {
        serde_json::Value::Array(_) => serde_json::from_value::<Vec<Record>>(body.clone()).ok(),
        serde_json::Value::Object(_) => Record::try_from(body.clone()).ok().map(|r| vec![r]),
        _ => None,
    };
    match records {
        Some(records) if !json => print_records(&records, false),
        _ => println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default()),
    }
    Ok(ExitCode::SUCCESS)
}

/// Join path segments onto the base URL, percent-encoding each one.
fn endpoint(base_url: &str, segments: &[String]) -> Option<reqwest::Url> {
    let mut url = reqwest::Url::parse(base_url).ok()?;
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(segments.iter().map(String::as_str));
    Some(url)
}

fn report_error(body: &serde_json::Value) {
    let messages: Vec<&serde_json::Value> = match body {
        serde_json::Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    for m in messages {
        let text = m
            .get("message")
            .or_else(|| m.get("error"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| m.to_string());
        eprintln!("Error: {}", text);
    }
}

fn print_records(records: &[Record], json: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(records).unwrap_or_default()
        );
    } else {
        println!("{}", render_table(records));
    }
}

/// One column per field seen, in first-seen order.
fn render_table(records: &[Record]) -> String {
    if records.is_empty() {
        return "(no records)".to_string();
    }

    let mut columns: Vec<&str> = Vec::new();
    for field in records.iter().flat_map(|r| r.fields()) {
        if !columns.contains(&field) {
            columns.push(field);
        }
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.to_string()));
    for record in records {
        builder.push_record(
            columns
                .iter()
                .map(|c| record.text(c).map(|t| t.into_owned()).unwrap_or_default()),
        );
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}
