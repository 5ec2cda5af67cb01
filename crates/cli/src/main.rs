// Griya CLI - house price estimates from a trained model artifact

mod exit_codes;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use griya_cli::batch::run_batch;
use griya_cli::server::PredictionServer;
use griya_cli::util::{render_form, render_summary};
use griya_cli::{Service, ServiceOptions};
use griya_config::Settings;
use griya_core::{City, FormProfile, Furnishing, PropertyRecord};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use exit_codes::{
    submit_exit_code, EXIT_CONFIG, EXIT_ERROR, EXIT_IO, EXIT_MODEL_LOAD, EXIT_SUCCESS,
};

#[derive(Parser)]
#[command(name = "griya")]
#[command(about = "House price estimates that adapt to the model's input schema")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/griya/settings.toml)
    #[arg(long, global = true, env = "GRIYA_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Model artifact, overriding model_path from settings
    #[arg(long, global = true, env = "GRIYA_MODEL", value_name = "PATH")]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the price of one property
    #[command(after_help = "\
Examples:
  griya predict --bedrooms 4 --city 'Jakarta Selatan' --furnishing furnished
  griya predict --land-size 120 --building-size 150 --validate-sizes
  griya predict --profile full --carports 2 --garages 1 --json")]
    Predict {
        #[command(flatten)]
        record: RecordArgs,

        #[command(flatten)]
        behaviour: BehaviourArgs,

        /// Print the result as a single JSON object on stdout
        #[arg(long)]
        json: bool,

        /// Skip the input summary on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Estimate every row of a CSV file (headers are field names)
    #[command(after_help = "\
Examples:
  griya batch listings.csv -o priced.csv
  griya batch listings.csv --validate-sizes > priced.csv")]
    Batch {
        input: PathBuf,

        /// Output file (omit for stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[command(flatten)]
        behaviour: BehaviourArgs,
    },

    /// Show the columns the loaded model expects and how they were classified
    Schema {
        #[arg(long)]
        json: bool,
    },

    /// Describe the form fields, ranges and defaults
    Form {
        /// Form profile (default: from settings)
        #[arg(long)]
        profile: Option<FormProfile>,

        #[arg(long)]
        json: bool,
    },

    /// Serve estimates over JSONL/TCP
    Serve {
        /// Listen address (default: server.bind from settings)
        #[arg(long)]
        bind: Option<String>,

        #[arg(long)]
        max_connections: Option<usize>,
    },

    /// Inspect or create the settings file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective settings
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Print the settings file path
    Path,
    /// Write a commented default settings file
    Init,
}

/// Form inputs. Anything omitted takes the profile's default.
#[derive(Args, Debug, Default)]
struct RecordArgs {
    #[arg(long)]
    bedrooms: Option<u32>,
    #[arg(long)]
    bathrooms: Option<u32>,
    /// Land size in m²
    #[arg(long)]
    land_size: Option<f64>,
    /// Building size in m²
    #[arg(long)]
    building_size: Option<f64>,
    #[arg(long)]
    floors: Option<u32>,
    /// City label, e.g. 'Jakarta Barat'
    #[arg(long)]
    city: Option<City>,
    /// baru | furnished | 'semi furnished' | unfurnished
    #[arg(long)]
    furnishing: Option<Furnishing>,
    #[arg(long)]
    carports: Option<u32>,
    /// Building age in years
    #[arg(long)]
    building_age: Option<u32>,
    #[arg(long)]
    garages: Option<u32>,
}

impl RecordArgs {
    fn into_record(self, profile: FormProfile) -> PropertyRecord {
        let mut record = profile.default_record();
        if let Some(v) = self.bedrooms {
            record.bedrooms = v;
        }
        if let Some(v) = self.bathrooms {
            record.bathrooms = v;
        }
        if let Some(v) = self.land_size {
            record.land_size_m2 = v;
        }
        if let Some(v) = self.building_size {
            record.building_size_m2 = v;
        }
        if let Some(v) = self.floors {
            record.floors = v;
        }
        if let Some(v) = self.city {
            record.city = v;
        }
        if let Some(v) = self.furnishing {
            record.furnishing = v;
        }
        record.carports = self.carports.or(record.carports);
        record.building_age = self.building_age.or(record.building_age);
        record.garages = self.garages.or(record.garages);
        record
    }
}

/// Per-invocation overrides of settings.
#[derive(Args, Debug, Default)]
struct BehaviourArgs {
    /// Form profile (default: from settings)
    #[arg(long)]
    profile: Option<FormProfile>,

    /// Reject building sizes larger than the land
    #[arg(long)]
    validate_sizes: bool,

    /// Require the encoded input to carry exactly the model's columns
    #[arg(long)]
    strict: bool,
}

impl BehaviourArgs {
    fn apply(&self, settings: &Settings) -> ServiceOptions {
        let mut options = ServiceOptions::from_settings(settings);
        if let Some(profile) = self.profile {
            options.profile = profile;
        }
        options.validate_sizes |= self.validate_sizes;
        options.strict_schema |= self.strict;
        options
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\nartifact: griya-linear v1",
        "\nprotocol: 1",
    )
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("GRIYA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    // Also installs the bridge that forwards `log` records from the library crates
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Predict { record, behaviour, json, quiet } => {
            effective_settings(config, cli.model).and_then(|settings| {
                let service = load_service(&settings, behaviour.apply(&settings))?;
                cmd_predict(&service, record, json, quiet)
            })
        }
        Commands::Batch { input, output, behaviour } => {
            effective_settings(config, cli.model).and_then(|settings| {
                let service = load_service(&settings, behaviour.apply(&settings))?;
                cmd_batch(&service, &input, output.as_deref())
            })
        }
        Commands::Schema { json } => effective_settings(config, cli.model).and_then(|settings| {
            let service = load_service(&settings, ServiceOptions::from_settings(&settings))?;
            cmd_schema(&service, json)
        }),
        Commands::Form { profile, json } => {
            load_settings(config).and_then(|settings| cmd_form(profile.unwrap_or(settings.profile), json))
        }
        Commands::Serve { bind, max_connections } => {
            effective_settings(config, cli.model).and_then(|settings| {
                let mut server_settings = settings.server.clone();
                if let Some(bind) = bind {
                    server_settings.bind = bind;
                }
                if let Some(n) = max_connections {
                    server_settings.max_connections = n;
                }
                let service = load_service(&settings, ServiceOptions::from_settings(&settings))?;
                cmd_serve(service, &server_settings)
            })
        }
        Commands::Config(cmd) => cmd_config(cmd, config, cli.model),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    /// Exit with `code`, having already reported on stdout.
    pub fn silent(code: u8) -> Self {
        Self::new(code, "")
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn settings_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map(Path::to_path_buf).unwrap_or_else(Settings::config_path)
}

fn load_settings(explicit: Option<&Path>) -> Result<Settings, CliError> {
    let loaded = match explicit {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    loaded.map_err(|e| {
        CliError::new(EXIT_CONFIG, e.to_string()).with_hint("run `griya config init` for a commented template")
    })
}

/// Settings with the `--model` / `GRIYA_MODEL` override applied.
fn effective_settings(explicit: Option<&Path>, model: Option<PathBuf>) -> Result<Settings, CliError> {
    let mut settings = load_settings(explicit)?;
    if let Some(model) = model {
        settings.model_path = model;
    }
    Ok(settings)
}

fn load_service(settings: &Settings, options: ServiceOptions) -> Result<Service, CliError> {
    Service::load(&settings.model_path, options).map_err(|e| {
        CliError::new(EXIT_MODEL_LOAD, format!("cannot load model: {e}"))
            .with_hint("set model_path in settings, pass --model, or set GRIYA_MODEL")
    })
}

// ============================================================================
// predict
// ============================================================================

#[derive(Serialize)]
struct PredictOutput<'a> {
    status: &'static str,
    #[serde(flatten)]
    estimate: &'a griya_cli::Estimate,
    record: &'a PropertyRecord,
}

#[derive(Serialize)]
struct ErrorOutput<'a> {
    status: &'static str,
    message: &'a str,
    exit_code: u8,
}

fn cmd_predict(service: &Service, args: RecordArgs, json: bool, quiet: bool) -> Result<(), CliError> {
    let profile = service.options().profile;
    let record = args.into_record(profile);

    if !quiet {
        eprint!("{}", render_summary(profile, &record));
        eprintln!();
    }

    match service.estimate(record.clone()) {
        Ok(estimate) => {
            if json {
                print_json(&PredictOutput { status: "ok", estimate: &estimate, record: &record })?;
            } else {
                println!("{}", estimate.display);
                if !quiet {
                    eprintln!("(via {} encoding, {})", estimate.encoding, estimate.path);
                }
            }
            Ok(())
        }
        Err(e) => {
            let code = submit_exit_code(&e);
            if json {
                print_json(&ErrorOutput { status: "error", message: &e.to_string(), exit_code: code })?;
                Err(CliError::silent(code))
            } else {
                Err(CliError::new(code, e.to_string()))
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
    println!("{}", text);
    Ok(())
}

// ============================================================================
// batch
// ============================================================================

fn cmd_batch(service: &Service, input: &Path, output: Option<&Path>) -> Result<(), CliError> {
    let file = File::open(input).map_err(|e| CliError::io(format!("{}: {}", input.display(), e)))?;

    let summary = match output {
        Some(path) => {
            let out = File::create(path).map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
            run_batch(service, file, out)
        }
        None => run_batch(service, file, io::stdout().lock()),
    }
    .map_err(|e| CliError::io(format!("{}: {}", input.display(), e)))?;

    eprintln!("{} rows: {} priced, {} failed", summary.rows, summary.ok, summary.failed);
    Ok(())
}

// ============================================================================
// schema / form
// ============================================================================

fn cmd_schema(service: &Service, json: bool) -> Result<(), CliError> {
    let report = service.schema_report();
    if json {
        return print_json(&report);
    }

    let mut out = String::new();
    if let Some(ref source) = report.source {
        out.push_str(&format!("model:        {}\n", source.display()));
    }
    out.push_str(&format!("fingerprint:  {}\n", report.fingerprint));
    out.push_str(&format!(
        "encoding tag: {}\n",
        report.declared_encoding.map(|e| e.to_string()).unwrap_or_else(|| "none".into())
    ));
    match (&report.expected_columns, report.verdict) {
        (Some(columns), Some(verdict)) => {
            out.push_str(&format!("schema:       {} columns ({})\n", columns.len(), verdict));
            for column in columns {
                out.push_str(&format!("  {}\n", column));
            }
        }
        _ => out.push_str("schema:       not recorded (encodings are tried raw first)\n"),
    }
    print!("{}", out);
    Ok(())
}

#[derive(Serialize)]
struct FormOutput {
    profile: FormProfile,
    fields: Vec<griya_core::FieldSpec>,
    defaults: PropertyRecord,
}

fn cmd_form(profile: FormProfile, json: bool) -> Result<(), CliError> {
    if json {
        return print_json(&FormOutput { profile, fields: profile.fields(), defaults: profile.default_record() });
    }
    print!("{}", render_form(profile));
    Ok(())
}

// ============================================================================
// serve
// ============================================================================

#[derive(Serialize)]
struct ReadyLine<'a> {
    ready: bool,
    addr: String,
    protocol_version: u32,
    fingerprint: &'a str,
    started_at: String,
}

fn cmd_serve(service: Service, settings: &griya_config::ServerSettings) -> Result<(), CliError> {
    let fingerprint = service.model().fingerprint().to_string();
    let mut server = PredictionServer::new();
    let addr = server
        .start(service, settings)
        .map_err(|e| CliError::io(format!("cannot bind {}: {}", settings.bind, e)))?;

    // One JSON line so supervisors and tests can discover the port
    let ready = ReadyLine {
        ready: true,
        addr: addr.to_string(),
        protocol_version: griya_protocol::PROTOCOL_VERSION,
        fingerprint: &fingerprint,
        started_at: chrono::Utc::now().to_rfc3339(),
    };
    let line = serde_json::to_string(&ready).map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)
        .and_then(|_| stdout.flush())
        .map_err(|e| CliError::io(e.to_string()))?;
    drop(stdout);

    eprintln!("griya: serving on {} (Ctrl-C to stop)", addr);
    server.wait();
    Ok(())
}

// ============================================================================
// config
// ============================================================================

fn cmd_config(cmd: ConfigCommands, explicit: Option<&Path>, model: Option<PathBuf>) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Path => {
            let path = settings_path(explicit);
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("(not created yet; defaults apply)");
            }
            Ok(())
        }
        ConfigCommands::Show { json } => {
            let settings = effective_settings(explicit, model)?;
            if json {
                return print_json(&settings);
            }
            let text = settings.to_toml().map_err(|e| CliError::new(EXIT_CONFIG, e.to_string()))?;
            print!("{}", text);
            Ok(())
        }
        ConfigCommands::Init => {
            let path = settings_path(explicit);
            Settings::write_default_file(&path).map_err(|e| CliError::new(EXIT_CONFIG, e.to_string()))?;
            eprintln!("wrote {}", path.display());
            Ok(())
        }
    }
}
