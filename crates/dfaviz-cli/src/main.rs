use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use dfaviz::{
    Diagnostic, MarkerStyle, RankDir, Severity, StateId, StateRoles, VizConfig,
    prepare_description, validate,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "dfaviz-cli")]
#[command(about = "Annotate automaton graph descriptions for rendering")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Annotate(AnnotateArgs),
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
struct AnnotateArgs {
    #[arg(long)]
    dot_file: Option<PathBuf>,
    #[arg(long)]
    dot_source: Option<String>,
    #[arg(long)]
    start: u32,
    #[arg(long = "accepting")]
    accepting: Vec<u32>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum)]
    marker_style: Option<MarkerStyleArg>,
    #[arg(long, value_enum)]
    rankdir: Option<RankDirArg>,
    #[arg(long = "no-validate", action = ArgAction::SetTrue)]
    no_validate: bool,
}

#[derive(clap::Args, Debug)]
struct CheckArgs {
    #[arg(long)]
    dot_file: Option<PathBuf>,
    #[arg(long)]
    dot_source: Option<String>,
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MarkerStyleArg {
    Shape,
    ExternalLabel,
}

impl From<MarkerStyleArg> for MarkerStyle {
    fn from(value: MarkerStyleArg) -> Self {
        match value {
            MarkerStyleArg::Shape => Self::Shape,
            MarkerStyleArg::ExternalLabel => Self::ExternalLabel,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RankDirArg {
    Lr,
    Tb,
    Rl,
    Bt,
}

impl From<RankDirArg> for RankDir {
    fn from(value: RankDirArg) -> Self {
        match value {
            RankDirArg::Lr => Self::LeftToRight,
            RankDirArg::Tb => Self::TopToBottom,
            RankDirArg::Rl => Self::RightToLeft,
            RankDirArg::Bt => Self::BottomToTop,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Annotate(args) => annotate_command(args),
        Commands::Check(args) => check_command(args),
    };

    match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(1)
        }
    }
}

fn annotate_command(args: AnnotateArgs) -> Result<ExitCode, String> {
    let source = load_dot_source(args.dot_file.as_deref(), args.dot_source.as_deref())?;

    let mut config = match args.config.as_deref() {
        Some(path) => VizConfig::from_json_file(path).map_err(|error| error.to_string())?,
        None => VizConfig::default(),
    };
    if let Some(style) = args.marker_style {
        config.marker_style = style.into();
    }
    if let Some(rankdir) = args.rankdir {
        config.rankdir = rankdir.into();
    }
    if args.no_validate {
        config.validate_output = false;
    }

    let roles = StateRoles::new(
        StateId(args.start),
        args.accepting.into_iter().map(StateId),
    );
    let (graph, diagnostics) =
        prepare_description(&source, &roles, &config, &[]).map_err(|error| {
            tracing::error!(kind = error.kind(), error = %error, "annotation failed");
            error.to_string()
        })?;

    for diagnostic in &diagnostics {
        eprintln!("{}", format_diagnostic(diagnostic));
    }
    print!("{graph}");
    Ok(ExitCode::SUCCESS)
}

fn check_command(args: CheckArgs) -> Result<ExitCode, String> {
    let source = load_dot_source(args.dot_file.as_deref(), args.dot_source.as_deref())?;
    let diagnostics = validate(&source);

    if args.json {
        let rendered = serde_json::to_string_pretty(&diagnostics)
            .map_err(|error| format!("failed serializing diagnostics: {error}"))?;
        println!("{rendered}");
    } else if diagnostics.is_empty() {
        println!("ok");
    } else {
        for diagnostic in &diagnostics {
            println!("{}", format_diagnostic(diagnostic));
        }
    }

    if diagnostics.iter().any(Diagnostic::is_error) {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let severity = match diagnostic.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
    };
    match diagnostic.state {
        Some(state) => format!(
            "{severity}[{}] state {state}: {}",
            diagnostic.rule, diagnostic.message
        ),
        None => format!("{severity}[{}]: {}", diagnostic.rule, diagnostic.message),
    }
}

fn load_dot_source(dot_file: Option<&Path>, dot_source: Option<&str>) -> Result<String, String> {
    match (dot_file, dot_source) {
        (Some(_), Some(_)) => Err("provide only one of --dot-file or --dot-source".to_string()),
        (None, None) => Err("one of --dot-file or --dot-source is required".to_string()),
        (Some(path), None) => std::fs::read_to_string(path)
            .map_err(|e| format!("failed reading DOT file '{}': {e}", path.display())),
        (None, Some(source)) => Ok(source.to_string()),
    }
}
