use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use patch_lines::config::{DEFAULT_CHANNEL, DEFAULT_CHUNK_SIZE, DEFAULT_HG_URL};
use patch_lines::{
    ExtensionFilter, FetchConfig, HgFetcher, PatchParser, PatchResult, TracingSink, recover,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "patch-lines")]
#[command(about = "Line numbers added, deleted and touched by a git patch")]
struct Cli {
    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Extensions of interesting files, replacing the default list (e.g. "cpp,h")
    #[arg(long, value_delimiter = ',', global = true)]
    ext: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a patch file ("-" streams from stdin)
    File {
        path: PathBuf,

        /// Largest fragment read at once, in bytes
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
    /// Fetch the raw patch of a revision and parse it as it streams in
    Rev {
        revision: String,

        /// Release channel the revision belongs to
        #[arg(long, default_value = DEFAULT_CHANNEL)]
        channel: String,

        /// Largest fragment read at once, in bytes
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Mercurial server root
        #[arg(long, env = "PATCH_LINES_HG_URL", default_value = DEFAULT_HG_URL)]
        hg_url: String,
    },
    /// Print shell completions
    Completions { shell: Shell },
    /// Print the man page
    Man,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();

    let filter = if cli.ext.is_empty() {
        ExtensionFilter::default()
    } else {
        ExtensionFilter::new(&cli.ext)
    };
    let interest = |path: &str| filter.is_interesting(path);

    let outcome = match cli.command {
        Commands::File { path, chunk_size } => {
            let parser = PatchParser::new(interest).with_chunk_size(chunk_size);
            if path.as_os_str() == "-" {
                parser.parse_reader("<stdin>", io::stdin().lock())
            } else {
                parser.parse_file(&path)
            }
        }
        Commands::Rev {
            revision,
            channel,
            chunk_size,
            hg_url,
        } => {
            let config = FetchConfig::default().with_base_url(hg_url);
            let parser = PatchParser::new(interest).with_chunk_size(chunk_size);
            parser.parse_revision(&HgFetcher::new(config), &revision, &channel)
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "patch-lines", &mut io::stdout());
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut io::stdout())?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    let failed = outcome.is_err();
    let result: PatchResult = recover(outcome, &TracingSink);
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
