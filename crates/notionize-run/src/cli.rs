use crate::config::Config;
use clap::{ArgAction, Parser};
use colored::Colorize;
use miette::IntoDiagnostic;
use notionize::{Conversion, ConversionMode, ConversionOptions, ImportStat, convert_html};
use rayon::prelude::*;
use std::io::{self, BufWriter, Read, Write};
use std::{fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Default)]
#[command(name = "notionize")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(after_help = "# Examples:\n\n\
    ## To convert a file:\n\
    notionize page.html\n\n\
    ## To convert stdin into a page of a database:\n\
    curl -s https://example.com | notionize --database-id <ID>\n\n\
    ## To project every table onto a database schema:\n\
    notionize --mode database tables.html")]
#[command(about = "Convert HTML into Notion content blocks.", long_about = None)]
pub struct Cli {
    /// Destination database id, stamped into the output as its parent
    #[arg(long, env = "NOTIONIZE_DATABASE_ID")]
    database_id: Option<String>,

    /// How tables are converted
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Do not merge adjacent text with identical annotations
    #[arg(long, default_value_t = false)]
    no_merge: bool,

    /// Flatten elements nested deeper than this
    #[arg(long, value_name = "DEPTH")]
    max_depth: Option<usize>,

    /// Path to the config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print single-line JSON
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Print the number of processed texts and images to stderr
    #[arg(long, default_value_t = false)]
    stats: bool,

    /// Number of files to process before switching to parallel processing
    #[arg(short = 'P', default_value_t = 10)]
    parallel_threshold: usize,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// HTML files to convert. Reads stdin when omitted.
    files: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum Mode {
    Page,
    Database,
}

impl From<Mode> for ConversionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Page => ConversionMode::Page,
            Mode::Database => ConversionMode::Database,
        }
    }
}

impl Cli {
    pub fn run(&self) -> miette::Result<()> {
        self.init_tracing();

        let config = Config::load(self.config.as_deref())?;
        let options = self.conversion_options(&config);
        let inputs = self.read_inputs()?;

        let convert = |(name, html): &(String, String)| {
            let mut stats = ImportStat::default();
            let conversion = convert_html(html, &options, &mut stats);
            if !conversion.issues.is_empty() {
                tracing::info!("{}: {} issue(s) during conversion", name, conversion.issues.len());
            }
            (conversion, stats)
        };

        let results: Vec<(Conversion, ImportStat)> = if inputs.len() > self.parallel_threshold {
            inputs.par_iter().map(convert).collect()
        } else {
            inputs.iter().map(convert).collect()
        };

        let mut total = ImportStat::default();
        let mut documents = Vec::with_capacity(results.len());
        for (conversion, stats) in results {
            total += stats;
            documents.push(conversion.document);
        }

        let json = if self.files.len() > 1 {
            self.to_json(&documents)?
        } else {
            match documents.first() {
                Some(document) => self.to_json(document)?,
                None => return Ok(()),
            }
        };

        let stdout = io::stdout();
        let mut handle = BufWriter::new(stdout.lock());
        writeln!(handle, "{}", json).into_diagnostic()?;
        handle.flush().into_diagnostic()?;

        if self.stats {
            eprintln!(
                "{} {} texts ({} chars), {} images",
                "processed:".bold().cyan(),
                total.texts,
                total.text_chars,
                total.images
            );
        }

        Ok(())
    }

    fn init_tracing(&self) {
        let level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        // Logs go to stderr so stdout only ever carries JSON.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Flags override the environment, which overrides the config file.
    fn conversion_options(&self, config: &Config) -> ConversionOptions {
        let mut options = ConversionOptions::default();
        config.apply(&mut options);

        if let Some(database_id) = &self.database_id {
            options.database_id = Some(database_id.clone());
        }
        if let Some(mode) = self.mode {
            options.mode = mode.into();
        }
        if self.no_merge {
            options.merge_adjacent_text = false;
        }
        if let Some(max_depth) = self.max_depth {
            options.max_depth = max_depth;
        }

        tracing::debug!("Conversion options: {:?}", options);
        options
    }

    fn read_inputs(&self) -> miette::Result<Vec<(String, String)>> {
        if self.files.is_empty() {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input).into_diagnostic()?;
            return Ok(vec![("<stdin>".to_string(), input)]);
        }

        self.files
            .iter()
            .map(|file| {
                let content = fs::read_to_string(file)
                    .into_diagnostic()
                    .map_err(|e| e.wrap_err(format!("Failed to read {}", file.display())))?;
                Ok((file.display().to_string(), content))
            })
            .collect()
    }

    fn to_json<T: serde::Serialize>(&self, value: &T) -> miette::Result<String> {
        if self.compact {
            serde_json::to_string(value).into_diagnostic()
        } else {
            serde_json::to_string_pretty(value).into_diagnostic()
        }
    }
}
