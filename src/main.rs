use clap::{Parser, Subcommand};
use formpress::cli;
use formpress::error::FormpressResult;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "formpress")]
#[command(about = "Press JSON rosters into styled Excel form templates.")]
#[command(long_about = "Formpress - Roster-to-Excel form press

Reads a JSON array of student records, derives a classroom code per record
(18 + index/20), and writes the values into pre-styled xlsx templates.
Merges, cell styles, column widths, and page layout survive untouched.

COMMANDS:
  fill    - One record into the single-entry template
  clone   - One form-sheet copy per record, all in one workbook
  sheets  - List the worksheets of a workbook

EXAMPLES:
  formpress fill data2.json --index 3          # Fill template3.xlsx
  formpress clone data2.json --start 0 --count 23
  formpress sheets out/template-all-filled_23.xlsx")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Fill the single-entry template from one record.

Writes six record fields (name, year, school, address, address2, name2)
into fixed cells C3..C8 of the template's data sheet. Absent or null
fields become empty cells. Writes into a merged range always target the
range's master cell, so the template's merges stay intact.")]
    /// Fill the single-entry template from one record
    Fill {
        /// Path to the JSON records file
        #[arg(default_value = "data2.json")]
        data: PathBuf,

        /// Record index to fill (position in the full input array)
        #[arg(short, long, default_value_t = 0)]
        index: usize,

        /// Template workbook (default template3.xlsx)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Source worksheet name (default "data")
        #[arg(short, long)]
        sheet: Option<String>,

        /// Output directory, created if absent
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,

        /// Output file name
        #[arg(short, long, default_value = "template3-filled.xlsx")]
        output: String,

        /// Show per-cell fill details
        #[arg(short, long)]
        verbose: bool,
    },

    #[command(long_about = "Clone the form sheet once per record.

Each record gets a worksheet named STT-<index> replicating the template's
form sheet: columns, row heights, cell values and styles, merged ranges,
page setup, and headers/footers. Record-specific cells (C6..C10, F6) are
then overwritten; F6 carries the derived classroom label (Mã lớp).

Re-running against a file that already holds STT-0 replaces it instead of
duplicating. Merge ranges that fail to re-apply are skipped individually
and reported; they never abort the batch.")]
    /// Clone the form sheet once per record into one workbook
    Clone {
        /// Path to the JSON records file
        #[arg(default_value = "data2.json")]
        data: PathBuf,

        /// Template workbook (default template-all.xlsx)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Source worksheet name (default "form")
        #[arg(short, long)]
        sheet: Option<String>,

        /// First record index to clone
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Number of records to clone (default: all remaining)
        #[arg(short, long)]
        count: Option<usize>,

        /// Output directory, created if absent
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,

        /// Output file name
        #[arg(short, long, default_value = "template-all-filled_23.xlsx")]
        output: String,

        /// Show per-record progress and skipped-range details
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the worksheets of a workbook
    Sheets {
        /// Path to an xlsx workbook
        file: PathBuf,
    },
}

fn main() -> FormpressResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("formpress=warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fill {
            data,
            index,
            template,
            sheet,
            out_dir,
            output,
            verbose,
        } => cli::fill(data, index, template, sheet, out_dir, output, verbose),

        Commands::Clone {
            data,
            template,
            sheet,
            start,
            count,
            out_dir,
            output,
            verbose,
        } => cli::clone(data, template, sheet, start, count, out_dir, output, verbose),

        Commands::Sheets { file } => cli::sheets(file),
    }
}
