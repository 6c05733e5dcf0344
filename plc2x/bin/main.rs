use std::path::PathBuf;

use clap::Parser;

use quicksfc_l5x::ExportOptions;
use quicksfc_parser::options::ParseOptions;
use quicksfcc::cli;
use quicksfcc::logger;

#[derive(Parser, Debug)]
#[command(name = "quicksfcc", about = "QuickSFC compiler")]
struct Args {
    /// Turn on verbose logging. Repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write log messages to the file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Do not link a transition without a target to the next step below it.
    #[arg(long)]
    strict_jumps: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(clap::Subcommand, Debug)]
enum Action {
    /// Checks documents for errors. Directories are expanded to their files.
    Check { files: Vec<PathBuf> },
    /// Prints the tokens of a document.
    Tokenize { file: PathBuf },
    /// Prints a summary of the chart in a document.
    Summary { file: PathBuf },
    /// Prints the chart in a document as JSON.
    Json {
        file: PathBuf,
        /// Include the links between steps, transitions and branches.
        #[arg(long)]
        links: bool,
    },
    /// Compiles a document to an L5X program.
    Compile {
        file: PathBuf,
        /// The output file. Defaults to the input with the L5X extension.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Name of the exported program.
        #[arg(long)]
        program: Option<String>,
        /// Name of the controller context.
        #[arg(long)]
        controller: Option<String>,
        /// Software revision recorded in the document.
        #[arg(long)]
        software_revision: Option<String>,
    },
    /// Prints the version number.
    Version,
}

pub fn main() -> Result<(), String> {
    let args = Args::parse();

    logger::configure(args.verbose, args.log_file)?;

    let parse_options = if args.strict_jumps {
        ParseOptions::strict()
    } else {
        ParseOptions::default()
    };

    match args.action {
        Action::Check { files } => cli::check(files, &parse_options, false),
        Action::Tokenize { file } => cli::tokenize(&file, false),
        Action::Summary { file } => cli::summary(&file, &parse_options, false),
        Action::Json { file, links } => cli::json(&file, &parse_options, links, false),
        Action::Compile {
            file,
            output,
            program,
            controller,
            software_revision,
        } => {
            let mut export_options = ExportOptions::default();
            if let Some(program) = program {
                export_options = export_options.with_program_name(program);
            }
            if let Some(controller) = controller {
                export_options = export_options.with_controller_name(controller);
            }
            if let Some(revision) = software_revision {
                export_options = export_options.with_software_revision(revision);
            }
            cli::compile(&file, output, &parse_options, export_options, false)
        }
        Action::Version => {
            println!("quicksfcc version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
