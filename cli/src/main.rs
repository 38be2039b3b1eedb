//! pdftag CLI - PDF accessibility tagging tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdftag::config::{API_KEY_VAR, ENDPOINT_VAR, MODEL_VAR};
use pdftag::render::{to_json, to_markdown};
use pdftag::tagging::{serialize_structure, tag_document, NO_STRUCTURE_TREE};
use pdftag::{
    parse_file_with_options, ClassifierPolicy, Config, DirStore, Document, Error, JsonFormat,
    MistralClient, PageSelection, ParseOptions, RenderOptions, TagOptions, Tagger,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "pdftag")]
#[command(version)]
#[command(about = "Tag PDF documents for accessibility", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write all artifacts
    Tag {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory (defaults to <FILE>_tagged)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Skip image descriptions
        #[arg(long)]
        no_images: bool,

        /// Skip the structure tree dump
        #[arg(long)]
        no_structure: bool,

        /// Send the structure tree to the model for cleanup
        #[arg(long)]
        cleanup: bool,

        #[command(flatten)]
        classify: ClassifyArgs,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Print the tagged elements as JSON (no model call)
    Elements {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        classify: ClassifyArgs,
    },

    /// Convert the tagged elements to Markdown (no model call)
    #[command(alias = "md")]
    Markdown {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Include YAML frontmatter
        #[arg(short, long)]
        frontmatter: bool,

        /// List item marker
        #[arg(long, default_value = "-")]
        list_marker: char,

        #[command(flatten)]
        classify: ClassifyArgs,
    },

    /// Print the structure tree as indented ASCII
    Structure {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Also ask the model for a cleaned-up version
        #[arg(long)]
        cleanup: bool,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct ClassifyArgs {
    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// Minimum font size for headings (bold text only)
    #[arg(long, default_value_t = 18.0)]
    heading_size: f32,

    /// Minimum font size for subheadings
    #[arg(long, default_value_t = 14.0)]
    subheading_size: f32,
}

impl ClassifyArgs {
    fn page_selection(&self) -> Result<PageSelection, Error> {
        match &self.pages {
            Some(p) => PageSelection::parse(p),
            None => Ok(PageSelection::All),
        }
    }

    fn policy(&self) -> ClassifierPolicy {
        ClassifierPolicy::new()
            .with_heading_size(self.heading_size)
            .with_subheading_size(self.subheading_size)
    }
}

#[derive(Args)]
struct ModelArgs {
    /// API key for the hosted model
    #[arg(long, env = API_KEY_VAR, hide_env_values = true)]
    api_key: Option<String>,

    /// Model identifier
    #[arg(long, env = MODEL_VAR)]
    model: Option<String>,

    /// Chat-completion endpoint
    #[arg(long, env = ENDPOINT_VAR)]
    endpoint: Option<String>,

    /// Request timeout in seconds (none by default)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

impl ModelArgs {
    /// Fails with the missing-credential error before anything is sent.
    fn config(&self) -> Result<Config, Error> {
        let mut config = Config::new(self.api_key.clone().unwrap_or_default()).map_err(|e| {
            log::error!("{} is not set.", API_KEY_VAR);
            e
        })?;
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    fn tagger(&self) -> Result<Tagger, Error> {
        let client = MistralClient::new(&self.config()?)?;
        log::info!("Using model {}", client.model());
        Ok(Tagger::new(Box::new(client)))
    }
}

fn main() {
    // A missing .env is fine; variables already set win.
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Tag {
            input,
            output,
            no_images,
            no_structure,
            cleanup,
            classify,
            model,
        } => {
            let options = TagOptions {
                describe_images: !no_images,
                describe_structure: !no_structure,
                cleanup_structure: cleanup,
            };
            cmd_tag(&input, output.as_deref(), options, &classify, &model)
        }
        Commands::Elements {
            input,
            output,
            compact,
            classify,
        } => cmd_elements(&input, output.as_deref(), compact, &classify),
        Commands::Markdown {
            input,
            output,
            frontmatter,
            list_marker,
            classify,
        } => cmd_markdown(&input, output.as_deref(), frontmatter, list_marker, &classify),
        Commands::Structure {
            input,
            output,
            cleanup,
            model,
        } => cmd_structure(&input, output.as_deref(), cleanup, &model),
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn spinner() -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn parse_input(input: &Path, pages: PageSelection, images: bool) -> Result<Document, Error> {
    // Lenient: one unreadable page should not sink the whole document.
    let options = ParseOptions::new()
        .lenient()
        .with_pages(pages)
        .with_images(images);
    parse_file_with_options(input, options)
}

fn write_or_print(output: Option<&Path>, content: &str) -> CliResult {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            println!("{} {}", "Saved to".green(), path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn cmd_tag(
    input: &Path,
    output: Option<&Path>,
    options: TagOptions,
    classify: &ClassifyArgs,
    model: &ModelArgs,
) -> CliResult {
    let tagger = model
        .tagger()?
        .with_policy(classify.policy())
        .with_options(options);

    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_tagged", stem))
    });

    let pb = spinner()?;
    pb.set_message("Parsing PDF...");
    let doc = parse_input(input, classify.page_selection()?, options.describe_images)?;

    pb.set_message("Processing PDF and communicating with AI...");
    let report = tagger.tag_document(&doc)?;

    pb.set_message("Writing artifacts...");
    let mut store = DirStore::create(&output_dir)?;
    let written = Tagger::write_artifacts(&report, &mut store)?;
    pb.finish_and_clear();

    let failures = report.failures();
    for failure in &failures {
        eprintln!("{} {}", "AI Error:".red().bold(), failure.error);
        if let Some(details) = &failure.details {
            eprintln!("  {} {}", "Details:".bold(), details);
        }
        if let Some(raw) = &failure.raw_response {
            eprintln!("  {}\n{}", "Raw AI Response:".bold(), raw.as_str().dimmed());
        }
    }

    println!(
        "{} {} pages, {} image page(s), {} failed request(s)",
        "Tagged".green().bold(),
        report.pages.len(),
        report.images.len(),
        failures.len()
    );
    println!("\n{} {}", "Output files in".green().bold(), store.root().display());
    for (i, name) in written.iter().enumerate() {
        let branch = if i + 1 == written.len() { "└─" } else { "├─" };
        println!("  {} {}", branch.dimmed(), name);
    }

    Ok(())
}

fn cmd_elements(input: &Path, output: Option<&Path>, compact: bool, classify: &ClassifyArgs) -> CliResult {
    let doc = parse_input(input, classify.page_selection()?, false)?;
    let pages = tag_document(&doc, &classify.policy());

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    write_or_print(output, &to_json(&pages, format)?)
}

fn cmd_markdown(
    input: &Path,
    output: Option<&Path>,
    frontmatter: bool,
    list_marker: char,
    classify: &ClassifyArgs,
) -> CliResult {
    let selection = classify.page_selection()?;
    let doc = parse_input(input, selection.clone(), false)?;
    let pages = tag_document(&doc, &classify.policy());

    let options = RenderOptions::new()
        .with_frontmatter(frontmatter)
        .with_list_marker(list_marker)
        .with_pages(selection);
    write_or_print(output, &to_markdown(&pages, &doc.metadata, &options))
}

fn cmd_structure(input: &Path, output: Option<&Path>, cleanup: bool, model: &ModelArgs) -> CliResult {
    // Checked up front so a missing key fails before the file is read.
    let tagger = if cleanup { Some(model.tagger()?) } else { None };

    let options = ParseOptions::new()
        .lenient()
        .with_images(false)
        .with_pages(PageSelection::Pages(Vec::new()));
    let doc = parse_file_with_options(input, options)?;

    let Some(root) = &doc.structure else {
        println!("{}", NO_STRUCTURE_TREE.yellow());
        return Ok(());
    };

    let ascii = serialize_structure(root, 0);
    write_or_print(output, ascii.trim_end())?;

    if let Some(tagger) = tagger {
        let pb = spinner()?;
        pb.set_message("Cleaning up structure tree...");
        let cleaned = tagger.cleanup_structure(&ascii);
        pb.finish_and_clear();

        match cleaned {
            Ok(text) => {
                println!("\n{}", "Cleaned structure".cyan().bold());
                println!("{}", "─".repeat(40).dimmed());
                println!("{}", text);
            }
            Err(failure) => eprintln!("{} {}", "AI Error:".red().bold(), failure),
        }
    }

    Ok(())
}

fn cmd_info(input: &Path) -> CliResult {
    let doc = parse_input(input, PageSelection::All, true)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), doc.metadata.pdf_version);
    println!("{}: {}", "Pages".bold(), doc.metadata.page_count);
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if doc.metadata.encrypted { "Yes" } else { "No" }
    );
    println!(
        "{}: {}",
        "Tagged".bold(),
        if doc.metadata.tagged { "Yes" } else { "No" }
    );

    if let Some(ref title) = doc.metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = doc.metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref producer) = doc.metadata.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = doc.metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let pages = tag_document(&doc, &ClassifierPolicy::default());
    let count = |t| pages.iter().map(|p| p.count(t)).sum::<usize>();

    println!("{}: {}", "Spans".bold(), doc.pages.iter().map(|p| p.spans.len()).sum::<usize>());
    println!("{}: {}", "Headings".bold(), count(pdftag::ElementType::Heading));
    println!("{}: {}", "Subheadings".bold(), count(pdftag::ElementType::Subheading));
    println!("{}: {}", "Paragraphs".bold(), count(pdftag::ElementType::Paragraph));
    println!("{}: {}", "List items".bold(), count(pdftag::ElementType::ListItem));
    println!("{}: {}", "Images".bold(), doc.images.len());
    if let Some(ref root) = doc.structure {
        println!("{}: {}", "Structure nodes".bold(), root.node_count());
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdftag".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF accessibility tagging tool");
    println!();
    println!("License: MIT");
}
