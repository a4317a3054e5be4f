use breakpoint_lib::fetch::HttpFetcher;
use breakpoint_lib::parser::html::create_dom_tree_with_base;
use breakpoint_lib::style::computed::HeadlessHost;
use breakpoint_lib::style::structural::prop_to_content;
use breakpoint_lib::{BreakpointDetector, BreakpointError, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use url::Url;

#[derive(Parser)]
#[command(name = "breakpoint")]
#[command(about = "Compile and detect `--breakpoint` declarations")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append a `:before { content }` rule after every `--breakpoint` rule.
    Build {
        /// Source stylesheet.
        input: PathBuf,

        /// Destination stylesheet.
        output: PathBuf,
    },

    /// Report the breakpoint active for an element of an HTML page.
    Detect {
        /// HTML page.
        html: PathBuf,

        /// Selector of the element to query.
        selector: String,

        /// Viewport width in CSS pixels.
        #[arg(short, long, default_value_t = 1024.0)]
        width: f32,

        /// Base URL for linked stylesheets. Defaults to the page's location.
        #[arg(long)]
        base_url: Option<Url>,

        /// Emulate a host without custom-property support.
        #[arg(long)]
        no_custom_properties: bool,
    },
}

fn build(input: &Path, output: &Path) -> Result<()> {
    let css = fs::read_to_string(input)?;
    let transformed = prop_to_content(&css)?;
    fs::write(output, transformed)?;
    info!("wrote {}", output.display());
    Ok(())
}

fn page_url(html: &Path) -> Result<Url> {
    let absolute = fs::canonicalize(html)?;
    Url::from_file_path(&absolute)
        .map_err(|()| BreakpointError::InvalidUrl(absolute.display().to_string()))
}

fn detect(
    html: &Path,
    selector: &str,
    width: f32,
    base_url: Option<Url>,
    custom_properties: bool,
) -> Result<Option<String>> {
    let html_content = fs::read_to_string(html)?;
    let base_url = match base_url {
        Some(url) => url,
        None => page_url(html)?,
    };
    let document = Rc::new(create_dom_tree_with_base(&html_content, Some(base_url)));
    let host = Rc::new(HeadlessHost::new(width).with_custom_properties(custom_properties));
    let fetcher = Rc::new(HttpFetcher::new()?);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();
    let breakpoint = local.block_on(&runtime, async move {
        let detector = BreakpointDetector::start(document, host, fetcher);
        detector.wait_ready().await;
        detector.detect_breakpoint_name(selector)
    });
    Ok(breakpoint)
}

fn main() {
    env_logger::init();

    // parse the args given in terminal
    let args: Args = Args::parse();

    let result = match args.command {
        Command::Build { input, output } => build(&input, &output),
        Command::Detect {
            html,
            selector,
            width,
            base_url,
            no_custom_properties,
        } => detect(&html, &selector, width, base_url, !no_custom_properties).map(|found| {
            match found {
                Some(name) => println!("{}", name),
                None => println!("no breakpoint for `{}`", selector),
            }
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
