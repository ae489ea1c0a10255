use clap::{ArgAction, Parser};
use grab_page::config::DEFAULT_PROXY;
use grab_page::{Grab, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "grab-page")]
#[command(about = "Capture links, raw HTML and a full-page screenshot of one URL")]
#[command(version)]
#[command(disable_help_flag = true)]
#[command(after_help = "With no mode flag every mode runs.\n\n\
Example:\n  grab-page --html --links --screenshot --proxy=127.0.0.1:9050 http://example.onion")]
pub struct Args {
    /// URL to capture
    pub url: String,

    /// Extract links from the page
    #[arg(short, long)]
    pub links: bool,

    /// Save the raw HTML of the page
    #[arg(short = 'h', long)]
    pub html: bool,

    /// Take a full-page screenshot
    #[arg(short, long)]
    pub screenshot: bool,

    /// Route all traffic through a SOCKS5 proxy (defaults to local Tor)
    ///
    /// An address must be attached with `=`, so `-p URL` keeps URL positional.
    #[arg(
        short,
        long,
        value_name = "ADDR",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = DEFAULT_PROXY
    )]
    pub proxy: Option<String>,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory the output files are written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// WebDriver server used for screenshots
    #[arg(long, value_name = "URL")]
    pub webdriver_url: Option<String>,

    /// Seconds to wait for the page to become visible
    #[arg(long, value_name = "SECS")]
    pub wait_timeout: Option<u64>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

/// Turn parsed arguments into a capture builder
pub fn build_grab(args: &Args) -> Result<Grab> {
    let mut grab = Grab::new(args.url.clone())
        .with_links(args.links)
        .with_html(args.html)
        .with_screenshot(args.screenshot);

    if let Some(path) = &args.config {
        grab = grab.with_config_file(path)?;
    }
    if let Some(proxy) = &args.proxy {
        grab = grab.with_proxy(proxy.clone());
    }

    let config = grab.config_mut();
    if let Some(dir) = &args.output_dir {
        *config = config.clone().with_output_dir(dir);
    }
    if let Some(url) = &args.webdriver_url {
        config.webdriver_url = url.clone();
    }
    if let Some(secs) = args.wait_timeout {
        config.visible_timeout_secs = Some(secs);
    }

    Ok(grab)
}
