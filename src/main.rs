use clap::Parser;
use std::process::ExitCode;

mod args;
use args::{Args, build_grab};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command-line arguments
    let args = Args::parse();

    let grab = match build_grab(&args) {
        Ok(grab) => grab,
        Err(e) => {
            ::log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let request = grab.request();
    ::log::info!("Starting capture of {}", request.target());

    if request.modes().take_screenshot {
        println!("Note: screenshots require a WebDriver server (e.g., ChromeDriver).");
        println!(
            "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
        );
    }

    let start_time = std::time::Instant::now();
    match grab.run().await {
        Ok(outcome) => {
            ::log::info!(
                "Done in {:.2} seconds ({})",
                start_time.elapsed().as_secs_f64(),
                if outcome.is_clean() {
                    "all modes succeeded"
                } else {
                    "some modes degraded"
                }
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            ::log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
