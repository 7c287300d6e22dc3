use capsearch::app;
use std::env;
use std::path::PathBuf;

/// Main entry point for the web application
///
/// Starts the capability search web server. The record store is seeded from
/// a capability workbook on first start when one is given.
///
/// # Arguments
/// * First positional argument (optional): path to the capability workbook
/// * Second positional argument (optional): bind address
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let workbook: Option<PathBuf> = args.get(1).map(PathBuf::from);
    let addr = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "127.0.0.1:3000".to_string());

    app::run(&addr, "database", workbook.as_deref()).await
}
