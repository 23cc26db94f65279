use azure_network_params::config::{InputPaths, OutputDirs};
use azure_network_params::output::print_summary;
use azure_network_params::{run, Result};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;
use std::process::ExitCode;
use std::str::FromStr;

const LOG_CONFIG_FILE: &str = "log4rs.yml";
const ENV_LOG_LEVEL: &str = "NETPARAMS_LOG_LEVEL";

fn init_logging() {
    if Path::new(LOG_CONFIG_FILE).exists() {
        if let Err(e) = log4rs::init_file(LOG_CONFIG_FILE, Default::default()) {
            eprintln!("Error initializing log4rs from {LOG_CONFIG_FILE}: {e}");
        }
        return;
    }
    let level = std::env::var(ENV_LOG_LEVEL)
        .ok()
        .and_then(|v| LevelFilter::from_str(&v).ok())
        .unwrap_or(LevelFilter::Info);
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {h({l:5})} {t} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level));
    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("Error initializing log4rs: {e}");
            }
        }
        Err(e) => eprintln!("Error building log4rs config: {e}"),
    }
}

fn try_main() -> Result<()> {
    let inputs = InputPaths::from_env()?.load()?;
    let dirs = OutputDirs::from_env()?;
    let compilation = run(&inputs, &dirs)?;
    print_summary(&compilation);
    Ok(())
}

fn main() -> ExitCode {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    init_logging();
    log::info!("#Start main()");

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
