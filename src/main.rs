use clap::Parser;

use gesture_loop::cli::{self, Args};
use gesture_loop::shutdown::{block_on_with_grace, SHUTDOWN_GRACE};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let result = match block_on_with_grace(cli::dispatch(args), SHUTDOWN_GRACE) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
