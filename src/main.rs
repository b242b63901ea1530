// src/main.rs

use dockrun::{cli, logging};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("dockrun: could not initialise logging: {err}");
        std::process::exit(-1);
    }

    match dockrun::run(args).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("dockrun: {err}");
            std::process::exit(-1);
        }
    }
}
