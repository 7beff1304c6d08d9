use atom2ics::Config;
use env_logger::{Builder, Target};
use log::{error, LevelFilter};
use std::process;

fn main() {
    let matches = atom2ics::app().get_matches();
    let level = if matches.is_present("debug") { LevelFilter::Debug } else { LevelFilter::Warn };
    Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(Target::Stderr)
        .init();

    if let Err(e) = Config::from_matches(&matches).and_then(|config| config.run()) {
        error!("{}", e);
        process::exit(1);
    }
}
