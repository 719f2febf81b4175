#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod app;
mod exporters;

use std::io::stderr;

use tracing_subscriber::EnvFilter;

use app::{
    options::{from_command_line, ExportType, Options},
    output::{print_error, print_exception, print_line, print_status},
    runtime::Config,
};

/// Logs go to stderr so they never mix with the rendered stream
fn init_tracing(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(stderr)
        .try_init();
}

fn main() {
    let args = from_command_line();
    let options = match Options::from_args(&args) {
        Ok(options) => options,
        Err(why) => {
            print_error(&why.to_string());
            return;
        }
    };

    init_tracing(options.verbose);

    // JSON output stays a single parseable document
    if options.export_type == ExportType::Txt {
        print_status("Deserializing...");
        print_line();
    }

    match Config::new(options) {
        Ok(app) => {
            if let Err(why) = app.start() {
                print_exception(&why);
            }
        }
        Err(why) => print_exception(&why),
    }
}
