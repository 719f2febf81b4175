use std::path::PathBuf;

use clap::{crate_description, crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::app::error::RuntimeError;

/// Option to read the serialized stream from a file
pub const OPTION_FILE: &str = "file";
/// Option to print a single array content in detail
pub const OPTION_ARRAY: &str = "array";
/// Option to print a single object content in detail
pub const OPTION_OBJECT: &str = "object";
/// Option to choose the output format
pub const OPTION_FORMAT: &str = "format";
/// Option to log decoder progress to stderr
pub const OPTION_VERBOSE: &str = "verbose";

/// Output formats the app can render
pub const SUPPORTED_FILE_TYPES: &str = "txt, json";

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportType {
    /// Indented human-readable text
    Txt,
    /// A single JSON document
    Json,
}

impl ExportType {
    /// Given user's input, return a variant if the input matches one
    pub fn from_cli(platform: &str) -> Option<Self> {
        match platform.to_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Which part of the decoded stream to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Every content along with the handle table
    Stream,
    /// Details about the array at the given content index
    Array(usize),
    /// Details about the object at the given content index
    Object(usize),
}

#[derive(Debug, PartialEq, Eq)]
pub struct Options {
    /// Path to the file containing the serialized stream
    pub stream_path: PathBuf,
    /// The part of the stream to print
    pub selection: Selection,
    /// The format to print it in
    pub export_type: ExportType,
    /// If true, log decoder progress to stderr
    pub verbose: bool,
}

impl Options {
    pub fn from_args(args: &ArgMatches) -> Result<Self, RuntimeError> {
        let array = args.get_one::<usize>(OPTION_ARRAY);
        let object = args.get_one::<usize>(OPTION_OBJECT);
        let format = args.get_one::<String>(OPTION_FORMAT);
        let verbose = args.get_flag(OPTION_VERBOSE);

        // Only one content can be inspected at a time
        let selection = match (array, object) {
            (Some(_), Some(_)) => {
                return Err(RuntimeError::InvalidOptions(
                    "Don't provide more than one option".to_string(),
                ));
            }
            (Some(idx), None) => Selection::Array(*idx),
            (None, Some(idx)) => Selection::Object(*idx),
            (None, None) => Selection::Stream,
        };

        let stream_path = args.get_one::<String>(OPTION_FILE).ok_or(
            RuntimeError::InvalidOptions(
                "file path with serialized java stream required".to_string(),
            ),
        )?;

        let export_type = match format {
            Some(format) => ExportType::from_cli(format).ok_or(RuntimeError::InvalidOptions(
                format!("{format} is not a valid export type! Must be one of <{SUPPORTED_FILE_TYPES}>"),
            ))?,
            None => ExportType::Txt,
        };

        Ok(Options {
            stream_path: PathBuf::from(stream_path),
            selection,
            export_type,
            verbose,
        })
    }
}

/// Build the command line interface
pub fn get_command() -> Command {
    Command::new("java-deserializer")
        .version(crate_version!())
        .about(crate_description!())
        .override_usage("java-deserializer <file> [option]")
        .arg(
            Arg::new(OPTION_FILE)
                .help("Path to a file containing a serialized Java stream")
                .value_name("file")
                .display_order(0),
        )
        .arg(
            Arg::new(OPTION_ARRAY)
                .short('a')
                .long(OPTION_ARRAY)
                .help("Print detailed information about content array")
                .value_name("ID")
                .value_parser(value_parser!(usize))
                .display_order(1),
        )
        .arg(
            Arg::new(OPTION_OBJECT)
                .short('o')
                .long(OPTION_OBJECT)
                .help("Print detailed information about content object")
                .value_name("ID")
                .value_parser(value_parser!(usize))
                .display_order(2),
        )
        .arg(
            Arg::new(OPTION_FORMAT)
                .short('f')
                .long(OPTION_FORMAT)
                .help("Specify a single output format")
                .value_name(SUPPORTED_FILE_TYPES)
                .default_value("txt")
                .display_order(3),
        )
        .arg(
            Arg::new(OPTION_VERBOSE)
                .short('v')
                .long(OPTION_VERBOSE)
                .help("Log decoder progress to stderr")
                .action(ArgAction::SetTrue)
                .display_order(4),
        )
}

/// Parse arguments from the command line
pub fn from_command_line() -> ArgMatches {
    let mut command = get_command();
    command.build();
    command.get_matches()
}
