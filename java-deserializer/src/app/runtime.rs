use std::{
    backtrace::Backtrace,
    fs::File,
    io::{stdout, Read, Write},
    path::Path,
};

use tracing::debug;

use java_stream::util::stream::models::{Content, NewArray, NewObject, Stream};

use crate::{
    app::{
        error::RuntimeError,
        options::{ExportType, Options},
    },
    exporters::{exporter::Exporter, json::JSON, txt::TXT},
};

/// Stores the application state and handles application lifecycle
pub struct Config {
    /// App configuration options
    pub options: Options,
    /// The decoded stream
    pub stream: Stream,
}

impl Config {
    /// Read and decode the stream named in the options
    ///
    /// Nothing is printed here; a failure means no part of the stream is shown.
    pub fn new(options: Options) -> Result<Config, RuntimeError> {
        let bytes = read_stream(&options.stream_path)?;
        let stream = Stream::decode(&bytes)
            .map_err(|why| RuntimeError::StreamError(why, Backtrace::force_capture()))?;
        debug!(
            contents = stream.contents.len(),
            handles = stream.references.len(),
            "decoded stream"
        );

        Ok(Config { options, stream })
    }

    /// Get a top-level content by index
    pub fn content(&self, idx: usize) -> Result<&Content, RuntimeError> {
        self.stream
            .contents
            .get(idx)
            .ok_or(RuntimeError::MissingContent(idx, self.stream.contents.len()))
    }

    /// Get a top-level content by index, requiring it to be an array
    pub fn array(&self, idx: usize) -> Result<&NewArray, RuntimeError> {
        match self.content(idx)? {
            Content::NewArray(array) => Ok(array.as_ref()),
            other => Err(RuntimeError::WrongContent(idx, "NewArray", other.kind())),
        }
    }

    /// Get a top-level content by index, requiring it to be an object
    pub fn object(&self, idx: usize) -> Result<&NewObject, RuntimeError> {
        match self.content(idx)? {
            Content::NewObject(object) => Ok(object.as_ref()),
            other => Err(RuntimeError::WrongContent(idx, "NewObject", other.kind())),
        }
    }

    /// Render the selected part of the stream and write it to stdout
    pub fn start(&self) -> Result<(), RuntimeError> {
        let output = match self.options.export_type {
            ExportType::Txt => TXT::new(self).export()?,
            ExportType::Json => JSON::new(self).export()?,
        };

        let mut handle = stdout().lock();
        handle
            .write_all(output.as_bytes())
            .and_then(|_| handle.flush())
            .map_err(RuntimeError::OutputError)
    }
}

/// Buffer the whole file; the handle is closed before decoding starts
fn read_stream(path: &Path) -> Result<Vec<u8>, RuntimeError> {
    let file_error = |why| RuntimeError::FileError(why, path.to_path_buf(), Backtrace::force_capture());

    let mut file = File::open(path).map_err(file_error)?;
    let mut bytes = vec![];
    file.read_to_end(&mut bytes).map_err(file_error)?;
    debug!(path = %path.display(), size = bytes.len(), "read stream");

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use std::{env::current_dir, path::PathBuf};

    use crate::app::{
        error::RuntimeError,
        options::{ExportType, Options, Selection},
        runtime::Config,
    };

    fn fixture(name: &str) -> PathBuf {
        current_dir()
            .unwrap()
            .as_path()
            .join("../java-stream/test_data/stream")
            .join(name)
    }

    fn options_for(path: PathBuf) -> Options {
        Options {
            stream_path: path,
            selection: Selection::Stream,
            export_type: ExportType::Txt,
            verbose: false,
        }
    }

    #[test]
    fn can_load_stream() {
        let config = Config::new(options_for(fixture("Mixed"))).unwrap();

        assert_eq!(config.stream.contents.len(), 8);
    }

    #[test]
    fn cant_load_missing_file() {
        let config = Config::new(options_for(fixture("DoesNotExist")));

        assert!(matches!(config, Err(RuntimeError::FileError(_, _, _))));
        assert!(config.err().unwrap().backtrace().is_some());
    }

    #[test]
    fn can_select_contents() {
        let config = Config::new(options_for(fixture("Mixed"))).unwrap();

        assert_eq!(config.array(1).unwrap().values.len(), 3);
        assert_eq!(config.object(2).unwrap().class_data.len(), 2);
    }

    #[test]
    fn cant_select_wrong_contents() {
        let config = Config::new(options_for(fixture("Mixed"))).unwrap();

        assert!(matches!(
            config.array(2),
            Err(RuntimeError::WrongContent(2, "NewArray", "NewObject"))
        ));
        assert!(matches!(
            config.object(0),
            Err(RuntimeError::WrongContent(0, "NewObject", "Utf"))
        ));
        assert!(matches!(
            config.object(8),
            Err(RuntimeError::MissingContent(8, 8))
        ));
    }
}
