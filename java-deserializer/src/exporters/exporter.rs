use java_stream::util::stream::models::{Content, NewArray, NewClassDesc, NewObject, Stream};

use crate::app::{error::RuntimeError, runtime::Config};

/// Defines behavior for rendering the part of a decoded stream selected on the command line
pub trait Exporter<'a> {
    /// Create a new exporter with a reference to the decoded stream
    fn new(config: &'a Config) -> Self;
    /// Render the selected stream, array, or object
    fn export(&self) -> Result<String, RuntimeError>;
}

/// Defines behavior for formatting stream records to the desired output format
pub(super) trait Writer<'a, T> {
    /// Format the whole stream, including the handle table
    fn format_stream(&self, stream: &'a Stream) -> T;
    /// Format any record
    fn format_content(&self, content: &'a Content) -> T;
    /// Format an object, walking up its class hierarchy
    fn format_object(&self, object: &'a NewObject, level: usize) -> T;
    /// Format a class description and the classes it inherits from
    fn format_class(&self, class: &'a NewClassDesc, level: usize) -> T;
    /// Format an array and its elements
    fn format_array(&self, array: &'a NewArray, level: usize) -> T;
}
