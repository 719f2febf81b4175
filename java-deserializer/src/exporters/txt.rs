use java_stream::util::stream::models::{
    ClassDesc, Content, NewArray, NewClassDesc, NewObject, Stream, Value,
};

use crate::{
    app::{error::RuntimeError, options::Selection, runtime::Config},
    exporters::exporter::{Exporter, Writer},
};

/// Two spaces per level of nesting
fn indent(level: usize) -> String {
    "  ".repeat(level)
}

pub struct TXT<'a> {
    /// Data that is setup from the application's runtime
    pub config: &'a Config,
}

impl<'a> Exporter<'a> for TXT<'a> {
    fn new(config: &'a Config) -> Self {
        TXT { config }
    }

    fn export(&self) -> Result<String, RuntimeError> {
        Ok(match self.config.options.selection {
            Selection::Stream => self.format_stream(&self.config.stream),
            Selection::Array(idx) => self.format_array(self.config.array(idx)?, 0),
            Selection::Object(idx) => self.format_object(self.config.object(idx)?, 0),
        })
    }
}

impl<'a> Writer<'a, String> for TXT<'a> {
    fn format_stream(&self, stream: &'a Stream) -> String {
        stream.to_string()
    }

    fn format_content(&self, content: &'a Content) -> String {
        content.describe()
    }

    fn format_object(&self, object: &'a NewObject, level: usize) -> String {
        let prefix = indent(level);
        let mut formatted = String::new();

        match &object.class_desc {
            ClassDesc::New(class) => {
                formatted.push_str(&format!("{prefix}Object Class Description:\n"));
                formatted.push_str(&self.format_class(class, level + 1));
            }
            other => {
                formatted.push_str(&format!("{prefix}Object Class Description: {other}\n"));
            }
        }

        let data: Vec<String> = object.class_data.iter().map(Value::to_string).collect();
        formatted.push_str(&format!("{prefix}Object Data: [{}]\n", data.join(", ")));

        formatted
    }

    fn format_class(&self, class: &'a NewClassDesc, level: usize) -> String {
        let prefix = indent(level);
        let mut formatted = String::new();

        formatted.push_str(&format!("{prefix}Class Name: {}\n", class.class_name));
        formatted.push_str(&format!("{prefix}Serial Version: {}\n", class.serial_version));
        formatted.push_str(&format!("{prefix}Flags: {}\n", class.flags));

        formatted.push_str(&format!("{prefix}Fields #{}\n", class.fields.len()));
        class
            .fields
            .iter()
            .for_each(|field| formatted.push_str(&format!("{prefix}Field: {field}\n")));

        let annotations = &class.class_annotation.contents;
        formatted.push_str(&format!("{prefix}Class Annotations #{}\n", annotations.len()));
        annotations.iter().for_each(|annotation| {
            formatted.push_str(&format!(
                "{prefix}Annotation: {}\n",
                self.format_content(annotation)
            ))
        });

        formatted.push_str(&format!("{prefix}Super Class: {}\n", class.super_class));
        // Stop at the first super class that is not described in place
        if let ClassDesc::New(super_class) = &class.super_class {
            formatted.push_str(&self.format_class(super_class, level + 1));
        }

        formatted
    }

    fn format_array(&self, array: &'a NewArray, level: usize) -> String {
        let prefix = indent(level);
        let mut formatted = String::new();

        formatted.push_str(&format!("{prefix}Array Description\n"));
        match &array.array_description {
            ClassDesc::New(class) => formatted.push_str(&self.format_class(class, 1)),
            other => formatted.push_str(&format!("{}{other}\n", indent(1))),
        }
        formatted.push_str(&format!("{prefix}Array Type: {}\n", array.array_type));

        formatted.push_str(&format!("{prefix}Array Values #{}\n", array.values.len()));
        for value in &array.values {
            formatted.push_str(&format!("Array value: {prefix}{value} ({})\n", value.kind()));
            if let Value::Object(Content::NewObject(object)) = value {
                formatted.push_str(&self.format_object(object, level + 1));
            }
        }

        formatted
    }
}
