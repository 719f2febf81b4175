use base64::{prelude::BASE64_STANDARD, Engine};
use json::{from, object, JsonValue};

use java_stream::util::stream::models::{
    Annotation, ClassDesc, Content, Field, NewArray, NewClassDesc, NewObject, ProxyClassDesc,
    Stream, Value, BASE_WIRE_HANDLE,
};

use crate::{
    app::{error::RuntimeError, options::Selection, runtime::Config},
    exporters::exporter::{Exporter, Writer},
};

/// Handles are rendered the same way the text output shows them
fn handle(handle: u32) -> String {
    format!("0x{handle:x}")
}

pub struct JSON<'a> {
    /// Data that is setup from the application's runtime
    pub config: &'a Config,
}

impl<'a> Exporter<'a> for JSON<'a> {
    fn new(config: &'a Config) -> Self {
        JSON { config }
    }

    fn export(&self) -> Result<String, RuntimeError> {
        let document = match self.config.options.selection {
            Selection::Stream => self.format_stream(&self.config.stream),
            Selection::Array(idx) => self.format_array(self.config.array(idx)?, 0),
            Selection::Object(idx) => self.format_object(self.config.object(idx)?, 0),
        };
        Ok(format!("{}\n", document.dump()))
    }
}

impl<'a> Writer<'a, JsonValue> for JSON<'a> {
    fn format_stream(&self, stream: &'a Stream) -> JsonValue {
        let contents: Vec<JsonValue> = stream
            .contents
            .iter()
            .map(|content| self.format_content(content))
            .collect();
        let references: Vec<JsonValue> = stream
            .references
            .iter()
            .enumerate()
            .map(|(idx, content)| {
                object! {
                    handle: handle(idx as u32 + BASE_WIRE_HANDLE),
                    content: self.format_content(content),
                }
            })
            .collect();

        object! {
            magic: handle(stream.magic as u32),
            version: stream.version,
            contents: contents,
            references: references,
        }
    }

    fn format_content(&self, content: &'a Content) -> JsonValue {
        let mut json_content = object! {kind: content.kind()};
        match content {
            Content::NewObject(object) => {
                json_content["class"] = self.format_class_desc(&object.class_desc);
                json_content["data"] = self.format_values(&object.class_data);
            }
            Content::NewArray(array) => {
                json_content["class"] = self.format_class_desc(&array.array_description);
                json_content["type"] = from(array.array_type.to_string());
                json_content["values"] = self.format_values(&array.values);
            }
            Content::NewClass(class) => {
                json_content["class"] = self.format_class_desc(&class.class_description);
            }
            Content::NewClassDesc(class) => {
                json_content["class"] = self.format_class(class, 0);
            }
            Content::ProxyClassDesc(proxy) => {
                json_content["class"] = self.format_proxy(proxy);
            }
            Content::NewEnum(constant) => {
                json_content["class"] = self.format_class_desc(&constant.enum_description);
                json_content["constant"] = from(constant.constant_name.as_str());
            }
            Content::Utf(string) | Content::LongUtf(string) => {
                json_content["value"] = from(string.as_str());
            }
            Content::BlockData(bytes) | Content::BlockDataLong(bytes) => {
                json_content["data"] = from(BASE64_STANDARD.encode(bytes));
            }
            Content::Reference(reference) => {
                json_content["handle"] = from(handle(*reference));
            }
            Content::Exception(throwable) => {
                json_content["throwable"] = self.format_content(throwable);
            }
            Content::EndBlockData | Content::Reset | Content::NullReference => {}
        }
        json_content
    }

    fn format_object(&self, object: &'a NewObject, _: usize) -> JsonValue {
        object! {
            class: self.format_class_desc(&object.class_desc),
            data: self.format_values(&object.class_data),
        }
    }

    fn format_class(&self, class: &'a NewClassDesc, level: usize) -> JsonValue {
        let fields: Vec<JsonValue> = class.fields.iter().map(format_field).collect();
        let super_class = match &class.super_class {
            ClassDesc::New(super_class) => self.format_class(super_class, level + 1),
            other => self.format_class_desc(other),
        };

        object! {
            kind: "NewClassDesc",
            name: class.class_name.as_str(),
            serial_version: class.serial_version,
            flags: class.flags,
            "enum": class.is_enum(),
            fields: fields,
            annotations: self.format_annotation(&class.class_annotation),
            super_class: super_class,
        }
    }

    fn format_array(&self, array: &'a NewArray, _: usize) -> JsonValue {
        object! {
            class: self.format_class_desc(&array.array_description),
            "type": array.array_type.to_string(),
            values: self.format_values(&array.values),
        }
    }
}

impl<'a> JSON<'a> {
    fn format_class_desc(&self, class_desc: &'a ClassDesc) -> JsonValue {
        match class_desc {
            ClassDesc::New(class) => self.format_class(class, 0),
            ClassDesc::Proxy(proxy) => self.format_proxy(proxy),
            ClassDesc::Reference(reference) => object! {
                kind: "Reference",
                handle: handle(*reference),
            },
            ClassDesc::Null => JsonValue::Null,
        }
    }

    fn format_proxy(&self, proxy: &'a ProxyClassDesc) -> JsonValue {
        object! {
            kind: "ProxyClassDesc",
            interfaces: proxy.interfaces.clone(),
            annotations: self.format_annotation(&proxy.class_annotation),
            super_class: self.format_class_desc(&proxy.super_class),
        }
    }

    fn format_annotation(&self, annotation: &'a Annotation) -> JsonValue {
        JsonValue::Array(
            annotation
                .contents
                .iter()
                .map(|content| self.format_content(content))
                .collect(),
        )
    }

    fn format_values(&self, values: &'a [Value]) -> JsonValue {
        JsonValue::Array(values.iter().map(|value| self.format_value(value)).collect())
    }

    fn format_value(&self, value: &'a Value) -> JsonValue {
        match value {
            Value::Byte(value) => from(*value),
            Value::Char(_) => from(value.to_string()),
            Value::Double(value) => from(*value),
            Value::Float(value) => from(*value),
            Value::Integer(value) => from(*value),
            Value::Long(value) => from(*value),
            Value::Short(value) => from(*value),
            Value::Boolean(value) => from(*value),
            Value::Object(content) => self.format_content(content),
            Value::Annotation(annotation) => object! {
                kind: "Annotation",
                contents: self.format_annotation(annotation),
            },
        }
    }
}

fn format_field(field: &Field) -> JsonValue {
    object! {
        name: field.name.as_str(),
        "type": field.field_type.to_string(),
        type_name: field.type_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, sync::Arc};

    use java_stream::util::stream::models::{
        Annotation, ClassDesc, Content, Field, FieldType, NewArray, NewClassDesc, NewEnum,
        NewObject, Stream, Value,
    };

    use crate::{
        app::{
            error::RuntimeError,
            options::{ExportType, Options, Selection},
            runtime::Config,
        },
        exporters::{
            exporter::{Exporter, Writer},
            json::JSON,
        },
    };

    fn fake_config(selection: Selection, contents: Vec<Content>) -> Config {
        Config {
            options: Options {
                stream_path: PathBuf::from("fake.ser"),
                selection,
                export_type: ExportType::Json,
                verbose: false,
            },
            stream: Stream {
                magic: 0xACED,
                version: 5,
                contents,
                references: vec![Content::Utf("ref".to_string())],
            },
        }
    }

    fn point() -> NewObject {
        NewObject {
            class_desc: ClassDesc::New(Arc::new(NewClassDesc {
                class_name: "demo.Point".to_string(),
                serial_version: 1,
                flags: 0x02,
                fields: vec![
                    Field {
                        field_type: FieldType::Integer,
                        name: "x".to_string(),
                        type_name: None,
                    },
                    Field {
                        field_type: FieldType::Object,
                        name: "label".to_string(),
                        type_name: Some("Ljava/lang/String;".to_string()),
                    },
                ],
                class_annotation: Annotation::default(),
                super_class: ClassDesc::Null,
            })),
            class_data: vec![
                Value::Integer(3),
                Value::Object(Content::Reference(0x7E0000)),
            ],
        }
    }

    #[test]
    fn can_format_json_object() {
        let config = fake_config(Selection::Stream, vec![]);
        let exporter = JSON::new(&config);

        let object = point();
        let actual = exporter.format_object(&object, 0);

        assert_eq!(actual["class"]["name"], "demo.Point");
        assert_eq!(actual["class"]["serial_version"], 1);
        assert!(actual["class"]["super_class"].is_null());
        assert_eq!(actual["class"]["enum"], false);
        assert_eq!(actual["class"]["fields"][0]["type"], "int");
        assert!(actual["class"]["fields"][0]["type_name"].is_null());
        assert_eq!(actual["class"]["fields"][1]["type_name"], "Ljava/lang/String;");
        assert_eq!(actual["data"][0], 3);
        assert_eq!(actual["data"][1]["kind"], "Reference");
        assert_eq!(actual["data"][1]["handle"], "0x7e0000");
    }

    #[test]
    fn can_format_json_enum_constant() {
        let config = fake_config(Selection::Stream, vec![]);
        let exporter = JSON::new(&config);

        let constant = Content::NewEnum(Arc::new(NewEnum {
            enum_description: ClassDesc::New(Arc::new(NewClassDesc {
                class_name: "demo.Color".to_string(),
                serial_version: 0,
                flags: 0x12,
                fields: vec![],
                class_annotation: Annotation::default(),
                super_class: ClassDesc::Reference(0x7E0002),
            })),
            constant_name: "RED".to_string(),
        }));
        let actual = exporter.format_content(&constant);

        assert_eq!(actual["kind"], "NewEnum");
        assert_eq!(actual["constant"], "RED");
        assert_eq!(actual["class"]["flags"], 0x12);
        assert_eq!(actual["class"]["enum"], true);
        assert_eq!(actual["class"]["super_class"]["handle"], "0x7e0002");
    }

    #[test]
    fn can_format_json_block_data() {
        let config = fake_config(Selection::Stream, vec![]);
        let exporter = JSON::new(&config);

        let content = Content::BlockData(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        let actual = exporter.format_content(&content);

        assert_eq!(actual["kind"], "BlockData");
        assert_eq!(actual["data"], "3q2+7w==");
    }

    #[test]
    fn can_format_json_array() {
        let config = fake_config(Selection::Stream, vec![]);
        let exporter = JSON::new(&config);

        let array = NewArray {
            array_description: ClassDesc::Reference(0x7E0001),
            array_type: FieldType::Char,
            values: vec![Value::Char(0x41), Value::Char(0x42)],
        };
        let actual = exporter.format_array(&array, 0);

        assert_eq!(actual["class"]["handle"], "0x7e0001");
        assert_eq!(actual["type"], "char");
        assert_eq!(actual["values"][0], "A");
        assert_eq!(actual["values"][1], "B");
    }

    #[test]
    fn can_export_json_stream() {
        let config = fake_config(
            Selection::Stream,
            vec![Content::NullReference, Content::NewObject(Arc::new(point()))],
        );
        let exporter = JSON::new(&config);

        let output = exporter.export().unwrap();
        assert!(output.ends_with('\n'));

        let actual = json::parse(&output).unwrap();
        assert_eq!(actual["magic"], "0xaced");
        assert_eq!(actual["version"], 5);
        assert_eq!(actual["contents"].len(), 2);
        assert_eq!(actual["contents"][0]["kind"], "NullReference");
        assert_eq!(actual["contents"][1]["kind"], "NewObject");
        assert_eq!(actual["references"][0]["handle"], "0x7e0000");
        assert_eq!(actual["references"][0]["content"]["value"], "ref");
    }

    #[test]
    fn cant_export_missing_selection() {
        let config = fake_config(Selection::Object(3), vec![Content::NullReference]);
        let exporter = JSON::new(&config);

        assert!(matches!(
            exporter.export(),
            Err(RuntimeError::MissingContent(3, 1))
        ));
    }
}
