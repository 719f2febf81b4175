/*!
 Data structures produced when decoding a Java Object Serialization Stream.

 The names follow the grammar in the [Object Serialization Stream Protocol](https://docs.oracle.com/javase/8/docs/platform/serialization/spec/protocol.html).
*/

use std::{
    fmt::{Display, Formatter, Result},
    sync::Arc,
};

use crate::{
    error::stream::StreamError,
    util::stream::parser::StreamReader,
};

/// The first handle assigned in a stream; handles are offsets from this value
pub const BASE_WIRE_HANDLE: u32 = 0x7E0000;

/// The class defines a `writeObject` method, so its data is followed by an annotation
pub const SC_WRITE_METHOD: u8 = 0x01;
/// The class implements `java.io.Serializable`
pub const SC_SERIALIZABLE: u8 = 0x02;
/// The class implements `java.io.Externalizable`
pub const SC_EXTERNALIZABLE: u8 = 0x04;
/// Externalizable data was written in block data mode
pub const SC_BLOCK_DATA: u8 = 0x08;
/// The class is an `enum` type
pub const SC_ENUM: u8 = 0x10;

/// A decoded Java Object Serialization Stream
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    /// The stream magic, always `0xACED`
    pub magic: u16,
    /// The stream protocol version
    pub version: u16,
    /// The top-level records, in the order they were written
    pub contents: Vec<Content>,
    /// The handle table: entry `i` was assigned handle [`BASE_WIRE_HANDLE`] + `i`
    ///
    /// A [`Content::Reset`] clears the table, so this only holds the handles assigned after the last reset.
    pub references: Vec<Content>,
}

impl Stream {
    /// Decode a complete stream from a byte buffer
    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, StreamError> {
        StreamReader::from(bytes).parse()
    }

    /// Look up the record a wire handle was assigned to
    pub fn resolve(&self, handle: u32) -> Option<&Content> {
        let index = handle.checked_sub(BASE_WIRE_HANDLE)?;
        self.references.get(index as usize)
    }
}

impl Display for Stream {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        writeln!(fmt, "@magic: 0x{:x}", self.magic)?;
        writeln!(fmt, "@version: {}", self.version)?;
        writeln!(fmt, "@contents: [")?;
        for content in &self.contents {
            writeln!(fmt, "  {}", content.describe())?;
        }
        writeln!(fmt, "]")?;
        writeln!(fmt, "@references: [")?;
        for (idx, content) in self.references.iter().enumerate() {
            writeln!(
                fmt,
                "  [{:x}] {}",
                idx as u32 + BASE_WIRE_HANDLE,
                content.describe()
            )?;
        }
        writeln!(fmt, "]")
    }
}

/// A single record in the stream
///
/// Records that are assigned a handle are shared with the handle table, so cloning a record never copies its subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// An instance of a class along with its field data
    NewObject(Arc<NewObject>),
    /// An array along with its elements
    NewArray(Arc<NewArray>),
    /// A `java.lang.Class` instance
    NewClass(Arc<NewClass>),
    /// A class descriptor written outside of an object
    NewClassDesc(Arc<NewClassDesc>),
    /// A dynamic proxy class descriptor written outside of an object
    ProxyClassDesc(Arc<ProxyClassDesc>),
    /// An `enum` constant
    NewEnum(Arc<NewEnum>),
    /// A string shorter than 64 KiB
    Utf(String),
    /// A string of 64 KiB or more
    LongUtf(String),
    /// Raw bytes written by `writeObject` or `writeExternal`
    BlockData(Vec<u8>),
    /// Raw bytes, more than 255 at a time
    BlockDataLong(Vec<u8>),
    /// The end of an annotation
    EndBlockData,
    /// The writer reset its handle table
    Reset,
    /// `null`
    NullReference,
    /// A back-reference to a previously assigned handle
    Reference(u32),
    /// An exception thrown while the writer was serializing
    Exception(Box<Content>),
}

impl Content {
    /// The name of the grammar production this record was decoded from
    pub fn kind(&self) -> &'static str {
        match self {
            Content::NewObject(_) => "NewObject",
            Content::NewArray(_) => "NewArray",
            Content::NewClass(_) => "NewClass",
            Content::NewClassDesc(_) => "NewClassDesc",
            Content::ProxyClassDesc(_) => "ProxyClassDesc",
            Content::NewEnum(_) => "NewEnum",
            Content::Utf(_) => "Utf",
            Content::LongUtf(_) => "LongUtf",
            Content::BlockData(_) => "BlockData",
            Content::BlockDataLong(_) => "BlockDataLong",
            Content::EndBlockData => "EndBlockData",
            Content::Reset => "Reset",
            Content::NullReference => "NullReference",
            Content::Reference(_) => "Reference",
            Content::Exception(_) => "Exception",
        }
    }

    /// Render the record along with its kind, i.e. `Utf { hello }`
    pub fn describe(&self) -> String {
        let body = self.to_string();
        if body.is_empty() {
            return self.kind().to_string();
        }
        format!("{} {{ {body} }}", self.kind())
    }
}

impl Display for Content {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            Content::NewObject(object) => write!(fmt, "{object}"),
            Content::NewArray(array) => write!(fmt, "{array}"),
            Content::NewClass(class) => write!(fmt, "{class}"),
            Content::NewClassDesc(desc) => write!(fmt, "{desc}"),
            Content::ProxyClassDesc(desc) => write!(fmt, "{desc}"),
            Content::NewEnum(constant) => write!(fmt, "{constant}"),
            Content::Utf(string) | Content::LongUtf(string) => write!(fmt, "{string}"),
            Content::BlockData(bytes) | Content::BlockDataLong(bytes) => {
                let bytes: Vec<String> = bytes.iter().map(|byte| format!("0x{byte:x}")).collect();
                write!(fmt, "[ {} ]", bytes.join(", "))
            }
            Content::EndBlockData | Content::Reset => Ok(()),
            Content::NullReference => write!(fmt, "NULL"),
            Content::Reference(handle) => write!(fmt, "0x{handle:x}"),
            Content::Exception(throwable) => write!(fmt, "{}", throwable.describe()),
        }
    }
}

/// The slot in the grammar where a class is described
#[derive(Debug, Clone, PartialEq)]
pub enum ClassDesc {
    /// A class described in place
    New(Arc<NewClassDesc>),
    /// A dynamic proxy class described in place
    Proxy(Arc<ProxyClassDesc>),
    /// A back-reference to a class described earlier in the stream
    Reference(u32),
    /// No class, i.e. the end of an inheritance chain
    Null,
}

impl ClassDesc {
    /// A short name for the described class
    pub fn name(&self) -> String {
        match self {
            ClassDesc::New(desc) => desc.class_name.clone(),
            ClassDesc::Proxy(_) => "Proxy".to_string(),
            ClassDesc::Reference(handle) => format!("0x{handle:x}"),
            ClassDesc::Null => "NULL".to_string(),
        }
    }
}

impl Display for ClassDesc {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            ClassDesc::New(desc) => write!(fmt, "{desc}"),
            ClassDesc::Proxy(desc) => write!(fmt, "{desc}"),
            ClassDesc::Reference(handle) => write!(fmt, "0x{handle:x}"),
            ClassDesc::Null => write!(fmt, "NULL"),
        }
    }
}

/// Metadata describing a serializable class
#[derive(Debug, Clone, PartialEq)]
pub struct NewClassDesc {
    /// The fully qualified class name, or the JVM signature for array classes
    pub class_name: String,
    /// The `serialVersionUID` of the class
    pub serial_version: i64,
    /// Bitmask of `SC_*` flags
    pub flags: u8,
    /// The serializable fields, in the order their values are written
    pub fields: Vec<Field>,
    /// Data written by `annotateClass`
    pub class_annotation: Annotation,
    /// The class this one inherits from
    pub super_class: ClassDesc,
}

impl NewClassDesc {
    pub fn is_serializable(&self) -> bool {
        self.flags & SC_SERIALIZABLE != 0
    }

    pub fn is_externalizable(&self) -> bool {
        self.flags & SC_EXTERNALIZABLE != 0
    }

    pub fn has_write_method(&self) -> bool {
        self.flags & SC_WRITE_METHOD != 0
    }

    pub fn has_block_data(&self) -> bool {
        self.flags & SC_BLOCK_DATA != 0
    }

    pub fn is_enum(&self) -> bool {
        self.flags & SC_ENUM != 0
    }
}

impl Display for NewClassDesc {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        let fields: Vec<String> = self.fields.iter().map(Field::to_string).collect();
        write!(fmt, "{}, [ {} ]", self.class_name, fields.join(", "))?;
        match &self.super_class {
            ClassDesc::Null => Ok(()),
            other => write!(fmt, ", @super_class: {}", other.name()),
        }
    }
}

/// Metadata describing a dynamic proxy class
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyClassDesc {
    /// Names of the interfaces the proxy implements
    pub interfaces: Vec<String>,
    /// Data written by `annotateProxyClass`
    pub class_annotation: Annotation,
    /// The class this one inherits from, usually `java.lang.reflect.Proxy`
    pub super_class: ClassDesc,
}

impl Display for ProxyClassDesc {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        write!(fmt, "[ {} ]", self.interfaces.join(", "))?;
        match &self.super_class {
            ClassDesc::Null => Ok(()),
            other => write!(fmt, ", @super_class: {}", other.name()),
        }
    }
}

/// A serializable field declared by a class
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub field_type: FieldType,
    pub name: String,
    /// The JVM type signature for object and array fields, i.e. `Ljava/lang/String;`
    pub type_name: Option<String>,
}

impl Display for Field {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match &self.type_name {
            Some(type_name) => write!(fmt, "{} ({type_name})", self.name),
            None => write!(fmt, "{} ({})", self.name, self.field_type),
        }
    }
}

/// Type codes used by fields and array elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Byte,
    Char,
    Double,
    Float,
    Integer,
    Long,
    Short,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'B' => Some(Self::Byte),
            b'C' => Some(Self::Char),
            b'D' => Some(Self::Double),
            b'F' => Some(Self::Float),
            b'I' => Some(Self::Integer),
            b'J' => Some(Self::Long),
            b'S' => Some(Self::Short),
            b'Z' => Some(Self::Boolean),
            b'[' => Some(Self::Array),
            b'L' => Some(Self::Object),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Array | Self::Object)
    }
}

impl Display for FieldType {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        let name = match self {
            FieldType::Byte => "byte",
            FieldType::Char => "char",
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Integer => "int",
            FieldType::Long => "long",
            FieldType::Short => "short",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        };
        write!(fmt, "{name}")
    }
}

/// Contents written by `annotateClass`, `writeObject`, or `writeExternal`, terminated by [`Content::EndBlockData`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Annotation {
    pub contents: Vec<Content>,
}

impl Display for Annotation {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        let contents: Vec<String> = self.contents.iter().map(Content::describe).collect();
        write!(fmt, "[ {} ]", contents.join(", "))
    }
}

/// An instance of a serializable class
#[derive(Debug, Clone, PartialEq)]
pub struct NewObject {
    pub class_desc: ClassDesc,
    /// Field values for every class in the hierarchy, starting with the top-most superclass
    pub class_data: Vec<Value>,
}

impl Display for NewObject {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        let data: Vec<String> = self.class_data.iter().map(Value::to_string).collect();
        write!(fmt, "{} => {{ {} }}", self.class_desc.name(), data.join(", "))
    }
}

/// An array and its elements
#[derive(Debug, Clone, PartialEq)]
pub struct NewArray {
    pub array_description: ClassDesc,
    /// The type of the elements, taken from the array class name
    pub array_type: FieldType,
    pub values: Vec<Value>,
}

impl Display for NewArray {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        let values: Vec<String> = self.values.iter().map(Value::to_string).collect();
        write!(fmt, "{}, [ {} ]", self.array_type, values.join(", "))
    }
}

/// An `enum` constant
#[derive(Debug, Clone, PartialEq)]
pub struct NewEnum {
    pub enum_description: ClassDesc,
    pub constant_name: String,
}

impl Display for NewEnum {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        write!(fmt, "{}.{}", self.enum_description.name(), self.constant_name)
    }
}

/// A `java.lang.Class` instance
#[derive(Debug, Clone, PartialEq)]
pub struct NewClass {
    pub class_description: ClassDesc,
}

impl Display for NewClass {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        write!(fmt, "{}", self.class_description.name())
    }
}

/// A field value or array element
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Byte(i8),
    /// A UTF-16 code unit
    Char(u16),
    Double(f64),
    Float(f32),
    Integer(i32),
    Long(i64),
    Short(i16),
    Boolean(bool),
    /// Any non-primitive value: objects, strings, arrays, references, or `null`
    Object(Content),
    /// Extra data written by a class' `writeObject` or `writeExternal` method
    Annotation(Annotation),
}

impl Value {
    /// A short description of what kind of value this is
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Byte(_) => "byte",
            Value::Char(_) => "char",
            Value::Double(_) => "double",
            Value::Float(_) => "float",
            Value::Integer(_) => "int",
            Value::Long(_) => "long",
            Value::Short(_) => "short",
            Value::Boolean(_) => "boolean",
            Value::Object(content) => content.kind(),
            Value::Annotation(_) => "Annotation",
        }
    }
}

impl Display for Value {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            Value::Byte(value) => write!(fmt, "{value}"),
            Value::Char(value) => match char::from_u32(*value as u32) {
                Some(ch) => write!(fmt, "{ch}"),
                None => write!(fmt, "\\u{value:04x}"),
            },
            Value::Double(value) => write!(fmt, "{value}"),
            Value::Float(value) => write!(fmt, "{value}"),
            Value::Integer(value) => write!(fmt, "{value}"),
            Value::Long(value) => write!(fmt, "{value}"),
            Value::Short(value) => write!(fmt, "{value}"),
            Value::Boolean(value) => write!(fmt, "{value}"),
            Value::Object(content) => write!(fmt, "{}", content.describe()),
            Value::Annotation(annotation) => write!(fmt, "@annotation: {annotation}"),
        }
    }
}
