/*!
 Contains logic to decode a Java Object Serialization Stream into the structures in [`models`](crate::util::stream::models).

 Logic referenced from the stream grammar located at:
   - [Object Serialization Stream Protocol](https://docs.oracle.com/javase/8/docs/platform/serialization/spec/protocol.html)
   - [`ObjectInputStream`](https://docs.oracle.com/javase/8/docs/api/java/io/ObjectInputStream.html)
*/
use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    error::stream::StreamError,
    util::{
        mutf8,
        stream::models::{
            Annotation, ClassDesc, Content, Field, FieldType, NewArray, NewClass, NewClassDesc,
            NewEnum, NewObject, ProxyClassDesc, Stream, Value, BASE_WIRE_HANDLE,
        },
    },
};

/// The first two bytes of every stream
pub const STREAM_MAGIC: u16 = 0xACED;
/// The only protocol version written since JDK 1.2
pub const STREAM_VERSION: u16 = 5;

const TC_NULL: u8 = 0x70;
const TC_REFERENCE: u8 = 0x71;
const TC_CLASSDESC: u8 = 0x72;
const TC_OBJECT: u8 = 0x73;
const TC_STRING: u8 = 0x74;
const TC_ARRAY: u8 = 0x75;
const TC_CLASS: u8 = 0x76;
const TC_BLOCKDATA: u8 = 0x77;
const TC_ENDBLOCKDATA: u8 = 0x78;
const TC_RESET: u8 = 0x79;
const TC_BLOCKDATALONG: u8 = 0x7A;
const TC_EXCEPTION: u8 = 0x7B;
const TC_LONGSTRING: u8 = 0x7C;
const TC_PROXYCLASSDESC: u8 = 0x7D;
const TC_ENUM: u8 = 0x7E;

/// Records nested deeper than this are rejected instead of recursing further
///
/// Each level costs several stack frames; this fits within a 2 MiB thread stack.
pub const MAX_DEPTH: usize = 128;

/// Contains logic and data used to decode a Java Object Serialization Stream
#[derive(Debug)]
pub struct StreamReader<'a> {
    /// The stream we want to parse
    stream: &'a [u8],
    /// The current index we are at in the stream
    idx: usize,
    /// As we parse the stream, build the table of records that later references point to
    ///
    /// A slot is `None` while the record it belongs to is still being decoded.
    handles: Vec<Option<Content>>,
    /// How many records we are currently nested inside of
    depth: usize,
}

impl<'a> From<&'a [u8]> for StreamReader<'a> {
    fn from(stream: &'a [u8]) -> Self {
        Self {
            stream,
            idx: 0,
            handles: vec![],
            depth: 0,
        }
    }
}

impl<'a> From<&'a Vec<u8>> for StreamReader<'a> {
    fn from(stream: &'a Vec<u8>) -> Self {
        Self::from(stream.as_slice())
    }
}

impl<'a> StreamReader<'a> {
    /// Read exactly `n` bytes from the stream
    fn read_exact_bytes(&mut self, n: usize) -> Result<&'a [u8], StreamError> {
        let stream = self.stream;
        let range = self
            .idx
            .checked_add(n)
            .and_then(|end| stream.get(self.idx..end))
            .ok_or(StreamError::OutOfBounds(
                self.idx.saturating_add(n),
                stream.len(),
            ))?;
        self.idx += n;
        Ok(range)
    }

    /// Read exactly `N` bytes from the stream into an array
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], StreamError> {
        self.read_exact_bytes(N)?
            .try_into()
            .map_err(StreamError::SliceError)
    }

    fn read_u8(&mut self) -> Result<u8, StreamError> {
        let byte = self.get_current_byte()?;
        self.idx += 1;
        Ok(byte)
    }

    fn read_i8(&mut self) -> Result<i8, StreamError> {
        Ok(i8::from_be_bytes(self.read_array()?))
    }

    fn read_u16(&mut self) -> Result<u16, StreamError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    fn read_i16(&mut self) -> Result<i16, StreamError> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> Result<u32, StreamError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    fn read_i32(&mut self) -> Result<i32, StreamError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    fn read_u64(&mut self) -> Result<u64, StreamError> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    fn read_i64(&mut self) -> Result<i64, StreamError> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    fn read_f32(&mut self) -> Result<f32, StreamError> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    fn read_f64(&mut self) -> Result<f64, StreamError> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    /// Read a signed 32-bit length, rejecting negative values
    fn read_length(&mut self) -> Result<usize, StreamError> {
        let offset = self.idx;
        let length = self.read_i32()?;
        usize::try_from(length).map_err(|_| StreamError::NegativeLength(length, offset))
    }

    /// Get the byte at a given index, if the index is within the bounds of the stream
    fn get_byte(&self, byte_idx: usize) -> Result<u8, StreamError> {
        self.stream
            .get(byte_idx)
            .copied()
            .ok_or(StreamError::OutOfBounds(byte_idx, self.stream.len()))
    }

    /// Read the current byte without consuming it
    fn get_current_byte(&self) -> Result<u8, StreamError> {
        self.get_byte(self.idx)
    }

    /// Never allocate more slots up front than there are bytes left to fill them
    fn capacity_hint(&self, length: usize) -> usize {
        length.min(self.stream.len().saturating_sub(self.idx))
    }

    /// Read `n` bytes of modified UTF-8 as a [`String`]
    fn read_exact_as_string(&mut self, n: usize) -> Result<String, StreamError> {
        let start = self.idx;
        let bytes = self.read_exact_bytes(n)?;
        mutf8::decode(bytes).map_err(|offset| StreamError::StringParseError(start + offset))
    }

    /// Read a string prefixed with a [`u16`] length
    fn read_utf(&mut self) -> Result<String, StreamError> {
        let length = self.read_u16()?;
        self.read_exact_as_string(length as usize)
    }

    /// Read a string prefixed with a [`u64`] length
    fn read_long_utf(&mut self) -> Result<String, StreamError> {
        let offset = self.idx;
        let length = self.read_u64()?;
        let length = usize::try_from(length)
            .map_err(|_| StreamError::OutOfBounds(offset, self.stream.len()))?;
        self.read_exact_as_string(length)
    }

    /// Run `read` one level deeper, failing instead of recursing past [`MAX_DEPTH`]
    fn nested<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, StreamError>,
    ) -> Result<T, StreamError> {
        if self.depth >= MAX_DEPTH {
            return Err(StreamError::MaxDepthExceeded(self.idx));
        }
        self.depth += 1;
        let result = read(self);
        self.depth -= 1;
        result
    }

    /// Reserve the next handle for a record that is still being decoded
    fn new_handle(&mut self) -> usize {
        let slot = self.handles.len();
        trace!(
            handle = slot as u32 + BASE_WIRE_HANDLE,
            offset = self.idx,
            "assigned handle"
        );
        self.handles.push(None);
        slot
    }

    /// Store a finished record in a reserved handle slot
    fn fill_handle(&mut self, slot: usize, content: Content) {
        if let Some(entry) = self.handles.get_mut(slot) {
            *entry = Some(content);
        }
    }

    /// Read a handle and validate that it points into the handle table
    fn read_handle(&mut self) -> Result<u32, StreamError> {
        let handle = self.read_u32()?;
        match handle.checked_sub(BASE_WIRE_HANDLE) {
            Some(slot) if (slot as usize) < self.handles.len() => Ok(handle),
            _ => Err(StreamError::InvalidHandle(handle)),
        }
    }

    /// Get a finished record from the handle table
    fn get_handle(&self, handle: u32) -> Result<&Content, StreamError> {
        let slot = handle
            .checked_sub(BASE_WIRE_HANDLE)
            .ok_or(StreamError::InvalidHandle(handle))?;
        match self.handles.get(slot as usize) {
            Some(Some(content)) => Ok(content),
            Some(None) => Err(StreamError::InvalidReference(handle, "finished record")),
            None => Err(StreamError::InvalidHandle(handle)),
        }
    }

    /// Read any record
    fn read_content(&mut self) -> Result<Content, StreamError> {
        self.nested(Self::read_content_inner)
    }

    fn read_content_inner(&mut self) -> Result<Content, StreamError> {
        let offset = self.idx;
        let tag = self.read_u8()?;
        debug!(tag, offset, depth = self.depth, "reading content");

        match tag {
            TC_OBJECT => self.read_new_object(),
            TC_CLASS => self.read_new_class(),
            TC_ARRAY => self.read_new_array(),
            TC_STRING => {
                let slot = self.new_handle();
                let content = Content::Utf(self.read_utf()?);
                self.fill_handle(slot, content.clone());
                Ok(content)
            }
            TC_LONGSTRING => {
                let slot = self.new_handle();
                let content = Content::LongUtf(self.read_long_utf()?);
                self.fill_handle(slot, content.clone());
                Ok(content)
            }
            TC_ENUM => self.read_new_enum(),
            TC_CLASSDESC => Ok(Content::NewClassDesc(self.read_new_class_desc()?)),
            TC_PROXYCLASSDESC => Ok(Content::ProxyClassDesc(self.read_proxy_class_desc()?)),
            TC_REFERENCE => Ok(Content::Reference(self.read_handle()?)),
            TC_NULL => Ok(Content::NullReference),
            TC_BLOCKDATA => {
                let length = self.read_u8()?;
                Ok(Content::BlockData(self.read_exact_bytes(length as usize)?.to_vec()))
            }
            TC_BLOCKDATALONG => {
                let length = self.read_length()?;
                Ok(Content::BlockDataLong(self.read_exact_bytes(length)?.to_vec()))
            }
            TC_ENDBLOCKDATA => Ok(Content::EndBlockData),
            TC_RESET => {
                // Handles belonging to records we are still inside of would be lost
                if self.depth > 1 {
                    return Err(StreamError::InvalidTag(tag, offset));
                }
                self.handles.clear();
                Ok(Content::Reset)
            }
            TC_EXCEPTION => {
                // The writer aborted in the middle of the enclosing record
                if self.depth > 1 {
                    return Err(StreamError::InvalidTag(tag, offset));
                }
                self.handles.clear();
                let throwable = self.read_content()?;
                self.handles.clear();
                Ok(Content::Exception(Box::new(throwable)))
            }
            other => Err(StreamError::InvalidTag(other, offset)),
        }
    }

    /// Read the class descriptor slot used by objects, arrays, classes, enums, and super classes
    fn read_class_desc(&mut self) -> Result<ClassDesc, StreamError> {
        self.nested(|reader| {
            let offset = reader.idx;
            match reader.read_u8()? {
                TC_CLASSDESC => Ok(ClassDesc::New(reader.read_new_class_desc()?)),
                TC_PROXYCLASSDESC => Ok(ClassDesc::Proxy(reader.read_proxy_class_desc()?)),
                TC_REFERENCE => Ok(ClassDesc::Reference(reader.read_handle()?)),
                TC_NULL => Ok(ClassDesc::Null),
                other => Err(StreamError::InvalidTag(other, offset)),
            }
        })
    }

    /// Read a class descriptor; the leading [`TC_CLASSDESC`] tag has already been consumed
    fn read_new_class_desc(&mut self) -> Result<Arc<NewClassDesc>, StreamError> {
        let class_name = self.read_utf()?;
        let serial_version = self.read_i64()?;
        let slot = self.new_handle();
        let flags = self.read_u8()?;

        let field_count = self.read_u16()?;
        let mut fields = Vec::with_capacity(self.capacity_hint(field_count as usize));
        for _ in 0..field_count {
            fields.push(self.read_field()?);
        }

        let class_annotation = self.read_annotation()?;
        let super_class = self.read_class_desc()?;

        let desc = Arc::new(NewClassDesc {
            class_name,
            serial_version,
            flags,
            fields,
            class_annotation,
            super_class,
        });
        self.fill_handle(slot, Content::NewClassDesc(Arc::clone(&desc)));
        Ok(desc)
    }

    /// Read a dynamic proxy class descriptor; the leading [`TC_PROXYCLASSDESC`] tag has already been consumed
    fn read_proxy_class_desc(&mut self) -> Result<Arc<ProxyClassDesc>, StreamError> {
        let slot = self.new_handle();

        let count = self.read_length()?;
        let mut interfaces = Vec::with_capacity(self.capacity_hint(count));
        for _ in 0..count {
            interfaces.push(self.read_utf()?);
        }

        let class_annotation = self.read_annotation()?;
        let super_class = self.read_class_desc()?;

        let desc = Arc::new(ProxyClassDesc {
            interfaces,
            class_annotation,
            super_class,
        });
        self.fill_handle(slot, Content::ProxyClassDesc(Arc::clone(&desc)));
        Ok(desc)
    }

    /// Read a field descriptor
    fn read_field(&mut self) -> Result<Field, StreamError> {
        let offset = self.idx;
        let code = self.read_u8()?;
        let field_type =
            FieldType::from_code(code).ok_or(StreamError::InvalidFieldType(code, offset))?;
        let name = self.read_utf()?;

        let type_name = if field_type.is_primitive() {
            None
        } else {
            Some(self.read_string_content()?)
        };

        Ok(Field {
            field_type,
            name,
            type_name,
        })
    }

    /// Read a string record that may be written in place or as a back-reference
    fn read_string_content(&mut self) -> Result<String, StreamError> {
        let offset = self.idx;
        match self.read_content()? {
            Content::Utf(string) | Content::LongUtf(string) => Ok(string),
            Content::Reference(handle) => match self.get_handle(handle)? {
                Content::Utf(string) | Content::LongUtf(string) => Ok(string.clone()),
                _ => Err(StreamError::InvalidReference(handle, "string")),
            },
            _ => Err(StreamError::InvalidTag(self.get_byte(offset)?, offset)),
        }
    }

    /// Read contents until the [`TC_ENDBLOCKDATA`] marker
    fn read_annotation(&mut self) -> Result<Annotation, StreamError> {
        let mut contents = vec![];
        while self.get_current_byte()? != TC_ENDBLOCKDATA {
            contents.push(self.read_content()?);
        }
        self.idx += 1;
        Ok(Annotation { contents })
    }

    /// Walk the superclass chain of a descriptor, returning the classes starting with the top-most superclass
    ///
    /// Proxy classes have no serializable fields, so they are skipped. The descriptors are shared, not copied.
    fn class_hierarchy(&self, desc: &ClassDesc) -> Result<Vec<Arc<NewClassDesc>>, StreamError> {
        let mut hierarchy = vec![];
        let mut current = desc;
        for _ in 0..MAX_DEPTH {
            current = match current {
                ClassDesc::New(class) => {
                    hierarchy.push(Arc::clone(class));
                    &class.super_class
                }
                ClassDesc::Proxy(proxy) => &proxy.super_class,
                ClassDesc::Reference(handle) => match self.get_handle(*handle)? {
                    Content::NewClassDesc(class) => {
                        hierarchy.push(Arc::clone(class));
                        &class.super_class
                    }
                    Content::ProxyClassDesc(proxy) => &proxy.super_class,
                    _ => return Err(StreamError::InvalidReference(*handle, "class descriptor")),
                },
                ClassDesc::Null => {
                    hierarchy.reverse();
                    return Ok(hierarchy);
                }
            };
        }
        Err(StreamError::MaxDepthExceeded(self.idx))
    }

    /// Read a single value of the given type
    fn read_value(&mut self, field_type: FieldType) -> Result<Value, StreamError> {
        Ok(match field_type {
            FieldType::Byte => Value::Byte(self.read_i8()?),
            FieldType::Char => Value::Char(self.read_u16()?),
            FieldType::Double => Value::Double(self.read_f64()?),
            FieldType::Float => Value::Float(self.read_f32()?),
            FieldType::Integer => Value::Integer(self.read_i32()?),
            FieldType::Long => Value::Long(self.read_i64()?),
            FieldType::Short => Value::Short(self.read_i16()?),
            FieldType::Boolean => Value::Boolean(self.read_u8()? != 0),
            FieldType::Array | FieldType::Object => Value::Object(self.read_content()?),
        })
    }

    /// Read the data for every class in an object's hierarchy
    fn read_class_data(&mut self, desc: &ClassDesc) -> Result<Vec<Value>, StreamError> {
        let mut values = vec![];
        for class in self.class_hierarchy(desc)? {
            if class.is_serializable() {
                for field in &class.fields {
                    values.push(self.read_value(field.field_type)?);
                }
                if class.has_write_method() {
                    values.push(Value::Annotation(self.read_annotation()?));
                }
            } else if class.is_externalizable() {
                if !class.has_block_data() {
                    return Err(StreamError::UnsupportedExternalContents(
                        class.class_name.clone(),
                    ));
                }
                values.push(Value::Annotation(self.read_annotation()?));
            }
        }
        Ok(values)
    }

    /// Read an object; the leading [`TC_OBJECT`] tag has already been consumed
    fn read_new_object(&mut self) -> Result<Content, StreamError> {
        let class_desc = self.read_class_desc()?;
        let slot = self.new_handle();
        let class_data = self.read_class_data(&class_desc)?;

        let content = Content::NewObject(Arc::new(NewObject {
            class_desc,
            class_data,
        }));
        self.fill_handle(slot, content.clone());
        Ok(content)
    }

    /// Determine the element type of an array from the name of its class, i.e. `[I` or `[Ljava.lang.String;`
    fn array_type(&self, desc: &ClassDesc) -> Result<FieldType, StreamError> {
        let class_name = match desc {
            ClassDesc::New(class) => class.class_name.clone(),
            ClassDesc::Reference(handle) => match self.get_handle(*handle)? {
                Content::NewClassDesc(class) => class.class_name.clone(),
                _ => return Err(StreamError::InvalidReference(*handle, "class descriptor")),
            },
            other => return Err(StreamError::InvalidArrayType(other.name())),
        };

        let code = match class_name.as_bytes() {
            [b'[', code, ..] => Some(*code),
            _ => None,
        };
        code.and_then(FieldType::from_code)
            .ok_or(StreamError::InvalidArrayType(class_name))
    }

    /// Read an array; the leading [`TC_ARRAY`] tag has already been consumed
    fn read_new_array(&mut self) -> Result<Content, StreamError> {
        let array_description = self.read_class_desc()?;
        let array_type = self.array_type(&array_description)?;
        let slot = self.new_handle();

        let length = self.read_length()?;
        let mut values = Vec::with_capacity(self.capacity_hint(length));
        for _ in 0..length {
            values.push(self.read_value(array_type)?);
        }

        let content = Content::NewArray(Arc::new(NewArray {
            array_description,
            array_type,
            values,
        }));
        self.fill_handle(slot, content.clone());
        Ok(content)
    }

    /// Read an enum constant; the leading [`TC_ENUM`] tag has already been consumed
    fn read_new_enum(&mut self) -> Result<Content, StreamError> {
        let enum_description = self.read_class_desc()?;
        let slot = self.new_handle();
        let constant_name = self.read_string_content()?;

        let content = Content::NewEnum(Arc::new(NewEnum {
            enum_description,
            constant_name,
        }));
        self.fill_handle(slot, content.clone());
        Ok(content)
    }

    /// Read a class; the leading [`TC_CLASS`] tag has already been consumed
    fn read_new_class(&mut self) -> Result<Content, StreamError> {
        let class_description = self.read_class_desc()?;
        let slot = self.new_handle();

        let content = Content::NewClass(Arc::new(NewClass { class_description }));
        self.fill_handle(slot, content.clone());
        Ok(content)
    }

    /// Validate the stream magic and protocol version
    pub(crate) fn validate_header(&mut self) -> Result<(u16, u16), StreamError> {
        let magic = self.read_u16()?;
        if magic != STREAM_MAGIC {
            return Err(StreamError::InvalidMagic(magic));
        }

        let version = self.read_u16()?;
        if version != STREAM_VERSION {
            return Err(StreamError::UnsupportedVersion(version));
        }

        Ok((magic, version))
    }

    /// Decode every record in the stream
    ///
    /// Output for a single serialized `demo.Point` looks like:
    /// ```txt
    /// Stream {
    ///     magic: 0xACED,
    ///     version: 5,
    ///     contents: [NewObject(NewObject { class_desc: New(NewClassDesc { class_name: "demo.Point", .. }), class_data: [Integer(3), Integer(-4)] })],
    ///     references: [NewClassDesc(..), NewObject(..)],
    /// }
    /// ```
    pub fn parse(&mut self) -> Result<Stream, StreamError> {
        let (magic, version) = self.validate_header()?;

        let mut contents = vec![];
        while self.idx < self.stream.len() {
            contents.push(self.read_content()?);
        }

        // Every reserved slot is filled before the record that reserved it returns
        let references = self.handles.drain(..).flatten().collect();

        Ok(Stream {
            magic,
            version,
            contents,
            references,
        })
    }
}
