/*!
 Contains logic and data structures used to decode Java Object Serialization Stream data into native Rust data structures.

 ## Overview

 The stream format is the binary serialization protocol written by `java.io.ObjectOutputStream` and read by
 `java.io.ObjectInputStream`. A stream is a header followed by a sequence of tagged records: objects, arrays,
 strings, enum constants, class descriptors, raw block data, and back-references to records already written.

 ## Handles

 Every new object, array, string, enum constant, class, and class descriptor is assigned a handle when it is written.
 Later occurrences of the same record are written as a reference to that handle instead of being repeated.

 ## Features

 - Pure Rust implementation with no JVM required
 - Records are decoded into plain data; nothing is instantiated
 - Malformed, truncated, or hostile input produces a [`StreamError`](crate::error::stream::StreamError) instead of a panic
*/

pub mod models;
pub mod parser;
