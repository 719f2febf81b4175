/*!
 This module defines the decoding utilities used to read Java serialization data.
*/

pub mod mutf8;
pub mod stream;
