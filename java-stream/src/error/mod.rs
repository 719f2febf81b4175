/*!
 Errors that can happen when decoding Java serialization data.
*/

pub mod stream;
