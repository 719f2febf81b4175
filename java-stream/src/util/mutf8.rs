/*!
 Decoding for the modified UTF-8 encoding Java uses for strings in serialized data.

 Modified UTF-8 differs from standard UTF-8 in two ways: the null character is written with two bytes (`0xC0 0x80`),
 and supplementary characters are written as a surrogate pair where each half is encoded separately with three bytes.
 See [`DataInput`](https://docs.oracle.com/javase/8/docs/api/java/io/DataInput.html#modified-utf-8).
*/

/// Decode a modified UTF-8 byte sequence into a [`String`].
///
/// On failure, returns the index of the first byte that could not be decoded.
/// Unpaired surrogates are replaced with [`char::REPLACEMENT_CHARACTER`].
pub fn decode(bytes: &[u8]) -> Result<String, usize> {
    if bytes.is_ascii() {
        return std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|why| why.valid_up_to());
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        let first = bytes[idx] as u16;
        match first >> 4 {
            // 0xxxxxxx
            0x0..=0x7 => {
                units.push(first);
                idx += 1;
            }
            // 110xxxxx 10xxxxxx
            0xC | 0xD => {
                let second = continuation(bytes, idx + 1)?;
                units.push(((first & 0x1F) << 6) | second);
                idx += 2;
            }
            // 1110xxxx 10xxxxxx 10xxxxxx
            0xE => {
                let second = continuation(bytes, idx + 1)?;
                let third = continuation(bytes, idx + 2)?;
                units.push(((first & 0x0F) << 12) | (second << 6) | third);
                idx += 3;
            }
            _ => return Err(idx),
        }
    }

    Ok(String::from_utf16_lossy(&units))
}

/// Read the payload bits of a `10xxxxxx` continuation byte
fn continuation(bytes: &[u8], idx: usize) -> Result<u16, usize> {
    match bytes.get(idx) {
        Some(byte) if byte & 0xC0 == 0x80 => Ok((byte & 0x3F) as u16),
        _ => Err(idx),
    }
}
