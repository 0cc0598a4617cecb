use std::io;

/// Types that can be decoded from a flat byte buffer.
pub trait Deserialize<'a>: Sized {
    /// Decodes a value from `buf`.
    ///
    /// # Arguments
    /// * `buf` - The encoded bytes.
    ///
    /// # Returns
    /// The decoded value or an `InvalidData` io error.
    fn deserialize(buf: &'a [u8]) -> io::Result<Self>;
}
