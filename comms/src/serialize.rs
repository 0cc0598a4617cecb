use std::io;

/// Types that can be written into a flat byte buffer.
pub trait Serialize {
    /// Appends the encoded form of `self` to `buf`.
    ///
    /// # Arguments
    /// * `buf` - The output buffer, existing contents are left untouched.
    ///
    /// # Returns
    /// An io error if the value cannot be encoded.
    fn serialize(&self, buf: &mut Vec<u8>) -> io::Result<()>;
}
