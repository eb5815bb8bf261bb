use std::fmt::{self, Write};

/// Escapes a byte string in the C style used by the protobuf text format.
pub(crate) struct HexEscaped<'a>(pub &'a [u8]);

impl<'a> fmt::Display for HexEscaped<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &ch in self.0 {
            match ch {
                b'\t' => f.write_str("\\t")?,
                b'\r' => f.write_str("\\r")?,
                b'\n' => f.write_str("\\n")?,
                b'\\' => f.write_str("\\\\")?,
                b'\'' => f.write_str("\\'")?,
                b'"' => f.write_str("\\\"")?,
                b'\x20'..=b'\x7e' => f.write_char(ch as char)?,
                _ => {
                    write!(f, "\\{:03o}", ch)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes() {
        assert_eq!(HexEscaped(b"hello").to_string(), "hello");
        assert_eq!(HexEscaped(b"\t\r\n\\'\"").to_string(), "\\t\\r\\n\\\\\\'\\\"");
        assert_eq!(HexEscaped(b"\x00\x7f\xff").to_string(), "\\000\\177\\377");
    }
}
