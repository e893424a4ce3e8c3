use std::io::{Read, Write};

use errors::{Result, ResultExt};

/// The compression codec carried in the low 2 bits of a message's
/// attributes byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Snappy,
}

impl Default for Compression {
    fn default() -> Self {
        Compression::None
    }
}

impl From<i8> for Compression {
    fn from(v: i8) -> Self {
        match v & 0x03 {
            1 => Compression::Gzip,
            2 => Compression::Snappy,
            _ => Compression::None,
        }
    }
}

impl From<Compression> for i8 {
    fn from(c: Compression) -> i8 {
        match c {
            Compression::None => 0,
            Compression::Gzip => 1,
            Compression::Snappy => 2,
        }
    }
}

impl Compression {
    /// Compresses `data` with this codec. A no-op for `Compression::None`.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match *self {
            Compression::None => Ok(data.to_vec()),
            Compression::Gzip => {
                #[cfg(feature = "gzip")]
                {
                    use flate2::Compression as Level;
                    use flate2::write::GzEncoder;

                    let mut encoder = GzEncoder::new(Vec::new(), Level::default());
                    encoder.write_all(data).chain_err(|| "failed to gzip encode message set")?;
                    encoder.finish().chain_err(|| "failed to finish gzip encoding")
                }
                #[cfg(not(feature = "gzip"))]
                {
                    bail!(::errors::ErrorKind::CodecError("gzip support not compiled in"))
                }
            }
            Compression::Snappy => {
                #[cfg(feature = "snappy")]
                {
                    let mut encoder = ::snap::Encoder::new();
                    encoder.compress_vec(data).chain_err(|| "failed to snappy encode message set")
                }
                #[cfg(not(feature = "snappy"))]
                {
                    bail!(::errors::ErrorKind::CodecError("snappy support not compiled in"))
                }
            }
        }
    }

    /// Decompresses `data` produced by this codec. A no-op for
    /// `Compression::None`.
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match *self {
            Compression::None => Ok(data.to_vec()),
            Compression::Gzip => {
                #[cfg(feature = "gzip")]
                {
                    use flate2::read::GzDecoder;

                    let mut decoder = GzDecoder::new(data);
                    let mut out = Vec::new();
                    decoder.read_to_end(&mut out).chain_err(|| "failed to gzip decode message set")?;
                    Ok(out)
                }
                #[cfg(not(feature = "gzip"))]
                {
                    bail!(::errors::ErrorKind::CodecError("gzip support not compiled in"))
                }
            }
            Compression::Snappy => {
                #[cfg(feature = "snappy")]
                {
                    let mut decoder = ::snap::Decoder::new();
                    decoder.decompress_vec(data).chain_err(|| "failed to snappy decode message set")
                }
                #[cfg(not(feature = "snappy"))]
                {
                    bail!(::errors::ErrorKind::CodecError("snappy support not compiled in"))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_roundtrip() {
        assert_eq!(i8::from(Compression::None), 0);
        assert_eq!(i8::from(Compression::Gzip), 1);
        assert_eq!(i8::from(Compression::Snappy), 2);
        assert_eq!(Compression::from(0i8), Compression::None);
        assert_eq!(Compression::from(1i8), Compression::Gzip);
        assert_eq!(Compression::from(2i8), Compression::Snappy);
        // high bits (timestamp type, in v1+) must not affect the codec.
        assert_eq!(Compression::from(0x09i8), Compression::Gzip);
    }

    #[test]
    fn test_none_is_identity() {
        let data = b"hello world";
        let compressed = Compression::None.compress(data).unwrap();
        assert_eq!(&compressed[..], &data[..]);
        let decompressed = Compression::None.decompress(&compressed).unwrap();
        assert_eq!(&decompressed[..], &data[..]);
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn test_gzip_roundtrip() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let compressed = Compression::Gzip.compress(data).unwrap();
        assert_ne!(&compressed[..], &data[..]);
        let decompressed = Compression::Gzip.decompress(&compressed).unwrap();
        assert_eq!(&decompressed[..], &data[..]);
    }

    #[cfg(feature = "snappy")]
    #[test]
    fn test_snappy_roundtrip() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let compressed = Compression::Snappy.compress(data).unwrap();
        let decompressed = Compression::Snappy.decompress(&compressed).unwrap();
        assert_eq!(&decompressed[..], &data[..]);
    }
}
