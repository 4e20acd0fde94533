//! Transparent compression for raw sources and written outputs.
//!
//! Codecs are picked by file extension first and, for readers, by magic bytes
//! second. When no codec matches, the stream passes through buffered but
//! otherwise untouched.
//!
//! Built-in codecs (each behind a feature flag):
//! - **Gzip** (`.gz`) via `flate2` (feature: `compression-gzip`)
//! - **Zstd** (`.zst`) via `zstd` (feature: `compression-zstd`)

use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// A compression algorithm that can wrap readers and writers.
pub trait CompressionCodec: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lower-case file extensions including the leading dot.
    fn extensions(&self) -> &'static [&'static str];

    fn magic_bytes(&self) -> &'static [u8];

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>>;

    fn wrap_writer(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>>;
}

static CODECS: &[&dyn CompressionCodec] = &[
    #[cfg(feature = "compression-gzip")]
    &GzipCodec,
    #[cfg(feature = "compression-zstd")]
    &ZstdCodec,
];

/// Codec registered for the extension of `path`, if any.
#[must_use]
pub fn codec_for_path(path: &Path) -> Option<&'static dyn CompressionCodec> {
    let lower = path.to_string_lossy().to_lowercase();
    CODECS
        .iter()
        .copied()
        .find(|c| c.extensions().iter().any(|ext| lower.ends_with(ext)))
}

/// Every file extension a compiled-in codec claims, e.g. `.gz`.
pub fn extensions() -> impl Iterator<Item = &'static str> {
    CODECS.iter().flat_map(|c| c.extensions().iter().copied())
}

fn codec_for_magic<R: BufRead>(reader: &mut R) -> Option<&'static dyn CompressionCodec> {
    let buf = reader.fill_buf().ok()?;
    CODECS
        .iter()
        .copied()
        .find(|c| !buf.is_empty() && buf.starts_with(c.magic_bytes()))
}

/// Wrap `reader` with the decompressor matching `path_hint` or the stream's magic bytes.
///
/// # Errors
/// Returns an error if the codec cannot initialise its decoder.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: &Path,
) -> std::io::Result<Box<dyn Read>> {
    if let Some(codec) = codec_for_path(path_hint) {
        return codec.wrap_reader(Box::new(reader));
    }
    let mut buffered = BufReader::new(reader);
    match codec_for_magic(&mut buffered) {
        Some(codec) => codec.wrap_reader(Box::new(buffered)),
        None => Ok(Box::new(buffered)),
    }
}

/// Wrap `writer` with the compressor matching the extension of `path_hint`.
///
/// # Errors
/// Returns an error if the codec cannot initialise its encoder.
pub fn auto_detect_writer<W: Write + 'static>(
    writer: W,
    path_hint: &Path,
) -> std::io::Result<Box<dyn Write>> {
    match codec_for_path(path_hint) {
        Some(codec) => codec.wrap_writer(Box::new(writer)),
        None => Ok(Box::new(BufWriter::new(writer))),
    }
}

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".gz", ".gzip"]
    }

    fn magic_bytes(&self) -> &'static [u8] {
        &[0x1f, 0x8b]
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        Ok(Box::new(flate2::read::MultiGzDecoder::new(reader)))
    }

    fn wrap_writer(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>> {
        Ok(Box::new(flate2::write::GzEncoder::new(
            writer,
            flate2::Compression::default(),
        )))
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".zst", ".zstd"]
    }

    fn magic_bytes(&self) -> &'static [u8] {
        &[0x28, 0xb5, 0x2f, 0xfd]
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
    }

    fn wrap_writer(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>> {
        zstd::stream::write::Encoder::new(writer, 3)
            .map(|e| Box::new(e.auto_finish()) as Box<dyn Write>)
    }
}
