#[cfg(any(feature = "compression-gzip", feature = "compression-zstd"))]
mod compression_tests {
    use courtside::io::compression::{auto_detect_reader, auto_detect_writer, codec_for_path};
    use std::io::{Read, Write};
    use std::path::Path;
    use tempfile::tempdir;

    const BODY: &str = "id,full_name\n1,Alaa Abdelnaby\n2,LeBron James\n";

    fn round_trip(file_name: &str) -> anyhow::Result<Vec<u8>> {
        let dir = tempdir()?;
        let path = dir.path().join(file_name);
        {
            let mut w = auto_detect_writer(std::fs::File::create(&path)?, &path)?;
            w.write_all(BODY.as_bytes())?;
            w.flush()?;
        }
        let raw = std::fs::read(&path)?;
        let mut text = String::new();
        auto_detect_reader(std::fs::File::open(&path)?, &path)?.read_to_string(&mut text)?;
        assert_eq!(text, BODY);
        Ok(raw)
    }

    #[test]
    fn plain_paths_pass_through() -> anyhow::Result<()> {
        assert!(codec_for_path(Path::new("player.csv")).is_none());
        let raw = round_trip("player.csv")?;
        assert_eq!(raw, BODY.as_bytes());
        Ok(())
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn gzip_by_extension() -> anyhow::Result<()> {
        assert_eq!(codec_for_path(Path::new("PLAYER.CSV.GZ")).map(|c| c.name()), Some("gzip"));
        let raw = round_trip("player.csv.gz")?;
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
        Ok(())
    }

    #[cfg(feature = "compression-zstd")]
    #[test]
    fn zstd_by_extension() -> anyhow::Result<()> {
        let raw = round_trip("player.csv.zst")?;
        assert_eq!(&raw[..4], &[0x28, 0xb5, 0x2f, 0xfd]);
        Ok(())
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn gzip_by_magic_bytes() -> anyhow::Result<()> {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
        enc.write_all(BODY.as_bytes())?;
        let compressed = enc.finish()?;
        let mut text = String::new();
        auto_detect_reader(std::io::Cursor::new(compressed), Path::new("unnamed"))?
            .read_to_string(&mut text)?;
        assert_eq!(text, BODY);
        Ok(())
    }
}
