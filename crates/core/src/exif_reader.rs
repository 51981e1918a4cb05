use crate::metadata::{MetadataReader, TagMap};
use anyhow::{Context, Result};
use exif::{In, Reader, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Reads tags from the primary IFD of a JPEG's EXIF block.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifMetadataReader;

impl MetadataReader for ExifMetadataReader {
    fn read_tags(&self, path: &Path) -> Result<TagMap> {
        read_exif_tags(path)
    }
}

pub fn read_exif_tags(path: &Path) -> Result<TagMap> {
    let file = File::open(path)
        .with_context(|| format!("could not open file for EXIF: {}", path.display()))?;
    let mut buf = BufReader::new(file);
    let exif = Reader::new()
        .read_from_container(&mut buf)
        .with_context(|| format!("could not parse EXIF: {}", path.display()))?;

    let mut tags = TagMap::new();
    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        let tag_name = field.tag.to_string();
        tags.entry(tag_name)
            .or_insert_with(|| field_value(field, &exif));
    }
    Ok(tags)
}

// ASCII values are kept verbatim; kamadak-exif would otherwise render
// DateTime tags as `YYYY-MM-DD HH:MM:SS`.
fn field_value(field: &exif::Field, exif: &exif::Exif) -> String {
    match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string())
            .unwrap_or_default(),
        _ => field.display_value().with_unit(exif).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::read_exif_tags;
    use exif::experimental::Writer;
    use exif::{Field, In, Tag, Value};
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn tiff_with_capture_time(value: &str) -> Vec<u8> {
        let field = Field {
            tag: Tag::DateTimeOriginal,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![value.as_bytes().to_vec()]),
        };
        let mut writer = Writer::new();
        writer.push_field(&field);
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, false).expect("write tiff");
        buf.into_inner()
    }

    #[test]
    fn capture_time_is_keyed_by_tag_name_and_kept_verbatim() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("IMG1.jpg");
        fs::write(&path, tiff_with_capture_time("2023:08:03 15:08:50")).expect("write");

        let tags = read_exif_tags(&path).expect("exif should parse");
        assert_eq!(
            tags.get("DateTimeOriginal").map(String::as_str),
            Some("2023:08:03 15:08:50")
        );
    }

    #[test]
    fn file_without_exif_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("plain.jpg");
        fs::write(&path, b"not a jpeg").expect("write");

        let err = read_exif_tags(&path).expect_err("no exif");
        assert!(err.to_string().contains("plain.jpg"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = tempdir().expect("tempdir");
        assert!(read_exif_tags(&temp.path().join("absent.jpg")).is_err());
    }
}
