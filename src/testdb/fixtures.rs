//! Media file contents for tests

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use std::io::Cursor;

/// Smallest JPEG the EXIF reader accepts: SOI, one APP1 `Exif` segment
/// holding the given ASCII date fields, EOI.
pub(crate) fn jpeg_with_exif(fields: &[(Tag, &str)]) -> Vec<u8> {
    let fields: Vec<Field> = fields
        .iter()
        .map(|(tag, value)| Field {
            tag: *tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![value.as_bytes().to_vec()]),
        })
        .collect();

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    // Segment length counts itself and the "Exif\0\0" header
    let length = u16::try_from(2 + 6 + tiff.len()).unwrap();

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&length.to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}
