use dicom_dictionary_std::tags;
use dicom_object::{DefaultDicomObject, Tag};

use crate::error::TagError;

/// The raw patient tags a scan evaluates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientTags {
    /// Raw `PatientAge` value, e.g. `"035Y"`.
    pub age: String,

    /// Raw `PatientSex` value, e.g. `"M"`.
    pub sex: String,
}

/// Extracts patient tags from raw file bytes.
///
/// The default implementation is [`DicomTagParser`]. Install another via
/// [`with_parser()`](crate::ScanBuilder::with_parser) to back the scan with
/// a different DICOM library, or to stub out decoding in tests.
///
/// # Thread Safety
///
/// `Send + Sync` are required. One parser instance is shared by every
/// branch task, and calls run concurrently on blocking worker threads.
pub trait TagParser: Send + Sync {
    /// Extract both patient tags, or explain why the bytes are rejected.
    ///
    /// Both tags are required: a stream that decodes but lacks either one
    /// is a reject, the same as a stream that does not decode at all.
    fn patient_tags(&self, bytes: &[u8]) -> Result<PatientTags, TagError>;
}

/// Length of the preamble before the `DICM` magic in a standard Part 10
/// file.
const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8] = b"DICM";

/// Default parser backed by the `dicom-object` crate.
///
/// Accepts standard Part 10 files (128-byte preamble, then `DICM`) as well
/// as bare streams that begin directly at the file meta group.
#[derive(Debug, Default, Clone, Copy)]
pub struct DicomTagParser;

impl TagParser for DicomTagParser {
    fn patient_tags(&self, bytes: &[u8]) -> Result<PatientTags, TagError> {
        let obj = read_object(bytes)?;
        let age =
            string_tag(&obj, tags::PATIENT_AGE).ok_or(TagError::MissingTag("PatientAge"))?;
        let sex =
            string_tag(&obj, tags::PATIENT_SEX).ok_or(TagError::MissingTag("PatientSex"))?;
        Ok(PatientTags { age, sex })
    }
}

/// Decode a DICOM object from raw bytes.
///
/// `from_reader` expects the stream to start at the `DICM` magic, so the
/// preamble of a standard Part 10 file is skipped when present.
fn read_object(bytes: &[u8]) -> Result<DefaultDicomObject, TagError> {
    let stream = match bytes.get(PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()) {
        Some(window) if window == MAGIC => &bytes[PREAMBLE_LEN..],
        _ => bytes,
    };
    dicom_object::from_reader(stream).map_err(|err| TagError::NotDicom(err.to_string()))
}

/// A tag's value as a trimmed string, if the tag is present and decodable.
fn string_tag(obj: &DefaultDicomObject, tag: Tag) -> Option<String> {
    obj.element(tag)
        .ok()
        .and_then(|elem| elem.to_str().ok())
        .map(|s| s.trim().to_string())
}
