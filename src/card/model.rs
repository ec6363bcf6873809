use std::sync::Arc;

use crate::assets::decode::{sniff_mime, to_data_uri};
use crate::foundation::error::CardResult;

/// An encoded photo (PNG, JPEG, ...), as delivered by the camera collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Photo {
    bytes: Arc<Vec<u8>>,
    mime: &'static str,
}

impl Photo {
    /// Wrap encoded image bytes. The format is sniffed; the pixels are not decoded here.
    pub fn from_encoded(bytes: Vec<u8>) -> CardResult<Self> {
        let mime = sniff_mime(&bytes)?;
        Ok(Self {
            bytes: Arc::new(bytes),
            mime,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn data_uri(&self) -> String {
        to_data_uri(self.mime, &self.bytes)
    }
}

/// Input of one export job.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardData {
    pub name: String,
    /// Free text, shown verbatim; an empty string hides the date and its separator.
    pub birth_date: String,
    pub wish: String,
    pub photo: Option<Photo>,
}

impl CardData {
    pub fn new(name: impl Into<String>, wish: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wish: wish.into(),
            ..Self::default()
        }
    }

    pub fn with_birth_date(mut self, birth_date: impl Into<String>) -> Self {
        self.birth_date = birth_date.into();
        self
    }

    pub fn with_photo(mut self, photo: Option<Photo>) -> Self {
        self.photo = photo;
        self
    }

    /// Base name shared by every downloaded artifact: `<name>-Birthday-Card`.
    ///
    /// Characters that cannot appear in a file name on common filesystems are replaced with
    /// `_`; everything else is kept as typed.
    pub fn file_stem(&self) -> String {
        let safe: String = self
            .name
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        format!("{safe}-Birthday-Card")
    }

    /// Title of the printable fallback view.
    pub fn print_title(&self) -> String {
        format!("{} - Birthday Card", self.name)
    }
}
