//! Content tree nodes, in cleartext and sealed form.
//!
//! Each node kind exists as two independent types. The engine converts
//! between them field by field; nothing else crosses the boundary.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroize;

use super::record::{Record, SealedRecord};
use crate::codec::{self, RasterFormat};
use crate::crypto::SealedField;
use crate::error::{Result, StrongboxError};

/// A folder holding an ordered list of content items.
#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub record: Record,
    pub contents: Vec<Content>,
}

impl Folder {
    pub fn new(record: Record) -> Self {
        Self {
            record,
            contents: Vec::new(),
        }
    }

    pub fn with_contents(mut self, contents: Vec<Content>) -> Self {
        self.contents = contents;
        self
    }

    /// Append an item and mark the folder edited.
    pub fn push(&mut self, item: Content) {
        self.contents.push(item);
        self.record.touch();
    }
}

/// A credential record.
#[derive(Clone, PartialEq)]
pub struct Entry {
    pub record: Record,
    pub username: String,
    pub password: String,
    pub url: String,
    pub notes: String,
}

impl Entry {
    pub fn new(record: Record) -> Self {
        Self {
            record,
            username: String::new(),
            password: String::new(),
            url: String::new(),
            notes: String::new(),
        }
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("record", &self.record)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("url", &self.url)
            .field("notes", &self.notes)
            .finish()
    }
}

impl Entry {
    fn wipe(&mut self) {
        self.username.zeroize();
        self.password.zeroize();
        self.url.zeroize();
        self.notes.zeroize();
    }
}

impl Drop for Entry {
    fn drop(&mut self) {
        self.wipe();
    }
}

/// An arbitrary document with a type tag (usually a file extension).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub record: Record,
    pub doc_type: String,
    pub content: Vec<u8>,
}

impl Document {
    pub fn new(record: Record, doc_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            record,
            doc_type: doc_type.into(),
            content,
        }
    }

    fn wipe(&mut self) {
        self.doc_type.zeroize();
        self.content.zeroize();
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        self.wipe();
    }
}

/// An image, kept as already-encoded raster bytes.
///
/// Storing the encoded bytes (not pixels) keeps round trips exact for the
/// lossy JPEG format.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub record: Record,
    pub format: RasterFormat,
    pub quality: f64,
    pub data: Vec<u8>,
}

impl Image {
    /// Encode a raster into a new image node.
    pub fn from_raster(
        record: Record,
        raster: &image::DynamicImage,
        format: image::ImageFormat,
        quality: f64,
    ) -> Result<Self> {
        let data = codec::image_to_bytes(raster, format, quality)?;
        Ok(Self {
            record,
            format: RasterFormat::try_from(format)?,
            quality,
            data,
        })
    }

    /// Read and re-encode an image file. The target format follows the file
    /// extension, so only `.png`, `.jpg` and `.jpeg` files are accepted.
    pub fn from_path(record: Record, path: &std::path::Path, quality: f64) -> Result<Self> {
        let format = image::ImageFormat::from_path(path)
            .map_err(|e| StrongboxError::UnsupportedImageFormat(e.to_string()))?;
        RasterFormat::try_from(format)?;
        let raster = image::ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| StrongboxError::InvalidInput(format!("Image decoding failed: {}", e)))?;
        Self::from_raster(record, &raster, format, quality)
    }

    /// Decode the stored bytes for display.
    pub fn decode(&self) -> Result<image::DynamicImage> {
        codec::bytes_to_image(&self.data, self.format)
    }

    fn wipe(&mut self) {
        self.data.zeroize();
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        self.wipe();
    }
}

/// One table-of-contents item.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Folder(Folder),
    Entry(Entry),
    Document(Document),
    Image(Image),
}

impl Content {
    pub fn record(&self) -> &Record {
        match self {
            Content::Folder(folder) => &folder.record,
            Content::Entry(entry) => &entry.record,
            Content::Document(document) => &document.record,
            Content::Image(image) => &image.record,
        }
    }

    pub fn id(&self) -> Uuid {
        self.record().id()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Content::Folder(_) => "folder",
            Content::Entry(_) => "entry",
            Content::Document(_) => "document",
            Content::Image(_) => "image",
        }
    }

    /// Visit this item and every descendant, depth first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Content)) {
        visit(self);
        if let Content::Folder(folder) = self {
            for child in &folder.contents {
                child.walk(visit);
            }
        }
    }
}

impl From<Folder> for Content {
    fn from(folder: Folder) -> Self {
        Content::Folder(folder)
    }
}

impl From<Entry> for Content {
    fn from(entry: Entry) -> Self {
        Content::Entry(entry)
    }
}

impl From<Document> for Content {
    fn from(document: Document) -> Self {
        Content::Document(document)
    }
}

impl From<Image> for Content {
    fn from(image: Image) -> Self {
        Content::Image(image)
    }
}

/// Find a folder anywhere below `contents`.
pub(crate) fn find_folder_mut(contents: &mut [Content], id: Uuid) -> Option<&mut Folder> {
    for item in contents.iter_mut() {
        if let Content::Folder(folder) = item {
            if folder.record.id() == id {
                return Some(folder);
            }
            if let Some(found) = find_folder_mut(&mut folder.contents, id) {
                return Some(found);
            }
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedFolder {
    pub record: SealedRecord,
    pub contents: Vec<SealedContent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEntry {
    pub record: SealedRecord,
    pub username: SealedField,
    pub password: SealedField,
    pub url: SealedField,
    pub notes: SealedField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedDocument {
    pub record: SealedRecord,
    pub doc_type: SealedField,
    pub content: SealedField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedImage {
    pub record: SealedRecord,
    pub format: SealedField,
    pub quality: SealedField,
    pub data: SealedField,
}

/// Sealed table-of-contents item. The kind stays readable; fields do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SealedContent {
    Folder(SealedFolder),
    Entry(SealedEntry),
    Document(SealedDocument),
    Image(SealedImage),
}

impl SealedContent {
    pub(crate) fn collect_fields<'a>(&'a self, out: &mut Vec<&'a SealedField>) {
        match self {
            SealedContent::Folder(folder) => {
                out.extend(folder.record.fields());
                for child in &folder.contents {
                    child.collect_fields(out);
                }
            }
            SealedContent::Entry(entry) => {
                out.extend(entry.record.fields());
                out.extend([&entry.username, &entry.password, &entry.url, &entry.notes]);
            }
            SealedContent::Document(document) => {
                out.extend(document.record.fields());
                out.extend([&document.doc_type, &document.content]);
            }
            SealedContent::Image(image) => {
                out.extend(image.record.fields());
                out.extend([&image.format, &image.quality, &image.data]);
            }
        }
    }

    pub(crate) fn collect_fields_mut<'a>(&'a mut self, out: &mut Vec<&'a mut SealedField>) {
        match self {
            SealedContent::Folder(folder) => {
                out.extend(folder.record.fields_mut());
                for child in folder.contents.iter_mut() {
                    child.collect_fields_mut(out);
                }
            }
            SealedContent::Entry(entry) => {
                out.extend(entry.record.fields_mut());
                out.extend([
                    &mut entry.username,
                    &mut entry.password,
                    &mut entry.url,
                    &mut entry.notes,
                ]);
            }
            SealedContent::Document(document) => {
                out.extend(document.record.fields_mut());
                out.extend([&mut document.doc_type, &mut document.content]);
            }
            SealedContent::Image(image) => {
                out.extend(image.record.fields_mut());
                out.extend([&mut image.format, &mut image.quality, &mut image.data]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Vec<Content> {
        let mut private = Folder::new(Record::new("Private"));
        private.push(Document::new(Record::new("Note"), "note", b"secret".to_vec()).into());
        let mut nested = Folder::new(Record::new("Nested"));
        nested.push(Entry::new(Record::new("Mail")).into());
        private.push(nested.into());
        vec![private.into(), Entry::new(Record::new("Bank")).into()]
    }

    #[test]
    fn test_wipe_clears_secret_fields() {
        let mut entry = Entry::new(Record::new("Bank"));
        entry.username = "jdoe".to_string();
        entry.password = "hunter2hunter2".to_string();
        entry.url = "https://bank.example".to_string();
        entry.notes = "PIN is elsewhere".to_string();
        entry.wipe();
        assert!(entry.username.is_empty());
        assert!(entry.password.is_empty());
        assert!(entry.url.is_empty());
        assert!(entry.notes.is_empty());
        assert_eq!(entry.record.name(), "Bank");

        let mut document = Document::new(Record::new("Note"), "txt", b"secret".to_vec());
        document.wipe();
        assert!(document.doc_type.is_empty());
        assert!(document.content.is_empty());

        let mut image = Image {
            record: Record::new("Passport"),
            format: RasterFormat::Png,
            quality: 1.0,
            data: vec![0x89, b'P', b'N', b'G'],
        };
        image.wipe();
        assert!(image.data.is_empty());
    }

    #[test]
    fn test_walk_is_depth_first_in_order() {
        let tree = sample_tree();
        let mut names = Vec::new();
        for item in &tree {
            item.walk(&mut |node| names.push(node.record().name().to_string()));
        }
        assert_eq!(names, ["Private", "Note", "Nested", "Mail", "Bank"]);
    }

    #[test]
    fn test_find_folder_mut_nested() {
        let mut tree = sample_tree();
        let nested_id = match &tree[0] {
            Content::Folder(folder) => folder.contents[1].id(),
            _ => unreachable!(),
        };
        let folder = find_folder_mut(&mut tree, nested_id).unwrap();
        assert_eq!(folder.record.name(), "Nested");
        assert!(find_folder_mut(&mut tree, Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_entry_debug_redacts_password() {
        let mut entry = Entry::new(Record::new("Bank"));
        entry.password = "hunter2hunter2".to_string();
        let debug = format!("{:?}", entry);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_kinds() {
        let tree = sample_tree();
        assert_eq!(tree[0].kind(), "folder");
        assert_eq!(tree[1].kind(), "entry");
    }
}
