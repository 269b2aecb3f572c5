//! Cleartext tree to sealed tree.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::{binding, label};
use crate::codec;
use crate::crypto::{FieldCipher, SealedField};
use crate::error::Result;
use crate::model::{
    Content, Database, Document, EncryptedDatabase, Entry, Folder, Image, Record, SealedContent,
    SealedDocument, SealedEntry, SealedFolder, SealedImage, SealedRecord,
};

pub(super) struct Sealer<'c, C: ?Sized> {
    cipher: &'c C,
    store_id: Uuid,
    path: Vec<usize>,
    pub(super) fields: usize,
}

impl<'c, C: FieldCipher + ?Sized> Sealer<'c, C> {
    pub(super) fn new(cipher: &'c C, store_id: Uuid) -> Self {
        Self {
            cipher,
            store_id,
            path: Vec::new(),
            fields: 0,
        }
    }

    fn bytes(&mut self, label: &str, bytes: Zeroizing<Vec<u8>>) -> Result<SealedField> {
        self.fields += 1;
        let aad = binding::field_aad(&self.store_id, &self.path, label);
        self.cipher.seal(&aad, &bytes)
    }

    fn text(&mut self, label: &str, text: &str) -> Result<SealedField> {
        self.bytes(label, Zeroizing::new(codec::text_to_bytes(text)))
    }

    fn timestamp(&mut self, label: &str, timestamp: &DateTime<Utc>) -> Result<SealedField> {
        self.bytes(label, Zeroizing::new(codec::timestamp_to_bytes(timestamp)))
    }

    fn number(&mut self, label: &str, number: f64) -> Result<SealedField> {
        self.bytes(label, Zeroizing::new(codec::number_to_bytes(number)))
    }

    fn uuid(&mut self, label: &str, id: &Uuid) -> Result<SealedField> {
        self.bytes(label, Zeroizing::new(codec::uuid_to_bytes(id)))
    }

    fn key_check(&mut self, database: &Database) -> Result<SealedField> {
        self.fields += 1;
        let aad = binding::key_check_aad(
            database.header(),
            database.record(),
            database.allow_biometrics(),
            &binding::manifest(database.contents()),
        );
        self.cipher.seal(&aad, &codec::uuid_to_bytes(&database.id()))
    }

    fn record(&mut self, record: &Record) -> Result<SealedRecord> {
        Ok(SealedRecord {
            name: self.text(label::NAME, record.name())?,
            description: self.text(label::DESCRIPTION, record.description())?,
            icon_name: self.text(label::ICON_NAME, record.icon_name())?,
            created: self.timestamp(label::CREATED, &record.created())?,
            last_edited: self.timestamp(label::LAST_EDITED, &record.last_edited())?,
            id: self.uuid(label::ID, &record.id())?,
        })
    }

    fn folder(&mut self, folder: &Folder) -> Result<SealedFolder> {
        let record = self.record(&folder.record)?;
        let contents = self.contents(&folder.contents)?;
        Ok(SealedFolder { record, contents })
    }

    fn entry(&mut self, entry: &Entry) -> Result<SealedEntry> {
        Ok(SealedEntry {
            record: self.record(&entry.record)?,
            username: self.text(label::USERNAME, &entry.username)?,
            password: self.text(label::PASSWORD, &entry.password)?,
            url: self.text(label::URL, &entry.url)?,
            notes: self.text(label::NOTES, &entry.notes)?,
        })
    }

    fn document(&mut self, document: &Document) -> Result<SealedDocument> {
        Ok(SealedDocument {
            record: self.record(&document.record)?,
            doc_type: self.text(label::DOC_TYPE, &document.doc_type)?,
            content: self.bytes(label::CONTENT, Zeroizing::new(document.content.clone()))?,
        })
    }

    fn image(&mut self, image: &Image) -> Result<SealedImage> {
        codec::validate_quality(image.quality)?;
        Ok(SealedImage {
            record: self.record(&image.record)?,
            format: self.text(label::FORMAT, image.format.as_tag())?,
            quality: self.number(label::QUALITY, image.quality)?,
            data: self.bytes(label::DATA, Zeroizing::new(image.data.clone()))?,
        })
    }

    fn contents(&mut self, contents: &[Content]) -> Result<Vec<SealedContent>> {
        let mut sealed = Vec::with_capacity(contents.len());
        for (index, item) in contents.iter().enumerate() {
            self.path.push(index);
            sealed.push(match item {
                Content::Folder(folder) => SealedContent::Folder(self.folder(folder)?),
                Content::Entry(entry) => SealedContent::Entry(self.entry(entry)?),
                Content::Document(document) => SealedContent::Document(self.document(document)?),
                Content::Image(image) => SealedContent::Image(self.image(image)?),
            });
            self.path.pop();
        }
        Ok(sealed)
    }

    /// Root first (key check), then contents in order, depth first.
    pub(super) fn database(&mut self, database: &Database) -> Result<EncryptedDatabase> {
        let key = self.key_check(database)?;
        let contents = self.contents(database.contents())?;
        Ok(EncryptedDatabase {
            record: database.record().clone(),
            header: database.header().clone(),
            key,
            allow_biometrics: database.allow_biometrics(),
            contents,
        })
    }
}
