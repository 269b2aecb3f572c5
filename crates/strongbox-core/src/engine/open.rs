//! Sealed tree back to cleartext.
//!
//! Tag failures surface as `WrongPasswordOrCorruptData` unchanged. Anything
//! that fails after a tag verified is `CorruptPlaintext`.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::{binding, label};
use crate::codec::{self, RasterFormat};
use crate::crypto::{DerivedKey, FieldCipher, SealedField};
use crate::error::{Result, StrongboxError};
use crate::model::{
    Content, Database, Document, EncryptedDatabase, Entry, Folder, Image, Record, SealedContent,
    SealedDocument, SealedEntry, SealedFolder, SealedImage, SealedRecord,
};

pub(super) struct Opener<'c, C: ?Sized> {
    cipher: &'c C,
    store_id: Uuid,
    path: Vec<usize>,
    pub(super) fields: usize,
}

impl<'c, C: FieldCipher + ?Sized> Opener<'c, C> {
    pub(super) fn new(cipher: &'c C, store_id: Uuid) -> Self {
        Self {
            cipher,
            store_id,
            path: Vec::new(),
            fields: 0,
        }
    }

    fn bytes(&mut self, label: &str, sealed: &SealedField) -> Result<Zeroizing<Vec<u8>>> {
        self.fields += 1;
        let aad = binding::field_aad(&self.store_id, &self.path, label);
        self.cipher.open(&aad, sealed)
    }

    fn text(&mut self, label: &str, sealed: &SealedField) -> Result<String> {
        let bytes = self.bytes(label, sealed)?;
        codec::bytes_to_text(Some(&bytes)).map_err(|e| StrongboxError::corrupt(label, e))
    }

    fn timestamp(&mut self, label: &str, sealed: &SealedField) -> Result<DateTime<Utc>> {
        let bytes = self.bytes(label, sealed)?;
        codec::bytes_to_timestamp(&bytes).map_err(|e| StrongboxError::corrupt(label, e))
    }

    fn number(&mut self, label: &str, sealed: &SealedField) -> Result<f64> {
        let bytes = self.bytes(label, sealed)?;
        codec::bytes_to_number(&bytes).map_err(|e| StrongboxError::corrupt(label, e))
    }

    fn uuid(&mut self, label: &str, sealed: &SealedField) -> Result<Uuid> {
        let bytes = self.bytes(label, sealed)?;
        codec::bytes_to_uuid(&bytes).map_err(|e| StrongboxError::corrupt(label, e))
    }

    fn record(&mut self, sealed: &SealedRecord) -> Result<Record> {
        let name = self.text(label::NAME, &sealed.name)?;
        let description = self.text(label::DESCRIPTION, &sealed.description)?;
        let icon_name = self.text(label::ICON_NAME, &sealed.icon_name)?;
        let created = self.timestamp(label::CREATED, &sealed.created)?;
        let last_edited = self.timestamp(label::LAST_EDITED, &sealed.last_edited)?;
        let id = self.uuid(label::ID, &sealed.id)?;
        Record::from_parts(name, description, icon_name, created, last_edited, id)
            .map_err(|e| StrongboxError::corrupt(label::LAST_EDITED, e))
    }

    fn folder(&mut self, sealed: &SealedFolder) -> Result<Folder> {
        let record = self.record(&sealed.record)?;
        let contents = self.contents(&sealed.contents)?;
        Ok(Folder { record, contents })
    }

    fn entry(&mut self, sealed: &SealedEntry) -> Result<Entry> {
        Ok(Entry {
            record: self.record(&sealed.record)?,
            username: self.text(label::USERNAME, &sealed.username)?,
            password: self.text(label::PASSWORD, &sealed.password)?,
            url: self.text(label::URL, &sealed.url)?,
            notes: self.text(label::NOTES, &sealed.notes)?,
        })
    }

    fn document(&mut self, sealed: &SealedDocument) -> Result<Document> {
        Ok(Document {
            record: self.record(&sealed.record)?,
            doc_type: self.text(label::DOC_TYPE, &sealed.doc_type)?,
            content: self.bytes(label::CONTENT, &sealed.content)?.to_vec(),
        })
    }

    fn image(&mut self, sealed: &SealedImage) -> Result<Image> {
        let record = self.record(&sealed.record)?;
        let format = RasterFormat::from_tag(&self.text(label::FORMAT, &sealed.format)?)
            .map_err(|e| StrongboxError::corrupt(label::FORMAT, e))?;
        let quality = self.number(label::QUALITY, &sealed.quality)?;
        codec::validate_quality(quality).map_err(|e| StrongboxError::corrupt(label::QUALITY, e))?;
        let data = self.bytes(label::DATA, &sealed.data)?.to_vec();
        Ok(Image {
            record,
            format,
            quality,
            data,
        })
    }

    fn contents(&mut self, sealed: &[SealedContent]) -> Result<Vec<Content>> {
        let mut contents = Vec::with_capacity(sealed.len());
        for (index, item) in sealed.iter().enumerate() {
            self.path.push(index);
            contents.push(match item {
                SealedContent::Folder(folder) => Content::Folder(self.folder(folder)?),
                SealedContent::Entry(entry) => Content::Entry(self.entry(entry)?),
                SealedContent::Document(document) => Content::Document(self.document(document)?),
                SealedContent::Image(image) => Content::Image(self.image(image)?),
            });
            self.path.pop();
        }
        Ok(contents)
    }

    /// Opens only if the cleartext root and the tree shape are as sealed.
    fn key_check(&mut self, encrypted: &EncryptedDatabase) -> Result<Uuid> {
        self.fields += 1;
        let aad = binding::key_check_aad(
            &encrypted.header,
            &encrypted.record,
            encrypted.allow_biometrics,
            &binding::sealed_manifest(&encrypted.contents),
        );
        let bytes = self.cipher.open(&aad, &encrypted.key)?;
        codec::bytes_to_uuid(&bytes).map_err(|e| StrongboxError::corrupt(label::KEY_CHECK, e))
    }

    /// Key check first, so a wrong password fails before any content.
    pub(super) fn database(
        &mut self,
        encrypted: &EncryptedDatabase,
        key: DerivedKey,
        password: &str,
    ) -> Result<Database> {
        let key_check = self.key_check(encrypted)?;
        if key_check != encrypted.id() {
            return Err(StrongboxError::CorruptPlaintext {
                field: label::KEY_CHECK.to_string(),
                reason: "Key check does not match store id".to_string(),
            });
        }

        let contents = self.contents(&encrypted.contents)?;
        let database = Database::from_parts(
            encrypted.record.clone(),
            encrypted.header.clone(),
            key,
            SecretString::from(password.to_string()),
            encrypted.allow_biometrics,
            contents,
        );
        database
            .validate()
            .map_err(|e| StrongboxError::corrupt("contents", e))?;
        Ok(database)
    }
}
