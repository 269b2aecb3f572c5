//! The store root, unlocked and locked.

use std::collections::HashSet;

use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use super::content::{find_folder_mut, Content, Folder, SealedContent};
use super::record::Record;
use crate::crypto::{derive_key, validate_password, DerivedKey, SealedField};
use crate::engine::Engine;
use crate::error::{Result, StrongboxError};
use crate::header::{EncryptionAlgorithm, Header, StorageBackend};

/// Parameters of the "create new store" flow.
#[derive(Debug)]
pub struct NewDatabase {
    pub name: String,
    pub description: String,
    pub icon_name: String,
    pub password: SecretString,
    pub algorithm: EncryptionAlgorithm,
    pub backend: StorageBackend,
    pub allow_biometrics: bool,
}

impl NewDatabase {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            icon_name: String::new(),
            password: SecretString::from(password.into()),
            algorithm: EncryptionAlgorithm::Aes256Gcm,
            backend: StorageBackend::Sqlite,
            allow_biometrics: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon_name(mut self, icon_name: impl Into<String>) -> Self {
        self.icon_name = icon_name.into();
        self
    }

    pub fn with_algorithm(mut self, algorithm: EncryptionAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_backend(mut self, backend: StorageBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_biometrics(mut self, allow: bool) -> Self {
        self.allow_biometrics = allow;
        self
    }
}

/// An unlocked store.
///
/// Only ever lives in memory. The key and password are zeroized when the
/// value is dropped, which is how a store is locked in memory.
#[derive(Debug)]
pub struct Database {
    record: Record,
    header: Header,
    key: DerivedKey,
    password: SecretString,
    allow_biometrics: bool,
    contents: Vec<Content>,
}

impl Database {
    /// Create a new, empty store with a freshly generated header.
    pub fn create(new: NewDatabase) -> Result<Self> {
        validate_password(new.password.expose_secret())?;
        let header = Header::generate(new.algorithm, new.backend);
        // Fail early if this build cannot encrypt with the chosen algorithm.
        Engine::for_header(&header)?;
        let key = derive_key(new.password.expose_secret(), header.salt().as_bytes())?;
        let record = Record::new(new.name)
            .with_description(new.description)
            .with_icon_name(new.icon_name);

        tracing::debug!(id = %record.id(), algorithm = %header.algorithm(), "created store");

        Ok(Self {
            record,
            header,
            key,
            password: new.password,
            allow_biometrics: new.allow_biometrics,
            contents: Vec::new(),
        })
    }

    pub(crate) fn from_parts(
        record: Record,
        header: Header,
        key: DerivedKey,
        password: SecretString,
        allow_biometrics: bool,
        contents: Vec<Content>,
    ) -> Self {
        Self {
            record,
            header,
            key,
            password,
            allow_biometrics,
            contents,
        }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    pub fn id(&self) -> Uuid {
        self.record.id()
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn key(&self) -> &DerivedKey {
        &self.key
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    pub fn allow_biometrics(&self) -> bool {
        self.allow_biometrics
    }

    pub fn set_allow_biometrics(&mut self, allow: bool) {
        self.allow_biometrics = allow;
        self.record.touch();
    }

    pub fn contents(&self) -> &[Content] {
        &self.contents
    }

    pub fn contents_mut(&mut self) -> &mut Vec<Content> {
        &mut self.contents
    }

    /// Append an item at the root and mark the store edited.
    pub fn push(&mut self, item: Content) {
        self.contents.push(item);
        self.record.touch();
    }

    /// Append an item to a folder anywhere in the tree.
    ///
    /// # Errors
    ///
    /// `NotFound` if no folder has the given id.
    pub fn push_into(&mut self, folder_id: Uuid, item: Content) -> Result<()> {
        let folder = self
            .find_folder_mut(folder_id)
            .ok_or_else(|| StrongboxError::NotFound(format!("Folder {}", folder_id)))?;
        folder.push(item);
        self.record.touch();
        Ok(())
    }

    pub fn find_folder_mut(&mut self, id: Uuid) -> Option<&mut Folder> {
        find_folder_mut(&mut self.contents, id)
    }

    /// Visit every content node, depth first in stored order.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Content)) {
        for item in &self.contents {
            item.walk(visit);
        }
    }

    /// Check tree-wide invariants: ids are unique (root included).
    ///
    /// Per-record timestamp ordering is enforced by [`Record`] itself.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        seen.insert(self.record.id());
        let mut duplicate = None;
        self.walk(&mut |node| {
            if !seen.insert(node.id()) && duplicate.is_none() {
                duplicate = Some(node.id());
            }
        });
        match duplicate {
            Some(id) => Err(StrongboxError::InvalidInput(format!(
                "Duplicate id in content tree: {}",
                id
            ))),
            None => Ok(()),
        }
    }

    /// Change the password, rotating the salt.
    ///
    /// A fresh salt is generated on every change, so the old password and
    /// any precomputation against the old salt are useless afterwards.
    pub fn change_password(&mut self, new_password: impl Into<String>) -> Result<()> {
        let new_password = SecretString::from(new_password.into());
        validate_password(new_password.expose_secret())?;
        let header = self.header.with_fresh_salt();
        let key = derive_key(new_password.expose_secret(), header.salt().as_bytes())?;
        self.header = header;
        self.key = key;
        self.password = new_password;
        self.record.touch();
        tracing::debug!(id = %self.record.id(), "rotated store salt and password");
        Ok(())
    }

    /// Encrypt with the store's own password.
    pub fn lock(&self) -> Result<EncryptedDatabase> {
        Engine::for_header(&self.header)?.encrypt(self, self.password.expose_secret())
    }
}

impl PartialEq for Database {
    fn eq(&self, other: &Self) -> bool {
        self.record == other.record
            && self.header == other.header
            && self.key == other.key
            && self.password.expose_secret() == other.password.expose_secret()
            && self.allow_biometrics == other.allow_biometrics
            && self.contents == other.contents
    }
}

/// A locked store, as persisted.
///
/// Root metadata stays readable so locked stores can be listed; the key
/// check and all content are sealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedDatabase {
    pub record: Record,
    pub header: Header,
    /// The root id sealed under the store key; opened first on unlock.
    pub key: SealedField,
    pub allow_biometrics: bool,
    pub contents: Vec<SealedContent>,
}

impl EncryptedDatabase {
    pub fn id(&self) -> Uuid {
        self.record.id()
    }

    /// Decrypt with `password`.
    pub fn unlock(&self, password: &str) -> Result<Database> {
        Engine::for_header(&self.header)?.decrypt(self, password)
    }

    /// Every sealed blob, key check first, then the tree depth first.
    pub fn sealed_fields(&self) -> Vec<&SealedField> {
        let mut out = vec![&self.key];
        for item in &self.contents {
            item.collect_fields(&mut out);
        }
        out
    }

    /// Mutable access to every sealed blob, in [`sealed_fields`] order.
    ///
    /// [`sealed_fields`]: EncryptedDatabase::sealed_fields
    pub fn sealed_fields_mut(&mut self) -> Vec<&mut SealedField> {
        let mut out = vec![&mut self.key];
        for item in self.contents.iter_mut() {
            item.collect_fields_mut(&mut out);
        }
        out
    }
}

/// Lifecycle of one store: there is no partially unlocked state.
#[derive(Debug)]
pub enum StoreState {
    Locked(EncryptedDatabase),
    Unlocked(Database),
}

impl StoreState {
    pub fn is_locked(&self) -> bool {
        matches!(self, StoreState::Locked(_))
    }

    /// Decrypt in place. On failure the state stays `Locked`.
    pub fn unlock(&mut self, password: &str) -> Result<()> {
        if let StoreState::Locked(encrypted) = self {
            let database = encrypted.unlock(password)?;
            *self = StoreState::Unlocked(database);
        }
        Ok(())
    }

    /// Encrypt in place with the store's password, dropping the cleartext.
    pub fn lock(&mut self) -> Result<()> {
        if let StoreState::Unlocked(database) = self {
            let encrypted = database.lock()?;
            *self = StoreState::Locked(encrypted);
        }
        Ok(())
    }

    pub fn database(&self) -> Option<&Database> {
        match self {
            StoreState::Unlocked(database) => Some(database),
            StoreState::Locked(_) => None,
        }
    }

    pub fn database_mut(&mut self) -> Option<&mut Database> {
        match self {
            StoreState::Unlocked(database) => Some(database),
            StoreState::Locked(_) => None,
        }
    }

    pub fn encrypted(&self) -> Option<&EncryptedDatabase> {
        match self {
            StoreState::Locked(encrypted) => Some(encrypted),
            StoreState::Unlocked(_) => None,
        }
    }
}
