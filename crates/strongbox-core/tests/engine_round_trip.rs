use std::collections::HashSet;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use strongbox_core::{
    decrypt, encrypt, Content, Database, Document, EncryptedDatabase, EncryptionAlgorithm, Engine,
    Entry, Folder, Header, Image, NewDatabase, Record, SealedContent, StorageBackend, StoreState,
    StrongboxError,
};

const PASSWORD: &str = "correct-horse";

fn new_database(algorithm: EncryptionAlgorithm) -> Database {
    Database::create(
        NewDatabase::new("Personal", PASSWORD)
            .with_description("Everything at home")
            .with_icon_name("house")
            .with_algorithm(algorithm)
            .with_backend(StorageBackend::Sqlite),
    )
    .expect("create should succeed")
}

fn sample_raster() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(6, 4, |x, y| {
        Rgb([(x * 40) as u8, (y * 60) as u8, 200])
    }))
}

/// One of every node kind, with a nested folder.
fn populated(algorithm: EncryptionAlgorithm) -> Database {
    let mut db = new_database(algorithm);

    let mut private = Folder::new(Record::new("Private").with_icon_name("lock"));
    private.push(Document::new(Record::new("Todo"), "note", b"secret".to_vec()).into());
    let mut inner = Folder::new(Record::new("Archive").with_description("old stuff"));
    inner.push(
        Image::from_raster(
            Record::new("Passport"),
            &sample_raster(),
            ImageFormat::Jpeg,
            0.8,
        )
        .expect("jpeg encode should succeed")
        .into(),
    );
    private.push(inner.into());
    db.push(private.into());

    let mut bank = Entry::new(Record::new("Bank").with_description("Checking"));
    bank.username = "jdoe".to_string();
    bank.password = "hunter2hunter2".to_string();
    bank.url = "https://bank.example".to_string();
    bank.notes = "PIN is elsewhere".to_string();
    db.push(bank.into());

    db.push(
        Image::from_raster(Record::new("Safe combo"), &sample_raster(), ImageFormat::Png, 1.0)
            .expect("png encode should succeed")
            .into(),
    );
    db.push(Document::new(Record::new("Empty"), "", Vec::new()).into());
    db
}

#[test]
fn test_round_trip_every_kind() {
    let db = populated(EncryptionAlgorithm::Aes256Gcm);
    let encrypted = encrypt(&db, PASSWORD).expect("encrypt should succeed");
    let decrypted = decrypt(&encrypted, PASSWORD).expect("decrypt should succeed");
    assert_eq!(decrypted, db);
}

#[cfg(feature = "xchacha")]
#[test]
fn test_round_trip_xchacha() {
    let db = populated(EncryptionAlgorithm::XChaCha20Poly1305);
    let encrypted = db.lock().expect("lock should succeed");
    assert_eq!(
        encrypted.header.algorithm(),
        EncryptionAlgorithm::XChaCha20Poly1305
    );
    assert_eq!(encrypted.unlock(PASSWORD).expect("unlock should succeed"), db);
}

#[test]
fn test_wrong_password_rejected() {
    let db = populated(EncryptionAlgorithm::Aes256Gcm);
    let encrypted = encrypt(&db, PASSWORD).expect("encrypt should succeed");
    let result = decrypt(&encrypted, "wrong");
    assert!(matches!(result, Err(StrongboxError::WrongPasswordOrCorruptData)));
    assert!(result.unwrap_err().is_authentication_failure());
}

#[test]
fn test_header_is_stable_and_reparses() {
    let db = populated(EncryptionAlgorithm::Aes256Gcm);
    let first = encrypt(&db, PASSWORD).expect("encrypt should succeed");
    let second = encrypt(&db, PASSWORD).expect("encrypt should succeed");
    assert_eq!(first.header, *db.header());
    assert_eq!(second.header, first.header);

    let text = first.header.serialize();
    assert_eq!(Header::parse(&text).expect("parse should succeed"), first.header);

    // Fresh nonces every time, so two encryptions never share a blob.
    assert_ne!(first.sealed_fields(), second.sealed_fields());
}

#[test]
fn test_nonces_unique_across_large_tree() {
    let mut db = new_database(EncryptionAlgorithm::Aes256Gcm);
    for folder_index in 0..20 {
        let mut folder = Folder::new(Record::new(format!("Folder {}", folder_index)));
        for entry_index in 0..10 {
            let mut entry = Entry::new(Record::new(format!("Entry {}", entry_index)));
            entry.password = "same password everywhere".to_string();
            folder.push(entry.into());
        }
        db.push(folder.into());
    }

    let engine = Engine::for_header(db.header()).expect("engine should exist");
    let encrypted = engine.encrypt(&db, PASSWORD).expect("encrypt should succeed");
    let fields = encrypted.sealed_fields();
    assert_eq!(fields.len(), 1 + 20 * 6 + 200 * 10);

    let mut nonces = HashSet::new();
    for field in &fields {
        assert!(nonces.insert(field.as_bytes()[..engine.nonce_len()].to_vec()));
    }
}

#[test]
fn test_single_byte_tamper_detected_in_every_field() {
    let db = populated(EncryptionAlgorithm::Aes256Gcm);
    let encrypted = encrypt(&db, PASSWORD).expect("encrypt should succeed");
    let count = encrypted.sealed_fields().len();

    for index in 0..count {
        let len = encrypted.sealed_fields()[index].len();
        // Nonce, ciphertext and tag.
        for position in [0, len / 2, len - 1] {
            let mut tampered = encrypted.clone();
            {
                let mut fields = tampered.sealed_fields_mut();
                fields[index].as_bytes_mut()[position] ^= 0x01;
            }
            let result = decrypt(&tampered, PASSWORD);
            assert!(
                matches!(result, Err(StrongboxError::WrongPasswordOrCorruptData)),
                "tampering byte {} of field {} went unnoticed",
                position,
                index
            );
        }
    }
}

#[test]
fn test_swapped_fields_detected() {
    let db = populated(EncryptionAlgorithm::Aes256Gcm);
    let mut encrypted = encrypt(&db, PASSWORD).expect("encrypt should succeed");
    {
        let mut fields = encrypted.sealed_fields_mut();
        // Record name and description of the first folder.
        let name = fields[1].as_bytes().to_vec();
        let description = fields[2].as_bytes().to_vec();
        *fields[1].as_bytes_mut() = description;
        *fields[2].as_bytes_mut() = name;
    }
    assert!(matches!(
        decrypt(&encrypted, PASSWORD),
        Err(StrongboxError::WrongPasswordOrCorruptData)
    ));
}

fn assert_rejected(encrypted: &EncryptedDatabase, what: &str) {
    assert!(
        matches!(
            decrypt(encrypted, PASSWORD),
            Err(StrongboxError::WrongPasswordOrCorruptData)
        ),
        "{} went unnoticed",
        what
    );
}

/// Two entries side by side at the root.
fn two_entries() -> Database {
    let mut db = new_database(EncryptionAlgorithm::Aes256Gcm);
    for (name, password) in [("Bank", "hunter2hunter2"), ("Mail", "letmein-letmein")] {
        let mut entry = Entry::new(Record::new(name));
        entry.password = password.to_string();
        db.push(entry.into());
    }
    db
}

#[test]
fn test_password_swapped_across_entries_detected() {
    let db = two_entries();
    let mut encrypted = encrypt(&db, PASSWORD).expect("encrypt should succeed");
    let [SealedContent::Entry(bank), SealedContent::Entry(mail)] = encrypted.contents.as_mut_slice()
    else {
        panic!("expected two entries");
    };
    std::mem::swap(&mut bank.password, &mut mail.password);
    assert_rejected(&encrypted, "swapping passwords between entries");
}

#[test]
fn test_dropped_item_detected() {
    let db = populated(EncryptionAlgorithm::Aes256Gcm);
    let mut encrypted = encrypt(&db, PASSWORD).expect("encrypt should succeed");
    encrypted.contents.pop();
    assert_rejected(&encrypted, "dropping the last item");

    let mut encrypted = encrypt(&db, PASSWORD).expect("encrypt should succeed");
    if let SealedContent::Folder(private) = &mut encrypted.contents[0] {
        private.contents.remove(0);
    }
    assert_rejected(&encrypted, "dropping a nested item");
}

#[test]
fn test_reordered_items_detected() {
    let db = two_entries();
    let mut encrypted = encrypt(&db, PASSWORD).expect("encrypt should succeed");
    encrypted.contents.swap(0, 1);
    assert_rejected(&encrypted, "reordering items");
}

#[test]
fn test_cleartext_root_edits_detected() {
    let db = populated(EncryptionAlgorithm::Aes256Gcm);
    let encrypted = encrypt(&db, PASSWORD).expect("encrypt should succeed");

    let mut renamed = encrypted.clone();
    renamed.record.set_name("Attacker");
    assert_rejected(&renamed, "renaming the store");

    let mut biometrics = encrypted.clone();
    biometrics.allow_biometrics = true;
    assert_rejected(&biometrics, "enabling biometrics");

    let mut both = encrypted.clone();
    both.record.set_name("Attacker");
    both.allow_biometrics = true;
    assert_rejected(&both, "renaming the store and enabling biometrics");

    let mut moved = encrypted.clone();
    moved.header = Header::new(
        encrypted.header.algorithm(),
        StorageBackend::FlatFile,
        encrypted.header.salt().clone(),
    );
    assert_rejected(&moved, "changing the backend tag");
}

#[test]
fn test_personal_store_scenario() {
    let mut db = Database::create(NewDatabase::new("Personal", PASSWORD))
        .expect("create should succeed");
    let mut private = Folder::new(Record::new("Private"));
    private.push(Document::new(Record::new("Note"), "note", b"secret".to_vec()).into());
    db.push(private.into());

    let locked = db.lock().expect("lock should succeed");
    assert_eq!(locked.record.name(), "Personal");
    for field in locked.sealed_fields() {
        assert!(!field
            .as_bytes()
            .windows(b"secret".len())
            .any(|window| window == b"secret"));
    }

    let unlocked = locked.unlock(PASSWORD).expect("unlock should succeed");
    let Content::Folder(folder) = &unlocked.contents()[0] else {
        panic!("expected a folder");
    };
    assert_eq!(folder.record.name(), "Private");
    let Content::Document(note) = &folder.contents[0] else {
        panic!("expected a document");
    };
    assert_eq!(note.doc_type, "note");
    assert_eq!(note.content, b"secret");

    assert!(matches!(
        locked.unlock("wrong"),
        Err(StrongboxError::WrongPasswordOrCorruptData)
    ));
}

#[test]
fn test_image_bytes_survive_exactly() {
    let db = populated(EncryptionAlgorithm::Aes256Gcm);
    let decrypted = db
        .lock()
        .and_then(|locked| locked.unlock(PASSWORD))
        .expect("round trip should succeed");

    let mut images = Vec::new();
    decrypted.walk(&mut |node| {
        if let Content::Image(image) = node {
            images.push(image.clone());
        }
    });
    assert_eq!(images.len(), 2);
    for image in images {
        let raster = image.decode().expect("stored image should decode");
        assert_eq!((raster.width(), raster.height()), (6, 4));
    }
}

#[test]
fn test_change_password_rotates_salt() {
    let mut db = populated(EncryptionAlgorithm::Aes256Gcm);
    let old_salt = db.header().salt().clone();
    let old_locked = db.lock().expect("lock should succeed");

    db.change_password("battery-staple")
        .expect("password change should succeed");
    assert_ne!(db.header().salt(), &old_salt);
    assert_eq!(db.header().algorithm(), EncryptionAlgorithm::Aes256Gcm);
    assert_eq!(db.header().backend(), StorageBackend::Sqlite);

    let new_locked = db.lock().expect("lock should succeed");
    assert!(matches!(
        new_locked.unlock(PASSWORD),
        Err(StrongboxError::WrongPasswordOrCorruptData)
    ));
    assert_eq!(
        new_locked.unlock("battery-staple").expect("unlock should succeed"),
        db
    );
    // The old snapshot still opens with the old password.
    assert!(old_locked.unlock(PASSWORD).is_ok());
}

#[test]
fn test_weak_passwords_rejected() {
    assert!(matches!(
        Database::create(NewDatabase::new("Personal", "short")),
        Err(StrongboxError::InvalidInput(_))
    ));
    let mut db = new_database(EncryptionAlgorithm::Aes256Gcm);
    assert!(matches!(
        db.change_password("        "),
        Err(StrongboxError::InvalidInput(_))
    ));
}

#[test]
fn test_store_state_lifecycle() {
    let db = populated(EncryptionAlgorithm::Aes256Gcm);
    let expected_contents = db.contents().len();
    let mut state = StoreState::Unlocked(db);

    state.lock().expect("lock should succeed");
    assert!(state.is_locked());
    assert!(state.database().is_none());

    let failed = state.unlock("wrong");
    assert!(matches!(failed, Err(StrongboxError::WrongPasswordOrCorruptData)));
    assert!(state.is_locked());

    state.unlock(PASSWORD).expect("unlock should succeed");
    assert!(!state.is_locked());
    assert_eq!(
        state.database().expect("unlocked").contents().len(),
        expected_contents
    );
}

#[test]
fn test_push_into_nested_folder() {
    let mut db = populated(EncryptionAlgorithm::Aes256Gcm);
    let archive_id = match &db.contents()[0] {
        Content::Folder(private) => private.contents[1].id(),
        _ => panic!("expected a folder"),
    };
    db.push_into(archive_id, Entry::new(Record::new("Mail")).into())
        .expect("push into folder should succeed");
    assert!(matches!(
        db.push_into(uuid::Uuid::new_v4(), Entry::new(Record::new("Lost")).into()),
        Err(StrongboxError::NotFound(_))
    ));

    let round_tripped = db
        .lock()
        .and_then(|locked| locked.unlock(PASSWORD))
        .expect("round trip should succeed");
    assert_eq!(round_tripped, db);
}
