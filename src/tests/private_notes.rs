use crate::error::Error;
use crate::notes::ContentType;
use crate::notes::PRIVATE;
use crate::notes::SecretPayload;
use crate::notes::TRASH;
use crate::notes::UNCATEGORIZED;
use crate::tests::helper;
use crate::unlock::UnlockCache;
use crate::unlock::Unlocked;

#[tokio::test]
async fn test_private_note_scenario() {
    let mut notebook = helper::test_notebook();
    let note_id = notebook
        .create_note("New Private Note", PRIVATE, true)
        .unwrap()
        .id
        .clone();

    notebook
        .set_private(
            &note_id,
            "abc123",
            SecretPayload::new("Secret", "the plan", ContentType::Plain),
        )
        .await
        .unwrap();

    let note = notebook.note(&note_id).unwrap();
    assert_eq!("Private Note", note.title);
    assert_eq!("", note.content);
    assert!(note.encrypted.is_some());
    assert!(note.is_private);
    assert_eq!(PRIVATE, note.category_id);
    assert!(!notebook.is_unlocked(&note_id));

    // the snapshot never holds the plaintext
    let json = serde_json::to_string(&notebook.to_snapshot()).unwrap();
    assert!(!json.contains("Secret"));
    assert!(!json.contains("the plan"));

    assert!(matches!(
        notebook.unlock(&note_id, "wrong").await,
        Err(Error::WrongPassword)
    ));
    assert!(!notebook.is_unlocked(&note_id));

    let unlocked = notebook.unlock(&note_id, "abc123").await.unwrap();
    assert_eq!("Secret", unlocked.title);
    assert_eq!("the plan", unlocked.content);
    assert_eq!("abc123", unlocked.password());

    // cached entries need no password
    let unlocked = notebook.unlock(&note_id, "").await.unwrap();
    assert_eq!("Secret", unlocked.title);

    notebook.relock();
    assert!(matches!(
        notebook.unlock(&note_id, "").await,
        Err(Error::PasswordRequired)
    ));
}

#[tokio::test]
async fn test_set_private_validation() {
    let mut notebook = helper::test_notebook();
    let note_id = notebook
        .create_note("Plain", UNCATEGORIZED, false)
        .unwrap()
        .id
        .clone();

    assert!(matches!(
        notebook
            .set_private(&note_id, "", SecretPayload::new("Secret", "", ContentType::Plain))
            .await,
        Err(Error::PasswordRequired)
    ));
    assert!(matches!(
        notebook
            .set_private(&note_id, "abc123", SecretPayload::new(" ", "", ContentType::Plain))
            .await,
        Err(Error::EmptyName)
    ));

    let note = notebook.note(&note_id).unwrap();
    assert!(!note.is_private);
    assert_eq!("Plain", note.title);
    assert_eq!(UNCATEGORIZED, note.category_id);
}

#[tokio::test]
async fn test_private_notes_stay_in_private() {
    let mut notebook = helper::test_notebook();
    let work = notebook.create_category("Work").unwrap().id.clone();
    let note_id = notebook
        .create_note("Plan", &work, false)
        .unwrap()
        .id
        .clone();

    notebook
        .set_private(
            &note_id,
            "abc123",
            SecretPayload::new("Plan", "", ContentType::Markdown),
        )
        .await
        .unwrap();
    assert_eq!(PRIVATE, notebook.note(&note_id).unwrap().category_id);
    assert_eq!(
        ContentType::Markdown,
        notebook.note(&note_id).unwrap().content_type
    );

    // the requested target is ignored
    notebook.move_to_category(&note_id, &work).unwrap();
    assert_eq!(PRIVATE, notebook.note(&note_id).unwrap().category_id);
    assert!(notebook.members(&work).is_empty());

    // trash is the one exception
    notebook.soft_delete(&note_id).unwrap();
    assert_eq!(TRASH, notebook.note(&note_id).unwrap().category_id);
    helper::assert_consistent(&notebook);

    notebook.restore(&note_id).unwrap();
    assert_eq!(PRIVATE, notebook.note(&note_id).unwrap().category_id);
    helper::assert_consistent(&notebook);
}

#[tokio::test]
async fn test_clear_private() {
    let mut notebook = helper::test_notebook();
    let work = notebook.create_category("Work").unwrap().id.clone();
    notebook.create_note("Taken", &work, false).unwrap();
    let note_id = notebook
        .create_note("", PRIVATE, true)
        .unwrap()
        .id
        .clone();

    notebook
        .set_private(
            &note_id,
            "abc123",
            SecretPayload::new("Taken", "body", ContentType::Html),
        )
        .await
        .unwrap();

    let payload = notebook
        .unlock(&note_id, "abc123")
        .await
        .unwrap()
        .payload();

    // the plaintext title must be free in the target
    assert!(matches!(
        notebook.clear_private_into(&note_id, payload.clone(), &work),
        Err(Error::DuplicateTitle(_))
    ));
    assert!(notebook.note(&note_id).unwrap().is_private);

    notebook.clear_private(&note_id, payload).unwrap();

    let note = notebook.note(&note_id).unwrap();
    assert!(!note.is_private);
    assert!(note.encrypted.is_none());
    assert_eq!("Taken", note.title);
    assert_eq!("body", note.content);
    assert_eq!(ContentType::Html, note.content_type);
    assert_eq!(UNCATEGORIZED, note.category_id);
    assert!(!notebook.is_unlocked(&note_id));

    assert!(matches!(
        notebook.clear_private(&note_id, SecretPayload::default()),
        Err(Error::NotPrivate(_))
    ));
}

#[tokio::test]
async fn test_clear_private_in_trash() {
    let mut notebook = helper::test_notebook();
    let work = notebook.create_category("Work").unwrap().id.clone();
    let note_id = notebook
        .create_note("", PRIVATE, true)
        .unwrap()
        .id
        .clone();
    notebook
        .set_private(
            &note_id,
            "abc123",
            SecretPayload::new("Secret", "", ContentType::Plain),
        )
        .await
        .unwrap();
    notebook.soft_delete(&note_id).unwrap();

    let payload = notebook
        .unlock(&note_id, "abc123")
        .await
        .unwrap()
        .payload();
    notebook
        .clear_private_into(&note_id, payload, &work)
        .unwrap();

    let note = notebook.note(&note_id).unwrap();
    assert!(note.is_deleted);
    assert_eq!(TRASH, note.category_id);

    notebook.restore(&note_id).unwrap();
    assert_eq!(work, notebook.note(&note_id).unwrap().category_id);
}

#[tokio::test]
async fn test_clear_private_needs_unlock() {
    let mut notebook = helper::test_notebook();
    let note_id = notebook
        .create_note("", PRIVATE, true)
        .unwrap()
        .id
        .clone();
    notebook
        .set_private(
            &note_id,
            "abc123",
            SecretPayload::new("Secret", "the plan", ContentType::Plain),
        )
        .await
        .unwrap();
    let sealed = notebook.note(&note_id).unwrap().clone();

    assert!(matches!(
        notebook.clear_private(
            &note_id,
            SecretPayload::new("Forged", "", ContentType::Plain)
        ),
        Err(Error::PasswordRequired)
    ));
    assert_eq!(&sealed, notebook.note(&note_id).unwrap());

    // relocking takes the permission away again
    notebook.unlock(&note_id, "abc123").await.unwrap();
    notebook.relock();
    assert!(matches!(
        notebook.clear_private(
            &note_id,
            SecretPayload::new("Forged", "", ContentType::Plain)
        ),
        Err(Error::PasswordRequired)
    ));

    let unlocked = notebook.unlock(&note_id, "abc123").await.unwrap();
    assert_eq!("Secret", unlocked.title);
}

#[tokio::test]
async fn test_unlock_errors() {
    let mut notebook = helper::notebook_from_json(
        r#"{
            "notes": [
                {"id": "plain", "title": "Plain"},
                {"id": "broken", "title": "Private Note", "categoryId": "private", "isPrivate": true}
            ]
        }"#,
    );

    assert!(matches!(
        notebook.unlock("plain", "abc123").await,
        Err(Error::NotPrivate(_))
    ));
    assert!(matches!(
        notebook.unlock("broken", "abc123").await,
        Err(Error::MissingCiphertext(_))
    ));
    assert!(matches!(
        notebook.unlock("gone", "abc123").await,
        Err(Error::NoteNotFound(_))
    ));
}

#[tokio::test]
async fn test_display_title_follows_lock() {
    let mut notebook = helper::test_notebook();
    let note_id = notebook
        .create_note("", PRIVATE, true)
        .unwrap()
        .id
        .clone();
    notebook
        .set_private(
            &note_id,
            "abc123",
            SecretPayload::new("Secret", "", ContentType::Plain),
        )
        .await
        .unwrap();

    let note = notebook.note(&note_id).unwrap().clone();
    assert_eq!("Private Note", notebook.display_title(&note));

    notebook.unlock(&note_id, "abc123").await.unwrap();
    assert_eq!("Secret", notebook.display_title(&note));

    notebook.forget(&note_id);
    assert_eq!("Private Note", notebook.display_title(&note));
}

#[tokio::test]
async fn test_hard_delete_evicts_plaintext() {
    let mut notebook = helper::test_notebook();
    let note_id = notebook
        .create_note("", PRIVATE, true)
        .unwrap()
        .id
        .clone();
    notebook
        .set_private(
            &note_id,
            "abc123",
            SecretPayload::new("Secret", "", ContentType::Plain),
        )
        .await
        .unwrap();
    notebook.unlock(&note_id, "abc123").await.unwrap();
    notebook.soft_delete(&note_id).unwrap();

    assert!(notebook.is_unlocked(&note_id));
    notebook.hard_delete(&note_id).unwrap();
    assert!(notebook.unlock_cache().is_empty());
}

#[test]
fn test_remember_only_private_notes() {
    let mut notebook = helper::test_notebook();
    let note_id = notebook
        .create_note("Plain", UNCATEGORIZED, false)
        .unwrap()
        .id
        .clone();

    notebook.remember(
        &note_id,
        Unlocked::new(SecretPayload::default(), "abc123"),
    );

    assert!(!notebook.is_unlocked(&note_id));
}

#[test]
fn test_debug_hides_plaintext() {
    let mut cache = UnlockCache::new();
    cache.insert(
        "note",
        Unlocked::new(
            SecretPayload::new("Secret", "the plan", ContentType::Plain),
            "abc123",
        ),
    );

    let debug = format!("{cache:?}");
    assert!(!debug.contains("Secret"));
    assert!(!debug.contains("the plan"));
    assert!(!debug.contains("abc123"));

    cache.clear();
    assert!(cache.is_empty());
}
