use crate::error::Error;
use crate::locale::Locale;
use crate::notes::ALL;
use crate::notes::ContentType;
use crate::notes::PRIVATE;
use crate::notes::TRASH;
use crate::notes::UNCATEGORIZED;
use crate::search::SortMode;
use crate::storage::Memory;
use crate::storage::SnapshotStore;
use crate::tests::helper;
use crate::workspace::NoteDraft;
use crate::workspace::Workspace;

async fn empty_workspace() -> (Workspace, Memory) {
    let store = Memory::new();
    let workspace = Workspace::load(store.clone(), &helper::test_config())
        .await
        .unwrap();

    (workspace, store)
}

fn draft(title: &str, content: &str, category_id: &str) -> NoteDraft {
    NoteDraft {
        title: title.to_string(),
        content: content.to_string(),
        content_type: ContentType::Plain,
        category_id: category_id.to_string(),
        ..NoteDraft::default()
    }
}

fn private_draft(title: &str, content: &str, password: Option<&str>) -> NoteDraft {
    NoteDraft {
        title: title.to_string(),
        content: content.to_string(),
        private: true,
        password: password.map(ToString::to_string),
        ..NoteDraft::default()
    }
}

#[tokio::test]
async fn test_load() {
    let store = Memory::new();
    store
        .save(
            &serde_json::from_str(
                r#"{"notes": [{"id": "a", "title": "Kept", "categoryId": "uncategorized"}]}"#,
            )
            .unwrap(),
        )
        .await
        .unwrap();

    let workspace = Workspace::load(store, &helper::test_config())
        .await
        .unwrap();

    assert_eq!(ALL, workspace.current_category());
    assert_eq!(None, workspace.current_note());
    assert_eq!(SortMode::Modified, workspace.sort_mode());
    assert_eq!("Kept", workspace.notebook().note("a").unwrap().title);
    assert_eq!(4, workspace.notebook().categories().len());
}

#[tokio::test]
async fn test_load_failure() {
    let config = helper::test_config();

    assert!(matches!(
        Workspace::load(helper::FailingStore::default(), &config).await,
        Err(Error::Sync(_))
    ));

    let workspace = Workspace::load_or_default(helper::FailingStore::default(), &config).await;
    assert_eq!(4, workspace.notebook().categories().len());
    assert!(workspace.notebook().notes().is_empty());
}

#[tokio::test]
async fn test_changes_are_saved() {
    let (mut workspace, store) = empty_workspace().await;

    let view = workspace.create_note(None).await.unwrap();
    assert_eq!("New Note", view.title);
    assert_eq!(UNCATEGORIZED, view.category_id);
    assert_eq!(Some(view.id.as_str()), workspace.current_note());

    let work = workspace.create_category("Work").unwrap();
    let view = workspace
        .save_note(draft("Plan", "steps", &work.id))
        .await
        .unwrap();
    assert_eq!("Plan", view.title);
    assert_eq!(work.id, view.category_id);

    workspace.flush().await;

    let saved = store.load().await.unwrap();
    assert_eq!(workspace.notebook().to_snapshot(), saved);
    assert_eq!(3, workspace.sync_status().completed);

    // rejected saves queue nothing
    assert!(matches!(
        workspace.save_note(draft(" ", "", &work.id)).await,
        Err(Error::EmptyName)
    ));
    workspace.flush().await;
    assert_eq!(3, workspace.sync_status().completed);
}

#[tokio::test]
async fn test_create_note_in_views() {
    let (mut workspace, _store) = empty_workspace().await;
    let work = workspace.create_category("Work").unwrap();

    workspace.select_category(TRASH).unwrap();
    let view = workspace.create_note(None).await.unwrap();
    assert_eq!(UNCATEGORIZED, view.category_id);

    workspace.select_category(&work.id).unwrap();
    let view = workspace.create_note(None).await.unwrap();
    assert_eq!(work.id, view.category_id);

    // titles stay unique
    let view = workspace.create_note(None).await.unwrap();
    assert_eq!("New Note (2)", view.title);

    assert_eq!(2, workspace.visible_notes().len());
}

#[tokio::test]
async fn test_private_view_flow() {
    let (mut workspace, store) = empty_workspace().await;
    workspace.select_category(PRIVATE).unwrap();

    assert!(matches!(
        workspace.create_note(None).await,
        Err(Error::PasswordRequired)
    ));
    assert!(workspace.notebook().notes().is_empty());

    let view = workspace.create_note(Some("abc123")).await.unwrap();
    assert!(view.is_private);
    assert!(!view.is_locked);
    assert_eq!("New Private Note", view.title);
    assert!(workspace.notebook().is_unlocked(&view.id));

    // the cached password seals the save
    let view = workspace
        .save_note(private_draft("Diary", "dear diary", None))
        .await
        .unwrap();
    assert_eq!("Diary", view.title);
    assert_eq!("dear diary", view.content);
    assert!(!view.is_locked);

    let summaries = workspace.search("dear");
    assert_eq!(1, summaries.len());
    assert_eq!("Diary", summaries[0].title);

    workspace.flush().await;
    let saved = store.load().await.unwrap();
    assert_eq!(Some("Private Note"), saved.notes[0].title.as_deref());
    assert!(saved.notes[0].encrypted.is_some());

    // leaving the view locks everything
    workspace.select_category(ALL).unwrap();
    assert!(!workspace.notebook().is_unlocked(&view.id));
    assert_eq!(None, workspace.current_note());
    assert!(workspace.search("dear").is_empty());

    let locked = workspace.visible_notes();
    assert_eq!("Private Note", locked[0].title);
    assert!(locked[0].is_locked);

    assert!(matches!(
        workspace.select_note(&view.id, Some("wrong")).await,
        Err(Error::WrongPassword)
    ));
    let opened = workspace.select_note(&view.id, Some("abc123")).await.unwrap();
    assert_eq!("Diary", opened.title);
}

#[tokio::test]
async fn test_switching_notes_relocks() {
    let (mut workspace, _store) = empty_workspace().await;
    workspace.select_category(PRIVATE).unwrap();

    let first = workspace.create_note(Some("one")).await.unwrap().id;
    let second = workspace.create_note(Some("two")).await.unwrap().id;

    // opening the second note locked the first
    assert!(!workspace.notebook().is_unlocked(&first));
    assert!(workspace.notebook().is_unlocked(&second));

    workspace.select_note(&first, Some("one")).await.unwrap();
    assert!(workspace.notebook().is_unlocked(&first));
    assert!(!workspace.notebook().is_unlocked(&second));

    // reopening the same note keeps it unlocked
    let view = workspace.select_note(&first, None).await.unwrap();
    assert!(!view.is_locked);

    assert!(matches!(
        workspace.select_note(&second, None).await,
        Err(Error::PasswordRequired)
    ));
}

#[tokio::test]
async fn test_save_outside_private_view() {
    let (mut workspace, _store) = empty_workspace().await;
    let note_id = workspace.create_note(None).await.unwrap().id;

    // sealing needs a password when nothing is cached
    assert!(matches!(
        workspace.save_note(private_draft("Secret", "", None)).await,
        Err(Error::PasswordRequired)
    ));

    let view = workspace
        .save_note(private_draft("Secret", "body", Some("abc123")))
        .await
        .unwrap();
    assert!(view.is_private);
    assert!(view.is_locked);
    assert_eq!(PRIVATE, view.category_id);
    assert!(!workspace.notebook().is_unlocked(&note_id));

    // making a locked note plain again unlocks it first
    let mut plain = draft("Public", "body", UNCATEGORIZED);
    assert!(matches!(
        workspace.save_note(plain.clone()).await,
        Err(Error::PasswordRequired)
    ));

    plain.password = Some("abc123".to_string());
    let view = workspace.save_note(plain).await.unwrap();
    assert!(!view.is_private);
    assert_eq!("Public", view.title);
    assert_eq!(UNCATEGORIZED, view.category_id);
    assert!(workspace.notebook().note(&note_id).unwrap().encrypted.is_none());
}

#[tokio::test]
async fn test_delete_and_restore() {
    let (mut workspace, _store) = empty_workspace().await;

    assert!(matches!(workspace.delete_note(), Err(Error::NoSelection)));
    assert!(matches!(
        workspace.save_note(draft("Plan", "", UNCATEGORIZED)).await,
        Err(Error::NoSelection)
    ));

    let note_id = workspace.create_note(None).await.unwrap().id;
    workspace.delete_note().unwrap();
    assert_eq!(None, workspace.current_note());
    assert!(workspace.notebook().note(&note_id).unwrap().is_deleted);

    workspace.select_category(TRASH).unwrap();
    workspace.select_note(&note_id, None).await.unwrap();

    assert!(matches!(
        workspace.save_note(draft("Plan", "", UNCATEGORIZED)).await,
        Err(Error::InTrash(_))
    ));

    let view = workspace.restore_note().unwrap();
    assert!(!view.is_deleted);
    assert_eq!(UNCATEGORIZED, view.category_id);

    // deleting from trash is for good
    workspace.delete_note().unwrap();
    workspace.select_note(&note_id, None).await.unwrap();
    workspace.delete_note().unwrap();
    assert!(workspace.notebook().note(&note_id).is_none());
}

#[tokio::test]
async fn test_categories() {
    let (mut workspace, _store) = empty_workspace().await;
    let work = workspace.create_category("Work").unwrap();
    let note_id = workspace.create_note(None).await.unwrap().id;

    workspace.move_note(&work.id).unwrap();
    assert_eq!(work.id, workspace.notebook().note(&note_id).unwrap().category_id);

    workspace.rename_category(&work.id, "Office").unwrap();
    assert_eq!("Office", workspace.notebook().category_display_name(&work.id));

    workspace.select_category(&work.id).unwrap();
    workspace.delete_category(&work.id).unwrap();
    assert_eq!(ALL, workspace.current_category());
    assert_eq!(
        UNCATEGORIZED,
        workspace.notebook().note(&note_id).unwrap().category_id
    );

    assert!(matches!(
        workspace.select_category(&work.id),
        Err(Error::CategoryNotFound(_))
    ));
    assert!(matches!(
        workspace.delete_category(TRASH),
        Err(Error::ProtectedCategory(_))
    ));
}

#[tokio::test]
async fn test_sort_modes() {
    let (mut workspace, _store) = empty_workspace().await;

    assert_eq!(SortMode::Category, workspace.set_sort_mode(SortMode::Category));

    // by category only makes sense for all notes
    workspace.select_category(UNCATEGORIZED).unwrap();
    assert_eq!(SortMode::Modified, workspace.sort_mode());
    assert_eq!(SortMode::Modified, workspace.set_sort_mode(SortMode::Category));
    assert_eq!(SortMode::Title, workspace.set_sort_mode(SortMode::Title));

    // other modes survive navigation
    workspace.select_category(ALL).unwrap();
    assert_eq!(SortMode::Title, workspace.sort_mode());
}

#[tokio::test]
async fn test_set_locale() {
    let (mut workspace, _store) = empty_workspace().await;

    workspace.set_locale(Locale::Zh);

    assert_eq!("全部笔记", workspace.notebook().category_display_name(ALL));
    let view = workspace.create_note(None).await.unwrap();
    assert_eq!("新笔记", view.title);
}
