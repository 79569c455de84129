use crate::notes::{BackendCsv, NoteCreate, NoteStore, StoreError, NOTES_FILE};
use crate::semantic::codec;

fn fresh_store() -> (BackendCsv, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let store = BackendCsv::load(tmp.path()).unwrap();
    (store, tmp)
}

fn text(content: &str) -> NoteCreate {
    NoteCreate {
        content: content.to_string(),
        ..Default::default()
    }
}

// --- load ---

#[test]
fn load_creates_file_with_headers() {
    let (store, tmp) = fresh_store();

    let raw = std::fs::read_to_string(tmp.path().join(NOTES_FILE)).unwrap();
    assert_eq!(raw.trim(), "id,created_at,source_file,content,embedding");
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn load_rejects_malformed_id() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join(NOTES_FILE),
        "id,created_at,source_file,content,embedding\nabc,2024-01-01T00:00:00+00:00,,hi,\n",
    )
    .unwrap();

    match BackendCsv::load(tmp.path()) {
        Err(StoreError::Malformed { line, .. }) => assert_eq!(line, 2),
        Err(other) => panic!("expected Malformed, got {other:?}"),
        Ok(_) => panic!("expected Malformed, got a store"),
    }
}

#[test]
fn load_sorts_by_id() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join(NOTES_FILE),
        "id,created_at,source_file,content,embedding\n\
         5,2024-01-01T00:00:00+00:00,,five,\n\
         2,2024-01-01T00:00:00+00:00,,two,\n",
    )
    .unwrap();

    let store = BackendCsv::load(tmp.path()).unwrap();
    let ids: Vec<u64> = store.list_all().unwrap().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![2, 5]);

    let note = store.insert(text("six")).unwrap();
    assert_eq!(note.id, 6);
}

// --- insert / get / delete ---

#[test]
fn insert_assigns_increasing_ids() {
    let (store, _tmp) = fresh_store();

    let a = store.insert(text("first")).unwrap();
    let b = store.insert(text("second")).unwrap();

    assert_eq!(a.id, 1);
    assert_eq!(b.id, 2);
    assert!(b.created_at >= a.created_at);
}

#[test]
fn get_missing_returns_none() {
    let (store, _tmp) = fresh_store();
    store.insert(text("only")).unwrap();

    assert!(store.get(1).unwrap().is_some());
    assert!(store.get(42).unwrap().is_none());
}

#[test]
fn delete_reports_whether_removed() {
    let (store, _tmp) = fresh_store();
    store.insert(text("a")).unwrap();
    store.insert(text("b")).unwrap();

    assert!(store.delete(1).unwrap());
    assert!(!store.delete(1).unwrap());

    let ids: Vec<u64> = store.list_all().unwrap().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![2]);
}

#[test]
fn insert_many_assigns_consecutive_ids() {
    let (store, _tmp) = fresh_store();
    store.insert(text("first")).unwrap();

    let inserted = store
        .insert_many(vec![text("a"), text("b"), text("c")])
        .unwrap();

    let ids: Vec<u64> = inserted.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![2, 3, 4]);
    assert_eq!(store.list_all().unwrap().len(), 4);
    assert_eq!(store.get(3).unwrap().unwrap().content, "b");
}

#[test]
fn insert_many_empty_is_noop() {
    let (store, _tmp) = fresh_store();
    assert!(store.insert_many(vec![]).unwrap().is_empty());
    assert!(store.list_all().unwrap().is_empty());
}

// --- persistence ---

#[test]
fn save_load_roundtrip_preserves_data() {
    let tmp = tempfile::tempdir().unwrap();
    let embedding = codec::encode(&[0.25, -1.5, 3.0]);
    let content = "line one\nline \"two\", with comma";

    {
        let store = BackendCsv::load(tmp.path()).unwrap();
        store
            .insert(NoteCreate {
                content: content.to_string(),
                embedding: Some(embedding.clone()),
                source_file: Some("report.md".to_string()),
            })
            .unwrap();
        store.insert(text("legacy")).unwrap();
        store
            .insert_many(vec![text("batch one"), text("batch two")])
            .unwrap();
    }

    let store = BackendCsv::load(tmp.path()).unwrap();
    let notes = store.list_all().unwrap();
    assert_eq!(notes.len(), 4);

    assert_eq!(notes[0].content, content);
    assert_eq!(notes[0].source_file.as_deref(), Some("report.md"));
    assert_eq!(notes[0].embedding.as_deref(), Some(embedding.as_slice()));

    assert_eq!(notes[1].content, "legacy");
    assert!(notes[1].source_file.is_none());
    assert!(!notes[1].has_embedding());

    assert_eq!(notes[2].content, "batch one");
    assert_eq!(notes[3].id, 4);
}

#[test]
fn delete_is_persisted() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let store = BackendCsv::load(tmp.path()).unwrap();
        store.insert(text("keep")).unwrap();
        store.insert(text("drop")).unwrap();
        store.delete(2).unwrap();
    }

    let store = BackendCsv::load(tmp.path()).unwrap();
    let notes = store.list_all().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].content, "keep");
}

#[test]
fn no_temp_files_left_behind() {
    let (store, tmp) = fresh_store();
    store.insert(text("a")).unwrap();
    store.insert(text("b")).unwrap();

    let names: Vec<String> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec![NOTES_FILE.to_string()]);
}
