use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    path::Path,
    sync::{Arc, RwLock},
    time::Instant,
};

use crate::storage::{BackendLocal, StorageManager};

pub const NOTES_FILE: &str = "notes.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,

    /// Encoded embedding, see `semantic::codec`. `None` for legacy notes.
    #[serde(skip)]
    pub embedding: Option<Vec<u8>>,
}

impl Note {
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoteCreate {
    pub content: String,
    pub embedding: Option<Vec<u8>>,
    pub source_file: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed note record at line {line}: {message}")]
    Malformed { line: u64, message: String },

    #[error("note store lock poisoned")]
    Poisoned,
}

/// Durable note storage.
///
/// `list_all` returns notes in ascending id order. Ids are assigned by the
/// store on insert.
pub trait NoteStore: Send + Sync {
    fn insert(&self, note: NoteCreate) -> Result<Note, StoreError>;
    /// Insert several notes with consecutive ids in one write. Either all
    /// of them are stored or none is.
    fn insert_many(&self, notes: Vec<NoteCreate>) -> Result<Vec<Note>, StoreError>;
    fn list_all(&self) -> Result<Vec<Note>, StoreError>;
    fn get(&self, id: u64) -> Result<Option<Note>, StoreError>;
    /// Returns `false` if no note had this id.
    fn delete(&self, id: u64) -> Result<bool, StoreError>;
}

pub struct BackendCsv {
    list: Arc<RwLock<Vec<Note>>>,
    storage: BackendLocal,
}

const CSV_HEADERS: [&str; 5] = ["id", "created_at", "source_file", "content", "embedding"];

impl BackendCsv {
    pub fn load(base_dir: &Path) -> Result<Self, StoreError> {
        let storage = BackendLocal::new(base_dir)?;

        if !storage.exists(NOTES_FILE) {
            log::info!("Creating new archive at {}", storage.path(NOTES_FILE).display());
            let mut csv_wrt = csv::Writer::from_writer(vec![]);
            csv_wrt.write_record(CSV_HEADERS)?;
            storage.write(NOTES_FILE, &Self::into_bytes(csv_wrt)?)?;
        }

        let now = Instant::now();
        let data = storage.read(NOTES_FILE)?;
        let mut csv_reader = csv::Reader::from_reader(data.as_slice());

        let mut notes = vec![];
        for record in csv_reader.records() {
            notes.push(Self::parse_record(&record?)?);
        }
        notes.sort_by_key(|n| n.id);

        log::debug!(
            "took {}ms to read {} notes",
            now.elapsed().as_micros() as f64 / 1000.0,
            notes.len()
        );

        Ok(BackendCsv {
            list: Arc::new(RwLock::new(notes)),
            storage,
        })
    }

    fn parse_record(record: &csv::StringRecord) -> Result<Note, StoreError> {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let malformed = |message: String| StoreError::Malformed { line, message };
        let field = |idx: usize, name: &str| {
            record
                .get(idx)
                .ok_or_else(|| malformed(format!("missing field {name}")))
        };

        let id = field(0, "id")?
            .parse::<u64>()
            .map_err(|e| malformed(format!("invalid id: {e}")))?;
        let created_at = DateTime::parse_from_rfc3339(field(1, "created_at")?)
            .map_err(|e| malformed(format!("invalid created_at: {e}")))?
            .with_timezone(&Utc);
        let source_file = field(2, "source_file")?;
        let content = field(3, "content")?.to_string();
        let embedding = field(4, "embedding")?;

        let embedding = if embedding.is_empty() {
            None
        } else {
            Some(
                BASE64
                    .decode(embedding)
                    .map_err(|e| malformed(format!("invalid embedding: {e}")))?,
            )
        };

        Ok(Note {
            id,
            content,
            created_at,
            source_file: if source_file.is_empty() {
                None
            } else {
                Some(source_file.to_string())
            },
            embedding,
        })
    }

    fn save(&self, notes: &[Note]) -> Result<(), StoreError> {
        let mut csv_wrt = csv::Writer::from_writer(vec![]);
        csv_wrt.write_record(CSV_HEADERS)?;
        for note in notes {
            csv_wrt.write_record([
                note.id.to_string(),
                note.created_at.to_rfc3339(),
                note.source_file.clone().unwrap_or_default(),
                note.content.clone(),
                note.embedding
                    .as_ref()
                    .map(|bytes| BASE64.encode(bytes))
                    .unwrap_or_default(),
            ])?;
        }

        self.storage.write(NOTES_FILE, &Self::into_bytes(csv_wrt)?)?;
        Ok(())
    }

    fn into_bytes(csv_wrt: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, StoreError> {
        csv_wrt
            .into_inner()
            .map_err(|e| StoreError::Io(e.into_error()))
    }
}

impl NoteStore for BackendCsv {
    fn insert(&self, note_create: NoteCreate) -> Result<Note, StoreError> {
        let mut notes = self.list.write().map_err(|_| StoreError::Poisoned)?;

        let id = notes.last().map(|last| last.id + 1).unwrap_or(1);

        let note = Note {
            id,
            content: note_create.content,
            created_at: Utc::now(),
            source_file: note_create.source_file,
            embedding: note_create.embedding,
        };

        notes.push(note.clone());

        if let Err(err) = self.save(&notes) {
            notes.pop();
            return Err(err);
        }

        Ok(note)
    }

    fn insert_many(&self, note_creates: Vec<NoteCreate>) -> Result<Vec<Note>, StoreError> {
        if note_creates.is_empty() {
            return Ok(vec![]);
        }

        let mut notes = self.list.write().map_err(|_| StoreError::Poisoned)?;

        let first_id = notes.last().map(|last| last.id + 1).unwrap_or(1);
        let created_at = Utc::now();

        let inserted: Vec<Note> = note_creates
            .into_iter()
            .zip(first_id..)
            .map(|(note_create, id)| Note {
                id,
                content: note_create.content,
                created_at,
                source_file: note_create.source_file,
                embedding: note_create.embedding,
            })
            .collect();

        let previous_len = notes.len();
        notes.extend(inserted.iter().cloned());

        if let Err(err) = self.save(&notes) {
            notes.truncate(previous_len);
            return Err(err);
        }

        Ok(inserted)
    }

    fn list_all(&self) -> Result<Vec<Note>, StoreError> {
        Ok(self.list.read().map_err(|_| StoreError::Poisoned)?.clone())
    }

    fn get(&self, id: u64) -> Result<Option<Note>, StoreError> {
        let notes = self.list.read().map_err(|_| StoreError::Poisoned)?;
        Ok(notes.iter().find(|n| n.id == id).cloned())
    }

    fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let mut notes = self.list.write().map_err(|_| StoreError::Poisoned)?;

        let Some(idx) = notes.iter().position(|n| n.id == id) else {
            return Ok(false);
        };

        let removed = notes.remove(idx);
        if let Err(err) = self.save(&notes) {
            notes.insert(idx, removed);
            return Err(err);
        }

        Ok(true)
    }
}
