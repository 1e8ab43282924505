use std::io::{BufRead, Lines};
use std::iter::FusedIterator;

use tracing::{debug, info};
use vellum_document::{Document, Repository, Storage};
use vellum_refs::HEAD;
use vellum_store::{StoreError, StoredObject};
use vellum_types::{DocumentId, ObjectId};

use crate::error::{PackError, PackResult};
use crate::record::{
    ObjectRecord, RefKind, RefRecord, DOCUMENT_PREFIX, OBJECTS_MARKER, REFERENCES_MARKER,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    /// Nothing read yet; only a document header may follow.
    Start,
    Header,
    Objects,
    References,
}

struct Pending {
    id: DocumentId,
    repo: Repository,
}

/// Replays a dump into a [`Storage`], yielding each document once its
/// section of the stream is complete.
///
/// The stream is read line by line. A document is finalized (draft tip
/// loaded, type registered) when the next header or the end of the stream
/// is reached. Loading the same dump twice leaves the storage unchanged.
pub struct Loader<'s, R: BufRead> {
    storage: &'s Storage,
    lines: Lines<R>,
    line_no: usize,
    section: Section,
    pending: Option<Pending>,
    done: bool,
}

impl<'s, R: BufRead> Loader<'s, R> {
    pub fn new(storage: &'s Storage, input: R) -> Self {
        Self {
            storage,
            lines: input.lines(),
            line_no: 0,
            section: Section::Start,
            pending: None,
            done: false,
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> PackError {
        PackError::MalformedStream {
            line: self.line_no,
            reason: reason.into(),
        }
    }

    /// Advance until a document is complete. `Ok(None)` at a clean end
    /// of stream.
    fn step(&mut self) -> PackResult<Option<Document>> {
        loop {
            let line = match self.lines.next() {
                Some(line) => line?,
                None => return self.finish_stream(),
            };
            self.line_no += 1;
            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }

            if let Some(name) = line.strip_prefix(DOCUMENT_PREFIX) {
                if let Some(done) = self.start_document(name.trim())? {
                    return Ok(Some(done));
                }
                continue;
            }

            match (line, self.section) {
                (OBJECTS_MARKER, Section::Header) => self.section = Section::Objects,
                (OBJECTS_MARKER, _) => return Err(self.malformed("unexpected objects section")),
                (REFERENCES_MARKER, Section::Objects) => self.section = Section::References,
                (REFERENCES_MARKER, _) => {
                    return Err(self.malformed("unexpected references section"))
                }
                (_, Section::Objects) => self.read_object(line)?,
                (_, Section::References) => self.read_reference(line)?,
                (_, Section::Start | Section::Header) => {
                    return Err(self.malformed(format!("expected section marker, got {line:?}")))
                }
            }
        }
    }

    /// Begin a new document, finalizing the previous one if there is one.
    fn start_document(&mut self, name: &str) -> PackResult<Option<Document>> {
        if name.is_empty() {
            return Err(self.malformed("empty document header"));
        }
        let id = DocumentId::parse(name).map_err(|e| self.malformed(e.to_string()))?;

        let finished = match self.section {
            Section::Start => None,
            Section::References => self.finalize()?,
            _ => return Err(self.malformed("document ended before its references section")),
        };

        let repo = self.storage.open_or_create(&id)?;
        debug!(document = %id, line = self.line_no, "loading document");
        self.pending = Some(Pending { id, repo });
        self.section = Section::Header;
        Ok(finished)
    }

    fn finish_stream(&mut self) -> PackResult<Option<Document>> {
        self.done = true;
        match self.section {
            Section::Start => Ok(None),
            Section::References => self.finalize(),
            _ => Err(self.malformed("stream ended before the references section")),
        }
    }

    fn finalize(&mut self) -> PackResult<Option<Document>> {
        let Some(Pending { id, .. }) = self.pending.take() else {
            return Ok(None);
        };
        let mut doc = Document::attach(self.storage, id)?;
        doc.load_draft()?;
        doc.register()?;
        info!(document = %doc.id(), revision = ?doc.revision(), "loaded document");
        Ok(Some(doc))
    }

    fn repo(&self) -> PackResult<&Repository> {
        self.pending
            .as_ref()
            .map(|p| &p.repo)
            .ok_or_else(|| self.malformed("record outside of a document"))
    }

    fn read_object(&self, line: &str) -> PackResult<()> {
        let record: ObjectRecord = serde_json::from_str(line)
            .map_err(|e| self.malformed(format!("expected object record: {e}")))?;
        let data = record
            .decode_data()
            .map_err(|e| self.malformed(format!("invalid base64 payload: {e}")))?;

        if data.len() as u64 != record.len {
            return Err(PackError::Integrity {
                oid: record.oid,
                reason: format!(
                    "payload length mismatch: recorded {}, actual {}",
                    record.len,
                    data.len()
                ),
            });
        }

        let object = StoredObject::new(record.kind, data);
        match self.repo()?.objects().write_verified(&object, &record.oid) {
            Ok(_) => Ok(()),
            Err(StoreError::CorruptWrite { expected, computed }) => Err(PackError::Integrity {
                oid: expected,
                reason: format!("payload hashes to {computed}"),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn read_reference(&self, line: &str) -> PackResult<()> {
        let record: RefRecord = serde_json::from_str(line)
            .map_err(|e| self.malformed(format!("expected reference record: {e}")))?;
        let refs = self.repo()?.refs();

        match record.kind {
            RefKind::Symbolic if record.name == HEAD => refs.set_head(&record.target)?,
            RefKind::Symbolic => {
                return Err(self.malformed(format!(
                    "symbolic reference {} is not HEAD",
                    record.name
                )))
            }
            RefKind::Direct => {
                let target: ObjectId = record
                    .target
                    .parse()
                    .map_err(|e| self.malformed(format!("reference {}: {e}", record.name)))?;
                refs.write_ref(&record.name, target)?;
            }
        }
        Ok(())
    }
}

impl<R: BufRead> Iterator for Loader<'_, R> {
    type Item = PackResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.step();
        if result.is_err() {
            self.done = true;
        }
        result.transpose()
    }
}

impl<R: BufRead> FusedIterator for Loader<'_, R> {}

/// Load every document in `input` into `storage`.
pub fn load<R: BufRead>(storage: &Storage, input: R) -> PackResult<Vec<Document>> {
    Loader::new(storage, input).collect()
}
