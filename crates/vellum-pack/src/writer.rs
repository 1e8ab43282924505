use std::collections::HashSet;
use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};
use vellum_document::{Document, DocumentError, Repository, Storage};
use vellum_refs::{state_ref, HEAD};
use vellum_store::{Commit, StoredObject, Tree};
use vellum_types::{DocumentId, ObjectId};

use crate::error::{PackError, PackResult};
use crate::record::{ObjectRecord, RefRecord, DOCUMENT_PREFIX, OBJECTS_MARKER, REFERENCES_MARKER};

/// Counts reported once a dump is finished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DumpSummary {
    pub documents: usize,
    pub objects: usize,
    pub references: usize,
}

/// Streams document repositories into the line format.
///
/// Objects are copied as raw stored bytes and never decoded into
/// content, so a load reproduces every hash exactly.
pub struct DumpWriter<W: Write> {
    out: W,
    summary: DumpSummary,
}

impl<W: Write> DumpWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            summary: DumpSummary::default(),
        }
    }

    /// Append one document: its header, every object reachable along
    /// first parents from each ref, then the refs themselves.
    pub fn write_document(&mut self, id: &DocumentId, repo: &Repository) -> PackResult<()> {
        writeln!(self.out, "{DOCUMENT_PREFIX} {id}")?;
        writeln!(self.out, "{OBJECTS_MARKER}")?;

        let refs = repo.refs().enumerate_refs()?;
        let mut written = HashSet::new();
        match repo.root()? {
            Some(root) => {
                self.write_revision(repo, &root, &mut written)?;
                for r in &refs {
                    let mut next = Some(r.target);
                    while let Some(oid) = next.filter(|oid| *oid != root) {
                        next = self.write_revision(repo, &oid, &mut written)?.first_parent();
                    }
                }
            }
            None if !refs.is_empty() => return Err(DocumentError::MissingRoot.into()),
            None => warn!(document = %id, "dumping document without revisions"),
        }

        writeln!(self.out, "{REFERENCES_MARKER}")?;
        let head = repo
            .head()?
            .unwrap_or_else(|| state_ref(repo.draft_state()));
        self.write_record(&RefRecord::symbolic(HEAD, head))?;
        for r in &refs {
            self.write_record(&RefRecord::direct(r.name.as_str(), &r.target))?;
        }

        self.summary.documents += 1;
        self.summary.objects += written.len();
        self.summary.references += refs.len();
        info!(document = %id, objects = written.len(), refs = refs.len(), "dumped document");
        Ok(())
    }

    /// Flush the output and return the counts.
    pub fn finish(mut self) -> PackResult<DumpSummary> {
        self.out.flush()?;
        Ok(self.summary)
    }

    /// Write a commit followed by its tree and content blob. Returns the
    /// decoded commit so the caller can keep walking.
    fn write_revision(
        &mut self,
        repo: &Repository,
        oid: &ObjectId,
        written: &mut HashSet<ObjectId>,
    ) -> PackResult<Commit> {
        let raw = repo.objects().get(oid)?;
        let commit = Commit::from_stored_object(&raw)?;
        self.write_object(oid, &raw, written)?;

        let raw_tree = repo.objects().get(&commit.tree)?;
        let tree = Tree::from_stored_object(&raw_tree)?;
        self.write_object(&commit.tree, &raw_tree, written)?;

        if let Some(blob) = tree.content_id() {
            let raw_blob = repo.objects().get(&blob)?;
            self.write_object(&blob, &raw_blob, written)?;
        }
        Ok(commit)
    }

    fn write_object(
        &mut self,
        oid: &ObjectId,
        object: &StoredObject,
        written: &mut HashSet<ObjectId>,
    ) -> PackResult<()> {
        if written.insert(*oid) {
            self.write_record(&ObjectRecord::from_object(*oid, object))?;
        }
        Ok(())
    }

    fn write_record<T: Serialize>(&mut self, record: &T) -> PackResult<()> {
        let line =
            serde_json::to_string(record).map_err(|e| PackError::Serialization(e.to_string()))?;
        writeln!(self.out, "{line}")?;
        Ok(())
    }
}

/// Dump the given documents, in order, to `out`.
pub fn dump<'a, W, I>(documents: I, out: W) -> PackResult<DumpSummary>
where
    W: Write,
    I: IntoIterator<Item = &'a Document>,
{
    let mut writer = DumpWriter::new(out);
    for doc in documents {
        match doc.repository() {
            Some(repo) => writer.write_document(doc.id(), repo)?,
            None => {
                let empty = Repository::in_memory().with_draft_state(doc.draft_state());
                writer.write_document(doc.id(), &empty)?
            }
        }
    }
    writer.finish()
}

/// Dump every document registered in the storage's index.
pub fn dump_storage<W: Write>(storage: &Storage, out: W) -> PackResult<DumpSummary> {
    let mut writer = DumpWriter::new(out);
    for (id, _) in storage.documents()? {
        match storage.open(&id)? {
            Some(repo) => writer.write_document(&id, &repo)?,
            None => warn!(document = %id, "indexed document has no repository, skipping"),
        }
    }
    writer.finish()
}
