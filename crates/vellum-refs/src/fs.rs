//! File-per-ref reference store.
//!
//! Each ref is a file at `<root>/<ref name>` holding the target hash in hex.
//! `HEAD` lives at `<root>/HEAD` as `ref: <target>`.
//!
//! Every write takes an exclusive `<file>.lock` sibling (created with
//! `create_new`), writes the new contents into it and renames it over the
//! ref. The check in a compare-and-swap happens while the lock is held, so
//! it is atomic across store handles and processes sharing the directory.
//! A writer that finds the lock taken retries for a few seconds and then
//! fails with [`RefError::Locked`]; a lock left behind by a crashed writer
//! has to be removed by hand.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};
use vellum_types::ObjectId;

use crate::error::{RefError, RefResult};
use crate::names::validate_ref_name;
use crate::traits::RefStore;
use crate::types::{is_tag, Ref, HEAD};

const SYMBOLIC_PREFIX: &str = "ref: ";
const LOCK_SUFFIX: &str = ".lock";
const LOCK_ATTEMPTS: u32 = 3000;
const LOCK_RETRY: Duration = Duration::from_millis(1);

/// An exclusive lock on one ref file. Dropping it without
/// [`LockFile::commit`] removes the lock and leaves the ref untouched.
struct LockFile {
    lock_path: PathBuf,
    target: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl LockFile {
    fn acquire(name: &str, target: PathBuf) -> RefResult<Self> {
        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut lock_path = target.clone().into_os_string();
        lock_path.push(LOCK_SUFFIX);
        let lock_path = PathBuf::from(lock_path);

        for _ in 0..LOCK_ATTEMPTS {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(file) => {
                    return Ok(Self {
                        lock_path,
                        target,
                        file: Some(file),
                        committed: false,
                    })
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => thread::sleep(LOCK_RETRY),
                Err(e) => return Err(e.into()),
            }
        }
        warn!(ref_name = name, lock = %lock_path.display(), "gave up waiting for ref lock");
        Err(RefError::Locked {
            name: name.to_string(),
        })
    }

    /// Replace the ref's contents and release the lock.
    fn commit(mut self, contents: &str) -> RefResult<()> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }
        self.file = None;
        fs::rename(&self.lock_path, &self.target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        self.file = None;
        if !self.committed {
            let _ = fs::remove_file(&self.lock_path);
        }
    }
}

/// A filesystem implementation of [`RefStore`].
#[derive(Debug)]
pub struct FsRefStore {
    root: PathBuf,
}

impl FsRefStore {
    /// Open (creating if needed) a ref store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> RefResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("refs"))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ref_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn lock_ref(&self, name: &str) -> RefResult<LockFile> {
        LockFile::acquire(name, self.ref_path(name))
    }

    fn read_target(&self, name: &str) -> RefResult<Option<ObjectId>> {
        let text = match fs::read_to_string(self.ref_path(name)) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let target = text.trim().parse::<ObjectId>().map_err(|e| RefError::Corrupt {
            name: name.to_string(),
            reason: format!("{e}"),
        })?;
        Ok(Some(target))
    }

    fn collect(&self, dir: &Path, name: &str, out: &mut Vec<Ref>) -> RefResult<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let child = format!("{name}/{file_name}");
            if entry.file_type()?.is_dir() {
                self.collect(&entry.path(), &child, out)?;
                continue;
            }
            // Lock files and anything else that is not a ref name.
            if validate_ref_name(&child).is_err() {
                continue;
            }
            if let Some(target) = self.read_target(&child)? {
                out.push(Ref::new(child, target));
            }
        }
        Ok(())
    }
}

fn target_line(target: &ObjectId) -> String {
    format!("{}\n", target.to_hex())
}

impl RefStore for FsRefStore {
    fn read_ref(&self, name: &str) -> RefResult<Option<Ref>> {
        if validate_ref_name(name).is_err() {
            return Ok(None);
        }
        Ok(self.read_target(name)?.map(|target| Ref::new(name, target)))
    }

    fn create_ref(&self, name: &str, target: ObjectId) -> RefResult<()> {
        validate_ref_name(name)?;
        let lock = self.lock_ref(name)?;
        if self.ref_path(name).exists() {
            return Err(RefError::AlreadyExists {
                name: name.to_string(),
            });
        }
        lock.commit(&target_line(&target))?;
        debug!(ref_name = name, target = %target.short_hex(), "created ref");
        Ok(())
    }

    fn update_ref(&self, name: &str, expected: ObjectId, new: ObjectId) -> RefResult<()> {
        validate_ref_name(name)?;
        if is_tag(name) {
            return Err(RefError::TagImmutable {
                name: name.to_string(),
            });
        }
        let lock = self.lock_ref(name)?;
        let actual = self.read_target(name)?.ok_or_else(|| RefError::NotFound {
            name: name.to_string(),
        })?;
        if actual != expected {
            return Err(RefError::Conflict {
                name: name.to_string(),
                expected,
                actual,
            });
        }
        lock.commit(&target_line(&new))?;
        debug!(ref_name = name, from = %expected.short_hex(), to = %new.short_hex(), "moved ref");
        Ok(())
    }

    fn write_ref(&self, name: &str, target: ObjectId) -> RefResult<()> {
        validate_ref_name(name)?;
        let lock = self.lock_ref(name)?;
        if is_tag(name) {
            if let Some(existing) = self.read_target(name)? {
                if existing != target {
                    return Err(RefError::TagImmutable {
                        name: name.to_string(),
                    });
                }
                return Ok(());
            }
        }
        lock.commit(&target_line(&target))
    }

    fn list_refs(&self, prefix: &str) -> RefResult<Vec<Ref>> {
        let mut refs = Vec::new();
        self.collect(&self.root.join("refs"), "refs", &mut refs)?;
        refs.retain(|r| r.name.starts_with(prefix));
        refs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(refs)
    }

    fn head(&self) -> RefResult<Option<String>> {
        let text = match fs::read_to_string(self.root.join(HEAD)) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let target = text
            .trim()
            .strip_prefix(SYMBOLIC_PREFIX)
            .ok_or_else(|| RefError::Corrupt {
                name: HEAD.to_string(),
                reason: "HEAD is not a symbolic ref".into(),
            })?;
        Ok(Some(target.to_string()))
    }

    fn set_head(&self, target: &str) -> RefResult<()> {
        validate_ref_name(target)?;
        let lock = LockFile::acquire(HEAD, self.root.join(HEAD))?;
        lock.commit(&format!("{SYMBOLIC_PREFIX}{target}\n"))
    }
}
