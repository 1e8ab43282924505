use vellum_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"vellum-blob-v1"`) that is
/// prepended to every hash computation. This prevents cross-type hash
/// collisions: a blob and a commit with identical bytes produce different
/// ids.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for content blobs.
    pub const BLOB: Self = Self {
        domain: "vellum-blob-v1",
    };
    /// Hasher for tree objects.
    pub const TREE: Self = Self {
        domain: "vellum-tree-v1",
    };
    /// Hasher for commit nodes.
    pub const COMMIT: Self = Self {
        domain: "vellum-commit-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected object ID.
    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let data = b"hello world";
        assert_eq!(ContentHasher::BLOB.hash(data), ContentHasher::BLOB.hash(data));
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let data = b"same content";
        let blob = ContentHasher::BLOB.hash(data);
        let tree = ContentHasher::TREE.hash(data);
        let commit = ContentHasher::COMMIT.hash(data);
        assert_ne!(blob, tree);
        assert_ne!(blob, commit);
        assert_ne!(tree, commit);
    }

    #[test]
    fn verify_detects_tampering() {
        let id = ContentHasher::COMMIT.hash(b"original");
        assert!(ContentHasher::COMMIT.verify(b"original", &id));
        assert!(!ContentHasher::COMMIT.verify(b"tampered", &id));
    }

    #[test]
    fn domain_hash_differs_from_plain_digest() {
        assert_ne!(ContentHasher::BLOB.hash(b"test"), ObjectId::digest(b"test"));
        assert_eq!(ContentHasher::TREE.domain(), "vellum-tree-v1");
    }
}
