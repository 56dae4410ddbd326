//! Per-session registry of resources created during a test run.
//!
//! Behaviours record every resource they create here so the session can
//! tear them down afterwards. The registry is owned by the test session and
//! passed by reference; nothing in the crate keeps a shared list.

use uuid::Uuid;

/// Prefix used for session tags applied to created resources.
pub const SESSION_TAG_PREFIX: &str = "statuswait-session-";

/// One resource recorded by a behaviour.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegisteredResource {
    /// Resource kind label, matching [`crate::lifecycle::ResourceKind::label`].
    pub kind: String,
    /// Provider identifier.
    pub id: String,
    /// Size in gigabytes when known, used to size the delete timeout.
    pub size_gb: Option<u64>,
}

/// Ordered record of resources created in one test session.
#[derive(Clone, Debug)]
pub struct ResourceRegistry {
    session_id: Uuid,
    entries: Vec<RegisteredResource>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceRegistry {
    /// Creates an empty registry with a fresh session id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_session_id(Uuid::new_v4())
    }

    /// Creates an empty registry for an existing session.
    #[must_use]
    pub const fn with_session_id(session_id: Uuid) -> Self {
        Self {
            session_id,
            entries: Vec::new(),
        }
    }

    /// Identifier of the owning session.
    #[must_use]
    pub const fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Tag clients may attach to resources so stray ones can be traced back
    /// to this session.
    #[must_use]
    pub fn session_tag(&self) -> String {
        format!("{SESSION_TAG_PREFIX}{}", self.session_id.simple())
    }

    /// Records a resource. Registering the same kind and id twice keeps the
    /// original entry.
    pub fn register(&mut self, kind: &str, id: &str, size_gb: Option<u64>) {
        if self.contains(kind, id) {
            return;
        }
        self.entries.push(RegisteredResource {
            kind: kind.to_owned(),
            id: id.to_owned(),
            size_gb,
        });
    }

    /// Removes a resource, returning whether it was registered.
    pub fn forget(&mut self, kind: &str, id: &str) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !(entry.kind == kind && entry.id == id));
        self.entries.len() != before
    }

    /// Returns whether a resource is registered.
    #[must_use]
    pub fn contains(&self, kind: &str, id: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.kind == kind && entry.id == id)
    }

    /// Resources of `kind`, most recently registered first.
    #[must_use]
    pub fn newest_first(&self, kind: &str) -> Vec<RegisteredResource> {
        self.entries
            .iter()
            .rev()
            .filter(|entry| entry.kind == kind)
            .cloned()
            .collect()
    }

    /// All registered resources in registration order.
    #[must_use]
    pub fn entries(&self) -> &[RegisteredResource] {
        &self.entries
    }

    /// Number of registered resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
