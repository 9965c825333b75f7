//! Arena of resources keyed by id with a parent → children index.
//!
//! The tree is the in-memory shape of one or more owners' hierarchies. It
//! enforces the structural invariants (unique canonical path per owner,
//! parents are folders of the same owner) on insert, walks ancestor chains
//! with cycle detection, and removes whole subtrees as one operation.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::Utc;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::{ResourceId, UserId};

use super::model::{Resource, join_path};

/// Resource arena with a children index.
#[derive(Debug, Clone, Default)]
pub struct ResourceTree {
    nodes: HashMap<ResourceId, Resource>,
    children: HashMap<ResourceId, Vec<ResourceId>>,
    paths: HashMap<(UserId, String), ResourceId>,
}

impl ResourceTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from rows that were already validated by the store,
    /// e.g. an ancestor chain loaded from the database. No invariants are
    /// checked, so a corrupted chain surfaces later in [`Self::ancestors`].
    pub fn from_rows(rows: impl IntoIterator<Item = Resource>) -> Self {
        let mut tree = Self::new();
        for row in rows {
            tree.index(row);
        }
        tree
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no resources.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a resource.
    pub fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.nodes.get(&id)
    }

    /// Look up a resource by owner and canonical path.
    pub fn find_by_path(&self, owner_id: UserId, path: &str) -> Option<&Resource> {
        self.paths
            .get(&(owner_id, path.to_string()))
            .and_then(|id| self.nodes.get(id))
    }

    /// Look up a direct child by name.
    pub fn find_child(&self, parent_id: ResourceId, name: &str) -> Option<&Resource> {
        self.children
            .get(&parent_id)?
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .find(|r| r.name == name)
    }

    /// Direct children of a folder, sorted by name.
    pub fn children(&self, parent_id: ResourceId) -> Vec<&Resource> {
        let mut out: Vec<&Resource> = self
            .children
            .get(&parent_id)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Insert a new resource, enforcing structural invariants.
    pub fn insert(&mut self, resource: Resource) -> AppResult<()> {
        if self.nodes.contains_key(&resource.id) {
            return Err(AppError::conflict(format!(
                "Resource {} already exists",
                resource.id
            )));
        }
        if self
            .paths
            .contains_key(&(resource.owner_id, resource.path.clone()))
        {
            return Err(AppError::conflict(format!(
                "Resource path '{}' already exists",
                resource.path
            )));
        }
        if let Some(parent_id) = resource.parent_id {
            let parent = self
                .nodes
                .get(&parent_id)
                .ok_or_else(|| AppError::not_found("Parent folder not found"))?;
            if !parent.is_folder() {
                return Err(AppError::validation("Parent resource is not a folder"));
            }
            if parent.owner_id != resource.owner_id {
                return Err(AppError::validation(
                    "A resource must live in its parent's owner scope",
                ));
            }
        }
        self.index(resource);
        Ok(())
    }

    fn index(&mut self, resource: Resource) {
        if let Some(parent_id) = resource.parent_id {
            self.children.entry(parent_id).or_default().push(resource.id);
        }
        self.paths
            .insert((resource.owner_id, resource.path.clone()), resource.id);
        self.nodes.insert(resource.id, resource);
    }

    /// The ancestor chain of `id`, nearest first, including `id` itself and
    /// ending at the root.
    ///
    /// Fails with `CycleDetected` when a resource repeats or the chain is
    /// longer than `max_depth`.
    pub fn ancestors(&self, id: ResourceId, max_depth: usize) -> AppResult<Vec<&Resource>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(id);

        while let Some(cursor) = current {
            if !visited.insert(cursor) {
                return Err(AppError::cycle_detected(format!(
                    "Ancestor chain of {id} revisits {cursor}"
                )));
            }
            if chain.len() >= max_depth {
                return Err(AppError::cycle_detected(format!(
                    "Ancestor chain of {id} exceeds {max_depth} levels"
                )));
            }
            let node = self.nodes.get(&cursor).ok_or_else(|| {
                if chain.is_empty() {
                    AppError::not_found("Resource not found")
                } else {
                    AppError::internal(format!("Resource {cursor} is referenced but missing"))
                }
            })?;
            chain.push(node);
            current = node.parent_id;
        }

        Ok(chain)
    }

    /// Ids of `id` and all its descendants, breadth-first, `id` first.
    pub fn subtree(&self, id: ResourceId) -> Vec<ResourceId> {
        if !self.nodes.contains_key(&id) {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([id]);
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            if let Some(kids) = self.children.get(&next) {
                queue.extend(kids.iter().copied());
            }
        }
        out
    }

    /// Remove `id` and every descendant, returning the removed rows.
    pub fn remove_subtree(&mut self, id: ResourceId) -> Vec<Resource> {
        let ids = self.subtree(id);
        if let Some(parent_id) = self.nodes.get(&id).and_then(|r| r.parent_id) {
            if let Some(siblings) = self.children.get_mut(&parent_id) {
                siblings.retain(|s| *s != id);
            }
        }

        let mut removed = Vec::with_capacity(ids.len());
        for rid in ids {
            self.children.remove(&rid);
            if let Some(node) = self.nodes.remove(&rid) {
                self.paths.remove(&(node.owner_id, node.path.clone()));
                removed.push(node);
            }
        }
        removed
    }

    /// Rename a resource and rewrite the canonical path of its subtree.
    pub fn rename(&mut self, id: ResourceId, new_name: &str) -> AppResult<Resource> {
        let node = self
            .nodes
            .get(&id)
            .ok_or_else(|| AppError::not_found("Resource not found"))?;
        let parent_id = node
            .parent_id
            .ok_or_else(|| AppError::validation("The root folder cannot be renamed"))?;
        let parent = self
            .nodes
            .get(&parent_id)
            .ok_or_else(|| AppError::internal(format!("Parent {parent_id} is missing")))?;

        let owner_id = node.owner_id;
        let old_path = node.path.clone();
        let new_path = join_path(&parent.path, new_name);
        if new_path == old_path {
            return Ok(node.clone());
        }
        if self.paths.contains_key(&(owner_id, new_path.clone())) {
            return Err(AppError::conflict(format!(
                "Resource path '{new_path}' already exists"
            )));
        }

        let now = Utc::now();
        for rid in self.subtree(id) {
            if let Some(entry) = self.nodes.get_mut(&rid) {
                self.paths.remove(&(owner_id, entry.path.clone()));
                entry.path = format!("{new_path}{}", &entry.path[old_path.len()..]);
                if rid == id {
                    entry.name = new_name.to_string();
                    entry.updated_at = now;
                }
                self.paths.insert((owner_id, entry.path.clone()), rid);
            }
        }

        self.nodes
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::internal("Renamed resource vanished"))
    }
}
