//! Mapping between `(owner, path)` strings and the materialized folder tree.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use docvault_core::config::PathConfig;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::{ResourceId, UserId};
use docvault_database::{DeleteSummary, Store};
use docvault_entity::resource::{CreateResource, Resource, ResourceType};

use super::naming::candidates;
use super::normalize::{VirtualPath, validate_segment};

/// Find-or-create attempts before a persistent conflict is surfaced.
const MAX_FIND_OR_CREATE_ATTEMPTS: u32 = 3;

/// Immediate children of a folder, grouped by kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    /// The listed folder.
    pub folder: Resource,
    /// Child folders, by name.
    pub subfolders: Vec<Resource>,
    /// Child files, by name.
    pub files: Vec<Resource>,
}

/// Resolves and materializes virtual paths.
#[derive(Debug, Clone)]
pub struct PathResolver {
    store: Arc<dyn Store>,
    config: PathConfig,
}

impl PathResolver {
    /// Creates a new path resolver.
    pub fn new(store: Arc<dyn Store>, config: PathConfig) -> Self {
        Self { store, config }
    }

    /// The path limits in force.
    pub fn config(&self) -> &PathConfig {
        &self.config
    }

    /// Parse a raw path with the configured limits.
    pub fn parse(&self, raw: &str) -> AppResult<VirtualPath> {
        VirtualPath::parse(raw, &self.config)
    }

    /// Resolve a path to a resource id. Absence, including a malformed path,
    /// is `Ok(None)`.
    pub async fn resolve(&self, owner_id: UserId, raw: &str) -> AppResult<Option<ResourceId>> {
        Ok(self.resolve_resource(owner_id, raw).await?.map(|r| r.id))
    }

    /// Resolve a path to the stored resource.
    pub async fn resolve_resource(
        &self,
        owner_id: UserId,
        raw: &str,
    ) -> AppResult<Option<Resource>> {
        let Ok(path) = self.parse(raw) else {
            return Ok(None);
        };
        self.store.find_by_path(owner_id, &path.canonical()).await
    }

    /// The deepest existing resource on `path`, the path itself included.
    pub async fn nearest_existing(
        &self,
        owner_id: UserId,
        path: &VirtualPath,
    ) -> AppResult<Option<Resource>> {
        let mut cursor = Some(path.clone());
        while let Some(candidate) = cursor {
            if let Some(found) = self.store.find_by_path(owner_id, &candidate.canonical()).await? {
                return Ok(Some(found));
            }
            cursor = candidate.parent();
        }
        Ok(None)
    }

    /// The owner's root folder, created on first use.
    pub async fn ensure_root(&self, owner_id: UserId) -> AppResult<Resource> {
        for _ in 0..MAX_FIND_OR_CREATE_ATTEMPTS {
            if let Some(root) = self.store.find_by_path(owner_id, "/").await? {
                return Ok(root);
            }
            match self.store.create_resource(CreateResource::root(owner_id)).await {
                Ok(root) => {
                    info!(owner_id = %owner_id, resource_id = %root.id, "Root folder created");
                    return Ok(root);
                }
                Err(e) if e.is_conflict() => {
                    debug!(owner_id = %owner_id, "Root created concurrently, re-reading");
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::conflict("Root folder could not be created"))
    }

    /// Create every missing folder along `path` and return the resource at
    /// its end. Folders deduplicate; for `ResourceType::File` the last
    /// segment is placed as a file with rename-on-conflict.
    pub async fn materialize(
        &self,
        owner_id: UserId,
        raw: &str,
        resource_type: ResourceType,
    ) -> AppResult<Resource> {
        let path = self.parse(raw)?;
        match resource_type {
            ResourceType::Folder => self.materialize_folders(owner_id, &path).await,
            ResourceType::File => {
                let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
                    return Err(AppError::invalid_path("A file path needs a name"));
                };
                let folder = self.materialize_folders(owner_id, &parent).await?;
                self.place_file(&folder, name, None, None).await
            }
        }
    }

    /// Find-or-create each folder along a parsed path.
    pub async fn materialize_folders(
        &self,
        owner_id: UserId,
        path: &VirtualPath,
    ) -> AppResult<Resource> {
        let mut current = self.ensure_root(owner_id).await?;
        for segment in path.segments() {
            current = self.find_or_create_folder(&current, segment).await?;
        }
        Ok(current)
    }

    async fn find_or_create_folder(&self, parent: &Resource, name: &str) -> AppResult<Resource> {
        for _ in 0..MAX_FIND_OR_CREATE_ATTEMPTS {
            if let Some(existing) = self.store.find_child(parent.id, name).await? {
                if existing.is_folder() {
                    return Ok(existing);
                }
                return Err(AppError::conflict(format!(
                    "A file named '{name}' already exists in '{}'",
                    parent.path
                )));
            }
            match self
                .store
                .create_resource(CreateResource::folder(parent, name))
                .await
            {
                Ok(folder) => {
                    info!(
                        owner_id = %folder.owner_id,
                        resource_id = %folder.id,
                        path = %folder.path,
                        "Folder created"
                    );
                    return Ok(folder);
                }
                Err(e) if e.is_conflict() => {
                    debug!(parent_id = %parent.id, name, "Folder created concurrently, re-reading");
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::conflict(format!(
            "Folder '{name}' kept conflicting under '{}'",
            parent.path
        )))
    }

    /// Store a file under `folder`, suffixing the name until it is free.
    pub async fn place_file(
        &self,
        folder: &Resource,
        name: &str,
        mime_type: Option<String>,
        size_bytes: Option<i64>,
    ) -> AppResult<Resource> {
        if !folder.is_folder() {
            return Err(AppError::validation("Files can only be placed in folders"));
        }
        validate_segment(name, &self.config)?;

        for candidate in candidates(name, &self.config) {
            if self.store.find_child(folder.id, &candidate).await?.is_some() {
                continue;
            }
            let input = CreateResource::file(folder, &candidate, mime_type.clone(), size_bytes);
            match self.store.create_resource(input).await {
                Ok(file) => {
                    if candidate != name {
                        debug!(requested = name, stored = %file.name, "File renamed on conflict");
                    }
                    info!(
                        owner_id = %file.owner_id,
                        resource_id = %file.id,
                        path = %file.path,
                        "File stored"
                    );
                    return Ok(file);
                }
                Err(e) if e.is_conflict() => continue,
                Err(e) => return Err(e),
            }
        }

        warn!(folder_id = %folder.id, name, "No free name for file");
        Err(AppError::conflict(format!(
            "No free name for '{name}' in '{}'",
            folder.path
        )))
    }

    /// List a folder's immediate children.
    pub async fn list(&self, owner_id: UserId, folder_id: ResourceId) -> AppResult<Listing> {
        let folder = self
            .store
            .find_resource(folder_id)
            .await?
            .filter(|f| f.owner_id == owner_id)
            .ok_or_else(|| AppError::not_found("Folder not found"))?;
        self.list_folder(folder).await
    }

    /// List the immediate children of an already loaded folder.
    pub async fn list_folder(&self, folder: Resource) -> AppResult<Listing> {
        if !folder.is_folder() {
            return Err(AppError::validation(format!("'{}' is not a folder", folder.path)));
        }
        let (subfolders, files) = self
            .store
            .list_children(folder.id)
            .await?
            .into_iter()
            .partition(Resource::is_folder);
        Ok(Listing {
            folder,
            subfolders,
            files,
        })
    }

    /// Rename a resource in place. Sibling clashes fail with `Conflict`.
    pub async fn rename(&self, resource_id: ResourceId, new_name: &str) -> AppResult<Resource> {
        validate_segment(new_name, &self.config)?;
        let renamed = self.store.rename_resource(resource_id, new_name).await?;
        info!(resource_id = %resource_id, path = %renamed.path, "Resource renamed");
        Ok(renamed)
    }

    /// Delete a resource and everything beneath it.
    pub async fn delete(&self, resource_id: ResourceId) -> AppResult<DeleteSummary> {
        let resource = self
            .store
            .find_resource(resource_id)
            .await?
            .ok_or_else(|| AppError::not_found("Resource not found"))?;
        if resource.is_root() {
            return Err(AppError::validation("The root folder cannot be deleted"));
        }
        let summary = self.store.delete_subtree(resource_id).await?;
        info!(
            resource_id = %resource_id,
            resources = summary.resources,
            grants = summary.grants,
            share_tokens = summary.share_tokens,
            "Resource deleted"
        );
        Ok(summary)
    }
}
