//! # Workspace Layout and Manifest Loading
//!
//! A workspace is a directory tree holding every repository of the fleet at
//! its manifest `path`, with the manifest repository at a fixed
//! subdirectory (default `manifest`). This module locates repositories,
//! loads the dependency/content manifest pair from disk or from arbitrary
//! revisions of the manifest repository, and writes the pair back.

use std::fs;
use std::path::{Path, PathBuf};

use crate::content::ContentSnapshot;
use crate::error::{Error, Result};
use crate::git::GitRepo;
use crate::manifest::{ManifestSnapshot, RepositoryDescriptor, MANIFEST_REPO};

/// File name of the dependency manifest inside the manifest repository.
pub const DEPENDENCY_MANIFEST: &str = "fleet.yml";
/// File name of the content manifest inside the manifest repository.
pub const CONTENT_MANIFEST: &str = "content.yml";

/// The on-disk fleet workspace.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    manifest_dir: PathBuf,
}

impl Workspace {
    /// Open a workspace rooted at `root` with the manifest repository at
    /// `manifest_dir` (relative to the root).
    pub fn open(root: impl Into<PathBuf>, manifest_dir: &str) -> Result<Self> {
        let root = root.into();
        let manifest_dir = root.join(manifest_dir);
        if !manifest_dir.join(DEPENDENCY_MANIFEST).exists() {
            return Err(Error::Workspace {
                message: format!(
                    "no {} found in {} - not a fleet workspace?",
                    DEPENDENCY_MANIFEST,
                    manifest_dir.display()
                ),
            });
        }
        Ok(Workspace { root, manifest_dir })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The manifest repository's working copy.
    pub fn manifest_repo(&self) -> GitRepo {
        GitRepo::new(MANIFEST_REPO, self.manifest_dir.clone())
    }

    /// The working copy for one descriptor.
    pub fn repo_for(&self, descriptor: &RepositoryDescriptor) -> GitRepo {
        GitRepo::new(
            descriptor.name.clone(),
            self.root.join(descriptor.checkout_path()),
        )
    }

    pub fn dependency_manifest_path(&self) -> PathBuf {
        self.manifest_dir.join(DEPENDENCY_MANIFEST)
    }

    pub fn content_manifest_path(&self) -> PathBuf {
        self.manifest_dir.join(CONTENT_MANIFEST)
    }

    /// Load the manifest pair from the checked-out manifest repository.
    pub fn load_pair(&self) -> Result<(ManifestSnapshot, ContentSnapshot)> {
        let manifest_text = fs::read_to_string(self.dependency_manifest_path())?;
        let content_text = fs::read_to_string(self.content_manifest_path())?;
        Ok((
            ManifestSnapshot::from_yaml(&manifest_text)?,
            ContentSnapshot::from_yaml(&content_text)?,
        ))
    }

    /// Load the manifest pair as of an arbitrary revision of the manifest
    /// repository, without checking it out.
    pub fn load_pair_at(&self, revision: &str) -> Result<(ManifestSnapshot, ContentSnapshot)> {
        let repo = self.manifest_repo();
        let manifest_bytes = repo.read_file_at(DEPENDENCY_MANIFEST, revision)?;
        let content_bytes = repo.read_file_at(CONTENT_MANIFEST, revision)?;
        let manifest_text = String::from_utf8_lossy(&manifest_bytes);
        let content_text = String::from_utf8_lossy(&content_bytes);
        Ok((
            ManifestSnapshot::from_yaml(&manifest_text)?,
            ContentSnapshot::from_yaml(&content_text)?,
        ))
    }

    /// Load a manifest pair from a plain directory (a proposed update, not
    /// yet under version control).
    pub fn load_pair_from_dir(dir: &Path) -> Result<(ManifestSnapshot, ContentSnapshot)> {
        let manifest_text = fs::read_to_string(dir.join(DEPENDENCY_MANIFEST))?;
        let content_text = fs::read_to_string(dir.join(CONTENT_MANIFEST))?;
        Ok((
            ManifestSnapshot::from_yaml(&manifest_text)?,
            ContentSnapshot::from_yaml(&content_text)?,
        ))
    }

    /// Write both documents into the checked-out manifest repository.
    pub fn write_pair(
        &self,
        manifest: &ManifestSnapshot,
        content: &ContentSnapshot,
    ) -> Result<()> {
        fs::write(self.dependency_manifest_path(), manifest.to_yaml()?)?;
        fs::write(self.content_manifest_path(), content.to_yaml()?)?;
        Ok(())
    }

    /// Write only the dependency manifest.
    pub fn write_dependency_manifest(&self, manifest: &ManifestSnapshot) -> Result<()> {
        fs::write(self.dependency_manifest_path(), manifest.to_yaml()?)?;
        Ok(())
    }

    /// Write raw dependency-manifest bytes (used to restore a pre-tag
    /// document byte-for-byte).
    pub fn write_dependency_manifest_raw(&self, bytes: &[u8]) -> Result<()> {
        fs::write(self.dependency_manifest_path(), bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentClass, MergePolicy};
    use tempfile::TempDir;

    fn write_fixture(dir: &Path) {
        fs::create_dir_all(dir.join("manifest")).unwrap();
        fs::write(
            dir.join("manifest").join(DEPENDENCY_MANIFEST),
            "repositories:\n- name: app-core\n  url: https://git.example.com/app.git\n  revision: main\n",
        )
        .unwrap();
        fs::write(
            dir.join("manifest").join(CONTENT_MANIFEST),
            "self:\n  merge-policy: DATA\nrepositories:\n- name: app-core\n  content: SOURCE\n",
        )
        .unwrap();
    }

    #[test]
    fn test_open_requires_manifest_file() {
        let tmp = TempDir::new().unwrap();
        assert!(Workspace::open(tmp.path(), "manifest").is_err());

        write_fixture(tmp.path());
        assert!(Workspace::open(tmp.path(), "manifest").is_ok());
    }

    #[test]
    fn test_load_pair_from_disk() {
        let tmp = TempDir::new().unwrap();
        write_fixture(tmp.path());
        let ws = Workspace::open(tmp.path(), "manifest").unwrap();

        let (manifest, content) = ws.load_pair().unwrap();
        assert_eq!(manifest.repositories.len(), 1);
        assert_eq!(content.class_of("app-core"), Some(ContentClass::Source));
        assert_eq!(content.policy(), MergePolicy::Data);
    }

    #[test]
    fn test_write_pair_round_trips() {
        let tmp = TempDir::new().unwrap();
        write_fixture(tmp.path());
        let ws = Workspace::open(tmp.path(), "manifest").unwrap();

        let (mut manifest, content) = ws.load_pair().unwrap();
        manifest.lookup_mut("app-core").unwrap().revision = "proj__1.0_dev".to_string();
        ws.write_pair(&manifest, &content).unwrap();

        let (reloaded, _) = ws.load_pair().unwrap();
        assert_eq!(reloaded.lookup("app-core").unwrap().revision, "proj__1.0_dev");
    }

    #[test]
    fn test_repo_for_uses_checkout_path() {
        let tmp = TempDir::new().unwrap();
        write_fixture(tmp.path());
        let ws = Workspace::open(tmp.path(), "manifest").unwrap();

        let descriptor = RepositoryDescriptor {
            name: "app-core".to_string(),
            url: "https://git.example.com/app.git".to_string(),
            path: Some("apps/core".to_string()),
            revision: "main".to_string(),
            clone_depth: None,
            groups: vec![],
            commands: None,
        };
        let repo = ws.repo_for(&descriptor);
        assert_eq!(repo.dir(), tmp.path().join("apps/core"));
    }
}
