use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::adapters::git::GitTransport;
use crate::adapters::ownership::OwnershipSetter;
use crate::adapters::user_profiles::UserProfileRegistry;
use crate::config::GitPopulationConfig;
use crate::runtime::contract::{HandlerOutcome, LifecycleEvent};
use crate::runtime::error::ProvisioningError;
use crate::runtime::home_layout::{
    home_directory, repository_directory_name, user_physical_id, StorageIdentity,
};
use crate::runtime::lifecycle::LifecycleHandler;

pub const GIT_REPOSITORY_PROPERTY: &str = "GitRepository";
pub const STUDIO_USER_NAME_PROPERTY: &str = "StudioUserName";
pub const DOMAIN_ID_PROPERTY: &str = "DomainID";

/// Seeds a Studio user's home directory with a fresh clone of a repository
/// when the user resource is created.
///
/// Only the user-profile lookup can fail the resource. Anything that goes
/// wrong while touching the file system or cloning is logged and dropped so
/// the surrounding stack keeps provisioning.
pub struct PopulateGitHandler<'a> {
    pub config: &'a GitPopulationConfig,
    pub user_profiles: &'a dyn UserProfileRegistry,
    pub git: &'a dyn GitTransport,
    pub ownership: &'a dyn OwnershipSetter,
}

impl PopulateGitHandler<'_> {
    fn resolve_identity(
        &self,
        domain_id: &str,
        user_profile_name: &str,
    ) -> Result<StorageIdentity, ProvisioningError> {
        let lookup_failed = |message: String| ProvisioningError::UserProfileLookupFailed {
            domain_id: domain_id.to_string(),
            user_profile_name: user_profile_name.to_string(),
            message,
        };

        let raw = self
            .user_profiles
            .home_storage_identity(domain_id, user_profile_name)
            .map_err(lookup_failed)?;
        StorageIdentity::parse(&raw).map_err(lookup_failed)
    }

    fn seed_home(&self, git_repository: &str, identity: StorageIdentity) -> Result<PathBuf, String> {
        let home = home_directory(&self.config.mount_root, identity);
        ensure_directory(&home)?;

        let folder_name = repository_directory_name(git_repository).ok_or_else(|| {
            format!("cannot derive a target folder name from repository '{git_repository}'")
        })?;
        let target = home.join(folder_name);

        if let Ok(metadata) = fs::symlink_metadata(&target) {
            info!(
                event = "stale_clone_removed",
                path = %target.display()
            );
            if let Err(error) = remove_stale_entry(&target, &metadata) {
                warn!(
                    event = "stale_clone_removal_failed",
                    path = %target.display(),
                    error = %error
                );
            }
        }

        info!(
            event = "clone_started",
            repository = git_repository,
            path = %target.display()
        );
        self.git.clone_repository(git_repository, &target)?;
        self.ownership.chown_recursive(&target, identity.uid())?;

        Ok(target)
    }
}

impl LifecycleHandler for PopulateGitHandler<'_> {
    fn on_create(&self, event: &LifecycleEvent) -> Result<HandlerOutcome, ProvisioningError> {
        let git_repository = event.required_property(GIT_REPOSITORY_PROPERTY)?;
        let user_profile_name = event.required_property(STUDIO_USER_NAME_PROPERTY)?;
        let domain_id = event.required_property(DOMAIN_ID_PROPERTY)?;

        let identity = self.resolve_identity(domain_id, user_profile_name)?;
        info!(
            event = "user_profile_resolved",
            domain_id = domain_id,
            user_profile_name = user_profile_name,
            uid = identity.uid()
        );

        match self.seed_home(git_repository, identity) {
            Ok(target) => info!(
                event = "home_seeded",
                user_profile_name = user_profile_name,
                uid = identity.uid(),
                path = %target.display()
            ),
            Err(message) => error!(
                event = "home_seed_failed",
                user_profile_name = user_profile_name,
                uid = identity.uid(),
                repository = git_repository,
                error = %message
            ),
        }

        Ok(HandlerOutcome::with_physical_id(user_physical_id(identity)))
    }

    fn on_update(&self, event: &LifecycleEvent) -> Result<HandlerOutcome, ProvisioningError> {
        info!(
            event = "update_ignored",
            physical_resource_id = event.physical_resource_id.as_deref().unwrap_or_default(),
            user_profile_name = event.optional_property(STUDIO_USER_NAME_PROPERTY).unwrap_or_default(),
            domain_id = event.optional_property(DOMAIN_ID_PROPERTY).unwrap_or_default()
        );
        Ok(HandlerOutcome::unchanged())
    }

    fn on_delete(&self, event: &LifecycleEvent) -> Result<HandlerOutcome, ProvisioningError> {
        info!(
            event = "delete_ignored",
            physical_resource_id = event.physical_resource_id.as_deref().unwrap_or_default(),
            user_profile_name = event.optional_property(STUDIO_USER_NAME_PROPERTY).unwrap_or_default(),
            domain_id = event.optional_property(DOMAIN_ID_PROPERTY).unwrap_or_default()
        );
        Ok(HandlerOutcome::unchanged())
    }
}

// Home folders only appear once a user first opens Studio, so the seeding
// run may be the one that creates it.
fn ensure_directory(path: &Path) -> Result<(), String> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(error) => Err(format!(
            "failed to create home directory '{}': {error}",
            path.display()
        )),
    }
}

// Links and stray files at the target are removed without following them.
fn remove_stale_entry(target: &Path, metadata: &fs::Metadata) -> std::io::Result<()> {
    if metadata.is_dir() {
        fs::remove_dir_all(target)
    } else {
        fs::remove_file(target)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use serde_json::json;

    use crate::adapters::ownership::collect_tree;
    use crate::runtime::contract::ResourceProperties;
    use crate::runtime::lifecycle::dispatch;

    use super::*;

    struct FixedProfiles {
        uid: Result<String, String>,
        lookups: Mutex<Vec<(String, String)>>,
    }

    impl FixedProfiles {
        fn new(uid: Result<&str, &str>) -> Self {
            Self {
                uid: uid.map(str::to_string).map_err(str::to_string),
                lookups: Mutex::new(Vec::new()),
            }
        }
    }

    impl UserProfileRegistry for FixedProfiles {
        fn home_storage_identity(
            &self,
            domain_id: &str,
            user_profile_name: &str,
        ) -> Result<String, String> {
            self.lookups
                .lock()
                .expect("poisoned mutex")
                .push((domain_id.to_string(), user_profile_name.to_string()));
            self.uid.clone()
        }
    }

    /// Writes a small fixed tree in place of a network clone.
    struct FakeGit {
        fail_with: Option<&'static str>,
        clones: Mutex<Vec<(String, PathBuf)>>,
    }

    impl FakeGit {
        fn new() -> Self {
            Self {
                fail_with: None,
                clones: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &'static str) -> Self {
            Self {
                fail_with: Some(message),
                clones: Mutex::new(Vec::new()),
            }
        }

        fn clones(&self) -> Vec<(String, PathBuf)> {
            self.clones.lock().expect("poisoned mutex").clone()
        }
    }

    impl GitTransport for FakeGit {
        fn clone_repository(&self, url: &str, destination: &Path) -> Result<(), String> {
            self.clones
                .lock()
                .expect("poisoned mutex")
                .push((url.to_string(), destination.to_path_buf()));
            if let Some(message) = self.fail_with {
                return Err(message.to_string());
            }
            if fs::symlink_metadata(destination).is_ok() {
                return Err(format!(
                    "destination path '{}' already exists",
                    destination.display()
                ));
            }
            fs::create_dir_all(destination.join("notebooks")).map_err(|e| e.to_string())?;
            fs::write(destination.join("README.md"), b"# demo").map_err(|e| e.to_string())?;
            fs::write(destination.join("notebooks/intro.ipynb"), b"{}")
                .map_err(|e| e.to_string())?;
            Ok(())
        }
    }

    /// Records the owner each path would receive.
    struct RecordingOwnership {
        owners: Mutex<BTreeMap<PathBuf, u32>>,
    }

    impl RecordingOwnership {
        fn new() -> Self {
            Self {
                owners: Mutex::new(BTreeMap::new()),
            }
        }

        fn owners(&self) -> BTreeMap<PathBuf, u32> {
            self.owners.lock().expect("poisoned mutex").clone()
        }
    }

    impl OwnershipSetter for RecordingOwnership {
        fn chown_recursive(&self, root: &Path, uid: u32) -> Result<(), String> {
            let mut owners = self.owners.lock().expect("poisoned mutex");
            for path in collect_tree(root)? {
                owners.insert(path, uid);
            }
            Ok(())
        }
    }

    fn config_for(mount_root: &Path) -> GitPopulationConfig {
        GitPopulationConfig {
            mount_root: mount_root.to_path_buf(),
            ..GitPopulationConfig::default()
        }
    }

    fn create_event(repository: &str) -> LifecycleEvent {
        let mut properties = ResourceProperties::new();
        properties.insert(GIT_REPOSITORY_PROPERTY.to_string(), json!(repository));
        properties.insert(STUDIO_USER_NAME_PROPERTY.to_string(), json!("alice"));
        properties.insert(DOMAIN_ID_PROPERTY.to_string(), json!("d-123"));
        let mut event = LifecycleEvent::new("Create", properties);
        event.request_id = Some("req-1".to_string());
        event
    }

    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        let mut entries = BTreeMap::new();
        for path in collect_tree(root).expect("tree should be listed") {
            let body = if path.is_file() {
                fs::read(&path).expect("file should be readable")
            } else {
                Vec::new()
            };
            entries.insert(path, body);
        }
        entries
    }

    #[test]
    fn create_clones_into_user_home_and_hands_ownership_to_user() {
        let mount = tempfile::tempdir().expect("tempdir should be created");
        let config = config_for(mount.path());
        let profiles = FixedProfiles::new(Ok("4242"));
        let git = FakeGit::new();
        let ownership = RecordingOwnership::new();
        let handler = PopulateGitHandler {
            config: &config,
            user_profiles: &profiles,
            git: &git,
            ownership: &ownership,
        };

        let response = dispatch(&create_event("https://example.com/acme/demo.git"), &handler)
            .expect("create should succeed");

        assert_eq!(response.physical_resource_id, "user_4242");
        assert_eq!(response.data, None);
        assert_eq!(
            profiles.lookups.lock().expect("poisoned mutex").clone(),
            vec![("d-123".to_string(), "alice".to_string())]
        );

        let target = mount.path().join("4242").join("demo");
        assert!(target.join("README.md").is_file());
        assert_eq!(
            git.clones(),
            vec![("https://example.com/acme/demo.git".to_string(), target.clone())]
        );

        let owners = ownership.owners();
        assert_eq!(owners.len(), 4);
        assert_eq!(owners.get(&target), Some(&4242));
        assert!(owners.values().all(|uid| *uid == 4242));
        assert!(owners.contains_key(&target.join("notebooks/intro.ipynb")));
    }

    #[test]
    fn create_replaces_stale_clone() {
        let mount = tempfile::tempdir().expect("tempdir should be created");
        let stale = mount.path().join("4242").join("Repo");
        fs::create_dir_all(stale.join("old")).expect("stale tree should be created");
        fs::write(stale.join("old/leftover.txt"), b"stale").expect("stale file should be written");

        let config = config_for(mount.path());
        let profiles = FixedProfiles::new(Ok("4242"));
        let git = FakeGit::new();
        let ownership = RecordingOwnership::new();
        let handler = PopulateGitHandler {
            config: &config,
            user_profiles: &profiles,
            git: &git,
            ownership: &ownership,
        };

        dispatch(&create_event("https://host/org/Repo.GIT"), &handler)
            .expect("create should succeed");

        assert!(!stale.join("old").exists());
        let mut names: Vec<String> = fs::read_dir(&stale)
            .expect("clone should exist")
            .map(|entry| {
                entry
                    .expect("entry should be readable")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        assert_eq!(names, vec!["README.md", "notebooks"]);
    }

    #[test]
    fn create_replaces_dangling_link_at_target() {
        let mount = tempfile::tempdir().expect("tempdir should be created");
        let home = mount.path().join("4242");
        fs::create_dir_all(&home).expect("home should be created");
        let target = home.join("demo");
        std::os::unix::fs::symlink(mount.path().join("gone"), &target)
            .expect("link should be created");

        let config = config_for(mount.path());
        let profiles = FixedProfiles::new(Ok("4242"));
        let git = FakeGit::new();
        let ownership = RecordingOwnership::new();
        let handler = PopulateGitHandler {
            config: &config,
            user_profiles: &profiles,
            git: &git,
            ownership: &ownership,
        };

        dispatch(&create_event("https://example.com/acme/demo.git"), &handler)
            .expect("create should succeed");

        let metadata = fs::symlink_metadata(&target).expect("clone should exist");
        assert!(metadata.is_dir());
        assert!(target.join("README.md").is_file());
        assert!(!mount.path().join("gone").exists());
        assert_eq!(ownership.owners().get(&target), Some(&4242));
    }

    #[test]
    fn create_reports_success_when_clone_fails() {
        let mount = tempfile::tempdir().expect("tempdir should be created");
        let config = config_for(mount.path());
        let profiles = FixedProfiles::new(Ok("1001"));
        let git = FakeGit::failing("could not resolve host: example.com");
        let ownership = RecordingOwnership::new();
        let handler = PopulateGitHandler {
            config: &config,
            user_profiles: &profiles,
            git: &git,
            ownership: &ownership,
        };

        let response = dispatch(&create_event("https://example.com/acme/demo.git"), &handler)
            .expect("clone failure must not fail the resource");

        assert_eq!(response.physical_resource_id, "user_1001");
        assert!(mount.path().join("1001").is_dir());
        assert!(ownership.owners().is_empty());
    }

    #[test]
    fn create_reports_success_when_folder_name_cannot_be_derived() {
        let mount = tempfile::tempdir().expect("tempdir should be created");
        let config = config_for(mount.path());
        let profiles = FixedProfiles::new(Ok("1001"));
        let git = FakeGit::new();
        let ownership = RecordingOwnership::new();
        let handler = PopulateGitHandler {
            config: &config,
            user_profiles: &profiles,
            git: &git,
            ownership: &ownership,
        };

        let response = dispatch(&create_event("https://example.com/acme/.git"), &handler)
            .expect("bad repository url must not fail the resource");

        assert_eq!(response.physical_resource_id, "user_1001");
        assert!(git.clones().is_empty());
    }

    #[test]
    fn create_reports_success_when_home_cannot_be_created() {
        let mount = tempfile::tempdir().expect("tempdir should be created");
        let config = config_for(&mount.path().join("unmounted"));
        let profiles = FixedProfiles::new(Ok("1001"));
        let git = FakeGit::new();
        let ownership = RecordingOwnership::new();
        let handler = PopulateGitHandler {
            config: &config,
            user_profiles: &profiles,
            git: &git,
            ownership: &ownership,
        };

        let response = dispatch(&create_event("https://example.com/acme/demo.git"), &handler)
            .expect("missing mount must not fail the resource");

        assert_eq!(response.physical_resource_id, "user_1001");
        assert!(git.clones().is_empty());
    }

    #[test]
    fn create_fails_when_user_profile_lookup_fails() {
        let mount = tempfile::tempdir().expect("tempdir should be created");
        let config = config_for(mount.path());
        let profiles = FixedProfiles::new(Err("ResourceNotFound: user profile does not exist"));
        let git = FakeGit::new();
        let ownership = RecordingOwnership::new();
        let handler = PopulateGitHandler {
            config: &config,
            user_profiles: &profiles,
            git: &git,
            ownership: &ownership,
        };

        let error = dispatch(&create_event("https://example.com/acme/demo.git"), &handler)
            .expect_err("lookup failure should propagate");

        assert!(matches!(
            error,
            ProvisioningError::UserProfileLookupFailed { .. }
        ));
        assert!(error.to_string().contains("user profile does not exist"));
        assert!(git.clones().is_empty());
        assert_eq!(fs::read_dir(mount.path()).expect("mount readable").count(), 0);
    }

    #[test]
    fn create_fails_when_uid_is_not_numeric() {
        let mount = tempfile::tempdir().expect("tempdir should be created");
        let config = config_for(mount.path());
        let profiles = FixedProfiles::new(Ok("not-a-uid"));
        let git = FakeGit::new();
        let ownership = RecordingOwnership::new();
        let handler = PopulateGitHandler {
            config: &config,
            user_profiles: &profiles,
            git: &git,
            ownership: &ownership,
        };

        let error = dispatch(&create_event("https://example.com/acme/demo.git"), &handler)
            .expect_err("invalid uid should propagate");
        assert!(matches!(
            error,
            ProvisioningError::UserProfileLookupFailed { .. }
        ));
    }

    #[test]
    fn create_requires_all_properties() {
        let mount = tempfile::tempdir().expect("tempdir should be created");
        let config = config_for(mount.path());
        let profiles = FixedProfiles::new(Ok("4242"));
        let git = FakeGit::new();
        let ownership = RecordingOwnership::new();
        let handler = PopulateGitHandler {
            config: &config,
            user_profiles: &profiles,
            git: &git,
            ownership: &ownership,
        };

        let mut event = create_event("https://example.com/acme/demo.git");
        event.resource_properties.remove(DOMAIN_ID_PROPERTY);

        let error = dispatch(&event, &handler).expect_err("missing property should fail");
        assert_eq!(
            error,
            ProvisioningError::MissingProperty(DOMAIN_ID_PROPERTY.to_string())
        );
    }

    #[test]
    fn update_and_delete_leave_file_system_untouched() {
        let mount = tempfile::tempdir().expect("tempdir should be created");
        let config = config_for(mount.path());
        let profiles = FixedProfiles::new(Ok("4242"));
        let git = FakeGit::new();
        let ownership = RecordingOwnership::new();
        let handler = PopulateGitHandler {
            config: &config,
            user_profiles: &profiles,
            git: &git,
            ownership: &ownership,
        };

        dispatch(&create_event("https://example.com/acme/demo.git"), &handler)
            .expect("create should succeed");
        let before = snapshot(mount.path());

        for request_type in ["Update", "Delete"] {
            let mut event = create_event("https://example.com/acme/other.git");
            event.request_type = request_type.to_string();
            event.physical_resource_id = Some("user_4242".to_string());

            let response = dispatch(&event, &handler).expect("no-op should succeed");
            assert_eq!(response.physical_resource_id, "user_4242");
        }

        assert_eq!(snapshot(mount.path()), before);
        assert_eq!(git.clones().len(), 1);
        assert_eq!(profiles.lookups.lock().expect("poisoned mutex").len(), 1);
    }
}
