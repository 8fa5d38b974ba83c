//! Legal notices served to the frontend.

use serde::Serialize;

use crate::error::ServerResult;
use crate::resources::ResourceProvider;

pub const LICENSE_FILE: &str = "LICENSE";
pub const THIRD_PARTY_LICENSES_FILE: &str = "third_party_licenses_distributed.txt";
pub const PRIVACY_POLICY_FILE: &str = "privacy_policy.md";
pub const TERMS_OF_SERVICE_FILE: &str = "terms_of_service.md";
pub const README_FILE: &str = "readme.txt";

/// Every notice text in one payload; the frontend shows them in tabs.
#[derive(Debug, Clone, Serialize)]
pub struct NoticesContainer {
    pub license: String,
    pub third_party_licenses: String,
    pub privacy_policy: String,
    pub terms_of_service: String,
    pub readme: String,
}

impl NoticesContainer {
    pub fn load(resources: &ResourceProvider) -> ServerResult<NoticesContainer> {
        Ok(NoticesContainer {
            license: resources.read_notice(LICENSE_FILE)?,
            third_party_licenses: resources.read_notice(THIRD_PARTY_LICENSES_FILE)?,
            privacy_policy: resources.read_notice(PRIVACY_POLICY_FILE)?,
            terms_of_service: resources.read_notice(TERMS_OF_SERVICE_FILE)?,
            readme: resources.read_notice(README_FILE)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_reads_all_notices() {
        let dir = tempfile::tempdir().unwrap();
        let notices_dir = dir.path().join("notices");
        fs::create_dir(&notices_dir).unwrap();
        for (name, content) in [
            (LICENSE_FILE, "MIT"),
            (THIRD_PARTY_LICENSES_FILE, "3p"),
            (PRIVACY_POLICY_FILE, "privacy"),
            (TERMS_OF_SERVICE_FILE, "terms"),
            (README_FILE, "readme"),
        ] {
            fs::write(notices_dir.join(name), content).unwrap();
        }

        let notices = NoticesContainer::load(&ResourceProvider::new(dir.path())).unwrap();
        assert_eq!(notices.license, "MIT");
        assert_eq!(notices.readme, "readme");
    }

    #[test]
    fn test_load_fails_when_a_notice_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("notices")).unwrap();
        assert!(NoticesContainer::load(&ResourceProvider::new(dir.path())).is_err());
    }
}
