//! Integration tests for the fleet snapshot-tag operation.

mod common;

use common::{git, tag_names, FleetFixture};
use repo_fleet::lifecycle::tag_fleet;
use repo_fleet::report::Reporter;

#[test]
fn tag_freezes_fleet_and_restores_branch_tip() {
    let fixture = FleetFixture::new();
    let ws = fixture.workspace();
    let manifest_dir = fixture.workspace_repo("manifest");

    let before = git(&manifest_dir, &["show", "main:fleet.yml"]);

    let mut reporter = Reporter::new(false);
    let tag_name = tag_fleet(&ws, "rc1", Some("first release candidate"), &mut reporter)
        .expect("tag the fleet");

    // derived from the manifest repository's identity: on branch main
    assert_eq!(tag_name, "fleet-tag_br-main__rc1");

    // SOURCE and DATA repositories carry the tag; EXTERNAL does not
    for repo in ["app-src", "app-data", "manifest"] {
        let tags = tag_names(&fixture.remote(repo));
        assert!(
            tags.iter().any(|t| t == &tag_name),
            "{} remote is missing tag {}",
            repo,
            tag_name
        );
    }
    assert!(
        !tag_names(&fixture.remote("external1"))
            .iter()
            .any(|t| t == &tag_name),
        "EXTERNAL repositories are never fleet-tagged"
    );

    // the manifest frozen under the tag pins every tagged repository
    let (tagged_manifest, _) = ws.load_pair_at(&tag_name).expect("read manifests at tag");
    assert_eq!(tagged_manifest.lookup("app-src").unwrap().revision, tag_name);
    assert_eq!(tagged_manifest.lookup("app-data").unwrap().revision, tag_name);
    assert_eq!(
        tagged_manifest.lookup("external1").unwrap().revision,
        "tag_1",
        "external revision is left alone"
    );

    // scenario 4: the branch tip is restored bit-for-bit
    let after = git(&manifest_dir, &["show", "main:fleet.yml"]);
    assert_eq!(before, after);

    // and the remote branch agrees
    let remote_after = git(&fixture.remote("manifest"), &["show", "main:fleet.yml"]);
    assert_eq!(before, remote_after);
}

#[test]
fn dry_run_tag_creates_nothing() {
    let fixture = FleetFixture::new();
    let ws = fixture.workspace();

    let mut reporter = Reporter::new(true);
    let tag_name = tag_fleet(&ws, "rc2", None, &mut reporter).expect("dry-run tag");
    assert_eq!(tag_name, "fleet-tag_br-main__rc2");

    for repo in ["app-src", "app-data", "manifest"] {
        assert!(
            !tag_names(&fixture.remote(repo))
                .iter()
                .any(|t| t == &tag_name),
            "dry run created a tag in {}",
            repo
        );
    }
}
