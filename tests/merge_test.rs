//! Integration tests for the merge operation: one strategy per repository,
//! selected by destination class and the two fleets' merge policies.

mod common;

use common::{commit_file, git, FleetFixture};
use repo_fleet::error::Error;
use repo_fleet::lifecycle::{fork_project, merge_branches, MergeOptions, ProjectType};
use repo_fleet::report::Reporter;

#[test]
fn data_repo_gets_regular_merge_and_manifest_stays_untouched() {
    let fixture = FleetFixture::new();
    let ws = fixture.workspace();

    let mut reporter = Reporter::new(false);
    let triple = fork_project(
        &ws,
        "main",
        "proj1",
        "1.0",
        ProjectType::SourceData,
        "fork",
        &mut reporter,
    )
    .expect("fork");

    // advance the dev branch of the data repository
    let data_dir = fixture.workspace_repo("app-data");
    git(&data_dir, &["checkout", &triple.dev]);
    commit_file(&data_dir, "recipe.txt", "dev content\n", "dev data change");
    git(&data_dir, &["push"]);

    let mut reporter = Reporter::new(false);
    merge_branches(
        &ws,
        &triple.dev,
        &triple.integ,
        &MergeOptions::default(),
        &mut reporter,
    )
    .expect("merge dev into integ");

    // the dev commit arrived on integ through a real merge
    let merged = git(
        &data_dir,
        &["show", &format!("{}:recipe.txt", triple.integ)],
    );
    assert_eq!(merged, "dev content\n");

    // scenario 3: a regular merge never rewrites the manifest revision
    let (integ_manifest, _) = ws.load_pair_at(&triple.integ).unwrap();
    assert_eq!(
        integ_manifest.lookup("app-data").unwrap().revision,
        triple.integ
    );
    assert_eq!(
        integ_manifest.lookup("app-src").unwrap().revision,
        triple.integ,
        "source repo also tracks its branch under SOURCE_DATA"
    );
}

#[test]
fn source_repo_is_sha_pinned_into_a_data_project() {
    let fixture = FleetFixture::new();
    let ws = fixture.workspace();

    // origin: a source+data project; destination: a data-only project
    let mut reporter = Reporter::new(false);
    let origin_triple = fork_project(
        &ws,
        "main",
        "proj1",
        "1.0",
        ProjectType::SourceData,
        "fork",
        &mut reporter,
    )
    .expect("fork origin project");

    let mut reporter = Reporter::new(false);
    let dest_triple = fork_project(
        &ws,
        "main",
        "proj2",
        "1.0",
        ProjectType::Data,
        "fork",
        &mut reporter,
    )
    .expect("fork destination project");

    // advance app-src on the origin project's main branch
    let src_dir = fixture.workspace_repo("app-src");
    git(&src_dir, &["checkout", &origin_triple.main]);
    let new_sha = commit_file(&src_dir, "feature.c", "int x;\n", "origin source change");
    git(&src_dir, &["push"]);

    let mut reporter = Reporter::new(false);
    merge_branches(
        &ws,
        &origin_triple.main,
        &dest_triple.dev,
        &MergeOptions::default(),
        &mut reporter,
    )
    .expect("merge origin main into destination dev");

    // destination policy DATA + origin policy SOURCE_DATA => sha-pin
    let (dest_manifest, _) = ws.load_pair_at(&dest_triple.dev).unwrap();
    assert_eq!(dest_manifest.lookup("app-src").unwrap().revision, new_sha);
    // the data repository still tracks its own branch
    assert_eq!(
        dest_manifest.lookup("app-data").unwrap().revision,
        dest_triple.dev
    );
}

#[test]
fn merge_into_itself_is_fatal() {
    let fixture = FleetFixture::new();
    let ws = fixture.workspace();
    let mut reporter = Reporter::new(false);

    let err = merge_branches(
        &ws,
        "proj1__1.0_dev",
        "proj1__1.0_dev",
        &MergeOptions::default(),
        &mut reporter,
    )
    .expect_err("same-branch merge must be refused");
    assert!(matches!(err, Error::SameBranch { .. }), "got {}", err);
}

#[test]
fn dry_run_merge_leaves_branches_alone() {
    let fixture = FleetFixture::new();
    let ws = fixture.workspace();

    let mut reporter = Reporter::new(false);
    let triple = fork_project(
        &ws,
        "main",
        "proj1",
        "1.0",
        ProjectType::SourceData,
        "fork",
        &mut reporter,
    )
    .expect("fork");

    let data_dir = fixture.workspace_repo("app-data");
    git(&data_dir, &["checkout", &triple.dev]);
    commit_file(&data_dir, "recipe.txt", "dev content\n", "dev data change");
    git(&data_dir, &["push"]);

    let mut reporter = Reporter::new(true);
    merge_branches(
        &ws,
        &triple.dev,
        &triple.integ,
        &MergeOptions::default(),
        &mut reporter,
    )
    .expect("dry-run merge");

    // integ never received the dev commit
    let listing = git(
        &data_dir,
        &["ls-tree", "--name-only", &format!("origin/{}", triple.integ)],
    );
    assert!(
        !listing.lines().any(|l| l.trim() == "recipe.txt"),
        "dry run must not merge: {}",
        listing
    );
}
