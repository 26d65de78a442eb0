#![no_main]

use ferry_source::{is_commit_sha, LatestAlias, VersionSpec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let token = String::from_utf8_lossy(data);
    let Ok(spec) = VersionSpec::classify(&token, LatestAlias::Commit) else {
        return;
    };
    match spec {
        VersionSpec::SemVer(tag) => assert!(tag.starts_with('v')),
        VersionSpec::CommitSha(sha) => assert!(is_commit_sha(&sha)),
        VersionSpec::LatestRelease | VersionSpec::LatestCommit => {}
    }
});
