//! Materialization tests: pages and assets land where the manifest says,
//! and the manifest snapshot round-trips.

use url::Url;

use sitemirror::{
    output::write_mirror, AssetKind, Manifest, ManifestSnapshot, MirrorOutcome, RewrittenPage,
};

fn sample_outcome() -> MirrorOutcome {
    let mut manifest = Manifest::new();
    manifest.register("https://site.example/css/site.css", AssetKind::Css);
    manifest.attach_content("https://site.example/css/site.css", b"body{}".to_vec());
    // Registered but never fetched: must be skipped, not written empty.
    manifest.register("https://site.example/img/broken.png", AssetKind::Image);

    MirrorOutcome {
        pages: vec![RewrittenPage {
            url: Url::parse("https://site.example/").unwrap(),
            file_name: "index.html".to_string(),
            html: "<html><body>mirrored</body></html>".to_string(),
        }],
        manifest,
    }
}

#[tokio::test]
async fn writes_pages_assets_and_manifest() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_mirror(&sample_outcome(), dir.path())
        .await
        .expect("write succeeds");

    let page = dir.path().join("index.html");
    assert!(page.exists());

    let css = dir.path().join("assets/site.example/css/site.css");
    assert_eq!(std::fs::read(&css).unwrap(), b"body{}");

    // Unfetched records produce no file.
    assert!(!dir.path().join("assets/site.example/img/broken.png").exists());

    // Snapshot parses back and reports fetch state; no temp file left over.
    let manifest_json = std::fs::read_to_string(dir.path().join("manifest.json")).unwrap();
    let snapshot: ManifestSnapshot = serde_json::from_str(&manifest_json).unwrap();
    assert_eq!(snapshot.entries.len(), 2);
    assert!(snapshot
        .entries
        .iter()
        .any(|e| e.local_path == "assets/site.example/css/site.css" && e.fetched));
    assert!(snapshot.entries.iter().any(|e| !e.fetched));
    assert!(!dir.path().join("manifest.json.tmp").exists());
}
