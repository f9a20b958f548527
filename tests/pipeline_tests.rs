//! End-to-end stage tests over a temporary storage directory.
//!
//! Covers both platform flows:
//! - export → extract → normalize → correlate
//! - seeds → resolve → normalize → correlate (join on parent page)

use std::fs;

use linkaudit::error::AppError;
use linkaudit::models::{Config, HttpConfig, JoinKey, RunStats};
use linkaudit::pipeline::{self, Source};
use linkaudit::storage::{ArtifactStore, LocalStorage};
use linkaudit::utils::http::create_client;
use tempfile::TempDir;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers::path};

const EXPORT: &str = "\
title,listId,timePeriod,webAddress,primaryWebAddress,onlineResourceWebAddress
T1,L1,2020,,http://x.test/a,http://x.test/b
T2,L2,2021,http://x.test/a,,
T3,L3,2022,,,
\"T4, quoted\",L4,2023,http://x.test/c?x=1&amp;y=2,,
";

const ORACLE_HEADER: &str = "urlname;parentname;result;warningstring;infostring;valid";

fn config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.paths.storage_dir = dir.path().join("storage");
    config.oracle.columns = ORACLE_HEADER.split(';').map(String::from).collect();
    config.http.request_delay_ms = 0;
    config
}

fn lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

#[tokio::test]
async fn export_flow_produces_fanned_out_report() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let storage = LocalStorage::new(&config.paths.storage_dir);
    let export = dir.path().join("export.csv");
    fs::write(&export, EXPORT).unwrap();

    let mut stats = RunStats::started();
    pipeline::run_extract(&config, &export, &storage, &mut stats)
        .await
        .unwrap();

    assert_eq!(stats.records_read, 4);
    assert_eq!(stats.records_without_link, 1);
    assert_eq!(stats.candidate_pairs, 3);
    assert_eq!(
        storage.read_text("oracle_urls.txt").await.unwrap(),
        "http://x.test/a\nhttp://x.test/c?x=1&y=2\n"
    );
    let html = storage.read_text("oracle_links.html").await.unwrap();
    assert!(html.contains(r#"<a href="http://x.test/c?x=1&amp;y=2">"#));

    let oracle = dir.path().join("oracle.csv");
    fs::write(
        &oracle,
        format!(
            "# LinkChecker CSV output\n{ORACLE_HEADER}\nhttp://x.test/a;;404 Not Found;;;False\n\
             {ORACLE_HEADER}\nhttp://x.test/c?x=1&y=2;;ConnectionError: timed\nout;;;False\n\
             http://x.test/zzz;;500 Internal Server Error;;;False\n\
             http://x.test/ok;;200 OK;;;True\n# Stopped checking\n"
        ),
    )
    .unwrap();

    pipeline::run_report(&config, &oracle, Source::Candidates, &storage, &mut stats)
        .await
        .unwrap();

    let report = storage.read_text("report.csv").await.unwrap();
    assert_eq!(
        lines(&report),
        vec![
            "title,listId,timePeriod,urlname,parentname,result,warningstring,infostring,valid",
            "T1,L1,2020,http://x.test/a,,404 Not Found,,,False",
            "T2,L2,2021,http://x.test/a,,404 Not Found,,,False",
            "\"T4, quoted\",L4,2023,http://x.test/c?x=1&y=2,,ConnectionError: timed out,,,False",
        ]
    );
    assert_eq!(stats.findings_read, 4);
    assert_eq!(stats.duplicate_headers, 1);
    assert_eq!(stats.findings_unreportable, 1);
    assert_eq!(stats.report_rows, 3);

    pipeline::finish_run(&storage, &config.paths, &mut stats, "Report")
        .await
        .unwrap();
    let summary: RunStats =
        serde_json::from_str(&storage.read_text("summary.json").await.unwrap()).unwrap();
    assert_eq!(summary.report_rows, 3);
    assert!(summary.finished_at.is_some());
}

#[tokio::test]
async fn normalized_table_is_stable_when_renormalized() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let storage = LocalStorage::new(&config.paths.storage_dir);
    let oracle = dir.path().join("oracle.csv");
    fs::write(
        &oracle,
        format!("{ORACLE_HEADER}\nhttp://x.test/a;;404\nNot Found;\"w; x\";;False\n"),
    )
    .unwrap();

    let mut stats = RunStats::default();
    pipeline::run_normalize(&config, &oracle, &storage, &mut stats)
        .await
        .unwrap();
    let once = storage.read_text("normalized.csv").await.unwrap();

    let again = dir.path().join("again.csv");
    fs::write(&again, &once).unwrap();
    pipeline::run_normalize(&config, &again, &storage, &mut stats)
        .await
        .unwrap();
    assert_eq!(storage.read_text("normalized.csv").await.unwrap(), once);
}

#[tokio::test]
async fn resolved_flow_joins_on_parent_and_applies_guide_names() {
    let server = MockServer::start().await;
    Mock::given(path("/handle/1"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/items/one"))
        .mount(&server)
        .await;
    Mock::given(path("/handle/2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.resolver.item_path_prefix = Some("/items/".into());
    let storage = LocalStorage::new(&config.paths.storage_dir);
    storage
        .write_text(
            "seeds.txt",
            &format!("{0}/handle/1\n\n{0}/handle/2\n", server.uri()),
        )
        .await
        .unwrap();

    let client = create_client(&HttpConfig::default()).unwrap();
    let mut stats = RunStats::default();
    pipeline::run_resolve(&config, &client, &storage, &mut stats)
        .await
        .unwrap();
    assert_eq!(stats.seeds_resolved, 1);
    assert_eq!(stats.seeds_failed, 1);

    let item = format!("{}/items/one", server.uri());
    assert_eq!(
        storage.read_text("oracle_urls.txt").await.unwrap(),
        format!("{item}\n")
    );
    let resolved = storage.read_text("resolved.csv").await.unwrap();
    assert!(resolved.starts_with("seed,canonical_url,hops,status,last_uri\n"));
    assert!(resolved.contains("chain ended outside item pages (status 404)"));

    let oracle = dir.path().join("oracle.csv");
    fs::write(
        &oracle,
        format!("{ORACLE_HEADER}\nhttp://dead.test/;{item};404 Not Found;;;False\n"),
    )
    .unwrap();
    pipeline::run_report(&config, &oracle, Source::Resolved, &storage, &mut stats)
        .await
        .unwrap();

    let report = storage.read_text("report.csv").await.unwrap();
    assert_eq!(
        lines(&report),
        vec![
            "seed,hops,status,last_uri,urlname,parentname,result,warningstring,infostring,valid"
                .to_string(),
            format!(
                "{}/handle/1,1,resolved,{item},http://dead.test/,{item},404 Not Found,,,False",
                server.uri()
            ),
        ]
    );
}

#[tokio::test]
async fn guide_map_replaces_parent_with_name() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.report.join_on = Some(JoinKey::Url);
    let guides = dir.path().join("guides.csv");
    fs::write(
        &guides,
        "real,alias,name\nhttps://guides.test/c.php?g=G1,https://guides.test/g-one,Guide One\n",
    )
    .unwrap();
    config.report.guide_map = Some(guides);

    let storage = LocalStorage::new(&config.paths.storage_dir);
    storage
        .write_text("candidates.csv", "url,title\nhttp://dead.test/,T1\n")
        .await
        .unwrap();
    let oracle = dir.path().join("oracle.csv");
    fs::write(
        &oracle,
        format!("{ORACLE_HEADER}\nhttp://dead.test/;https://guides.test/g-one;404;;;False\n"),
    )
    .unwrap();

    let mut stats = RunStats::default();
    pipeline::run_report(&config, &oracle, Source::Candidates, &storage, &mut stats)
        .await
        .unwrap();

    let report = storage.read_text("report.csv").await.unwrap();
    assert_eq!(
        lines(&report)[1],
        "T1,http://dead.test/,Guide One,404,,,False"
    );
    assert_eq!(stats.guide_names_applied, 1);
}

#[tokio::test]
async fn missing_inputs_abort_the_stage() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let storage = LocalStorage::new(&config.paths.storage_dir);
    let mut stats = RunStats::default();

    let err = pipeline::run_extract(&config, &dir.path().join("absent.csv"), &storage, &mut stats)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InputMissing { .. }));

    let err = pipeline::run_correlate(&config, Source::Candidates, &storage, &mut stats)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InputMissing { .. }));
    assert!(err.is_fatal());
}
