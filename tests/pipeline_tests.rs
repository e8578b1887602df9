//! End-to-end pipeline tests

use std::fs;
use std::path::{Path, PathBuf};

use parcel_pipeline::config::Settings;
use parcel_pipeline::models::CanonicalField;
use parcel_pipeline::pipeline::{PipelineError, PipelineExecutor, PipelineStage, PipelineStatus};
use serde_json::{Value, json};
use tempfile::TempDir;

fn feature(i: usize) -> Value {
    json!({
        "type": "Feature",
        "geometry": {"type": "Point", "coordinates": [-80.19 - i as f64 * 0.001, 25.85]},
        "properties": {
            "AddressPoints.TRUE_SITE_": format!("{} NW {} ST", 100 + i, 10 + i % 7),
            "AddressPoints.TRUE_OWNER": if i % 3 == 0 { "SUNSHINE HOLDINGS LLC" } else { "MARIA LOPEZ" },
            "AddressPoints.PRIMARY_ZO": if i % 2 == 0 { "RS-1" } else { "T5-O" },
            "AddressPoints.YEAR_BUILT": 1950 + (i % 60) as i64,
            "AddressPoints.BUILDING_V": 120000 + i * 100,
            "AddressPoints.LAND_VAL_2": 80000,
            "AddressPoints.TOTAL_VAL1": 200000 + i * 100,
            "AddressPoints.NEIGHBORHO": "Little Haiti",
            "AddressPoints.MUNICIPALI": "Miami",
            "AddressPoints_AddSpatialJoin_10.Route": "Route 12",
            "AddressPoints.FLOOD_ZONE": "AE",
            "AddressPoints.FOLIO": format!("01-3113-{:03}-{:04}", i / 100, i % 100)
        }
    })
}

fn write_input(dir: &Path, features: Vec<Value>) -> PathBuf {
    let path = dir.join("parcels.geojson");
    let doc = json!({"type": "FeatureCollection", "features": features});
    fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();
    path
}

fn settings_for(dir: &Path, features: Vec<Value>) -> Settings {
    let input = write_input(dir, features);
    Settings::default()
        .with_input(input)
        .with_output_root(dir.join("out"))
        .with_backups(false)
}

fn remove_owner(mut feature: Value) -> Value {
    feature["properties"]
        .as_object_mut()
        .unwrap()
        .remove("AddressPoints.TRUE_OWNER");
    feature
}

fn read_lines(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

mod chunking_tests {
    use super::*;

    #[test]
    fn test_125_records_split_into_50_50_25() {
        let dir = TempDir::new().unwrap();
        let settings = settings_for(dir.path(), (0..125).map(feature).collect());
        let chunks_dir = dir.path().join("out/split_output/chunks");

        let report = PipelineExecutor::new(settings).unwrap().run().unwrap();
        assert!(report.is_success());
        assert_eq!(report.counts.records_read, 125);
        assert_eq!(report.counts.records_valid, 125);
        assert_eq!(report.counts.chunks_written, 3);

        let sizes: Vec<usize> = ["chunk_001", "chunk_002", "chunk_003"]
            .iter()
            .map(|stem| {
                let doc = read_json(&chunks_dir.join(format!("{stem}.json")));
                doc["features"].as_array().unwrap().len()
            })
            .collect();
        assert_eq!(sizes, vec![50, 50, 25]);
        assert!(!chunks_dir.join("chunk_004.json").exists());

        assert_eq!(read_lines(&chunks_dir.join("chunk_003.jsonl")).len(), 25);
        let csv = fs::read_to_string(chunks_dir.join("chunk_002.csv")).unwrap();
        assert_eq!(csv.lines().count(), 51);
    }

    #[test]
    fn test_written_records_match_valid_records() {
        let dir = TempDir::new().unwrap();
        let mut features: Vec<Value> = (0..30).map(feature).collect();
        features[4] = remove_owner(features[4].clone());
        features[17] = json!("not a feature");
        let settings = settings_for(dir.path(), features).with_records_per_file(7);

        let report = PipelineExecutor::new(settings).unwrap().run().unwrap();
        assert_eq!(report.counts.records_processed, 30);
        assert_eq!(report.counts.records_valid, 28);
        assert_eq!(report.counts.records_excluded, 2);

        let chunks_dir = dir.path().join("out/split_output/chunks");
        let written: usize = (1..=report.counts.chunks_written)
            .map(|n| read_lines(&chunks_dir.join(format!("chunk_{n:03}.jsonl"))).len())
            .sum();
        assert_eq!(written, 28);
    }

    #[test]
    fn test_group_by_zoning() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings_for(dir.path(), (0..10).map(feature).collect());
        settings.processing.group_by = vec![CanonicalField::Zoning];

        PipelineExecutor::new(settings).unwrap().run().unwrap();

        let group_dir = dir.path().join("out/split_output/by_zoning");
        let rs1 = read_json(&group_dir.join("zoning_RS-1.json"));
        let t5 = read_json(&group_dir.join("zoning_T5-O.json"));
        assert_eq!(rs1["features"].as_array().unwrap().len(), 5);
        assert_eq!(t5["features"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_owner_groups_with_similar_names_keep_all_records() {
        let dir = TempDir::new().unwrap();
        let features: Vec<Value> = (0..4)
            .map(|i| {
                let mut f = feature(i);
                f["properties"]["AddressPoints.TRUE_OWNER"] =
                    json!(if i % 2 == 0 { "SMITH/JOHN" } else { "SMITH JOHN" });
                f
            })
            .collect();
        let mut settings = settings_for(dir.path(), features);
        settings.processing.group_by = vec![CanonicalField::Owner];

        PipelineExecutor::new(settings).unwrap().run().unwrap();

        let group_dir = dir.path().join("out/split_output/by_owner");
        let total: usize = ["owner_SMITH_JOHN.json", "owner_SMITH_JOHN_2.json"]
            .iter()
            .map(|name| read_json(&group_dir.join(name))["features"].as_array().unwrap().len())
            .sum();
        assert_eq!(total, 4);
    }
}

mod error_handling_tests {
    use super::*;

    #[test]
    fn test_missing_owner_is_excluded_from_artifacts() {
        let dir = TempDir::new().unwrap();
        let mut features: Vec<Value> = (0..10).map(feature).collect();
        features[2] = remove_owner(features[2].clone());
        let settings = settings_for(dir.path(), features);

        let report = PipelineExecutor::new(settings).unwrap().run().unwrap();
        assert_eq!(report.counts.records_valid, 9);
        assert_eq!(report.counts.errors, 1);

        let errors = read_json(&dir.path().join("out/reports/error_report.json"));
        let missing: Vec<&Value> = errors["findings"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|f| f["kind"] == "required_field_missing")
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0]["record_id"], "property_000003");
        assert_eq!(missing[0]["field"], "owner");

        let rag_dir = dir.path().join("out/rag_data");
        for file in ["property_stories.jsonl", "property_qa_pairs.jsonl", "rag_chunks.jsonl"] {
            let lines = read_lines(&rag_dir.join(file));
            assert!(!lines.is_empty());
            assert!(lines.iter().all(|l| l["record_id"] != "property_000003"), "{file}");
        }
        assert_eq!(read_lines(&rag_dir.join("property_stories.jsonl")).len(), 9);
    }

    #[test]
    fn test_error_threshold_aborts_run() {
        let dir = TempDir::new().unwrap();
        let features: Vec<Value> = (0..20).map(|i| remove_owner(feature(i))).collect();
        let mut settings = settings_for(dir.path(), features);
        settings.error_handling.max_errors_before_stop = 3;

        let mut executor = PipelineExecutor::new(settings).unwrap();
        match executor.run() {
            Err(PipelineError::TooManyErrors { count, limit }) => {
                assert_eq!(count, 3);
                assert_eq!(limit, 3);
            }
            other => panic!("expected TooManyErrors, got {other:?}"),
        }
        assert_eq!(executor.summary().status, PipelineStatus::Aborted);
        let counts = executor.summary().counts;
        assert_eq!(counts.errors, 3);
        assert_eq!(counts.records_read, 20);
        assert_eq!(counts.records_processed, 3);
        assert_eq!(counts.records_valid, 0);
        assert_eq!(counts.records_excluded, 3);

        let reports = dir.path().join("out/reports");
        let errors = read_json(&reports.join("error_report.json"));
        assert_eq!(errors["aborted"], true);
        assert_eq!(errors["error_count"], 3);
        let summary = read_json(&reports.join("run_summary.json"));
        assert_eq!(summary["status"], "aborted");
        assert_eq!(summary["counts"]["records_processed"], 3);
        assert_eq!(summary["counts"]["records_excluded"], 3);
        assert!(!dir.path().join("out/split_output/chunks").exists());
    }

    #[test]
    fn test_parallel_abort_stops_at_threshold() {
        let dir = TempDir::new().unwrap();
        let features: Vec<Value> = (0..200).map(|i| remove_owner(feature(i))).collect();
        let mut settings = settings_for(dir.path(), features).with_parallel(true);
        settings.performance.batch_processing_size = 8;
        settings.error_handling.max_errors_before_stop = 5;

        let mut executor = PipelineExecutor::new(settings).unwrap();
        let err = executor.run().unwrap_err();
        assert!(err.is_threshold());
        assert_eq!(executor.summary().counts.errors, 5);
    }

    #[test]
    fn test_first_error_stops_without_continue_on_error() {
        let dir = TempDir::new().unwrap();
        let mut features: Vec<Value> = (0..10).map(feature).collect();
        features[5] = remove_owner(features[5].clone());
        let mut settings = settings_for(dir.path(), features);
        settings.error_handling.continue_on_error = false;

        let err = PipelineExecutor::new(settings).unwrap().run().unwrap_err();
        assert!(matches!(err, PipelineError::TooManyErrors { count: 1, limit: 1 }));
    }

    #[test]
    fn test_missing_input_fails() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::default()
            .with_input(dir.path().join("missing.json"))
            .with_output_root(dir.path().join("out"));

        let mut executor = PipelineExecutor::new(settings).unwrap();
        let err = executor.run().unwrap_err();
        assert!(matches!(err, PipelineError::Read(_)));
        assert_eq!(executor.summary().status, PipelineStatus::Failed);
    }

    #[test]
    fn test_invalid_rag_config_fails_before_reading() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings_for(dir.path(), vec![feature(0)]);
        settings.llm_training.rag_chunks.chunk_size = 50;
        settings.llm_training.rag_chunks.overlap_size = 60;

        assert!(matches!(
            PipelineExecutor::new(settings),
            Err(PipelineError::Config(_))
        ));
    }
}

mod output_tests {
    use super::*;

    #[test]
    fn test_all_outputs_written() {
        let dir = TempDir::new().unwrap();
        let settings = settings_for(dir.path(), (0..12).map(feature).collect());

        let report = PipelineExecutor::new(settings).unwrap().run().unwrap();
        assert_eq!(report.stages_completed, PipelineStage::all());

        let out = dir.path().join("out");
        for file in [
            "rag_data/property_stories.jsonl",
            "rag_data/property_qa_pairs.jsonl",
            "rag_data/rag_chunks.jsonl",
            "rag_data/search_queries.jsonl",
            "reports/statistics_report.json",
            "reports/analysis_report.txt",
            "reports/field_analysis.json",
            "reports/run_summary.json",
            "reports/error_report.json",
        ] {
            assert!(out.join(file).exists(), "missing {file}");
        }

        let summary = read_json(&out.join("reports/run_summary.json"));
        assert_eq!(summary["status"], "completed");
        assert_eq!(summary["counts"]["records_valid"], 12);
        assert_eq!(summary["counts"]["chunks_written"], 1);

        let qa = read_lines(&out.join("rag_data/property_qa_pairs.jsonl"));
        assert_eq!(report.counts.qa_pairs, qa.len());
        assert!(qa.len() <= 12 * 5);

        let fields = read_json(&out.join("reports/field_analysis.json"));
        assert_eq!(fields["total_features"], 12);
        assert_eq!(fields["fields"]["AddressPoints.TRUE_OWNER"]["used_in_mapping"], true);

        let text = fs::read_to_string(out.join("reports/analysis_report.txt")).unwrap();
        assert!(text.contains("END OF REPORT"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let settings = settings_for(dir.path(), (0..20).map(feature).collect());

        let report = PipelineExecutor::new(settings)
            .unwrap()
            .with_dry_run(true)
            .run()
            .unwrap();
        assert!(report.is_success());
        assert!(report.dry_run);
        assert_eq!(report.counts.records_valid, 20);
        assert_eq!(report.counts.chunks_written, 0);
        assert_eq!(
            report.stages_completed,
            vec![PipelineStage::Read, PipelineStage::Validate]
        );
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_parallel_output_matches_sequential() {
        let dir = TempDir::new().unwrap();
        let features: Vec<Value> = (0..90).map(feature).collect();
        let input = write_input(dir.path(), features);

        let run = |root: &str, parallel: bool| {
            let mut settings = Settings::default()
                .with_input(&input)
                .with_output_root(dir.path().join(root))
                .with_backups(false)
                .with_records_per_file(20)
                .with_parallel(parallel);
            settings.performance.batch_processing_size = 7;
            settings.performance.max_workers = 3;
            PipelineExecutor::new(settings).unwrap().run().unwrap()
        };
        let sequential = run("seq", false);
        let parallel = run("par", true);
        assert_eq!(sequential.counts, parallel.counts);

        for file in [
            "split_output/chunks/chunk_001.jsonl",
            "split_output/chunks/chunk_005.jsonl",
            "rag_data/property_qa_pairs.jsonl",
            "rag_data/rag_chunks.jsonl",
        ] {
            let a = fs::read_to_string(dir.path().join("seq").join(file)).unwrap();
            let b = fs::read_to_string(dir.path().join("par").join(file)).unwrap();
            assert_eq!(a, b, "{file} differs");
        }
    }

    #[test]
    fn test_story_text_files_and_search_index() {
        let dir = TempDir::new().unwrap();
        let settings = settings_for(dir.path(), (0..12).map(feature).collect()).with_records_per_file(5);

        PipelineExecutor::new(settings).unwrap().run().unwrap();

        let rag_dir = dir.path().join("out/rag_data");
        let stories_dir = rag_dir.join("stories");
        for n in 1..=3 {
            assert!(stories_dir.join(format!("properties_chunk_{n:03}.txt")).exists());
        }
        assert!(!stories_dir.join("properties_chunk_004.txt").exists());
        let third = fs::read_to_string(stories_dir.join("properties_chunk_003.txt")).unwrap();
        assert!(third.starts_with("PROPERTY STORIES - CHUNK 3\n"));
        assert!(third.contains("Properties 11 to 12 of 12"));

        let index = fs::read_to_string(rag_dir.join("property_search_index.txt")).unwrap();
        let rows: Vec<&str> = index.lines().filter(|l| l.contains(" | Property #")).collect();
        assert_eq!(rows.len(), 12);
        assert!(rows[11].contains("| properties_chunk_003.txt | Property #12 | Little Haiti"));

        let chunks = read_lines(&rag_dir.join("rag_chunks.jsonl"));
        assert!(chunks.iter().all(|c| c["embedding_text"].as_str().is_some_and(|t| !t.is_empty())));
        assert_eq!(chunks[0]["metadata"]["municipality"], "Miami");
    }

    #[test]
    fn test_disabled_generator_leaves_no_stale_file() {
        let dir = TempDir::new().unwrap();
        let settings = settings_for(dir.path(), (0..6).map(feature).collect());
        PipelineExecutor::new(settings.clone()).unwrap().run().unwrap();

        let rag_dir = dir.path().join("out/rag_data");
        assert!(rag_dir.join("rag_chunks.jsonl").exists());
        assert!(rag_dir.join("stories").exists());

        let mut rerun = settings;
        rerun.llm_training.rag_chunks.enabled = false;
        rerun.llm_training.property_stories.enabled = false;
        let report = PipelineExecutor::new(rerun).unwrap().run().unwrap();
        assert_eq!(report.counts.rag_chunks, 0);
        assert!(!rag_dir.join("rag_chunks.jsonl").exists());
        assert!(!rag_dir.join("property_stories.jsonl").exists());
        assert!(!rag_dir.join("property_search_index.txt").exists());
        assert!(!rag_dir.join("stories").exists());
        assert!(rag_dir.join("property_qa_pairs.jsonl").exists());
    }

    #[test]
    fn test_stop_after_split_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let settings = settings_for(dir.path(), (0..8).map(feature).collect());

        let report = PipelineExecutor::new(settings)
            .unwrap()
            .with_stop_after(Some("split".parse().unwrap()))
            .run()
            .unwrap();
        assert!(report.is_success());
        assert_eq!(
            report.stages_completed,
            vec![PipelineStage::Read, PipelineStage::Validate, PipelineStage::Split]
        );
        assert_eq!(report.counts.records_valid, 8);
        assert!(!dir.path().join("out/split_output/chunks").exists());
        assert!(!dir.path().join("out/rag_data").exists());
    }

    #[test]
    fn test_rerun_clears_stale_chunks() {
        let dir = TempDir::new().unwrap();
        let settings = settings_for(dir.path(), (0..100).map(feature).collect());
        PipelineExecutor::new(settings.clone()).unwrap().run().unwrap();

        let input = write_input(dir.path(), (0..30).map(feature).collect());
        let report = PipelineExecutor::new(settings.with_input(input))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(report.counts.chunks_written, 1);
        assert!(!dir.path().join("out/split_output/chunks/chunk_002.json").exists());
    }
}
