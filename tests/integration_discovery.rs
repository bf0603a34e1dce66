//! Integration tests for discovery.
//!
//! These tests verify end-to-end scan + assembly + validation behavior:
//! - Standard and hierarchical trees in one walk
//! - Nearest-manifest override inside a year sweep
//! - Defects reported alongside valid sets, never instead of them

use photo_batch_ingest::core::sets::{discover, DefectReason, SetStructure};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn mods_record(identifier: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<mods xmlns="http://www.loc.gov/mods/v3">
  <identifier type="IID">{identifier}</identifier>
</mods>"#
    )
}

fn seed_record(dir: &Path, stem: &str, identifier: &str) {
    fs::write(dir.join(format!("{stem}.jpg")), b"jpg").unwrap();
    fs::write(dir.join(format!("{stem}.xml")), mods_record(identifier)).unwrap();
}

#[test]
fn standard_and_hierarchical_trees_are_discovered_together() {
    let temp = TempDir::new().unwrap();

    // 2006: manifest beside the records
    let standard = temp.path().join("2006").join("46N-3W");
    fs::create_dir_all(&standard).unwrap();
    fs::write(standard.join("manifest.ini"), "[package]").unwrap();
    seed_record(&standard, "photo_001", "FSU_2006_001");
    seed_record(&standard, "photo_002", "FSU_2006_002");

    // 2007: one manifest at the year level governing three trenches
    let year = temp.path().join("2007");
    fs::create_dir_all(&year).unwrap();
    fs::write(year.join("manifest.ini"), "[package]").unwrap();
    for trench in ["46N-3W", "47N-2W", "48N-1W"] {
        let dir = year.join(trench);
        fs::create_dir_all(&dir).unwrap();
        seed_record(&dir, "photo_001", &format!("FSU_2007_{trench}_001"));
    }

    let discovery = discover(temp.path()).unwrap();

    assert_eq!(discovery.sets.len(), 4);
    assert!(discovery.defects.is_empty());
    assert_eq!(discovery.record_count(), 5);

    let standard_set = discovery
        .sets
        .iter()
        .find(|s| s.base_dir == standard)
        .unwrap();
    assert_eq!(standard_set.structure, SetStructure::Standard);

    for trench in ["46N-3W", "47N-2W", "48N-1W"] {
        let set = discovery
            .sets
            .iter()
            .find(|s| s.base_dir == year.join(trench))
            .unwrap();
        assert_eq!(set.structure, SetStructure::Hierarchical);
        assert_eq!(set.manifest, year.join("manifest.ini"));
    }
}

#[test]
fn a_trench_with_its_own_manifest_escapes_the_year_sweep() {
    let temp = TempDir::new().unwrap();
    let year = temp.path().join("2007");
    fs::create_dir_all(&year).unwrap();
    fs::write(year.join("manifest.ini"), "[package]").unwrap();

    let own = year.join("46N-3W");
    fs::create_dir_all(&own).unwrap();
    fs::write(own.join("manifest.ini"), "[package]").unwrap();
    seed_record(&own, "a", "FSU_OWN_001");

    let swept = year.join("47N-2W");
    fs::create_dir_all(&swept).unwrap();
    seed_record(&swept, "b", "FSU_SWEPT_001");

    let discovery = discover(temp.path()).unwrap();

    assert_eq!(discovery.sets.len(), 2);
    let own_set = discovery.sets.iter().find(|s| s.base_dir == own).unwrap();
    assert_eq!(own_set.manifest, own.join("manifest.ini"));

    let swept_set = discovery.sets.iter().find(|s| s.base_dir == swept).unwrap();
    assert_eq!(swept_set.manifest, year.join("manifest.ini"));
}

#[test]
fn defects_are_reported_alongside_valid_sets() {
    let temp = TempDir::new().unwrap();

    let good = temp.path().join("2006").join("46N-3W");
    fs::create_dir_all(&good).unwrap();
    fs::write(good.join("manifest.ini"), "[package]").unwrap();
    seed_record(&good, "a", "FSU_GOOD_001");

    // Records but no manifest anywhere above them
    let orphaned = temp.path().join("2006").join("47N-2W");
    fs::create_dir_all(&orphaned).unwrap();
    seed_record(&orphaned, "b", "FSU_ORPHAN_001");

    // Manifest present but no metadata file yields an identifier
    let unidentified = temp.path().join("2006").join("48N-1W");
    fs::create_dir_all(&unidentified).unwrap();
    fs::write(unidentified.join("manifest.ini"), "[package]").unwrap();
    fs::write(unidentified.join("c.jpg"), b"jpg").unwrap();
    fs::write(unidentified.join("c.xml"), "<record/>").unwrap();

    let discovery = discover(temp.path()).unwrap();

    assert_eq!(discovery.sets.len(), 1);
    assert_eq!(discovery.sets[0].base_dir, good);
    assert_eq!(discovery.defects.len(), 2);

    let reasons: Vec<&DefectReason> = discovery.defects.iter().map(|d| &d.reason).collect();
    assert!(reasons.contains(&&DefectReason::MissingManifest));
    assert!(reasons.contains(&&DefectReason::NoUsableIdentifier));
}

#[test]
fn zero_image_sets_survive_discovery() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("2006").join("46N-3W");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("manifest.ini"), "[package]").unwrap();
    fs::write(dir.join("record.xml"), mods_record("FSU_NOIMG_001")).unwrap();

    let discovery = discover(temp.path()).unwrap();

    assert_eq!(discovery.sets.len(), 1);
    assert!(discovery.sets[0].images.is_empty());
    assert_eq!(discovery.record_count(), 1);
}

#[test]
fn loose_images_without_metadata_are_not_defects() {
    let temp = TempDir::new().unwrap();
    let strays = temp.path().join("misc");
    fs::create_dir_all(&strays).unwrap();
    fs::write(strays.join("dscf0001.jpg"), b"jpg").unwrap();
    fs::write(strays.join("dscf0002.jpg"), b"jpg").unwrap();

    let discovery = discover(temp.path()).unwrap();

    assert!(discovery.sets.is_empty());
    assert!(discovery.defects.is_empty());
}

#[test]
fn unrelated_files_never_reach_a_set() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("2006");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("manifest.ini"), "[package]").unwrap();
    seed_record(&dir, "a", "FSU_MIXED_001");
    fs::write(dir.join("notes.txt"), b"field notes").unwrap();
    fs::write(dir.join("thumbs.db"), b"junk").unwrap();
    fs::write(dir.join("settings.ini"), b"[other]").unwrap();

    let discovery = discover(temp.path()).unwrap();

    assert_eq!(discovery.sets.len(), 1);
    assert_eq!(discovery.sets[0].images, vec![dir.join("a.jpg")]);
    assert_eq!(discovery.sets[0].metadata, vec![dir.join("a.xml")]);
}

#[test]
fn discovery_paths_are_absolute_when_the_root_is() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("2006");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("manifest.ini"), "[package]").unwrap();
    seed_record(&dir, "a", "FSU_ABS_001");

    let discovery = discover(temp.path()).unwrap();

    let set = &discovery.sets[0];
    assert!(set.base_dir.is_absolute());
    assert!(set.manifest.is_absolute());
    assert!(set.metadata.iter().all(|p| p.is_absolute()));
}

#[test]
fn rescanning_the_same_tree_is_deterministic() {
    let temp = TempDir::new().unwrap();
    for trench in ["48N-1W", "46N-3W", "47N-2W"] {
        let dir = temp.path().join("2006").join(trench);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("manifest.ini"), "[package]").unwrap();
        seed_record(&dir, "a", &format!("FSU_{trench}_001"));
    }

    let first = discover(temp.path()).unwrap();
    let second = discover(temp.path()).unwrap();

    let first_bases: Vec<PathBuf> = first.sets.iter().map(|s| s.base_dir.clone()).collect();
    let second_bases: Vec<PathBuf> = second.sets.iter().map(|s| s.base_dir.clone()).collect();
    assert_eq!(first_bases, second_bases);
    assert!(first_bases.windows(2).all(|w| w[0] < w[1]));
}
