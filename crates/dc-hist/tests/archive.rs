//! Integration tests: write archives to disk and read them back.

use std::path::PathBuf;

use approx::assert_relative_eq;
use dc_hist::{ArchiveWriter, HistError, HistFile, Histogram, HistogramSource};

fn tmp_path(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("dc_hist_{}_{}_{}", std::process::id(), nanos, name))
}

fn hist(name: &str, contents: &[f64]) -> Histogram {
    let mut h = Histogram::uniform(name, contents.len(), 0.0, 1.0);
    for (i, &c) in contents.iter().enumerate() {
        h.set_bin_content(i + 1, c);
        h.set_bin_error(i + 1, c.abs().sqrt() * 0.5);
    }
    h
}

#[test]
fn histograms_and_text_survive_a_reopen() {
    let path = tmp_path("roundtrip.dcar");
    let mut w = ArchiveWriter::create(&path).expect("create archive");
    w.write_histogram("ch1_BDT", &hist("ttH", &[1.0, 2.0, 3.0])).unwrap();
    w.write_histogram("ch1_BDT", &hist("ttbb", &[10.0, 20.0, 30.0])).unwrap();
    w.write_text("ch1_BDT", "MetaInfoLabelConvert", "JES\tCMS_scale_j\n").unwrap();
    w.close().unwrap();

    let f = HistFile::open(&path).expect("reopen archive");
    let names: Vec<String> = f.list_keys().unwrap().iter().map(|k| k.path()).collect();
    assert_eq!(names, vec!["ch1_BDT/ttH", "ch1_BDT/ttbb", "ch1_BDT/MetaInfoLabelConvert"]);
    assert_eq!(f.directories(), vec!["ch1_BDT".to_string()]);

    let h = f.get_histogram("ch1_BDT/ttbb").unwrap();
    assert_eq!(h.n_bins, 3);
    assert_relative_eq!(h.bin_content(2), 20.0);
    assert_relative_eq!(h.bin_error(3), 30f64.sqrt() * 0.5, epsilon = 1e-12);
    assert_eq!(f.get_text("ch1_BDT/MetaInfoLabelConvert").unwrap(), "JES\tCMS_scale_j\n");

    assert!(matches!(f.get_histogram("ch1_BDT/missing"), Err(HistError::KeyNotFound(_))));
    assert!(matches!(
        f.get_histogram("ch1_BDT/MetaInfoLabelConvert"),
        Err(HistError::UnsupportedClass(_))
    ));

    std::fs::remove_file(&path).ok();
}

#[test]
fn rewriting_a_path_resolves_to_the_latest_cycle() {
    let path = tmp_path("cycles.dcar");
    let mut w = ArchiveWriter::create(&path).unwrap();
    w.write_histogram("d", &hist("p", &[1.0])).unwrap();
    w.close().unwrap();

    let mut w = ArchiveWriter::open_update(&path).unwrap();
    w.write_histogram("d", &hist("p", &[2.0])).unwrap();
    w.write_histogram("d", &hist("p", &[3.0])).unwrap();
    w.close().unwrap();

    let f = HistFile::open(&path).unwrap();
    let keys = f.list_keys().unwrap();
    assert_eq!(keys.len(), 1, "superseded cycles must not be listed");
    assert_eq!(keys[0].cycle, 3);
    assert_relative_eq!(f.get_histogram("d/p").unwrap().bin_content(1), 3.0);

    std::fs::remove_file(&path).ok();
}

#[test]
fn create_truncates_previous_content() {
    let path = tmp_path("truncate.dcar");
    let mut w = ArchiveWriter::create(&path).unwrap();
    w.write_histogram("old", &hist("x", &[1.0])).unwrap();
    w.close().unwrap();

    let w = ArchiveWriter::create(&path).unwrap();
    w.close().unwrap();
    assert!(HistFile::open(&path).unwrap().list_keys().unwrap().is_empty());

    std::fs::remove_file(&path).ok();
}

#[test]
fn large_payloads_are_compressed() {
    let path = tmp_path("large.dcar");
    let contents = vec![1.5; 5000];
    let mut w = ArchiveWriter::create(&path).unwrap();
    w.write_histogram("", &hist("flat", &contents)).unwrap();
    w.close().unwrap();

    let size = std::fs::metadata(&path).unwrap().len() as usize;
    assert!(size < 5000 * 8, "expected compressed record, file has {} bytes", size);

    let f = HistFile::open(&path).unwrap();
    let h = f.histogram("flat").unwrap();
    assert_relative_eq!(h.integral(), 7500.0, epsilon = 1e-9);
    assert_eq!(f.histogram_names().unwrap(), vec!["flat".to_string()]);

    std::fs::remove_file(&path).ok();
}

#[test]
fn open_update_rejects_foreign_files() {
    let path = tmp_path("foreign.dcar");
    std::fs::write(&path, b"not an archive at all").unwrap();
    assert!(matches!(ArchiveWriter::open_update(&path).err(), Some(HistError::BadMagic)));
    std::fs::remove_file(&path).ok();
}
