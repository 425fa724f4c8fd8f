use std::path::PathBuf;

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn java_source_root() -> PathBuf {
    fixtures_dir().join("java")
}

pub fn suite_path() -> PathBuf {
    fixtures_dir().join("testng.yaml")
}

pub fn xml_suite_path() -> PathBuf {
    fixtures_dir().join("testng.xml")
}
