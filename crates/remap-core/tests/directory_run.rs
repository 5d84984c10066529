use remap_core::codec::ModelCodec;
use remap_core::{ArchiveSource, DirectoryArchive, RemapConfig, RemapError, Remapper};
use remap_test_utils::{base_and_child, entry_name, module};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn unpack(root: &Path) {
    for model in base_and_child() {
        let path = root.join(entry_name(&model.name));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, module(&model)).unwrap();
    }
    fs::create_dir_all(root.join("META-INF")).unwrap();
    fs::write(root.join("META-INF/MANIFEST.MF"), "Manifest-Version: 1.0\n").unwrap();
}

fn workspace() -> (TempDir, RemapConfig) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    unpack(&input);
    let maps = dir.path().join("rules.yaml");
    fs::write(&maps, "- classes:\n    a/A: x/Alpha\n").unwrap();
    let config = RemapConfig::new().with_maps(maps).with_input(input);
    (dir, config)
}

#[test]
fn remaps_into_separate_output_and_preserves_original() {
    let (dir, config) = workspace();
    let output = dir.path().join("out");
    let original = dir.path().join("orig");
    let config = config.with_output(&output).with_original(&original);

    let report = Remapper::new(config, ModelCodec).run().unwrap();
    assert_eq!(report.classes, 2);
    assert_eq!(report.opaque, 1);

    let out = DirectoryArchive::open(&output).unwrap();
    assert_eq!(
        out.entries(),
        vec!["META-INF/MANIFEST.MF", "a/B.class.json", "x/Alpha.class.json"]
    );

    let kept = DirectoryArchive::open(&original).unwrap();
    assert_eq!(
        kept.entries(),
        vec!["META-INF/MANIFEST.MF", "a/A.class.json", "a/B.class.json"]
    );
    assert_eq!(
        kept.read("a/A.class.json").unwrap(),
        fs::read(dir.path().join("in/a/A.class.json")).unwrap()
    );
}

#[test]
fn output_defaults_to_input() {
    let (dir, config) = workspace();
    Remapper::new(config, ModelCodec).run().unwrap();

    let rewritten = DirectoryArchive::open(dir.path().join("in")).unwrap();
    assert!(rewritten.entries().contains(&"x/Alpha.class.json".to_string()));
    assert!(!dir.path().join("in/a/A.class.json").exists());
}

#[test]
fn invalid_configuration_is_reported_before_work() {
    let (_dir, config) = workspace();
    let err = Remapper::new(config.with_cores(0), ModelCodec).run().unwrap_err();
    assert!(matches!(err, RemapError::Config(_)));
}

#[test]
fn rule_file_syntax_error_surfaces() {
    let (dir, config) = workspace();
    fs::write(dir.path().join("rules.yaml"), "classes: [a/A\n").unwrap();
    let err = Remapper::new(config, ModelCodec).run().unwrap_err();
    assert!(matches!(err, RemapError::Rules(_)));
}
