use super::*;

fn file(package: &str, annotations: &[&str]) -> SourceFile {
    SourceFile {
        path: PathBuf::from(format!("{}.java", package.replace('.', "/"))),
        package: package.to_string(),
        annotations: annotations.iter().map(|a| a.to_string()).collect(),
    }
}

#[test]
fn test_entry_point_wins_over_density() {
    let files = vec![
        file("a.b", &["SpringBootApplication"]),
        file("a.b.c", &["Service", "Component"]),
        file("a.b.c", &["Service"]),
        file("a.b.d", &["RestController"]),
    ];
    let layout = detect_from_sources(&files).unwrap();
    assert_eq!(layout.base_package, "a.b");
}

#[test]
fn test_density_when_entry_is_ambiguous() {
    let files = vec![
        file("x.one", &["SpringBootApplication"]),
        file("x.two", &["SpringBootApplication"]),
        file("x.two", &["Service"]),
    ];
    assert_eq!(detect_from_sources(&files).unwrap().base_package, "x.two");
}

#[test]
fn test_common_prefix_fallback() {
    let files = vec![
        file("com.acme.orders.api", &[]),
        file("com.acme.orders.model", &[]),
        file("com.acme.billing", &[]),
    ];
    assert_eq!(detect_from_sources(&files).unwrap().base_package, "com");
}

#[test]
fn test_undetectable_without_signal() {
    assert!(detect_from_sources(&[]).is_none());
    assert!(detect_from_sources(&[file("app", &[])]).is_none());
}

#[test]
fn test_category_fragments_and_defaults() {
    let files = vec![
        file("com.acme", &["SpringBootApplication"]),
        file("com.acme.web", &["RestController"]),
        file("com.acme.model", &[]),
        file("com.acme.core", &["Service"]),
    ];
    let layout = detect_from_sources(&files).unwrap();
    assert_eq!(layout.endpoint, "com.acme.web");
    assert_eq!(layout.data_types, "com.acme.model");
    assert_eq!(layout.service, "com.acme.core");
    assert_eq!(layout.client, "com.acme.client");
    assert_eq!(layout.mapper, "com.acme.mapper");
    assert_eq!(layout.error, "com.acme.error");
}

#[test]
fn test_fragment_preference_order() {
    let files = vec![
        file("com.acme", &["SpringBootApplication"]),
        file("com.acme.api", &[]),
        file("com.acme.controller", &[]),
    ];
    assert_eq!(detect_from_sources(&files).unwrap().endpoint, "com.acme.controller");
}

#[test]
fn test_tag_package_uses_package_case() {
    let layout = DetectedLayout::with_defaults("com.acme");
    assert_eq!(
        layout.tag_package(Category::Client, "Card-Payments"),
        "com.acme.client.cardpayments"
    );
}

#[test]
fn test_validate_rejects_blank() {
    let mut layout = DetectedLayout::with_defaults("com.acme");
    assert!(layout.validate(Path::new("/p")).is_ok());
    layout.mapper = " ".to_string();
    assert!(matches!(
        layout.validate(Path::new("/p")),
        Err(EngineError::LayoutUndetectable { .. })
    ));
}

#[test]
fn test_parse_reads_type_annotations_only() {
    let src = "package com.acme.web;\n\nimport x.Y;\n\n@RestController\n@RequestMapping(\"/a\")\npublic class A {\n    @Autowired\n    private B b;\n}\n";
    let parsed = SourceFile::parse(PathBuf::from("A.java"), src);
    assert_eq!(parsed.package, "com.acme.web");
    let names: Vec<&str> = parsed.annotations.iter().map(String::as_str).collect();
    assert_eq!(names, vec!["RequestMapping", "RestController"]);
}

#[test]
fn test_detect_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = dir.path().join("src/main/java/com/shop");
    fs::create_dir_all(pkg.join("service")).unwrap();
    fs::write(
        pkg.join("ShopApplication.java"),
        "package com.shop;\n@SpringBootApplication\npublic class ShopApplication {}\n",
    )
    .unwrap();
    fs::write(
        pkg.join("service/OrderService.java"),
        "package com.shop.service;\n@Service\npublic class OrderService {}\n",
    )
    .unwrap();
    fs::write(pkg.join("README.md"), "not java").unwrap();

    let layout = LayoutDetector::new("src/main/java").detect(dir.path()).unwrap();
    assert_eq!(layout.base_package, "com.shop");
    assert_eq!(layout.service, "com.shop.service");

    persist_layout(dir.path(), &layout);
    let saved: DetectedLayout =
        serde_json::from_str(&fs::read_to_string(dir.path().join(LAYOUT_FILE)).unwrap()).unwrap();
    assert_eq!(saved, layout);
}

#[test]
fn test_detect_empty_tree_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = LayoutDetector::new("src/main/java").detect(dir.path()).unwrap_err();
    assert!(matches!(err, EngineError::LayoutUndetectable { .. }));
    assert!(err.is_fatal());
}
