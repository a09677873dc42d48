use super::*;
use crate::spec::{HttpMethod, ResolvedSpec, SpecMetadata};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

const LEGACY_CONTROLLER: &str = r#"package com.acme.gateway.web;

import javax.xml.bind.JAXBContext;
import org.springframework.web.bind.annotation.*;
import org.w3c.dom.Document;

@RestController
@RequestMapping(value = "/legacy", consumes = "application/x-www-form-urlencoded")
public class SaleController {

    @PostMapping(value = "/processxml.do", consumes = MediaType.APPLICATION_FORM_URLENCODED_VALUE)
    public String sale(@RequestParam("xmldata") String xmldata, Document doc) {
        return marshaller.marshal(service.sale(xmldata));
    }

    @GetMapping("/health")
    public String health() {
        return "ok";
    }
}
"#;

fn op(id: &str, path: &str, summary: Option<&str>) -> Operation {
    Operation {
        id: id.to_string(),
        method: HttpMethod::Post,
        path: path.to_string(),
        summary: summary.map(str::to_string),
        description: None,
        primary_tag: "Transactions".to_string(),
        tags: vec!["Transactions".to_string()],
        parameters: vec![],
        request_body: None,
        responses: vec![],
        id_synthesized: false,
    }
}

fn catalog(label: &str, operations: Vec<Operation>) -> OperationCatalog {
    OperationCatalog::new(
        label,
        ResolvedSpec {
            metadata: SpecMetadata {
                source: format!("{label}.yaml"),
                title: label.to_string(),
                version: "1.0.0".to_string(),
                size_bytes: 0,
                fingerprint: String::new(),
                base_path: None,
            },
            operations,
            schemas: BTreeMap::new(),
        },
    )
}

#[test]
fn test_rewrite_legacy_controller() {
    let rewrite = rewrite_source(LEGACY_CONTROLLER).unwrap().unwrap();
    let out = &rewrite.source;

    assert!(out.starts_with(
        "package com.acme.gateway.web;\n\nimport org.springframework.web.bind.annotation.*;\n\
         import com.fasterxml.jackson.databind.ObjectMapper;\n\
         import org.springframework.http.MediaType;\n\
         import reactor.core.publisher.Mono;\n\
         import java.util.Map;\n\n@RestController\n"
    ));
    assert!(out.contains("@RequestMapping(value = \"/legacy\", consumes = \"application/json\")\n"));
    assert!(out.contains(
        "@PostMapping(value = \"/processxml.do\", consumes = \"application/json\", produces = \"application/json\")"
    ));
    assert!(out.contains(
        "public String sale(@RequestParam(\"xmldata\") String xmldata, Map<String, Object> doc) {"
    ));
    assert!(out.contains("return objectMapper.writeValueAsString(service.sale(xmldata));"));
    assert!(out.contains("    @GetMapping(\"/health\")\n    public String health() {\n        return \"ok\";\n    }\n"));
    assert_eq!(rewrite.types, vec!["SaleController"]);
    assert!(rewrite.edits.contains(&Edit::ImportRemoved("org.w3c.dom.Document".into())));
    assert!(rewrite.edits.contains(&Edit::CallRewritten {
        routine: "sale".into(),
        call: "marshal".into()
    }));
}

#[test]
fn test_legacy_routine_detection() {
    let mut unit = crate::syntax::CompilationUnit::parse(LEGACY_CONTROLLER);
    let decl = unit.types_mut().next().unwrap();
    let flags: Vec<bool> = decl.routines_mut().map(|r| is_legacy_routine(r)).collect();
    assert_eq!(flags, vec![true, false]);
}

#[test]
fn test_chained_calls_rewritten_outside_calls_untouched() {
    let src = "class X {\n    String s = marshal(a);\n    void f(Document d) { return x.y().marshal(d); }\n}\n";
    let rewrite = rewrite_source(src).unwrap().unwrap();
    assert!(rewrite.source.contains("String s = marshal(a);"));
    assert!(rewrite.source.contains("return objectMapper.writeValueAsString(d);"));
    assert!(rewrite.source.contains("void f(Map<String, Object> d)"));
}

#[test]
fn test_jaxb_context_chains_are_rewritten() {
    let src = r#"package com.acme.gateway.web;

import javax.xml.bind.JAXBContext;
import java.io.StringReader;

public class SaleParser {

    public Sale parse(String xmldata) throws Exception {
        return (Sale) JAXBContext.newInstance(Sale.class).createUnmarshaller().unmarshal(new StringReader(xmldata));
    }
}
"#;
    let rewrite = rewrite_source(src).unwrap().unwrap();
    assert!(rewrite
        .source
        .contains("return (Sale) objectMapper.writeValueAsString(new StringReader(xmldata));"));
    assert!(!rewrite.source.contains("javax.xml.bind"));
    assert!(rewrite.source.contains("import java.io.StringReader;"));
    assert_eq!(
        rewrite
            .edits
            .iter()
            .filter(|e| matches!(e, Edit::CallRewritten { .. }))
            .count(),
        1
    );
}

#[test]
fn test_trigger_without_rewrite_is_untouched() {
    let src = "class X {\n    // mentions xmldata\n    int count() { return 1; }\n}\n";
    assert_eq!(rewrite_source(src).unwrap(), None);
}

#[test]
fn test_files_written_only_when_changed() {
    let dir = tempfile::tempdir().unwrap();
    let web = dir.path().join("web");
    fs::create_dir_all(&web).unwrap();
    let legacy_path = web.join("SaleController.java");
    let plain_path = web.join("HealthController.java");
    let plain = "package web;\n\n// xmldata is no longer used here\nclass HealthController {}\n";
    fs::write(&legacy_path, LEGACY_CONTROLLER).unwrap();
    fs::write(&plain_path, plain).unwrap();

    let legacy = catalog("legacy", vec![]);
    let outcome = MigrationEngine::new(&legacy, false).run(dir.path(), &[]);
    assert_eq!(outcome.updated_files, vec![legacy_path.clone()]);
    assert!(outcome.errors.is_empty());
    assert_eq!(fs::read_to_string(&plain_path).unwrap(), plain);
    assert!(fs::read_to_string(&legacy_path)
        .unwrap()
        .contains("objectMapper.writeValueAsString"));
    assert_eq!(outcome.todos.len(), 1);
    assert!(outcome.todos[0].starts_with("Inject an ObjectMapper into SaleController"));
}

#[test]
fn test_dry_run_reports_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("SaleController.java");
    fs::write(&path, LEGACY_CONTROLLER).unwrap();

    let legacy = catalog("legacy", vec![]);
    let outcome = MigrationEngine::new(&legacy, true).run(dir.path(), &[]);
    assert_eq!(outcome.updated_files, vec![path.clone()]);
    assert_eq!(fs::read_to_string(&path).unwrap(), LEGACY_CONTROLLER);
}

#[test]
fn test_correlation_rules() {
    let legacy = catalog(
        "legacy",
        vec![
            op("ccsale", "/sale", Some("Credit card sale")),
            op("ccvoid", "/void", Some("Void a transaction")),
            op("getBatch", "/batches/{id}", Some("Settlement batch details report")),
        ],
    );

    let exact = op("ccvoid", "/transactions/cancel", None);
    assert_eq!(correlate(&legacy, &exact).map(|(o, k)| (o.id.as_str(), k)), Some(("ccvoid", MatchKind::ExactId)));

    let by_path = op("processPayment", "/payments/sale", Some("Process a payment"));
    assert_eq!(
        correlate(&legacy, &by_path).map(|(o, k)| (o.id.as_str(), k)),
        Some(("ccsale", MatchKind::Containment))
    );

    let by_summary = op("fetchSettlement", "/settlements/{settlementId}", Some("Settlement batch lookup"));
    assert_eq!(
        correlate(&legacy, &by_summary).map(|(o, k)| (o.id.as_str(), k)),
        Some(("getBatch", MatchKind::SharedSummary))
    );

    let unrelated = op("listWebhooks", "/webhooks", Some("List webhook batch"));
    assert!(find_legacy_operation(&legacy, &unrelated).is_none());
}

#[test]
fn test_unmapped_operations_become_todos() {
    let legacy = catalog("legacy", vec![op("ccsale", "/sale", None)]);
    let mapped = op("processPayment", "/payments/sale", None);
    let unmapped = op("listWebhooks", "/webhooks", None);
    let dir = tempfile::tempdir().unwrap();

    let outcome = MigrationEngine::new(&legacy, true).run(dir.path(), &[&mapped, &unmapped]);
    assert_eq!(
        outcome.mappings,
        vec![
            OperationMapping {
                legacy_operation: Some("ccsale".into()),
                target_operation: "processPayment".into(),
                tag: "Transactions".into(),
            },
            OperationMapping {
                legacy_operation: None,
                target_operation: "listWebhooks".into(),
                tag: "Transactions".into(),
            },
        ]
    );
    assert_eq!(outcome.todos.len(), 1);
    assert!(outcome.todos[0].contains("listWebhooks"));
    assert!(outcome.errors.is_empty());
}
