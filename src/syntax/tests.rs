use super::*;
use pretty_assertions::assert_eq;

const CONTROLLER: &str = r#"package com.acme.gateway.web;

import javax.xml.bind.JAXBContext;
import org.springframework.web.bind.annotation.*;
import org.w3c.dom.Document;

/**
 * Legacy sale endpoint.
 */
@RestController
@RequestMapping(value = "/legacy", consumes = "application/x-www-form-urlencoded")
public class SaleController {

    private final SaleService service;
    private int retries = compute(3);

    @PostMapping(value = "/processxml.do", consumes = MediaType.APPLICATION_FORM_URLENCODED_VALUE)
    public String sale(@RequestParam("xmldata") String xmldata, Document doc) throws Exception {
        String out = marshaller.marshal(service.sale(xmldata));
        if (out.isEmpty()) { return processXml(doc); }
        return out;
    }

    abstract void noop();
}
"#;

#[test]
fn test_print_is_lossless() {
    let unit = CompilationUnit::parse(CONTROLLER);
    assert_eq!(unit.to_string(), CONTROLLER);
}

#[test]
fn test_lossless_on_odd_input() {
    for src in [
        "",
        "}}}",
        "class",
        "class X { void f( ) { g(",
        "@interface Marker { String value() default \"\"; }",
        "enum E { A(1), B(2); E(int v) {} }",
        "record Point(int x, int y) { }",
        "class X { Runnable r = new Runnable() { public void run() { a.b().c(); } }; }",
    ] {
        assert_eq!(CompilationUnit::parse(src).to_string(), src, "input: {src:?}");
    }
}

#[test]
fn test_structure() {
    let unit = CompilationUnit::parse(CONTROLLER);
    assert_eq!(unit.package(), Some("com.acme.gateway.web"));
    let imports: Vec<&str> = unit.imports().map(|i| i.name.as_str()).collect();
    assert_eq!(
        imports,
        vec![
            "javax.xml.bind.JAXBContext",
            "org.springframework.web.bind.annotation.*",
            "org.w3c.dom.Document"
        ]
    );
    let decl = unit.types().next().unwrap();
    assert_eq!(decl.name, "SaleController");
    let names: Vec<&str> = decl.annotations().map(Annotation::simple_name).collect();
    assert_eq!(names, vec!["RestController", "RequestMapping"]);
    let mapping = decl.annotations().nth(1).unwrap();
    assert_eq!(mapping.arg("value"), Some("\"/legacy\""));
    assert_eq!(mapping.arg("consumes"), Some("\"application/x-www-form-urlencoded\""));
}

#[test]
fn test_routines_and_params() {
    let mut unit = CompilationUnit::parse(CONTROLLER);
    let decl = unit.types_mut().next().unwrap();
    let names: Vec<String> = decl.routines_mut().map(|r| r.name.clone()).collect();
    assert_eq!(names, vec!["sale", "noop"]);

    let sale = decl.routines_mut().next().unwrap();
    let params: Vec<(&str, &str)> = sale.params.iter().map(|p| (p.ty(), p.name())).collect();
    assert_eq!(params, vec![("String", "xmldata"), ("Document", "doc")]);
}

#[test]
fn test_param_retype_keeps_name() {
    let mut unit = CompilationUnit::parse("class X { void f(final Document doc) {} }");
    let decl = unit.types_mut().next().unwrap();
    let routine = decl.routines_mut().next().unwrap();
    routine.params[0].set_type("Map<String, Object>");
    assert_eq!(routine.params[0].name(), "doc");
    assert_eq!(
        unit.to_string(),
        "class X { void f(final Map<String, Object> doc) {} }"
    );
}

struct CallNames(Vec<(Option<String>, String, bool)>);

impl VisitMut for CallNames {
    fn visit_call(&mut self, call: &mut Call) {
        self.0
            .push((call.receiver.clone(), call.name.clone(), call.is_chained()));
        walk_call(self, call);
    }
}

#[test]
fn test_calls_are_found_with_receivers() {
    let mut unit = CompilationUnit::parse(CONTROLLER);
    let mut names = CallNames(Vec::new());
    unit.walk_mut(&mut names);
    assert_eq!(
        names.0,
        vec![
            (None, "compute".to_string(), false),
            (Some("marshaller".to_string()), "marshal".to_string(), false),
            (Some("service".to_string()), "sale".to_string(), false),
            (Some("out".to_string()), "isEmpty".to_string(), false),
            (None, "processXml".to_string(), false),
        ]
    );
}

#[test]
fn test_call_rewrite_prints_new_receiver() {
    let mut unit = CompilationUnit::parse("class X { void f() { String s = jaxb.marshal(o); } }");

    struct Rename;
    impl VisitMut for Rename {
        fn visit_call(&mut self, call: &mut Call) {
            call.receiver = Some("objectMapper".into());
            call.name = "writeValueAsString".into();
        }
    }

    unit.walk_mut(&mut Rename);
    assert_eq!(
        unit.to_string(),
        "class X { void f() { String s = objectMapper.writeValueAsString(o); } }"
    );
}

#[test]
fn test_chained_receivers_are_detached() {
    let src = "class X { Object f() {\n        return (Sale) JAXBContext.newInstance(Sale.class).createUnmarshaller().unmarshal(in);\n        ctx.createMarshaller()\n            .marshal(o, w);\n        new Foo().run(this.items[0].size());\n    } }";
    let mut unit = CompilationUnit::parse(src);
    assert_eq!(unit.to_string(), src);

    let mut names = CallNames(Vec::new());
    unit.walk_mut(&mut names);
    assert_eq!(
        names.0,
        vec![
            (None, "unmarshal".to_string(), true),
            (None, "createUnmarshaller".to_string(), true),
            (Some("JAXBContext".to_string()), "newInstance".to_string(), false),
            (None, "marshal".to_string(), true),
            (Some("ctx".to_string()), "createMarshaller".to_string(), false),
            (None, "run".to_string(), true),
            (None, "size".to_string(), true),
        ]
    );
}

#[test]
fn test_rewriting_a_chained_call_replaces_the_chain() {
    let mut unit =
        CompilationUnit::parse("class X { void f() { s = (Sale) ctx.createUnmarshaller().unmarshal(in); } }");

    struct Rename;
    impl VisitMut for Rename {
        fn visit_call(&mut self, call: &mut Call) {
            if call.name == "unmarshal" {
                call.set_receiver("objectMapper");
                call.name = "writeValueAsString".into();
            }
            walk_call(self, call);
        }
    }

    unit.walk_mut(&mut Rename);
    assert_eq!(
        unit.to_string(),
        "class X { void f() { s = (Sale) objectMapper.writeValueAsString(in); } }"
    );
}

#[test]
fn test_annotation_edits() {
    let mut unit = CompilationUnit::parse("@RequestMapping(\"/x\")\nclass X {}");
    let decl = unit.types_mut().next().unwrap();
    let mapping = decl.annotations_mut().next().unwrap();
    assert!(!mapping.set_arg("consumes", "\"application/json\""));
    mapping.insert_arg("consumes", "\"application/json\"");
    assert!(mapping.is_modified());
    assert_eq!(
        unit.to_string(),
        "@RequestMapping(value = \"/x\", consumes = \"application/json\")\nclass X {}"
    );
}

#[test]
fn test_import_edits() {
    let mut unit = CompilationUnit::parse(CONTROLLER);
    let removed = unit.remove_imports(|i| i.name.contains("xml") || i.name.contains("w3c"));
    assert_eq!(removed.len(), 2);
    assert!(unit.add_import("com.fasterxml.jackson.databind.ObjectMapper"));
    assert!(!unit.add_import("com.fasterxml.jackson.databind.ObjectMapper"));
    let printed = unit.to_string();
    assert!(printed.starts_with(
        "package com.acme.gateway.web;\n\nimport org.springframework.web.bind.annotation.*;\nimport com.fasterxml.jackson.databind.ObjectMapper;\n\n/**"
    ));
}

#[test]
fn test_add_import_without_imports() {
    let mut unit = CompilationUnit::parse("package a;\n\nclass X {}\n");
    unit.add_import("java.util.Map");
    assert_eq!(unit.to_string(), "package a;\n\nimport java.util.Map;\n\nclass X {}\n");
}

#[test]
fn test_tokens_concatenate() {
    let joined: String = tokenize(CONTROLLER).iter().map(|t| t.text).collect();
    assert_eq!(joined, CONTROLLER);
}
