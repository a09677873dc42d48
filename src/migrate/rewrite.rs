use super::rules::{
    is_legacy_import, is_raw_document_type, ENCODER_CALL, ENCODER_RECEIVER, JSON_MEDIA_TYPE,
    LEGACY_CALLS, NEGOTIATION_KEYS, REPLACEMENT_IMPORTS, ROUTE_ANNOTATIONS,
    ROUTINE_ANNOTATION_TRIGGERS, ROUTINE_TEXT_TRIGGERS, STRUCTURED_TYPE, STRUCTURED_TYPE_IMPORT,
};
use crate::syntax::{
    walk_call, walk_nodes, walk_type, Annotation, Call, CompilationUnit, Routine, TypeDecl,
    VisitMut,
};
use tracing::debug;

/// A single change applied to a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Negotiation { annotation: String, key: String },
    Retyped { routine: String, param: String },
    CallRewritten { routine: String, call: String },
    ImportRemoved(String),
    ImportAdded(String),
}

/// Result of rewriting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub source: String,
    /// Top-level types of the file, for follow-up notes.
    pub types: Vec<String>,
    pub edits: Vec<Edit>,
}

/// Whether a routine speaks the legacy wire format.
pub fn is_legacy_routine(routine: &Routine) -> bool {
    let annotated = routine.annotations().any(|a| {
        let text = a.to_string();
        ROUTINE_ANNOTATION_TRIGGERS.iter().any(|t| text.contains(t))
    });
    annotated || {
        let text = routine.to_string();
        ROUTINE_TEXT_TRIGGERS.iter().any(|t| text.contains(t))
    }
}

/// Visitor applying the route, parameter and call rewrites.
#[derive(Debug, Default)]
struct LegacyRewriter {
    edits: Vec<Edit>,
    routine: Option<String>,
}

impl LegacyRewriter {
    /// Switch consumes/produces to JSON; `insert` adds missing keys too.
    fn negotiate_json(&mut self, annotation: &mut Annotation, insert: bool) {
        for key in NEGOTIATION_KEYS {
            let changed = if annotation.arg(key).is_some() {
                annotation.set_arg(key, JSON_MEDIA_TYPE)
            } else if insert {
                annotation.insert_arg(key, JSON_MEDIA_TYPE);
                true
            } else {
                false
            };
            if changed {
                self.edits.push(Edit::Negotiation {
                    annotation: annotation.simple_name().to_string(),
                    key: key.to_string(),
                });
            }
        }
    }
}

impl VisitMut for LegacyRewriter {
    fn visit_type(&mut self, decl: &mut TypeDecl) {
        for annotation in decl.annotations_mut() {
            if annotation.simple_name() == "RequestMapping" {
                self.negotiate_json(annotation, false);
            }
        }
        walk_type(self, decl);
    }

    fn visit_routine(&mut self, routine: &mut Routine) {
        if !is_legacy_routine(routine) {
            return;
        }
        debug!(routine = %routine.name, "rewriting legacy routine");
        for annotation in routine.annotations_mut() {
            if ROUTE_ANNOTATIONS.contains(&annotation.simple_name()) {
                self.negotiate_json(annotation, true);
            }
        }
        for param in &mut routine.params {
            if is_raw_document_type(param.ty()) {
                param.set_type(STRUCTURED_TYPE);
                self.edits.push(Edit::Retyped {
                    routine: routine.name.clone(),
                    param: param.name().to_string(),
                });
            }
        }
        self.routine = Some(routine.name.clone());
        if let Some(body) = &mut routine.body {
            walk_nodes(self, body);
        }
        self.routine = None;
    }

    fn visit_call(&mut self, call: &mut Call) {
        if let Some(routine) = &self.routine {
            if LEGACY_CALLS.contains(&call.name.as_str()) {
                self.edits.push(Edit::CallRewritten {
                    routine: routine.clone(),
                    call: call.name.clone(),
                });
                // `ctx.createMarshaller().marshal(..)` loses the whole chain
                call.set_receiver(ENCODER_RECEIVER);
                call.name = ENCODER_CALL.to_string();
            }
        }
        walk_call(self, call);
    }
}

/// Rewrite a parsed file; `None` when nothing applied.
///
/// Imports only change when at least one route, parameter or call rewrite
/// applied, so files that merely mention a trigger stay untouched.
pub fn rewrite_unit(unit: &mut CompilationUnit) -> Option<Vec<Edit>> {
    let mut rewriter = LegacyRewriter::default();
    unit.walk_mut(&mut rewriter);
    let mut edits = rewriter.edits;
    if edits.is_empty() {
        return None;
    }

    let retyped = edits.iter().any(|e| matches!(e, Edit::Retyped { .. }));
    edits.extend(
        unit.remove_imports(|i| is_legacy_import(&i.name))
            .into_iter()
            .map(Edit::ImportRemoved),
    );
    let additions = REPLACEMENT_IMPORTS
        .iter()
        .copied()
        .chain(retyped.then_some(STRUCTURED_TYPE_IMPORT));
    for import in additions {
        if unit.add_import(import) {
            edits.push(Edit::ImportAdded(import.to_string()));
        }
    }
    Some(edits)
}

/// Parse, rewrite and print `source`.
///
/// Fails when the parsed tree does not print back to the input, since any
/// write would then change text no rewrite touched.
pub fn rewrite_source(source: &str) -> Result<Option<Rewrite>, String> {
    let mut unit = CompilationUnit::parse(source);
    if unit.to_string() != source {
        return Err("syntax tree does not reproduce the source".to_string());
    }
    let types = unit.types().map(|t| t.name.clone()).collect();
    Ok(rewrite_unit(&mut unit).map(|edits| Rewrite {
        source: unit.to_string(),
        types,
        edits,
    }))
}
