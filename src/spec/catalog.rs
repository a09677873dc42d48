use super::types::{HttpMethod, Operation, ResolvedSpec, SpecMetadata};
use crate::generator::type_case;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Derive an operation id from verb and path template.
///
/// `GET /payments/{paymentId}/refunds` → `getPaymentsByPaymentIdRefunds`.
pub fn synthesize_operation_id(method: HttpMethod, path: &str) -> String {
    let mut id = method.key().to_string();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        match segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
        {
            Some(param) => {
                id.push_str("By");
                id.push_str(&type_case(param));
            }
            None => id.push_str(&type_case(segment)),
        }
    }
    id
}

/// Indexed, ordered view over the operations of one specification.
///
/// Two catalogs (legacy and target) can live side by side; the label tells
/// them apart in logs and reports.
#[derive(Debug, Clone)]
pub struct OperationCatalog {
    label: String,
    metadata: SpecMetadata,
    operations: Vec<Operation>,
    by_id: HashMap<String, usize>,
    warnings: Vec<String>,
}

impl OperationCatalog {
    /// Build the catalog, synthesizing missing ids and de-duplicating clashes.
    ///
    /// Both cases add a warning; neither is an error.
    pub fn new(label: impl Into<String>, spec: ResolvedSpec) -> Self {
        let label = label.into();
        let mut warnings = Vec::new();
        let mut by_id = HashMap::new();
        let mut operations = Vec::with_capacity(spec.operations.len());

        for mut op in spec.operations {
            if op.id.is_empty() {
                op.id = synthesize_operation_id(op.method, &op.path);
                op.id_synthesized = true;
                let message = format!(
                    "Generated operationId for {} {}: {}",
                    op.method, op.path, op.id
                );
                warn!(catalog = %label, "{message}");
                warnings.push(message);
            }
            if by_id.contains_key(&op.id) {
                let original = op.id.clone();
                let mut counter = 2;
                while by_id.contains_key(&format!("{original}_{counter}")) {
                    counter += 1;
                }
                op.id = format!("{original}_{counter}");
                let message = format!(
                    "Duplicate operationId '{original}' on {} {} renamed to '{}'",
                    op.method, op.path, op.id
                );
                warn!(catalog = %label, "{message}");
                warnings.push(message);
            }
            by_id.insert(op.id.clone(), operations.len());
            operations.push(op);
        }

        OperationCatalog {
            label,
            metadata: spec.metadata,
            operations,
            by_id,
            warnings,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn metadata(&self) -> &SpecMetadata {
        &self.metadata
    }

    /// Operations in declaration order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn get(&self, id: &str) -> Option<&Operation> {
        self.by_id.get(id).map(|&i| &self.operations[i])
    }

    /// Distinct tags in first-seen order.
    pub fn tags(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.operations
            .iter()
            .flat_map(|op| op.tags.iter())
            .filter(|t| seen.insert(t.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Every operation carrying any of `tags`, once, in catalog order.
    pub fn find_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> Vec<&Operation> {
        self.operations
            .iter()
            .filter(|op| tags.iter().any(|t| op.has_tag(t.as_ref())))
            .collect()
    }

    /// Operations for the given ids in request order; unknown ids are dropped.
    pub fn find_by_ids<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&Operation> {
        let mut seen = HashSet::new();
        ids.iter()
            .filter_map(|id| self.get(id.as_ref()))
            .filter(|op| seen.insert(op.id.as_str()))
            .collect()
    }

    /// First match of: exact id, case-insensitive id, summary substring, path substring.
    pub fn fuzzy_find(&self, query: &str) -> Option<&Operation> {
        if let Some(op) = self.get(query) {
            return Some(op);
        }
        let needle = query.to_lowercase();
        self.operations
            .iter()
            .find(|op| op.id.to_lowercase() == needle)
            .or_else(|| {
                self.operations.iter().find(|op| {
                    op.summary
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                })
            })
            .or_else(|| {
                self.operations
                    .iter()
                    .find(|op| op.path.to_lowercase().contains(&needle))
            })
    }
}
