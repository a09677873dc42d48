//! Trigger strings and replacements driving the legacy rewrites.

/// A file is a migration candidate when its text contains any of these.
pub const FILE_INDICATORS: &[&str] = &[
    "processxml.do",
    "xmldata",
    "application/x-www-form-urlencoded",
    "JAXB",
    "XPath",
    "dom4j",
    "XMLStreamReader",
    "DocumentBuilder",
];

/// A routine annotation mentioning one of these marks a legacy call site.
pub const ROUTINE_ANNOTATION_TRIGGERS: &[&str] = &[
    "application/x-www-form-urlencoded",
    "text/xml",
    "APPLICATION_FORM_URLENCODED",
    "TEXT_XML",
];

/// A routine whose text mentions one of these is a legacy call site.
pub const ROUTINE_TEXT_TRIGGERS: &[&str] = &[
    "xmldata",
    "processxml",
    "marshal",
    "unmarshal",
    "XPath",
    "Document",
    "Element",
];

/// Imports whose (lower-cased) name contains one of these are removed.
pub const LEGACY_IMPORT_FRAGMENTS: &[&str] = &["jaxb", "dom4j", "javax.xml", "org.w3c.dom"];

/// Imports added to every rewritten file.
pub const REPLACEMENT_IMPORTS: &[&str] = &[
    "com.fasterxml.jackson.databind.ObjectMapper",
    "org.springframework.http.MediaType",
    "reactor.core.publisher.Mono",
];

/// Added when a parameter was retyped to [`STRUCTURED_TYPE`].
pub const STRUCTURED_TYPE_IMPORT: &str = "java.util.Map";

/// Route annotations whose content negotiation is switched to JSON.
pub const ROUTE_ANNOTATIONS: &[&str] = &["RequestMapping", "PostMapping", "PutMapping", "PatchMapping"];

/// Content negotiation keys rewritten on route annotations.
pub const NEGOTIATION_KEYS: &[&str] = &["consumes", "produces"];

pub const JSON_MEDIA_TYPE: &str = "\"application/json\"";

/// Parameter types (as whole identifiers) replaced by [`STRUCTURED_TYPE`].
pub const RAW_DOCUMENT_TYPES: &[&str] = &["Document", "Element"];

pub const STRUCTURED_TYPE: &str = "Map<String, Object>";

/// Calls rewritten to `objectMapper.writeValueAsString(..)`.
pub const LEGACY_CALLS: &[&str] = &["processXml", "marshal", "unmarshal"];

pub const ENCODER_RECEIVER: &str = "objectMapper";
pub const ENCODER_CALL: &str = "writeValueAsString";

/// Words ignored when comparing operation summaries.
pub const SUMMARY_STOPWORDS: &[&str] = &[
    "a", "an", "and", "by", "for", "from", "in", "of", "on", "or", "the", "to", "with",
];

/// Minimum shared significant summary words for a correlation.
pub const MIN_SHARED_SUMMARY_WORDS: usize = 2;

pub fn is_candidate_file(content: &str) -> bool {
    FILE_INDICATORS.iter().any(|i| content.contains(i))
}

pub fn is_legacy_import(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    LEGACY_IMPORT_FRAGMENTS.iter().any(|f| lowered.contains(f))
}

/// Whether a parameter type mentions a raw document type as an identifier.
pub fn is_raw_document_type(ty: &str) -> bool {
    ty.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|word| RAW_DOCUMENT_TYPES.contains(&word))
}
