//! The annotated JSON-LD document and its annotation nodes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::column::UnitRef;
use super::table::Table;

/// CSVW vocabulary IRI, the first `@context` entry.
pub const CSVW_CONTEXT: &str = "http://www.w3.org/ns/csvw";

/// Prefixes declared in the `@context`.
const PREFIXES: &[(&str, &str)] = &[
    ("oa", "http://www.w3.org/ns/oa#"),
    ("label", "http://www.w3.org/2000/01/rdf-schema#label"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("qudt", "http://qudt.org/schema/qudt/"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("prov", "http://www.w3.org/ns/prov#"),
];

// =============================================================================
// CONTEXT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextEntry {
    Iri(String),
    Prefixes(IndexMap<String, String>),
}

/// JSON-LD `@context`: the CSVW vocabulary plus prefix declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(pub Vec<ContextEntry>);

impl Default for Context {
    fn default() -> Self {
        let prefixes = PREFIXES
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Context(vec![
            ContextEntry::Iri(CSVW_CONTEXT.to_string()),
            ContextEntry::Prefixes(prefixes),
        ])
    }
}

// =============================================================================
// ANNOTATION NODES
// =============================================================================

/// A JSON-LD value with an explicit datatype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedLiteral {
    #[serde(rename = "@value")]
    pub value: serde_json::Value,
    #[serde(rename = "@type")]
    pub datatype: String,
}

impl TypedLiteral {
    pub fn new(value: impl Into<serde_json::Value>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: datatype.into(),
        }
    }
}

/// A numeric, boolean or temporal value with an optional unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityValue {
    #[serde(rename = "qudt:value")]
    pub value: TypedLiteral,
    #[serde(rename = "qudt:unit", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<UnitRef>,
}

/// Free text attached as a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextualBody {
    #[serde(rename = "oa:purpose")]
    pub purpose: String,
    #[serde(rename = "oa:format")]
    pub format: String,
    #[serde(rename = "oa:value")]
    pub value: String,
}

impl TextualBody {
    pub fn tag(value: impl Into<String>) -> Self {
        Self {
            purpose: "oa:tagging".to_string(),
            format: "text/plain".to_string(),
            value: value.into(),
        }
    }
}

/// One `oa:hasBody` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum Body {
    #[serde(rename = "qudt:QuantityValue")]
    Quantity(QuantityValue),
    #[serde(rename = "oa:TextualBody")]
    Textual(TextualBody),
}

impl Body {
    pub fn is_quantity(&self) -> bool {
        matches!(self, Body::Quantity(_))
    }

    pub fn as_quantity(&self) -> Option<&QuantityValue> {
        match self {
            Body::Quantity(q) => Some(q),
            Body::Textual(_) => None,
        }
    }
}

/// One parameter line of a meta region as an `oa:Annotation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "@id")]
    pub id: String,
    pub label: String,
    #[serde(rename = "@type")]
    pub note_type: String,
    /// File line the parameter was read from.
    pub rownum: TypedLiteral,
    #[serde(rename = "oa:hasBody")]
    pub bodies: Vec<Body>,
}

impl Note {
    pub fn new(id: impl Into<String>, label: impl Into<String>, row: usize) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            note_type: "oa:Annotation".to_string(),
            rownum: TypedLiteral::new(row, "xsd:integer"),
            bodies: Vec::new(),
        }
    }

    /// The file line as a number.
    pub fn row(&self) -> Option<u64> {
        self.rownum.value.as_u64()
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// Output of one `process` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    #[serde(rename = "@context")]
    pub context: Context,
    #[serde(rename = "@id")]
    pub id: String,
    pub url: String,
    pub notes: Vec<Note>,
    pub tables: Vec<Table>,
}

impl AnnotatedDocument {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            context: Context::default(),
            id: String::new(),
            url: url.into(),
            notes: Vec::new(),
            tables: Vec::new(),
        }
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A document plus the file name it should be stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// `<stem>-metadata.json`.
    pub filename: String,
    #[serde(rename = "filedata")]
    pub document: AnnotatedDocument,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_json() {
        let value = serde_json::to_value(Context::default()).unwrap();
        assert_eq!(value[0], "http://www.w3.org/ns/csvw");
        assert_eq!(value[1]["qudt"], "http://qudt.org/schema/qudt/");
        assert_eq!(value[1]["oa"], "http://www.w3.org/ns/oa#");
    }

    #[test]
    fn test_note_json() {
        let mut note = Note::new("Operator0", "Operator", 0);
        note.bodies.push(Body::Textual(TextualBody::tag("Jane Doe")));
        note.bodies.push(Body::Quantity(QuantityValue {
            value: TypedLiteral::new(5, "http://www.w3.org/2001/XMLSchema#integer"),
            unit: None,
        }));

        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["@type"], "oa:Annotation");
        assert_eq!(value["rownum"], json!({"@value": 0, "@type": "xsd:integer"}));
        assert_eq!(
            value["oa:hasBody"][0],
            json!({
                "@type": "oa:TextualBody",
                "oa:purpose": "oa:tagging",
                "oa:format": "text/plain",
                "oa:value": "Jane Doe"
            })
        );
        assert_eq!(value["oa:hasBody"][1]["@type"], "qudt:QuantityValue");
        assert!(value["oa:hasBody"][1].get("qudt:unit").is_none());
        assert_eq!(note.row(), Some(0));
    }

    #[test]
    fn test_document_round_trip() {
        let doc = AnnotatedDocument::new("file:///tmp/run.csv");
        let text = doc.to_json_pretty().unwrap();
        let back: AnnotatedDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(back, doc);
        assert!(text.contains("\"@id\": \"\""));
    }
}
