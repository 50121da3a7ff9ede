//! Column descriptions of a CSVW table schema.

use serde::{Deserialize, Serialize};

use crate::inference::UnitBinding;

/// Name of the synthetic row identifier column.
pub const GID: &str = "GID";

/// Reference to a node by IRI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    #[serde(rename = "@id")]
    pub id: String,
}

/// A unit attached to a column or value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRef {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub unit_type: String,
}

impl From<UnitBinding> for UnitRef {
    fn from(binding: UnitBinding) -> Self {
        Self {
            id: binding.id,
            unit_type: binding.unit_type,
        }
    }
}

/// The generated identifier column every table starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierColumn {
    pub name: String,
    pub titles: Vec<String>,
    pub datatype: String,
    pub required: bool,
    #[serde(rename = "suppressOutput")]
    pub suppress_output: bool,
    #[serde(rename = "@type")]
    pub column_type: String,
}

impl IdentifierColumn {
    pub fn gid() -> Self {
        Self {
            name: GID.to_string(),
            titles: vec![GID.to_string(), "Generic Identifier".to_string()],
            datatype: "string".to_string(),
            required: true,
            suppress_output: true,
            column_type: "Column".to_string(),
        }
    }
}

/// A column read from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataColumn {
    /// Header cells top to bottom, then the derived name.
    pub titles: Vec<String>,
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "qudt:unit", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<UnitRef>,
    #[serde(rename = "@type")]
    pub types: Vec<String>,
    /// Datatype inferred from a sample cell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<IdRef>,
}

impl DataColumn {
    pub fn new(name: impl Into<String>, titles: Vec<String>) -> Self {
        let name = name.into();
        let mut titles = titles;
        titles.push(name.clone());
        Self {
            titles,
            id: name.clone(),
            name,
            unit: None,
            types: vec!["Column".to_string()],
            format: None,
        }
    }

    /// Attach a unit; the column then also describes quantity values.
    pub fn with_unit(mut self, unit: UnitRef) -> Self {
        self.unit = Some(unit);
        self.types = vec!["Column".to_string(), "qudt:QuantityValue".to_string()];
        self
    }

    pub fn with_format(mut self, datatype_iri: impl Into<String>) -> Self {
        self.format = Some(IdRef {
            id: datatype_iri.into(),
        });
        self
    }

    pub fn is_quantity(&self) -> bool {
        self.unit.is_some()
    }
}

/// Any column of a table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Column {
    Identifier(IdentifierColumn),
    Data(DataColumn),
}

impl Column {
    pub fn name(&self) -> &str {
        match self {
            Column::Identifier(c) => &c.name,
            Column::Data(c) => &c.name,
        }
    }

    pub fn as_data(&self) -> Option<&DataColumn> {
        match self {
            Column::Data(c) => Some(c),
            Column::Identifier(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gid_column_json() {
        let value = serde_json::to_value(Column::Identifier(IdentifierColumn::gid())).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "GID",
                "titles": ["GID", "Generic Identifier"],
                "datatype": "string",
                "required": true,
                "suppressOutput": true,
                "@type": "Column"
            })
        );
    }

    #[test]
    fn test_quantity_column_json() {
        let column = DataColumn::new("TempC", vec!["Temp [°C]".to_string()])
            .with_unit(UnitRef {
                id: "http://qudt.org/vocab/unit/DEG_C".to_string(),
                unit_type: "http://qudt.org/schema/qudt/Unit".to_string(),
            })
            .with_format("http://www.w3.org/2001/XMLSchema#integer");
        let value = serde_json::to_value(&column).unwrap();
        assert_eq!(value["titles"], json!(["Temp [°C]", "TempC"]));
        assert_eq!(value["@type"], json!(["Column", "qudt:QuantityValue"]));
        assert_eq!(value["qudt:unit"]["@id"], "http://qudt.org/vocab/unit/DEG_C");
        assert_eq!(value["format"]["@id"], "http://www.w3.org/2001/XMLSchema#integer");
    }

    #[test]
    fn test_untagged_columns_read_back() {
        let columns: Vec<Column> = serde_json::from_value(json!([
            {"name": "GID", "titles": ["GID"], "datatype": "string", "required": true,
             "suppressOutput": true, "@type": "Column"},
            {"titles": ["a", "A"], "@id": "A", "name": "A", "@type": ["Column"]}
        ]))
        .unwrap();
        assert!(matches!(columns[0], Column::Identifier(_)));
        assert_eq!(columns[1].as_data().map(|c| c.name.as_str()), Some("A"));
    }
}
