//! Measurement unit recognition against a read-only unit vocabulary.
//!
//! The engine only sees the [`UnitLookup`] trait. [`UnitIndex`] is the
//! concrete index: a table of common QUDT units, optionally extended from a
//! JSON export or a QUDT Turtle file at process start.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use csvw_annotator::{UnitIndex, UnitResolver};
//!
//! let resolver = UnitResolver::new(Arc::new(UnitIndex::new()));
//! let binding = resolver.resolve("[°C]").unwrap();
//! assert_eq!(binding.id, "http://qudt.org/vocab/unit/DEG_C");
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AnnotatorError, Result};

/// Namespace of QUDT unit individuals.
pub const QUDT_UNIT_NS: &str = "http://qudt.org/vocab/unit/";
/// Namespace of the QUDT schema.
pub const QUDT_SCHEMA_NS: &str = "http://qudt.org/schema/qudt/";
/// The dimensionless count unit.
pub const NUM_UNIT: &str = "http://qudt.org/vocab/unit/NUM";

static GLOBAL_INDEX: OnceCell<Arc<UnitIndex>> = OnceCell::new();

static QUOTED_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).unwrap());

// =============================================================================
// TYPES
// =============================================================================

/// A token bound to a unit entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitBinding {
    /// Entity IRI (e.g. "http://qudt.org/vocab/unit/MegaPA").
    pub id: String,
    /// Ontology type of the entity.
    #[serde(rename = "type")]
    pub unit_type: String,
}

impl UnitBinding {
    /// Whether this is the count unit, whose token is a plain number.
    pub fn is_count(&self) -> bool {
        self.id == NUM_UNIT
    }
}

/// Read-only unit query contract.
///
/// Implementations are shared between concurrent `process` calls and must
/// answer without mutation.
pub trait UnitLookup: Send + Sync {
    /// The first entity whose symbol or UCUM code equals `token` exactly.
    fn find(&self, token: &str) -> Option<UnitBinding>;
}

/// A unit entity with its literal spellings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitEntity {
    pub id: String,
    #[serde(rename = "type", default = "default_unit_type")]
    pub unit_type: String,
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub ucum_codes: Vec<String>,
}

fn default_unit_type() -> String {
    format!("{}Unit", QUDT_SCHEMA_NS)
}

impl UnitEntity {
    /// A QUDT unit by its local name.
    pub fn qudt(local_name: &str) -> Self {
        Self {
            id: format!("{}{}", QUDT_UNIT_NS, local_name),
            unit_type: default_unit_type(),
            symbols: Vec::new(),
            ucum_codes: Vec::new(),
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbols.push(symbol.into());
        self
    }

    pub fn with_ucum(mut self, code: impl Into<String>) -> Self {
        self.ucum_codes.push(code.into());
        self
    }

    fn binding(&self) -> UnitBinding {
        UnitBinding {
            id: self.id.clone(),
            unit_type: self.unit_type.clone(),
        }
    }
}

/// Statistics about loaded unit data.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UnitIndexStats {
    pub total_units: usize,
    pub symbol_count: usize,
    pub ucum_count: usize,
    /// Data sources, in load order.
    pub sources: Vec<String>,
}

// =============================================================================
// INDEX
// =============================================================================

/// Exact-match index over unit symbols and UCUM codes.
#[derive(Debug, Clone, Default)]
pub struct UnitIndex {
    units: Vec<UnitEntity>,
    by_symbol: HashMap<String, usize>,
    by_ucum: HashMap<String, usize>,
    sources: Vec<String>,
}

impl UnitIndex {
    /// Index with the built-in common units.
    pub fn new() -> Self {
        let mut index = Self::empty();
        index.load_common_units();
        index.sources.push("built-in".to_string());
        index
    }

    /// Index without any units.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Install the process-wide index. Only the first call takes effect.
    pub fn install_global(index: UnitIndex) -> Arc<UnitIndex> {
        let mut installed = false;
        let shared = GLOBAL_INDEX
            .get_or_init(|| {
                installed = true;
                Arc::new(index)
            })
            .clone();
        if !installed {
            debug!("unit index already installed, keeping the first one");
        }
        shared
    }

    /// The process-wide index, if installed.
    pub fn global() -> Option<Arc<UnitIndex>> {
        GLOBAL_INDEX.get().cloned()
    }

    /// Add a unit. Spellings already taken by an earlier unit stay bound to it.
    pub fn add_unit(&mut self, unit: UnitEntity) {
        let slot = self.units.len();
        for symbol in &unit.symbols {
            self.by_symbol.entry(symbol.clone()).or_insert(slot);
        }
        for code in &unit.ucum_codes {
            self.by_ucum.entry(code.clone()).or_insert(slot);
        }
        self.units.push(unit);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn stats(&self) -> UnitIndexStats {
        UnitIndexStats {
            total_units: self.units.len(),
            symbol_count: self.by_symbol.len(),
            ucum_count: self.by_ucum.len(),
            sources: self.sources.clone(),
        }
    }

    /// Load a file, choosing the format by extension (`.ttl` or JSON).
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| AnnotatorError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_turtle = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ttl"));
        let loaded = if is_turtle {
            self.load_turtle_str(&content)
        } else {
            self.load_json_str(&content)?
        };

        self.sources.push(path.display().to_string());
        info!(path = %path.display(), units = loaded, "loaded unit vocabulary");
        Ok(loaded)
    }

    /// Load a JSON array of [`UnitEntity`] records.
    pub fn load_json_str(&mut self, json: &str) -> Result<usize> {
        let units: Vec<UnitEntity> = serde_json::from_str(json)?;
        let count = units.len();
        for unit in units {
            self.add_unit(unit);
        }
        Ok(count)
    }

    /// Load unit subjects from QUDT Turtle.
    ///
    /// This is a line-oriented reader for the layout QUDT publishes: one
    /// subject per block, one predicate per line, blocks terminated by `.`.
    /// Only `rdf:type`, `qudt:symbol` and `qudt:ucumCode` are read; subjects
    /// with neither spelling are skipped.
    pub fn load_turtle_str(&mut self, turtle: &str) -> usize {
        let mut prefixes: HashMap<String, String> = HashMap::new();
        let mut current: Option<UnitEntity> = None;
        let mut loaded = 0;

        for raw in turtle.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(rest) = line
                .strip_prefix("@prefix")
                .or_else(|| line.strip_prefix("PREFIX"))
            {
                if let Some((name, iri)) = parse_prefix(rest) {
                    prefixes.insert(name, iri);
                }
                continue;
            }

            let terminated = line == "." || line.ends_with(" .");
            let statement = if terminated {
                line[..line.len() - 1].trim_end()
            } else {
                line
            };
            let statement = statement.trim_end_matches(';').trim_end();

            if !statement.is_empty() {
                if raw.starts_with(char::is_whitespace) {
                    if let Some(unit) = current.as_mut() {
                        read_predicate(unit, statement, &prefixes);
                    }
                } else {
                    loaded += self.finish_subject(current.take());
                    let (subject, rest) = split_first_token(statement);
                    let mut unit = UnitEntity {
                        id: expand(subject, &prefixes),
                        unit_type: String::new(),
                        symbols: Vec::new(),
                        ucum_codes: Vec::new(),
                    };
                    if !rest.is_empty() {
                        read_predicate(&mut unit, rest, &prefixes);
                    }
                    current = Some(unit);
                }
            }

            if terminated {
                loaded += self.finish_subject(current.take());
            }
        }
        loaded += self.finish_subject(current.take());

        loaded
    }

    fn finish_subject(&mut self, unit: Option<UnitEntity>) -> usize {
        match unit {
            Some(mut unit) if !unit.symbols.is_empty() || !unit.ucum_codes.is_empty() => {
                if unit.unit_type.is_empty() {
                    unit.unit_type = default_unit_type();
                }
                self.add_unit(unit);
                1
            }
            _ => 0,
        }
    }

    // =========================================================================
    // BUILT-IN UNITS
    // =========================================================================

    fn load_common_units(&mut self) {
        let common: &[(&str, &[&str], &[&str])] = &[
            // temperature
            ("DEG_C", &["°C"], &["Cel"]),
            ("K", &["K"], &["K"]),
            ("DEG_F", &["°F"], &["[degF]"]),
            // length
            ("M", &["m"], &["m"]),
            ("MilliM", &["mm"], &["mm"]),
            ("CentiM", &["cm"], &["cm"]),
            ("KiloM", &["km"], &["km"]),
            ("MicroM", &["µm", "μm"], &["um"]),
            // time
            ("SEC", &["s"], &["s"]),
            ("MIN", &["min"], &["min"]),
            ("HR", &["h", "hr"], &["h"]),
            ("DAY", &["d", "day"], &["d"]),
            // speed
            ("M-PER-SEC", &["m/s"], &["m.s-1", "m/s"]),
            ("KiloM-PER-HR", &["km/h"], &["km.h-1", "km/h"]),
            ("MilliM-PER-MIN", &["mm/min"], &["mm.min-1", "mm/min"]),
            // pressure and stress
            ("PA", &["Pa"], &["Pa"]),
            ("KiloPA", &["kPa"], &["kPa"]),
            ("MegaPA", &["MPa"], &["MPa"]),
            ("GigaPA", &["GPa"], &["GPa"]),
            ("BAR", &["bar"], &["bar"]),
            ("N-PER-MilliM2", &["N/mm²"], &["N.mm-2"]),
            // force, torque, energy, power
            ("N", &["N"], &["N"]),
            ("KiloN", &["kN"], &["kN"]),
            ("N-M", &["N⋅m", "N·m"], &["N.m"]),
            ("J", &["J"], &["J"]),
            ("KiloJ", &["kJ"], &["kJ"]),
            ("W", &["W"], &["W"]),
            ("KiloW", &["kW"], &["kW"]),
            // electrical
            ("V", &["V"], &["V"]),
            ("A", &["A"], &["A"]),
            ("MilliA", &["mA"], &["mA"]),
            ("OHM", &["Ω"], &["Ohm"]),
            ("HZ", &["Hz"], &["Hz"]),
            // mass
            ("KiloGM", &["kg"], &["kg"]),
            ("GM", &["g"], &["g"]),
            ("MilliGM", &["mg"], &["mg"]),
            ("TONNE", &["t"], &["t"]),
            // volume and area
            ("L", &["L", "l"], &["L", "l"]),
            ("MilliL", &["mL", "ml"], &["mL"]),
            ("M2", &["m²"], &["m2"]),
            ("MilliM2", &["mm²"], &["mm2"]),
            ("M3", &["m³"], &["m3"]),
            ("KiloGM-PER-M3", &["kg/m³"], &["kg.m-3"]),
            // dimensionless and angles
            ("PERCENT", &["%"], &["%"]),
            ("NUM", &["#"], &["1"]),
            ("DEG", &["°"], &["deg"]),
            ("RAD", &["rad"], &["rad"]),
            ("MOL", &["mol"], &["mol"]),
        ];

        for (local_name, symbols, codes) in common {
            let mut unit = UnitEntity::qudt(local_name);
            unit.symbols = symbols.iter().map(|s| s.to_string()).collect();
            unit.ucum_codes = codes.iter().map(|s| s.to_string()).collect();
            self.add_unit(unit);
        }
    }
}

impl UnitLookup for UnitIndex {
    fn find(&self, token: &str) -> Option<UnitBinding> {
        self.by_symbol
            .get(token)
            .or_else(|| self.by_ucum.get(token))
            .and_then(|&slot| self.units.get(slot))
            .map(UnitEntity::binding)
    }
}

fn parse_prefix(rest: &str) -> Option<(String, String)> {
    let rest = rest.trim().trim_end_matches('.').trim();
    let (name, iri) = rest.split_once(char::is_whitespace)?;
    let iri = iri.trim().strip_prefix('<')?.strip_suffix('>')?;
    Some((name.trim_end_matches(':').to_string(), iri.to_string()))
}

fn split_first_token(statement: &str) -> (&str, &str) {
    match statement.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (statement, ""),
    }
}

/// Expand `<iri>` or `prefix:local` to a full IRI.
fn expand(term: &str, prefixes: &HashMap<String, String>) -> String {
    if let Some(iri) = term.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return iri.to_string();
    }
    match term.split_once(':') {
        Some((prefix, local)) => match prefixes.get(prefix) {
            Some(ns) => format!("{}{}", ns, local),
            None => term.to_string(),
        },
        None => term.to_string(),
    }
}

fn read_predicate(unit: &mut UnitEntity, statement: &str, prefixes: &HashMap<String, String>) {
    let (predicate, objects) = split_first_token(statement);
    let predicate = if predicate == "a" {
        "http://www.w3.org/1999/02/22-rdf-syntax-ns#type".to_string()
    } else {
        expand(predicate, prefixes)
    };

    match predicate.as_str() {
        "http://www.w3.org/1999/02/22-rdf-syntax-ns#type" => {
            if unit.unit_type.is_empty() {
                if let Some(first) = objects.split(',').next() {
                    unit.unit_type = expand(first.trim(), prefixes);
                }
            }
        }
        p if p == format!("{}symbol", QUDT_SCHEMA_NS) => {
            unit.symbols.extend(literals(objects));
        }
        p if p == format!("{}ucumCode", QUDT_SCHEMA_NS) => {
            unit.ucum_codes.extend(literals(objects));
        }
        _ => {}
    }
}

fn literals(objects: &str) -> impl Iterator<Item = String> + '_ {
    QUOTED_LITERAL
        .captures_iter(objects)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().replace("\\\"", "\""))
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Token normalization in front of a [`UnitLookup`].
///
/// Tokens are probed speculatively on nearly every word, so a miss is the
/// normal outcome and never an error.
#[derive(Clone)]
pub struct UnitResolver {
    lookup: Arc<dyn UnitLookup>,
}

impl std::fmt::Debug for UnitResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitResolver").finish_non_exhaustive()
    }
}

impl UnitResolver {
    pub fn new(lookup: Arc<dyn UnitLookup>) -> Self {
        Self { lookup }
    }

    /// Resolve a raw token, e.g. `"[°C]"` or `"(N/mm²)"`.
    pub fn resolve(&self, token: &str) -> Option<UnitBinding> {
        let stripped = strip_token(token);
        if stripped.is_empty() {
            return None;
        }
        let normalized = normalize_token(stripped);
        self.lookup
            .find(&normalized)
            .or_else(|| (normalized != stripped).then(|| self.lookup.find(stripped)).flatten())
    }

    /// First unit among the space-separated words of `text`.
    pub fn resolve_in(&self, text: &str) -> Option<UnitBinding> {
        text.split(' ').find_map(|part| self.resolve(part))
    }
}

fn strip_token(token: &str) -> &str {
    token.trim_matches(|c| matches!(c, ' ' | '[' | ']' | '(' | ')' | ':'))
}

/// Superscripts to plain digits, `°C` to `Cel`, then whole-token aliases.
pub fn normalize_token(token: &str) -> String {
    let mut normalized = String::with_capacity(token.len());
    for c in token.chars() {
        match c {
            '¹' => {}
            '²' => normalized.push('2'),
            '³' => normalized.push('3'),
            '⁴' => normalized.push('4'),
            '⁵' => normalized.push('5'),
            '⁶' => normalized.push('6'),
            '⁷' => normalized.push('7'),
            '⁸' => normalized.push('8'),
            '⁹' => normalized.push('9'),
            '⁰' => normalized.push('0'),
            c => normalized.push(c),
        }
    }
    let normalized = normalized.replace("°C", "Cel");

    match normalized.as_str() {
        "N/mm2" => "MPa".to_string(),
        "Nm" => "N.m".to_string(),
        "sec" => "s".to_string(),
        _ => normalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> UnitResolver {
        UnitResolver::new(Arc::new(UnitIndex::new()))
    }

    #[test]
    fn test_builtin_symbols() {
        let index = UnitIndex::new();
        assert_eq!(index.find("MPa").unwrap().id, "http://qudt.org/vocab/unit/MegaPA");
        assert_eq!(index.find("m/s").unwrap().id, "http://qudt.org/vocab/unit/M-PER-SEC");
        assert_eq!(index.find("Cel").unwrap().id, "http://qudt.org/vocab/unit/DEG_C");
        assert!(index.find("Operator").is_none());
        assert_eq!(index.find("kg").unwrap().unit_type, "http://qudt.org/schema/qudt/Unit");
    }

    #[test]
    fn test_resolve_strips_brackets() {
        let r = resolver();
        assert_eq!(r.resolve("[°C]").unwrap().id, "http://qudt.org/vocab/unit/DEG_C");
        assert_eq!(r.resolve("(mm):").unwrap().id, "http://qudt.org/vocab/unit/MilliM");
        assert!(r.resolve("[]").is_none());
    }

    #[test]
    fn test_resolve_aliases() {
        let r = resolver();
        assert_eq!(r.resolve("N/mm²").unwrap().id, "http://qudt.org/vocab/unit/MegaPA");
        assert_eq!(r.resolve("N/mm2").unwrap().id, "http://qudt.org/vocab/unit/MegaPA");
        assert_eq!(r.resolve("Nm").unwrap().id, "http://qudt.org/vocab/unit/N-M");
        assert_eq!(r.resolve("sec").unwrap().id, "http://qudt.org/vocab/unit/SEC");
        assert_eq!(r.resolve("mm²").unwrap().id, "http://qudt.org/vocab/unit/MilliM2");
    }

    #[test]
    fn test_aliases_are_whole_token() {
        assert_eq!(normalize_token("second"), "second");
        assert_eq!(normalize_token("m³"), "m3");
    }

    #[test]
    fn test_resolve_in_text() {
        let r = resolver();
        assert_eq!(
            r.resolve_in("Speed [m/s]").unwrap().id,
            "http://qudt.org/vocab/unit/M-PER-SEC"
        );
        assert!(r.resolve_in("Jane Doe").is_none());
    }

    #[test]
    fn test_count_unit() {
        let binding = UnitIndex::new().find("1").unwrap();
        assert!(binding.is_count());
    }

    #[test]
    fn test_first_loaded_wins() {
        let mut index = UnitIndex::empty();
        index.add_unit(UnitEntity::qudt("FIRST").with_symbol("x"));
        index.add_unit(UnitEntity::qudt("SECOND").with_symbol("x").with_ucum("y"));
        assert_eq!(index.find("x").unwrap().id, "http://qudt.org/vocab/unit/FIRST");
        assert_eq!(index.find("y").unwrap().id, "http://qudt.org/vocab/unit/SECOND");
    }

    #[test]
    fn test_load_json() {
        let mut index = UnitIndex::empty();
        let json = r#"[{"id": "http://example.org/unit/FURLONG", "symbols": ["fur"]}]"#;
        assert_eq!(index.load_json_str(json).unwrap(), 1);
        let binding = index.find("fur").unwrap();
        assert_eq!(binding.unit_type, "http://qudt.org/schema/qudt/Unit");
    }

    #[test]
    fn test_load_turtle() {
        let turtle = r#"
@prefix qudt: <http://qudt.org/schema/qudt/> .
@prefix unit: <http://qudt.org/vocab/unit/> .

unit:KiloPA
  a qudt:DerivedUnit, qudt:Unit ;
  qudt:symbol "kPa" ;
  qudt:ucumCode "kPa"^^qudt:UCUMcs ;
  rdfs:label "Kilopascal"@en ;
.
unit:LB a qudt:Unit ;
  qudt:ucumCode "[lb_av]"^^qudt:UCUMcs .
unit:NOSPELLING
  a qudt:Unit ;
.
"#;
        let mut index = UnitIndex::empty();
        assert_eq!(index.load_turtle_str(turtle), 2);
        let binding = index.find("kPa").unwrap();
        assert_eq!(binding.id, "http://qudt.org/vocab/unit/KiloPA");
        assert_eq!(binding.unit_type, "http://qudt.org/schema/qudt/DerivedUnit");
        assert_eq!(index.find("[lb_av]").unwrap().id, "http://qudt.org/vocab/unit/LB");
    }

    #[test]
    fn test_stats() {
        let stats = UnitIndex::new().stats();
        assert!(stats.total_units > 40);
        assert_eq!(stats.sources, vec!["built-in".to_string()]);
    }
}
