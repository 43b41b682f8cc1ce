//! Static triage configuration
//!
//! Categories, symptom detail flows and the facility table are loaded once at
//! startup and shared read-only by every session. Loading validates the whole
//! catalog; a process must not handle events with a partial catalog.

use crate::triage::Urgency;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Menu text that finishes the triage; no category or symptom may use it
pub const FINISH_LABEL: &str = "Finish";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("No categories defined")]
    NoCategories,
    #[error("Category {0} has no symptoms")]
    EmptyCategory(String),
    #[error("Category {category} lists undefined symptom {symptom}")]
    UndefinedSymptom { category: String, symptom: String },
    #[error("Name {0} is reserved for the finish button")]
    ReservedName(String),
    #[error("Symptom {0} has an empty label")]
    EmptyLabel(String),
    #[error("Symptom {symptom} repeats field {field_id}")]
    DuplicateField { symptom: String, field_id: String },
    #[error("Step {field_id} of symptom {symptom} has no options")]
    NoOptions { symptom: String, field_id: String },
    #[error("Unknown urgency key {0} in facility table")]
    UnknownUrgency(String),
    #[error("{0} contains the reserved payload separator")]
    ReservedCharacter(String),
    #[error("Callback payload for {symptom}/{field_id} is {len} bytes (limit {limit})")]
    PayloadTooLong {
        symptom: String,
        field_id: String,
        len: usize,
        limit: usize,
    },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// One selectable answer of a detail step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    pub label: String,
    pub value: String,
}

/// One question in a symptom's detail flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailStep {
    pub field_id: String,
    pub question: String,
    pub options: Vec<ChoiceOption>,
}

impl DetailStep {
    pub fn has_value(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymptomDefinition {
    pub name: String,
    pub label: String,
    /// Ordered; the navigator always asks the first unanswered step
    pub flow: Vec<DetailStep>,
}

impl SymptomDefinition {
    pub fn step(&self, field_id: &str) -> Option<&DetailStep> {
        self.flow.iter().find(|s| s.field_id == field_id)
    }
}

/// A body system and the symptoms offered under it, in menu order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDefinition {
    pub name: String,
    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FacilityEntry {
    pub name: String,
    pub address: String,
    pub hours: String,
    pub map_url: String,
}

/// Urgency tag -> facilities, in declared order
#[derive(Debug, Clone, Default)]
pub struct FacilityTable {
    entries: HashMap<Urgency, Vec<FacilityEntry>>,
}

impl FacilityTable {
    pub fn new(entries: HashMap<Urgency, Vec<FacilityEntry>>) -> Self {
        Self { entries }
    }

    pub fn get(&self, urgency: Urgency) -> &[FacilityEntry] {
        self.entries.get(&urgency).map_or(&[], Vec::as_slice)
    }

    /// Parse the facility file. Keys must be recognized urgency tags.
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let raw: HashMap<String, Vec<FacilityEntry>> =
            serde_json::from_str(json).map_err(|source| CatalogError::Parse {
                what: "facility table",
                source,
            })?;

        let mut entries = HashMap::new();
        for (key, facilities) in raw {
            let urgency = Urgency::from_tag(&key)
                .filter(|u| *u != Urgency::SelfCare)
                .ok_or(CatalogError::UnknownUrgency(key))?;
            entries.insert(urgency, facilities);
        }
        Ok(Self::new(entries))
    }
}

// Wire shapes of the symptom file

#[derive(Debug, Deserialize)]
struct RawSymptomFile {
    categories: Map<String, Value>,
    symptoms: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawSymptom {
    label: String,
    #[serde(default)]
    flow: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    field_id: String,
    question: String,
    /// `[label, value]` pairs
    options: Vec<(String, String)>,
}

/// Immutable triage configuration
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<CategoryDefinition>,
    symptoms: HashMap<String, SymptomDefinition>,
    facilities: FacilityTable,
}

impl Catalog {
    /// Load and validate both configuration files
    pub fn load(symptoms_path: &Path, facilities_path: &Path) -> CatalogResult<Self> {
        let symptoms_json = read_file(symptoms_path)?;
        let facilities_json = read_file(facilities_path)?;
        Self::from_json(&symptoms_json, &facilities_json)
    }

    pub fn from_json(symptoms_json: &str, facilities_json: &str) -> CatalogResult<Self> {
        let parse = |source| CatalogError::Parse {
            what: "symptom configuration",
            source,
        };
        let raw: RawSymptomFile = serde_json::from_str(symptoms_json).map_err(parse)?;

        let mut categories = Vec::with_capacity(raw.categories.len());
        for (name, value) in raw.categories {
            let symptoms: Vec<String> = serde_json::from_value(value).map_err(parse)?;
            categories.push(CategoryDefinition { name, symptoms });
        }

        let mut symptoms = Vec::with_capacity(raw.symptoms.len());
        for (name, value) in raw.symptoms {
            let raw_symptom: RawSymptom = serde_json::from_value(value).map_err(parse)?;
            symptoms.push(SymptomDefinition {
                name,
                label: raw_symptom.label,
                flow: raw_symptom
                    .flow
                    .into_iter()
                    .map(|step| DetailStep {
                        field_id: step.field_id,
                        question: step.question,
                        options: step
                            .options
                            .into_iter()
                            .map(|(label, value)| ChoiceOption { label, value })
                            .collect(),
                    })
                    .collect(),
            });
        }

        let facilities = FacilityTable::from_json(facilities_json)?;
        Self::from_parts(categories, symptoms, facilities)
    }

    /// Build a catalog from already-typed definitions, validating it
    pub fn from_parts(
        categories: Vec<CategoryDefinition>,
        symptoms: Vec<SymptomDefinition>,
        facilities: FacilityTable,
    ) -> CatalogResult<Self> {
        if categories.is_empty() {
            return Err(CatalogError::NoCategories);
        }

        let symptoms: HashMap<String, SymptomDefinition> = symptoms
            .into_iter()
            .map(|s| (s.name.clone(), s))
            .collect();

        for symptom in symptoms.values() {
            validate_symptom(symptom)?;
        }

        for category in &categories {
            if category.name == FINISH_LABEL {
                return Err(CatalogError::ReservedName(category.name.clone()));
            }
            if category.symptoms.is_empty() {
                return Err(CatalogError::EmptyCategory(category.name.clone()));
            }
            if let Some(missing) = category
                .symptoms
                .iter()
                .find(|name| !symptoms.contains_key(*name))
            {
                return Err(CatalogError::UndefinedSymptom {
                    category: category.name.clone(),
                    symptom: missing.clone(),
                });
            }
        }

        Ok(Self {
            categories,
            symptoms,
            facilities,
        })
    }

    pub fn categories(&self) -> &[CategoryDefinition] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&CategoryDefinition> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn symptom(&self, name: &str) -> Option<&SymptomDefinition> {
        self.symptoms.get(name)
    }

    pub fn symptoms(&self) -> impl Iterator<Item = &SymptomDefinition> {
        self.symptoms.values()
    }

    pub fn facilities(&self) -> &FacilityTable {
        &self.facilities
    }
}

fn validate_symptom(symptom: &SymptomDefinition) -> CatalogResult<()> {
    if symptom.name == FINISH_LABEL {
        return Err(CatalogError::ReservedName(symptom.name.clone()));
    }
    if symptom.label.trim().is_empty() {
        return Err(CatalogError::EmptyLabel(symptom.name.clone()));
    }

    let mut seen = HashSet::new();
    for step in &symptom.flow {
        if !seen.insert(step.field_id.as_str()) {
            return Err(CatalogError::DuplicateField {
                symptom: symptom.name.clone(),
                field_id: step.field_id.clone(),
            });
        }
        if step.options.is_empty() {
            return Err(CatalogError::NoOptions {
                symptom: symptom.name.clone(),
                field_id: step.field_id.clone(),
            });
        }
    }
    Ok(())
}

fn read_file(path: &Path) -> CatalogResult<String> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}
