use std::fmt;

use serde::Deserialize;

/// Tissue sample form as submitted from the admin "add new data" page.
///
/// Field names follow the form inputs, including the historical
/// `neuoropathology_*` spelling the data API was built around.
#[derive(Debug, Clone, Deserialize)]
pub struct TissueRecordForm {
    pub mbtb_code: String,
    pub sex: String,
    pub age: String,
    #[serde(default)]
    pub race: Option<String>,
    pub clinical_diagnosis: String,
    #[serde(default)]
    pub duration: Option<String>,
    pub clinical_history: String,
    #[serde(default)]
    pub cause_of_death: Option<String>,
    pub postmortem_interval: String,
    pub brain_weight: f64,
    pub time_in_fix: String,
    pub neuoropathology_diagnosis: String,
    #[serde(default)]
    pub neuoropathology_detailed: Option<String>,
    #[serde(default)]
    pub neuoropathology_gross: Option<String>,
    #[serde(default)]
    pub neuoropathology_micro: Option<String>,
    #[serde(default)]
    pub neuoropathology_criteria: Option<String>,
    #[serde(default)]
    pub cerad: Option<String>,
    #[serde(default)]
    pub braak_stage: Option<String>,
    #[serde(default)]
    pub khachaturian: Option<String>,
    #[serde(default)]
    pub abc: Option<String>,
    pub autopsy_type: String,
    pub tissue_type: String,
    pub storage_method: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMethod {
    FormalinFixed,
    FreshFrozen,
    Both,
    Unrecognized,
}

impl StorageMethod {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Formalin-Fixed" => StorageMethod::FormalinFixed,
            "Fresh Frozen" => StorageMethod::FreshFrozen,
            "Both" => StorageMethod::Both,
            _ => StorageMethod::Unrecognized,
        }
    }

    /// `(formalin_fixed, fresh_frozen)` as the data API expects them.
    /// Unrecognized methods leave both flags empty.
    pub fn flags(&self) -> (&'static str, &'static str) {
        match self {
            StorageMethod::FormalinFixed => ("True", "False"),
            StorageMethod::FreshFrozen => ("False", "True"),
            StorageMethod::Both => ("True", "True"),
            StorageMethod::Unrecognized => ("", ""),
        }
    }
}

/// Disease duration in years, read with `parseInt` rules: the leading
/// integer prefix counts, anything without one is `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationValue {
    Years(i64),
    NotANumber,
}

impl DurationValue {
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = raw.unwrap_or("");
        if raw.is_empty() {
            return DurationValue::Years(0);
        }

        let trimmed = raw.trim_start();
        let (negative, rest) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 {
            return DurationValue::NotANumber;
        }

        match rest[..digits_len].parse::<i64>() {
            Ok(value) if negative => DurationValue::Years(-value),
            Ok(value) => DurationValue::Years(value),
            Err(_) => DurationValue::NotANumber,
        }
    }
}

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationValue::Years(years) => write!(f, "{years}"),
            DurationValue::NotANumber => write!(f, "NaN"),
        }
    }
}

impl TissueRecordForm {
    pub fn storage(&self) -> StorageMethod {
        StorageMethod::parse(&self.storage_method)
    }

    pub fn duration_value(&self) -> DurationValue {
        DurationValue::parse(self.duration.as_deref())
    }

    /// Multipart fields for `add_new_data/`, using the data API's column names.
    pub fn to_api_fields(&self) -> Vec<(&'static str, String)> {
        let (formalin_fixed, fresh_frozen) = self.storage().flags();
        let optional = |value: &Option<String>| value.clone().unwrap_or_default();

        vec![
            ("mbtb_code", self.mbtb_code.clone()),
            ("sex", self.sex.clone()),
            ("age", self.age.clone()),
            ("postmortem_interval", self.postmortem_interval.clone()),
            ("time_in_fix", self.time_in_fix.clone()),
            ("tissue_type", self.tissue_type.clone()),
            ("storage_method", self.storage_method.clone()),
            ("autopsy_type", self.autopsy_type.clone()),
            (
                "neuoropathology_diagnosis",
                self.neuoropathology_diagnosis.clone(),
            ),
            ("race", optional(&self.race)),
            ("diagnosis", self.clinical_diagnosis.clone()),
            ("duration", self.duration_value().to_string()),
            ("clinical_history", self.clinical_history.clone()),
            ("cause_of_death", optional(&self.cause_of_death)),
            ("brain_weight", self.brain_weight.to_string()),
            (
                "neuoropathology_detailed",
                optional(&self.neuoropathology_detailed),
            ),
            ("neuropathology_gross", optional(&self.neuoropathology_gross)),
            ("neuropathology_micro", optional(&self.neuoropathology_micro)),
            (
                "neouropathology_criteria",
                optional(&self.neuoropathology_criteria),
            ),
            ("cerad", optional(&self.cerad)),
            ("braak_stage", optional(&self.braak_stage)),
            ("khachaturian", optional(&self.khachaturian)),
            ("abc", optional(&self.abc)),
            ("formalin_fixed", formalin_fixed.to_string()),
            ("fresh_frozen", fresh_frozen.to_string()),
        ]
    }
}

#[cfg(test)]
pub(crate) fn sample_form() -> TissueRecordForm {
    TissueRecordForm {
        mbtb_code: "BB99-102".to_string(),
        sex: "Male".to_string(),
        age: "71".to_string(),
        race: Some("White".to_string()),
        clinical_diagnosis: "Alzheimer's disease".to_string(),
        duration: Some("5".to_string()),
        clinical_history: "Progressive memory loss".to_string(),
        cause_of_death: None,
        postmortem_interval: "12".to_string(),
        brain_weight: 1200.0,
        time_in_fix: "14".to_string(),
        neuoropathology_diagnosis: "AD".to_string(),
        neuoropathology_detailed: None,
        neuoropathology_gross: Some("Atrophy".to_string()),
        neuoropathology_micro: None,
        neuoropathology_criteria: Some("NIA-AA".to_string()),
        cerad: None,
        braak_stage: Some("VI".to_string()),
        khachaturian: None,
        abc: None,
        autopsy_type: "Brain only".to_string(),
        tissue_type: "Hemisphere".to_string(),
        storage_method: "Both".to_string(),
    }
}
