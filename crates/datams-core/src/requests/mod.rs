pub mod extract;
pub mod fields;

use crate::error::Error;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet};

pub use extract::{parse_request, EntityRequest, FileAction, RequestTarget, UserAction};
pub use fields::{
    ContactFields, DeploymentFields, DeploymentRequest, EquipmentFields, Field, FieldSet,
    FileFields, FileRequest, MooringFields, MooringRequest, OrganizationFields,
    OrganizationRequest, UserRequest,
};

/// Raw submitted form: text fields plus uploaded file contents.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub form: BTreeMap<String, String>,
    pub files: BTreeMap<String, Vec<u8>>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: &str, value: &str) -> Self {
        self.form.insert(key.to_string(), value.to_string());
        self
    }

    pub fn file(mut self, key: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(key.to_string(), bytes);
        self
    }
}

/// Strict extraction requires every listed field; lenient (edit) extraction omits
/// whatever was not submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    Strict,
    Lenient,
}

/// Characters allowed in usernames and organization abbreviations.
pub fn is_allowed_character(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

pub fn restricted_characters(value: &str) -> BTreeSet<char> {
    value.chars().filter(|c| !is_allowed_character(*c)).collect()
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Unix seconds for a submitted date-time string, read as UTC.
pub fn datetime_to_timestamp(value: &str) -> Option<i64> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
        .map(|dt| dt.and_utc().timestamp())
}

/// Typed access to one submission under one extraction mode.
pub(crate) struct FieldReader<'a> {
    submission: &'a Submission,
    mode: ExtractMode,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(submission: &'a Submission, mode: ExtractMode) -> Self {
        Self { submission, mode }
    }

    /// Under strict mode every key must be present, in the form or (for `file_keys`)
    /// among the uploaded files.
    pub(crate) fn require(&self, form_keys: &[&str], file_keys: &[&str]) -> Result<(), Error> {
        if self.mode == ExtractMode::Lenient {
            return Ok(());
        }
        let mut missing: Vec<String> = form_keys
            .iter()
            .filter(|k| !self.submission.form.contains_key(**k))
            .chain(
                file_keys
                    .iter()
                    .filter(|k| !self.submission.files.contains_key(**k)),
            )
            .map(|k| k.to_string())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(Error::MissingRequiredData(missing))
    }

    pub(crate) fn text(&self, key: &str) -> Field<String> {
        self.submission.form.get(key).map(|v| {
            if v.is_empty() {
                None
            } else {
                Some(v.clone())
            }
        })
    }

    /// The raw value of a field the caller has already required.
    pub(crate) fn raw(&self, key: &str) -> String {
        self.submission.form.get(key).cloned().unwrap_or_default()
    }

    fn parsed<T, F>(&self, key: &str, kind: &str, parse: F) -> Result<Field<T>, Error>
    where
        F: Fn(&str) -> Option<T>,
    {
        match self.text(key) {
            None => Ok(None),
            Some(None) => Ok(Some(None)),
            Some(Some(v)) => parse(&v)
                .map(|parsed| Some(Some(parsed)))
                .ok_or_else(|| Error::Validation(format!("`{}` must be {}, got `{}`", key, kind, v))),
        }
    }

    pub(crate) fn int(&self, key: &str) -> Result<Field<i64>, Error> {
        self.parsed(key, "an integer", |v| v.trim().parse().ok())
    }

    pub(crate) fn float(&self, key: &str) -> Result<Field<f64>, Error> {
        self.parsed(key, "a number", |v| v.trim().parse().ok())
    }

    pub(crate) fn timestamp(&self, key: &str) -> Result<Field<i64>, Error> {
        self.parsed(key, "a date and time", datetime_to_timestamp)
    }

    /// Uploaded bytes. An empty upload counts as not submitted.
    pub(crate) fn bytes(&self, key: &str) -> Field<Vec<u8>> {
        self.submission
            .files
            .get(key)
            .filter(|b| !b.is_empty())
            .map(|b| Some(b.clone()))
    }

    /// Integer values of every form key starting with `prefix`.
    pub(crate) fn ids_with_prefix(&self, prefix: &str) -> Result<BTreeSet<i64>, Error> {
        self.submission
            .form
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| {
                v.trim().parse::<i64>().map_err(|_| {
                    Error::Validation(format!("`{}` must be an integer id, got `{}`", k, v))
                })
            })
            .collect()
    }
}
