//! Customization bundle files.
//!
//! One JSON document per DocType holding the five customization categories.
//! Files are pretty-printed with 2-space indentation and named
//! `<DocType>.json`, sanitized for the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{
    ClientScript, CustomDocPerm, CustomField, Customization, PropertySetter, ServerScript,
};

/// Errors that can occur reading or writing a bundle file.
#[derive(Error, Diagnostic, Debug)]
pub enum BundleError {
    #[error("IO error on {}: {source}", path.display())]
    #[diagnostic(code(frappe_customs::sync::bundle::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed bundle {}: {source}", path.display())]
    #[diagnostic(
        code(frappe_customs::sync::bundle::parse),
        help("Bundles must be JSON objects; custom fields need dt and fieldname, property setters need doc_type and property")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize bundle for {doctype}: {source}")]
    #[diagnostic(code(frappe_customs::sync::bundle::serialize))]
    Serialize {
        doctype: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid record in {}: {category} field '{field}' is not a scalar", path.display())]
    #[diagnostic(
        code(frappe_customs::sync::bundle::invalid_record),
        help("Records mirror table rows; values must be strings, numbers, booleans or null")
    )]
    InvalidRecord {
        path: PathBuf,
        category: &'static str,
        field: String,
    },
}

/// Every customization attached to one DocType.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomizationBundle {
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    #[serde(default)]
    pub property_setters: Vec<PropertySetter>,
    #[serde(default)]
    pub client_scripts: Vec<ClientScript>,
    #[serde(default)]
    pub server_scripts: Vec<ServerScript>,
    #[serde(default)]
    pub custom_perms: Vec<CustomDocPerm>,
}

impl CustomizationBundle {
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    pub fn record_count(&self) -> usize {
        self.custom_fields.len()
            + self.property_setters.len()
            + self.client_scripts.len()
            + self.server_scripts.len()
            + self.custom_perms.len()
    }

    /// Reject records carrying nested arrays or objects.
    fn validate(&self, path: &Path) -> Result<(), BundleError> {
        check_scalars(path, "custom_fields", &self.custom_fields)?;
        check_scalars(path, "property_setters", &self.property_setters)?;
        check_scalars(path, "client_scripts", &self.client_scripts)?;
        check_scalars(path, "server_scripts", &self.server_scripts)?;
        check_scalars(path, "custom_perms", &self.custom_perms)
    }
}

fn check_scalars<R: Customization>(
    path: &Path,
    category: &'static str,
    records: &[R],
) -> Result<(), BundleError> {
    match records.iter().find_map(|r| r.non_scalar_field()) {
        Some(field) => Err(BundleError::InvalidRecord {
            path: path.to_path_buf(),
            category,
            field: field.to_string(),
        }),
        None => Ok(()),
    }
}

/// File name for a DocType's bundle.
pub fn bundle_file_name(doctype: &str) -> String {
    sanitize_filename::sanitize(format!("{}.json", doctype))
}

/// Write `bundle` to `<dir>/<DocType>.json`, replacing any existing file.
pub fn write_bundle(
    dir: &Path,
    doctype: &str,
    bundle: &CustomizationBundle,
) -> Result<PathBuf, BundleError> {
    let path = dir.join(bundle_file_name(doctype));
    let json = serde_json::to_string_pretty(bundle).map_err(|source| BundleError::Serialize {
        doctype: doctype.to_string(),
        source,
    })?;
    fs::write(&path, json).map_err(|source| BundleError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Read and validate a bundle file. Missing categories read as empty.
pub fn read_bundle(path: &Path) -> Result<CustomizationBundle, BundleError> {
    let content = fs::read_to_string(path).map_err(|source| BundleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bundle: CustomizationBundle =
        serde_json::from_str(&content).map_err(|source| BundleError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    bundle.validate(path)?;
    Ok(bundle)
}
