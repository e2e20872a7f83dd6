use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::domain::identity::IdentityId;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("failed to read gallery {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse gallery: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("reference {index} has no identity id and no parseable source name")]
    UnresolvedReference { index: usize },
    #[error("reference {index} has an empty embedding")]
    EmptyEmbedding { index: usize },
}

/// What an alert tells staff about a matched person.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityProfile {
    pub id: IdentityId,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub drivers_license: Option<String>,
    #[serde(default)]
    pub est_value_stolen: Option<f64>,
    #[serde(default)]
    pub report_date: Option<String>,
    /// Base64-encoded reference photo attached to alerts.
    #[serde(default, skip_serializing)]
    pub reference_image: Option<String>,
}

/// Someone at a store who is told when one of its devices raises a match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Recipients registered for one capture device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceContacts {
    pub device_id: u64,
    #[serde(default)]
    pub recipients: Vec<Recipient>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawReference {
    #[serde(default)]
    identity_id: Option<IdentityId>,
    #[serde(default)]
    source: Option<String>,
    embedding: Vec<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGallery {
    #[serde(default)]
    identities: Vec<IdentityProfile>,
    #[serde(default)]
    references: Vec<RawReference>,
    #[serde(default)]
    contacts: Vec<DeviceContacts>,
}

/// One reference photo's embedding, attributed to an identity.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceEmbedding {
    pub identity_id: IdentityId,
    pub embedding: Vec<f32>,
}

/// Immutable reference store handed to each pipeline invocation.
///
/// Holds every reference embedding, the profile shown when an identity
/// wins, and who to tell per capture device. Several references may belong
/// to one identity.
#[derive(Clone, Debug, Default)]
pub struct ReferenceGallery {
    references: Vec<ReferenceEmbedding>,
    profiles: BTreeMap<IdentityId, IdentityProfile>,
    contacts: BTreeMap<u64, Vec<Recipient>>,
}

impl ReferenceGallery {
    pub fn new(references: Vec<ReferenceEmbedding>, profiles: Vec<IdentityProfile>) -> Self {
        Self {
            references,
            profiles: profiles.into_iter().map(|p| (p.id, p)).collect(),
            contacts: BTreeMap::new(),
        }
    }

    /// Registers recipients per device. Entries for the same device merge.
    pub fn with_contacts(mut self, contacts: Vec<DeviceContacts>) -> Self {
        for entry in contacts {
            self.contacts
                .entry(entry.device_id)
                .or_default()
                .extend(entry.recipients);
        }
        self
    }

    pub fn from_json(json: &str) -> Result<Self, GalleryError> {
        let raw: RawGallery = serde_json::from_str(json)?;

        let mut references = Vec::with_capacity(raw.references.len());
        for (index, reference) in raw.references.into_iter().enumerate() {
            let identity_id = reference
                .identity_id
                .or_else(|| reference.source.as_deref().and_then(identity_id_from_source))
                .ok_or(GalleryError::UnresolvedReference { index })?;
            if reference.embedding.is_empty() {
                return Err(GalleryError::EmptyEmbedding { index });
            }
            references.push(ReferenceEmbedding {
                identity_id,
                embedding: reference.embedding,
            });
        }

        Ok(Self::new(references, raw.identities).with_contacts(raw.contacts))
    }

    pub fn load(path: &Path) -> Result<Self, GalleryError> {
        let json = fs::read_to_string(path).map_err(|e| GalleryError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&json)
    }

    pub fn references(&self) -> &[ReferenceEmbedding] {
        &self.references
    }

    pub fn profile(&self, id: IdentityId) -> Option<&IdentityProfile> {
        self.profiles.get(&id)
    }

    /// Recipients for `device_id`; empty when the device is unknown.
    pub fn recipients_for(&self, device_id: u64) -> &[Recipient] {
        self.contacts
            .get(&device_id)
            .map(|r| r.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// Parses the identity id out of a reference file named `<id>_<n>.<ext>`.
///
/// ```
/// use face_consensus_core::matching::domain::identity::IdentityId;
/// use face_consensus_core::matching::domain::reference_gallery::identity_id_from_source;
///
/// assert_eq!(identity_id_from_source("db/320_2.jpg"), Some(IdentityId(320)));
/// assert_eq!(identity_id_from_source("portrait.jpg"), None);
/// ```
pub fn identity_id_from_source(source: &str) -> Option<IdentityId> {
    let file_name = Path::new(source).file_name()?.to_str()?;
    let (stem, _ext) = file_name.rsplit_once('.')?;
    let (id, sequence) = stem.split_once('_')?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(id) || !all_digits(sequence) {
        return None;
    }
    id.parse().ok().map(IdentityId)
}
