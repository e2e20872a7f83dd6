use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consensus::domain::scoreboard::Scoreboard;
use crate::matching::domain::identity::IdentityId;
use crate::matching::domain::reference_gallery::{IdentityProfile, Recipient};

/// How store staff should be told about a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertChannel {
    Email,
    Text,
    InApp,
}

impl AlertChannel {
    pub const ALL: &'static [AlertChannel] =
        &[AlertChannel::Email, AlertChannel::Text, AlertChannel::InApp];
}

impl fmt::Display for AlertChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertChannel::Email => write!(f, "email"),
            AlertChannel::Text => write!(f, "text"),
            AlertChannel::InApp => write!(f, "in-app"),
        }
    }
}

impl FromStr for AlertChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "email" => Ok(AlertChannel::Email),
            "text" | "sms" => Ok(AlertChannel::Text),
            "in-app" | "in_app" | "inapp" => Ok(AlertChannel::InApp),
            other => Err(format!(
                "Alert channel must be one of: email, text, in-app, got '{other}'"
            )),
        }
    }
}

/// A consensus match, packaged for delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub identity_id: IdentityId,
    pub score: f64,
    pub device_id: u64,
    pub channel: AlertChannel,
    pub profile: Option<IdentityProfile>,
    /// People registered for the reporting device. May be empty.
    pub recipients: Vec<Recipient>,
    /// Base64 of the batch's first image, exactly as uploaded.
    #[serde(skip)]
    pub evidence_image: String,
    /// Every distance gathered for the batch, for reviewers.
    pub evidence: Scoreboard,
}

impl Alert {
    pub fn display_name(&self) -> String {
        self.profile
            .as_ref()
            .and_then(|p| p.full_name.clone())
            .unwrap_or_else(|| format!("identity {}", self.identity_id))
    }

    /// Labelled profile facts worth showing to staff, in display order.
    pub fn details(&self) -> Vec<(&'static str, String)> {
        let Some(profile) = &self.profile else {
            return Vec::new();
        };
        let mut details = Vec::new();
        if let Some(name) = &profile.full_name {
            details.push(("Name", name.clone()));
        }
        if let Some(license) = &profile.drivers_license {
            details.push(("Drivers License", license.clone()));
        }
        if let Some(value) = profile.est_value_stolen {
            details.push(("Estimated Value Stolen", format!("{value:.2}")));
        }
        if let Some(description) = &profile.description {
            details.push(("Description", description.clone()));
        }
        if let Some(date) = &profile.report_date {
            details.push(("Report Date", date.clone()));
        }
        details
    }

    pub fn reference_image(&self) -> Option<&str> {
        self.profile.as_ref().and_then(|p| p.reference_image.as_deref())
    }
}
