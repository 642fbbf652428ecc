//! Findings produced by category analysis.
//!
//! Field names on the wire follow the structured-output shape the analysis
//! capability is asked to produce (`risk_title`, `risk_category`,
//! `esg_category`), so payloads deserialize directly into these types.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A source reference backing a finding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

impl Citation {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Fixed enumeration of risk categories.
///
/// Doubles as the dispatch list for the risk domain and as the vocabulary a
/// finding's category set is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskCategory {
    #[serde(rename = "ALL")]
    All,
    #[serde(rename = "Operational Risk")]
    Operational,
    #[serde(rename = "Credit Risk")]
    Credit,
    #[serde(rename = "Compliance Risk")]
    Compliance,
    #[serde(rename = "Strategic Risk")]
    Strategic,
}

impl RiskCategory {
    /// Categories in the order they are submitted to the dispatcher.
    pub const DISPATCH_ORDER: [RiskCategory; 5] = [
        RiskCategory::All,
        RiskCategory::Operational,
        RiskCategory::Credit,
        RiskCategory::Compliance,
        RiskCategory::Strategic,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::All => "ALL",
            RiskCategory::Operational => "Operational Risk",
            RiskCategory::Credit => "Credit Risk",
            RiskCategory::Compliance => "Compliance Risk",
            RiskCategory::Strategic => "Strategic Risk",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity of a risk finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// A single categorized risk finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFinding {
    #[serde(rename = "risk_title")]
    pub title: String,
    pub description: String,
    #[serde(rename = "risk_category")]
    pub categories: BTreeSet<RiskCategory>,
    pub severity: Severity,
    pub mitigation: String,
    pub impact: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// The three ESG pillars.
///
/// Dispatch labels use the adjective form ("Environmental") while findings
/// serialize the pillar as "Environment"; both spellings deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EsgPillar {
    #[serde(alias = "Environmental")]
    Environment,
    Social,
    Governance,
}

impl EsgPillar {
    pub const DISPATCH_ORDER: [EsgPillar; 3] =
        [EsgPillar::Environment, EsgPillar::Social, EsgPillar::Governance];

    /// Label used when framing a request for this pillar.
    pub fn label(&self) -> &'static str {
        match self {
            EsgPillar::Environment => "Environmental",
            EsgPillar::Social => "Social",
            EsgPillar::Governance => "Governance",
        }
    }
}

impl fmt::Display for EsgPillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single ESG finding for one pillar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EsgFinding {
    #[serde(rename = "esg_category")]
    pub category: EsgPillar,
    pub description: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}
