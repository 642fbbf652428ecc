//! Strict decode-and-validate step at the capability boundary.
//!
//! Nothing past this point sees an unvalidated payload: every value is
//! deserialized into its typed form and then checked with [`Conform`].

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::capability::error::{CapabilityError, CapabilityResult};
use crate::capability::OutputShape;
use crate::domain::{Citation, EsgFinding, RiskFinding};

/// Semantic checks that serde alone cannot express.
pub trait Conform {
    fn conform(&self) -> Result<(), String>;
}

/// Deserialize `value` as `T` and validate it, mapping any failure to
/// [`CapabilityError::SchemaViolation`].
pub fn decode<T>(shape: OutputShape, value: Value) -> CapabilityResult<T>
where
    T: DeserializeOwned + Conform,
{
    let violation = |detail: String| CapabilityError::SchemaViolation {
        shape: shape.name().to_string(),
        detail,
    };

    let typed: T = serde_json::from_value(value).map_err(|e| violation(e.to_string()))?;
    typed.conform().map_err(violation)?;
    Ok(typed)
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(())
}

fn conform_citations(citations: &[Citation]) -> Result<(), String> {
    for (i, c) in citations.iter().enumerate() {
        if c.url.trim().is_empty() {
            return Err(format!("citation {i} has an empty url"));
        }
    }
    Ok(())
}

impl Conform for RiskFinding {
    fn conform(&self) -> Result<(), String> {
        require_text("risk_title", &self.title)?;
        require_text("description", &self.description)?;
        if self.categories.is_empty() {
            return Err("risk_category must name at least one category".to_string());
        }
        conform_citations(&self.citations)
    }
}

impl Conform for EsgFinding {
    fn conform(&self) -> Result<(), String> {
        require_text("description", &self.description)?;
        conform_citations(&self.citations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn risk_value() -> Value {
        json!({
            "risk_title": "Credit profile",
            "description": "AAA rated",
            "risk_category": ["Credit Risk"],
            "severity": "Low",
            "mitigation": "Prudent capital management",
            "impact": "Cheap access to capital",
            "citations": [{"title": "CARE", "url": "https://careratings.com/x.pdf"}]
        })
    }

    #[test]
    fn test_decode_valid_risk_finding() {
        let finding: RiskFinding = decode(OutputShape::RiskFinding, risk_value()).unwrap();
        assert_eq!(finding.title, "Credit profile");
    }

    #[test]
    fn test_decode_rejects_empty_title() {
        let mut value = risk_value();
        value["risk_title"] = json!("  ");
        let err = decode::<RiskFinding>(OutputShape::RiskFinding, value).unwrap_err();
        assert!(matches!(err, CapabilityError::SchemaViolation { .. }));
        assert!(err.to_string().contains("risk_title"));
    }

    #[test]
    fn test_decode_rejects_empty_category_set() {
        let mut value = risk_value();
        value["risk_category"] = json!([]);
        assert!(decode::<RiskFinding>(OutputShape::RiskFinding, value).is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let err = decode::<EsgFinding>(OutputShape::EsgFinding, json!({"nodes": []})).unwrap_err();
        assert!(err.to_string().contains("esg_finding"));
    }

    #[test]
    fn test_decode_rejects_blank_citation_url() {
        let value = json!({
            "esg_category": "Social",
            "description": "- CSR spend up 12%",
            "citations": [{"title": "BRSR", "url": ""}]
        });
        assert!(decode::<EsgFinding>(OutputShape::EsgFinding, value).is_err());
    }
}
