use serde::{Deserialize, Serialize};

/// One row of the engine's decoded tabular output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRecord {
    /// Identifier of the target the row was decoded for.
    pub target: String,
    /// Tainted origin expression.
    pub source: String,
    /// Sensitive destination expression.
    pub sink: String,
    /// Remaining columns, kept verbatim and never interpreted.
    pub extra: Vec<String>,
}

/// How a host-header-derived flow could be abused.
///
/// Declaration order is the report ordering for distribution tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VulnerabilityScenario {
    #[serde(rename = "Password-Reset Attack")]
    PasswordReset,
    #[serde(rename = "Open Redirect")]
    OpenRedirect,
    #[serde(rename = "Template Injection")]
    TemplateInjection,
    #[serde(rename = "URL Generation Attack")]
    UrlGeneration,
    #[serde(rename = "Attribute Manipulation")]
    AttributeManipulation,
    #[serde(rename = "Form Data Manipulation")]
    FormDataManipulation,
    #[serde(rename = "Request Parameter Pollution")]
    RequestParameterPollution,
    #[serde(rename = "Data Structure Pollution")]
    DataStructurePollution,
    #[serde(rename = "Async Context Pollution")]
    AsyncContextPollution,
    #[serde(rename = "Unknown HNP Vulnerability")]
    Unknown,
}

impl VulnerabilityScenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PasswordReset => "Password-Reset Attack",
            Self::OpenRedirect => "Open Redirect",
            Self::TemplateInjection => "Template Injection",
            Self::UrlGeneration => "URL Generation Attack",
            Self::AttributeManipulation => "Attribute Manipulation",
            Self::FormDataManipulation => "Form Data Manipulation",
            Self::RequestParameterPollution => "Request Parameter Pollution",
            Self::DataStructurePollution => "Data Structure Pollution",
            Self::AsyncContextPollution => "Async Context Pollution",
            Self::Unknown => "Unknown HNP Vulnerability",
        }
    }
}

impl std::fmt::Display for VulnerabilityScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Web framework a flow is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Framework {
    Django,
    Flask,
    #[serde(rename = "FastAPI")]
    FastApi,
    Tornado,
    Pyramid,
    Spring,
    Struts,
    Rails,
    Beego,
    Gorilla,
    Unknown,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Django => "Django",
            Self::Flask => "Flask",
            Self::FastApi => "FastAPI",
            Self::Tornado => "Tornado",
            Self::Pyramid => "Pyramid",
            Self::Spring => "Spring",
            Self::Struts => "Struts",
            Self::Rails => "Rails",
            Self::Beego => "Beego",
            Self::Gorilla => "Gorilla",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// 1-based, assigned in encounter order.
    pub id: usize,
    pub source: String,
    pub sink: String,
    pub vulnerability_scenario: VulnerabilityScenario,
    pub framework: Framework,
    pub description: String,
    /// Target the flow was found in.
    #[serde(default)]
    pub target: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_serializes_as_display_name() {
        let json = serde_json::to_string(&VulnerabilityScenario::PasswordReset).unwrap();
        assert_eq!(json, "\"Password-Reset Attack\"");
        assert_eq!(
            VulnerabilityScenario::Unknown.to_string(),
            "Unknown HNP Vulnerability"
        );
    }

    #[test]
    fn test_framework_serializes_as_display_name() {
        assert_eq!(serde_json::to_string(&Framework::FastApi).unwrap(), "\"FastAPI\"");
        assert_eq!(Framework::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn test_scenario_ordering_follows_declaration() {
        assert!(VulnerabilityScenario::PasswordReset < VulnerabilityScenario::OpenRedirect);
        assert!(VulnerabilityScenario::AsyncContextPollution < VulnerabilityScenario::Unknown);
        assert!(Framework::Pyramid < Framework::Unknown);
    }
}
