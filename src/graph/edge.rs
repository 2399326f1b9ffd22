use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    Contains,
    Defines,
    Imports,
    Calls,
    Extends,
    Implements,
    MemberOf,
    StepInProcess,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Contains => "CONTAINS",
            RelationType::Defines => "DEFINES",
            RelationType::Imports => "IMPORTS",
            RelationType::Calls => "CALLS",
            RelationType::Extends => "EXTENDS",
            RelationType::Implements => "IMPLEMENTS",
            RelationType::MemberOf => "MEMBER_OF",
            RelationType::StepInProcess => "STEP_IN_PROCESS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub rel: RelationType,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,
}

impl GraphEdge {
    pub fn new(source_id: &str, rel: RelationType, target_id: &str) -> Self {
        GraphEdge {
            id: Self::edge_id(source_id, rel, target_id),
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            rel,
            confidence: 1.0,
            reason: None,
            step: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_step(mut self, step: u32) -> Self {
        self.step = Some(step);
        self
    }

    /// Edge identity derives from (source, type, target); adding the same
    /// triple twice is a no-op at the graph level.
    pub fn edge_id(source_id: &str, rel: RelationType, target_id: &str) -> String {
        format!("{source_id}-{}-{target_id}", rel.as_str())
    }
}
