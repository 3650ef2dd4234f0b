use serde::{Deserialize, Serialize};

/// Declarative description of one message flow: a consumer endpoint followed
/// by an ordered list of processing steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub id: Option<String>,
    pub description: Option<String>,
    pub from: String,
    pub auto_startup: bool,
    pub steps: Vec<ProcessorDefinition>,
}

impl RouteDefinition {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            id: None,
            description: None,
            from: from.into(),
            auto_startup: true,
            steps: Vec::new(),
        }
    }

    /// Endpoint URIs this route sends to, in step order.
    pub fn outputs(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                ProcessorDefinition::To { uri } | ProcessorDefinition::ToD { uri } => {
                    Some(uri.as_str())
                }
                _ => None,
            })
            .collect()
    }
}

/// A single processing step inside a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessorDefinition {
    To { uri: String },
    ToD { uri: String },
    Log { message: String },
    SetBody { expression: Expression },
    SetHeader { name: String, expression: Expression },
    RemoveHeader { name: String },
    Transform { expression: Expression },
    Filter { expression: Expression },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionLanguage {
    Constant,
    Simple,
    Header,
}

impl std::fmt::Display for ExpressionLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpressionLanguage::Constant => write!(f, "constant"),
            ExpressionLanguage::Simple => write!(f, "simple"),
            ExpressionLanguage::Header => write!(f, "header"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    pub language: ExpressionLanguage,
    pub text: String,
}

impl Expression {
    pub fn new(language: ExpressionLanguage, text: impl Into<String>) -> Self {
        Self {
            language,
            text: text.into(),
        }
    }
}
