use serde::{Deserialize, Serialize};

use crate::errors::LeadflowError;

/// Pipeline stage. Variant order is the stage ranking (`Early < Mql < Sql`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    #[serde(alias = "early")]
    Early,
    #[serde(rename = "MQL", alias = "mql")]
    Mql,
    #[serde(rename = "SQL", alias = "sql")]
    Sql,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Early => "Early",
            Self::Mql => "MQL",
            Self::Sql => "SQL",
        }
    }

    pub fn rating(&self) -> Rating {
        match self {
            Self::Early => Rating::Cold,
            Self::Mql => Rating::Warm,
            Self::Sql => Rating::Hot,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = LeadflowError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "early" => Ok(Self::Early),
            "mql" => Ok(Self::Mql),
            "sql" => Ok(Self::Sql),
            other => Err(LeadflowError::InvalidValue {
                field: "stage",
                value: other.to_string(),
                expected: "early|mql|sql",
            }),
        }
    }
}

/// CRM lead temperature, derived from the stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Cold,
    Warm,
    Hot,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cold => "Cold",
            Self::Warm => "Warm",
            Self::Hot => "Hot",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub fit_score: u8,
    pub intent_score: u8,
    pub stage: Stage,
    pub rating: Rating,
}
