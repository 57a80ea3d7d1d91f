use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two kinds of application document the engine tailors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Cv,
    CoverLetter,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Cv => "cv",
            DocumentKind::CoverLetter => "cover_letter",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cv" => Ok(DocumentKind::Cv),
            "cover_letter" => Ok(DocumentKind::CoverLetter),
            other => Err(format!("unknown document kind '{other}'")),
        }
    }
}

/// Document text produced by the generation collaborator, waiting to be scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDocument {
    pub kind: DocumentKind,
    pub text: String,
}
