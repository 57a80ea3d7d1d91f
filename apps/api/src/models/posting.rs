use serde::{Deserialize, Serialize};

/// A job posting as handed over by the acquisition layer.
/// Only `title` and `description` are guaranteed; everything else is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPosting {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub company_description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub benefits: Option<String>,
}

impl RawPosting {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Every text field joined into one corpus, in a fixed order.
    pub fn corpus(&self) -> String {
        let mut parts: Vec<&str> = vec![self.title.as_str(), self.description.as_str()];
        parts.extend(self.keywords.iter().map(String::as_str));
        parts.extend(self.requirements.iter().map(String::as_str));
        parts.extend(
            [&self.company_description, &self.location, &self.benefits]
                .into_iter()
                .flatten()
                .map(String::as_str),
        );
        parts.join("\n")
    }

    pub fn company_name(&self) -> &str {
        self.company.as_deref().unwrap_or("Unknown company")
    }
}
