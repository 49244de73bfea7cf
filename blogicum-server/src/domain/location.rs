use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LocationSummary {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
}

impl From<&Location> for LocationSummary {
    fn from(location: &Location) -> Self {
        Self {
            id: location.id,
            name: location.name.clone(),
            is_published: location.is_published,
        }
    }
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub is_published: Option<bool>,
}

impl UpdateLocationRequest {
    pub fn apply(self, location: &mut Location) {
        if let Some(name) = self.name {
            location.name = name;
        }
        if let Some(is_published) = self.is_published {
            location.is_published = is_published;
        }
    }
}
