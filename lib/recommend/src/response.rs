use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    Found,
    /// Unknown item name, or a query that matched nothing
    NotFound,
    /// No usable keywords; not an error
    EmptyQuery,
}

/// One recommended item as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedItem {
    pub id: String,
    pub name: String,
    pub rating: f32,
    pub price: String,
    pub review_count: u64,
    pub similarity: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub status: LookupStatus,
    pub query: String,
    /// Keywords the query was reduced to, when it came from free text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub results: Vec<RecommendedItem>,
}

impl RecommendationResponse {
    pub fn found(query: impl Into<String>, results: Vec<RecommendedItem>) -> Self {
        let status = if results.is_empty() {
            LookupStatus::NotFound
        } else {
            LookupStatus::Found
        };
        Self {
            status,
            query: query.into(),
            keywords: Vec::new(),
            results,
        }
    }

    pub fn not_found(query: impl Into<String>) -> Self {
        Self {
            status: LookupStatus::NotFound,
            query: query.into(),
            keywords: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn empty_query(query: impl Into<String>) -> Self {
        Self {
            status: LookupStatus::EmptyQuery,
            query: query.into(),
            keywords: Vec::new(),
            results: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn is_found(&self) -> bool {
        self.status == LookupStatus::Found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_serialization() {
        let item = RecommendedItem {
            id: "c".into(),
            name: "Slice House".into(),
            rating: 4.0,
            price: "$".into(),
            review_count: 10,
            similarity: 0.9,
            scenes: Vec::new(),
        };
        assert!(RecommendationResponse::found("Luigi's", vec![item]).is_found());
        assert!(!RecommendationResponse::found("Luigi's", Vec::new()).is_found());
        assert!(!RecommendationResponse::not_found("Nowhere").is_found());

        let empty = RecommendationResponse::empty_query("the and of")
            .with_keywords(vec!["noise".to_string()]);
        assert!(!empty.is_found());
        let json = serde_json::to_value(&empty).unwrap();
        assert_eq!(json["query"], "the and of");
        assert_eq!(json["keywords"][0], "noise");
    }
}
