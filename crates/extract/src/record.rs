// ABOUTME: Record types produced by the extractors: per-book shelf summaries and full detail records.
// ABOUTME: BookDetailRecord serializes with the compact key names the downstream index expects.

use serde::{Deserialize, Serialize};

/// Summary of one book as listed on a shelf page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfSummaryRecord {
    pub title: String,
    pub author: Option<String>,
    pub avg_rating: Option<String>,
    pub rating_count: Option<String>,
    pub published_year: Option<String>,
    pub cover_image_url: String,
    pub shelved_count: String,
    pub detail_link: String,
}

/// One genre label, serialized as `{"g": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreEntry {
    pub g: String,
}

/// One review snippet, serialized as `{"r": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub r: String,
}

/// Everything extracted from a single book page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetailRecord {
    pub isbn: Option<String>,
    /// Raw UTF-8 bytes of the description text.
    #[serde(with = "utf8_bytes")]
    pub description: Option<Vec<u8>>,
    #[serde(rename = "genre")]
    pub genres: Vec<GenreEntry>,
    #[serde(rename = "review")]
    pub reviews: Vec<ReviewEntry>,
    #[serde(rename = "recommend")]
    pub recommend_link: Option<String>,
    pub author: String,
    pub title: String,
    pub score: String,
    pub year: Option<String>,
    #[serde(rename = "rating")]
    pub rating_count: String,
    #[serde(rename = "reviewers")]
    pub reviewer_count: String,
    #[serde(rename = "img")]
    pub image_url: Option<String>,
    #[serde(rename = "url")]
    pub source_url: String,
}

mod utf8_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => s.serialize_some(&String::from_utf8_lossy(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Ok(Option::<String>::deserialize(d)?.map(String::into_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> BookDetailRecord {
        BookDetailRecord {
            isbn: Some("0439554934".to_string()),
            description: Some("Caf\u{e9} au lait".as_bytes().to_vec()),
            genres: vec![GenreEntry { g: "Fantasy".to_string() }],
            reviews: vec![ReviewEntry { r: "Loved it".to_string() }],
            recommend_link: None,
            author: "J.K. Rowling".to_string(),
            title: "Harry Potter".to_string(),
            score: "4.47".to_string(),
            year: Some("1997".to_string()),
            rating_count: "6508932".to_string(),
            reviewer_count: "101234".to_string(),
            image_url: None,
            source_url: "https://www.goodreads.com/book/show/3".to_string(),
        }
    }

    #[test]
    fn test_detail_record_key_names_and_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"isbn":"0439554934","description":"Café au lait","#,
                r#""genre":[{"g":"Fantasy"}],"review":[{"r":"Loved it"}],"#,
                r#""recommend":null,"author":"J.K. Rowling","title":"Harry Potter","#,
                r#""score":"4.47","year":"1997","rating":"6508932","reviewers":"101234","#,
                r#""img":null,"url":"https://www.goodreads.com/book/show/3"}"#
            )
        );
    }

    #[test]
    fn test_detail_record_reads_back() {
        let json = serde_json::to_string(&sample()).unwrap();
        let back: BookDetailRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_absent_description_is_null() {
        let record = BookDetailRecord {
            description: None,
            ..sample()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value["description"].is_null());
    }

    #[test]
    fn test_shelf_summary_field_names() {
        let record = ShelfSummaryRecord {
            title: "Dune".to_string(),
            author: None,
            avg_rating: Some("4.25".to_string()),
            rating_count: Some("1,234".to_string()),
            published_year: None,
            cover_image_url: "https://img/1.jpg".to_string(),
            shelved_count: "9,001".to_string(),
            detail_link: "https://www.goodreads.com/book/show/1".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["rating_count"], "1,234");
        assert!(value["author"].is_null());
        assert_eq!(value["shelved_count"], "9,001");
    }
}
