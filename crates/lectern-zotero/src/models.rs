//! Minimal Zotero API models. Only the fields this server reads are
//! declared; everything else in the payload is ignored.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub key: String,
    pub data: ItemData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemData {
    #[serde(rename = "itemType")]
    pub item_type: String,
    pub title: String,
    pub creators: Vec<Creator>,
    #[serde(rename = "abstractNote")]
    pub abstract_note: String,
    pub date: String,
    #[serde(rename = "publicationTitle")]
    pub publication_title: String,
    #[serde(rename = "DOI")]
    pub doi: String,
    pub publisher: String,
    pub volume: String,
    pub issue: String,
    pub pages: String,
    #[serde(rename = "ISSN")]
    pub issn: String,
    #[serde(rename = "ISBN")]
    pub isbn: String,
    pub url: String,
    #[serde(rename = "parentItem")]
    pub parent_item: String,
    pub filename: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    #[serde(rename = "linkMode")]
    pub link_mode: String,
    #[serde(rename = "dateAdded")]
    pub date_added: String,
    #[serde(rename = "dateModified")]
    pub date_modified: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Creator {
    #[serde(rename = "creatorType")]
    pub creator_type: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub name: String,
}

impl Creator {
    /// Display name: single-field `name` when present, else
    /// "First Last" trimmed.
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    pub key: String,
    pub data: CollectionData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CollectionData {
    pub name: String,
    #[serde(rename = "parentCollection")]
    pub parent_collection: ParentCollection,
}

/// Zotero encodes "no parent" as the JSON literal `false` and a parent as
/// its collection key.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParentCollection {
    Key(String),
    Root(bool),
}

impl Default for ParentCollection {
    fn default() -> Self {
        ParentCollection::Root(false)
    }
}

impl ParentCollection {
    pub fn key(&self) -> Option<&str> {
        match self {
            ParentCollection::Key(k) => Some(k),
            ParentCollection::Root(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_decodes_with_partial_data() {
        let json = r#"{"key":"ABCD1234","data":{"itemType":"journalArticle","title":"A Paper","creators":[{"creatorType":"author","firstName":"Jane","lastName":"Doe"}],"DOI":"10.1/x"}}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.key, "ABCD1234");
        assert_eq!(item.data.title, "A Paper");
        assert_eq!(item.data.doi, "10.1/x");
        assert_eq!(item.data.creators[0].display_name(), "Jane Doe");
    }

    #[test]
    fn creator_single_field_name_wins() {
        let creator = Creator {
            name: "Some Institution".into(),
            first_name: "ignored".into(),
            last_name: "ignored".into(),
            ..Default::default()
        };
        assert_eq!(creator.display_name(), "Some Institution");
    }

    #[test]
    fn parent_collection_false_means_root() {
        let json = r#"{"key":"C1","data":{"name":"Top","parentCollection":false}}"#;
        let coll: Collection = serde_json::from_str(json).unwrap();
        assert_eq!(coll.data.parent_collection.key(), None);
    }

    #[test]
    fn parent_collection_key() {
        let json = r#"{"key":"C2","data":{"name":"Sub","parentCollection":"C1"}}"#;
        let coll: Collection = serde_json::from_str(json).unwrap();
        assert_eq!(coll.data.parent_collection.key(), Some("C1"));
    }
}
