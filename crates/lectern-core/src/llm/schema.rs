//! The unified JSON schema every document parser targets.
//!
//! One definition serves all formats: per-page PDF calls, HTML, Markdown
//! and plain text. Text-like formats zero out `page_number_info` rather
//! than omitting it, so the stitching stage never branches on shape.

use serde_json::{Value, json};

/// Schema for a parsed page (or whole text document).
pub fn parsed_page_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "metadata": {
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "authors": {"type": "array", "items": {"type": "string"}},
                    "publication_date": {"type": "string"},
                    "publication": {"type": "string"},
                    "doi": {"type": "string"},
                    "abstract": {"type": "string"}
                },
                "required": ["title", "authors", "publication_date", "publication", "doi", "abstract"],
                "additionalProperties": false
            },
            "content": {"type": "string"},
            "references": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "reference_text": {"type": "string"},
                        "doi": {"type": "string"}
                    },
                    "required": ["reference_text", "doi"],
                    "additionalProperties": false
                }
            },
            "images": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "image_url": {"type": "string"},
                        "image_description": {"type": "string"},
                        "caption": {"type": "string"}
                    },
                    "required": ["image_url", "image_description", "caption"],
                    "additionalProperties": false
                }
            },
            "tables": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "table_id": {"type": "string"},
                        "table_title": {"type": "string"},
                        "table_data": {"type": "string"}
                    },
                    "required": ["table_id", "table_title", "table_data"],
                    "additionalProperties": false
                }
            },
            "footnotes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "marker": {"type": "string"},
                        "text": {"type": "string"},
                        "page_number": {"type": "string"},
                        "in_text_page": {"type": "string"}
                    },
                    "required": ["marker", "text", "page_number", "in_text_page"],
                    "additionalProperties": false
                }
            },
            "endnotes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "marker": {"type": "string"},
                        "text": {"type": "string"},
                        "page_number": {"type": "string"}
                    },
                    "required": ["marker", "text", "page_number"],
                    "additionalProperties": false
                }
            },
            "page_number_info": {
                "type": "object",
                "properties": {
                    "page_number": {"type": "string"},
                    "confidence": {"type": "number", "minimum": 0.0, "maximum": 1.0},
                    "location": {"type": "string"},
                    "page_range_info": {"type": "string"}
                },
                "required": ["page_number", "confidence", "location", "page_range_info"],
                "additionalProperties": false
            }
        },
        "required": [
            "metadata", "content", "references", "images", "tables",
            "footnotes", "endnotes", "page_number_info"
        ],
        "additionalProperties": false
    })
}

/// Schema for quotation extraction and prioritization responses.
pub fn quotations_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "quotations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "quotation_text": {"type": "string"},
                        "page_number": {"type": "string"},
                        "context": {"type": "string"},
                        "relevance": {"type": "string"}
                    },
                    "required": ["quotation_text", "page_number", "context", "relevance"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["quotations"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParsedPage, Quotation};

    #[test]
    fn required_keys_match_the_page_model() {
        let schema = parsed_page_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            required,
            vec![
                "metadata", "content", "references", "images", "tables",
                "footnotes", "endnotes", "page_number_info"
            ]
        );

        // A value synthesized from the schema's property names must decode
        // into the model without loss.
        let sample = serde_json::json!({
            "metadata": {"title": "T", "authors": [], "publication_date": "",
                          "publication": "", "doi": "", "abstract": ""},
            "content": "body",
            "references": [], "images": [], "tables": [],
            "footnotes": [], "endnotes": [],
            "page_number_info": {"page_number": "", "confidence": 0.0,
                                  "location": "none", "page_range_info": ""}
        });
        let page: ParsedPage = serde_json::from_value(sample).unwrap();
        assert_eq!(page.metadata.title, "T");
    }

    #[test]
    fn every_object_closes_additional_properties() {
        fn check(value: &serde_json::Value) {
            if let Some(obj) = value.as_object() {
                if obj.get("type").and_then(|t| t.as_str()) == Some("object") {
                    assert_eq!(
                        obj.get("additionalProperties"),
                        Some(&serde_json::Value::Bool(false)),
                        "object schema without additionalProperties=false"
                    );
                }
                for v in obj.values() {
                    check(v);
                }
            } else if let Some(arr) = value.as_array() {
                for v in arr {
                    check(v);
                }
            }
        }
        check(&parsed_page_schema());
        check(&quotations_schema());
    }

    #[test]
    fn confidence_is_bounded() {
        let schema = parsed_page_schema();
        let confidence = &schema["properties"]["page_number_info"]["properties"]["confidence"];
        assert_eq!(confidence["minimum"], 0.0);
        assert_eq!(confidence["maximum"], 1.0);
    }

    #[test]
    fn quotation_schema_round_trips_model() {
        let sample = serde_json::json!({
            "quotation_text": "q", "page_number": "3",
            "context": "intro", "relevance": "key claim"
        });
        let q: Quotation = serde_json::from_value(sample).unwrap();
        assert_eq!(q.page_number, "3");
    }
}
