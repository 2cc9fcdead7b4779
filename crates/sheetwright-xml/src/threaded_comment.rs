//! Threaded comments XML schema structures.
//!
//! Represents `xl/threadedComments/threadedComment{N}.xml` and
//! `xl/persons/person.xml` (Excel 2019+). The first comment in a thread is
//! the root; replies carry a `parentId`.

use serde::{Deserialize, Serialize};

use crate::namespaces;

/// Root element for a threaded comments part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "ThreadedComments")]
pub struct ThreadedCommentsXml {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,

    #[serde(rename = "threadedComment", default)]
    pub comments: Vec<ThreadedCommentXml>,
}

/// Individual threaded comment entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadedCommentXml {
    #[serde(rename = "@ref")]
    pub cell_ref: String,

    #[serde(rename = "@dT")]
    pub date_time: String,

    #[serde(rename = "@personId")]
    pub person_id: String,

    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@parentId", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(rename = "@done", skip_serializing_if = "Option::is_none")]
    pub done: Option<String>,

    #[serde(rename = "text", default)]
    pub text: String,
}

/// Root element for the person list part (`xl/persons/person.xml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "personList")]
pub struct PersonList {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,

    #[serde(rename = "person", default)]
    pub persons: Vec<Person>,
}

/// Individual person entry, keyed by GUID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "@displayName")]
    pub display_name: String,

    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(rename = "@providerId", skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

impl Default for ThreadedCommentsXml {
    fn default() -> Self {
        Self {
            xmlns: namespaces::THREADED_COMMENTS.to_string(),
            comments: Vec::new(),
        }
    }
}

impl Default for PersonList {
    fn default() -> Self {
        Self {
            xmlns: namespaces::THREADED_COMMENTS.to_string(),
            persons: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threaded_comments_default() {
        let tc = ThreadedCommentsXml::default();
        assert_eq!(tc.xmlns, namespaces::THREADED_COMMENTS);
        assert!(tc.comments.is_empty());
    }

    #[test]
    fn test_threaded_comment_roundtrip() {
        let tc = ThreadedCommentsXml {
            comments: vec![
                ThreadedCommentXml {
                    cell_ref: "A1".to_string(),
                    date_time: "2024-01-15T10:30:00.00".to_string(),
                    person_id: "{C1A2B3D4-0000-0000-0000-000000000001}".to_string(),
                    id: "{C1A2B3D4-0000-0000-0000-000000000010}".to_string(),
                    parent_id: None,
                    done: Some("1".to_string()),
                    text: "root comment".to_string(),
                },
                ThreadedCommentXml {
                    cell_ref: "A1".to_string(),
                    date_time: "2024-01-15T11:00:00.00".to_string(),
                    person_id: "{C1A2B3D4-0000-0000-0000-000000000002}".to_string(),
                    id: "{C1A2B3D4-0000-0000-0000-000000000011}".to_string(),
                    parent_id: Some("{C1A2B3D4-0000-0000-0000-000000000010}".to_string()),
                    done: None,
                    text: "a reply".to_string(),
                },
            ],
            ..ThreadedCommentsXml::default()
        };

        let xml = quick_xml::se::to_string(&tc).unwrap();
        let parsed: ThreadedCommentsXml = quick_xml::de::from_str(&xml).unwrap();
        assert_eq!(parsed.comments.len(), 2);
        assert!(parsed.comments[0].parent_id.is_none());
        assert_eq!(
            parsed.comments[1].parent_id.as_deref(),
            Some("{C1A2B3D4-0000-0000-0000-000000000010}")
        );
        assert_eq!(parsed.comments[1].text, "a reply");
    }

    #[test]
    fn test_person_list_roundtrip() {
        let pl = PersonList {
            persons: vec![Person {
                display_name: "Reviewer".to_string(),
                id: "{C1A2B3D4-0000-0000-0000-000000000001}".to_string(),
                user_id: Some("reviewer@example.com".to_string()),
                provider_id: Some("AD".to_string()),
            }],
            ..PersonList::default()
        };
        let xml = quick_xml::se::to_string(&pl).unwrap();
        let parsed: PersonList = quick_xml::de::from_str(&xml).unwrap();
        assert_eq!(parsed.persons.len(), 1);
        assert_eq!(parsed.persons[0].display_name, "Reviewer");
        assert_eq!(
            parsed.persons[0].user_id.as_deref(),
            Some("reviewer@example.com")
        );
    }

    #[test]
    fn test_parse_real_threaded_comments() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<ThreadedComments xmlns="http://schemas.microsoft.com/office/spreadsheetml/2018/threadedcomments">
  <threadedComment ref="B2" dT="2023-06-01T09:00:00.00" personId="{P-1}" id="{T-1}">
    <text>needs review</text>
  </threadedComment>
</ThreadedComments>"#;

        let parsed: ThreadedCommentsXml = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(parsed.comments.len(), 1);
        assert_eq!(parsed.comments[0].cell_ref, "B2");
        assert_eq!(parsed.comments[0].text, "needs review");
    }
}
