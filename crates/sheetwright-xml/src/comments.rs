//! Legacy comments XML schema structures.
//!
//! Represents `xl/comments{N}.xml` in the OOXML package. Every legacy
//! comments part is paired with a VML drawing anchor part; the VML side is
//! assembled as raw markup in `sheetwright-core`.

use serde::{Deserialize, Serialize};

use crate::namespaces;
use crate::shared_strings::Text;

/// Comments root element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "comments")]
pub struct CommentsXml {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,

    #[serde(rename = "authors")]
    pub authors: Authors,

    #[serde(rename = "commentList")]
    pub comment_list: CommentList,
}

/// Authors container. Comments refer to authors by index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Authors {
    #[serde(rename = "author", default)]
    pub authors: Vec<String>,
}

/// Comment list container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommentList {
    #[serde(rename = "comment", default)]
    pub comments: Vec<CommentXml>,
}

/// Individual comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentXml {
    #[serde(rename = "@ref")]
    pub reference: String,

    #[serde(rename = "@authorId")]
    pub author_id: u32,

    #[serde(rename = "text")]
    pub text: CommentText,
}

/// Comment text content: either a bare `<t>` or a sequence of runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommentText {
    #[serde(rename = "t", skip_serializing_if = "Option::is_none")]
    pub t: Option<Text>,

    #[serde(rename = "r", default)]
    pub runs: Vec<CommentRun>,
}

impl CommentText {
    /// Plain-text projection of the comment body.
    pub fn plain_text(&self) -> String {
        if let Some(ref t) = self.t {
            t.value.clone()
        } else {
            self.runs.iter().map(|r| r.t.value.as_str()).collect()
        }
    }
}

/// A text run within a comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRun {
    #[serde(rename = "rPr", skip_serializing_if = "Option::is_none")]
    pub r_pr: Option<crate::shared_strings::RunProperties>,

    #[serde(rename = "t")]
    pub t: Text,
}

impl Default for CommentsXml {
    fn default() -> Self {
        Self {
            xmlns: namespaces::SPREADSHEET_ML.to_string(),
            authors: Authors::default(),
            comment_list: CommentList::default(),
        }
    }
}
