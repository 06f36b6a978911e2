use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub name: String,
    pub upvotes: u64,
    pub comments: Vec<Comment>,
}

impl Article {
    /// Fresh article as created by seeding: no votes, no comments.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            upvotes: 0,
            comments: Vec::new(),
        }
    }
}

/// Nothing is validated. Missing or `null` fields become empty strings, other non-string
/// values are kept in their JSON text form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Comment {
    #[serde(default, deserialize_with = "any_as_string")]
    pub username: String,
    #[serde(default, deserialize_with = "any_as_string")]
    pub text: String,
}

fn any_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Article, Comment};

    #[test]
    fn test_article_wire_shape() {
        let mut article = Article::new("learn-react");
        article.upvotes = 3;
        article.comments.push(Comment {
            username: "ada".to_string(),
            text: "nice".to_string(),
        });

        assert_eq!(
            serde_json::to_value(&article).unwrap(),
            json!({
                "name": "learn-react",
                "upvotes": 3,
                "comments": [{ "username": "ada", "text": "nice" }]
            })
        );
    }

    #[test]
    fn test_comment_missing_fields() {
        let comment: Comment = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert_eq!(comment.username, "");
        assert_eq!(comment.text, "hi");

        let comment: Comment = serde_json::from_str("{}").unwrap();
        assert_eq!(comment, Comment::default());
    }

    #[test]
    fn test_comment_non_string_fields() {
        let comment: Comment =
            serde_json::from_str(r#"{"username": null, "text": 42}"#).unwrap();
        assert_eq!(comment.username, "");
        assert_eq!(comment.text, "42");

        let comment: Comment =
            serde_json::from_str(r#"{"username": ["a"], "text": {"b": true}}"#).unwrap();
        assert_eq!(comment.username, r#"["a"]"#);
        assert_eq!(comment.text, r#"{"b":true}"#);
    }

    #[test]
    fn test_comment_stored_verbatim() {
        let comment: Comment =
            serde_json::from_str(r#"{"username": "  ", "text": "<b>x</b>", "extra": 1}"#)
                .unwrap();
        assert_eq!(comment.username, "  ");
        assert_eq!(comment.text, "<b>x</b>");
    }
}
