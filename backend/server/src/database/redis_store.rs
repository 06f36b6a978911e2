use std::{collections::HashMap, sync::LazyLock, time::Duration};

use redis::{AsyncCommands, Client, Script, aio::MultiplexedConnection};
use tokio::time::timeout;
use tracing::debug;

use super::StoreError;
use crate::models::{Article, Comment};

const ARTICLE_PREFIX: &str = "articles";
const COMMENTS_PREFIX: &str = "comments";

const NAME_FIELD: &str = "name";
const UPVOTES_FIELD: &str = "upvotes";

// KEYS[1] article hash
static INCREMENT_IF_EXISTS: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 0 then
            return false
        end
        return redis.call('HINCRBY', KEYS[1], 'upvotes', 1)
        ",
    )
});

// KEYS[1] article hash, KEYS[2] comment list, ARGV[1] encoded comment
static APPEND_IF_EXISTS: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 0 then
            return false
        end
        return redis.call('RPUSH', KEYS[2], ARGV[1])
        ",
    )
});

fn article_key(name: &str) -> String {
    format!("{ARTICLE_PREFIX}:{name}")
}

fn comments_key(name: &str) -> String {
    format!("{COMMENTS_PREFIX}:{name}")
}

#[derive(Clone)]
pub struct RedisDb {
    client: Client,
    connect_timeout: Duration,
}

impl RedisDb {
    /// Only parses the url, no connection is made until [`RedisDb::connect`].
    pub fn open(url: &str, connect_timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|source| StoreError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        Ok(Self {
            client,
            connect_timeout,
        })
    }

    pub async fn connect(&self) -> Result<RedisConnection, StoreError> {
        let connection = timeout(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| StoreError::ConnectTimeout(self.connect_timeout))?
        .map_err(StoreError::Connect)?;

        Ok(RedisConnection { connection })
    }
}

pub struct RedisConnection {
    connection: MultiplexedConnection,
}

impl RedisConnection {
    pub async fn find_article(&mut self, name: &str) -> Result<Option<Article>, StoreError> {
        let (fields, comments): (HashMap<String, String>, Vec<String>) = redis::pipe()
            .atomic()
            .hgetall(article_key(name))
            .lrange(comments_key(name), 0, -1)
            .query_async(&mut self.connection)
            .await?;

        if fields.is_empty() {
            return Ok(None);
        }

        decode_article(name, &fields, &comments).map(Some)
    }

    pub async fn increment_upvotes(&mut self, name: &str) -> Result<bool, StoreError> {
        let upvotes: Option<u64> = INCREMENT_IF_EXISTS
            .key(article_key(name))
            .invoke_async(&mut self.connection)
            .await?;

        if let Some(upvotes) = upvotes {
            debug!("{name} now has {upvotes} upvotes");
        }

        Ok(upvotes.is_some())
    }

    pub async fn append_comment(
        &mut self,
        name: &str,
        comment: &Comment,
    ) -> Result<bool, StoreError> {
        let length: Option<u64> = APPEND_IF_EXISTS
            .key(article_key(name))
            .key(comments_key(name))
            .arg(serde_json::to_string(comment)?)
            .invoke_async(&mut self.connection)
            .await?;

        if let Some(length) = length {
            debug!("{name} now has {length} comments");
        }

        Ok(length.is_some())
    }

    pub async fn insert_article(
        &mut self,
        article: &Article,
        overwrite: bool,
    ) -> Result<bool, StoreError> {
        let article_key = article_key(&article.name);
        let comments_key = comments_key(&article.name);

        if !overwrite {
            let exists: bool = self.connection.exists(&article_key).await?;
            if exists {
                return Ok(false);
            }
        }

        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(&article_key)
            .ignore()
            .del(&comments_key)
            .ignore()
            .hset_multiple(
                &article_key,
                &[
                    (NAME_FIELD, article.name.clone()),
                    (UPVOTES_FIELD, article.upvotes.to_string()),
                ],
            )
            .ignore();

        for comment in &article.comments {
            pipe.rpush(&comments_key, serde_json::to_string(comment)?)
                .ignore();
        }

        let _: () = pipe.query_async(&mut self.connection).await?;

        Ok(true)
    }
}

fn decode_article(
    name: &str,
    fields: &HashMap<String, String>,
    comments: &[String],
) -> Result<Article, StoreError> {
    let corrupt = |reason: String| StoreError::Corrupt {
        name: name.to_string(),
        reason,
    };

    let upvotes: u64 = match fields.get(UPVOTES_FIELD) {
        Some(raw) => raw
            .parse()
            .map_err(|e| corrupt(format!("upvotes {raw:?}: {e}")))?,
        None => 0,
    };

    let comments = comments
        .iter()
        .map(|raw| serde_json::from_str(raw))
        .collect::<Result<Vec<Comment>, _>>()
        .map_err(|e| corrupt(format!("comment: {e}")))?;

    Ok(Article {
        name: fields
            .get(NAME_FIELD)
            .cloned()
            .unwrap_or_else(|| name.to_string()),
        upvotes,
        comments,
    })
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use super::{RedisDb, article_key, comments_key, decode_article};
    use crate::{
        database::StoreError,
        models::{Article, Comment},
    };

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_keys_do_not_collide() {
        assert_eq!(article_key("learn-react"), "articles:learn-react");
        assert_eq!(comments_key("learn-react"), "comments:learn-react");
        assert_ne!(article_key("x:comments"), comments_key("x"));
    }

    #[test]
    fn test_decode_article() {
        let article = decode_article(
            "learn-react",
            &fields(&[("name", "learn-react"), ("upvotes", "7")]),
            &[
                r#"{"username":"ada","text":"nice"}"#.to_string(),
                r#"{"username":"bob","text":"meh"}"#.to_string(),
            ],
        )
        .unwrap();

        assert_eq!(article.upvotes, 7);
        assert_eq!(article.comments.len(), 2);
        assert_eq!(article.comments[1].username, "bob");
    }

    #[test]
    fn test_decode_missing_upvotes_is_zero() {
        let article = decode_article("a", &fields(&[("name", "a")]), &[]).unwrap();
        assert_eq!(article, Article::new("a"));
    }

    #[test]
    fn test_decode_corrupt() {
        let bad_votes = decode_article("a", &fields(&[("upvotes", "-1")]), &[]);
        assert!(matches!(bad_votes, Err(StoreError::Corrupt { .. })));

        let bad_comment = decode_article("a", &fields(&[("upvotes", "1")]), &["{".to_string()]);
        assert!(matches!(bad_comment, Err(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    #[ignore = "needs a running redis, set REDIS_URL"]
    async fn test_live_roundtrip() {
        let url = std::env::var("REDIS_URL").unwrap();
        let db = RedisDb::open(&url, Duration::from_secs(1)).unwrap();
        let mut conn = db.connect().await.unwrap();

        let name = "live-test-article";
        assert!(conn.insert_article(&Article::new(name), true).await.unwrap());
        assert!(!conn.insert_article(&Article::new(name), false).await.unwrap());

        assert!(conn.increment_upvotes(name).await.unwrap());
        let comment = Comment {
            username: "ada".to_string(),
            text: "nice".to_string(),
        };
        assert!(conn.append_comment(name, &comment).await.unwrap());

        let article = conn.find_article(name).await.unwrap().unwrap();
        assert_eq!(article.upvotes, 1);
        assert_eq!(article.comments, vec![comment]);

        assert!(!conn.increment_upvotes("live-test-missing").await.unwrap());
        assert_eq!(conn.find_article("live-test-missing").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "needs a running redis, set REDIS_URL"]
    async fn test_live_concurrent_updates() {
        let url = std::env::var("REDIS_URL").unwrap();
        let db = RedisDb::open(&url, Duration::from_secs(1)).unwrap();

        let name = "live-test-concurrent";
        let mut conn = db.connect().await.unwrap();
        assert!(conn.insert_article(&Article::new(name), true).await.unwrap());

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let db = db.clone();
                tokio::spawn(async move {
                    let mut conn = db.connect().await.unwrap();
                    assert!(conn.increment_upvotes(name).await.unwrap());

                    let comment = Comment {
                        username: format!("user-{i}"),
                        text: "hi".to_string(),
                    };
                    assert!(conn.append_comment(name, &comment).await.unwrap());
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        let article = conn.find_article(name).await.unwrap().unwrap();
        assert_eq!(article.upvotes, 20);
        assert_eq!(article.comments.len(), 20);
    }
}
