//! Forum data model.
//!
//! The whole dataset is one serializable value so a snapshot is a single
//! `serde_json` call away.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub text: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub title: String,
    pub user: String,
    pub id: u64,
    pub posts: Vec<Post>,
}

impl Topic {
    /// Author of the first post, if there is one.
    pub fn starter(&self) -> Option<&str> {
        self.posts.first().map(|post| post.user.as_str())
    }
}

/// A topic without its posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicSummary<'a> {
    pub title: &'a str,
    pub user: &'a str,
    pub id: u64,
}

impl<'a> From<&'a Topic> for TopicSummary<'a> {
    fn from(topic: &'a Topic) -> Self {
        Self {
            title: &topic.title,
            user: &topic.user,
            id: topic.id,
        }
    }
}

/// A post annotated with its author's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthoredPost<'a> {
    pub text: &'a str,
    pub user: &'a str,
    pub name: Option<&'a str>,
}

/// In-memory forum dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Database {
    pub users: Vec<User>,
    pub topics: Vec<Topic>,
}

impl Database {
    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    /// Topic lookup by the textual id captured from a path.
    pub fn topic(&self, id: &str) -> Option<&Topic> {
        let id = id.parse::<u64>().ok()?;
        self.topics.iter().find(|t| t.id == id)
    }

    pub fn topic_mut(&mut self, id: &str) -> Option<&mut Topic> {
        let id = id.parse::<u64>().ok()?;
        self.topics.iter_mut().find(|t| t.id == id)
    }

    pub fn summaries(&self) -> Vec<TopicSummary<'_>> {
        self.topics.iter().map(TopicSummary::from).collect()
    }

    /// Topics whose first post was written by `username`.
    pub fn topics_started_by(&self, username: &str) -> Vec<TopicSummary<'_>> {
        self.topics
            .iter()
            .filter(|t| t.starter() == Some(username))
            .map(TopicSummary::from)
            .collect()
    }

    pub fn authored_posts<'a>(&'a self, topic: &'a Topic) -> Vec<AuthoredPost<'a>> {
        topic
            .posts
            .iter()
            .map(|post| AuthoredPost {
                text: &post.text,
                user: &post.user,
                name: self.user(&post.user).map(|u| u.name.as_str()),
            })
            .collect()
    }

    /// Id for a new topic: one past the largest, or 1 when empty.
    pub fn next_topic_id(&self) -> u64 {
        self.topics.iter().map(|t| t.id).max().map_or(1, |max| max + 1)
    }

    /// Remove a topic by id. Returns whether anything was removed.
    pub fn remove_topic(&mut self, id: u64) -> bool {
        let before = self.topics.len();
        self.topics.retain(|t| t.id != id);
        self.topics.len() != before
    }

    /// The reference dataset the server starts with.
    pub fn seed() -> Self {
        fn user(username: &str, name: &str) -> User {
            User {
                username: username.to_string(),
                name: name.to_string(),
            }
        }
        fn post(text: &str, user: &str) -> Post {
            Post {
                text: text.to_string(),
                user: user.to_string(),
            }
        }

        Self {
            users: vec![
                user("alfred", "Dr Alfredo"),
                user("barnie", "Barnibarno"),
                user("cynthia", "Cynthesis"),
            ],
            topics: vec![
                Topic {
                    title: "What do you want to do with your life?".to_string(),
                    user: "alfred".to_string(),
                    id: 1,
                    posts: vec![
                        post("Where do you see yourself in 5 years?", "alfred"),
                        post("Not hanging around in this forum.", "barnie"),
                        post("Come on @barnie, no need to be like that!", "cynthia"),
                    ],
                },
                Topic {
                    title: "Have you ever found money on the road?".to_string(),
                    user: "cynthia".to_string(),
                    id: 2,
                    posts: vec![
                        post(
                            "I was walking down the street and found $5 - I was so excited!",
                            "cynthia",
                        ),
                        post("It was probably mine. Give it back", "barnie"),
                        post("Why are we even friends with you @barnie", "alfred"),
                        post("Because of my optimistic outlook.", "barnie"),
                    ],
                },
            ],
        }
    }
}
