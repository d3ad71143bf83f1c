use serde::{Deserialize, Serialize};

/// A study area that groups problems and sessions.
///
/// Names are unique ignoring case: "arrays" and "Arrays" are the same topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub name: String,
    /// Target number of questions to practice for this topic.
    pub goal_questions: i64,
    /// Target number of minutes to spend on this topic.
    pub goal_minutes: i64,
    pub description: String,
}

/// Input for creating a new topic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTopic {
    pub name: String,
    #[serde(default)]
    pub goal_questions: i64,
    #[serde(default)]
    pub goal_minutes: i64,
    #[serde(default)]
    pub description: String,
}

impl NewTopic {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Topics created on first run when the database holds none.
pub const DEFAULT_TOPICS: &[&str] = &[
    "Arrays",
    "Strings",
    "Two Pointers",
    "Sliding Window",
    "Hashing",
    "Stack",
    "Queue",
    "Linked List",
    "Binary Tree",
    "BST",
    "Heap / Priority Queue",
    "Graphs",
    "DFS/BFS",
    "Greedy",
    "Dynamic Programming",
    "Backtracking",
    "Bit Manipulation",
    "Math",
    "Binary Search",
    "Misc",
];
