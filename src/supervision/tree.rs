// ThoughtTree (C4): an arena of nodes keyed by id, avoiding ownership
// cycles between parent and child links (parent/children are ids, not
// pointers).

use super::node::ThoughtNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtTree {
    pub request_id: String,
    pub root: Uuid,
    pub nodes: HashMap<Uuid, ThoughtNode>,
    pub best_path: Option<Vec<Uuid>>,
    pub pruned_count: usize,
    pub created_at: DateTime<Utc>,
    /// Free-form context about the request that produced this tree, e.g.
    /// the originating query under the "query" key.
    pub metadata: HashMap<String, String>,
    #[serde(with = "duration_millis")]
    pub build_duration: Duration,
}

impl ThoughtTree {
    pub fn new(request_id: impl Into<String>, root: ThoughtNode) -> Self {
        let root_id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);
        Self {
            request_id: request_id.into(),
            root: root_id,
            nodes,
            best_path: None,
            pruned_count: 0,
            created_at: Utc::now(),
            metadata: HashMap::new(),
            build_duration: Duration::default(),
        }
    }

    pub fn insert(&mut self, node: ThoughtNode) -> Uuid {
        let id = node.id;
        if let Some(parent_id) = node.parent {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.push(id);
            }
        }
        self.nodes.insert(id, node);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&ThoughtNode> {
        self.nodes.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn max_depth(&self) -> u32 {
        self.nodes.values().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Every complete path from root to a leaf (a node with no children
    /// or a node in a terminal state).
    pub fn leaf_paths(&self) -> Vec<Vec<Uuid>> {
        let mut out = Vec::new();
        self.collect_paths(self.root, vec![self.root], &mut out);
        out
    }

    fn collect_paths(&self, node_id: Uuid, path: Vec<Uuid>, out: &mut Vec<Vec<Uuid>>) {
        let Some(node) = self.nodes.get(&node_id) else {
            out.push(path);
            return;
        };
        let expandable_children: Vec<Uuid> = node
            .children
            .iter()
            .filter(|id| self.nodes.get(id).is_some())
            .copied()
            .collect();
        if expandable_children.is_empty() {
            out.push(path);
            return;
        }
        for child_id in expandable_children {
            let mut next = path.clone();
            next.push(child_id);
            self.collect_paths(child_id, next, out);
        }
    }

    pub fn path_nodes(&self, path: &[Uuid]) -> Vec<&ThoughtNode> {
        path.iter().filter_map(|id| self.nodes.get(id)).collect()
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}
