//
//   Copyright 2026 Basil Crow
//
//   Licensed under the Apache License, Version 2.0 (the "License");
//   you may not use this file except in compliance with the License.
//   You may obtain a copy of the License at
//
//       http://www.apache.org/licenses/LICENSE-2.0
//
//   Unless required by applicable law or agreed to in writing, software
//   distributed under the License is distributed on an "AS IS" BASIS,
//   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//   See the License for the specific language governing permissions and
//   limitations under the License.
//

//! The waits-for graph.
//!
//! A directed graph whose nodes are threads or locks, keyed by their
//! canonical string keys. A thread-to-lock edge means "this thread is
//! waiting to acquire this lock"; a lock-to-thread edge means "this lock
//! is currently held by this thread". No other edge kinds exist. Node
//! and edge insertion order is preserved through to the DOT rendering so
//! that output is deterministic and diffable.

use std::collections::HashMap;

use crate::identity::Identity;

struct Node {
    id: Identity,
    /// Outgoing edges as canonical keys, in insertion order, deduplicated.
    out: Vec<String>,
    /// Number of edges pointing at this node. Kept up to date on edge
    /// insertion so pruning does not have to rescan every adjacency list.
    incoming: usize,
}

/// Directed graph of threads and locks, built by one scan and then
/// pruned, rendered, and discarded.
#[derive(Default)]
pub struct WaitsForGraph {
    nodes: HashMap<String, Node>,
    /// Node keys in insertion order.
    order: Vec<String>,
}

impl WaitsForGraph {
    pub fn new() -> Self {
        WaitsForGraph::default()
    }

    /// Insert a node if its key is new; otherwise a no-op. An existing
    /// node is never replaced, so the first observation of an address
    /// determines its tag for the rest of the scan.
    pub fn add_node(&mut self, id: Identity) {
        let key = id.key();
        if !self.nodes.contains_key(&key) {
            self.order.push(key.clone());
            self.nodes.insert(
                key,
                Node {
                    id,
                    out: Vec::new(),
                    incoming: 0,
                },
            );
        }
    }

    /// Record an edge, inserting both endpoints if necessary. Repeated
    /// calls with the same pair are no-ops.
    pub fn add_edge(&mut self, from: Identity, to: Identity) {
        self.add_node(from);
        self.add_node(to);
        let from_key = from.key();
        let to_key = to.key();
        let from_node = self
            .nodes
            .get_mut(&from_key)
            .expect("edge source was just inserted");
        if from_node.out.contains(&to_key) {
            return;
        }
        from_node.out.push(to_key.clone());
        self.nodes
            .get_mut(&to_key)
            .expect("edge target was just inserted")
            .incoming += 1;
    }

    pub fn contains(&self, id: &Identity) -> bool {
        self.nodes.contains_key(&id.key())
    }

    pub fn contains_edge(&self, from: &Identity, to: &Identity) -> bool {
        self.nodes
            .get(&from.key())
            .map(|n| n.out.contains(&to.key()))
            .unwrap_or(false)
    }

    /// Whether any node in the graph lists this node as an edge target.
    pub fn has_incoming(&self, id: &Identity) -> bool {
        self.nodes
            .get(&id.key())
            .map(|n| n.incoming > 0)
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.out.len()).sum()
    }

    /// Remove every node that has neither outgoing edges nor incoming
    /// references. Probes mention some nodes only in passing (e.g. a
    /// thread that turned out not to be blocked); pruning keeps them out
    /// of the report.
    pub fn prune_orphans(&mut self) {
        let nodes = &self.nodes;
        let (keep, drop): (Vec<String>, Vec<String>) = self.order.drain(..).partition(|key| {
            let node = &nodes[key];
            !node.out.is_empty() || node.incoming > 0
        });
        // Orphans participate in no edge, so removing them cannot leave
        // dangling adjacency entries or stale incoming counts.
        for key in drop {
            self.nodes.remove(&key);
        }
        self.order = keep;
    }

    /// Render the graph in Graphviz DOT format: a fixed legend, one edge
    /// line per recorded edge, then one label line per node, all in
    /// insertion order.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        out.push_str("# Legend:\n");
        out.push_str("#    Thread 1 -> Lock 1 indicates Thread 1 is waiting on Lock 1\n");
        out.push_str("#    Lock 2 -> Thread 2 indicates Lock 2 is held by Thread 2\n");
        out.push_str("digraph \"mongod+lock-status\" {\n");
        for key in &self.order {
            for next_key in &self.nodes[key].out {
                out.push_str(&format!("    \"{}\" -> \"{}\";\n", key, next_key));
            }
        }
        for key in &self.order {
            out.push_str(&format!(
                "    \"{}\" [label=\"{}\"];\n",
                key,
                self.nodes[key].id.label()
            ));
        }
        out.push_str("}\n");
        out
    }
}
