//! Shader graph model: typed nodes, ports and explicit connections.
//!
//! The graph is built by an external collaborator (an editor export, a
//! document loader) and is immutable during generation. Construction helpers
//! here exist so hosts and tests can assemble graphs programmatically; the
//! generator itself never parses serialized formats.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::codegen::{CodegenError, ValueType};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShaderGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Final outputs the host asks for; generation prunes to nodes reachable
    /// from these.
    #[serde(default)]
    pub outputs: Vec<OutputBinding>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub inputs: Vec<Port>,
    #[serde(default)]
    pub outputs: Vec<Port>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Port {
    pub id: String,
    #[serde(rename = "type")]
    pub port_type: ValueType,
    /// Literal fallback used when the port has no incoming connection.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Connection {
    pub from: Endpoint,
    pub to: Endpoint,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Endpoint {
    #[serde(rename = "nodeId")]
    pub node_id: String,
    #[serde(rename = "portId")]
    pub port_id: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputBinding {
    pub id: String,
    #[serde(rename = "nodeId")]
    pub node_id: String,
    #[serde(rename = "portId", default = "default_out_port")]
    pub port_id: String,
}

fn default_out_port() -> String {
    "out".to_string()
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            params: HashMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn with_input(mut self, port: Port) -> Self {
        self.inputs.push(port);
        self
    }

    pub fn with_output(mut self, port: Port) -> Self {
        self.outputs.push(port);
        self
    }
}

impl Port {
    pub fn new(id: impl Into<String>, port_type: ValueType) -> Self {
        Self {
            id: id.into(),
            port_type,
            default: None,
        }
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }
}

impl ShaderGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            connections: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: Node) -> &mut Self {
        self.nodes.push(node);
        self
    }

    pub fn connect(
        &mut self,
        from_node: &str,
        from_port: &str,
        to_node: &str,
        to_port: &str,
    ) -> &mut Self {
        self.connections.push(Connection {
            from: Endpoint {
                node_id: from_node.to_string(),
                port_id: from_port.to_string(),
            },
            to: Endpoint {
                node_id: to_node.to_string(),
                port_id: to_port.to_string(),
            },
        });
        self
    }

    pub fn bind_output(&mut self, id: &str, node_id: &str, port_id: &str) -> &mut Self {
        self.outputs.push(OutputBinding {
            id: id.to_string(),
            node_id: node_id.to_string(),
            port_id: port_id.to_string(),
        });
        self
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn incoming_connection(&self, to_node_id: &str, to_port_id: &str) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.to.node_id == to_node_id && c.to.port_id == to_port_id)
    }

    /// Structural validation: unique node ids, no dangling endpoints, at most
    /// one connection per input port, acyclic connection graph.
    pub fn validate(&self) -> Result<(), CodegenError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(CodegenError::InvalidGraph(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
        }

        let mut fan_in: HashSet<(&str, &str)> = HashSet::new();
        for conn in &self.connections {
            for endpoint in [&conn.from, &conn.to] {
                if !seen.contains(endpoint.node_id.as_str()) {
                    return Err(CodegenError::InvalidGraph(format!(
                        "connection references unknown node '{}'",
                        endpoint.node_id
                    )));
                }
            }
            if !fan_in.insert((conn.to.node_id.as_str(), conn.to.port_id.as_str())) {
                return Err(CodegenError::InvalidGraph(format!(
                    "input port '{}.{}' has more than one incoming connection",
                    conn.to.node_id, conn.to.port_id
                )));
            }
        }

        for output in &self.outputs {
            if !seen.contains(output.node_id.as_str()) {
                return Err(CodegenError::InvalidGraph(format!(
                    "output '{}' references unknown node '{}'",
                    output.id, output.node_id
                )));
            }
        }

        // Cycle detection falls out of the topological sort.
        self.topo_order().map(|_| ())
    }

    /// Topological order over all nodes, computed once up front with a Kahn
    /// worklist. Ties break by node declaration order, which makes the
    /// traversal (and therefore the generated source) deterministic.
    pub fn topo_order(&self) -> Result<Vec<&Node>, CodegenError> {
        let index_by_id: HashMap<&str, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut indegree = vec![0usize; self.nodes.len()];
        let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for conn in &self.connections {
            let (Some(&from), Some(&to)) = (
                index_by_id.get(conn.from.node_id.as_str()),
                index_by_id.get(conn.to.node_id.as_str()),
            ) else {
                continue;
            };
            indegree[to] += 1;
            downstream[from].push(to);
        }

        let mut ready: std::collections::BTreeSet<usize> = indegree
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d == 0)
            .map(|(i, _)| i)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(&next) = ready.iter().next() {
            ready.remove(&next);
            order.push(&self.nodes[next]);
            for &succ in &downstream[next] {
                indegree[succ] -= 1;
                if indegree[succ] == 0 {
                    ready.insert(succ);
                }
            }
        }

        if order.len() != self.nodes.len() {
            // Every unordered node sits on (or downstream of) a cycle; report
            // the first one in declaration order.
            let ordered: HashSet<&str> = order.iter().map(|n| n.id.as_str()).collect();
            let offender = self
                .nodes
                .iter()
                .find(|n| !ordered.contains(n.id.as_str()))
                .map(|n| n.id.clone())
                .unwrap_or_default();
            return Err(CodegenError::CyclicGraph { node_id: offender });
        }

        Ok(order)
    }

    /// Node ids reachable (upstream) from the graph's output bindings.
    pub fn reachable_from_outputs(&self) -> HashSet<&str> {
        let mut reachable: HashSet<&str> = HashSet::new();
        let mut worklist: Vec<&str> = self
            .outputs
            .iter()
            .map(|o| o.node_id.as_str())
            .collect();
        while let Some(node_id) = worklist.pop() {
            if !reachable.insert(node_id) {
                continue;
            }
            for conn in &self.connections {
                if conn.to.node_id == node_id {
                    worklist.push(conn.from.node_id.as_str());
                }
            }
        }
        reachable
    }
}

impl Default for ShaderGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> ShaderGraph {
        // a -> b, a -> c, b -> d, c -> d
        let mut g = ShaderGraph::new();
        g.add_node(Node::new("d", "add"))
            .add_node(Node::new("b", "sin"))
            .add_node(Node::new("c", "cos"))
            .add_node(Node::new("a", "time"));
        g.connect("a", "out", "b", "in")
            .connect("a", "out", "c", "in")
            .connect("b", "out", "d", "in1")
            .connect("c", "out", "d", "in2");
        g.bind_output("color", "d", "out");
        g
    }

    #[test]
    fn topo_order_respects_dependencies() {
        let g = diamond();
        let order: Vec<&str> = g.topo_order().unwrap().iter().map(|n| n.id.as_str()).collect();
        let pos = |id: &str| order.iter().position(|x| *x == id).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("a") < pos("c"));
        assert!(pos("b") < pos("d"));
        assert!(pos("c") < pos("d"));
    }

    #[test]
    fn topo_order_is_deterministic() {
        let g = diamond();
        let first: Vec<String> = g
            .topo_order()
            .unwrap()
            .iter()
            .map(|n| n.id.clone())
            .collect();
        let second: Vec<String> = g
            .topo_order()
            .unwrap()
            .iter()
            .map(|n| n.id.clone())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn cycle_is_rejected_at_validation() {
        let mut g = ShaderGraph::new();
        g.add_node(Node::new("x", "add")).add_node(Node::new("y", "add"));
        g.connect("x", "out", "y", "in1").connect("y", "out", "x", "in1");
        let err = g.validate().unwrap_err();
        assert!(matches!(err, CodegenError::CyclicGraph { .. }));
    }

    #[test]
    fn fan_in_on_one_port_is_rejected() {
        let mut g = ShaderGraph::new();
        g.add_node(Node::new("a", "time"))
            .add_node(Node::new("b", "time"))
            .add_node(Node::new("c", "add"));
        g.connect("a", "out", "c", "in1").connect("b", "out", "c", "in1");
        let err = g.validate().unwrap_err();
        assert!(matches!(err, CodegenError::InvalidGraph(_)));
    }

    #[test]
    fn dangling_endpoint_is_rejected() {
        let mut g = ShaderGraph::new();
        g.add_node(Node::new("a", "time"));
        g.connect("a", "out", "ghost", "in");
        assert!(matches!(
            g.validate().unwrap_err(),
            CodegenError::InvalidGraph(_)
        ));
    }

    #[test]
    fn reachability_prunes_disconnected_islands() {
        let mut g = diamond();
        g.add_node(Node::new("island", "time"));
        let reachable = g.reachable_from_outputs();
        assert!(reachable.contains("a"));
        assert!(reachable.contains("d"));
        assert!(!reachable.contains("island"));
    }

    #[test]
    fn graph_round_trips_through_json() {
        let g = diamond();
        let json = serde_json::to_string(&g).unwrap();
        let back: ShaderGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.nodes.len(), g.nodes.len());
        assert_eq!(back.connections.len(), g.connections.len());
        assert!(json.contains("\"nodeId\""));
    }
}
