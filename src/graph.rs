//! Module for creating and analysing commodity graphs
use crate::commodity::{CommodityID, CommodityType};
use crate::model::PeriodInput;
use crate::process::{Direction, ProcessCommodity};
use crate::site::SiteID;
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use itertools::iproduct;
use petgraph::Directed;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::Dfs;
use std::fmt::Display;

/// A graph of commodity flows for one period
type CommoditiesGraph = Graph<GraphNode, GraphEdge, Directed>;

#[derive(Eq, PartialEq, Clone, Hash, Debug)]
/// A node in the commodity graph
enum GraphNode {
    /// A commodity at a site
    Commodity(SiteID, CommodityID),
    /// Where stock purchases and intermittent supply come from
    Source,
}

impl Display for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphNode::Commodity(site_id, commodity_id) => write!(f, "{commodity_id}@{site_id}"),
            GraphNode::Source => write!(f, "SOURCE"),
        }
    }
}

#[derive(Eq, PartialEq, Clone, Debug)]
/// An edge in the commodity graph
enum GraphEdge {
    /// A commodity which is bought or harvested
    Supply,
    /// A process converting its input into its output
    Process,
    /// A transmission link between sites
    Transmission,
}

/// Helper for adding nodes to a graph only the first time they are seen
struct GraphBuilder {
    graph: CommoditiesGraph,
    nodes: IndexMap<GraphNode, NodeIndex>,
}

impl GraphBuilder {
    fn new() -> Self {
        Self {
            graph: Graph::new(),
            nodes: IndexMap::new(),
        }
    }

    fn node(&mut self, node: GraphNode) -> NodeIndex {
        *self
            .nodes
            .entry(node.clone())
            .or_insert_with(|| self.graph.add_node(node))
    }

    fn add_edge(&mut self, from: GraphNode, to: GraphNode, edge: GraphEdge) {
        let from = self.node(from);
        let to = self.node(to);
        self.graph.add_edge(from, to, edge);
    }
}

/// Creates a directed graph of commodity flows for one period.
///
/// There is an edge from commodity A to B at a site if a process there consumes A and produces B,
/// and from A at one site to A at another if a transmission link connects them. Stock and
/// intermittent supply commodities are fed from a common source node, as are the outputs of
/// processes which have no inputs.
fn create_commodities_graph(
    input: &PeriodInput,
) -> (CommoditiesGraph, IndexMap<GraphNode, NodeIndex>) {
    let mut builder = GraphBuilder::new();

    for ((site_id, commodity_id), commodity) in &input.commodities {
        let node = GraphNode::Commodity(site_id.clone(), commodity_id.clone());
        if matches!(commodity.kind, CommodityType::Stock | CommodityType::SupIm) {
            builder.add_edge(GraphNode::Source, node, GraphEdge::Supply);
        } else {
            builder.node(node);
        }
    }

    for key in input.processes.keys() {
        let Some(flows) = input.process_commodities.get(&key.process_id) else {
            continue;
        };
        let to_node = |flow: &ProcessCommodity| {
            GraphNode::Commodity(key.site_id.clone(), flow.commodity_id.clone())
        };

        let mut inputs: Vec<_> = flows
            .iter()
            .filter(|flow| flow.direction == Direction::In)
            .map(to_node)
            .collect();
        if inputs.is_empty() {
            inputs.push(GraphNode::Source);
        }
        let outputs: Vec<_> = flows
            .iter()
            .filter(|flow| flow.direction == Direction::Out)
            .map(to_node)
            .collect();
        for (from, to) in iproduct!(inputs, outputs) {
            builder.add_edge(from, to, GraphEdge::Process);
        }
    }

    for key in input.transmissions.keys() {
        builder.add_edge(
            GraphNode::Commodity(key.site_in.clone(), key.commodity_id.clone()),
            GraphNode::Commodity(key.site_out.clone(), key.commodity_id.clone()),
            GraphEdge::Transmission,
        );
    }

    (builder.graph, builder.nodes)
}

/// Check that every demand commodity can be supplied in the given period.
///
/// A demand commodity is considered suppliable if there is a chain of processes and transmission
/// links leading to it from some stock or intermittent supply commodity (or from a process with no
/// inputs). Capacities and availabilities are not taken into account.
pub fn validate_commodity_graph(input: &PeriodInput) -> Result<()> {
    let (graph, nodes) = create_commodities_graph(input);

    let mut reachable = vec![false; graph.node_count()];
    if let Some(&source) = nodes.get(&GraphNode::Source) {
        let mut dfs = Dfs::new(&graph, source);
        while let Some(idx) = dfs.next(&graph) {
            reachable[idx.index()] = true;
        }
    }

    for ((site_id, commodity_id), commodity) in &input.commodities {
        if commodity.kind != CommodityType::Demand {
            continue;
        }

        let node = GraphNode::Commodity(site_id.clone(), commodity_id.clone());
        let is_reachable = nodes.get(&node).is_some_and(|idx| reachable[idx.index()]);
        ensure!(
            is_reachable,
            "Demand commodity {node} cannot be supplied by any process or transmission link in \
             period {}",
            input.period
        );
    }

    Ok(())
}
