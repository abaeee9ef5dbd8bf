//! Multi-profile reachability validation over the navigation graph.
//!
//! Each agent profile gets an independent breadth-first flood fill from a
//! common start node, following only links whose gate that profile can pass.
//! Fills are read-only and run in parallel, one rayon task per profile; the
//! merge into a [`ValidationReport`] and the write of the graph's summary
//! counter happen once, after every fill has finished.
//!
//! Unreachable areas are diagnostics, not failures: the report lists an
//! [`NavigationIssue`] for every node a profile could not reach plus an
//! `AddConnection` quick fix for each.

use crate::capability::{Ability, AgentCapabilities, Polarity};
use crate::identity::INVALID_ID;
use crate::navigation::NavigationGraph;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationIssueType {
    UnreachableNode,
}

/// One node a profile could not reach, and the gate that stopped it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationIssue {
    pub issue_type: NavigationIssueType,
    pub node_id: u32,
    /// Reachable node on the far side of the blocking link, or
    /// [`INVALID_ID`] when no link leads in from the reachable region.
    pub related_node_id: u32,
    /// Polarity the profile lacks for the blocking gate.
    pub required_polarity: Polarity,
    /// Abilities the profile lacks for the blocking gate.
    pub required_abilities: Ability,
    pub profile: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuickFixType {
    AddConnection,
    SoftenGate,
    ChangePolarity,
    AddAlternativePath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationQuickFix {
    pub fix_type: QuickFixType,
    pub target_node_id: u32,
    pub description: String,
}

/// Reachable/unreachable split for a single profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileReachability {
    pub label: String,
    pub reachable: BTreeSet<u32>,
    pub unreachable: BTreeSet<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_nodes: u32,
    pub total_links: u32,
    /// Summed over profiles; a node missed by three profiles counts three times.
    pub unreachable_node_count: u32,
    /// Link components (gates ignored) that don't contain the start node.
    pub isolated_component_count: u32,
    pub has_unreachable_areas: bool,
    /// Nodes unreachable for at least one profile.
    pub unreachable_node_ids: BTreeSet<u32>,
    pub issues: Vec<NavigationIssue>,
    pub quick_fixes: Vec<NavigationQuickFix>,
    pub profiles: Vec<ProfileReachability>,
    pub start_node_id: Option<u32>,
}

impl ValidationReport {
    pub fn profile(&self, label: &str) -> Option<&ProfileReachability> {
        self.profiles.iter().find(|p| p.label == label)
    }

    pub fn issues_for(&self, label: &str) -> impl Iterator<Item = &NavigationIssue> + '_ {
        let label = label.to_string();
        self.issues.iter().filter(move |i| i.profile == label)
    }
}

/// First node (in graph order) with at least one link; falls back to the
/// first node so a single-node world counts as reachable.
pub fn pick_start_node(graph: &NavigationGraph) -> Option<u32> {
    graph
        .nodes()
        .iter()
        .find(|n| graph.has_links(n.node_id))
        .or_else(|| graph.nodes().first())
        .map(|n| n.node_id)
}

/// Breadth-first flood fill from `start`, following passable links only.
/// Links leading to id 0 or to unknown nodes are skipped.
pub fn flood_fill(
    graph: &NavigationGraph,
    capabilities: &AgentCapabilities,
    start: u32,
) -> HashSet<u32> {
    let mut visited = HashSet::new();
    if !graph.has_node(start) {
        return visited;
    }
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for link in graph.outgoing_links(current) {
            let next = link.get_destination(current);
            if next == INVALID_ID || !graph.has_node(next) || visited.contains(&next) {
                continue;
            }
            if link.can_traverse_with(capabilities, current) {
                visited.insert(next);
                queue.push_back(next);
            }
        }
    }

    visited
}

/// Count undirected link components that don't contain `start`. Nodes with
/// no links are components of their own.
pub fn count_isolated_components(graph: &NavigationGraph, start: Option<u32>) -> u32 {
    let mut adj: HashMap<u32, Vec<u32>> = HashMap::new();
    for link in graph.links() {
        if graph.has_node(link.from_node_id) && graph.has_node(link.to_node_id) {
            adj.entry(link.from_node_id).or_default().push(link.to_node_id);
            adj.entry(link.to_node_id).or_default().push(link.from_node_id);
        }
    }

    let mut seen: HashSet<u32> = HashSet::new();
    let mut isolated = 0;
    for node in graph.nodes() {
        if !seen.insert(node.node_id) {
            continue;
        }
        let mut contains_start = Some(node.node_id) == start;
        let mut queue = VecDeque::from([node.node_id]);
        while let Some(current) = queue.pop_front() {
            if let Some(neighbors) = adj.get(&current) {
                for &next in neighbors {
                    if seen.insert(next) {
                        contains_start |= Some(next) == start;
                        queue.push_back(next);
                    }
                }
            }
        }
        if !contains_start {
            isolated += 1;
        }
    }
    isolated
}

/// Explain why `node_id` is missing from `reachable` for this profile.
fn diagnose(
    graph: &NavigationGraph,
    capabilities: &AgentCapabilities,
    reachable: &HashSet<u32>,
    node_id: u32,
) -> NavigationIssue {
    let blocking = graph.links_touching(node_id).find_map(|link| {
        let other = if link.from_node_id == node_id {
            link.to_node_id
        } else {
            link.from_node_id
        };
        (reachable.contains(&other) && link.get_destination(other) == node_id)
            .then_some((other, link))
    });

    match blocking {
        Some((from, link)) => {
            let (polarity, abilities) = link
                .gate
                .missing_requirements(capabilities.owned_polarity, capabilities.owned_abilities);
            NavigationIssue {
                issue_type: NavigationIssueType::UnreachableNode,
                node_id,
                related_node_id: from,
                required_polarity: polarity,
                required_abilities: abilities,
                profile: capabilities.label.clone(),
                description: format!(
                    "{} cannot reach node {} from node {}: {} (missing polarity {:?}, abilities {:?})",
                    capabilities.label,
                    node_id,
                    from,
                    link.gate.summary(),
                    polarity,
                    abilities
                ),
            }
        }
        None => NavigationIssue {
            issue_type: NavigationIssueType::UnreachableNode,
            node_id,
            related_node_id: INVALID_ID,
            required_polarity: Polarity::NONE,
            required_abilities: Ability::NONE,
            profile: capabilities.label.clone(),
            description: format!(
                "{} cannot reach node {}: no link leads in from the reachable region",
                capabilities.label, node_id
            ),
        },
    }
}

fn quick_fix_for(issue: &NavigationIssue) -> NavigationQuickFix {
    let description = if issue.related_node_id == INVALID_ID {
        format!(
            "Add a connection from the reachable region to node {}",
            issue.node_id
        )
    } else {
        format!(
            "Add an ungated connection from node {} to node {}",
            issue.related_node_id, issue.node_id
        )
    };
    NavigationQuickFix {
        fix_type: QuickFixType::AddConnection,
        target_node_id: issue.node_id,
        description,
    }
}

/// Validate `graph` against every profile. Pure: touches no graph state.
pub fn validate(graph: &NavigationGraph, profiles: &[AgentCapabilities]) -> ValidationReport {
    let start = pick_start_node(graph);

    let fills: Vec<HashSet<u32>> = profiles
        .par_iter()
        .map(|profile| match start {
            Some(s) => flood_fill(graph, profile, s),
            None => HashSet::new(),
        })
        .collect();

    let mut report = ValidationReport {
        total_nodes: graph.node_count(),
        total_links: graph.link_count(),
        isolated_component_count: count_isolated_components(graph, start),
        start_node_id: start,
        ..Default::default()
    };

    for (profile, reachable) in profiles.iter().zip(&fills) {
        let unreachable: BTreeSet<u32> = graph
            .nodes()
            .iter()
            .map(|n| n.node_id)
            .filter(|id| !reachable.contains(id))
            .collect();

        if !unreachable.is_empty() {
            log::warn!(
                "Profile {}: {} of {} nodes unreachable (e.g. node #{})",
                profile.label,
                unreachable.len(),
                graph.node_count(),
                unreachable.iter().next().copied().unwrap_or(INVALID_ID)
            );
        }

        for &node_id in &unreachable {
            let issue = diagnose(graph, profile, reachable, node_id);
            log::debug!("{}", issue.description);
            report.quick_fixes.push(quick_fix_for(&issue));
            report.issues.push(issue);
        }

        report.unreachable_node_count += unreachable.len() as u32;
        report.unreachable_node_ids.extend(unreachable.iter().copied());
        report.profiles.push(ProfileReachability {
            label: profile.label.clone(),
            reachable: reachable.iter().copied().collect(),
            unreachable,
        });
    }

    report.has_unreachable_areas = report.unreachable_node_count > 0;
    log::info!(
        "Validation: {} nodes, {} links, {} unreachable across {} profiles, {} isolated components",
        report.total_nodes,
        report.total_links,
        report.unreachable_node_count,
        profiles.len(),
        report.isolated_component_count
    );
    report
}

/// Validate a snapshot of `graph` and write the summary counter once.
/// Returns `None` while the graph is not ready.
pub fn run_validation_pass(
    graph: &mut NavigationGraph,
    profiles: &[AgentCapabilities],
) -> Option<ValidationReport> {
    if !graph.is_ready() {
        log::warn!("Validation requested before navigation graph is ready");
        return None;
    }
    let snapshot = graph.snapshot();
    let report = validate(&snapshot, profiles);
    graph.record_unreachable_areas(report.unreachable_node_count);
    Some(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::standard_profiles;
    use crate::gate::{GateCondition, Softness};
    use crate::geometry::Vec3;
    use crate::navigation::{BiomeType, NavLink, NavNode};

    fn node(id: u32) -> NavNode {
        NavNode {
            node_id: id,
            world_position: Vec3::ZERO,
            biome_type: BiomeType::Neutral,
            primary_polarity: Polarity::NONE,
        }
    }

    fn jump_link(a: u32, b: u32) -> NavLink {
        NavLink::bidirectional(a, b).with_gate(
            GateCondition::new(Softness::Hard).requiring_abilities(Ability::JUMP),
        )
    }

    fn novice() -> AgentCapabilities {
        AgentCapabilities::new("Novice")
    }

    fn master() -> AgentCapabilities {
        AgentCapabilities::new("Master")
            .with_polarity(Polarity::ALL_BASE)
            .with_abilities(Ability::EVERYTHING)
            .with_skill(1.0)
    }

    #[test]
    fn test_two_node_hard_jump_gate() {
        let graph = NavigationGraph::from_parts(vec![node(1), node(2)], vec![jump_link(1, 2)]);

        let report = validate(&graph, &[novice()]);
        assert_eq!(report.unreachable_node_count, 1);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].issue_type, NavigationIssueType::UnreachableNode);
        assert_eq!(report.issues[0].node_id, 2);
        assert_eq!(report.issues[0].related_node_id, 1);
        assert_eq!(report.issues[0].required_abilities, Ability::JUMP);
        assert_eq!(report.quick_fixes.len(), 1);
        assert_eq!(report.quick_fixes[0].fix_type, QuickFixType::AddConnection);
        assert_eq!(report.quick_fixes[0].target_node_id, 2);
        assert!(report.has_unreachable_areas);

        let report = validate(&graph, &[master()]);
        assert_eq!(report.unreachable_node_count, 0);
        assert!(report.issues.is_empty());
        assert!(!report.has_unreachable_areas);
    }

    #[test]
    fn test_unreachable_count_sums_over_profiles() {
        let graph = NavigationGraph::from_parts(
            vec![node(1), node(2), node(3)],
            vec![NavLink::bidirectional(1, 2), jump_link(2, 3)],
        );
        let report = validate(&graph, &[novice(), novice(), master()]);
        assert_eq!(report.unreachable_node_count, 2);
        assert_eq!(report.unreachable_node_ids, BTreeSet::from([3]));
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.profiles.len(), 3);
    }

    #[test]
    fn test_directional_link_not_walked_backwards() {
        let graph = NavigationGraph::from_parts(
            vec![node(1), node(2), node(3)],
            vec![NavLink::bidirectional(1, 2), NavLink::directional(3, 2)],
        );
        let reachable = flood_fill(&graph, &novice(), 1);
        assert_eq!(reachable, HashSet::from([1, 2]));
    }

    #[test]
    fn test_isolated_node_has_no_related_node() {
        let graph = NavigationGraph::from_parts(
            vec![node(1), node(2), node(3)],
            vec![NavLink::bidirectional(1, 2)],
        );
        let report = validate(&graph, &[master()]);
        assert_eq!(report.unreachable_node_ids, BTreeSet::from([3]));
        assert_eq!(report.issues[0].related_node_id, INVALID_ID);
        assert_eq!(report.isolated_component_count, 1);
        assert!(report.quick_fixes[0].description.contains("reachable region"));
    }

    #[test]
    fn test_malformed_links_are_skipped() {
        let graph = NavigationGraph::from_parts(
            vec![node(1), node(2)],
            vec![
                NavLink::bidirectional(1, 2),
                NavLink::bidirectional(1, INVALID_ID),
                NavLink::bidirectional(2, 99),
            ],
        );
        let reachable = flood_fill(&graph, &novice(), 1);
        assert_eq!(reachable, HashSet::from([1, 2]));
        assert_eq!(count_isolated_components(&graph, Some(1)), 0);
    }

    #[test]
    fn test_start_node_prefers_linked_node() {
        let graph = NavigationGraph::from_parts(
            vec![node(5), node(6), node(7)],
            vec![NavLink::bidirectional(6, 7)],
        );
        assert_eq!(pick_start_node(&graph), Some(6));

        let lonely = NavigationGraph::from_parts(vec![node(4)], vec![]);
        assert_eq!(pick_start_node(&lonely), Some(4));
        let report = validate(&lonely, &standard_profiles());
        assert_eq!(report.unreachable_node_count, 0);

        assert_eq!(pick_start_node(&NavigationGraph::new()), None);
    }

    #[test]
    fn test_empty_graph_report() {
        let report = validate(&NavigationGraph::new(), &standard_profiles());
        assert_eq!(report.total_nodes, 0);
        assert_eq!(report.unreachable_node_count, 0);
        assert_eq!(report.start_node_id, None);
        assert_eq!(report.profiles.len(), 5);
    }

    #[test]
    fn test_run_validation_pass_requires_ready_graph() {
        let mut graph = NavigationGraph::from_parts(vec![node(1), node(2)], vec![jump_link(1, 2)]);
        let report = run_validation_pass(&mut graph, &[novice()]).unwrap();
        assert_eq!(graph.unreachable_area_count(), report.unreachable_node_count);
        assert_eq!(graph.unreachable_area_count(), 1);

        graph.begin_rebuild();
        assert!(run_validation_pass(&mut graph, &[novice()]).is_none());
    }

    #[test]
    fn test_validation_is_repeatable() {
        let graph = NavigationGraph::from_parts(
            vec![node(1), node(2), node(3)],
            vec![jump_link(1, 2), NavLink::bidirectional(1, 3)],
        );
        let first = validate(&graph, &standard_profiles());
        let second = validate(&graph, &standard_profiles());
        assert_eq!(first, second);
    }

    #[test]
    fn test_report_lookup_by_profile() {
        let graph = NavigationGraph::from_parts(vec![node(1), node(2)], vec![jump_link(1, 2)]);
        let report = validate(&graph, &[novice(), master()]);
        assert_eq!(report.issues_for("Novice").count(), 1);
        assert_eq!(report.issues_for("Master").count(), 0);
        assert!(report.profile("Master").unwrap().unreachable.is_empty());
    }
}
