// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Visibility engine: node and link predicates derived from the current
//! filter state, plus the pure reducer that evolves that state.
//!
//! A link is visible only when both of its endpoints are. [`VisibilityMask`]
//! derives link visibility from the node mask it just computed, so the two can
//! never disagree.

use std::collections::{BTreeSet, HashMap};

use lineage_graph::{Domain, DomainId, Link, LinkKind, Node, NodeKind, UNASSIGNED_DOMAIN};
use serde::{Deserialize, Serialize};

/// Read-only id lookups needed by the predicates.
pub trait NodeLookup {
    /// Node by id.
    fn node(&self, id: &str) -> Option<&Node>;
    /// Domain by id.
    fn domain(&self, id: &str) -> Option<&Domain>;
}

/// UI filter state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    /// Free-text search; empty means inactive.
    pub search: String,
    /// Domains switched off.
    pub hidden_domains: BTreeSet<DomainId>,
    /// Domain in isolate/focus mode.
    pub isolated_domain: Option<DomainId>,
    /// Whether unassigned workspaces may be shown at all.
    pub show_unassigned: bool,
    /// Show only unassigned workspaces (and hide every link).
    pub unassigned_only: bool,
    /// Node kinds switched off.
    pub hidden_kinds: BTreeSet<NodeKind>,
    /// `Contains` links switched on.
    pub show_contains: bool,
    /// `CrossWorkspace` links switched on.
    pub show_cross_workspace: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            hidden_domains: BTreeSet::new(),
            isolated_domain: None,
            show_unassigned: true,
            unassigned_only: false,
            hidden_kinds: BTreeSet::new(),
            show_contains: true,
            show_cross_workspace: true,
        }
    }
}

impl FilterState {
    /// Lower-cased search needle, when a search is active.
    pub fn needle(&self) -> Option<String> {
        let trimmed = self.search.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
    }

    /// Whether links of `kind` are switched on.
    pub fn shows_link_kind(&self, kind: LinkKind) -> bool {
        match kind {
            LinkKind::Contains => self.show_contains,
            LinkKind::CrossWorkspace => self.show_cross_workspace,
        }
    }
}

/// Domain id of a workspace node (`UNASSIGNED` when it has none).
pub fn workspace_domain(ws: &Node) -> &str {
    ws.metadata.domain_id.as_deref().unwrap_or(UNASSIGNED_DOMAIN)
}

fn is_unassigned_ws(ws: &Node) -> bool {
    ws.metadata.is_unassigned || workspace_domain(ws) == UNASSIGNED_DOMAIN
}

/// Workspace rules; first match wins.
fn workspace_visible(ws: &Node, f: &FilterState) -> bool {
    let unassigned = is_unassigned_ws(ws);
    if !f.show_unassigned && unassigned {
        return false;
    }
    if f.unassigned_only {
        return unassigned;
    }
    let domain = workspace_domain(ws);
    if f.hidden_domains.contains(domain) {
        return false;
    }
    if f.isolated_domain.as_deref().is_some_and(|iso| iso != domain) {
        return false;
    }
    !f.hidden_kinds.contains(&NodeKind::Workspace)
}

fn domain_name<'a, L: NodeLookup + ?Sized>(ws: &'a Node, lookup: &'a L) -> &'a str {
    let id = workspace_domain(ws);
    match lookup.domain(id) {
        Some(d) => &d.name,
        None if id == UNASSIGNED_DOMAIN => "Unassigned",
        None => id,
    }
}

fn matches_search<L: NodeLookup + ?Sized>(node: &Node, ws: &Node, lookup: &L, needle: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(needle);
    hit(&node.name) || hit(node.kind.label()) || hit(domain_name(ws, lookup)) || hit(&ws.name)
}

/// Node visibility under `filter`.
///
/// Workspaces follow the workspace rules. Artifacts must pass their kind
/// toggle, inherit their workspace's visibility and, when a search is active,
/// match it on name, kind label, domain name or workspace name.
pub fn is_node_visible<L: NodeLookup + ?Sized>(node: &Node, filter: &FilterState, lookup: &L) -> bool {
    is_node_visible_with(node, filter, lookup, filter.needle().as_deref())
}

fn is_node_visible_with<L: NodeLookup + ?Sized>(
    node: &Node,
    filter: &FilterState,
    lookup: &L,
    needle: Option<&str>,
) -> bool {
    if node.is_workspace() {
        return workspace_visible(node, filter);
    }
    if filter.hidden_kinds.contains(&node.kind) {
        return false;
    }
    let Some(ws) = node
        .workspace_id
        .as_deref()
        .and_then(|id| lookup.node(id))
        .filter(|ws| ws.is_workspace())
    else {
        return false;
    };
    if !workspace_visible(ws, filter) {
        return false;
    }
    needle.is_none_or(|n| matches_search(node, ws, lookup, n))
}

/// Link visibility under `filter`: never in unassigned-only mode, otherwise
/// the link-kind toggle and both endpoints must pass.
pub fn is_link_visible<L: NodeLookup + ?Sized>(link: &Link, filter: &FilterState, lookup: &L) -> bool {
    if filter.unassigned_only || !filter.shows_link_kind(link.kind) {
        return false;
    }
    let needle = filter.needle();
    let endpoint = |id: &str| {
        lookup
            .node(id)
            .is_some_and(|n| is_node_visible_with(n, filter, lookup, needle.as_deref()))
    };
    endpoint(link.source_id()) && endpoint(link.target_id())
}

/// Precomputed visibility for a whole graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityMask {
    /// One flag per node, aligned with the node slice.
    pub nodes: Vec<bool>,
    /// One flag per link, aligned with the link slice.
    pub links: Vec<bool>,
}

impl VisibilityMask {
    /// Evaluates every node once, then derives links from the node flags.
    pub fn compute<L: NodeLookup + ?Sized>(
        nodes: &[Node],
        links: &[Link],
        filter: &FilterState,
        lookup: &L,
    ) -> Self {
        let needle = filter.needle();
        let node_flags: Vec<bool> = nodes
            .iter()
            .map(|n| is_node_visible_with(n, filter, lookup, needle.as_deref()))
            .collect();
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();
        let flag = |id: &str| index.get(id).is_some_and(|&i| node_flags[i]);
        let link_flags = links
            .iter()
            .map(|l| {
                !filter.unassigned_only
                    && filter.shows_link_kind(l.kind)
                    && flag(l.source_id())
                    && flag(l.target_id())
            })
            .collect();
        Self {
            nodes: node_flags,
            links: link_flags,
        }
    }

    /// Number of visible nodes.
    pub fn visible_nodes(&self) -> usize {
        self.nodes.iter().filter(|v| **v).count()
    }

    /// Number of visible links.
    pub fn visible_links(&self) -> usize {
        self.links.iter().filter(|v| **v).count()
    }
}

/// Borrowing [`NodeLookup`] over plain slices.
#[derive(Debug, Default)]
pub struct SliceLookup<'a> {
    nodes: HashMap<&'a str, &'a Node>,
    domains: HashMap<&'a str, &'a Domain>,
}

impl<'a> SliceLookup<'a> {
    /// Indexes `nodes` and `domains` by id.
    pub fn new(nodes: &'a [Node], domains: &'a [Domain]) -> Self {
        Self {
            nodes: nodes.iter().map(|n| (n.id.as_str(), n)).collect(),
            domains: domains.iter().map(|d| (d.id.as_str(), d)).collect(),
        }
    }
}

impl NodeLookup for SliceLookup<'_> {
    fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id).copied()
    }

    fn domain(&self, id: &str) -> Option<&Domain> {
        self.domains.get(id).copied()
    }
}

/// Filter-state transitions triggered by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
    /// Search text edited.
    SetSearch(String),
    /// Hide a domain.
    HideDomain(DomainId),
    /// Show a previously hidden domain.
    ShowDomain(DomainId),
    /// Flip a domain's hidden flag.
    ToggleDomain(DomainId),
    /// Enter isolate mode for a domain.
    Isolate(DomainId),
    /// Leave isolate mode.
    ClearIsolation,
    /// Switch unassigned workspaces on or off.
    SetShowUnassigned(bool),
    /// Enter or leave unassigned-only mode.
    SetUnassignedOnly(bool),
    /// Flip a node-kind toggle.
    ToggleKind(NodeKind),
    /// Flip a link-kind toggle.
    ToggleLinkKind(LinkKind),
    /// Back to defaults.
    Reset,
}

/// Pure filter-state transition.
pub fn reduce(state: &FilterState, ev: FilterEvent) -> FilterState {
    let mut next = state.clone();
    match ev {
        FilterEvent::SetSearch(s) => next.search = s,
        FilterEvent::HideDomain(d) => {
            next.hidden_domains.insert(d);
        }
        FilterEvent::ShowDomain(d) => {
            next.hidden_domains.remove(&d);
        }
        FilterEvent::ToggleDomain(d) => {
            if !next.hidden_domains.remove(&d) {
                next.hidden_domains.insert(d);
            }
        }
        FilterEvent::Isolate(d) => {
            next.hidden_domains.remove(&d);
            next.unassigned_only = false;
            if d == UNASSIGNED_DOMAIN {
                next.show_unassigned = true;
            }
            next.isolated_domain = Some(d);
        }
        FilterEvent::ClearIsolation => next.isolated_domain = None,
        FilterEvent::SetShowUnassigned(on) => {
            next.show_unassigned = on;
            if !on {
                next.unassigned_only = false;
            }
        }
        FilterEvent::SetUnassignedOnly(on) => {
            next.unassigned_only = on;
            if on {
                next.show_unassigned = true;
                next.isolated_domain = None;
            }
        }
        FilterEvent::ToggleKind(k) => {
            if !next.hidden_kinds.remove(&k) {
                next.hidden_kinds.insert(k);
            }
        }
        FilterEvent::ToggleLinkKind(LinkKind::Contains) => next.show_contains = !next.show_contains,
        FilterEvent::ToggleLinkKind(LinkKind::CrossWorkspace) => {
            next.show_cross_workspace = !next.show_cross_workspace;
        }
        FilterEvent::Reset => next = FilterState::default(),
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ws(id: &str, domain: &str, name: &str) -> Node {
        let mut n = Node::new(id, NodeKind::Workspace, name);
        n.metadata.domain_id = Some(domain.to_owned());
        n.metadata.is_unassigned = domain == UNASSIGNED_DOMAIN;
        n
    }

    fn fixture() -> (Vec<Node>, Vec<Link>, Vec<Domain>) {
        let nodes = vec![
            ws("wa", "d1", "Finance Hub"),
            ws("wb", "d2", "Marketing"),
            ws("wu", UNASSIGNED_DOMAIN, "Sandbox"),
            Node::new("ds1", NodeKind::SemanticModel, "Orders").in_workspace("wa"),
            Node::new("lh", NodeKind::Lakehouse, "Bronze").in_workspace("wb"),
            Node::new("nb", NodeKind::Notebook, "Scratch").in_workspace("wu"),
        ];
        let links = vec![
            Link::contains("wa", "ds1"),
            Link::contains("wb", "lh"),
            Link::contains("wu", "nb"),
            Link::contains("ds1", "lh"),
            Link::cross_workspace("wa", "wb"),
        ];
        let domains = vec![
            Domain {
                id: "d1".into(),
                name: "Finance".into(),
                description: None,
                parent_domain_id: None,
            },
            Domain {
                id: "d2".into(),
                name: "Marketing".into(),
                description: None,
                parent_domain_id: None,
            },
        ];
        (nodes, links, domains)
    }

    fn visible_ids(filter: &FilterState) -> Vec<String> {
        let (nodes, _, domains) = fixture();
        let lookup = SliceLookup::new(&nodes, &domains);
        nodes
            .iter()
            .filter(|n| is_node_visible(n, filter, &lookup))
            .map(|n| n.id.clone())
            .collect()
    }

    #[test]
    fn default_filter_shows_everything() {
        assert_eq!(visible_ids(&FilterState::default()).len(), 6);
    }

    #[test]
    fn hiding_unassigned_hides_workspace_and_artifacts() {
        let f = reduce(&FilterState::default(), FilterEvent::SetShowUnassigned(false));
        let ids = visible_ids(&f);
        assert!(!ids.contains(&"wu".to_owned()));
        assert!(!ids.contains(&"nb".to_owned()));
    }

    #[test]
    fn unassigned_only_hides_every_link() {
        let f = reduce(&FilterState::default(), FilterEvent::SetUnassignedOnly(true));
        assert_eq!(visible_ids(&f), ["wu", "nb"]);
        let (nodes, links, domains) = fixture();
        let lookup = SliceLookup::new(&nodes, &domains);
        assert!(links.iter().all(|l| !is_link_visible(l, &f, &lookup)));
    }

    #[test]
    fn isolation_and_hidden_domains() {
        let f = reduce(&FilterState::default(), FilterEvent::Isolate("d1".into()));
        assert_eq!(visible_ids(&f), ["wa", "ds1"]);
        let f = reduce(&FilterState::default(), FilterEvent::HideDomain("d2".into()));
        assert_eq!(visible_ids(&f), ["wa", "wu", "ds1", "nb"]);
    }

    #[test]
    fn kind_toggle_does_not_override_workspace_inheritance() {
        let f = reduce(&FilterState::default(), FilterEvent::ToggleKind(NodeKind::Workspace));
        // Artifacts of hidden workspaces are hidden regardless of their own toggle.
        assert!(visible_ids(&f).is_empty());
    }

    #[test]
    fn search_matches_domain_and_workspace_names() {
        let by_domain = FilterState {
            search: "finance".into(),
            ..FilterState::default()
        };
        // Workspaces are not subject to search; ds1 matches via domain name.
        assert_eq!(visible_ids(&by_domain), ["wa", "wb", "wu", "ds1"]);
        let by_kind = FilterState {
            search: "LAKE".into(),
            ..FilterState::default()
        };
        assert_eq!(visible_ids(&by_kind), ["wa", "wb", "wu", "lh"]);
    }

    #[test]
    fn link_requires_both_endpoints() {
        let (nodes, links, domains) = fixture();
        let lookup = SliceLookup::new(&nodes, &domains);
        let f = reduce(&FilterState::default(), FilterEvent::HideDomain("d2".into()));
        let mask = VisibilityMask::compute(&nodes, &links, &f, &lookup);
        assert_eq!(mask.links, [true, false, true, false, false]);
        for (link, shown) in links.iter().zip(&mask.links) {
            assert_eq!(*shown, is_link_visible(link, &f, &lookup));
        }
    }

    #[test]
    fn link_kind_toggles() {
        let (nodes, links, domains) = fixture();
        let lookup = SliceLookup::new(&nodes, &domains);
        let f = reduce(&FilterState::default(), FilterEvent::ToggleLinkKind(LinkKind::Contains));
        let mask = VisibilityMask::compute(&nodes, &links, &f, &lookup);
        assert_eq!(mask.visible_links(), 1);
        let f = reduce(&f, FilterEvent::Reset);
        assert_eq!(f, FilterState::default());
    }
}
