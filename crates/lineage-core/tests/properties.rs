// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]

use std::collections::BTreeSet;

use lineage_core::{
    is_link_visible, is_node_visible, reduce, validate_with, FilterEvent, FilterState, NodeLookup,
    SliceLookup, ValidatorConfig, VisibilityMask,
};
use lineage_graph::{Domain, Link, LinkKind, Node, NodeKind, UNASSIGNED_DOMAIN};
use proptest::prelude::*;

const DOMAINS: [&str; 3] = ["d1", "d2", UNASSIGNED_DOMAIN];
const KINDS: [NodeKind; 4] = [NodeKind::Workspace, NodeKind::Report, NodeKind::SemanticModel, NodeKind::Lakehouse];
const NEEDLES: [&str; 5] = ["", "fin", "report", "w1", "zzz"];

/// Workspaces w0..wN with domains, artifacts a0..aM pointing at random
/// workspace slots (one past the end means "missing workspace").
fn graph() -> impl Strategy<Value = (Vec<Node>, Vec<Link>)> {
    (1usize..6, 0usize..10).prop_flat_map(|(ws, arts)| {
        let total = ws + arts;
        (
            prop::collection::vec(0usize..DOMAINS.len(), ws),
            prop::collection::vec((0..=ws, 1usize..KINDS.len()), arts),
            prop::collection::vec((0..=total, 0..=total, any::<bool>()), 0..20),
        )
            .prop_map(move |(domains, artifacts, edges)| {
                let mut nodes: Vec<Node> = domains
                    .iter()
                    .enumerate()
                    .map(|(i, &d)| {
                        let mut n = Node::new(format!("w{i}"), NodeKind::Workspace, format!("Finance {i}"));
                        n.metadata.domain_id = Some(DOMAINS[d].to_owned());
                        n.metadata.is_unassigned = DOMAINS[d] == UNASSIGNED_DOMAIN;
                        n
                    })
                    .collect();
                for (j, &(slot, kind)) in artifacts.iter().enumerate() {
                    nodes.push(Node::new(format!("a{j}"), KINDS[kind], format!("item {j}")).in_workspace(format!("w{slot}")));
                }
                let id = |k: usize| nodes.get(k).map_or_else(|| "ghost".to_owned(), |n| n.id.clone());
                let links = edges
                    .iter()
                    .map(|&(s, t, cross)| {
                        let kind = if cross { LinkKind::CrossWorkspace } else { LinkKind::Contains };
                        Link::new(id(s), id(t), kind)
                    })
                    .collect();
                (nodes, links)
            })
    })
}

fn filter_state() -> impl Strategy<Value = FilterState> {
    (
        0usize..NEEDLES.len(),
        prop::collection::btree_set(0usize..DOMAINS.len(), 0..3),
        prop::option::of(0usize..DOMAINS.len()),
        any::<bool>(),
        any::<bool>(),
        prop::collection::btree_set(0usize..KINDS.len(), 0..3),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(needle, hidden, isolated, show_unassigned, unassigned_only, kinds, contains, cross)| FilterState {
            search: NEEDLES[needle].to_owned(),
            hidden_domains: hidden.into_iter().map(|d| DOMAINS[d].to_owned()).collect(),
            isolated_domain: isolated.map(|d| DOMAINS[d].to_owned()),
            show_unassigned,
            unassigned_only,
            hidden_kinds: kinds.into_iter().map(|k| KINDS[k]).collect::<BTreeSet<_>>(),
            show_contains: contains,
            show_cross_workspace: cross,
        })
}

fn event() -> impl Strategy<Value = FilterEvent> {
    let domain = (0usize..DOMAINS.len()).prop_map(|d| DOMAINS[d].to_owned());
    prop_oneof![
        (0usize..NEEDLES.len()).prop_map(|n| FilterEvent::SetSearch(NEEDLES[n].to_owned())),
        domain.clone().prop_map(FilterEvent::HideDomain),
        domain.clone().prop_map(FilterEvent::ShowDomain),
        domain.clone().prop_map(FilterEvent::ToggleDomain),
        domain.prop_map(FilterEvent::Isolate),
        Just(FilterEvent::ClearIsolation),
        any::<bool>().prop_map(FilterEvent::SetShowUnassigned),
        any::<bool>().prop_map(FilterEvent::SetUnassignedOnly),
        (0usize..KINDS.len()).prop_map(|k| FilterEvent::ToggleKind(KINDS[k])),
        any::<bool>().prop_map(|c| FilterEvent::ToggleLinkKind(if c { LinkKind::CrossWorkspace } else { LinkKind::Contains })),
        Just(FilterEvent::Reset),
    ]
}

fn domains() -> Vec<Domain> {
    vec![
        Domain {
            id: "d1".into(),
            name: "Finance".into(),
            description: None,
            parent_domain_id: None,
        },
        Domain::unassigned(),
    ]
}

fn assert_dual_endpoint(nodes: &[Node], links: &[Link], filter: &FilterState) -> Result<(), TestCaseError> {
    let domains = domains();
    let lookup = SliceLookup::new(nodes, &domains);
    let mask = VisibilityMask::compute(nodes, links, filter, &lookup);
    for (i, link) in links.iter().enumerate() {
        prop_assert_eq!(mask.links[i], is_link_visible(link, filter, &lookup));
        if mask.links[i] {
            let s = lookup.node(link.source_id());
            let t = lookup.node(link.target_id());
            prop_assert!(s.is_some_and(|n| is_node_visible(n, filter, &lookup)));
            prop_assert!(t.is_some_and(|n| is_node_visible(n, filter, &lookup)));
        }
    }
    for (i, node) in nodes.iter().enumerate() {
        prop_assert_eq!(mask.nodes[i], is_node_visible(node, filter, &lookup));
    }
    Ok(())
}

proptest! {
    #[test]
    fn visible_links_have_visible_endpoints((nodes, links) in graph(), filter in filter_state()) {
        assert_dual_endpoint(&nodes, &links, &filter)?;
    }

    #[test]
    fn reducer_sequences_keep_the_dual_endpoint_rule(
        (nodes, links) in graph(),
        events in prop::collection::vec(event(), 0..12),
    ) {
        let mut filter = FilterState::default();
        for ev in events {
            filter = reduce(&filter, ev);
            prop_assert!(!(filter.unassigned_only && !filter.show_unassigned));
            assert_dual_endpoint(&nodes, &links, &filter)?;
        }
    }

    #[test]
    fn validation_is_idempotent((nodes, links) in graph(), max in 0usize..6) {
        let cfg = ValidatorConfig { max_workspaces: max };
        let once = validate_with(nodes, links, &cfg);
        let twice = validate_with(once.nodes.clone(), once.links.clone(), &cfg);
        prop_assert_eq!(&twice.nodes, &once.nodes);
        prop_assert_eq!(&twice.links, &once.links);
        prop_assert_eq!(twice.report.dangling_links, 0);
        prop_assert_eq!(twice.report.orphaned_artifacts, 0);
    }

    #[test]
    fn validated_cross_links_are_accounted_both_ways((nodes, links) in graph()) {
        let out = validate_with(nodes, links, &ValidatorConfig::default());
        for link in out.links.iter().filter(|l| l.kind == LinkKind::CrossWorkspace) {
            let s = out.nodes.iter().find(|n| n.id == link.source_id());
            let t = out.nodes.iter().find(|n| n.id == link.target_id());
            if let (Some(s), Some(t)) = (s, t) {
                if s.is_workspace() && t.is_workspace() {
                    prop_assert!(s.cross_downstream_ws_ids.contains(&t.id));
                    prop_assert!(t.cross_upstream_ws_ids.contains(&s.id));
                }
            }
        }
    }
}
