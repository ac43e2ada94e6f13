use crate::fixtures::{mesh, MESH_LFA_PATH_COUNT};
use frr_paths::{NodePath, Protection};

/// Every tagged LFA path in the mesh, with the protection classes it earns
/// ("link", "node", "downstream", joined with '+'). Pairs that are absent
/// have no alternates; the all-equal weights of the mesh leave nothing
/// downstream-protecting.
const LFA_TABLE: &[(&str, &str, &[(&[&str], &str)])] = &[
    ("PE1", "PE3", &[(&["PE1", "PE5", "P4", "P3", "PE3"], "link+node")]),
    ("PE1", "PE4", &[(&["PE1", "PE2", "P2", "P4", "PE4"], "link+node")]),
    ("PE1", "P2", &[(&["PE1", "PE5", "P4", "P2"], "link+node")]),
    ("PE1", "P3", &[(&["PE1", "PE5", "P4", "P3"], "link+node")]),
    ("PE1", "P4", &[(&["PE1", "PE2", "P2", "P4"], "link+node")]),
    ("PE2", "PE4", &[(&["PE2", "PE1", "P1", "P4", "PE4"], "link+node"), (&["PE2", "PE1", "PE5", "P4", "PE4"], "link+node")]),
    ("PE2", "PE5", &[(&["PE2", "P2", "P4", "PE5"], "link+node")]),
    ("PE2", "P4", &[(&["PE2", "PE1", "P1", "P4"], "link+node"), (&["PE2", "PE1", "PE5", "P4"], "link+node")]),
    ("PE5", "PE2", &[(&["PE5", "P4", "P2", "PE2"], "link+node")]),
    ("PE5", "PE3", &[(&["PE5", "PE1", "P1", "P3", "PE3"], "link+node")]),
    ("PE5", "P2", &[(&["PE5", "PE1", "PE2", "P2"], "link+node"), (&["PE5", "PE1", "P1", "P2"], "link+node")]),
    ("PE5", "P3", &[(&["PE5", "PE1", "P1", "P3"], "link+node")]),
    ("P1", "PE2", &[(&["P1", "P4", "P2", "PE2"], "link")]),
    ("P1", "PE3", &[(&["P1", "P4", "P3", "PE3"], "link")]),
    ("P1", "PE4", &[(&["P1", "P2", "P4", "PE4"], "link"), (&["P1", "P3", "P4", "PE4"], "link")]),
    ("P1", "PE5", &[(&["P1", "P2", "P4", "PE5"], "link"), (&["P1", "P3", "P4", "PE5"], "link")]),
    ("P2", "PE1", &[(&["P2", "P4", "P1", "PE1"], "link"), (&["P2", "P4", "PE5", "PE1"], "link")]),
    ("P2", "PE4", &[(&["P2", "P1", "P4", "PE4"], "link")]),
    ("P2", "PE5", &[(&["P2", "PE2", "PE1", "PE5"], "link+node"), (&["P2", "P1", "PE1", "PE5"], "link"), (&["P2", "P1", "P4", "PE5"], "link")]),
    ("P3", "PE1", &[(&["P3", "P4", "P1", "PE1"], "link"), (&["P3", "P4", "PE5", "PE1"], "link")]),
    ("P3", "PE4", &[(&["P3", "P1", "P4", "PE4"], "link")]),
    ("P3", "PE5", &[(&["P3", "P1", "PE1", "PE5"], "link"), (&["P3", "P1", "P4", "PE5"], "link")]),
    ("P4", "PE1", &[(&["P4", "P2", "PE2", "PE1"], "link"), (&["P4", "P2", "P1", "PE1"], "link"), (&["P4", "P3", "P1", "PE1"], "link")]),
    ("P4", "PE2", &[(&["P4", "P1", "PE1", "PE2"], "link"), (&["P4", "P1", "P2", "PE2"], "link"), (&["P4", "PE5", "PE1", "PE2"], "link+node")]),
    ("P4", "PE3", &[(&["P4", "P1", "P3", "PE3"], "link")]),
];

fn tagged(path: &NodePath) -> (Vec<String>, String) {
    let mut tags: Vec<String> = path
        .protection()
        .iter()
        .map(|protection| protection.to_string())
        .collect();
    tags.sort();
    (path.node_names().unwrap(), tags.join("+"))
}

#[test]
fn total_lfa_path_count() {
    assert_eq!(mesh().lfa_paths().path_count(), MESH_LFA_PATH_COUNT);
}

#[test]
fn every_pair_matches_the_reference_table() {
    let frr = mesh();
    for (source, target, expected) in LFA_TABLE {
        let paths = frr.lfa_paths().paths_between_by_name(source, target).unwrap();
        let mut got: Vec<(Vec<String>, String)> = paths.iter().map(tagged).collect();
        got.sort();
        let mut wanted: Vec<(Vec<String>, String)> = expected
            .iter()
            .map(|(path, tags)| {
                let mut tags: Vec<&str> = tags.split('+').collect();
                tags.sort_unstable();
                (
                    path.iter().map(|name| (*name).to_owned()).collect(),
                    tags.join("+"),
                )
            })
            .collect();
        wanted.sort();
        assert_eq!(got, wanted, "LFA mismatch for {source} -> {target}");
    }
    let table_total: usize = LFA_TABLE.iter().map(|(_, _, paths)| paths.len()).sum();
    assert_eq!(table_total, MESH_LFA_PATH_COUNT);
}

#[test]
fn pe1_to_p2_display() {
    let paths = mesh().lfa_paths().paths_between_by_name("PE1", "P2").unwrap();
    insta::assert_snapshot!(
        paths.to_string(),
        @"Weight 30: [PE1, PE5, P4, P2] protecting: link, node"
    );
}

#[test]
fn pairs_without_alternates_are_empty() {
    let frr = mesh();
    // Directly-connected destinations never earn an alternate, and the PE3
    // and PE4 spokes have none at all.
    for (source, target) in [
        ("PE1", "PE2"),
        ("PE1", "P1"),
        ("PE3", "PE1"),
        ("PE4", "PE2"),
        ("P5", "PE1"),
        ("PE1", "P5"),
    ] {
        assert!(
            frr.lfa_paths()
                .paths_between_by_name(source, target)
                .unwrap()
                .is_empty(),
            "expected no LFAs for {source} -> {target}"
        );
    }
}

#[test]
fn tagged_paths_satisfy_their_inequalities() {
    let frr = mesh();
    let spf = frr.spf_paths();
    for source in frr.topology().node_indexes() {
        for target in frr.topology().node_indexes() {
            if source == target {
                continue;
            }
            let cost = |a, b| spf.path_cost_between(a, b).unwrap();
            let first_hops = spf.paths_between(source, target).first_hop_nodes();
            for path in frr.lfa_paths().paths_between(source, target) {
                let neighbour = path.node(1).unwrap();
                if path.protection().contains(Protection::Link) {
                    assert!(
                        cost(neighbour, target)
                            < cost(neighbour, source) + cost(source, target)
                    );
                }
                if path.protection().contains(Protection::Downstream) {
                    assert!(cost(neighbour, target) < cost(source, target));
                }
                if path.protection().contains(Protection::Node) {
                    // No pre-failure first hop may sit on the alternate.
                    for hop in &first_hops {
                        assert!(!path.nodes()[1..].contains(hop));
                    }
                }
            }
        }
    }
}
