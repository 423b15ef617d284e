//! Unit tests for graph queries.

use super::*;
use crate::graph::fixtures::{sample_graph, workspace_graph};
use rstest::{fixture, rstest};

#[fixture]
fn workspace() -> Graph {
    workspace_graph("/Native/target/librust.a")
}

fn names(targets: &BTreeSet<GraphTarget<'_>>) -> Vec<String> {
    targets.iter().map(|t| t.name().to_owned()).collect()
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|&n| n.to_owned()).collect()
}

#[rstest]
fn all_targets_covers_every_project() {
    let graph = sample_graph();
    let traverser = GraphTraverser::new(&graph);
    assert_eq!(names(&traverser.all_targets()), vec!["x", "y", "z"]);
}

#[rstest]
fn direct_target_dependencies_skip_other_kinds() {
    let graph = sample_graph();
    let traverser = GraphTraverser::new(&graph);
    let deps = traverser.direct_target_dependencies(Utf8Path::new("/A"), "x");
    assert_eq!(names(&deps), vec!["y"]);
    assert_eq!(traverser.dependencies_of(Utf8Path::new("/A"), "x").len(), 2);
}

#[rstest]
fn direct_target_dependencies_ignore_dangling_edges() {
    let mut graph = sample_graph();
    graph.add_dependency(
        GraphDependency::target("z", "/B"),
        GraphDependency::target("ghost", "/B"),
    );
    let traverser = GraphTraverser::new(&graph);
    assert!(
        traverser
            .direct_target_dependencies(Utf8Path::new("/B"), "z")
            .is_empty()
    );
}

#[rstest]
fn consumers_of_lists_edge_sources(workspace: Graph) {
    let traverser = GraphTraverser::new(&workspace);
    let consumers = traverser.consumers_of(&GraphDependency::target("Alamofire", "/Ext"));
    let app = GraphDependency::target("App", "/App");
    let core = GraphDependency::target("Core", "/App");
    assert_eq!(consumers, BTreeSet::from([&app, &core]));
}

#[rstest]
#[case(None, &[], &[], false, &["App", "AppTests", "Core", "Alamofire", "Unused", "RustLib"])]
#[case(None, &[], &[], true, &["App", "AppTests", "Core", "RustLib"])]
#[case(None, &["App", "Core"], &[], true, &["App", "Core"])]
#[case(None, &["App", "Core"], &["Core"], true, &["App"])]
#[case(Some("AppTests"), &[], &[], true, &["AppTests"])]
#[case(Some("AppTests"), &["Core"], &[], true, &["Core"])]
#[case(Some("Missing"), &[], &[], false, &[])]
#[case(None, &["Alamofire"], &[], true, &[])]
fn filter_included_targets_applies_each_rule(
    workspace: Graph,
    #[case] test_plan: Option<&str>,
    #[case] included: &[&str],
    #[case] excluded: &[&str],
    #[case] excluding_external_targets: bool,
    #[case] expected: &[&str],
) {
    let traverser = GraphTraverser::new(&workspace);
    let included = set(included);
    let excluded = set(excluded);
    let filter = TargetFilter {
        test_plan,
        included_targets: &included,
        excluded_targets: &excluded,
        excluding_external_targets,
    };
    let selected = traverser.filter_included_targets(traverser.all_targets(), &filter);
    assert_eq!(names(&selected), expected);
}

#[rstest]
fn test_plan_lookup_searches_all_projects(workspace: Graph) {
    let traverser = GraphTraverser::new(&workspace);
    assert!(traverser.test_plan("AppTests").is_some());
    assert!(traverser.test_plan("Nightly").is_none());
}

#[rstest]
fn transitive_dependencies_include_sources(workspace: Graph) {
    let traverser = GraphTraverser::new(&workspace);
    let sources: BTreeSet<_> = traverser
        .target(Utf8Path::new("/App"), "Core")
        .into_iter()
        .collect();
    let closure = traverser
        .transitive_target_dependencies(&sources)
        .expect("acyclic");
    assert_eq!(names(&closure), vec!["Core", "Alamofire"]);
}

#[rstest]
fn transitive_dependencies_reject_cycles() {
    let mut graph = sample_graph();
    graph.add_dependency(
        GraphDependency::target("y", "/A"),
        GraphDependency::target("x", "/A"),
    );
    let traverser = GraphTraverser::new(&graph);
    let sources = traverser.all_targets();
    let err = traverser
        .transitive_target_dependencies(&sources)
        .expect_err("cycle");
    match err {
        MapperError::CyclicDependency { cycle } => assert_eq!(
            cycle,
            vec![
                TargetReference::new("/A", "x"),
                TargetReference::new("/A", "y"),
                TargetReference::new("/A", "x"),
            ]
        ),
        other => panic!("wrong error: {other:?}"),
    }
}
