//! Shared graphs for unit tests.

use camino::Utf8PathBuf;

use super::{
    BinaryLinking, ForeignBuild, ForeignBuildArtifact, ForeignBuildInput, Graph,
    GraphDependency, Product, Project, ProjectKind, Target, TargetReference, TestPlan,
};

/// `A: [x -> y, y]`, `B: [z]`, with a `Smoke` test plan covering `y`.
pub(crate) fn sample_graph() -> Graph {
    let mut graph = Graph::default();
    graph.add_project(
        Project::new("/A", "A", ProjectKind::Local)
            .with_target(Target::new("x", Product::App))
            .with_target(Target::new("y", Product::Framework))
            .with_test_plan(TestPlan {
                name: "Smoke".into(),
                targets: vec![TargetReference::new("/A", "y")],
            }),
    );
    graph.add_project(
        Project::new("/B", "B", ProjectKind::Local).with_target(Target::new("z", Product::Framework)),
    );
    graph.add_dependency(
        GraphDependency::target("x", "/A"),
        GraphDependency::target("y", "/A"),
    );
    graph.add_dependency(
        GraphDependency::target("x", "/A"),
        GraphDependency::Sdk {
            name: "libz".into(),
        },
    );
    graph
}

pub(crate) fn foreign_build(output: impl Into<Utf8PathBuf>) -> ForeignBuild {
    ForeignBuild {
        script: "cargo build --release".into(),
        inputs: vec![
            ForeignBuildInput::File {
                path: "Cargo.toml".into(),
            },
            ForeignBuildInput::Folder { path: "src".into() },
            ForeignBuildInput::Script {
                script: "rustc --version".into(),
            },
        ],
        output: ForeignBuildArtifact {
            path: output.into(),
            linking: BinaryLinking::Static,
        },
    }
}

/// An app workspace with an external project and a foreign-built library.
///
/// ```text
/// /App:    App -> Core, Alamofire, RustLib
///          AppTests -> App
///          Core -> Alamofire
/// /Ext:    Alamofire, Unused          (external)
/// /Native: RustLib                    (foreign build)
/// ```
pub(crate) fn workspace_graph(artifact: impl Into<Utf8PathBuf>) -> Graph {
    let mut graph = Graph::default();
    graph.add_project(
        Project::new("/App", "App", ProjectKind::Local)
            .with_target(Target::new("App", Product::App))
            .with_target(Target::new("AppTests", Product::UnitTests))
            .with_target(Target::new("Core", Product::Framework))
            .with_test_plan(TestPlan {
                name: "AppTests".into(),
                targets: vec![TargetReference::new("/App", "AppTests")],
            }),
    );
    graph.add_project(
        Project::new("/Ext", "Ext", ProjectKind::External)
            .with_target(Target::new("Alamofire", Product::Framework))
            .with_target(Target::new("Unused", Product::Framework)),
    );
    graph.add_project(
        Project::new("/Native", "Native", ProjectKind::Local).with_target(
            Target::new("RustLib", Product::StaticLibrary).with_foreign_build(foreign_build(artifact)),
        ),
    );
    let app = GraphDependency::target("App", "/App");
    graph.add_dependency(app.clone(), GraphDependency::target("Core", "/App"));
    graph.add_dependency(app.clone(), GraphDependency::target("Alamofire", "/Ext"));
    graph.add_dependency(app.clone(), GraphDependency::target("RustLib", "/Native"));
    graph.add_dependency(GraphDependency::target("AppTests", "/App"), app);
    graph.add_dependency(
        GraphDependency::target("Core", "/App"),
        GraphDependency::target("Alamofire", "/Ext"),
    );
    graph
}
