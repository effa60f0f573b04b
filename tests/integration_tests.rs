use mscript_index::node::Node;
use mscript_index::{IndexerConfig, PathEngine};
use std::fs;
use std::path::Path;

fn write(dir: &Path, rel: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn engine() -> PathEngine {
    PathEngine::new(IndexerConfig::default()).unwrap()
}

#[test]
fn resolves_a_plain_function_by_short_name() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "greet.m", "function greet(name)\ndisp(name);\nend\n");
    let mut engine = engine();
    engine.addpath(dir.path(), false, false).unwrap();
    let node = engine.resolve("greet", &[]).unwrap();
    assert_eq!(node.fqdm(), "greet");
}

#[test]
fn package_hierarchy_resolves_by_dotted_fqdm_and_not_by_short_name() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "+outer/+inner/leaf.m", "function leaf()\nend\n");
    let mut engine = engine();
    engine.addpath(dir.path(), false, false).unwrap();
    assert!(engine.resolve("outer.inner.leaf", &[]).is_some());
    assert!(engine.resolve("inner.leaf", &[]).is_none());
    assert!(engine.resolve("leaf", &[]).is_none());
}

#[test]
fn class_folder_collects_main_definition_and_sibling_methods_in_discovery_order() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "@Account/Account.m",
        "classdef Account\n  properties\n    Balance (1,1) double = 0\n  end\nend\n",
    );
    write(
        dir.path(),
        "@Account/deposit.m",
        "function obj = deposit(obj, amount)\nobj.Balance = obj.Balance + amount;\nend\n",
    );
    write(
        dir.path(),
        "@Account/withdraw.m",
        "function obj = withdraw(obj, amount)\nobj.Balance = obj.Balance - amount;\nend\n",
    );
    let mut engine = engine();
    engine.addpath(dir.path(), false, false).unwrap();
    let node = engine.resolve("Account", &[]).unwrap();
    match node {
        Node::Classdef(c) => {
            assert_eq!(c.properties.len(), 1);
            let names: Vec<&str> = c.methods.iter().map(|m| m.header.name.as_str()).collect();
            assert!(names.contains(&"deposit"));
            assert!(names.contains(&"withdraw"));
        }
        other => panic!("expected classdef, got {other:?}"),
    }
}

#[test]
fn private_function_is_only_visible_from_its_owning_folder() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "public_api.m", "function public_api()\nend\n");
    write(
        dir.path(),
        "private/internal_helper.m",
        "function internal_helper()\nend\n",
    );
    let mut engine = engine();
    engine.addpath(dir.path(), false, false).unwrap();

    assert!(engine.resolve("internal_helper", &[]).is_none());
    assert!(engine
        .resolve("internal_helper", &[dir.path().to_path_buf()])
        .is_some());
}

#[test]
fn adding_a_shadowing_root_to_front_changes_resolution_and_removing_it_restores_the_original() {
    let base = tempfile::tempdir().unwrap();
    let override_dir = tempfile::tempdir().unwrap();
    write(base.path(), "config.m", "function v = config()\nv = 1;\nend\n");
    write(override_dir.path(), "config.m", "function v = config()\nv = 2;\nend\n");

    let mut engine = engine();
    engine.addpath(base.path(), false, false).unwrap();
    engine.addpath(override_dir.path(), false, false).unwrap();

    assert_eq!(
        engine.resolve("config", &[]).unwrap().path(),
        override_dir.path().join("config.m")
    );

    engine.rm_path(override_dir.path(), false).unwrap();

    assert_eq!(
        engine.resolve("config", &[]).unwrap().path(),
        base.path().join("config.m")
    );
}

#[test]
fn dependency_graph_links_calls_imports_and_dependants_across_a_package() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.m",
        "import mypkg.*\nfunction main()\ny = helper(1);\nz = mypkg.other(2);\nend\n",
    );
    write(
        dir.path(),
        "+mypkg/helper.m",
        "function y = helper(x)\ny = x * 2;\nend\n",
    );
    write(
        dir.path(),
        "+mypkg/other.m",
        "function y = other(x)\ny = x + 1;\nend\n",
    );

    let mut engine = engine();
    engine.addpath(dir.path(), false, false).unwrap();

    let main_node = engine.resolve("main", &[]).unwrap();
    assert!(main_node.header().calls.contains(&"helper".to_string()));
    assert!(main_node.header().calls.contains(&"mypkg.other".to_string()));
    // helper (via the wildcard import), mypkg.other (direct), and the
    // `mypkg.*` import itself, which resolves to the package directory.
    assert_eq!(main_node.header().dependencies.len(), 3);
    assert!(main_node.header().dependencies.contains(&dir.path().join("+mypkg")));

    let helper_node = engine.resolve("mypkg.helper", &[]).unwrap();
    assert!(helper_node.header().dependants.contains(&dir.path().join("main.m")));
}

#[test]
fn unresolved_calls_are_recorded_without_failing_the_index() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "lonely.m",
        "function lonely()\ny = nonexistent_thing(1);\nend\n",
    );
    let mut engine = engine();
    engine.addpath(dir.path(), false, false).unwrap();
    let node = engine.resolve("lonely", &[]).unwrap();
    assert_eq!(
        node.header().unresolved_dependencies,
        vec!["nonexistent_thing".to_string()]
    );
}
