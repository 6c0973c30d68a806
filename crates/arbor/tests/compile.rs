//! End-to-end compilation tests over the public API.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use arbor::{
    compile, CompileError, CompiledSchema, ErrorKind, RefineSpec, ResolveOptions, Revision,
    SchemaNode, StatementGraph, Type, TypeRef,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn compile_default(graph: &mut StatementGraph) -> Result<CompiledSchema, Vec<CompileError>> {
    init_tracing();
    compile(graph, &ResolveOptions::default())
}

fn rev(text: &str) -> Option<Revision> {
    Revision::parse(text).ok()
}

#[test]
fn compiles_a_module_with_the_full_statement_set() {
    let mut graph = StatementGraph::new();
    let m = graph
        .add_module("network", "urn:example:network", rev("2024-03-01"), "net", 1)
        .unwrap();
    graph
        .add_typedef(m, "port-number", TypeRef::named("uint16", 2), 2)
        .unwrap();
    let grp = graph.add_grouping(m, "endpoint", 3).unwrap();
    graph
        .add_leaf(grp, "address", TypeRef::named("string", 4), 4)
        .unwrap();
    graph
        .add_leaf(grp, "port", TypeRef::named("port-number", 5), 5)
        .unwrap();
    let peers = graph.add_list(m, "peer", 7).unwrap();
    graph.add_uses(peers, "endpoint", 8).unwrap();
    let rpc = graph.add_rpc(m, "ping", 10).unwrap();
    let input = graph.add_rpc_input(rpc, 11);
    graph
        .add_leaf(input, "count", TypeRef::named("uint32", 12), 12)
        .unwrap();
    graph.add_notification(m, "peer-lost", 14).unwrap();
    graph.add_identity(m, "transport", None, 16).unwrap();
    graph.add_identity(m, "tcp", Some("transport"), 17).unwrap();

    let schema = compile_default(&mut graph).unwrap();
    assert!(schema.warnings.is_empty());

    let module = schema.module("network", None).unwrap();
    assert_eq!(module.revision(), rev("2024-03-01").as_ref());

    let port = module.descendant(&["peer", "port"]).unwrap();
    assert!(port.is_added_by_uses());
    let SchemaNode::Leaf(leaf) = port else {
        panic!("leaf expected");
    };
    let Type::Derived(td) = &leaf.leaf_type else {
        panic!("derived type expected");
    };
    assert_eq!(td.qname.local_name, "port-number");

    let ping = module.rpc("ping").unwrap();
    let input = ping.input.as_ref().unwrap();
    assert_eq!(input.children.len(), 1);
    assert!(module.notification("peer-lost").is_some());

    let base = module.identity("transport").unwrap();
    let derived = base.derived();
    assert_eq!(derived.len(), 1);
    assert_eq!(derived[0].qname.local_name, "tcp");
    assert!(derived[0].is_derived_from(base));
}

#[test]
fn recompilation_returns_pointer_identical_modules() {
    let mut graph = StatementGraph::new();
    let m = graph
        .add_module("net", "urn:net", None, "n", 1)
        .unwrap();
    let c = graph.add_container(m, "system", 2).unwrap();
    graph
        .add_leaf(c, "hostname", TypeRef::named("string", 3), 3)
        .unwrap();

    let first = compile_default(&mut graph).unwrap();
    let second = compile_default(&mut graph).unwrap();
    assert!(Arc::ptr_eq(&first.modules()[0], &second.modules()[0]));

    let a = first.modules()[0].child("system").unwrap();
    let b = second.modules()[0].child("system").unwrap();
    assert!(a.ptr_eq(b));
}

#[test]
fn grouping_use_across_an_import_rebases_the_namespace() {
    let mut graph = StatementGraph::new();
    let lib = graph.add_module("lib", "urn:lib", None, "l", 1).unwrap();
    let grp = graph.add_grouping(lib, "endpoint", 2).unwrap();
    graph
        .add_leaf(grp, "address", TypeRef::named("string", 3), 3)
        .unwrap();
    let app = graph.add_module("app", "urn:app", None, "a", 1).unwrap();
    graph.add_import(app, "lib", "l", None, 2).unwrap();
    let c = graph.add_container(app, "upstream", 3).unwrap();
    graph.add_uses(c, "l:endpoint", 4).unwrap();

    let schema = compile_default(&mut graph).unwrap();
    let module = schema.module("app", None).unwrap();
    let address = module.descendant(&["upstream", "address"]).unwrap();
    assert_eq!(address.qname().namespace.as_str(), "urn:app");
    assert!(address.is_added_by_uses());

    // The library template keeps its own namespace.
    let lib = schema.module("lib", None).unwrap();
    let template = lib.grouping("endpoint").unwrap();
    assert_eq!(
        template.children[0].qname().namespace.as_str(),
        "urn:lib"
    );
}

#[test]
fn choice_augment_grows_real_and_shorthand_cases() {
    let mut graph = StatementGraph::new();
    let m = graph.add_module("net", "urn:net", None, "n", 1).unwrap();
    let choice = graph.add_choice(m, "transport", 2).unwrap();
    let tcp = graph.add_case(choice, "tcp", 3).unwrap();
    graph
        .add_leaf(tcp, "port", TypeRef::named("uint16", 4), 4)
        .unwrap();
    let aug = graph.add_augment(m, "/transport", 6).unwrap();
    let tls = graph.add_case(aug, "tls", 7).unwrap();
    graph
        .add_leaf(tls, "certificate", TypeRef::named("string", 8), 8)
        .unwrap();
    graph
        .add_leaf(aug, "unix-socket", TypeRef::named("string", 9), 9)
        .unwrap();

    let schema = compile_default(&mut graph).unwrap();
    let module = schema.module("net", None).unwrap();
    let SchemaNode::Choice(choice) = module.child("transport").unwrap() else {
        panic!("choice expected");
    };
    let names: Vec<&str> = choice
        .cases()
        .map(|c| c.qname.local_name.as_str())
        .collect();
    assert_eq!(names, vec!["tcp", "tls", "unix-socket"]);

    // The shorthand member became a case wrapping the leaf.
    let shorthand = module.descendant(&["transport", "unix-socket"]).unwrap();
    assert!(shorthand.is_augmenting());
    assert!(shorthand.child("unix-socket").is_some());
}

#[test]
fn import_with_pinned_revision_binds_exactly_that_revision() {
    let mut graph = StatementGraph::new();
    let old = graph
        .add_module("dep", "urn:dep", rev("2020-01-01"), "d", 1)
        .unwrap();
    let old_grp = graph.add_grouping(old, "settings", 2).unwrap();
    graph
        .add_leaf(old_grp, "legacy", TypeRef::named("string", 3), 3)
        .unwrap();
    let new = graph
        .add_module("dep", "urn:dep", rev("2021-06-01"), "d", 1)
        .unwrap();
    let new_grp = graph.add_grouping(new, "settings", 2).unwrap();
    graph
        .add_leaf(new_grp, "current", TypeRef::named("string", 3), 3)
        .unwrap();

    let app = graph.add_module("app", "urn:app", None, "a", 1).unwrap();
    graph
        .add_import(app, "dep", "d", rev("2021-06-01"), 2)
        .unwrap();
    graph.add_uses(app, "d:settings", 3).unwrap();

    let schema = compile_default(&mut graph).unwrap();
    assert!(schema.warnings.is_empty());
    let module = schema.module("app", None).unwrap();
    assert!(module.child("current").is_some());
    assert!(module.child("legacy").is_none());
}

#[test]
fn import_of_an_unknown_newer_revision_warns_and_takes_the_latest() {
    let mut graph = StatementGraph::new();
    let dep = graph
        .add_module("dep", "urn:dep", rev("2021-06-01"), "d", 1)
        .unwrap();
    let grp = graph.add_grouping(dep, "settings", 2).unwrap();
    graph
        .add_leaf(grp, "current", TypeRef::named("string", 3), 3)
        .unwrap();
    let app = graph.add_module("app", "urn:app", None, "a", 1).unwrap();
    graph
        .add_import(app, "dep", "d", rev("2030-01-01"), 2)
        .unwrap();
    graph.add_uses(app, "d:settings", 3).unwrap();

    let schema = compile_default(&mut graph).unwrap();
    assert_eq!(schema.warnings.len(), 1);
    assert_eq!(schema.warnings[0].kind, ErrorKind::RevisionFallback);
    let module = schema.module("app", None).unwrap();
    assert!(module.child("current").is_some());
}

#[test]
fn refined_min_elements_makes_the_node_mandatory() {
    let mut graph = StatementGraph::new();
    let m = graph.add_module("net", "urn:net", None, "n", 1).unwrap();
    let grp = graph.add_grouping(m, "servers", 2).unwrap();
    graph
        .add_leaf_list(grp, "address", TypeRef::named("string", 3), 3)
        .unwrap();
    let uses = graph.add_uses(m, "servers", 5).unwrap();
    let mut refine = RefineSpec::new("address", 6);
    refine.min_elements = Some(2);
    graph.add_refine(uses, refine).unwrap();

    let schema = compile_default(&mut graph).unwrap();
    let module = schema.module("net", None).unwrap();
    let SchemaNode::LeafList(address) = module.child("address").unwrap() else {
        panic!("leaf-list expected");
    };
    assert_eq!(address.constraints.min_elements, Some(2));
    assert!(address.constraints.mandatory);
}

#[test]
fn unsupported_augment_target_is_tolerated() {
    let mut graph = StatementGraph::new();
    let m = graph.add_module("net", "urn:net", None, "n", 1).unwrap();
    graph
        .add_unknown_node(m, "n:mount-point", Some("peers"), 2)
        .unwrap();
    let aug = graph.add_augment(m, "/mount-point", 3).unwrap();
    graph
        .add_leaf(aug, "address", TypeRef::named("string", 4), 4)
        .unwrap();
    graph.add_container(m, "system", 6).unwrap();

    let schema = compile_default(&mut graph).unwrap();
    assert_eq!(schema.warnings.len(), 1);
    assert_eq!(schema.warnings[0].kind, ErrorKind::UnsupportedTarget);

    let module = schema.module("net", None).unwrap();
    assert!(module.child("system").is_some());
    assert_eq!(module.augments.len(), 1);
    assert!(!module.augments[0].applied);
}

#[test]
fn sibling_names_collide_across_node_kinds() {
    let mut graph = StatementGraph::new();
    let m = graph.add_module("net", "urn:net", None, "n", 1).unwrap();
    graph
        .add_leaf(m, "reset", TypeRef::named("string", 2), 2)
        .unwrap();

    let err = graph.add_rpc(m, "reset", 4).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateNode);
    assert!(err.message.contains("'reset'"));
    assert!(err.message.contains("line 2"));
}

#[test]
fn augment_materializes_an_operation_input() {
    let mut graph = StatementGraph::new();
    let m = graph.add_module("net", "urn:net", None, "n", 1).unwrap();
    graph.add_rpc(m, "reboot", 2).unwrap();
    let aug = graph.add_augment(m, "/reboot/input", 3).unwrap();
    graph
        .add_leaf(aug, "delay", TypeRef::named("uint32", 4), 4)
        .unwrap();

    let schema = compile_default(&mut graph).unwrap();
    let module = schema.module("net", None).unwrap();
    let reboot = module.rpc("reboot").unwrap();
    let input = reboot.input.as_ref().unwrap();
    assert_eq!(input.children.len(), 1);
    assert_eq!(input.children[0].qname().local_name, "delay");
    assert!(input.children[0].is_augmenting());
    assert!(reboot.output.is_none());
}

#[test]
fn failed_batch_reports_every_problem_at_once() {
    let mut graph = StatementGraph::new();
    let m = graph.add_module("net", "urn:net", None, "n", 1).unwrap();
    graph.add_uses(m, "no-such-grouping", 2).unwrap();
    graph
        .add_leaf(m, "x", TypeRef::named("no-such-type", 3), 3)
        .unwrap();

    let errors = compile_default(&mut graph).unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.kind == ErrorKind::UnknownGrouping));
    assert!(errors.iter().any(|e| e.kind == ErrorKind::UnknownType));
}
