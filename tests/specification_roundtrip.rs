//! End-to-end exercise of the read -> filter/copy -> encode -> write
//! pipeline, the way the teacher's integration tests drive a loader
//! end-to-end against a file on disk rather than an in-memory fixture.

use std::io::Write;

use opendse::io::{read_specification, write_specification};
use opendse::spec::ops::{deep_copy, filter_by_resources};
use opendse::spec::{Dependency, Link, Mapping, Resource, RoutingLink, Routing, Specification, Task};
use opendse::Encoder;

/// Builds a small CAN-bus-shaped specification: architecture `{r1, r2, can}`
/// with undirected links `r1-can`, `r2-can`; application `t1 -> t2 -> t3`
/// where `t2` is a communication; mappings `t1 -> r1`, `t3 -> r2`; a routing
/// for `t2` over `{r1, can, r2}`.
fn can_bus_specification() -> Specification {
    let mut spec = Specification::new();

    spec.architecture.add_resource(Resource::new("r1"));
    spec.architecture.add_resource(Resource::new("r2"));
    spec.architecture.add_resource(Resource::new("can"));
    spec.architecture.add_link(Link::new("l1"), "r1", "can", false).unwrap();
    spec.architecture.add_link(Link::new("l2"), "r2", "can", false).unwrap();

    spec.application.add_task(Task::process("t1"));
    spec.application.add_task(Task::communication("t2"));
    spec.application.add_task(Task::process("t3"));
    spec.application.add_dependency(Dependency::new("d1"), "t1", "t2").unwrap();
    spec.application.add_dependency(Dependency::new("d2"), "t2", "t3").unwrap();

    spec.mappings.add(Mapping::new("m1", "t1", "r1"));
    spec.mappings.add(Mapping::new("m2", "t3", "r2"));

    let mut routing = Routing::new();
    routing.add_resource("r1");
    routing.add_resource("can");
    routing.add_resource("r2");
    routing.add_link(RoutingLink::new("rl1", "l1"), "r1", "can", true).unwrap();
    routing.add_link(RoutingLink::new("rl2", "l2"), "can", "r2", true).unwrap();
    spec.routings.set("t2", routing);

    spec
}

#[test]
fn can_bus_specification_round_trips_through_a_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spec.xml");

    write_specification(&can_bus_specification(), std::fs::File::create(&path).unwrap()).unwrap();
    let read_back = read_specification(std::fs::File::open(&path).unwrap()).unwrap();

    assert_eq!(read_back.architecture.resources().count(), 3);
    assert_eq!(read_back.application.tasks().count(), 3);
    assert_eq!(read_back.mappings.len(), 2);
    let routing = read_back.routings.get("t2").unwrap();
    assert_eq!(routing.resource_count(), 3);
    assert_eq!(routing.link_count(), 2);
}

#[test]
fn directed_link_view_emits_undirected_links_twice() {
    let spec = can_bus_specification();
    let links = opendse::spec::ops::directed_links(&spec.architecture);
    assert_eq!(links.len(), 4);
    assert!(links.contains(&("l1".to_string(), "r1".to_string(), "can".to_string())));
    assert!(links.contains(&("l1".to_string(), "can".to_string(), "r1".to_string())));
}

#[test]
fn filter_by_resources_drops_communication_and_starved_task() {
    let mut spec = can_bus_specification();
    filter_by_resources(&mut spec, &["r1".to_string(), "can".to_string()]);

    assert_eq!(spec.architecture.resources().count(), 2);
    assert!(spec.architecture.contains_resource("r1"));
    assert!(spec.architecture.contains_resource("can"));
    assert_eq!(spec.mappings.len(), 1);
    assert!(spec.mappings.get("m1").is_some());
    assert_eq!(spec.application.tasks().count(), 1);
    assert!(spec.application.contains_task("t1"));
    assert!(!spec.application.contains_task("t2"));
    assert!(!spec.application.contains_task("t3"));
}

#[test]
fn encode_succeeds_then_fails_on_duplicate_mapping() {
    let spec = can_bus_specification();
    let model = Encoder::new().encode(&spec).expect("the fixture is a well-formed specification");
    assert!(!model.constraints.is_empty());

    let mut duplicated = can_bus_specification();
    duplicated.mappings.add(Mapping::new("m1b", "t1", "r1"));
    let err = Encoder::new().encode(&duplicated).expect_err("duplicate (task, resource) mapping must be rejected");
    assert_eq!(err.kind, opendse::error::EncodeErrorKind::InvariantViolation);
}

#[test]
fn deep_copy_round_trips_through_a_file_independently_of_the_original() {
    let dir = tempfile::tempdir().unwrap();
    let original_path = dir.path().join("original.xml");
    let copy_path = dir.path().join("copy.xml");

    let spec = can_bus_specification();
    let copy = deep_copy(&spec);

    write_specification(&spec, std::fs::File::create(&original_path).unwrap()).unwrap();
    write_specification(&copy, std::fs::File::create(&copy_path).unwrap()).unwrap();

    let original_bytes = std::fs::read(&original_path).unwrap();
    let copy_bytes = std::fs::read(&copy_path).unwrap();
    assert_eq!(original_bytes, copy_bytes, "deep copy must serialize identically to the original");
}

#[test]
fn malformed_file_reports_context_with_the_offending_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.xml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "<specification xmlns=\"opendse.sf.net\"><application/></specification>").unwrap();

    let err = read_specification(std::fs::File::open(&path).unwrap()).unwrap_err();
    assert_eq!(err.kind, opendse::error::XmlErrorKind::MalformedInput);
}
