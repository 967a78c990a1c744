use domain::descriptor::{service_definition, DeploymentDescriptor, ProjectService, BASELINE_SERVICES};
use domain::image::ImageSettings;
use domain::ServiceAllocation;
use pretty_assertions::assert_eq;
use serde_yaml::Value;
use shipyard_manifest::GameProperties;
use std::path::PathBuf;

const EXISTING: &str = r#"
version: "3.8"
services:
  zookeeper:
    image: custom/zookeeper
  legacy-game:
    image: shipyard/legacy:deadbeef
    labels:
      shipyard.managed: "true"
  grafana:
    image: grafana/grafana
networks:
  shipyard-net:
    driver: overlay
    attachable: true
"#;

fn project_services() -> Vec<(String, Value)> {
    let props = GameProperties::from_yaml("projectId: arena\n").unwrap();
    let allocation = ServiceAllocation {
        name: "arena".into(),
        path: PathBuf::from("/work/arena"),
        port: 25565,
        service_name: "arena".into(),
        replicas: 1,
    };
    let definition = service_definition(
        &ProjectService {
            allocation: &allocation,
            image: "shipyard/arena:0123abcd",
            game_name: "Arena",
            properties: &props,
            secrets: &[],
        },
        &ImageSettings::default(),
    )
    .unwrap();
    vec![(allocation.service_name.clone(), definition)]
}

#[test]
fn merge_is_idempotent() {
    let services = project_services();

    let mut once = DeploymentDescriptor::parse(EXISTING).unwrap();
    once.merge(&services).unwrap();

    let mut twice = DeploymentDescriptor::parse(&once.to_yaml().unwrap()).unwrap();
    twice.merge(&services).unwrap();

    assert_eq!(once.to_yaml().unwrap(), twice.to_yaml().unwrap());
}

#[test]
fn merge_keeps_foreign_and_baseline_services() {
    let mut descriptor = DeploymentDescriptor::parse(EXISTING).unwrap();
    let before_zookeeper = descriptor.service("zookeeper").cloned();
    let before_grafana = descriptor.service("grafana").cloned();

    descriptor.merge(&project_services()).unwrap();

    for name in BASELINE_SERVICES {
        assert!(descriptor.service(name).is_some(), "lost {}", name);
    }
    assert_eq!(descriptor.service("zookeeper").cloned(), before_zookeeper);
    assert_eq!(descriptor.service("grafana").cloned(), before_grafana);
    assert!(descriptor.service("legacy-game").is_some());
    assert!(descriptor.service("arena").is_some());

    let mut managed = descriptor.managed_service_names();
    managed.sort();
    assert_eq!(managed, vec!["arena", "legacy-game"]);
}

#[test]
fn merge_preserves_existing_key_order() {
    let mut descriptor = DeploymentDescriptor::parse(EXISTING).unwrap();
    descriptor.merge(&project_services()).unwrap();

    let names = descriptor.service_names();
    assert_eq!(&names[..3], &["zookeeper", "legacy-game", "grafana"]);
}
