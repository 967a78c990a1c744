use super::{DescriptorError, DEBUG_PORT, NETWORK_NAME, READINESS_LINE};
use crate::entities::allocation::ServiceAllocation;
use crate::image::{container_common_name, ImageSettings};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use shipyard_manifest::GameProperties;
use std::collections::BTreeMap;

/// Inputs for one project's service entry.
#[derive(Debug, Clone, Copy)]
pub struct ProjectService<'a> {
    pub allocation: &'a ServiceAllocation,
    pub image: &'a str,
    pub game_name: &'a str,
    pub properties: &'a GameProperties,
    /// Secret values in declaration order.
    pub secrets: &'a [(String, String)],
}

#[derive(Serialize)]
struct ComposeService {
    image: String,
    expose: Vec<String>,
    environment: Mapping,
    networks: Vec<String>,
    healthcheck: HealthCheck,
    depends_on: BTreeMap<String, DependsOn>,
    deploy: Deploy,
    labels: Mapping,
}

#[derive(Serialize)]
struct HealthCheck {
    test: Vec<String>,
    interval: String,
    timeout: String,
    retries: u32,
    start_period: String,
}

#[derive(Serialize)]
struct DependsOn {
    condition: String,
}

#[derive(Serialize)]
struct Deploy {
    replicas: u32,
    restart_policy: RestartPolicy,
}

#[derive(Serialize)]
struct RestartPolicy {
    condition: String,
    delay: String,
    max_attempts: u32,
}

fn put(map: &mut Mapping, key: &str, value: impl Into<String>) {
    map.insert(Value::from(key), Value::from(value.into()));
}

/// Builds the Compose entry for one project.
///
/// Project services are internal only: nothing is published, the game port
/// and the debug port are declared with `expose`.
pub fn service_definition(
    service: &ProjectService<'_>,
    settings: &ImageSettings,
) -> Result<Value, DescriptorError> {
    let allocation = service.allocation;
    let props = service.properties;
    let pod_name = container_common_name(service.game_name);

    let mut environment = Mapping::new();
    put(&mut environment, "EULA", "TRUE");
    put(&mut environment, "TYPE", settings.server_type.as_str());
    put(&mut environment, "VERSION", settings.version.as_str());
    put(&mut environment, "MEMORY", settings.memory.as_str());
    put(&mut environment, "SERVER_PORT", allocation.port.to_string());
    put(&mut environment, "DEBUG_PORT", DEBUG_PORT.to_string());
    put(&mut environment, "POD_NAME", pod_name.as_str());
    put(&mut environment, "PROJECT_ID", props.project_id.as_str());
    if !props.namespace_id.is_empty() {
        put(&mut environment, "NAMESPACE_ID", props.namespace_id.as_str());
    }
    put(&mut environment, "DEV_MODE", "true");
    for (key, value) in service.secrets {
        put(&mut environment, key, value.as_str());
    }

    let mut labels = Mapping::new();
    put(&mut labels, "shipyard.managed", "true");
    put(&mut labels, "shipyard.service", allocation.service_name.as_str());
    put(&mut labels, "shipyard.project.name", service.game_name);
    put(&mut labels, "shipyard.project.path", allocation.path.to_string_lossy());
    put(&mut labels, "shipyard.project.port", allocation.port.to_string());
    put(&mut labels, "shipyard.project.id", props.project_id.as_str());
    put(&mut labels, "shipyard.container.name", pod_name.as_str());
    if !props.namespace_id.is_empty() {
        put(&mut labels, "shipyard.namespace.id", props.namespace_id.as_str());
    }
    if !props.game.visibility.is_empty() {
        put(&mut labels, "shipyard.game.visibility", props.game.visibility.as_str());
    }
    if !props.game.category.is_empty() {
        put(&mut labels, "shipyard.game.category", props.game.category.as_str());
    }

    let healthy = || DependsOn {
        condition: "service_healthy".to_string(),
    };

    let definition = ComposeService {
        image: service.image.to_string(),
        expose: vec![allocation.port.to_string(), DEBUG_PORT.to_string()],
        environment,
        networks: vec![NETWORK_NAME.to_string()],
        healthcheck: HealthCheck {
            test: vec![
                "CMD-SHELL".to_string(),
                format!("grep -qF '{}' /data/logs/latest.log", READINESS_LINE),
            ],
            interval: "10s".to_string(),
            timeout: "5s".to_string(),
            retries: 30,
            start_period: "60s".to_string(),
        },
        depends_on: BTreeMap::from([
            ("kafka".to_string(), healthy()),
            ("mongodb".to_string(), healthy()),
        ]),
        deploy: Deploy {
            replicas: allocation.replicas,
            restart_policy: RestartPolicy {
                condition: "on-failure".to_string(),
                delay: "5s".to_string(),
                max_attempts: 3,
            },
        },
        labels,
    };

    serde_yaml::to_value(definition).map_err(|e| DescriptorError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn allocation() -> ServiceAllocation {
        ServiceAllocation {
            name: "arena".into(),
            path: PathBuf::from("/work/arena"),
            port: 25566,
            service_name: "arena".into(),
            replicas: 1,
        }
    }

    #[test]
    fn service_is_internal_only() {
        let alloc = allocation();
        let props = GameProperties::from_yaml("projectId: arena-1\n").unwrap();
        let value = service_definition(
            &ProjectService {
                allocation: &alloc,
                image: "shipyard/arena:abcd1234",
                game_name: "Arena",
                properties: &props,
                secrets: &[("API_TOKEN".to_string(), "s3cret".to_string())],
            },
            &ImageSettings::default(),
        )
        .unwrap();

        assert!(value.get("ports").is_none());
        let expose: Vec<&str> = value["expose"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(expose, vec!["25566", "5005"]);
        assert_eq!(value["healthcheck"]["retries"].as_u64(), Some(30));
        assert_eq!(value["healthcheck"]["start_period"].as_str(), Some("60s"));
        assert_eq!(
            value["depends_on"]["mongodb"]["condition"].as_str(),
            Some("service_healthy")
        );
        assert_eq!(value["environment"]["API_TOKEN"].as_str(), Some("s3cret"));
        assert_eq!(value["environment"]["POD_NAME"].as_str(), Some("Arena-1"));
        assert_eq!(value["labels"]["shipyard.project.port"].as_str(), Some("25566"));
        assert!(value["labels"].get("shipyard.game.category").is_none());
    }
}
