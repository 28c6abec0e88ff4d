// Domain <-> ECS type conversion

use aws_sdk_ecs::types::{
    Compatibility, ContainerDefinition, Failure, KeyValuePair, LaunchType, LogConfiguration,
    LogDriver, NetworkMode, PortMapping as EcsPortMapping, Secret, Tag as EcsTag, TaskDefinition,
    TransportProtocol,
};
use enclave_core::domain::{
    ContainerSpec, EnvVar, LaunchMode, LogConfig, NativeContainer, PlacementFailure, PortMapping,
    SecretRef, Tag, TaskTemplate,
};
use enclave_core::port::PlatformError;

/// Reason reported when the platform omits one
const UNKNOWN_FAILURE_REASON: &str = "UNKNOWN";

pub(crate) fn template_from_ecs(def: &TaskDefinition) -> Result<TaskTemplate, PlatformError> {
    let family = def.family().ok_or_else(|| {
        PlatformError::Unavailable("task definition response without family".to_string())
    })?;

    Ok(TaskTemplate {
        family: family.to_string(),
        containers: def
            .container_definitions()
            .iter()
            .map(container_from_ecs)
            .collect(),
        task_role_arn: def.task_role_arn().map(str::to_string),
        execution_role_arn: def.execution_role_arn().map(str::to_string),
        network_mode: def.network_mode().map(|m| m.as_str().to_string()),
        cpu: def.cpu().map(str::to_string),
        memory: def.memory().map(str::to_string),
        requires_compatibilities: def
            .requires_compatibilities()
            .iter()
            .map(|c| c.as_str().to_string())
            .collect(),
    })
}

pub(crate) fn container_from_ecs(c: &ContainerDefinition) -> ContainerSpec {
    ContainerSpec {
        name: c.name().map(str::to_string),
        image: c.image().map(str::to_string),
        // ECS reports an unset cpu share as 0
        cpu: (c.cpu() != 0).then_some(c.cpu()),
        memory: c.memory(),
        memory_reservation: c.memory_reservation(),
        essential: c.essential(),
        command: c.command().to_vec(),
        entry_point: c.entry_point().to_vec(),
        environment: c
            .environment()
            .iter()
            .map(|kv| EnvVar {
                name: kv.name().unwrap_or_default().to_string(),
                value: kv.value().map(str::to_string),
            })
            .collect(),
        port_mappings: c
            .port_mappings()
            .iter()
            .map(|p| PortMapping {
                container_port: p.container_port(),
                host_port: p.host_port(),
                protocol: p.protocol().map(|proto| proto.as_str().to_string()),
            })
            .collect(),
        working_directory: c.working_directory().map(str::to_string),
        user: c.user().map(str::to_string),
        log_configuration: c.log_configuration().map(|log| {
            let mut options: Vec<(String, String)> = log
                .options()
                .map(|opts| opts.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default();
            options.sort();
            LogConfig {
                driver: log.log_driver().as_str().to_string(),
                options,
            }
        }),
        secrets: c
            .secrets()
            .iter()
            .map(|s| SecretRef {
                name: s.name().to_string(),
                value_from: s.value_from().to_string(),
            })
            .collect(),
        native: Some(NativeContainer::new(c.clone())),
    }
}

/// Container definition to register for `spec`
///
/// A described container is registered as described, with only the image
/// replaced. Specs built without one are assembled from the named fields.
pub(crate) fn container_to_ecs(spec: &ContainerSpec) -> Result<ContainerDefinition, PlatformError> {
    match spec
        .native
        .as_ref()
        .and_then(|n| n.downcast_ref::<ContainerDefinition>())
    {
        Some(described) => {
            let mut definition = described.clone();
            definition.image = spec.image.clone();
            Ok(definition)
        }
        None => container_from_fields(spec),
    }
}

fn container_from_fields(spec: &ContainerSpec) -> Result<ContainerDefinition, PlatformError> {
    let log_configuration = spec
        .log_configuration
        .as_ref()
        .map(|log| {
            LogConfiguration::builder()
                .log_driver(LogDriver::from(log.driver.as_str()))
                .set_options(
                    (!log.options.is_empty()).then(|| log.options.iter().cloned().collect()),
                )
                .build()
                .map_err(|e| PlatformError::Rejected(format!("log configuration: {}", e)))
        })
        .transpose()?;

    let secrets = spec
        .secrets
        .iter()
        .map(|s| {
            Secret::builder()
                .name(&s.name)
                .value_from(&s.value_from)
                .build()
                .map_err(|e| PlatformError::Rejected(format!("secret {}: {}", s.name, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ContainerDefinition::builder()
        .set_name(spec.name.clone())
        .set_image(spec.image.clone())
        .set_cpu(spec.cpu)
        .set_memory(spec.memory)
        .set_memory_reservation(spec.memory_reservation)
        .set_essential(spec.essential)
        .set_command(non_empty(spec.command.clone()))
        .set_entry_point(non_empty(spec.entry_point.clone()))
        .set_environment(non_empty(
            spec.environment
                .iter()
                .map(|e| {
                    KeyValuePair::builder()
                        .name(&e.name)
                        .set_value(e.value.clone())
                        .build()
                })
                .collect(),
        ))
        .set_port_mappings(non_empty(
            spec.port_mappings
                .iter()
                .map(|p| {
                    EcsPortMapping::builder()
                        .set_container_port(p.container_port)
                        .set_host_port(p.host_port)
                        .set_protocol(p.protocol.as_deref().map(TransportProtocol::from))
                        .build()
                })
                .collect(),
        ))
        .set_working_directory(spec.working_directory.clone())
        .set_user(spec.user.clone())
        .set_log_configuration(log_configuration)
        .set_secrets(non_empty(secrets))
        .build())
}

pub(crate) fn network_mode_to_ecs(mode: &str) -> NetworkMode {
    NetworkMode::from(mode)
}

pub(crate) fn compatibility_to_ecs(compatibility: &str) -> Compatibility {
    Compatibility::from(compatibility)
}

pub(crate) fn launch_type_to_ecs(mode: LaunchMode) -> LaunchType {
    match mode {
        LaunchMode::Fargate => LaunchType::Fargate,
    }
}

pub(crate) fn tag_to_ecs(tag: &Tag) -> EcsTag {
    EcsTag::builder().key(&tag.key).value(&tag.value).build()
}

pub(crate) fn failure_from_ecs(f: &Failure) -> PlacementFailure {
    PlacementFailure {
        arn: f.arn().map(str::to_string),
        reason: f.reason().unwrap_or(UNKNOWN_FAILURE_REASON).to_string(),
        detail: f.detail().map(str::to_string),
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ecs::types::{
        ApplicationProtocol, ContainerCondition, ContainerDependency, HealthCheck, MountPoint,
    };
    use enclave_core::application::study::derive::derive_definition;
    use enclave_core::domain::StudyId;

    fn ecs_container() -> ContainerDefinition {
        ContainerDefinition::builder()
            .name("app")
            .image("old:v1")
            .cpu(256)
            .memory(512)
            .essential(true)
            .command("run")
            .environment(KeyValuePair::builder().name("MODE").value("study").build())
            .port_mappings(
                EcsPortMapping::builder()
                    .container_port(8080)
                    .protocol(TransportProtocol::Tcp)
                    .build(),
            )
            .log_configuration(
                LogConfiguration::builder()
                    .log_driver(LogDriver::Awslogs)
                    .options("awslogs-group", "/enclave")
                    .build()
                    .unwrap(),
            )
            .build()
    }

    #[test]
    fn test_container_fields_survive_conversion() {
        let spec = container_from_ecs(&ecs_container());

        assert_eq!(spec.name.as_deref(), Some("app"));
        assert_eq!(spec.cpu, Some(256));
        assert_eq!(spec.command, vec!["run"]);
        assert_eq!(spec.environment[0].value.as_deref(), Some("study"));
        assert_eq!(spec.port_mappings[0].protocol.as_deref(), Some("tcp"));
        assert_eq!(spec.log_configuration.as_ref().unwrap().driver, "awslogs");

        // Without a described definition the named fields are all there is
        let fields_only = ContainerSpec {
            native: None,
            ..spec
        };
        let back = container_from_ecs(&container_to_ecs(&fields_only).unwrap());
        assert_eq!(
            ContainerSpec {
                native: None,
                ..back
            },
            fields_only
        );
    }

    #[test]
    fn test_env_var_without_value_stays_unset() {
        let spec = container_from_ecs(
            &ContainerDefinition::builder()
                .name("app")
                .environment(KeyValuePair::builder().name("EMPTY").build())
                .build(),
        );
        assert_eq!(spec.environment[0].value, None);

        let fields_only = ContainerSpec {
            native: None,
            ..spec
        };
        let registered = container_to_ecs(&fields_only).unwrap();
        assert_eq!(registered.environment()[0].value(), None);
    }

    #[test]
    fn test_derived_container_keeps_unmodelled_fields() {
        let base = ContainerDefinition::builder()
            .name("app")
            .image("old:v1")
            .health_check(
                HealthCheck::builder()
                    .command("CMD-SHELL")
                    .command("curl -f http://localhost/ || exit 1")
                    .interval(30)
                    .build()
                    .unwrap(),
            )
            .mount_points(
                MountPoint::builder()
                    .source_volume("scratch")
                    .container_path("/scratch")
                    .build(),
            )
            .depends_on(
                ContainerDependency::builder()
                    .container_name("init")
                    .condition(ContainerCondition::Success)
                    .build()
                    .unwrap(),
            )
            .readonly_root_filesystem(true)
            .docker_labels("team", "research")
            .stop_timeout(30)
            .port_mappings(
                EcsPortMapping::builder()
                    .container_port(8080)
                    .name("http")
                    .app_protocol(ApplicationProtocol::Http)
                    .build(),
            )
            .build();
        let template = TaskTemplate {
            family: "research-app".to_string(),
            containers: vec![container_from_ecs(&base)],
            task_role_arn: None,
            execution_role_arn: None,
            network_mode: Some("awsvpc".to_string()),
            cpu: Some("256".to_string()),
            memory: Some("512".to_string()),
            requires_compatibilities: vec!["FARGATE".to_string()],
        };

        let draft = derive_definition(&template, &StudyId::new("abc").unwrap(), "new:v2");
        let registered = container_to_ecs(&draft.containers[0]).unwrap();

        let mut expected = base.clone();
        expected.image = Some("new:v2".to_string());
        assert_eq!(registered, expected);
        assert!(registered.health_check().is_some());
        assert_eq!(registered.mount_points().len(), 1);
        assert_eq!(registered.depends_on()[0].container_name(), "init");
        assert_eq!(registered.readonly_root_filesystem(), Some(true));
        assert_eq!(registered.port_mappings()[0].name(), Some("http"));
    }

    #[test]
    fn test_unset_cpu_maps_to_none() {
        let spec = container_from_ecs(&ContainerDefinition::builder().name("app").build());
        assert_eq!(spec.cpu, None);
        assert!(spec.command.is_empty());
    }

    #[test]
    fn test_template_requires_family() {
        let def = TaskDefinition::builder().build();
        assert!(matches!(
            template_from_ecs(&def),
            Err(PlatformError::Unavailable(_))
        ));
    }

    #[test]
    fn test_template_maps_task_level_fields() {
        let def = TaskDefinition::builder()
            .family("research-app")
            .container_definitions(ecs_container())
            .network_mode(NetworkMode::Awsvpc)
            .cpu("256")
            .memory("512")
            .requires_compatibilities(Compatibility::Fargate)
            .execution_role_arn("arn:aws:iam::1:role/exec")
            .build();

        let template = template_from_ecs(&def).unwrap();

        assert_eq!(template.family, "research-app");
        assert_eq!(template.containers.len(), 1);
        assert_eq!(template.network_mode.as_deref(), Some("awsvpc"));
        assert_eq!(template.requires_compatibilities, vec!["FARGATE"]);
        assert_eq!(template.task_role_arn, None);
    }

    #[test]
    fn test_failure_without_reason_is_unknown() {
        let failure = failure_from_ecs(&Failure::builder().arn("arn:task/1").build());
        assert_eq!(failure.reason, "UNKNOWN");
        assert_eq!(failure.arn.as_deref(), Some("arn:task/1"));
    }

    #[test]
    fn test_launch_mode_maps_to_fargate() {
        assert_eq!(launch_type_to_ecs(LaunchMode::Fargate), LaunchType::Fargate);
    }
}
