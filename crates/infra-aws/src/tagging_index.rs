// Resource Groups Tagging API implementation of the TagIndex port
use async_trait::async_trait;
use aws_sdk_resourcegroupstagging::error::{DisplayErrorContext, SdkError};
use aws_sdk_resourcegroupstagging::operation::get_resources::{
    GetResourcesError, GetResourcesOutput,
};
use aws_sdk_resourcegroupstagging::types::{ResourceTagMapping, TagFilter};
use aws_sdk_resourcegroupstagging::Client as TaggingClient;
use tracing::debug;

use enclave_core::domain::{ResourcePage, ResourceType, Tag, TagQuery, TaggedResource};
use enclave_core::port::{PlatformError, TagIndex};

/// Tag index backed by the AWS Resource Groups Tagging API
pub struct TaggingIndex {
    client: TaggingClient,
}

impl TaggingIndex {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: TaggingClient::new(config),
        }
    }

    pub fn from_client(client: TaggingClient) -> Self {
        Self { client }
    }
}

/// `service:resource` filter string, e.g. `ecs:task-definition`
fn resource_type_filter(resource_type: ResourceType) -> String {
    format!("ecs:{}", resource_type.as_str())
}

fn resource_from_mapping(mapping: &ResourceTagMapping) -> Option<TaggedResource> {
    Some(TaggedResource {
        arn: mapping.resource_arn()?.to_string(),
        tags: mapping
            .tags()
            .iter()
            .map(|t| Tag::new(t.key(), t.value()))
            .collect(),
    })
}

fn get_resources_error(err: SdkError<GetResourcesError>) -> PlatformError {
    match err.as_service_error() {
        Some(service) => get_resources_service_error(service),
        None => PlatformError::Unavailable(DisplayErrorContext(&err).to_string()),
    }
}

fn get_resources_service_error(err: &GetResourcesError) -> PlatformError {
    let message = DisplayErrorContext(err).to_string();
    match err {
        GetResourcesError::InvalidParameterException(_) => PlatformError::Rejected(message),
        _ => PlatformError::Unavailable(message),
    }
}

fn page_from_output(output: &GetResourcesOutput) -> ResourcePage {
    ResourcePage {
        items: output
            .resource_tag_mapping_list()
            .iter()
            .filter_map(resource_from_mapping)
            .collect(),
        // The last page carries an empty token
        next_token: output
            .pagination_token()
            .filter(|t| !t.is_empty())
            .map(str::to_string),
    }
}

#[async_trait]
impl TagIndex for TaggingIndex {
    async fn get_resources(
        &self,
        query: &TagQuery,
        page_token: Option<&str>,
    ) -> Result<ResourcePage, PlatformError> {
        debug!(
            key = %query.key,
            values = ?query.values,
            has_token = page_token.is_some(),
            "GetResources"
        );

        let output = self
            .client
            .get_resources()
            .tag_filters(
                TagFilter::builder()
                    .key(&query.key)
                    .set_values(Some(query.values.clone()))
                    .build(),
            )
            .set_resource_type_filters(Some(
                query
                    .resource_types
                    .iter()
                    .map(|t| resource_type_filter(*t))
                    .collect(),
            ))
            .set_pagination_token(page_token.map(str::to_string))
            .send()
            .await
            .map_err(get_resources_error)?;

        Ok(page_from_output(&output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_resourcegroupstagging::error::ErrorMetadata;
    use aws_sdk_resourcegroupstagging::types::error::{
        InvalidParameterException, ThrottledException,
    };
    use aws_sdk_resourcegroupstagging::types::Tag as AwsTag;

    fn mapping(arn: &str, study: &str) -> ResourceTagMapping {
        ResourceTagMapping::builder()
            .resource_arn(arn)
            .tags(AwsTag::builder().key("studyId").value(study).build().unwrap())
            .build()
    }

    #[test]
    fn test_resource_type_filters_use_ecs_prefix() {
        assert_eq!(resource_type_filter(ResourceType::Task), "ecs:task");
        assert_eq!(
            resource_type_filter(ResourceType::TaskDefinition),
            "ecs:task-definition"
        );
    }

    #[test]
    fn test_mapping_keeps_arn_and_tags() {
        let resource =
            resource_from_mapping(&mapping("arn:aws:ecs:us-east-1:1:task/c/abc", "s1")).unwrap();

        assert_eq!(resource.arn, "arn:aws:ecs:us-east-1:1:task/c/abc");
        assert_eq!(resource.tags, vec![Tag::new("studyId", "s1")]);
    }

    #[test]
    fn test_mapping_without_arn_is_skipped() {
        let mapping = ResourceTagMapping::builder().build();
        assert!(resource_from_mapping(&mapping).is_none());
    }

    #[test]
    fn test_empty_pagination_token_ends_the_walk() {
        let output = GetResourcesOutput::builder()
            .resource_tag_mapping_list(mapping("arn:aws:ecs:us-east-1:1:task/c/abc", "s1"))
            .pagination_token("")
            .build();

        let page = page_from_output(&output);

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_token, None);
    }

    #[test]
    fn test_missing_pagination_token_ends_the_walk() {
        let page = page_from_output(&GetResourcesOutput::builder().build());
        assert!(page.items.is_empty());
        assert_eq!(page.next_token, None);
    }

    #[test]
    fn test_non_empty_pagination_token_is_forwarded() {
        let output = GetResourcesOutput::builder()
            .resource_tag_mapping_list(mapping("arn:a", "s1"))
            .pagination_token("eyJwYWdlIjoyfQ==")
            .build();

        let page = page_from_output(&output);

        assert_eq!(page.next_token.as_deref(), Some("eyJwYWdlIjoyfQ=="));
    }

    #[test]
    fn test_invalid_parameter_is_rejected() {
        let err = GetResourcesError::InvalidParameterException(
            InvalidParameterException::builder()
                .message("unsupported resource type")
                .build(),
        );
        assert!(matches!(
            get_resources_service_error(&err),
            PlatformError::Rejected(_)
        ));
    }

    #[test]
    fn test_throttling_and_transport_failures_are_unavailable() {
        let throttled = GetResourcesError::ThrottledException(
            ThrottledException::builder().message("Rate exceeded").build(),
        );
        assert!(matches!(
            get_resources_service_error(&throttled),
            PlatformError::Unavailable(_)
        ));

        let denied = GetResourcesError::generic(
            ErrorMetadata::builder()
                .code("AccessDeniedException")
                .build(),
        );
        assert!(matches!(
            get_resources_service_error(&denied),
            PlatformError::Unavailable(_)
        ));

        let err = SdkError::<GetResourcesError>::timeout_error("connect timed out");
        assert!(matches!(
            get_resources_error(err),
            PlatformError::Unavailable(_)
        ));
    }
}
