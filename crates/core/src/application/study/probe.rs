// Probe Use Case
// Does anything tagged with this study exist?

use crate::application::constants::STUDY_RESOURCE_TYPES;
use crate::domain::{ProbeReport, StudyId, TagQuery, STUDY_TAG_KEY};
use crate::error::{ErrorContext, Operation, Result, StudyError};
use crate::port::{PlatformError, TagIndex};
use std::collections::HashSet;
use tracing::{debug, info};

/// Tag query selecting a study's tasks and task definitions
pub fn study_query(study_id: &StudyId) -> TagQuery {
    TagQuery {
        key: STUDY_TAG_KEY.to_string(),
        values: vec![study_id.as_str().to_string()],
        resource_types: STUDY_RESOURCE_TYPES.to_vec(),
    }
}

/// Execute probe use case
///
/// Walks every page before deciding. Only items whose tags carry
/// `studyId=<study_id>` count as matches.
pub async fn execute(tag_index: &dyn TagIndex, study_id: &StudyId) -> Result<ProbeReport> {
    let context = || ErrorContext::new(Operation::ProbeExistence, study_id.as_str());
    let query = study_query(study_id);

    let mut report = ProbeReport::default();
    let mut token: Option<String> = None;
    let mut seen_tokens = HashSet::new();

    loop {
        let page = tag_index
            .get_resources(&query, token.as_deref())
            .await
            .map_err(|source| StudyError::Probe {
                context: context(),
                source,
            })?;
        report.pages += 1;

        debug!(
            study_id = %study_id,
            page = report.pages,
            items = page.items.len(),
            "Fetched tag index page"
        );

        report
            .matched
            .extend(page.items.into_iter().filter(|item| query.matches(&item.tags)));

        match page.next_token.filter(|t| !t.is_empty()) {
            Some(next) => {
                if !seen_tokens.insert(next.clone()) {
                    return Err(StudyError::Probe {
                        context: context(),
                        source: PlatformError::Unavailable(format!(
                            "pagination token repeated: {}",
                            next
                        )),
                    });
                }
                token = Some(next);
            }
            None => break,
        }
    }

    info!(
        study_id = %study_id,
        exists = report.exists(),
        matched = ?report.matched.iter().map(|r| r.arn.as_str()).collect::<Vec<_>>(),
        pages = report.pages,
        "Probed study resources"
    );

    Ok(report)
}
