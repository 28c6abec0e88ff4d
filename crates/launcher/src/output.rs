//! Human and JSON rendering of launch results

use anyhow::Result;
use colored::Colorize;
use enclave_core::application::{LaunchDecision, StudyLaunch};
use enclave_core::domain::{PlacementStatus, ProbeReport, RunningTask, TaggedResource};
use serde::Serialize;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "Task ARN")]
    arn: String,
}

#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "ARN")]
    arn: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Resource ARN")]
    arn: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status_label(status: PlacementStatus) -> colored::ColoredString {
    match status {
        PlacementStatus::Placed => status.to_string().green().bold(),
        PlacementStatus::PartialLaunchFailure => status.to_string().red().bold(),
        PlacementStatus::NothingPlaced => status.to_string().yellow().bold(),
    }
}

fn print_task(task: &RunningTask) {
    println!("Status: {}", status_label(task.status()));

    if !task.task_arns.is_empty() {
        let rows: Vec<TaskRow> = task
            .task_arns
            .iter()
            .map(|arn| TaskRow { arn: arn.clone() })
            .collect();
        println!("{}", Table::new(rows));
    }

    if !task.failures.is_empty() {
        println!("{}", "Placement failures:".red());
        let rows: Vec<FailureRow> = task
            .failures
            .iter()
            .map(|f| FailureRow {
                reason: f.reason.clone(),
                arn: f.arn.clone().unwrap_or_else(|| "-".to_string()),
                detail: f.detail.clone().unwrap_or_else(|| "-".to_string()),
            })
            .collect();
        println!("{}", Table::new(rows));
    }
}

fn print_resources(resources: &[TaggedResource]) {
    let rows: Vec<ResourceRow> = resources
        .iter()
        .map(|r| ResourceRow {
            arn: r.arn.clone(),
            tags: r
                .tags
                .iter()
                .map(|t| format!("{}={}", t.key, t.value))
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();
    println!("{}", Table::new(rows));
}

pub fn print_launch(launch: &StudyLaunch, json: bool) -> Result<()> {
    if json {
        return print_json(launch);
    }

    println!(
        "{} {} ({})",
        "Registered".bold(),
        launch.definition.to_string().cyan(),
        launch.definition.arn.as_deref().unwrap_or("-")
    );
    print_task(&launch.task);
    Ok(())
}

pub fn print_decision(decision: &LaunchDecision, json: bool) -> Result<()> {
    match decision {
        LaunchDecision::Launched(launch) => print_launch(launch, json),
        LaunchDecision::Skipped { existing } => {
            if json {
                return print_json(decision);
            }
            println!(
                "{} {} resource(s) already tagged with this study",
                "Skipped:".yellow().bold(),
                existing.len()
            );
            print_resources(existing);
            Ok(())
        }
    }
}

pub fn print_probe(report: &ProbeReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }

    if report.exists() {
        println!(
            "{} {} resource(s) across {} page(s)",
            "Found".green().bold(),
            report.matched.len(),
            report.pages
        );
        print_resources(&report.matched);
    } else {
        println!(
            "{} (the tag index can lag behind recent launches)",
            "No resources found".yellow()
        );
    }
    Ok(())
}
