use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::budget::AllocationStrategy;
use crate::fitness::FitnessResult;
use crate::search::{PlanOption, PlanReport};
use crate::timeline::ConflictReport;
use crate::vendors::VendorCombination;

pub fn render_strategies_table(strategies: &[AllocationStrategy]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Strategy", "Event Class", "Self-fitness", "Amounts"]);

    for strategy in strategies {
        let amounts = strategy
            .amounts
            .iter()
            .map(|(service, amount)| format!("{}: {amount:.0}", service.as_slug()))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            strategy.kind.to_string(),
            strategy.event_class.to_string(),
            format!("{:.4}", strategy.self_fitness),
            amounts,
        ]);
    }
    table.to_string()
}

pub fn render_fitness_table(combination: &VendorCombination, result: &FitnessResult) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Combination", "Overall", "Budget", "Preference", "Compatibility"]);

    let overall = result.overall_fitness_score;
    let overall_cell = if overall >= 0.8 {
        Cell::new(format!("{overall:.4}")).fg(Color::Green)
    } else if overall >= 0.5 {
        Cell::new(format!("{overall:.4}")).fg(Color::Yellow)
    } else {
        Cell::new(format!("{overall:.4}")).fg(Color::Red)
    };
    table.add_row(Row::from(vec![
        Cell::new(&combination.combination_id),
        overall_cell,
        Cell::new(format!("{:.4}", result.component_scores.budget_fitness)),
        Cell::new(format!("{:.4}", result.component_scores.preference_fitness)),
        Cell::new(format!("{:.4}", result.component_scores.compatibility_fitness)),
    ]));

    let mut out = table.to_string();
    if !result.recommendations.is_empty() {
        out.push('\n');
        for recommendation in &result.recommendations {
            out.push_str(&format!("- {recommendation}\n"));
        }
    }
    out
}

pub fn render_conflicts_table(report: &ConflictReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Type", "Service", "Severity", "Description"]);

    for conflict in &report.conflicts {
        let severity_cell = match conflict.severity {
            crate::timeline::Severity::High => {
                Cell::new(conflict.severity.to_string()).fg(Color::Red)
            }
            crate::timeline::Severity::Medium => {
                Cell::new(conflict.severity.to_string()).fg(Color::Yellow)
            }
            crate::timeline::Severity::Low => Cell::new(conflict.severity.to_string()),
        };
        table.add_row(Row::from(vec![
            Cell::new(conflict.kind.to_string()),
            Cell::new(conflict.service.clone().unwrap_or_else(|| "-".to_string())),
            severity_cell,
            Cell::new(&conflict.description),
        ]));
    }

    let mut out = table.to_string();
    out.push_str(&format!(
        "\nFeasibility: {:.4} ({} conflicts)",
        report.feasibility_score, report.total_conflicts
    ));
    out
}

pub fn render_shortlist_table(report: &PlanReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Rank",
        "Vendors",
        "Total Cost",
        "Fitness",
        "Feasibility",
        "Flagged",
    ]);

    for (idx, option) in report.options.iter().enumerate() {
        table.add_row(Row::from(vec![
            Cell::new((idx + 1).to_string()),
            Cell::new(vendor_summary(option)),
            Cell::new(format!("{:.0}", option.combination.total_cost)),
            Cell::new(format!("{:.4}", option.fitness.overall_fitness_score)),
            Cell::new(format!("{:.4}", option.conflicts.feasibility_score)),
            if option.flagged {
                Cell::new("YES").fg(Color::Red)
            } else {
                Cell::new("no").fg(Color::Green)
            },
        ]));
    }

    let mut out = table.to_string();
    out.push_str(&format!(
        "\nStrategy: {} ({}), {} iterations",
        report.strategy.kind, report.strategy.event_class, report.iterations
    ));
    if report.low_confidence {
        out.push_str("\nLow confidence: no option cleared the acceptance threshold.");
    }
    out
}

fn vendor_summary(option: &PlanOption) -> String {
    option
        .combination
        .vendors
        .values()
        .map(|v| v.name.as_str())
        .collect::<Vec<_>>()
        .join(" / ")
}
