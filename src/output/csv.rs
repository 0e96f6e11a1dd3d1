use anyhow::Result;

use crate::budget::AllocationStrategy;
use crate::search::PlanReport;

pub fn strategies_to_csv(strategies: &[AllocationStrategy]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["strategy", "event_class", "service", "amount", "self_fitness"])?;
    for strategy in strategies {
        for (service, amount) in &strategy.amounts {
            writer.write_record([
                strategy.kind.to_string(),
                strategy.event_class.to_string(),
                service.as_slug().to_string(),
                format!("{amount:.2}"),
                format!("{:.4}", strategy.self_fitness),
            ])?;
        }
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn shortlist_to_csv(report: &PlanReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "rank",
        "vendor_key",
        "total_cost",
        "fitness",
        "feasibility",
        "conflicts",
        "flagged",
    ])?;
    for (idx, option) in report.options.iter().enumerate() {
        writer.write_record([
            (idx + 1).to_string(),
            option.combination.vendor_key(),
            format!("{:.2}", option.combination.total_cost),
            format!("{:.4}", option.fitness.overall_fitness_score),
            format!("{:.4}", option.conflicts.feasibility_score),
            option.conflicts.total_conflicts.to_string(),
            option.flagged.to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
