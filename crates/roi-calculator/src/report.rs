use std::fmt::Write;

use chrono::NaiveDate;
use quality_core::format::{group_thousands, money};
use quality_core::{stats, EngineResult, PortfolioSummary, RoiAssumptions};

use crate::models::RoiResult;

const RULE: &str =
    "================================================================================";

/// Render the CFO financial justification report
pub fn render_cfo_report(
    results: &[RoiResult],
    summary: Option<&PortfolioSummary>,
    assumptions: &RoiAssumptions,
    generated_on: NaiveDate,
) -> EngineResult<String> {
    let mut out = String::new();
    write_cfo_report(&mut out, results, summary, assumptions, generated_on)?;
    Ok(out)
}

/// Write the CFO report into any `fmt::Write` sink
pub fn write_cfo_report<W: Write>(
    out: &mut W,
    results: &[RoiResult],
    summary: Option<&PortfolioSummary>,
    a: &RoiAssumptions,
    generated_on: NaiveDate,
) -> std::fmt::Result {
    writeln!(out, "HEDIS PORTFOLIO ROI ANALYSIS - FINANCIAL JUSTIFICATION REPORT")?;
    writeln!(out, "Generated: {}", generated_on)?;
    writeln!(out, "Prepared for: Chief Financial Officer")?;
    writeln!(out)?;
    section(out, "EXECUTIVE SUMMARY")?;
    writeln!(
        out,
        "ROI analysis for HEDIS intervention programs, including quality bonus impact,"
    )?;
    writeln!(
        out,
        "Star Rating financial implications and net ROI with confidence intervals."
    )?;
    writeln!(out)?;

    if let Some(s) = summary {
        writeln!(out, "PORTFOLIO OVERVIEW")?;
        writeln!(out, "------------------")?;
        writeln!(out, "Total Interventions: {}", group_thousands(s.total_interventions as f64, 0))?;
        writeln!(out, "Successful Closures: {}", group_thousands(s.total_closures as f64, 0))?;
        writeln!(out, "Overall Success Rate: {:.1}%", s.overall_success_rate)?;
        writeln!(out, "Total Investment: {}", money(s.total_investment))?;
        writeln!(out, "Total Revenue Impact: {}", money(s.revenue_impact))?;
        writeln!(out, "Net Benefit: {}", money(s.net_benefit))?;
        writeln!(out, "ROI Ratio: {:.2}", s.roi_ratio)?;
        writeln!(out)?;
    }

    section(out, "MEASURE-BY-MEASURE ROI ANALYSIS")?;
    let mut revenue = 0.0;
    let mut bonus = 0.0;
    let mut costs = 0.0;
    let mut net = 0.0;
    for r in results {
        revenue += r.total_revenue;
        bonus += r.quality_bonus;
        costs += r.total_costs;
        net += r.net_roi;

        writeln!(out, "{}", r.measure_name)?;
        writeln!(out, "  Success Rate: {:.1}%", r.success_rate)?;
        writeln!(
            out,
            "  Confidence Interval: {:.1}% - {:.1}%",
            r.confidence_interval.lower, r.confidence_interval.upper
        )?;
        writeln!(out, "  Star Rating Impact: {} stars", r.star_rating)?;
        writeln!(out, "  Revenue from Closures: {}", money(r.total_revenue))?;
        writeln!(out, "  Quality Bonus Impact: {}", money(r.quality_bonus))?;
        writeln!(out, "  Total Costs: {}", money(r.total_costs))?;
        writeln!(out, "  Net ROI: {}", money(r.net_roi))?;
        writeln!(out, "  ROI Ratio: {:.2}", r.roi_ratio)?;
        writeln!(out)?;
        writeln!(out, "  Cost Breakdown:")?;
        writeln!(out, "    - Staff Costs: {}", money(r.cost_breakdown.staff_cost))?;
        writeln!(out, "    - Outreach Costs: {}", money(r.cost_breakdown.outreach_cost))?;
        writeln!(out, "    - Lab Costs: {}", money(r.cost_breakdown.lab_cost))?;
        writeln!(
            out,
            "    - Intervention Costs: {}",
            money(r.cost_breakdown.intervention_cost)
        )?;
        writeln!(out)?;
    }

    section(out, "PORTFOLIO SUMMARY")?;
    writeln!(out, "Total Revenue (Closures): {}", money(revenue))?;
    writeln!(out, "Total Quality Bonus Impact: {}", money(bonus))?;
    writeln!(out, "Total Intervention Costs: {}", money(costs))?;
    writeln!(out, "Total Net ROI: {}", money(net))?;
    writeln!(out)?;
    writeln!(
        out,
        "Portfolio ROI Ratio: {:.2}",
        stats::safe_ratio(revenue + bonus, costs)
    )?;
    writeln!(out)?;

    section(out, "KEY ASSUMPTIONS")?;
    writeln!(out, "- Revenue per Closure: {}", money(a.revenue_per_closure))?;
    writeln!(
        out,
        "- Quality Bonus: {} per member per star rating point",
        money(a.bonus_per_star)
    )?;
    writeln!(out, "- Staff Cost: {} per hour (care coordinator)", money(a.staff_hourly_rate))?;
    writeln!(out, "- Outreach Cost: {} per member", money(a.outreach_cost_per_member))?;
    writeln!(out, "- Lab Test Cost: {} per test", money(a.lab_cost_per_test))?;
    writeln!(
        out,
        "- Confidence Intervals: {:.0}% confidence level",
        a.confidence_level * 100.0
    )?;
    writeln!(out)?;

    section(out, "RECOMMENDATIONS")?;
    writeln!(out, "1. Continue investment in high-ROI measures")?;
    writeln!(out, "2. Optimize costs for measures with lower ROI")?;
    writeln!(out, "3. Focus on improving success rates for at-risk measures")?;
    writeln!(out, "4. Monitor quality bonus impact as Star Ratings are updated")?;
    writeln!(out, "5. Review cost structure quarterly to maintain profitability")?;
    writeln!(out)?;

    writeln!(out, "{}", RULE)?;
    writeln!(out, "Report End")?;
    writeln!(out, "Generated: {}", generated_on)?;
    writeln!(out, "{}", RULE)
}

fn section<W: Write>(out: &mut W, title: &str) -> std::fmt::Result {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out)
}
