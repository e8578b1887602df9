//! Human-readable analysis report

use std::fmt::Write as _;

use super::statistics::{GroupStatistics, StatisticsReport};
use crate::ingest::format_number;
use crate::models::format_amount;

const RULE_WIDTH: usize = 80;
const SECTION_WIDTH: usize = 40;
const TOP_ROWS: usize = 10;

/// Render the statistics as the plain-text report
pub fn render_text_report(report: &StatisticsReport, title: &str) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);
    // Writing into a String cannot fail
    let _ = writeln!(out, "{rule}\n{}\n{rule}\n", title.to_uppercase());

    let o = &report.overview;
    section(&mut out, "BASIC STATISTICS");
    let _ = writeln!(out, "Total Properties: {}", format_number(o.total_records as u64));
    let _ = writeln!(out, "Properties with Addresses: {}", format_number(o.with_address as u64));
    let _ = writeln!(out, "Properties with Owners: {}", format_number(o.with_owner as u64));
    let _ = writeln!(out, "Properties with Values: {}", format_number(o.with_value as u64));
    let _ = writeln!(out, "Unique Owners: {}", format_number(o.unique_owners as u64));
    let _ = writeln!(out, "Unique Zoning Types: {}", format_number(o.unique_zonings as u64));
    let _ = writeln!(out, "Unique Neighborhoods: {}", format_number(o.unique_neighborhoods as u64));
    out.push('\n');

    if let Some(value) = &report.value {
        if let Some(total) = &value.total_value {
            section(&mut out, "VALUE STATISTICS");
            let _ = writeln!(out, "Mean Property Value: {}", format_amount(total.mean));
            let _ = writeln!(out, "Median Property Value: {}", format_amount(total.median));
            let _ = writeln!(out, "Minimum Property Value: {}", format_amount(total.min));
            let _ = writeln!(out, "Maximum Property Value: {}", format_amount(total.max));
            let _ = writeln!(out, "Standard Deviation: {}", format_amount(total.std_dev));
            out.push('\n');
        }
    }

    if let Some(ownership) = &report.ownership {
        section(&mut out, "OWNERSHIP ANALYSIS");
        let _ = writeln!(
            out,
            "Owners with Multiple Properties: {}",
            format_number(ownership.owners_with_multiple_properties as u64)
        );
        if let Some(per_owner) = &ownership.properties_per_owner {
            let _ = writeln!(out, "Mean Properties per Owner: {:.2}", per_owner.mean);
            let _ = writeln!(out, "Max Properties per Owner: {:.0}", per_owner.max);
        }
        out.push('\n');
        let _ = writeln!(out, "Top Property Owners:");
        for (i, owner) in ownership.top_owners.iter().enumerate() {
            let name: String = owner.name.chars().take(50).collect();
            let _ = writeln!(
                out,
                "  {:2}. {:<50} ({} properties)",
                i + 1,
                name,
                format_number(owner.count as u64)
            );
        }
        out.push('\n');
        let _ = writeln!(out, "Owner Type Distribution:");
        for (owner_type, count) in &ownership.owner_types {
            let _ = writeln!(
                out,
                "  {:?}: {} properties ({:.1}%)",
                owner_type,
                format_number(*count as u64),
                percentage(*count, o.total_records)
            );
        }
        out.push('\n');
    }

    if let Some(zoning) = &report.zoning {
        section(&mut out, "ZONING ANALYSIS");
        group_section(&mut out, zoning, "Zoning Types");
    }

    if let Some(neighborhood) = &report.neighborhood {
        section(&mut out, "NEIGHBORHOOD ANALYSIS");
        group_section(&mut out, neighborhood, "Neighborhoods");
    }

    if let Some(value) = &report.value {
        section(&mut out, "VALUE DISTRIBUTION");
        let valued: usize = value.ranges.iter().map(|b| b.count).sum();
        for bucket in &value.ranges {
            let _ = writeln!(
                out,
                "{:<15}: {} properties ({:.1}%)",
                bucket.label,
                format_number(bucket.count as u64),
                percentage(bucket.count, valued)
            );
        }
        out.push('\n');
    }

    if let Some(years) = &report.year_built {
        section(&mut out, "YEAR BUILT STATISTICS");
        match &years.summary {
            Some(summary) => {
                let _ = writeln!(out, "Mean Year Built: {:.0}", summary.mean);
                let _ = writeln!(out, "Median Year Built: {:.0}", summary.median);
                let _ = writeln!(out, "Earliest Year: {:.0}", summary.min);
                let _ = writeln!(out, "Latest Year: {:.0}", summary.max);
            }
            None => {
                let _ = writeln!(out, "No plausible construction years");
            }
        }
        if !years.by_decade.is_empty() {
            let _ = writeln!(out, "By Decade:");
            for (decade, count) in &years.by_decade {
                let _ = writeln!(out, "  {decade}s: {}", format_number(*count as u64));
            }
        }
        out.push('\n');
    }

    let _ = write!(out, "{rule}\nEND OF REPORT\n{rule}\n");
    out
}

fn section(out: &mut String, heading: &str) {
    let _ = writeln!(out, "{heading}\n{}", "-".repeat(SECTION_WIDTH));
}

fn group_section(out: &mut String, stats: &GroupStatistics, noun: &str) {
    let _ = writeln!(out, "Distinct {noun}: {}", format_number(stats.distinct as u64));
    let mut by_count: Vec<(&String, &usize)> = stats.distribution.iter().collect();
    by_count.sort_by(|a, b| b.1.cmp(a.1));
    let _ = writeln!(out, "{noun} by Count:");
    for (i, (name, count)) in by_count.iter().take(TOP_ROWS).enumerate() {
        let _ = writeln!(
            out,
            "  {:2}. {:<30} ({} properties)",
            i + 1,
            name,
            format_number(**count as u64)
        );
    }
    let _ = writeln!(out, "{noun} by Average Value:");
    for (i, ranked) in stats.top_by_mean_value.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:2}. {:<30} {} ({} properties)",
            i + 1,
            ranked.name,
            format_amount(ranked.mean_value),
            format_number(ranked.count as u64)
        );
    }
    out.push('\n');
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::statistics::StatisticsEngine;
    use crate::config::StatisticsSettings;
    use crate::models::PropertyRecord;

    #[test]
    fn test_sections_follow_enabled_categories() {
        let mut record = PropertyRecord::new(0);
        record.owner = Some("DOE JANE".to_string());
        record.total_value = Some(250_000.0);
        let settings = StatisticsSettings {
            zoning_analysis: false,
            ..Default::default()
        };
        let stats = StatisticsEngine::new(settings).compute(&[record]).unwrap();
        let text = render_text_report(&stats, "Property Data Analysis Report");

        assert!(text.starts_with(&"=".repeat(80)));
        assert!(text.contains("PROPERTY DATA ANALYSIS REPORT"));
        assert!(text.contains("OWNERSHIP ANALYSIS"));
        assert!(!text.contains("ZONING ANALYSIS"));
        assert!(text.contains("$250k-$500k    : 1 properties (100.0%)"));
        assert!(text.trim_end().ends_with(&"=".repeat(80)));
    }
}
