use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;

use crate::bias::BiasAnalysis;
use crate::topics::TopicName;

const RULE: &str = "--------------------------------";

pub(super) fn write_bias_report<W: Write>(output: &mut W, analysis: &BiasAnalysis) -> Result<()> {
    let ranked = analysis.ranked();

    writeln!(output, "Media Bias Analysis Report")?;
    writeln!(output, "==========================")?;
    writeln!(output)?;
    writeln!(
        output,
        "This report analyzes sentiment bias by comparing each source's article sentiment"
    )?;
    writeln!(
        output,
        "to the regional average for articles on the same topic published in the same month."
    )?;
    writeln!(
        output,
        "A positive bias score means the source was generally more positive than its regional peers."
    )?;
    writeln!(output, "A negative score means it was more negative.")?;
    writeln!(output)?;

    writeln!(output, "--- Overall Bias Rankings by Source ---")?;
    writeln!(output, "---------------------------------------")?;
    for result in &ranked {
        writeln!(
            output,
            "- {}: {:.4}",
            result.source.to_uppercase(),
            result.overall_bias_score
        )?;
    }
    writeln!(output)?;

    writeln!(output, "--- Detailed Source Analysis ---")?;
    writeln!(output, "{RULE}")?;
    for result in &ranked {
        writeln!(output, "### SOURCE: {} ###", result.source.to_uppercase())?;
        writeln!(output, "Overall Bias Score: {:.4}", result.overall_bias_score)?;
        writeln!(output)?;

        if result.changepoints.is_empty() {
            writeln!(
                output,
                "No significant shifts in sentiment bias detected during the analyzed period."
            )?;
        } else {
            writeln!(
                output,
                "Detected shifts in sentiment bias and potential correlated events:"
            )?;
            for changepoint in &result.changepoints {
                writeln!(
                    output,
                    "  - On/Around {}:",
                    changepoint.date.format("%Y-%m-%d")
                )?;
                writeln!(
                    output,
                    "    - A significant shift in reporting bias was detected."
                )?;
                match &changepoint.correlated_event {
                    Some(event) => writeln!(
                        output,
                        "    - This shift occurred shortly after the '{event}' event."
                    )?,
                    None => writeln!(
                        output,
                        "    - No major predefined event was found to correlate with this shift."
                    )?,
                }
            }
        }

        writeln!(output)?;
        writeln!(output, "{RULE}")?;
        writeln!(output)?;
    }

    if !analysis.skipped.is_empty() {
        writeln!(output, "--- Sources Not Analyzed ---")?;
        writeln!(output, "{RULE}")?;
        for (source, reason) in &analysis.skipped {
            writeln!(output, "- {}: {}", source.to_uppercase(), reason.describe())?;
        }
        writeln!(output)?;
    }

    if analysis.dropped_without_baseline > 0 {
        writeln!(
            output,
            "Note: {} articles were excluded because no baseline could be computed.",
            analysis.dropped_without_baseline
        )?;
    }

    Ok(())
}

pub(super) fn write_top_topics_report<W: Write>(
    output: &mut W,
    top_topics: &BTreeMap<String, Vec<(TopicName, usize)>>,
    limit: usize,
) -> Result<()> {
    writeln!(output, "Top {limit} Most Frequent Topics per News Source")?;
    writeln!(output, "===============================================")?;
    writeln!(output)?;

    for (source, topics) in top_topics {
        writeln!(output, "--- {} ---", source.to_uppercase())?;
        if topics.is_empty() {
            writeln!(output, "No topic data available.")?;
            writeln!(output)?;
            continue;
        }

        for (index, (name, count)) in topics.iter().enumerate() {
            writeln!(output, "{:2}. {} ({} articles)", index + 1, name, count)?;
        }
        writeln!(output)?;
    }

    Ok(())
}
