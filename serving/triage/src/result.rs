//! 分诊结果展示.

use crate::runner::ImageVerdict;
use ct_bleed::pipeline::{ScoreMap, VolumeReport};
use std::io::{self, Write};

const S4: &str = "    ";

#[inline]
fn score_to_display(s: Option<f64>) -> String {
    match s {
        Some(s) => format!("{s:.2}"),
        None => "/".to_string(),
    }
}

fn scores_into<W: Write>(map: &ScoreMap, w: &mut W) -> io::Result<()> {
    for (name, s) in map.iter() {
        write!(w, "{S4}{name}: {s:.2}")?;
    }
    writeln!(w)
}

/// 将 `report` 的摘要写进 `w` 中. `slices` 为真时附带逐切片表格.
pub fn describe_into<W: Write>(report: &VolumeReport, slices: bool, w: &mut W) -> io::Result<()> {
    let v = &report.volume_level;
    writeln!(w, "Source: {}", report.source)?;
    writeln!(
        w,
        "{S4}Slices: {} total, {} filtered, {} failed",
        report.num_slices, report.filtered_slices, report.failed_slices
    )?;
    writeln!(
        w,
        "{S4}Diagnosis: {}",
        v.final_diagnosis.as_deref().unwrap_or("/ (all scores zero)")
    )?;
    writeln!(w, "{S4}Most risky slice: {}", report.most_risky_slice_index)?;
    write!(w, "{S4}Probabilities:")?;
    scores_into(&v.probabilities, w)?;

    if !slices {
        return Ok(());
    }
    utils::sep_to(&mut *w)?;
    for s in &report.slice_level {
        match (&s.probabilities, &s.error) {
            (Some(p), _) => {
                let top = p.iter().max_by(|a, b| a.1.total_cmp(&b.1));
                writeln!(
                    w,
                    "{S4}#{:<4} {:<20} {}",
                    s.slice_index,
                    top.map_or("/", |(k, _)| k),
                    score_to_display(top.map(|(_, x)| x))
                )?;
            }
            (None, err) => writeln!(
                w,
                "{S4}#{:<4} failed: {}",
                s.slice_index,
                err.as_deref().unwrap_or("unknown")
            )?,
        }
    }
    Ok(())
}

/// 单张图像的分类结果.
pub fn describe_verdict_into<W: Write>(verdict: &ImageVerdict, w: &mut W) -> io::Result<()> {
    writeln!(
        w,
        "Diagnosis: {}",
        verdict.diagnosis.as_deref().unwrap_or("/ (all scores zero)")
    )?;
    write!(w, "{S4}Probabilities:")?;
    scores_into(&verdict.scores, w)
}
