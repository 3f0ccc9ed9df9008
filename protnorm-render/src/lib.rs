//! Rendering helpers (markdown) for human review of a volume plan.

use protnorm_types::{Anomaly, VolumePlan};

pub fn render_plan_md(plan: &VolumePlan) -> String {
    let p = &plan.parameters;
    let s = &plan.summary;

    let mut out = String::new();
    out.push_str("# protnorm plan\n\n");
    out.push_str(&format!(
        "- Target: {} uM in {} uL (tip max {} uL)\n",
        p.target_concentration_um, p.target_volume_ul, p.max_tip_volume_ul
    ));
    out.push_str(&format!(
        "- Wells: {} ({} blank, {} excluded, {} split)\n",
        s.wells_total, s.wells_blank, s.wells_excluded, s.wells_split
    ));
    out.push_str(&format!("- Rows: {}\n", s.rows_total));
    out.push_str(&format!(
        "- Total stock: {:.2} uL, total buffer: {:.2} uL\n",
        s.stock_total_ul, s.buffer_total_ul
    ));
    if let Some(mean) = plan.blank_reference_mean_um {
        out.push_str(&format!("- Blank reference mean: {:.3} uM\n", mean));
    }
    out.push('\n');

    if !plan.anomalies.is_empty() {
        out.push_str("## Anomalies\n\n");
        for a in &plan.anomalies {
            match a {
                Anomaly::NegativeBuffer {
                    well,
                    buffer_volume_ul,
                } => out.push_str(&format!(
                    "- `{}`: negative buffer volume {:.2} uL (stock alone exceeds target volume)\n",
                    well, buffer_volume_ul
                )),
            }
        }
        out.push('\n');
    }

    out.push_str("## Dispenses\n\n");
    if plan.dispenses.is_empty() {
        out.push_str("_No wells planned._\n");
        return out;
    }

    out.push_str("| Well | Role | Conc (uM) | Stock (uL) | Buffer (uL) | Splits |\n");
    out.push_str("|---|---|---:|---:|---:|---:|\n");
    for d in &plan.dispenses {
        out.push_str(&format!(
            "| {} | {} | {:.3} | {:.2} | {:.2} | {} |\n",
            d.dest_well,
            d.role.label(),
            d.concentration_um,
            d.stock_volume_ul,
            d.buffer_volume_ul,
            d.split_count
        ));
    }

    out
}
