use crate::models::InterventionCandidate;

/// id, type, measure, expected gap closure %, cost, members, star weight
const CATALOG: [(&str, &str, &str, f64, f64, u64, f64); 8] = [
    ("outreach_bcs", "Member Outreach Campaign", "BCS", 8.0, 15_000.0, 2000, 0.10),
    ("provider_diabetes", "Provider Education", "CDC", 12.0, 25_000.0, 3000, 0.15),
    ("ehr_cbp", "EHR Alert System", "CBP", 15.0, 50_000.0, 4000, 0.12),
    ("outreach_col", "Member Outreach Campaign", "COL", 6.0, 12_000.0, 2500, 0.10),
    ("lab_reminder", "Lab Order Reminders", "CDC", 10.0, 18_000.0, 3000, 0.15),
    ("bp_home", "Home BP Monitoring", "CBP", 9.0, 22_000.0, 4000, 0.12),
    ("mam_outreach", "Mammography Outreach", "MAM", 7.0, 14_000.0, 1800, 0.10),
    ("eye_exam", "Eye Exam Reminders", "EED", 11.0, 20_000.0, 2500, 0.15),
];

/// Stock interventions offered when the caller supplies none
pub fn default_interventions() -> Vec<InterventionCandidate> {
    CATALOG
        .iter()
        .map(|&(id, kind, measure, gap, cost, members, weight)| {
            InterventionCandidate::new(id, kind, measure, gap, cost, members)
                .with_star_weight(weight)
        })
        .collect()
}
