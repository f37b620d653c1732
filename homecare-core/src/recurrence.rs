//! Xác định chu kỳ thăm hiệu lực của từng bệnh nhân.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Patient, Priority, Program, SchedulingConfig};

/// Lý do một lượt thăm đến hạn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DueReason {
    Antibiotic,
    Pediatric,
    Program,
    /// Chương trình không xác định, không lập lịch.
    Unscheduled,
    /// Điều phối viên thêm thủ công.
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitInterval {
    pub interval_days: u32,
    pub label: String,
    pub priority: Priority,
    pub reason: DueReason,
}

/// Quy tắc đầu tiên khớp sẽ thắng: kháng sinh > nhi khoa > chương trình.
pub fn resolve_interval(
    patient: &Patient,
    today: NaiveDate,
    config: &SchedulingConfig,
) -> VisitInterval {
    if patient.antibiotic_active_on(today) {
        if let Some(treatment) = &patient.antibiotic {
            let label = match treatment.dose_schedule() {
                Some(schedule) => format!(
                    "Terapia antibiótica: {} ({})",
                    treatment.drug_name,
                    schedule.to_lowercase()
                ),
                None => format!("Terapia antibiótica: {}", treatment.drug_name),
            };
            return VisitInterval {
                interval_days: 1,
                label,
                priority: Priority::High,
                reason: DueReason::Antibiotic,
            };
        }
    }

    let base_label = patient
        .program
        .map(Program::visit_label)
        .unwrap_or("Visita de Seguimiento");

    if age_in_years(patient.birth_date, today) < config.pediatric_age_years {
        return VisitInterval {
            interval_days: 1,
            label: format!("{base_label} - Pediátrico Urgente"),
            priority: Priority::High,
            reason: DueReason::Pediatric,
        };
    }

    let (interval_days, priority, reason) = match patient.program {
        Some(Program::Hospitalario) => (
            config.hospitalario_interval_days,
            Priority::Medium,
            DueReason::Program,
        ),
        Some(Program::Cronico) => (config.cronico_interval_days, Priority::Low, DueReason::Program),
        Some(Program::CronicoPaliativo) => (
            config.paliativo_interval_days,
            Priority::High,
            DueReason::Program,
        ),
        None => (0, Priority::Medium, DueReason::Unscheduled),
    };

    VisitInterval {
        interval_days,
        label: base_label.to_string(),
        priority,
        reason,
    }
}

/// Tuổi tròn năm; trừ một nếu chưa tới ngày sinh nhật trong năm `today`.
pub fn age_in_years(birth_date: NaiveDate, today: NaiveDate) -> u32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age.max(0) as u32
}
