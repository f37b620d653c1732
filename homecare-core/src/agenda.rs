//! Lịch thăm sắp tới cho toàn bộ bệnh nhân đã tiếp nhận.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{next_due_on_or_after, resolve_interval, Patient, Priority, SchedulingConfig};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub patient_id: String,
    pub patient_name: String,
    pub visit_label: String,
    pub due_date: NaiveDate,
    pub interval_days: u32,
    pub priority: Priority,
}

/// Lượt thăm kế tiếp (từ `today` trở đi) của mỗi bệnh nhân, sắp theo ngày.
pub fn upcoming_agenda(
    patients: &[Patient],
    today: NaiveDate,
    config: &SchedulingConfig,
) -> Vec<Appointment> {
    let mut appointments: Vec<Appointment> = patients
        .iter()
        .filter(|patient| patient.is_schedulable())
        .filter_map(|patient| {
            let interval = resolve_interval(patient, today, config);
            let due_date =
                next_due_on_or_after(patient.admission_date, interval.interval_days, today)?;
            Some(Appointment {
                patient_id: patient.id.clone(),
                patient_name: patient.name.clone(),
                visit_label: interval.label,
                due_date,
                interval_days: interval.interval_days,
                priority: interval.priority,
            })
        })
        .collect();

    appointments.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| a.patient_id.cmp(&b.patient_id))
    });

    tracing::debug!(%today, appointments = appointments.len(), "agenda built");
    appointments
}
