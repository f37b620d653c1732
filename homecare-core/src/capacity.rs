//! Ước tính định biên (ETP/FTE) từ khối lượng công việc.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Role, SchedulingConfig, SchedulingError};

/// Ma trận thời gian chuẩn cho từng hoạt động (phút).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StandardTimes {
    pub initial_assessment: f64,
    pub antibiotic_follow_up: f64,
    pub simple_healing: f64,
    pub medical_follow_up: f64,
    pub education: f64,
    pub record_registration: f64,
    pub admin_coordination: f64,
    pub commute: f64,
}

impl Default for StandardTimes {
    fn default() -> Self {
        Self {
            initial_assessment: 60.0,
            antibiotic_follow_up: 45.0,
            simple_healing: 30.0,
            medical_follow_up: 40.0,
            education: 30.0,
            record_registration: 15.0,
            admin_coordination: 10.0,
            commute: 45.0,
        }
    }
}

/// Tỷ lệ (%) bệnh nhân cần từng loại lượt thăm mỗi ngày.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisitDistribution {
    pub initial_pct: f64,
    pub antibiotic_pct: f64,
    pub healing_pct: f64,
    pub medical_follow_up_pct: f64,
    pub education_pct: f64,
}

impl Default for VisitDistribution {
    fn default() -> Self {
        Self {
            initial_pct: 10.0,
            antibiotic_pct: 60.0,
            healing_pct: 30.0,
            medical_follow_up_pct: 20.0,
            education_pct: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FteEstimate {
    /// ETP làm tròn lên một chữ số thập phân.
    pub etp_per_role: BTreeMap<Role, f64>,
    pub total_etp: f64,
    /// Tính trên giá trị chưa làm tròn, tham chiếu 30 ETP.
    pub utilization_pct: f64,
}

/// Ước tính ETP cho bác sĩ, điều dưỡng trưởng và điều dưỡng phụ.
pub fn estimate_fte(
    census: u32,
    productive_minutes: f64,
    times: &StandardTimes,
    distribution: &VisitDistribution,
) -> Result<FteEstimate, SchedulingError> {
    if !productive_minutes.is_finite() || productive_minutes <= 0.0 {
        return Err(SchedulingError::InvalidProductiveMinutes(productive_minutes));
    }
    validate_non_negative(times, distribution)?;

    let census = f64::from(census);
    let share = |pct: f64| census * (pct / 100.0);

    let med_visits = share(distribution.initial_pct) + share(distribution.medical_follow_up_pct);
    let med_workload = med_visits * (times.initial_assessment + times.record_registration)
        + med_visits * times.commute
        + census * times.admin_coordination;

    let nurse_visits = share(distribution.initial_pct)
        + share(distribution.antibiotic_pct)
        + share(distribution.education_pct);
    let nurse_workload = nurse_visits * (times.antibiotic_follow_up + times.record_registration)
        + nurse_visits * times.commute
        + census * times.admin_coordination;

    // Kháng sinh tính hai lần mỗi bệnh nhân mỗi ngày.
    let aux_visits = share(distribution.antibiotic_pct) * 2.0 + share(distribution.healing_pct);
    let aux_workload = aux_visits * (times.simple_healing + times.record_registration)
        + aux_visits * times.commute;

    let raw = [
        (Role::MedicoDomiciliario, med_workload / productive_minutes),
        (Role::EnfermeroJefe, nurse_workload / productive_minutes),
        (Role::AuxiliarEnfermeria, aux_workload / productive_minutes),
    ];

    let raw_total: f64 = raw.iter().map(|(_, etp)| etp).sum();
    let etp_per_role: BTreeMap<Role, f64> = raw
        .iter()
        .map(|(role, etp)| (*role, round_up_tenth(*etp)))
        .collect();
    let total_etp: f64 = etp_per_role.values().sum();

    Ok(FteEstimate {
        etp_per_role,
        total_etp,
        utilization_pct: raw_total / 30.0 * 100.0,
    })
}

fn round_up_tenth(value: f64) -> f64 {
    (value * 10.0).ceil() / 10.0
}

fn validate_non_negative(
    times: &StandardTimes,
    distribution: &VisitDistribution,
) -> Result<(), SchedulingError> {
    let fields = [
        ("initial_assessment", times.initial_assessment),
        ("antibiotic_follow_up", times.antibiotic_follow_up),
        ("simple_healing", times.simple_healing),
        ("medical_follow_up", times.medical_follow_up),
        ("education", times.education),
        ("record_registration", times.record_registration),
        ("admin_coordination", times.admin_coordination),
        ("commute", times.commute),
        ("initial_pct", distribution.initial_pct),
        ("antibiotic_pct", distribution.antibiotic_pct),
        ("healing_pct", distribution.healing_pct),
        ("medical_follow_up_pct", distribution.medical_follow_up_pct),
        ("education_pct", distribution.education_pct),
    ];
    match fields
        .iter()
        .find(|(_, value)| !value.is_finite() || *value < 0.0)
    {
        Some((name, _)) => Err(SchedulingError::InvalidInput((*name).to_string())),
        None => Ok(()),
    }
}

/// Đầu vào của bảng định biên, dạng người dùng nhập.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StaffingRequest {
    pub census: u32,
    pub productive_hours: f64,
    pub times: StandardTimes,
    pub distribution: VisitDistribution,
}

impl Default for StaffingRequest {
    fn default() -> Self {
        Self {
            census: 100,
            productive_hours: 6.5,
            times: StandardTimes::default(),
            distribution: VisitDistribution::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerStatus {
    Optimo,
    Normal,
    Alerta,
    Critico,
}

/// Chỉ báo tăng trưởng hiển thị cạnh bảng định biên.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthTrigger {
    pub label: String,
    pub status: TriggerStatus,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapacityReport {
    pub census: u32,
    pub productive_minutes: f64,
    pub estimate: FteEstimate,
    pub triggers: Vec<GrowthTrigger>,
    pub summary: String,
}

/// Báo cáo định biên đầy đủ: ETP, chỉ báo tăng trưởng và đoạn tóm tắt.
pub fn capacity_report(
    request: &StaffingRequest,
    config: &SchedulingConfig,
) -> Result<CapacityReport, SchedulingError> {
    let productive_minutes = request.productive_hours * 60.0;
    let estimate = estimate_fte(
        request.census,
        productive_minutes,
        &request.times,
        &request.distribution,
    )?;

    let census = u64::from(request.census);
    let ceiling = u64::from(config.census_capacity);
    let census_status = if census * 10 > ceiling * 9 {
        TriggerStatus::Critico
    } else if census * 4 > ceiling * 3 {
        TriggerStatus::Alerta
    } else {
        TriggerStatus::Optimo
    };
    let utilization_status = if estimate.utilization_pct > 85.0 {
        TriggerStatus::Alerta
    } else {
        TriggerStatus::Normal
    };

    let triggers = vec![
        GrowthTrigger {
            label: "Censo vs Capacidad".to_string(),
            status: census_status,
            value: format!("{}/{}", request.census, config.census_capacity),
        },
        GrowthTrigger {
            label: "Tasa de Utilizacion".to_string(),
            status: utilization_status,
            value: format!("{}%", estimate.utilization_pct.round()),
        },
    ];

    let summary = format!(
        "Según el censo de {} pacientes y una jornada productiva de {}h, se requiere una plantilla total de {:.1} ETPs.",
        request.census, request.productive_hours, estimate.total_etp
    );

    tracing::debug!(
        census = request.census,
        total_etp = estimate.total_etp,
        "capacity report built"
    );

    Ok(CapacityReport {
        census: request.census,
        productive_minutes,
        estimate,
        triggers,
        summary,
    })
}
