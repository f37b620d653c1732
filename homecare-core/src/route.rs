//! Dựng tuyến thăm theo ngày cho một nhân viên và cho phép điều phối viên chỉnh sửa.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    is_due, normalize_label, resolve_interval, serves_need, Coordinates, DueReason, Patient,
    Priority, Role, SchedulingConfig, SchedulingError, StaffMember,
};

/// Bộ chọn (ngày, vai trò, nhân viên) quyết định tuyến gốc.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteSelection {
    pub date: NaiveDate,
    pub role: Role,
    pub staff_id: String,
}

/// `Computed`: trùng với tuyến tính toán. `Edited`: đã chỉnh tay, chưa lưu.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RouteState {
    Computed,
    Edited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteEvent {
    Edit,
    Save,
    /// Bộ chọn thay đổi: tính lại từ đầu, bỏ các chỉnh sửa chưa lưu.
    Reselect,
}

impl RouteState {
    pub fn next(self, event: RouteEvent) -> RouteState {
        match (self, event) {
            (_, RouteEvent::Edit) => RouteState::Edited,
            (_, RouteEvent::Save) | (_, RouteEvent::Reselect) => RouteState::Computed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    Ignored,
}

/// Một điểm dừng trên tuyến kèm lý do đến hạn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteStop {
    pub patient_id: String,
    pub patient_name: String,
    pub reason: DueReason,
    pub label: String,
    pub priority: Priority,
    /// Điều dưỡng phụ có liều kháng sinh trong ngày.
    pub antibiotic_priority: bool,
    pub dose_schedule: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl RouteStop {
    fn from_patient(patient: &Patient, role: Role, date: NaiveDate, config: &SchedulingConfig) -> Self {
        let interval = resolve_interval(patient, date, config);
        let antibiotic_active = patient.antibiotic_active_on(date);
        Self {
            patient_id: patient.id.clone(),
            patient_name: patient.name.clone(),
            reason: interval.reason,
            label: interval.label,
            priority: interval.priority,
            antibiotic_priority: role.is_nursing_assistant() && antibiotic_active,
            dose_schedule: if antibiotic_active {
                patient.antibiotic.as_ref().and_then(|t| t.dose_schedule())
            } else {
                None
            },
            coordinates: patient.coordinates,
        }
    }
}

/// Ảnh chụp tuyến đã lưu, chuyển cho kho lưu trữ bên ngoài.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedRoute {
    pub date: NaiveDate,
    pub staff_id: String,
    pub patient_ids: Vec<String>,
    pub saved_at: DateTime<Utc>,
}

/// Tóm tắt tuyến cho lớp hiển thị.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteSummary {
    pub selection: RouteSelection,
    pub staff_name: String,
    pub state: RouteState,
    pub stops: Vec<RouteStop>,
    pub capacity: u32,
    pub shift_minutes: u32,
    pub time_load_percent: f64,
    pub distance_km: f64,
}

/// Tính tuyến gốc: bệnh nhân đã tiếp nhận, đúng dịch vụ, đến hạn trong ngày.
pub fn compute_route(
    patients: &[Patient],
    role: Role,
    date: NaiveDate,
    config: &SchedulingConfig,
) -> Vec<RouteStop> {
    let mut due: Vec<&Patient> = patients
        .iter()
        .filter(|patient| patient.is_schedulable())
        .filter(|patient| serves_need(role, &patient.therapies))
        .filter(|patient| {
            let interval = resolve_interval(patient, date, config);
            is_due(patient.admission_date, interval.interval_days, date)
        })
        .collect();

    due.sort_by(|a, b| {
        if role.is_nursing_assistant() {
            let a_doses = a.antibiotic_active_on(date);
            let b_doses = b.antibiotic_active_on(date);
            if a_doses != b_doses {
                return b_doses.cmp(&a_doses);
            }
        }
        b.latitude().total_cmp(&a.latitude())
    });

    tracing::debug!(role = ?role, %date, stops = due.len(), "route computed");

    due.into_iter()
        .map(|patient| RouteStop::from_patient(patient, role, date, config))
        .collect()
}

/// Nhân viên thuộc vai trò đã chọn, trừ danh sách loại trừ theo tên.
pub fn available_staff<'a>(
    staff: &'a [StaffMember],
    role: Role,
    excluded_names: &[String],
) -> Vec<&'a StaffMember> {
    let excluded: Vec<String> = excluded_names
        .iter()
        .map(|name| normalize_label(name))
        .filter(|name| !name.is_empty())
        .collect();

    staff
        .iter()
        .filter(|member| member.role == role)
        .filter(|member| {
            let name = normalize_label(&member.name);
            !excluded.iter().any(|ex| name.contains(ex.as_str()))
        })
        .collect()
}

/// Tuyến của một nhân viên trong một ngày cùng trạng thái chỉnh sửa.
#[derive(Debug, Clone)]
pub struct RoutePlanner {
    selection: RouteSelection,
    staff: StaffMember,
    config: SchedulingConfig,
    stops: Vec<RouteStop>,
    state: RouteState,
}

impl RoutePlanner {
    pub fn new(
        selection: RouteSelection,
        staff: &[StaffMember],
        patients: &[Patient],
        config: &SchedulingConfig,
    ) -> Result<Self, SchedulingError> {
        let member = find_staff(staff, &selection, config)?;
        let stops = compute_route(patients, selection.role, selection.date, config);
        Ok(Self {
            selection,
            staff: member,
            config: config.clone(),
            stops,
            state: RouteState::Computed,
        })
    }

    /// Tính lại tuyến cho bộ chọn mới. Chỉnh sửa chưa lưu bị bỏ.
    pub fn reselect(
        &mut self,
        selection: RouteSelection,
        staff: &[StaffMember],
        patients: &[Patient],
    ) -> Result<(), SchedulingError> {
        let member = find_staff(staff, &selection, &self.config)?;
        if self.state == RouteState::Edited {
            tracing::warn!(
                staff = %self.staff.id,
                date = %self.selection.date,
                "discarding unsaved route edits on selection change"
            );
        }
        self.stops = compute_route(patients, selection.role, selection.date, &self.config);
        self.staff = member;
        self.selection = selection;
        self.state = self.state.next(RouteEvent::Reselect);
        Ok(())
    }

    pub fn selection(&self) -> &RouteSelection {
        &self.selection
    }

    pub fn staff(&self) -> &StaffMember {
        &self.staff
    }

    pub fn stops(&self) -> &[RouteStop] {
        &self.stops
    }

    pub fn state(&self) -> RouteState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == RouteState::Edited
    }

    pub fn capacity(&self) -> u32 {
        self.staff.capacity(&self.config)
    }

    /// Thêm bệnh nhân cuối tuyến. Từ chối khi tuyến đã đầy.
    pub fn add_patient(
        &mut self,
        actor: Role,
        patient: &Patient,
    ) -> Result<EditOutcome, SchedulingError> {
        if !actor.is_coordinator() || !patient.is_schedulable() {
            return Ok(EditOutcome::Ignored);
        }
        if self.contains(&patient.id) {
            return Ok(EditOutcome::Ignored);
        }
        let max = self.capacity();
        if self.stops.len() >= max as usize {
            tracing::info!(staff = %self.staff.id, max, "route at capacity, add rejected");
            return Err(SchedulingError::CapacityReached { max });
        }

        let mut stop =
            RouteStop::from_patient(patient, self.staff.role, self.selection.date, &self.config);
        stop.reason = DueReason::Manual;
        self.stops.push(stop);
        self.mark_edited();
        Ok(EditOutcome::Applied)
    }

    pub fn remove_patient(&mut self, actor: Role, index: usize) -> EditOutcome {
        if !actor.is_coordinator() || index >= self.stops.len() {
            return EditOutcome::Ignored;
        }
        self.stops.remove(index);
        self.mark_edited();
        EditOutcome::Applied
    }

    /// Đổi chỗ với điểm dừng liền kề.
    pub fn move_patient(&mut self, actor: Role, index: usize, direction: MoveDirection) -> EditOutcome {
        if !actor.is_coordinator() || index >= self.stops.len() {
            return EditOutcome::Ignored;
        }
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => Some(index + 1).filter(|&i| i < self.stops.len()),
        };
        let Some(target) = target else {
            return EditOutcome::Ignored;
        };
        self.stops.swap(index, target);
        self.mark_edited();
        EditOutcome::Applied
    }

    /// Đánh dấu tuyến sạch; việc lưu thật thuộc về kho bên ngoài.
    pub fn save(&mut self) -> SavedRoute {
        self.state = self.state.next(RouteEvent::Save);
        SavedRoute {
            date: self.selection.date,
            staff_id: self.staff.id.clone(),
            patient_ids: self.stops.iter().map(|s| s.patient_id.clone()).collect(),
            saved_at: Utc::now(),
        }
    }

    /// Ước lượng cố định `minutes_per_visit` mỗi lượt, không phân loại lượt thăm.
    pub fn time_load_percent(&self) -> f64 {
        let shift = self.staff.shift_duration_minutes();
        if shift == 0 {
            return 0.0;
        }
        let estimated = self.stops.len() as f64 * f64::from(self.config.minutes_per_visit);
        (estimated / f64::from(shift) * 100.0).min(100.0)
    }

    pub fn distance_km(&self) -> f64 {
        let points: Vec<Coordinates> = self.stops.iter().filter_map(|s| s.coordinates).collect();
        points
            .windows(2)
            .map(|pair| pair[0].distance_km(&pair[1]))
            .sum()
    }

    /// Ứng viên để thêm: đã tiếp nhận, có tọa độ, chưa nằm trên tuyến.
    pub fn search_candidates<'a>(&self, patients: &'a [Patient], term: &str) -> Vec<&'a Patient> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }
        patients
            .iter()
            .filter(|p| p.is_schedulable() && p.coordinates.is_some())
            .filter(|p| !self.contains(&p.id))
            .filter(|p| {
                p.name.to_lowercase().contains(&term) || p.id.to_lowercase().contains(&term)
            })
            .take(self.config.search_result_limit)
            .collect()
    }

    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            selection: self.selection.clone(),
            staff_name: self.staff.name.clone(),
            state: self.state,
            stops: self.stops.clone(),
            capacity: self.capacity(),
            shift_minutes: self.staff.shift_duration_minutes(),
            time_load_percent: self.time_load_percent(),
            distance_km: self.distance_km(),
        }
    }

    fn contains(&self, patient_id: &str) -> bool {
        self.stops.iter().any(|s| s.patient_id == patient_id)
    }

    fn mark_edited(&mut self) {
        self.state = self.state.next(RouteEvent::Edit);
    }
}

/// Nhân viên phải tồn tại, đúng vai trò đã chọn và không nằm trong danh sách loại trừ.
fn find_staff(
    staff: &[StaffMember],
    selection: &RouteSelection,
    config: &SchedulingConfig,
) -> Result<StaffMember, SchedulingError> {
    let staff_id = selection.staff_id.as_str();
    if !staff.iter().any(|member| member.id == staff_id) {
        return Err(SchedulingError::UnknownStaff(staff_id.to_string()));
    }
    available_staff(staff, selection.role, &config.excluded_staff_names)
        .into_iter()
        .find(|member| member.id == staff_id)
        .cloned()
        .ok_or_else(|| {
            tracing::warn!(staff = %staff_id, role = ?selection.role, "staff not eligible for route");
            SchedulingError::StaffNotEligible(staff_id.to_string())
        })
}
